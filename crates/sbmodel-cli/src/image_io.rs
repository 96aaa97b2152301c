//! Demo image I/O for the `render` command: write a synthesized model
//! image as 16-bit grayscale TIFF or 8-bit PNG, and load a raster PSF
//! file, choosing format from the output path's extension. Pixel values
//! are normalized by the image's own peak rather than assumed already in
//! `[0, 1]`, since model flux has no fixed range.

use std::path::Path;

use anyhow::{Context, Result};
use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;

/// Save a model image, scaling linearly so its maximum pixel maps to full
/// white. Format is chosen from the output path's extension, defaulting to
/// TIFF when the image's dynamic range should survive round-tripping.
pub fn save_model_image(image: &Array2<f64>, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(image, path),
        _ => save_tiff(image, path),
    }
}

fn peak(image: &Array2<f64>) -> f64 {
    image.iter().cloned().fold(0.0_f64, f64::max).max(f64::MIN_POSITIVE)
}

fn save_tiff(image: &Array2<f64>, path: &Path) -> Result<()> {
    let (rows, cols) = image.dim();
    let scale = 65535.0 / peak(image);

    let mut pixels: Vec<u16> = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            pixels.push((image[[row, col]].max(0.0) * scale).min(65535.0) as u16);
        }
    }

    let buf = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(cols as u32, rows as u32, pixels)
        .context("pixel buffer does not match declared dimensions")?;
    buf.save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn save_png(image: &Array2<f64>, path: &Path) -> Result<()> {
    let (rows, cols) = image.dim();
    let scale = 255.0 / peak(image);

    let mut buf = GrayImage::new(cols as u32, rows as u32);
    for row in 0..rows {
        for col in 0..cols {
            let value = (image[[row, col]].max(0.0) * scale).min(255.0) as u8;
            buf.put_pixel(col as u32, row as u32, Luma([value]));
        }
    }

    buf.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Load a raster PSF image (any format `image` understands) and normalize
/// it to unit sum, ready for [`sbmodel_core::PsfKernel::from_array`].
pub fn load_psf_raster(path: &Path) -> Result<Array2<f64>> {
    let img = image::open(path)
        .with_context(|| format!("failed to read PSF image {}", path.display()))?
        .to_luma32f();
    let (cols, rows) = img.dimensions();

    let mut weights = Array2::<f64>::zeros((rows as usize, cols as usize));
    let mut sum = 0.0;
    for (x, y, pixel) in img.enumerate_pixels() {
        let v = pixel.0[0] as f64;
        weights[[y as usize, x as usize]] = v;
        sum += v;
    }
    if sum <= 0.0 {
        anyhow::bail!("PSF image {} has non-positive total weight", path.display());
    }
    weights.mapv_inplace(|v| v / sum);
    Ok(weights)
}
