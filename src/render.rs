use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::{
    DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage, imageops,
};
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;
use thiserror::Error;

use crate::roi::RoiRect;

/// Horizontal gap between frames in a combined snapshot, in pixels.
const COMBINE_GAP: u32 = 10;

const OUTLINE_THICKNESS: usize = 2;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image dimensions do not match pixel data")]
    InvalidDimensions,

    #[error("no frames to save")]
    NoFrames,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// ROI rectangle to draw onto a snapshot, with its display color.
#[derive(Debug, Clone, Copy)]
pub struct RoiOverlay {
    pub rect: RoiRect,
    pub color: Rgb<u8>,
}

/// Paths written by a snapshot export: one file per frame plus the
/// combined strip.
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub combined: PathBuf,
    pub individual: Vec<PathBuf>,
}

/// Convert a display frame into an 8-bit grayscale image.
pub(crate) fn luma_image(display: &Array2<u8>) -> Result<GrayImage, RenderError> {
    let (height, width) = display.dim();
    let pixel_data: Vec<u8> = display.into_par_iter().copied().collect();
    ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
        .ok_or(RenderError::InvalidDimensions)
}

/// Encode a display frame as PNG bytes.
pub fn encode_png(display: &Array2<u8>) -> Result<Vec<u8>, RenderError> {
    let image = luma_image(display)?;
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Save labelled display frames as individual PNG files plus one combined
/// strip.
///
/// Frames are laid out left to right with a white gap, vertically
/// centered. File names are `{label}[-ROI]-{timestamp}.png`; the combined
/// file joins every label.
pub fn save_snapshots(
    out_dir: &Path,
    frames: &[(String, Array2<u8>)],
    overlays: Option<&[Option<RoiOverlay>]>,
) -> Result<SnapshotOutcome, RenderError> {
    if frames.is_empty() {
        return Err(RenderError::NoFrames);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let tag = if overlays.is_some() { "-ROI" } else { "" };

    let mut images = Vec::with_capacity(frames.len());
    for (index, (_, display)) in frames.iter().enumerate() {
        let gray = luma_image(display)?;
        let overlay = overlays.and_then(|all| all.get(index).copied().flatten());
        images.push(match overlay {
            Some(overlay) => {
                let mut rgb = DynamicImage::ImageLuma8(gray).to_rgb8();
                draw_roi_outline(&mut rgb, overlay);
                DynamicImage::ImageRgb8(rgb)
            }
            None => DynamicImage::ImageLuma8(gray),
        });
    }

    let mut individual = Vec::with_capacity(images.len());
    for (image, (label, _)) in images.iter().zip(frames) {
        let path = out_dir.join(format!("{label}{tag}-{timestamp}.png"));
        image.save(&path)?;
        individual.push(path);
    }

    let labels: Vec<&str> = frames.iter().map(|(label, _)| label.as_str()).collect();
    let combined = out_dir.join(format!("{}{tag}-{timestamp}.png", labels.join("-")));
    combine_horizontal(&images).save(&combined)?;
    debug!(
        "saved {} snapshot files to {}",
        individual.len() + 1,
        out_dir.display()
    );

    Ok(SnapshotOutcome {
        combined,
        individual,
    })
}

fn combine_horizontal(images: &[DynamicImage]) -> DynamicImage {
    if images.len() == 1 {
        return images[0].clone();
    }

    let max_height = images.iter().map(|image| image.height()).max().unwrap_or(0);
    let total_width = images.iter().map(|image| image.width()).sum::<u32>()
        + COMBINE_GAP * images.len().saturating_sub(1) as u32;
    let has_color = images
        .iter()
        .any(|image| matches!(image, DynamicImage::ImageRgb8(_)));

    if has_color {
        let mut canvas = RgbImage::from_pixel(total_width, max_height, Rgb([255, 255, 255]));
        let mut x_offset = 0_u32;
        for image in images {
            let rgb = image.to_rgb8();
            let y_offset = (max_height - rgb.height()) / 2;
            imageops::replace(&mut canvas, &rgb, i64::from(x_offset), i64::from(y_offset));
            x_offset += rgb.width() + COMBINE_GAP;
        }
        DynamicImage::ImageRgb8(canvas)
    } else {
        let mut canvas = GrayImage::from_pixel(total_width, max_height, Luma([255]));
        let mut x_offset = 0_u32;
        for image in images {
            let gray = image.to_luma8();
            let y_offset = (max_height - gray.height()) / 2;
            imageops::replace(&mut canvas, &gray, i64::from(x_offset), i64::from(y_offset));
            x_offset += gray.width() + COMBINE_GAP;
        }
        DynamicImage::ImageLuma8(canvas)
    }
}

/// Draw the ROI rectangle as a 2-px outline; pixels away from the outline
/// are left untouched.
fn draw_roi_outline(image: &mut RgbImage, overlay: RoiOverlay) {
    let x0 = overlay.rect.x;
    let y0 = overlay.rect.y;
    let x1 = x0.saturating_add(overlay.rect.width);
    let y1 = y0.saturating_add(overlay.rect.height);

    for inset in 0..OUTLINE_THICKNESS {
        for x in x0..=x1 {
            put_pixel(image, x, y0.saturating_add(inset), overlay.color);
            put_pixel(image, x, y1.saturating_sub(inset), overlay.color);
        }
        for y in y0..=y1 {
            put_pixel(image, x0.saturating_add(inset), y, overlay.color);
            put_pixel(image, x1.saturating_sub(inset), y, overlay.color);
        }
    }
}

fn put_pixel(image: &mut RgbImage, x: usize, y: usize, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    if (x as u64) < u64::from(width) && (y as u64) < u64::from(height) {
        image.put_pixel(x as u32, y as u32, color);
    }
}
