//! Image fitting: place one image on a white A4 canvas.
//!
//! The image is scaled by a single factor so it fills as much of the
//! margin-inset content area as possible. Unlike thumbnailing, the factor may
//! exceed 1: a 200 px search thumbnail still fills the page. Nothing is ever
//! cropped or stretched.
//!
//! [`compute_layout`] does the geometry only; [`fit_to_page`] renders it.

use crate::config::Orientation;
use crate::error::GenerateError;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::debug;

/// A4 short edge, inches.
pub const A4_WIDTH_IN: f64 = 8.27;
/// A4 long edge, inches.
pub const A4_HEIGHT_IN: f64 = 11.69;
/// Largest accepted margin ratio.
pub const MAX_MARGIN_RATIO: f64 = 0.2;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Pixel size of an A4 page at `dpi` in the given orientation.
///
/// Fractional pixels are truncated. At 300 DPI this is 2481 × 3507
/// (portrait); at 150 DPI it is 1240 × 1753.
pub fn page_size(orientation: Orientation, dpi: u32) -> (u32, u32) {
    let short = (A4_WIDTH_IN * f64::from(dpi)) as u32;
    let long = (A4_HEIGHT_IN * f64::from(dpi)) as u32;
    match orientation {
        Orientation::Portrait => (short, long),
        Orientation::Landscape => (long, short),
    }
}

/// Clamp a margin ratio into `[0.0, MAX_MARGIN_RATIO]`. NaN becomes 0.
pub fn clamp_margin_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, MAX_MARGIN_RATIO)
    }
}

/// Where the scaled image sits on the page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Full page geometry for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub page_width: u32,
    pub page_height: u32,
    /// Effective (clamped) margin ratio.
    pub margin_ratio: f64,
    /// Margin in pixels, the same on all four sides.
    pub margin: u32,
    pub content_width: u32,
    pub content_height: u32,
    /// Aspect-preserving scale factor; may exceed 1.
    pub scale: f64,
    pub placement: Placement,
}

/// Compute the placement of an `image_width` × `image_height` image.
///
/// The margin is `margin_ratio × page_width` on every side, including top
/// and bottom. Offsets use integer halving, so odd residuals put the extra
/// pixel on the right/bottom.
pub fn compute_layout(
    image_width: u32,
    image_height: u32,
    orientation: Orientation,
    margin_ratio: f64,
    dpi: u32,
) -> Result<PageLayout, GenerateError> {
    if image_width == 0 || image_height == 0 {
        return Err(GenerateError::InvalidImageSize {
            width: image_width,
            height: image_height,
        });
    }

    let (page_width, page_height) = page_size(orientation, dpi);
    let margin_ratio = clamp_margin_ratio(margin_ratio);
    let margin = (margin_ratio * f64::from(page_width)) as u32;
    let content_width = page_width.saturating_sub(2 * margin);
    let content_height = page_height.saturating_sub(2 * margin);

    let scale = (f64::from(content_width) / f64::from(image_width))
        .min(f64::from(content_height) / f64::from(image_height));

    let width = ((f64::from(image_width) * scale).round() as u32).clamp(1, content_width.max(1));
    let height =
        ((f64::from(image_height) * scale).round() as u32).clamp(1, content_height.max(1));

    let placement = Placement {
        x: (page_width - width) / 2,
        y: (page_height - height) / 2,
        width,
        height,
    };

    Ok(PageLayout {
        orientation,
        page_width,
        page_height,
        margin_ratio,
        margin,
        content_width,
        content_height,
        scale,
        placement,
    })
}

/// One composited page, ready for the document encoder.
#[derive(Debug, Clone)]
pub struct FittedPage {
    /// Canvas-sized RGB raster.
    pub image: RgbImage,
    pub orientation: Orientation,
    pub placement: Placement,
}

impl FittedPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Resample `source` with Lanczos3 and centre it on a white page.
pub fn fit_to_page(
    source: &RgbImage,
    orientation: Orientation,
    margin_ratio: f64,
    dpi: u32,
) -> Result<FittedPage, GenerateError> {
    let layout = compute_layout(
        source.width(),
        source.height(),
        orientation,
        margin_ratio,
        dpi,
    )?;
    let p = layout.placement;

    debug!(
        "Fitting {}x{} → {}x{} at ({}, {}) on {} {}x{} page (scale {:.3})",
        source.width(),
        source.height(),
        p.width,
        p.height,
        p.x,
        p.y,
        orientation,
        layout.page_width,
        layout.page_height,
        layout.scale
    );

    let resized = imageops::resize(source, p.width, p.height, FilterType::Lanczos3);
    let mut canvas = RgbImage::from_pixel(layout.page_width, layout.page_height, WHITE);
    imageops::overlay(&mut canvas, &resized, i64::from(p.x), i64::from(p.y));

    Ok(FittedPage {
        image: canvas,
        orientation,
        placement: p,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_at_300_dpi() {
        assert_eq!(page_size(Orientation::Portrait, 300), (2481, 3507));
        assert_eq!(page_size(Orientation::Landscape, 300), (3507, 2481));
    }

    #[test]
    fn page_size_truncates_fractional_pixels() {
        assert_eq!(page_size(Orientation::Portrait, 150), (1240, 1753));
        assert_eq!(page_size(Orientation::Portrait, 72), (595, 841));
    }

    #[test]
    fn margin_ratio_is_clamped() {
        assert_eq!(clamp_margin_ratio(-0.5), 0.0);
        assert_eq!(clamp_margin_ratio(0.9), MAX_MARGIN_RATIO);
        assert_eq!(clamp_margin_ratio(0.05), 0.05);
        assert_eq!(clamp_margin_ratio(f64::NAN), 0.0);

        let l = compute_layout(100, 100, Orientation::Portrait, 3.0, 300).unwrap();
        assert_eq!(l.margin_ratio, MAX_MARGIN_RATIO);
        assert_eq!(l.margin, (0.2 * 2481.0) as u32);

        let l = compute_layout(100, 100, Orientation::Portrait, -1.0, 300).unwrap();
        assert_eq!(l.margin, 0);
    }

    #[test]
    fn margin_follows_page_width_on_both_axes() {
        let l = compute_layout(300, 200, Orientation::Landscape, 0.03, 300).unwrap();
        assert_eq!(l.margin, 105); // 0.03 × 3507
        assert_eq!(l.content_width, 3507 - 210);
        assert_eq!(l.content_height, 2481 - 210);

        let l = compute_layout(300, 200, Orientation::Portrait, 0.03, 300).unwrap();
        assert_eq!(l.margin, 74); // 0.03 × 2481
        assert_eq!(l.content_height, 3507 - 148);
    }

    #[test]
    fn wide_image_on_landscape_page() {
        let l = compute_layout(300, 200, Orientation::Landscape, 0.03, 300).unwrap();
        assert_eq!(l.placement.width, 3297);
        assert_eq!(l.placement.height, 2198);
        assert_eq!(l.placement.x, 105);
        assert_eq!(l.placement.y, (2481 - 2198) / 2);
    }

    #[test]
    fn upscales_small_images() {
        let l = compute_layout(40, 30, Orientation::Landscape, 0.0, 300).unwrap();
        assert!(l.scale > 1.0);
        assert!(l.placement.width == l.content_width || l.placement.height == l.content_height);
    }

    #[test]
    fn downscales_large_images() {
        let l = compute_layout(10_000, 20_000, Orientation::Portrait, 0.03, 300).unwrap();
        assert!(l.scale < 1.0);
        assert!(l.placement.width <= l.content_width);
        assert!(l.placement.height <= l.content_height);
    }

    #[test]
    fn stays_inside_content_and_keeps_aspect() {
        let sizes = [
            (1, 1),
            (1, 5000),
            (5000, 1),
            (333, 777),
            (1920, 1080),
            (640, 480),
            (17, 3),
            (2481, 3507),
        ];
        for &(w, h) in &sizes {
            for orientation in [Orientation::Portrait, Orientation::Landscape] {
                for margin in [0.0, 0.03, 0.2] {
                    let l = compute_layout(w, h, orientation, margin, 300).unwrap();
                    let p = l.placement;
                    assert!(p.width >= 1 && p.height >= 1);
                    assert!(p.width <= l.content_width, "{w}x{h} {orientation} {margin}");
                    assert!(p.height <= l.content_height, "{w}x{h} {orientation} {margin}");

                    if p.width == 1 || p.height == 1 {
                        // 1 px floor applied; aspect no longer representable.
                        continue;
                    }
                    // Rounding moves each side by at most half a pixel.
                    let src = f64::from(w) / f64::from(h);
                    let lo = (f64::from(p.width) - 0.5).max(0.5) / (f64::from(p.height) + 0.5);
                    let hi = (f64::from(p.width) + 0.5) / (f64::from(p.height) - 0.5).max(0.5);
                    assert!(lo <= src && src <= hi, "{w}x{h}: {}x{}", p.width, p.height);
                }
            }
        }
    }

    #[test]
    fn placement_is_centred() {
        let l = compute_layout(640, 480, Orientation::Portrait, 0.05, 300).unwrap();
        let p = l.placement;
        let left = p.x;
        let right = l.page_width - p.x - p.width;
        let top = p.y;
        let bottom = l.page_height - p.y - p.height;
        assert!(right - left <= 1);
        assert!(bottom - top <= 1);
    }

    #[test]
    fn tiny_result_is_at_least_one_pixel() {
        let l = compute_layout(1, 100_000, Orientation::Landscape, 0.2, 72).unwrap();
        assert_eq!(l.placement.width, 1);
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let err = compute_layout(0, 10, Orientation::Portrait, 0.03, 300).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::InvalidImageSize { width: 0, height: 10 }
        ));
        let err = fit_to_page(&RgbImage::new(5, 0), Orientation::Portrait, 0.0, 72).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidImageSize { .. }));
    }

    #[test]
    fn composite_has_white_border_and_image_centre() {
        let red = RgbImage::from_pixel(40, 20, Rgb([200, 10, 10]));
        let page = fit_to_page(&red, Orientation::Landscape, 0.05, 72).unwrap();

        let (pw, ph) = page_size(Orientation::Landscape, 72);
        assert_eq!((page.width(), page.height()), (pw, ph));
        assert_eq!(page.orientation, Orientation::Landscape);

        assert_eq!(*page.image.get_pixel(0, 0), WHITE);
        assert_eq!(*page.image.get_pixel(pw - 1, ph - 1), WHITE);

        let p = page.placement;
        let centre = page.image.get_pixel(p.x + p.width / 2, p.y + p.height / 2);
        assert_eq!(*centre, Rgb([200, 10, 10]));
        // Just above the image is background.
        if p.y > 0 {
            assert_eq!(*page.image.get_pixel(p.x + p.width / 2, p.y - 1), WHITE);
        }
    }
}
