//! Orientation selection: portrait vs. landscape per image.

use crate::config::{Orientation, OrientationMode};

/// Aspect ratio (width / height) at or above which `Auto` picks landscape.
///
/// A square image lands on a landscape page.
pub const LANDSCAPE_THRESHOLD: f64 = 1.0;

/// Pick the page orientation for an image of `width` × `height` pixels.
///
/// Explicit modes are returned verbatim without looking at the dimensions.
/// A zero height is read as aspect 1.0.
pub fn select_orientation(mode: OrientationMode, width: u32, height: u32) -> Orientation {
    match mode {
        OrientationMode::Portrait => Orientation::Portrait,
        OrientationMode::Landscape => Orientation::Landscape,
        OrientationMode::Auto => {
            let aspect = if height == 0 {
                1.0
            } else {
                f64::from(width) / f64::from(height)
            };
            if aspect >= LANDSCAPE_THRESHOLD {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_wide_is_landscape() {
        assert_eq!(
            select_orientation(OrientationMode::Auto, 1600, 900),
            Orientation::Landscape
        );
    }

    #[test]
    fn auto_tall_is_portrait() {
        assert_eq!(
            select_orientation(OrientationMode::Auto, 900, 1600),
            Orientation::Portrait
        );
    }

    #[test]
    fn auto_square_ties_to_landscape() {
        assert_eq!(
            select_orientation(OrientationMode::Auto, 512, 512),
            Orientation::Landscape
        );
        assert_eq!(
            select_orientation(OrientationMode::Auto, 1, 1),
            Orientation::Landscape
        );
    }

    #[test]
    fn auto_just_below_square_is_portrait() {
        assert_eq!(
            select_orientation(OrientationMode::Auto, 999, 1000),
            Orientation::Portrait
        );
    }

    #[test]
    fn zero_height_reads_as_square() {
        assert_eq!(
            select_orientation(OrientationMode::Auto, 40, 0),
            Orientation::Landscape
        );
    }

    #[test]
    fn explicit_modes_ignore_the_image() {
        for (w, h) in [(10, 1000), (1000, 10), (0, 0)] {
            assert_eq!(
                select_orientation(OrientationMode::Portrait, w, h),
                Orientation::Portrait
            );
            assert_eq!(
                select_orientation(OrientationMode::Landscape, w, h),
                Orientation::Landscape
            );
        }
    }

    #[test]
    fn same_input_same_output() {
        let a = select_orientation(OrientationMode::Auto, 1234, 987);
        let b = select_orientation(OrientationMode::Auto, 1234, 987);
        assert_eq!(a, b);
    }
}
