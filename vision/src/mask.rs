use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

pub const FOREGROUND: u8 = 255;

/// Radius of the disk used for cleanup, a 5x5 neighborhood.
pub const KERNEL_RADIUS: u8 = 2;

/// Binary mask of pixels whose three channels all lie within
/// `lower..=upper`. Each channel is tested independently.
pub fn in_range(hsv: &RgbImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    let (width, height) = hsv.dimensions();
    let mut mask = GrayImage::new(width, height);
    for (src, dst) in hsv.pixels().zip(mask.pixels_mut()) {
        let inside = (0..3).all(|c| lower[c] <= src.0[c] && src.0[c] <= upper[c]);
        if inside {
            *dst = Luma([FOREGROUND]);
        }
    }
    mask
}

/// Close (bridge small gaps) and then open (drop isolated specks) with a
/// Euclidean disk. Closing runs first so thin true positives are joined
/// before the opening gets a chance to erase them.
pub fn clean(mask: &GrayImage) -> GrayImage {
    let closed = close(mask, Norm::L2, KERNEL_RADIUS);
    open(&closed, Norm::L2, KERNEL_RADIUS)
}

pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    #[test]
    fn in_range_is_inclusive_per_channel() {
        let mut hsv = RgbImage::new(4, 1);
        hsv.put_pixel(0, 0, Rgb([100, 50, 50])); // exactly at lower
        hsv.put_pixel(1, 0, Rgb([130, 255, 255])); // exactly at upper
        hsv.put_pixel(2, 0, Rgb([131, 200, 200])); // hue just over
        hsv.put_pixel(3, 0, Rgb([115, 49, 200])); // sat just under

        let mask = in_range(&hsv, [100, 50, 50], [130, 255, 255]);
        assert_eq!(mask.get_pixel(0, 0).0[0], FOREGROUND);
        assert_eq!(mask.get_pixel(1, 0).0[0], FOREGROUND);
        assert_eq!(mask.get_pixel(2, 0).0[0], 0);
        assert_eq!(mask.get_pixel(3, 0).0[0], 0);
    }

    #[test]
    fn inverted_bounds_give_empty_mask() {
        let hsv = RgbImage::from_pixel(8, 8, Rgb([120, 200, 200]));
        let mask = in_range(&hsv, [130, 50, 50], [100, 255, 255]);
        assert_eq!(foreground_count(&mask), 0);
    }

    #[test]
    fn opening_removes_specks() {
        let mut mask = GrayImage::new(40, 40);
        mask.put_pixel(5, 5, Luma([FOREGROUND]));
        mask.put_pixel(30, 12, Luma([FOREGROUND]));
        mask.put_pixel(31, 12, Luma([FOREGROUND]));
        assert_eq!(foreground_count(&clean(&mask)), 0);
    }

    #[test]
    fn closing_bridges_one_pixel_gap() {
        let mut mask = GrayImage::new(60, 40);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(15, 20), Luma([FOREGROUND]));
        draw_filled_rect_mut(&mut mask, Rect::at(26, 10).of_size(15, 20), Luma([FOREGROUND]));
        // column 25 is the gap
        assert_eq!(mask.get_pixel(25, 20).0[0], 0);

        let cleaned = clean(&mask);
        assert_eq!(cleaned.get_pixel(25, 20).0[0], FOREGROUND);
    }

    #[test]
    fn cleanup_is_idempotent_on_clean_mask() {
        let mut mask = GrayImage::new(120, 100);
        draw_filled_circle_mut(&mut mask, (40, 50), 20, Luma([FOREGROUND]));
        draw_filled_rect_mut(&mut mask, Rect::at(75, 20).of_size(30, 60), Luma([FOREGROUND]));

        let once = clean(&mask);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_mask_stays_empty() {
        let mask = GrayImage::new(32, 32);
        assert_eq!(foreground_count(&clean(&mask)), 0);
    }
}
