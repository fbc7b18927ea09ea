use image::{imageops, GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use tracing::debug;

use crate::blob::Blob;
use crate::hsv::to_hsv;
use crate::mask::{clean, foreground_count, in_range};
use crate::params::DetectionParameters;

/// Intermediate images of one detection pass, kept for the debug views.
#[derive(Debug, Clone)]
pub struct DetectionStages {
    /// Raw color-range mask.
    pub mask: GrayImage,
    /// Mask after close-then-open cleanup.
    pub cleaned: GrayImage,
    pub blobs: Vec<Blob>,
}

/// Find blue cap candidates in `frame`.
///
/// Blobs come back in contour discovery order (raster scan of the cleaned
/// mask). Only the area bounds gate acceptance; circularity and aspect ratio
/// are measured on each blob and left to the caller.
pub fn detect(frame: &RgbImage, params: &DetectionParameters) -> Vec<Blob> {
    detect_stages(frame, params).blobs
}

pub fn detect_stages(frame: &RgbImage, params: &DetectionParameters) -> DetectionStages {
    let hsv = to_hsv(frame);
    let mask = in_range(&hsv, params.lower, params.upper);

    if foreground_count(&mask) == 0 {
        return DetectionStages {
            cleaned: mask.clone(),
            mask,
            blobs: Vec::new(),
        };
    }

    let cleaned = clean(&mask);
    let outlines = outer_outlines(&cleaned);
    let outer_count = outlines.len();

    let blobs: Vec<Blob> = outlines
        .into_iter()
        .filter_map(Blob::from_outline)
        .filter(|b| params.accepts_area(b.area))
        .collect();

    debug!(
        outer_contours = outer_count,
        accepted = blobs.len(),
        round = blobs.iter().filter(|b| b.looks_round()).count(),
        "detection pass"
    );

    DetectionStages {
        mask,
        cleaned,
        blobs,
    }
}

/// Outer boundaries of the top-level foreground regions, in image
/// coordinates.
///
/// The tracer never starts a border on column 0, so the mask is traced
/// inside a one pixel background frame and the points shifted back.
fn outer_outlines(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    let (width, height) = mask.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const GRAY: Rgb<u8> = Rgb([90, 90, 90]);

    fn gray_frame(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, GRAY)
    }

    #[test]
    fn single_blue_circle() {
        let mut frame = gray_frame(160, 120);
        draw_filled_circle_mut(&mut frame, (80, 60), 20, BLUE);

        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);

        let expected = std::f64::consts::PI * 20.0 * 20.0;
        let area = blobs[0].area;
        assert!(
            (area - expected).abs() / expected < 0.05,
            "area {area} not within 5% of {expected}"
        );
        assert!(blobs[0].looks_round());
    }

    #[test]
    fn solid_red_frame_has_no_blobs() {
        let frame = RgbImage::from_pixel(64, 48, RED);
        let mut params = DetectionParameters::default();
        params.min_area = 0;
        params.max_area = u32::MAX;
        assert!(detect(&frame, &params).is_empty());
    }

    #[test]
    fn empty_mask_yields_nothing() {
        let frame = gray_frame(32, 32);
        let stages = detect_stages(&frame, &DetectionParameters::default());
        assert_eq!(foreground_count(&stages.mask), 0);
        assert!(stages.blobs.is_empty());
    }

    #[test]
    fn every_blob_respects_area_bounds() {
        let mut frame = gray_frame(240, 160);
        draw_filled_circle_mut(&mut frame, (40, 40), 4, BLUE); // ~50 px
        draw_filled_circle_mut(&mut frame, (120, 40), 12, BLUE); // ~450 px
        draw_filled_circle_mut(&mut frame, (190, 90), 30, BLUE); // ~2800 px
        draw_filled_rect_mut(&mut frame, Rect::at(20, 105).of_size(60, 45), BLUE); // ~2600 px

        let mut params = DetectionParameters::default();
        params.min_area = 300;
        params.max_area = 2000;

        let blobs = detect(&frame, &params);
        assert!(!blobs.is_empty());
        for blob in &blobs {
            assert!(
                blob.area >= 300.0 && blob.area <= 2000.0,
                "area {} escaped the bounds",
                blob.area
            );
        }
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn shape_is_not_a_gate() {
        // A long thin bar is nowhere near round but still passes on area
        let mut frame = gray_frame(200, 60);
        draw_filled_rect_mut(&mut frame, Rect::at(10, 25).of_size(150, 8), BLUE);

        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);
        assert!(!blobs[0].looks_round());
    }

    #[test]
    fn nested_regions_are_ignored() {
        // Blue ring with a blue dot inside the hole: only the ring's outer
        // boundary counts
        let mut frame = gray_frame(160, 160);
        draw_filled_circle_mut(&mut frame, (80, 80), 50, BLUE);
        draw_filled_circle_mut(&mut frame, (80, 80), 30, GRAY);
        draw_filled_circle_mut(&mut frame, (80, 80), 10, BLUE);

        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);
        assert!(blobs[0].area > 7000.0);
    }

    #[test]
    fn filled_rectangle_centroid() {
        let mut frame = gray_frame(120, 100);
        draw_filled_rect_mut(&mut frame, Rect::at(20, 30).of_size(40, 20), BLUE);

        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);
        let (cx, cy) = blobs[0].centroid.unwrap();
        assert!((cx - 39.5).abs() <= 1.0, "cx {cx}");
        assert!((cy - 39.5).abs() <= 1.0, "cy {cy}");
    }

    #[test]
    fn two_caps_counted_separately() {
        let mut frame = gray_frame(200, 100);
        draw_filled_circle_mut(&mut frame, (50, 50), 15, BLUE);
        draw_filled_circle_mut(&mut frame, (150, 50), 15, BLUE);
        assert_eq!(detect(&frame, &DetectionParameters::default()).len(), 2);
    }

    #[test]
    fn cap_touching_left_edge() {
        let mut frame = gray_frame(100, 100);
        draw_filled_rect_mut(&mut frame, Rect::at(0, 30).of_size(30, 30), BLUE);

        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounding_rect, Rect::at(0, 30).of_size(30, 30));
        // Opening rounds the corners off a little
        let area = blobs[0].area;
        assert!(area > 800.0 && area <= 29.0 * 29.0, "area {area}");
    }

    #[test]
    fn half_cap_cut_by_each_edge() {
        let centers = [(0, 50), (50, 0), (99, 50), (50, 99)];
        for center in centers {
            let mut frame = gray_frame(100, 100);
            draw_filled_circle_mut(&mut frame, center, 20, BLUE);
            let blobs = detect(&frame, &DetectionParameters::default());
            assert_eq!(blobs.len(), 1, "cap centered at {center:?}");
            assert!(blobs[0].area > 400.0, "cap centered at {center:?}");
        }
    }

    #[test]
    fn frame_entirely_in_range() {
        let frame = RgbImage::from_pixel(64, 48, BLUE);
        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounding_rect, Rect::at(0, 0).of_size(64, 48));
        assert!((blobs[0].area - 63.0 * 47.0).abs() < 1e-9);
    }
}
