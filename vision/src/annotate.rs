use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};

use crate::blob::Blob;
use crate::glyph::{draw_text_mut, GLYPH_HEIGHT};

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

const CENTER_RADIUS: i32 = 5;
const LABEL_SCALE: u32 = 2;
const LABEL_OFFSET_X: i32 = 10;

/// Draw every blob onto a copy of `frame`. Blobs are labeled 1, 2, ... in
/// the order given.
pub fn annotate(frame: &RgbImage, blobs: &[Blob]) -> RgbImage {
    let mut out = frame.clone();
    for (i, blob) in blobs.iter().enumerate() {
        draw_blob(&mut out, blob, i + 1);
    }
    out
}

fn draw_blob(image: &mut RgbImage, blob: &Blob, label: usize) {
    draw_outline(image, blob);

    let Some((cx, cy)) = blob.centroid else {
        return;
    };
    let (cx, cy) = (cx.round() as i32, cy.round() as i32);

    draw_filled_circle_mut(image, (cx, cy), CENTER_RADIUS, CENTER_COLOR);
    draw_text_mut(
        image,
        &label.to_string(),
        cx + LABEL_OFFSET_X,
        cy - (GLYPH_HEIGHT * LABEL_SCALE / 2) as i32,
        LABEL_SCALE,
        LABEL_COLOR,
    );
    draw_hollow_rect_mut(image, blob.bounding_rect, BOX_COLOR);
}

/// Closed polyline two pixels wide: the segment plus copies shifted right
/// and down.
fn draw_outline(image: &mut RgbImage, blob: &Blob) {
    let points = &blob.outline;
    let n = points.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        let p = points[0];
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < image.width() && (p.y as u32) < image.height() {
            image.put_pixel(p.x as u32, p.y as u32, OUTLINE_COLOR);
        }
        return;
    }

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        for (ox, oy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            draw_line_segment_mut(
                image,
                (a.x as f32 + ox, a.y as f32 + oy),
                (b.x as f32 + ox, b.y as f32 + oy),
                OUTLINE_COLOR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect;
    use crate::params::DetectionParameters;
    use imageproc::point::Point;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn frame_with_cap() -> RgbImage {
        let mut frame = RgbImage::from_pixel(160, 120, Rgb([60, 60, 60]));
        draw_filled_circle_mut(&mut frame, (60, 60), 20, BLUE);
        frame
    }

    #[test]
    fn input_is_left_untouched() {
        let frame = frame_with_cap();
        let before = frame.clone();
        let blobs = detect(&frame, &DetectionParameters::default());
        let out = annotate(&frame, &blobs);
        assert_eq!(frame, before);
        assert_ne!(out, before);
        assert_eq!(out.dimensions(), frame.dimensions());
    }

    #[test]
    fn marks_center_box_and_outline() {
        let frame = frame_with_cap();
        let blobs = detect(&frame, &DetectionParameters::default());
        assert_eq!(blobs.len(), 1);
        let out = annotate(&frame, &blobs);

        let (cx, cy) = blobs[0].centroid.unwrap();
        assert_eq!(out.get_pixel(cx.round() as u32, cy.round() as u32), &CENTER_COLOR);

        let rect = blobs[0].bounding_rect;
        assert_eq!(out.get_pixel(rect.left() as u32, rect.top() as u32), &BOX_COLOR);
        assert_eq!(out.get_pixel(rect.right() as u32, rect.bottom() as u32), &BOX_COLOR);

        assert!(out.pixels().any(|p| *p == OUTLINE_COLOR));
        assert!(out.pixels().any(|p| *p == LABEL_COLOR));
    }

    #[test]
    fn no_blobs_is_a_plain_copy() {
        let frame = frame_with_cap();
        assert_eq!(annotate(&frame, &[]), frame);
    }

    #[test]
    fn zero_area_blob_gets_outline_only() {
        let frame = RgbImage::new(30, 30);
        let sliver = Blob::from_outline(vec![Point::new(5, 5), Point::new(15, 5)]).unwrap();
        assert!(sliver.centroid.is_none());

        let out = annotate(&frame, &[sliver]);
        assert_eq!(out.get_pixel(10, 5), &OUTLINE_COLOR);
        assert!(!out.pixels().any(|p| *p == CENTER_COLOR || *p == BOX_COLOR));
    }
}
