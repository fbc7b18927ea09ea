use image::{Rgb, RgbImage};

/// Convert one RGB pixel to 8-bit HSV.
///
/// Hue is halved into 0..=179 so it fits a byte, saturation and value span
/// 0..=255. Grays (max == min) get hue 0.
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let mut h8 = (h / 2.0).round() as u32;
    if h8 >= 180 {
        h8 -= 180;
    }

    [h8 as u8, s.round() as u8, v as u8]
}

/// Convert a whole frame. Channels of the result are (H, S, V).
pub fn to_hsv(frame: &RgbImage) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut out = RgbImage::new(width, height);
    for (src, dst) in frame.pixels().zip(out.pixels_mut()) {
        *dst = Rgb(rgb_to_hsv(*src));
    }
    out
}
