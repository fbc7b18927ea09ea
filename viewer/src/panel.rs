//! Control panel overlay drawn into the corner of each displayed frame.

use capscan_vision::glyph::{draw_text_mut, text_width, GLYPH_HEIGHT};
use image::{Rgb, RgbImage};

use crate::controls::{Control, ControlPanel};
use crate::playback::ViewMode;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const SELECTED_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const PAUSED_COLOR: Rgb<u8> = Rgb([255, 96, 96]);
const MARGIN: u32 = 6;
/// Fraction of brightness removed behind the text, out of 255.
const SHADE: u8 = 160;

/// Playback facts shown above the controls.
#[derive(Debug, Clone, Copy)]
pub struct PanelStatus {
    pub paused: bool,
    pub cap_count: usize,
    pub view: ViewMode,
}

pub fn draw_panel(image: &mut RgbImage, panel: &ControlPanel, status: &PanelStatus) {
    let scale = if image.width() >= 800 { 2 } else { 1 };
    let line_height = (GLYPH_HEIGHT + 3) * scale;

    let mut lines: Vec<(String, Rgb<u8>)> = Vec::with_capacity(Control::ALL.len() + 2);
    let (state, state_color) = if status.paused {
        ("PAUSED", PAUSED_COLOR)
    } else {
        ("PLAYING", TEXT_COLOR)
    };
    lines.push((
        format!("{state}  SPEED {:.1}X", panel.params.speed_factor()),
        state_color,
    ));
    lines.push((
        format!("CAPS: {}  VIEW: {}", status.cap_count, status.view.label()),
        TEXT_COLOR,
    ));

    let selected = panel.selected();
    for control in Control::ALL {
        let (min, max) = control.range();
        let marker = if control == selected { '>' } else { ' ' };
        let value = panel.value(control, status.paused);
        let color = if control == selected { SELECTED_COLOR } else { TEXT_COLOR };
        lines.push((
            format!("{marker} {:<9} {value:>6} ({min}-{max})", control.label()),
            color,
        ));
    }

    let width = lines
        .iter()
        .map(|(text, _)| text_width(text, scale))
        .max()
        .unwrap_or(0)
        + 2 * MARGIN;
    let height = lines.len() as u32 * line_height + 2 * MARGIN;
    shade_rect(image, 0, 0, width, height, SHADE);

    for (i, (text, color)) in lines.iter().enumerate() {
        let y = MARGIN + i as u32 * line_height;
        draw_text_mut(image, text, MARGIN as i32, y as i32, scale, *color);
    }
}

/// Darken a rectangle in place, clipped to the image.
fn shade_rect(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, darkness: u8) {
    let factor = (255 - darkness) as u16;
    let x_end = x.saturating_add(w).min(image.width());
    let y_end = y.saturating_add(h).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            let pixel = image.get_pixel_mut(px, py);
            for c in pixel.0.iter_mut() {
                *c = ((*c as u16 * factor) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capscan_vision::DetectionParameters;

    fn status() -> PanelStatus {
        PanelStatus {
            paused: false,
            cap_count: 2,
            view: ViewMode::Annotated,
        }
    }

    #[test]
    fn draws_in_top_left_only() {
        let mut image = RgbImage::from_pixel(640, 480, Rgb([200, 200, 200]));
        let panel = ControlPanel::new(DetectionParameters::default());
        draw_panel(&mut image, &panel, &status());

        assert_ne!(image.get_pixel(1, 1), &Rgb([200, 200, 200]));
        assert_eq!(image.get_pixel(639, 479), &Rgb([200, 200, 200]));
        assert!(image.pixels().any(|p| *p == SELECTED_COLOR));
    }

    #[test]
    fn tiny_frame_does_not_panic() {
        let mut image = RgbImage::new(20, 10);
        let panel = ControlPanel::new(DetectionParameters::default());
        draw_panel(&mut image, &panel, &status());
    }

    #[test]
    fn shading_darkens() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        shade_rect(&mut image, 0, 0, 2, 2, 255);
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(3, 3), &Rgb([255, 255, 255]));
    }
}
