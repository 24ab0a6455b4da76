use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::YearFlag;

// ---------------------------------------------------------------------------
// Series palette – one colour per year
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting from blue.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = 215.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.70, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Colour of each year's series in the line and bar charts.
#[derive(Debug, Clone)]
pub struct YearColors {
    mapping: BTreeMap<YearFlag, Color32>,
}

impl Default for YearColors {
    fn default() -> Self {
        let mapping = YearFlag::ALL
            .into_iter()
            .zip(generate_palette(YearFlag::ALL.len()))
            .collect();
        YearColors { mapping }
    }
}

impl YearColors {
    pub fn color_for(&self, year: YearFlag) -> Color32 {
        self.mapping.get(&year).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Diverging colour map for the correlation heatmap
// ---------------------------------------------------------------------------

const COOL: (u8, u8, u8) = (59, 76, 192);
const NEUTRAL: (u8, u8, u8) = (221, 221, 221);
const WARM: (u8, u8, u8) = (180, 4, 38);

/// Colour for cells that have no value.
pub const UNDEFINED_CELL: Color32 = Color32::from_gray(90);

fn linear((r, g, b): (u8, u8, u8)) -> LinSrgb {
    Srgb::new(r, g, b).into_linear()
}

/// Blue → grey → red for `value` in [-1, 1]; NaN maps to [`UNDEFINED_CELL`].
pub fn coolwarm(value: f64) -> Color32 {
    if value.is_nan() {
        return UNDEFINED_CELL;
    }
    let t = ((value.clamp(-1.0, 1.0) + 1.0) / 2.0) as f32;
    let mixed = if t < 0.5 {
        linear(COOL).mix(linear(NEUTRAL), t * 2.0)
    } else {
        linear(NEUTRAL).mix(linear(WARM), (t - 0.5) * 2.0)
    };
    let out: Srgb<u8> = Srgb::from_linear(mixed);
    Color32::from_rgb(out.red, out.green, out.blue)
}

/// Readable annotation colour on top of a [`coolwarm`] cell.
pub fn text_on(value: f64) -> Color32 {
    if value.is_nan() || value.abs() > 0.6 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}
