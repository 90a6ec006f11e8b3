//! Perceptually-uniform color math: the 9-step shade scale (§4.H.4, P5)
//! and hue-family classification used by the Director's divergence rule
//! (P4) and the palette enrichment stage (§4.H.3).
//!
//! Interpolation happens in OKLCh via the `palette` crate rather than raw
//! sRGB, so lightness steps stay perceptually even. This stage is purely
//! algorithmic — no model call.

use palette::{FromColor, IntoColor, Lab, Oklch, Srgb};

use crate::types::HexColor;

/// The shade-scale marks, matching Tailwind/Radix-style indices: 10 marks
/// spanning 9 steps from `50` (lightest tint) to `900` (darkest shade).
pub const SHADE_STEPS: [u16; 10] = [50, 100, 200, 300, 400, 500, 600, 700, 800, 900];

fn hex_to_oklch(hex: &HexColor) -> Oklch {
    let (r, g, b) = hex.rgb();
    let srgb = Srgb::new(r, g, b).into_format::<f32>();
    Oklch::from_color(srgb.into_linear())
}

fn oklch_to_hex(color: Oklch) -> HexColor {
    let srgb: Srgb<f32> = Srgb::from_linear(color.into_color());
    let srgb = srgb.into_format::<u8>();
    HexColor::from_rgb(srgb.red, srgb.green, srgb.blue)
}

/// Lightness target for one of the 10 marks, in OKLab's `[0,1]` range,
/// interpolated relative to the input's own lightness rather than spliced
/// into a fixed table — a fixed table only stays monotone for inputs whose
/// lightness already falls inside the table's middle band, and breaks for
/// any brand color lighter or darker than that band (e.g. a pastel or a
/// near-black primary). Tints (50..400) interpolate upward from the input
/// toward a near-white ceiling that always sits strictly above it; shades
/// (600..900) interpolate downward toward a near-black floor that always
/// sits strictly below it — so the scale stays strictly monotone for any
/// input lightness in `(0, 1)`. Index 500 reuses the input's own lightness
/// so the round-trip invariant (P5, ΔE < 2 at index 500) holds exactly.
fn lightness_target(step_index: usize, input_lightness: f32) -> f32 {
    // Keep away from the absolute black/white poles so there's always
    // room for a strictly monotone step in both directions.
    let l = input_lightness.clamp(0.001, 0.999);

    match step_index.cmp(&5) {
        std::cmp::Ordering::Less => {
            let ceiling = l + (1.0 - l) * 0.9;
            let frac = (5 - step_index) as f32 / 5.0;
            l + (ceiling - l) * frac
        }
        std::cmp::Ordering::Equal => l,
        std::cmp::Ordering::Greater => {
            let floor = l - l * 0.9;
            let frac = (step_index - 5) as f32 / 4.0;
            l - (l - floor) * frac
        }
    }
}

/// Compute the 9-step {50,...,900} shade scale for one input color.
///
/// Guarantees (P5): strictly monotone decreasing lightness from index 50
/// to 900, and index 500 reproduces the input within ΔE76 < 2.
pub fn shade_scale(hex: &HexColor) -> Vec<(u16, HexColor)> {
    let base = hex_to_oklch(hex);
    let base_l = base.l;

    let mut scale: Vec<(u16, HexColor)> = SHADE_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let l = lightness_target(i, base_l);
            let color = Oklch::new(l, base.chroma, base.hue);
            (*step, oklch_to_hex(color))
        })
        .collect();

    // index 500 (i == 5) reuses the input's exact hue/chroma/lightness,
    // so it is byte-identical rather than merely close.
    scale[5] = (500, hex.clone());
    scale
}

/// ΔE76 distance between two colors in CIE Lab space.
pub fn delta_e76(a: &HexColor, b: &HexColor) -> f32 {
    let (ar, ag, ab) = a.rgb();
    let (br, bg, bb) = b.rgb();
    let la: Lab = Srgb::new(ar, ag, ab)
        .into_format::<f32>()
        .into_linear()
        .into_color();
    let lb: Lab = Srgb::new(br, bg, bb)
        .into_format::<f32>()
        .into_linear()
        .into_color();
    ((la.l - lb.l).powi(2) + (la.a - lb.a).powi(2) + (la.b - lb.b).powi(2)).sqrt()
}

/// Coarse hue-family buckets used for the Director's divergence rule
/// (P4: "no two directions may share the same primary hue family AND the
/// same logo_type").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HueFamily {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
    Neutral,
}

/// Classify a color's hue family. Low-chroma colors (grays, near-black,
/// near-white) are bucketed as `Neutral` regardless of hue angle, since
/// hue is unstable near the achromatic axis.
pub fn hue_family(hex: &HexColor) -> HueFamily {
    let oklch = hex_to_oklch(hex);
    if oklch.chroma < 0.04 {
        return HueFamily::Neutral;
    }
    let hue = oklch.hue.into_positive_degrees();
    match hue {
        h if h < 20.0 => HueFamily::Red,
        h if h < 50.0 => HueFamily::Orange,
        h if h < 85.0 => HueFamily::Yellow,
        h if h < 160.0 => HueFamily::Green,
        h if h < 195.0 => HueFamily::Teal,
        h if h < 250.0 => HueFamily::Blue,
        h if h < 300.0 => HueFamily::Purple,
        h if h < 340.0 => HueFamily::Pink,
        _ => HueFamily::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shade_scale_is_monotone_and_reproduces_500() {
        let input = HexColor::new("#3366CC").unwrap();
        let scale = shade_scale(&input);
        assert_eq!(scale.len(), 10);
        assert_eq!(scale[5].0, 500);
        assert_eq!(scale[5].1, input);

        let lightness_of = |hex: &HexColor| hex_to_oklch(hex).l;
        for window in scale.windows(2) {
            let l0 = lightness_of(&window[0].1);
            let l1 = lightness_of(&window[1].1);
            assert!(l0 > l1, "expected strictly decreasing lightness: {:?}", scale);
        }
    }

    #[test]
    fn hue_family_buckets_neutrals() {
        let gray = HexColor::new("#808080").unwrap();
        assert_eq!(hue_family(&gray), HueFamily::Neutral);
    }

    /// P5 regression: a pastel primary sits well above the old fixed
    /// table's 400-mark ceiling (0.64) — this broke strict monotonicity
    /// at the 400/500 boundary before the targets were derived from the
    /// input lightness instead of spliced into a constant table.
    #[test]
    fn shade_scale_stays_monotone_for_a_pastel_input() {
        let input = HexColor::new("#FFD966").unwrap();
        let scale = shade_scale(&input);
        assert_eq!(scale[5].1, input);

        let lightness_of = |hex: &HexColor| hex_to_oklch(hex).l;
        for window in scale.windows(2) {
            let l0 = lightness_of(&window[0].1);
            let l1 = lightness_of(&window[1].1);
            assert!(l0 > l1, "expected strictly decreasing lightness: {:?}", scale);
        }
    }

    /// P5 regression: a deep, near-black primary sits well below the old
    /// fixed table's 600-mark floor (0.42) — this broke strict
    /// monotonicity at the 500/600 boundary under the same bug.
    #[test]
    fn shade_scale_stays_monotone_for_a_deep_dark_input() {
        let input = HexColor::new("#1A1A2E").unwrap();
        let scale = shade_scale(&input);
        assert_eq!(scale[5].1, input);

        let lightness_of = |hex: &HexColor| hex_to_oklch(hex).l;
        for window in scale.windows(2) {
            let l0 = lightness_of(&window[0].1);
            let l1 = lightness_of(&window[1].1);
            assert!(l0 > l1, "expected strictly decreasing lightness: {:?}", scale);
        }
    }
}
