//! Render specifications — structured descriptions of an image to be
//! generated, not the image itself (§3).

use serde::{Deserialize, Serialize};

use super::color::HexColor;
use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoType {
    Symbol,
    AbstractMark,
    Lettermark,
    Logotype,
    Combination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    SolidFill,
    OutlineOnly,
    FillWithOutlineDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeWeight {
    Hairline,
    Thin,
    Medium,
    Bold,
}

impl StrokeWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeWeight::Hairline => "hairline",
            StrokeWeight::Thin => "thin",
            StrokeWeight::Medium => "medium",
            StrokeWeight::Bold => "bold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoSpec {
    pub logo_type: LogoType,
    pub form: String,
    pub composition: String,
    pub color_hex: HexColor,
    pub fill_style: FillStyle,
    pub stroke_weight: StrokeWeight,
    pub typography_treatment: String,
    pub render_style: String,
    pub metaphor: String,
    pub avoid: Vec<String>,
}

impl LogoSpec {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        logo_type: LogoType,
        form: impl Into<String>,
        composition: impl Into<String>,
        color_hex: impl Into<String>,
        fill_style: FillStyle,
        stroke_weight: StrokeWeight,
        typography_treatment: impl Into<String>,
        render_style: impl Into<String>,
        metaphor: impl Into<String>,
        avoid: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            logo_type,
            form: form.into(),
            composition: composition.into(),
            color_hex: HexColor::new(color_hex)?,
            fill_style,
            stroke_weight,
            typography_treatment: typography_treatment.into(),
            render_style: render_style.into(),
            metaphor: metaphor.into(),
            avoid,
        })
    }

    /// Whether any avoided term appears, case-insensitively, in the form or
    /// metaphor fields (anti-cliché rule enforcement, §4.E).
    pub fn contains_cliche(&self, deny_list: &[&str]) -> Option<String> {
        let haystack = format!("{} {}", self.form, self.metaphor).to_lowercase();
        deny_list
            .iter()
            .find(|term| haystack.contains(&term.to_lowercase()))
            .map(|s| s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub motif: String,
    pub layout: String,
    pub color_hexes: Vec<HexColor>,
    pub density: String,
    pub render_style: String,
    pub avoid: Vec<String>,
}

impl PatternSpec {
    pub fn new(
        motif: impl Into<String>,
        layout: impl Into<String>,
        color_hexes: Vec<String>,
        density: impl Into<String>,
        render_style: impl Into<String>,
        avoid: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let color_hexes = color_hexes
            .into_iter()
            .map(HexColor::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            motif: motif.into(),
            layout: layout.into(),
            color_hexes,
            density: density.into(),
            render_style: render_style.into(),
            avoid,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSpec {
    pub scene_description: String,
    pub color_hexes: Vec<HexColor>,
    pub mood: String,
    pub render_style: String,
    pub avoid: Vec<String>,
}

impl BackgroundSpec {
    pub fn new(
        scene_description: impl Into<String>,
        color_hexes: Vec<String>,
        mood: impl Into<String>,
        render_style: impl Into<String>,
        avoid: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let color_hexes = color_hexes
            .into_iter()
            .map(HexColor::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            scene_description: scene_description.into(),
            color_hexes,
            mood: mood.into(),
            render_style: render_style.into(),
            avoid,
        })
    }
}
