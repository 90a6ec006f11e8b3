//! `HexColor` and `ColorSwatch` — the color value objects shared by every
//! direction, palette, and shade scale in the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

static HEX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// A validated `#RRGGBB` hex color string (P2).
///
/// Constructed only through [`HexColor::new`], so every instance in the
/// system satisfies the pattern invariant by construction — no call site
/// needs to re-check it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn new(hex: impl Into<String>) -> Result<Self, ValidationError> {
        let hex = hex.into();
        if HEX_PATTERN.is_match(&hex) {
            Ok(Self(hex))
        } else {
            Err(ValidationError::PatternMismatch {
                field: "hex",
                pattern: r"^#[0-9A-Fa-f]{6}$",
                value: hex,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into (r, g, b) byte components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let r = u8::from_str_radix(&self.0[1..3], 16).unwrap();
        let g = u8::from_str_radix(&self.0[3..5], 16).unwrap();
        let b = u8::from_str_radix(&self.0[5..7], 16).unwrap();
        (r, g, b)
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{:02X}{:02X}{:02X}", r, g, b))
    }
}

impl TryFrom<String> for HexColor {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a color plays within a direction's palette (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorRole {
    Primary,
    Secondary,
    Accent,
    NeutralDark,
    NeutralLight,
    Support,
}

impl ColorRole {
    pub const REQUIRED: [ColorRole; 3] = [
        ColorRole::Primary,
        ColorRole::NeutralDark,
        ColorRole::NeutralLight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorRole::Primary => "primary",
            ColorRole::Secondary => "secondary",
            ColorRole::Accent => "accent",
            ColorRole::NeutralDark => "neutral-dark",
            ColorRole::NeutralLight => "neutral-light",
            ColorRole::Support => "support",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub hex: HexColor,
    pub role: ColorRole,
    pub name: String,
}

impl ColorSwatch {
    pub fn new(
        hex: impl Into<String>,
        role: ColorRole,
        name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            hex: HexColor::new(hex)?,
            role,
            name: name.into(),
        })
    }
}

/// Validate that a palette is non-empty and covers the required roles (P2,
/// the `colors` invariant in §3).
pub fn validate_palette(colors: &[ColorSwatch]) -> Result<(), ValidationError> {
    if colors.is_empty() {
        return Err(ValidationError::Empty { field: "colors" });
    }
    let present: std::collections::HashSet<ColorRole> = colors.iter().map(|c| c.role).collect();
    let missing: Vec<String> = ColorRole::REQUIRED
        .iter()
        .filter(|r| !present.contains(r))
        .map(|r| r.as_str().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColorRoles { missing });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_accepts_valid() {
        assert!(HexColor::new("#1A2B3C").is_ok());
    }

    #[test]
    fn hex_color_rejects_invalid() {
        assert!(HexColor::new("1A2B3C").is_err());
        assert!(HexColor::new("#1A2B3").is_err());
        assert!(HexColor::new("#GGBBCC").is_err());
    }

    #[test]
    fn palette_requires_roles() {
        let colors = vec![ColorSwatch::new("#000000", ColorRole::Primary, "Black").unwrap()];
        assert!(matches!(
            validate_palette(&colors),
            Err(ValidationError::MissingColorRoles { .. })
        ));
    }
}
