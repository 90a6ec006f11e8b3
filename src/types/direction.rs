//! `BrandDirection` and `BrandDirectionsOutput` — the Director stage's
//! output record (§3, §4.E) and its structural invariants (P1, P3, P4).

use serde::{Deserialize, Serialize};

use super::brief::LockedCopy;
use super::color::{validate_palette, ColorSwatch};
use super::specs::{BackgroundSpec, LogoSpec, PatternSpec};
use super::validation::ValidationError;

/// The four fixed strategic slots. Position `N` always corresponds to
/// `OptionType` at index `N-1` — the mapping never varies across runs
/// (§3 invariants, §4.E system-prompt requirement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionType {
    #[serde(rename = "Market-Aligned")]
    MarketAligned,
    #[serde(rename = "Designer-Led")]
    DesignerLed,
    Hybrid,
    #[serde(rename = "Wild-Card")]
    WildCard,
}

impl OptionType {
    /// The type fixed at each 1-based position, per §3/§4.E.
    pub const ORDER: [OptionType; 4] = [
        OptionType::MarketAligned,
        OptionType::DesignerLed,
        OptionType::Hybrid,
        OptionType::WildCard,
    ];

    pub fn for_position(option_number: u8) -> Option<OptionType> {
        Self::ORDER.get(usize::from(option_number).checked_sub(1)?).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::MarketAligned => "Market-Aligned",
            OptionType::DesignerLed => "Designer-Led",
            OptionType::Hybrid => "Hybrid",
            OptionType::WildCard => "Wild-Card",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandDirection {
    pub option_number: u8,
    pub option_type: OptionType,
    pub direction_name: String,
    pub rationale: String,
    pub colors: Vec<ColorSwatch>,
    pub typography_primary: String,
    pub typography_secondary: String,
    pub graphic_style: String,
    pub logo_spec: LogoSpec,
    pub pattern_spec: PatternSpec,
    pub background_spec: BackgroundSpec,
    pub tagline: String,
    pub ad_slogan: String,
    pub announcement_copy: String,
}

impl BrandDirection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        option_number: u8,
        direction_name: impl Into<String>,
        rationale: impl Into<String>,
        colors: Vec<ColorSwatch>,
        typography_primary: impl Into<String>,
        typography_secondary: impl Into<String>,
        graphic_style: impl Into<String>,
        logo_spec: LogoSpec,
        pattern_spec: PatternSpec,
        background_spec: BackgroundSpec,
        tagline: impl Into<String>,
        ad_slogan: impl Into<String>,
        announcement_copy: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_palette(&colors)?;
        let option_type = OptionType::for_position(option_number).ok_or(
            ValidationError::OptionNumberSet {
                context: "BrandDirection::new",
                got: vec![option_number],
            },
        )?;
        Ok(Self {
            option_number,
            option_type,
            direction_name: direction_name.into(),
            rationale: rationale.into(),
            colors,
            typography_primary: typography_primary.into(),
            typography_secondary: typography_secondary.into(),
            graphic_style: graphic_style.into(),
            logo_spec,
            pattern_spec,
            background_spec,
            tagline: tagline.into(),
            ad_slogan: ad_slogan.into(),
            announcement_copy: announcement_copy.into(),
        })
    }

    /// The primary color's descriptive name, used as the divergence key for
    /// P4 ("same primary hue family"). Hue-family classification itself
    /// lives in [`crate::color`]; this just locates the primary swatch.
    pub fn primary_color(&self) -> Option<&ColorSwatch> {
        self.colors
            .iter()
            .find(|c| c.role == super::color::ColorRole::Primary)
    }

    pub fn slug(&self) -> String {
        crate::util::slugify(&self.direction_name)
    }
}

/// Exactly four [`BrandDirection`]s, indexed by `option_number` in `[1,4]`,
/// each `option_type` appearing exactly once (P1).
///
/// `Deserialize` is routed through [`BrandDirectionsOutput::new`] (via the
/// `try_from` raw shape below) rather than derived directly on the private
/// field, so a `directions.json` read back from disk — or a phase-2 request
/// body supplying a previously-emitted `BrandDirectionsOutput` — re-validates
/// the same P1/P3/P4 invariants enforced at construction, instead of
/// trusting the bytes on disk or over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandDirectionsOutput {
    directions: Vec<BrandDirection>,
}

#[derive(Debug, Deserialize)]
struct BrandDirectionsOutputRaw {
    directions: Vec<BrandDirection>,
}

impl TryFrom<BrandDirectionsOutputRaw> for BrandDirectionsOutput {
    type Error = ValidationError;

    fn try_from(raw: BrandDirectionsOutputRaw) -> Result<Self, Self::Error> {
        BrandDirectionsOutput::new(raw.directions)
    }
}

impl<'de> Deserialize<'de> for BrandDirectionsOutput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BrandDirectionsOutputRaw::deserialize(deserializer)?;
        BrandDirectionsOutput::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl BrandDirectionsOutput {
    pub fn new(mut directions: Vec<BrandDirection>) -> Result<Self, ValidationError> {
        directions.sort_by_key(|d| d.option_number);

        let numbers: Vec<u8> = directions.iter().map(|d| d.option_number).collect();
        let mut expected = numbers.clone();
        expected.sort_unstable();
        if expected != [1, 2, 3, 4] {
            return Err(ValidationError::OptionNumberSet {
                context: "BrandDirectionsOutput",
                got: numbers,
            });
        }

        let mut types: Vec<String> = directions
            .iter()
            .map(|d| d.option_type.as_str().to_string())
            .collect();
        types.sort();
        let mut expected_types: Vec<String> = OptionType::ORDER
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();
        expected_types.sort();
        if types != expected_types {
            return Err(ValidationError::OptionTypeSet {
                context: "BrandDirectionsOutput",
                got: types,
            });
        }

        for d in &directions {
            if d.option_type != OptionType::for_position(d.option_number).unwrap() {
                return Err(ValidationError::OptionTypeSet {
                    context: "BrandDirectionsOutput position mapping",
                    got: vec![d.option_type.as_str().to_string()],
                });
            }
        }

        Ok(Self { directions })
    }

    /// Validate and enforce the copy-override rule (P3): when the brief
    /// locks copy, every direction's matching field must equal it
    /// byte-for-byte. Called after construction, once the brief is known.
    pub fn enforce_locked_copy(&self, locked: &LockedCopy) -> Result<(), ValidationError> {
        for d in &self.directions {
            if let Some(tagline) = &locked.tagline {
                if &d.tagline != tagline {
                    return Err(ValidationError::LockedCopyMismatch {
                        option_number: d.option_number,
                        field: "tagline",
                        expected: tagline.clone(),
                        actual: d.tagline.clone(),
                    });
                }
            }
            if let Some(slogan) = &locked.slogan {
                if &d.ad_slogan != slogan {
                    return Err(ValidationError::LockedCopyMismatch {
                        option_number: d.option_number,
                        field: "ad_slogan",
                        expected: slogan.clone(),
                        actual: d.ad_slogan.clone(),
                    });
                }
            }
            if let Some(announcement) = &locked.announcement {
                if &d.announcement_copy != announcement {
                    return Err(ValidationError::LockedCopyMismatch {
                        option_number: d.option_number,
                        field: "announcement_copy",
                        expected: announcement.clone(),
                        actual: d.announcement_copy.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn directions(&self) -> &[BrandDirection] {
        &self.directions
    }

    pub fn by_option_number(&self, option_number: u8) -> Option<&BrandDirection> {
        self.directions.iter().find(|d| d.option_number == option_number)
    }

    pub fn into_directions(self) -> Vec<BrandDirection> {
        self.directions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::color::ColorRole;
    use crate::types::specs::{FillStyle, LogoType, StrokeWeight};

    fn direction(option_number: u8) -> BrandDirection {
        let colors = vec![
            ColorSwatch::new("#101010", ColorRole::Primary, "Ink").unwrap(),
            ColorSwatch::new("#F5F5F5", ColorRole::NeutralLight, "Paper").unwrap(),
            ColorSwatch::new("#202020", ColorRole::NeutralDark, "Charcoal").unwrap(),
        ];
        let logo_spec = LogoSpec::new(
            LogoType::AbstractMark,
            "an arrow folding into itself",
            "centered, generous padding",
            "#101010",
            FillStyle::SolidFill,
            StrokeWeight::Medium,
            "custom geometric sans",
            "clean flat vector",
            "forward motion",
            vec![],
        )
        .unwrap();
        let pattern_spec =
            PatternSpec::new("folded arrows", "grid", vec!["#101010".into()], "sparse", "flat", vec![])
                .unwrap();
        let background_spec =
            BackgroundSpec::new("studio gradient", vec!["#F5F5F5".into()], "calm", "flat", vec![])
                .unwrap();
        BrandDirection::new(
            option_number,
            "Northbound",
            "Signals forward motion for a logistics brand.",
            colors,
            "Custom Sans",
            "Custom Serif",
            "geometric minimalism",
            logo_spec,
            pattern_spec,
            background_spec,
            "Always ahead.",
            "Move first.",
            "Northbound is live.",
        )
        .unwrap()
    }

    #[test]
    fn accepts_exactly_four_directions() {
        let directions: Vec<_> = (1..=4).map(direction).collect();
        assert!(BrandDirectionsOutput::new(directions).is_ok());
    }

    #[test]
    fn rejects_duplicate_option_number() {
        let directions = vec![direction(1), direction(1), direction(3), direction(4)];
        assert!(BrandDirectionsOutput::new(directions).is_err());
    }

    #[test]
    fn deserialize_revalidates_invariants() {
        let directions: Vec<_> = (1..=4).map(direction).collect();
        let output = BrandDirectionsOutput::new(directions).unwrap();
        let json = serde_json::to_string(&output).unwrap();
        let round_tripped: BrandDirectionsOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, output);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["directions"][1]["option_number"] = serde_json::json!(1);
        let broken = serde_json::to_string(&value).unwrap();
        assert!(serde_json::from_str::<BrandDirectionsOutput>(&broken).is_err());
    }

    #[test]
    fn enforces_locked_copy_byte_equality() {
        let directions: Vec<_> = (1..=4).map(direction).collect();
        let output = BrandDirectionsOutput::new(directions).unwrap();
        let locked = LockedCopy {
            tagline: Some("Always ahead.".to_string()),
            slogan: None,
            announcement: None,
        };
        assert!(output.enforce_locked_copy(&locked).is_ok());

        let mismatched = LockedCopy {
            tagline: Some("Something else.".to_string()),
            slogan: None,
            announcement: None,
        };
        assert!(output.enforce_locked_copy(&mismatched).is_err());
    }
}
