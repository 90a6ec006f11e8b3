//! `StyleDNA` — the attribute record extracted from a user-supplied
//! reference image (§3, §4.C).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerTreatment {
    Sharp,
    Rounded,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeVocabulary {
    Geometric,
    Organic,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderingMedium {
    CleanDigitalVector,
    Textured,
    HandDrawn,
    Photographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleDnaFillStyle {
    SolidFill,
    OutlineOnly,
    Gradient,
}

use super::specs::StrokeWeight;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDNA {
    pub stroke_weight: StrokeWeight,
    pub corner_treatment: CornerTreatment,
    pub shape_vocabulary: ShapeVocabulary,
    pub rendering_medium: RenderingMedium,
    pub complexity: u8,
    pub fill_style: StyleDnaFillStyle,
    pub not_present: Vec<String>,
}

impl StyleDNA {
    pub fn new(
        stroke_weight: StrokeWeight,
        corner_treatment: CornerTreatment,
        shape_vocabulary: ShapeVocabulary,
        rendering_medium: RenderingMedium,
        complexity: u8,
        fill_style: StyleDnaFillStyle,
        not_present: Vec<String>,
    ) -> Result<Self, super::validation::ValidationError> {
        if !(1..=5).contains(&complexity) {
            return Err(super::validation::ValidationError::PatternMismatch {
                field: "complexity",
                pattern: "1..=5",
                value: complexity.to_string(),
            });
        }
        Ok(Self {
            stroke_weight,
            corner_treatment,
            shape_vocabulary,
            rendering_medium,
            complexity,
            fill_style,
            not_present,
        })
    }

    /// Render the MUST-MATCH textual constraint clause injected into
    /// downstream logo/pattern prompts (§4.C).
    pub fn must_match_clause(&self) -> String {
        let mut clause = format!(
            "MUST MATCH: {} stroke weight, {} corners, {} shapes, {} rendering, complexity {}/5, {}",
            self.stroke_weight.as_str(),
            match self.corner_treatment {
                CornerTreatment::Sharp => "sharp",
                CornerTreatment::Rounded => "rounded",
                CornerTreatment::Mixed => "mixed",
            },
            match self.shape_vocabulary {
                ShapeVocabulary::Geometric => "geometric",
                ShapeVocabulary::Organic => "organic",
                ShapeVocabulary::Hybrid => "hybrid",
            },
            match self.rendering_medium {
                RenderingMedium::CleanDigitalVector => "clean digital vector",
                RenderingMedium::Textured => "textured",
                RenderingMedium::HandDrawn => "hand-drawn",
                RenderingMedium::Photographic => "photographic",
            },
            self.complexity,
            match self.fill_style {
                StyleDnaFillStyle::SolidFill => "solid fill",
                StyleDnaFillStyle::OutlineOnly => "outline only",
                StyleDnaFillStyle::Gradient => "gradient",
            },
        );
        if !self.not_present.is_empty() {
            clause.push_str(&format!(". AVOID: {}", self.not_present.join(", ")));
        }
        clause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_complexity() {
        let result = StyleDNA::new(
            StrokeWeight::Medium,
            CornerTreatment::Sharp,
            ShapeVocabulary::Geometric,
            RenderingMedium::CleanDigitalVector,
            6,
            StyleDnaFillStyle::SolidFill,
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn must_match_clause_includes_avoid() {
        let dna = StyleDNA::new(
            StrokeWeight::Medium,
            CornerTreatment::Sharp,
            ShapeVocabulary::Geometric,
            RenderingMedium::CleanDigitalVector,
            3,
            StyleDnaFillStyle::SolidFill,
            vec!["gradients".to_string()],
        )
        .unwrap();
        let clause = dna.must_match_clause();
        assert!(clause.contains("MUST MATCH"));
        assert!(clause.contains("AVOID: gradients"));
    }
}
