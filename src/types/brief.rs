//! `Brief` — the input record produced by the external brief parser (§3).
//!
//! The parser itself is out of scope (§1); this crate only defines and
//! validates the schema it hands off.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockedCopy {
    pub tagline: Option<String>,
    pub slogan: Option<String>,
    pub announcement: Option<String>,
}

impl LockedCopy {
    pub fn is_empty(&self) -> bool {
        self.tagline.is_none() && self.slogan.is_none() && self.announcement.is_none()
    }
}

/// The Director's input record. `Deserialize` is hand-written (below)
/// rather than derived directly on these public fields: a request body
/// handed to the HTTP harness is exactly the "brief parser hand-off"
/// boundary this type's validation exists for, so the empty-`brand_name`
/// check must run on the way in, not only through [`Brief::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Brief {
    pub brand_name: String,
    pub product_description: String,
    pub target_audience: String,
    pub tone: String,
    pub competitors: Vec<String>,
    pub core_promise: String,
    pub keywords: Vec<String>,
    pub moodboard_images: Vec<PathBuf>,
    pub style_ref_images: Vec<PathBuf>,
    pub locked_copy: Option<LockedCopy>,
}

#[derive(Debug, Deserialize)]
struct BriefRaw {
    brand_name: String,
    #[serde(default)]
    product_description: String,
    #[serde(default)]
    target_audience: String,
    #[serde(default)]
    tone: String,
    #[serde(default)]
    competitors: Vec<String>,
    #[serde(default)]
    core_promise: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    moodboard_images: Vec<PathBuf>,
    #[serde(default)]
    style_ref_images: Vec<PathBuf>,
    #[serde(default)]
    locked_copy: Option<LockedCopy>,
}

impl TryFrom<BriefRaw> for Brief {
    type Error = ValidationError;

    fn try_from(raw: BriefRaw) -> Result<Self, Self::Error> {
        Brief::new(
            raw.brand_name,
            raw.product_description,
            raw.target_audience,
            raw.tone,
            raw.competitors,
            raw.core_promise,
            raw.keywords,
            raw.moodboard_images,
            raw.style_ref_images,
            raw.locked_copy,
        )
    }
}

impl<'de> Deserialize<'de> for Brief {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BriefRaw::deserialize(deserializer)?;
        Brief::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Brief {
    /// Construct and validate a `Brief`. `brand_name` is the only field the
    /// core cannot reasonably proceed without — everything else is
    /// free-form and may be empty per §3 ("free-form" / "may be empty").
    pub fn new(
        brand_name: impl Into<String>,
        product_description: impl Into<String>,
        target_audience: impl Into<String>,
        tone: impl Into<String>,
        competitors: Vec<String>,
        core_promise: impl Into<String>,
        keywords: Vec<String>,
        moodboard_images: Vec<PathBuf>,
        style_ref_images: Vec<PathBuf>,
        locked_copy: Option<LockedCopy>,
    ) -> Result<Self, ValidationError> {
        let brand_name = brand_name.into();
        if brand_name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "brand_name" });
        }
        Ok(Self {
            brand_name,
            product_description: product_description.into(),
            target_audience: target_audience.into(),
            tone: tone.into(),
            competitors,
            core_promise: core_promise.into(),
            keywords,
            moodboard_images,
            style_ref_images,
            locked_copy,
        })
    }

    pub fn has_style_refs(&self) -> bool {
        !self.style_ref_images.is_empty()
    }

    pub fn locked_copy(&self) -> LockedCopy {
        self.locked_copy.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_brand_name() {
        let result = Brief::new(
            "   ",
            "",
            "",
            "",
            vec![],
            "",
            vec![],
            vec![],
            vec![],
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn accepts_minimal_brief() {
        let result = Brief::new(
            "NuRange",
            "",
            "",
            "",
            vec![],
            "",
            vec!["predictive".into()],
            vec![],
            vec![],
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn deserialize_rejects_empty_brand_name() {
        let json = serde_json::json!({ "brand_name": "   " });
        assert!(serde_json::from_value::<Brief>(json).is_err());
    }

    #[test]
    fn deserialize_accepts_minimal_fields() {
        let json = serde_json::json!({ "brand_name": "NuRange" });
        let brief: Brief = serde_json::from_value(json).unwrap();
        assert_eq!(brief.brand_name, "NuRange");
        assert_eq!(brief.product_description, "");
    }
}
