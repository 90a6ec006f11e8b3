//! Reference Index (§4.B) — a read-only, load-once lookup of tagged
//! reference images and per-category styleguide documents.
//!
//! Immutable after load, so concurrent reads from the four-way logo
//! fan-out need no locking — `Arc`-wrapped and never mutated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Logo,
    Pattern,
}

impl ReferenceKind {
    fn dir_name(&self) -> &'static str {
        match self {
            ReferenceKind::Logo => "logos",
            ReferenceKind::Pattern => "patterns",
        }
    }
}

/// One entry from a category's `index.json`. Accepts both the deprecated
/// `local_path` field and the current `relative_path` field on read (§9
/// design note); only `relative_path` is ever produced on write.
#[derive(Debug, Clone, Deserialize)]
struct IndexEntryRaw {
    relative_path: Option<String>,
    local_path: Option<String>,
    tags: Vec<String>,
    quality: f64,
    #[allow(dead_code)]
    form: Option<String>,
    #[allow(dead_code)]
    motif: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceEntry {
    pub path: PathBuf,
    pub tags: Vec<String>,
    pub quality: f64,
    pub category: String,
}

pub struct ReferenceIndex {
    logos: HashMap<String, Vec<ReferenceEntry>>,
    patterns: HashMap<String, Vec<ReferenceEntry>>,
    logo_styleguides: HashMap<String, String>,
    pattern_styleguides: HashMap<String, String>,
}

impl ReferenceIndex {
    /// Load the full index from `references/{logos,patterns}/<category>/index.json`
    /// and `styles/{logos,patterns}/<category>.md` under `root`.
    pub fn load(root: &Path) -> Result<Self, PipelineError> {
        let logos = Self::load_kind(root, ReferenceKind::Logo)?;
        let patterns = Self::load_kind(root, ReferenceKind::Pattern)?;
        let logo_styleguides = Self::load_styleguides(root, "logos")?;
        let pattern_styleguides = Self::load_styleguides(root, "patterns")?;
        Ok(Self {
            logos,
            patterns,
            logo_styleguides,
            pattern_styleguides,
        })
    }

    fn load_kind(
        root: &Path,
        kind: ReferenceKind,
    ) -> Result<HashMap<String, Vec<ReferenceEntry>>, PipelineError> {
        let base = root.join("references").join(kind.dir_name());
        let mut out = HashMap::new();
        if !base.is_dir() {
            return Ok(out);
        }
        for category_dir in std::fs::read_dir(&base)? {
            let category_dir = category_dir?;
            if !category_dir.file_type()?.is_dir() {
                continue;
            }
            let category = category_dir.file_name().to_string_lossy().to_string();
            let index_path = category_dir.path().join("index.json");
            if !index_path.is_file() {
                continue;
            }
            let raw = std::fs::read_to_string(&index_path)?;
            let entries: Vec<IndexEntryRaw> = serde_json::from_str(&raw)?;
            let resolved: Vec<ReferenceEntry> = entries
                .into_iter()
                .filter_map(|e| {
                    let rel = e.relative_path.or(e.local_path)?;
                    Some(ReferenceEntry {
                        path: category_dir.path().join(rel),
                        tags: e.tags,
                        quality: e.quality,
                        category: category.clone(),
                    })
                })
                .collect();
            out.insert(category, resolved);
        }
        Ok(out)
    }

    fn load_styleguides(root: &Path, kind_dir: &str) -> Result<HashMap<String, String>, PipelineError> {
        let base = root.join("styles").join(kind_dir);
        let mut out = HashMap::new();
        if !base.is_dir() {
            return Ok(out);
        }
        for entry in std::fs::read_dir(&base)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let category = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let text = std::fs::read_to_string(&path)?;
            if kind_dir == "patterns" {
                crate::stages::styleguide_contract::validate_pattern_styleguide(&path, &text)?;
            }
            out.insert(category, text);
        }
        Ok(out)
    }

    /// Score each indexed entry by tag overlap (category-folder membership
    /// weighted ×2), then quality rank; return up to `k` paths, ordered
    /// deterministically by (score desc, path asc).
    pub fn lookup_references(&self, tags: &[String], kind: ReferenceKind, k: usize) -> Vec<PathBuf> {
        let table = match kind {
            ReferenceKind::Logo => &self.logos,
            ReferenceKind::Pattern => &self.patterns,
        };

        let mut scored: Vec<(f64, PathBuf)> = Vec::new();
        for (category, entries) in table {
            let category_matches_tag = tags.iter().any(|t| t.eq_ignore_ascii_case(category));
            for entry in entries {
                let overlap = entry
                    .tags
                    .iter()
                    .filter(|t| tags.iter().any(|q| q.eq_ignore_ascii_case(t)))
                    .count() as f64;
                if overlap == 0.0 && !category_matches_tag {
                    continue;
                }
                let category_weight = if category_matches_tag { 2.0 } else { 1.0 };
                let score = overlap * category_weight + entry.quality;
                scored.push((score, entry.path.clone()));
            }
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        scored.into_iter().take(k).map(|(_, path)| path).collect()
    }

    /// Return the best-matching styleguide document, or `None` if no
    /// category name overlaps the given tags.
    pub fn lookup_styleguide(&self, tags: &[String], kind: ReferenceKind) -> Option<&str> {
        let table = match kind {
            ReferenceKind::Logo => &self.logo_styleguides,
            ReferenceKind::Pattern => &self.pattern_styleguides,
        };
        tags.iter()
            .find_map(|tag| table.iter().find(|(category, _)| category.eq_ignore_ascii_case(tag)))
            .map(|(_, text)| text.as_str())
    }
}
