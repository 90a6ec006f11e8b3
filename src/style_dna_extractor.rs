//! Style-DNA extraction (§4.C) — runs a single Vision call per distinct
//! reference image and caches the result under its content hash, so a
//! reference image reused across directions is analyzed exactly once per
//! run (P7).
//!
//! Dedup-by-key via SHA-256 content hashing of raw image bytes, backed by
//! a `dashmap::DashMap` so concurrent logo-generation tasks racing on the
//! same reference never trigger two Vision calls.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::model_clients::{VisionClient, VisionProvider};
use crate::types::StyleDNA;

const EXTRACTION_PROMPT: &str = "Analyze the attached reference image and describe its visual \
    style as structured attributes: stroke weight, corner treatment, shape vocabulary, \
    rendering medium, a complexity score from 1-5, fill style, and any qualities it \
    conspicuously avoids. Respond with JSON only.";

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// One cache slot: either a pending extraction another task can await, or
/// a resolved result (`Ok` with the DNA, or `Err` recording that
/// extraction failed for this content so dependents can degrade
/// immediately instead of re-attempting the same Vision call).
enum Slot {
    Pending(Arc<Mutex<()>>),
    Resolved(Option<StyleDNA>),
}

/// Content-hash-keyed cache guaranteeing at most one Vision call per
/// distinct reference image per run.
pub struct StyleDnaCache<P: VisionProvider> {
    client: VisionClient<P>,
    slots: DashMap<String, Slot>,
}

impl<P: VisionProvider> StyleDnaCache<P> {
    pub fn new(client: VisionClient<P>) -> Self {
        Self {
            client,
            slots: DashMap::new(),
        }
    }

    /// Extract Style-DNA for the reference image at `path`, reusing any
    /// in-flight or completed extraction for identical image bytes.
    /// Never returns an error: extraction failure degrades to `None` so
    /// the calling stage proceeds without a MUST-MATCH clause rather than
    /// aborting the pipeline (§7).
    pub async fn extract(&self, path: &Path) -> Option<StyleDNA> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                log::warn!("style-DNA: could not read reference {}: {e}", path.display());
                return None;
            }
        };
        let key = content_hash(&bytes);

        let lock = loop {
            if let Some(entry) = self.slots.get(&key) {
                match &*entry {
                    Slot::Resolved(dna) => return dna.clone(),
                    Slot::Pending(lock) => break lock.clone(),
                }
            }
            let lock = Arc::new(Mutex::new(()));
            match self.slots.entry(key.clone()) {
                dashmap::mapref::entry::Entry::Vacant(v) => {
                    v.insert(Slot::Pending(lock.clone()));
                    break lock;
                }
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
            }
        };

        let _guard = lock.lock().await;
        // Another task may have resolved the slot while we waited for the lock.
        if let Some(entry) = self.slots.get(&key) {
            if let Slot::Resolved(dna) = &*entry {
                return dna.clone();
            }
        }

        let stage = "style_dna";
        let result = self
            .client
            .analyze_structured::<StyleDNA>(stage, EXTRACTION_PROMPT, std::slice::from_ref(&bytes))
            .await;

        let dna = match result {
            Ok(dna) => Some(dna),
            Err(e) => {
                log::warn!("style-DNA extraction degraded for {}: {e}", path.display());
                None
            }
        };
        self.slots.insert(key, Slot::Resolved(dna.clone()));
        dna
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    struct CountingVisionProvider {
        calls: StdArc<AtomicUsize>,
    }

    #[async_trait]
    impl VisionProvider for CountingVisionProvider {
        fn model(&self) -> &str {
            "mock-vision"
        }

        async fn analyze(
            &self,
            _prompt: &str,
            _image_refs: &[Vec<u8>],
        ) -> Result<serde_json::Value, crate::model_clients::ModelCallError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "stroke_weight": "medium",
                "corner_treatment": "sharp",
                "shape_vocabulary": "geometric",
                "rendering_medium": "clean-digital-vector",
                "complexity": 3,
                "fill_style": "solid-fill",
                "not_present": []
            }))
        }
    }

    #[tokio::test]
    async fn dedups_identical_reference_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.png");
        tokio::fs::write(&path, b"identical bytes").await.unwrap();

        let calls = StdArc::new(AtomicUsize::new(0));
        let provider = CountingVisionProvider {
            calls: calls.clone(),
        };
        let cache = StyleDnaCache::new(VisionClient::new(provider));

        let a = cache.extract(&path).await;
        let b = cache.extract(&path).await;
        assert!(a.is_some());
        assert!(b.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
