//! Top-level coordinator: owns the document, sequences the four stages,
//! aggregates results.

mod boundary;
mod identifier;
mod validator;
mod verifier;

use std::sync::Arc;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::llm::LMClient;
use crate::models::{BoundaryPair, ChapterIdentity, Document, ExtractionResult};

/// Owns the document for the duration of one run and sequences stages 1-4.
pub struct Pipeline {
    document: Document,
    llm: Arc<dyn LMClient>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(text: &str, llm: Arc<dyn LMClient>, config: PipelineConfig) -> Self {
        Self {
            document: Document::new(text),
            llm,
            config,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Stage 1 alone, exposed for callers that want to inspect identities
    /// before committing to the rest of the pipeline.
    pub async fn identify(&self) -> Result<(u64, Vec<ChapterIdentity>)> {
        identifier::identify(&self.document, self.llm.as_ref(), self.config.sample_lines).await
    }

    /// Stage 2 alone.
    pub async fn generate_boundaries(&self, identities: Vec<ChapterIdentity>) -> Vec<BoundaryPair> {
        boundary::generate_all(
            &self.document,
            identities,
            Arc::clone(&self.llm),
            self.config.max_concurrency,
        )
        .await
    }

    /// Stage 3 alone.
    pub fn validate(&self, pairs: Vec<BoundaryPair>) -> Vec<BoundaryPair> {
        validator::validate_all(&self.document, pairs, self.config.regex_timeout)
    }

    /// Stage 4 alone.
    pub async fn verify(&self, pairs: Vec<BoundaryPair>) -> Vec<ExtractionResult> {
        verifier::verify_all(
            &self.document,
            pairs,
            Arc::clone(&self.llm),
            self.config.confidence_threshold,
        )
        .await
    }

    /// Runs all four stages in order and returns the surviving extractions,
    /// sorted ascending by chapter number. Only stage 1 failures and
    /// `IdentityConflict` propagate as errors; every other failure mode is
    /// folded into the returned data (a dropped chapter, or
    /// `verification_passed = false`).
    pub async fn extract_all(&self) -> Result<Vec<ExtractionResult>> {
        let (chapter_count, identities) = self.identify().await?;
        if identities.is_empty() {
            info!(chapter_count, "stage 1 found no chapters, skipping stages 2-4");
            return Ok(Vec::new());
        }

        let pairs = self.generate_boundaries(identities).await;
        let pairs = self.validate(pairs);

        let valid_count = pairs.iter().filter(|p| p.is_valid).count();
        info!(valid_count, total = pairs.len(), "stage 3 complete");

        let results = self.verify(pairs).await;
        Ok(results)
    }
}
