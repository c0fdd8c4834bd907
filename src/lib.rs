//! Chapter boundary detection pipeline.
//!
//! Four stages run over a [`models::Document`]: an [`llm::LMClient`]
//! identifies chapters, proposes a start/end regex pair per chapter, the
//! pair is validated against the full text under a uniqueness contract, and
//! a final LM call verifies the extracted span. See [`pipeline::Pipeline`]
//! for the coordinator and [`pipeline::Pipeline::extract_all`] for the
//! single entry point most callers need.

pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod test_support;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use llm::{HttpLMClient, LMClient};
pub use models::{BoundaryPair, ChapterIdentity, Document, ExtractionResult};
pub use pipeline::Pipeline;
