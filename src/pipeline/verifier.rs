//! Stage 4: extract the span for each valid pair and ask the LM to confirm
//! it matches the expected chapter. Concurrent across chapters, emitted in
//! ascending chapter number.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::llm::LMClient;
use crate::models::{BoundaryPair, Document, ExtractionResult};

const VERIFICATION_WINDOW_CHARS: usize = 2000;

/// Extracts and verifies every valid pair concurrently; invalid pairs are
/// skipped entirely (they never reach stage 4).
pub async fn verify_all(
    document: &Document,
    pairs: Vec<BoundaryPair>,
    llm: Arc<dyn LMClient>,
    confidence_threshold: f64,
) -> Vec<ExtractionResult> {
    let mut tasks = JoinSet::new();

    for pair in pairs.into_iter().filter(|p| p.is_valid) {
        let llm = Arc::clone(&llm);
        let text = document.slice(
            pair.start_line.expect("valid pair has start_line"),
            pair.end_line.expect("valid pair has end_line"),
        );
        tasks.spawn(async move { verify_one(pair, text, llm.as_ref(), confidence_threshold).await });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => warn!(error = %e, "verification task panicked"),
        }
    }

    results.sort_by_key(|r| r.chapter_number);
    info!(
        verified = results.iter().filter(|r| r.verification_passed).count(),
        total = results.len(),
        "stage 4 complete"
    );
    results
}

async fn verify_one(
    pair: BoundaryPair,
    text: String,
    llm: &dyn LMClient,
    confidence_threshold: f64,
) -> ExtractionResult {
    let window: String = text.chars().take(VERIFICATION_WINDOW_CHARS).collect();
    let word_count = text.split_whitespace().count();
    let start_line = pair.start_line.expect("valid pair has start_line");
    let end_line = pair.end_line.expect("valid pair has end_line");

    match llm.verify(&window, pair.identity.number, &pair.identity.title).await {
        Ok(output) => {
            let passed = output.is_correct && output.confidence >= confidence_threshold;
            if passed {
                info!(
                    chapter = pair.identity.number,
                    passed,
                    confidence = output.confidence,
                    "verification verdict"
                );
            } else {
                warn!(
                    chapter = pair.identity.number,
                    confidence = output.confidence,
                    "verification did not pass"
                );
            }
            ExtractionResult {
                chapter_number: pair.identity.number,
                chapter_title: pair.identity.title,
                text,
                start_line,
                end_line,
                word_count,
                verification_passed: passed,
                verification_notes: Some(output.notes),
            }
        }
        Err(e) => {
            warn!(chapter = pair.identity.number, error = %e, "stage 4 LM call failed");
            ExtractionResult {
                chapter_number: pair.identity.number,
                chapter_title: pair.identity.title,
                text,
                start_line,
                end_line,
                word_count,
                verification_passed: false,
                verification_notes: Some(format!("verification call failed: {e}")),
            }
        }
    }
}
