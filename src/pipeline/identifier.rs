//! Stage 1: ask the LM for the chapter count and list from a head-of-text
//! sample.

use std::collections::HashSet;

use regex::Regex;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::llm::LMClient;
use crate::models::{ChapterIdentity, Document};

/// `^\s*(\d+)\.\s+(.+?)\s*$` — matches a numbered `chapter_list` line.
fn chapter_list_line_pattern() -> Regex {
    Regex::new(r"^\s*(\d+)\.\s+(.+?)\s*$").expect("static pattern is valid")
}

/// Runs stage 1: returns `(chapter_count, identities)`.
///
/// `chapter_count` is the LM's own count, kept only for the caller's
/// sanity-check — the parsed `chapter_list` is authoritative even when the
/// two disagree (the source inherits this behavior; see Open Questions).
pub async fn identify(
    document: &Document,
    llm: &dyn LMClient,
    sample_lines: usize,
) -> Result<(u64, Vec<ChapterIdentity>)> {
    let sample = document.head_sample(sample_lines);

    let output = llm
        .identify(&sample)
        .await
        .map_err(|e| PipelineError::LMError(e.to_string()))?;

    let line_pattern = chapter_list_line_pattern();
    let mut identities = Vec::new();
    let mut seen = HashSet::new();

    for line in output.chapter_list.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(captures) = line_pattern.captures(line) else {
            warn!(line, "skipping unparsable chapter_list line");
            continue;
        };
        let number: u64 = match captures[1].parse() {
            Ok(n) => n,
            Err(_) => {
                warn!(line, "skipping chapter_list line with unparsable number");
                continue;
            }
        };
        let title = captures[2].trim().to_string();
        if title.is_empty() {
            warn!(line, "skipping chapter_list line with empty title");
            continue;
        }

        if !seen.insert(number) {
            let duplicates: Vec<u64> = identities
                .iter()
                .map(|i: &ChapterIdentity| i.number)
                .chain(std::iter::once(number))
                .collect();
            return Err(PipelineError::IdentityConflict(duplicates));
        }

        identities.push(ChapterIdentity { number, title });
    }

    info!(
        chapter_count = output.chapter_count,
        parsed = identities.len(),
        "stage 1 complete"
    );

    Ok((output.chapter_count, identities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLMClient;

    #[tokio::test]
    async fn parses_well_formed_list() {
        let doc = Document::new("Prologue\ntext a\nCHAPTER 1\n");
        let llm = ScriptedLMClient::default().with_identify(3, "1. One\n2. Two\n3. Three");
        let (count, identities) = identify(&doc, &llm, 3000).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(identities.len(), 3);
        assert_eq!(identities[0], ChapterIdentity { number: 1, title: "One".into() });
    }

    #[tokio::test]
    async fn skips_unparsable_lines_with_warning() {
        let doc = Document::new("x");
        let llm = ScriptedLMClient::default()
            .with_identify(2, "1. One\nnot a chapter line\n2. Two");
        let (_, identities) = identify(&doc, &llm, 3000).await.unwrap();
        assert_eq!(identities.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_numbers_are_a_conflict() {
        let doc = Document::new("x");
        let llm = ScriptedLMClient::default().with_identify(2, "1. One\n1. One Again");
        let err = identify(&doc, &llm, 3000).await.unwrap_err();
        assert!(matches!(err, PipelineError::IdentityConflict(_)));
    }

    #[tokio::test]
    async fn empty_list_yields_empty_identities_not_an_error() {
        let doc = Document::new("x");
        let llm = ScriptedLMClient::default().with_identify(0, "");
        let (count, identities) = identify(&doc, &llm, 3000).await.unwrap();
        assert_eq!(count, 0);
        assert!(identities.is_empty());
    }
}
