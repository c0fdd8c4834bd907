//! Stage 2: ask the LM for a unique start/end regex per identified chapter.
//! One task per chapter, fanned out with a `JoinSet` and reordered by
//! chapter number before handoff to stage 3.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::llm::LMClient;
use crate::models::{BoundaryPair, ChapterIdentity, Document};

/// Generates boundary patterns for every identified chapter concurrently.
/// A single chapter's LM failure is isolated: that chapter comes back as
/// [`BoundaryPair::failed`], the rest proceed unaffected.
pub async fn generate_all(
    document: &Document,
    identities: Vec<ChapterIdentity>,
    llm: Arc<dyn LMClient>,
    max_concurrency: Option<usize>,
) -> Vec<BoundaryPair> {
    let full_text = Arc::new(document.full_text());
    let permits = max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));

    let mut tasks = JoinSet::new();
    for identity in identities {
        let llm = Arc::clone(&llm);
        let full_text = Arc::clone(&full_text);
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = match &permits {
                Some(sem) => Some(sem.clone().acquire_owned().await.expect("semaphore not closed")),
                None => None,
            };
            generate_one(&full_text, identity, llm.as_ref()).await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(e) => warn!(error = %e, "boundary generation task panicked"),
        }
    }

    results.sort_by_key(|p| p.identity.number);
    info!(chapters = results.len(), "stage 2 complete");
    results
}

async fn generate_one(
    full_text: &str,
    identity: ChapterIdentity,
    llm: &dyn LMClient,
) -> BoundaryPair {
    match llm.boundaries(full_text, identity.number, &identity.title).await {
        Ok(output) => BoundaryPair::new(identity, output.start_pattern, output.end_pattern),
        Err(e) => {
            warn!(chapter = identity.number, error = %e, "stage 2 LM call failed");
            BoundaryPair::failed(identity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLMClient;

    #[tokio::test]
    async fn reorders_results_by_chapter_number() {
        let doc = Document::new("a\nb\nc");
        let llm = Arc::new(
            ScriptedLMClient::default()
                .with_boundaries(3, "^c$", "^end$")
                .with_boundaries(1, "^a$", "^b$")
                .with_boundaries(2, "^b$", "^c$"),
        ) as Arc<dyn LMClient>;
        let identities = vec![
            ChapterIdentity { number: 3, title: "Three".into() },
            ChapterIdentity { number: 1, title: "One".into() },
            ChapterIdentity { number: 2, title: "Two".into() },
        ];
        let pairs = generate_all(&doc, identities, llm, None).await;
        let numbers: Vec<u64> = pairs.iter().map(|p| p.identity.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn isolates_a_single_chapter_lm_failure() {
        let doc = Document::new("a\nb\nc");
        let llm = Arc::new(
            ScriptedLMClient::default()
                .with_boundaries(1, "^a$", "^b$")
                .with_boundaries_failure(2)
                .with_boundaries(3, "^c$", "^end$"),
        ) as Arc<dyn LMClient>;
        let identities = vec![
            ChapterIdentity { number: 1, title: "One".into() },
            ChapterIdentity { number: 2, title: "Two".into() },
            ChapterIdentity { number: 3, title: "Three".into() },
        ];
        let pairs = generate_all(&doc, identities, llm, None).await;
        assert_eq!(pairs.len(), 3);
        let ch2 = pairs.iter().find(|p| p.identity.number == 2).unwrap();
        assert!(!ch2.is_valid);
        assert!(ch2.start_pattern.is_empty());
    }
}
