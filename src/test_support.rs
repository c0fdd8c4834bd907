//! A scripted [`LMClient`] stub shared by unit and scenario tests. Each
//! method's response for a given chapter number is pre-registered; calling
//! it for an unregistered chapter panics, so a test's intent stays explicit.
//!
//! Exposed as a normal public module (not `#[cfg(test)]`) so both the
//! crate's own unit tests and its `tests/` integration tests can depend on
//! the same stub instead of maintaining two copies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{BoundariesOutput, IdentifyOutput, LMClient, LMError, VerifyOutput};

#[derive(Default)]
pub struct ScriptedLMClient {
    identify_response: Mutex<Option<(u64, String)>>,
    boundaries: Mutex<HashMap<u64, Result<(String, String), ()>>>,
    verify: Mutex<HashMap<u64, (bool, f64, String)>>,
}

impl ScriptedLMClient {
    pub fn with_identify(self, chapter_count: u64, chapter_list: &str) -> Self {
        *self.identify_response.lock().unwrap() = Some((chapter_count, chapter_list.to_string()));
        self
    }

    pub fn with_boundaries(self, chapter: u64, start_pattern: &str, end_pattern: &str) -> Self {
        self.boundaries
            .lock()
            .unwrap()
            .insert(chapter, Ok((start_pattern.to_string(), end_pattern.to_string())));
        self
    }

    pub fn with_boundaries_failure(self, chapter: u64) -> Self {
        self.boundaries.lock().unwrap().insert(chapter, Err(()));
        self
    }

    pub fn with_verify(self, chapter: u64, is_correct: bool, confidence: f64, notes: &str) -> Self {
        self.verify
            .lock()
            .unwrap()
            .insert(chapter, (is_correct, confidence, notes.to_string()));
        self
    }
}

#[async_trait]
impl LMClient for ScriptedLMClient {
    async fn identify(&self, _text_sample: &str) -> Result<IdentifyOutput, LMError> {
        let (chapter_count, chapter_list) = self
            .identify_response
            .lock()
            .unwrap()
            .clone()
            .expect("identify response not scripted for this test");
        Ok(IdentifyOutput {
            chapter_count,
            chapter_list,
            analysis: String::new(),
        })
    }

    async fn boundaries(
        &self,
        _full_text: &str,
        chapter_number: u64,
        _chapter_title: &str,
    ) -> Result<BoundariesOutput, LMError> {
        match self.boundaries.lock().unwrap().get(&chapter_number) {
            Some(Ok((start_pattern, end_pattern))) => Ok(BoundariesOutput {
                start_pattern: start_pattern.clone(),
                end_pattern: end_pattern.clone(),
                pattern_explanation: String::new(),
            }),
            Some(Err(())) => Err(LMError::Transport(format!(
                "scripted failure for chapter {chapter_number}"
            ))),
            None => panic!("no boundaries scripted for chapter {chapter_number}"),
        }
    }

    async fn verify(
        &self,
        _extracted_text: &str,
        expected_chapter_number: u64,
        _expected_chapter_title: &str,
    ) -> Result<VerifyOutput, LMError> {
        let (is_correct, confidence, notes) = self
            .verify
            .lock()
            .unwrap()
            .get(&expected_chapter_number)
            .cloned()
            .unwrap_or_else(|| panic!("no verify response scripted for chapter {expected_chapter_number}"));
        Ok(VerifyOutput { is_correct, confidence, notes })
    }
}
