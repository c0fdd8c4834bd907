//! Stage 3: scan the full text with each pattern and enforce the
//! uniqueness contract. Pure, synchronous, CPU-bound — no LM calls, no
//! concurrency needed, output order mirrors input order.

use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::BoundaryError;
use crate::models::{BoundaryPair, Document};

/// Validates every pair against `document`, populating `is_valid`,
/// `start_line` and `end_line` in place. A pair that already carries
/// `is_valid = false` with empty patterns (a stage 2 failure) is left
/// untouched.
pub fn validate_all(document: &Document, mut pairs: Vec<BoundaryPair>, regex_timeout: Duration) -> Vec<BoundaryPair> {
    for pair in &mut pairs {
        if pair.start_pattern.is_empty() && pair.end_pattern.is_empty() {
            continue;
        }
        validate_one(document, pair, regex_timeout);
    }
    pairs
}

fn validate_one(document: &Document, pair: &mut BoundaryPair, regex_timeout: Duration) {
    let start_regex = match compile(&pair.start_pattern) {
        Ok(re) => re,
        Err(_) => {
            pair.is_valid = false;
            return;
        }
    };
    let end_regex = match compile(&pair.end_pattern) {
        Ok(re) => re,
        Err(_) => {
            pair.is_valid = false;
            return;
        }
    };

    let start_matches = match find_matching_lines(document, &start_regex, regex_timeout) {
        Ok(lines) => lines,
        Err(_) => {
            pair.is_valid = false;
            return;
        }
    };
    let end_matches = match find_matching_lines(document, &end_regex, regex_timeout) {
        Ok(lines) => lines,
        Err(_) => {
            pair.is_valid = false;
            return;
        }
    };

    if start_matches.len() != 1 {
        debug!(
            pattern = %pair.start_pattern,
            matches = start_matches.len(),
            "uniqueness violation"
        );
        pair.is_valid = false;
        return;
    }
    if end_matches.len() != 1 {
        debug!(
            pattern = %pair.end_pattern,
            matches = end_matches.len(),
            "uniqueness violation"
        );
        pair.is_valid = false;
        return;
    }

    let start_line = start_matches[0];
    let end_line = end_matches[0];
    pair.start_line = Some(start_line);
    pair.end_line = Some(end_line);
    pair.is_valid = start_line < end_line;
}

fn compile(pattern: &str) -> Result<Regex, BoundaryError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|e| BoundaryError::PatternCompileError(e.to_string()))
}

/// Lines on which `pattern` matches anywhere, bounded by a per-line timeout.
/// `regex`'s matcher is linear-time by construction (no catastrophic
/// backtracking), so this timeout exists as a defensive budget rather than
/// a true watchdog — it still satisfies the "no unbounded match" contract.
fn find_matching_lines(
    document: &Document,
    pattern: &Regex,
    timeout: Duration,
) -> Result<Vec<usize>, BoundaryError> {
    let mut matches = Vec::new();
    for (index, line) in document.lines().iter().enumerate() {
        let started = Instant::now();
        let is_match = pattern.is_match(line);
        if started.elapsed() > timeout {
            return Err(BoundaryError::PatternTimeoutError);
        }
        if is_match {
            matches.push(index);
        }
    }
    Ok(matches)
}
