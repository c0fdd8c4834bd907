//! Thin CLI entry point: reads a file, runs the pipeline, prints a summary
//! plus the serialized results. Does not implement the pipeline itself.

use std::path::PathBuf;
use std::sync::Arc;

use chapterbound::{ExtractionResult, HttpLMClient, LMClient, Pipeline, PipelineConfig};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "extract-chapters", about = "Extract chapters from a book using boundary detection")]
struct Cli {
    /// Input text file
    input_file: PathBuf,

    /// LLM model to use
    #[arg(long, default_value = "google:gemini-2.0-flash")]
    model: String,

    /// Number of lines sampled from the head of the document for stage 1
    #[arg(long)]
    sample_lines: Option<usize>,

    /// Upper bound on concurrent LM calls in stages 2 and 4
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Renders the pipeline's results in the requested format. Pulled out of
/// `main` so format selection is unit-testable without a live LM.
fn render(results: &[ExtractionResult], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(results)?)),
        OutputFormat::Text => {
            let mut out = String::new();
            for result in results {
                out.push_str(&format!("Chapter {}: {}\n", result.chapter_number, result.chapter_title));
                out.push_str(&"=".repeat(60));
                out.push('\n');
                out.push_str(&result.text);
                out.push_str("\n\n");
            }
            Ok(out)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let text = read_input(&cli.input_file)?;

    let mut config = PipelineConfig::from_env();
    config.llm_model = cli.model;
    if let Some(n) = cli.sample_lines {
        config.sample_lines = n;
    }
    if cli.max_concurrency.is_some() {
        config.max_concurrency = cli.max_concurrency;
    }

    let llm: Arc<dyn LMClient> = Arc::new(HttpLMClient::new(config.llm_model.clone()));
    let pipeline = Pipeline::new(&text, llm, config);

    let results = pipeline.extract_all().await?;

    let verified = results.iter().filter(|r| r.verification_passed).count();
    eprintln!(
        "Extracted {} chapters ({} verified)",
        results.len(),
        verified
    );

    print!("{}", render(&results, cli.format)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        let dir = std::env::temp_dir().join("chapterbound-bom-test.txt");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("CHAPTER 1".as_bytes());
        std::fs::write(&dir, &bytes).unwrap();
        let text = read_input(&dir).unwrap();
        assert_eq!(text, "CHAPTER 1");
        std::fs::remove_file(&dir).ok();
    }

    #[test]
    fn passes_through_text_without_bom() {
        let dir = std::env::temp_dir().join("chapterbound-no-bom-test.txt");
        std::fs::write(&dir, "CHAPTER 1").unwrap();
        let text = read_input(&dir).unwrap();
        assert_eq!(text, "CHAPTER 1");
        std::fs::remove_file(&dir).ok();
    }

    fn sample_results() -> Vec<ExtractionResult> {
        vec![ExtractionResult {
            chapter_number: 1,
            chapter_title: "The Beginning".to_string(),
            text: "Once upon a time.".to_string(),
            start_line: 0,
            end_line: 3,
            word_count: 4,
            verification_passed: true,
            verification_notes: Some("looks right".to_string()),
        }]
    }

    #[test]
    fn renders_json_format() {
        let out = render(&sample_results(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["chapter_number"], 1);
        assert_eq!(parsed[0]["chapter_title"], "The Beginning");
    }

    #[test]
    fn renders_text_format() {
        let out = render(&sample_results(), OutputFormat::Text).unwrap();
        assert!(out.contains("Chapter 1: The Beginning"));
        assert!(out.contains("Once upon a time."));
        assert!(out.contains(&"=".repeat(60)));
    }
}
