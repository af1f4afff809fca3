use crate::gemini::{GeminiClient, GeminiConfig, GeminiOptions};
use crate::prelude::{eprintln, println, *};
use rcoach_core::analysis::{build_prompt, extract_analysis, AnalyzeResponse, AnswerSet};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Debug, clap::Args)]
pub struct AnalyzeOptions {
    /// JSON file with the answers, either `{"answers": {...}}` or the bare
    /// answers object. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Print the response as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub gemini: GeminiOptions,
}

#[derive(Debug, clap::Args)]
pub struct PromptOptions {
    /// JSON file with the answers. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
}

/// Run the whole pipeline for one set of answers.
///
/// Empty answers are rejected before the API is contacted.
pub async fn analyze_data(
    client: &GeminiClient,
    answers: &AnswerSet,
) -> Result<AnalyzeResponse, Error> {
    let prompt = build_prompt(answers)?;
    debug!("Prompt:\n{}", prompt);

    let text = client.generate(&prompt).await?;
    debug!("Model text:\n{}", text);

    Ok(extract_analysis(&text).into())
}

pub async fn run_analyze(options: AnalyzeOptions, global: crate::Global) -> Result<()> {
    let config = GeminiConfig::from_options(options.gemini)?;
    let answers = read_answers(options.input.as_ref()).await?;

    if global.verbose {
        eprintln!("Model: {}", config.model);
        eprintln!("Answers: {}", answers.len());
    }

    let client = GeminiClient::new(config)?;
    let response = analyze_data(&client, &answers).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}\n", response.recommendation);
        println!("{}", response.r_code);
    }

    Ok(())
}

pub async fn run_prompt(options: PromptOptions, _global: crate::Global) -> Result<()> {
    let answers = read_answers(options.input.as_ref()).await?;
    println!("{}", build_prompt(&answers)?);
    Ok(())
}

async fn read_answers(input: Option<&PathBuf>) -> Result<AnswerSet> {
    let text = match input {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| f!("Failed to read '{}'", path.display()))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read answers from stdin")?;
            buf
        }
    };

    parse_answers(&text)
}

/// Accepts the request body shape or the bare answers object.
fn parse_answers(text: &str) -> Result<AnswerSet> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("Answers are not valid JSON")?;

    let serde_json::Value::Object(mut map) = value else {
        return Err(eyre!("Answers must be a JSON object"));
    };

    let wrapped = map.len() == 1 && matches!(map.get("answers"), Some(serde_json::Value::Object(_)));
    if wrapped {
        if let Some(serde_json::Value::Object(inner)) = map.remove("answers") {
            return Ok(inner.into());
        }
    }

    Ok(map.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_shape() {
        let answers = parse_answers(r#"{"answers": {"design": "paired"}}"#).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.0["design"], json!("paired"));
    }

    #[test]
    fn test_parse_bare_answers() {
        let answers = parse_answers(r#"{"design": "paired", "n": 40}"#).unwrap();
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn test_answers_key_with_scalar_is_an_answer() {
        let answers = parse_answers(r#"{"answers": "yes"}"#).unwrap();
        assert_eq!(answers.0["answers"], json!("yes"));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_answers("[1, 2]").is_err());
        assert!(parse_answers("not json").is_err());
    }
}
