//! Wire types for the Gemini `generateContent` endpoint.
//!
//! Only the fields this project reads or writes are modelled. Everything on
//! the response side is optional because the service answers with either a
//! candidate list or an `error` object, and sometimes with neither.

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Errors derived from a Gemini response body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeminiError {
    #[error("Gemini API Error: {0}")]
    Api(String),

    #[error("No response received from Gemini API.")]
    NoResponse,
}

/// Request body: a single user turn with one text part.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Select the generated text from a response.
///
/// An `error` object wins over any candidates. Otherwise the text of the
/// first part of the first candidate is returned; a missing or empty text
/// is reported as [`GeminiError::NoResponse`].
pub fn response_text(response: &GenerateContentResponse) -> Result<&str, GeminiError> {
    if let Some(error) = &response.error {
        return Err(GeminiError::Api(error.message.clone()));
    }

    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.as_deref())
        .filter(|text| !text.is_empty())
        .ok_or(GeminiError::NoResponse)
}
