use super::types::AnalysisResult;
use super::{CODE_MARKER, JUSTIFICATION_MARKER, R_FENCE_CLOSE, R_FENCE_OPEN};

pub const FALLBACK_JUSTIFICATION: &str = "Could not extract justification from the response.";
pub const FALLBACK_CODE: &str = "# Error: Could not extract R code. Try re-running the request.";

/// Split a model response into its justification and R code.
///
/// Never fails: whatever cannot be located is replaced with fallback text,
/// so both fields of the result are always non-empty.
pub fn extract_analysis(response: &str) -> AnalysisResult {
    let (justification, code) = split_sections(response)
        .map(|(justification, code_section)| {
            (justification, extract_fenced_block(code_section).unwrap_or(""))
        })
        .unwrap_or((String::new(), ""));

    AnalysisResult {
        justification: if justification.is_empty() {
            FALLBACK_JUSTIFICATION.to_string()
        } else {
            justification
        },
        code: if code.is_empty() {
            FALLBACK_CODE.to_string()
        } else {
            code.to_string()
        },
    }
}

/// Returns the cleaned justification and the trimmed code section, or `None`
/// when either marker is missing.
fn split_sections(response: &str) -> Option<(String, &str)> {
    if !response.contains(JUSTIFICATION_MARKER) {
        return None;
    }
    let (head, tail) = response.split_once(CODE_MARKER)?;

    let justification = head.replace(JUSTIFICATION_MARKER, "").trim().to_string();
    // A repeated code marker ends the section.
    let code_section = tail.split(CODE_MARKER).next().unwrap_or(tail).trim();

    Some((justification, code_section))
}

/// Text strictly between the first ```` ```r ```` and the next ```` ``` ````, trimmed.
fn extract_fenced_block(section: &str) -> Option<&str> {
    let start = section.find(R_FENCE_OPEN)? + R_FENCE_OPEN.len();
    let len = section[start..].find(R_FENCE_CLOSE)?;
    Some(section[start..start + len].trim())
}

/// Wrap code in a single ```` ```r ```` fence pair.
///
/// Fences already present are removed first, so applying this to its own
/// output returns the same string.
pub fn fence_code(code: &str) -> String {
    let mut inner = code.trim();
    while let Some(unwrapped) = strip_fence(inner) {
        inner = unwrapped;
    }
    format!("{R_FENCE_OPEN}\n{inner}\n{R_FENCE_CLOSE}")
}

fn strip_fence(code: &str) -> Option<&str> {
    let body = code.strip_prefix(R_FENCE_OPEN)?.strip_suffix(R_FENCE_CLOSE)?;
    Some(body.trim())
}
