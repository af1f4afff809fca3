use super::types::AnswerSet;
use super::{CODE_MARKER, JUSTIFICATION_MARKER, R_FENCE_CLOSE, R_FENCE_OPEN};

/// Errors raised while assembling a prompt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("No answers provided!")]
    EmptyAnswers,
}

/// Build the model prompt for a set of questionnaire answers.
///
/// The prompt asks for a statistical method with a one-paragraph
/// justification and an R snippet, pins the exact response layout the
/// extractor expects, and ends with the answers rendered as JSON.
pub fn build_prompt(answers: &AnswerSet) -> Result<String, PromptError> {
    if answers.is_empty() {
        return Err(PromptError::EmptyAnswers);
    }

    let mut prompt = String::from(
        "Based on the user's responses, suggest the best statistical method in one short paragraph. \
         Then, provide an R code snippet separately without explanation. \
         The response should follow this format strictly:\n\n",
    );
    prompt.push_str(&format!(
        "{JUSTIFICATION_MARKER} [one-paragraph explanation]\n\n"
    ));
    prompt.push_str(&format!(
        "{CODE_MARKER}\n{R_FENCE_OPEN}\n[R code here]\n{R_FENCE_CLOSE}"
    ));
    prompt.push_str(&format!("\n\nUser responses:\n{answers}"));

    Ok(prompt)
}
