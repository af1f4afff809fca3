use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Questionnaire answers supplied by the caller.
///
/// Keys and values are free-form; the only rule enforced anywhere is that
/// the set must not be empty (see [`super::prompt::build_prompt`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(pub Map<String, Value>);

impl AnswerSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Insert an answer, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Compact JSON rendering with keys in sorted order.
impl std::fmt::Display for AnswerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}

impl From<Map<String, Value>> for AnswerSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Inbound payload of the analyze operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub answers: AnswerSet,
}

/// Justification and R code pulled out of a model response.
///
/// Both fields are always non-empty. `code` is kept without fences; use
/// [`AnalysisResult::fenced_code`] for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub justification: String,
    pub code: String,
}

impl AnalysisResult {
    /// The code wrapped in a single ```` ```r ```` fence pair.
    pub fn fenced_code(&self) -> String {
        super::extract::fence_code(&self.code)
    }
}

/// Outbound payload of the analyze operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub recommendation: String,
    /// Always a copy of `recommendation`. Redundant, kept because existing
    /// frontends read it.
    pub explanation: String,
    pub r_code: String,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        let r_code = result.fenced_code();
        Self {
            explanation: result.justification.clone(),
            recommendation: result.justification,
            r_code,
        }
    }
}
