//! Prompt building and response extraction for statistical-method analysis.
//!
//! The model is asked to answer in a fixed layout:
//!
//! ~~~text
//! **Justification:** <one paragraph>
//!
//! **R Code:**
//! ```r
//! <code>
//! ```
//! ~~~
//!
//! [`build_prompt`] pins that layout in the prompt and [`extract_analysis`]
//! reads it back, substituting fallback text when the model strays from it.

pub mod extract;
pub mod prompt;
pub mod types;

pub use extract::{extract_analysis, fence_code, FALLBACK_CODE, FALLBACK_JUSTIFICATION};
pub use prompt::{build_prompt, PromptError};
pub use types::{AnalysisResult, AnalyzeRequest, AnalyzeResponse, AnswerSet};

pub const JUSTIFICATION_MARKER: &str = "**Justification:**";
pub const CODE_MARKER: &str = "**R Code:**";
pub const R_FENCE_OPEN: &str = "```r";
pub const R_FENCE_CLOSE: &str = "```";
