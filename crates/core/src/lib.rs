//! Core library for rcoach
//!
//! This crate implements the **Functional Core** of the rcoach service,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`rcoach_core`** (this crate): Pure transformation functions with zero I/O
//! - **`rcoach`**: HTTP server, upstream client, configuration (the Imperative Shell)
//!
//! Everything here is deterministic and tested with fixture strings: no
//! network, no environment, no clock.
//!
//! # Module Organization
//!
//! - [`analysis`]: Building the model prompt from questionnaire answers and
//!   extracting the justification and R code from the model's reply
//! - [`gemini`]: Request/response types for the Gemini `generateContent`
//!   endpoint and selection of the generated text
//!
//! # Example Usage
//!
//! ```rust
//! use rcoach_core::analysis::{build_prompt, extract_analysis, AnswerSet};
//!
//! let mut answers = AnswerSet::default();
//! answers.insert("outcome", "binary");
//!
//! let prompt = build_prompt(&answers).unwrap();
//! assert!(prompt.contains("**R Code:**"));
//!
//! let result = extract_analysis("**Justification:** Logistic regression.\n**R Code:**\n```r\nglm(y ~ x, family = binomial)\n```");
//! assert_eq!(result.justification, "Logistic regression.");
//! assert_eq!(result.code, "glm(y ~ x, family = binomial)");
//! ```

pub mod analysis;
pub mod gemini;
