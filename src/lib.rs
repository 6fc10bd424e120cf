//! Semantic skill matcher library
//!
//! Compares a list of required skills against a list of resume skills by
//! embedding both and classifying each required skill as matched or missing.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod input;
pub mod matching;
pub mod output;

pub use config::Config;
pub use embedding::Embedder;
pub use error::{EmbeddingError, Result, SkillMatcherError};
pub use matching::matcher::{MatchReport, MatchResult, SkillMatcher, SkillScore, DEFAULT_THRESHOLD};
