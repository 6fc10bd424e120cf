//! Skill matching engine

pub mod matcher;
pub mod similarity;

pub use matcher::{MatchReport, MatchResult, SkillMatcher, SkillScore, DEFAULT_THRESHOLD};
pub use similarity::SimilarityMatrix;
