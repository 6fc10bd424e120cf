//! Report document wrapping a match run

use crate::matching::matcher::{MatchReport, SkillScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a formatter needs to present one match run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReportDocument {
    pub metadata: ReportMetadata,
    pub summary: MatchSummary,

    /// Required skills found in the resume, in requirement order
    pub matched: Vec<String>,

    /// Required skills with no close resume skill, in requirement order
    pub missing: Vec<String>,

    pub scores: Vec<SkillScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub matcher_version: String,
    pub embedding_model: String,
    pub embedding_dim: Option<usize>,
    pub threshold: f32,
    pub processing_time_ms: u64,
    pub normalized_labels: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub required_count: usize,
    pub resume_count: usize,
    pub matched_count: usize,
    pub missing_count: usize,
    /// matched / required as a percentage; 100 when nothing is required
    pub coverage_percentage: f32,
}

impl MatchReportDocument {
    pub fn new(report: MatchReport, resume_count: usize, processing_time_ms: u64, normalized_labels: bool) -> Self {
        let required_count = report.scores.len();
        let matched_count = report.result.matched.len();
        let coverage_percentage = if required_count == 0 {
            100.0
        } else {
            matched_count as f32 / required_count as f32 * 100.0
        };

        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                matcher_version: env!("CARGO_PKG_VERSION").to_string(),
                embedding_model: report.model_name,
                embedding_dim: report.embedding_dim,
                threshold: report.threshold,
                processing_time_ms,
                normalized_labels,
            },
            summary: MatchSummary {
                required_count,
                resume_count,
                matched_count,
                missing_count: report.result.missing.len(),
                coverage_percentage,
            },
            matched: report.result.matched,
            missing: report.result.missing,
            scores: report.scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::MatchResult;

    fn sample_report(matched: &[&str], missing: &[&str]) -> MatchReport {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let scores = matched
            .iter()
            .map(|s| (s, true))
            .chain(missing.iter().map(|s| (s, false)))
            .map(|(skill, is_match)| SkillScore {
                skill: skill.to_string(),
                best_match: None,
                similarity: None,
                matched: is_match,
            })
            .collect();

        MatchReport {
            result: MatchResult {
                matched: to_vec(matched),
                missing: to_vec(missing),
            },
            scores,
            threshold: 0.7,
            model_name: "test".to_string(),
            embedding_dim: Some(8),
        }
    }

    #[test]
    fn test_summary_counts() {
        let doc = MatchReportDocument::new(sample_report(&["react", "git"], &["css", "typescript"]), 5, 12, false);
        assert_eq!(doc.summary.required_count, 4);
        assert_eq!(doc.summary.matched_count, 2);
        assert_eq!(doc.summary.missing_count, 2);
        assert!((doc.summary.coverage_percentage - 50.0).abs() < f32::EPSILON);
        assert_eq!(doc.metadata.embedding_model, "test");
        assert_eq!(doc.metadata.matcher_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_empty_requirements_are_fully_covered() {
        let doc = MatchReportDocument::new(sample_report(&[], &[]), 3, 0, false);
        assert!((doc.summary.coverage_percentage - 100.0).abs() < f32::EPSILON);
    }
}
