//! Semantic skill matching: required skills vs resume skills

use crate::embedding::{validate_embeddings, Embedder};
use crate::error::{EmbeddingError, Result, SkillMatcherError};
use crate::matching::similarity::SimilarityMatrix;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Partition of the required skills. Both lists keep the order of `required`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// How one required skill was classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScore {
    pub skill: String,
    /// Closest resume skill, if any were compared
    pub best_match: Option<String>,
    pub similarity: Option<f32>,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub result: MatchResult,
    pub scores: Vec<SkillScore>,
    pub threshold: f32,
    pub model_name: String,
    /// Absent when the embedder was never called
    pub embedding_dim: Option<usize>,
}

impl MatchReport {
    pub fn into_result(self) -> MatchResult {
        self.result
    }
}

/// Classifies required skills as matched or missing against resume skills.
///
/// A required skill is matched when its best cosine similarity against any
/// resume skill is at least the threshold. The embedder is injected; the
/// matcher holds no other state and can be shared across concurrent calls.
pub struct SkillMatcher<E> {
    embedder: E,
    threshold: f32,
}

impl<E: Embedder> SkillMatcher<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Default threshold used by `match_skills`
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub async fn match_skills(&self, required: &[String], resume: &[String]) -> Result<MatchResult> {
        self.match_skills_with_threshold(required, resume, self.threshold).await
    }

    pub async fn match_skills_with_threshold(
        &self,
        required: &[String],
        resume: &[String],
        threshold: f32,
    ) -> Result<MatchResult> {
        Ok(self
            .match_skills_detailed(required, resume, threshold)
            .await?
            .into_result())
    }

    /// Match and keep the per-skill best match and score.
    pub async fn match_skills_detailed(
        &self,
        required: &[String],
        resume: &[String],
        threshold: f32,
    ) -> Result<MatchReport> {
        validate_threshold(threshold)?;

        // Nothing required is trivially satisfied; nothing to compare against
        // leaves every requirement missing.
        if required.is_empty() || resume.is_empty() {
            debug!(
                "Skipping embeddings: {} required, {} resume skills",
                required.len(),
                resume.len()
            );
            return Ok(MatchReport {
                result: MatchResult {
                    matched: Vec::new(),
                    missing: required.to_vec(),
                },
                scores: required
                    .iter()
                    .map(|skill| SkillScore {
                        skill: skill.clone(),
                        best_match: None,
                        similarity: None,
                        matched: false,
                    })
                    .collect(),
                threshold,
                model_name: self.embedder.model_name().to_string(),
                embedding_dim: None,
            });
        }

        let (required_embeddings, resume_embeddings) =
            tokio::try_join!(self.embedder.embed(required), self.embedder.embed(resume))?;

        let required_dim = validate_embeddings(required.len(), &required_embeddings)?;
        let resume_dim = validate_embeddings(resume.len(), &resume_embeddings)?;
        if required_dim != resume_dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: required_dim,
                actual: resume_dim,
            }
            .into());
        }

        let similarities = SimilarityMatrix::compute(&required_embeddings, &resume_embeddings)?;
        let report = classify(required, resume, &similarities, threshold, self.embedder.model_name(), required_dim);

        debug!(
            "Matched {}/{} required skills at threshold {} using {}",
            report.result.matched.len(),
            required.len(),
            threshold,
            report.model_name
        );
        Ok(report)
    }
}

fn validate_threshold(threshold: f32) -> Result<()> {
    if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
        return Err(SkillMatcherError::InvalidInput(format!(
            "threshold must be within [0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

fn classify(
    required: &[String],
    resume: &[String],
    similarities: &SimilarityMatrix,
    threshold: f32,
    model_name: &str,
    embedding_dim: usize,
) -> MatchReport {
    let mut result = MatchResult::default();
    let mut scores = Vec::with_capacity(required.len());

    for (i, skill) in required.iter().enumerate() {
        let best = similarities.row_max(i);
        let is_match = best.map_or(false, |(_, score)| score >= threshold);

        if is_match {
            result.matched.push(skill.clone());
        } else {
            result.missing.push(skill.clone());
        }

        scores.push(SkillScore {
            skill: skill.clone(),
            best_match: best.and_then(|(j, _)| resume.get(j).cloned()),
            similarity: best.map(|(_, score)| score),
            matched: is_match,
        });
    }

    MatchReport {
        result,
        scores,
        threshold,
        model_name: model_name.to_string(),
        embedding_dim: Some(embedding_dim),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Looks labels up in a fixed table; unknown labels get a zero vector
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        dim: usize,
        calls: AtomicUsize,
    }

    impl TableEmbedder {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
            Self {
                table: entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                dim,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, labels: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(labels
                .iter()
                .map(|l| self.table.get(l).cloned().unwrap_or_else(|| vec![0.0; self.dim]))
                .collect())
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    /// Returns a vector of different length depending on the first label
    struct RaggedEmbedder;

    #[async_trait]
    impl Embedder for RaggedEmbedder {
        async fn embed(&self, labels: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            let dim = if labels[0].starts_with('r') { 2 } else { 3 };
            Ok(labels.iter().map(|_| vec![1.0; dim]).collect())
        }

        fn model_name(&self) -> &str {
            "ragged"
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _labels: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(vec![vec![1.0, 0.0]])
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn skills_table() -> TableEmbedder {
        TableEmbedder::new(&[
            ("react", vec![1.0, 0.0, 0.0]),
            ("React.js", vec![0.9, 0.1, 0.0]),
            ("git", vec![0.0, 1.0, 0.0]),
            ("css", vec![0.0, 0.0, 1.0]),
            ("HTML", vec![0.0, 0.6, 0.8]),
        ])
    }

    #[tokio::test]
    async fn test_basic_partition() {
        let matcher = SkillMatcher::new(skills_table());
        let result = matcher
            .match_skills(&labels(&["react", "git", "css"]), &labels(&["React.js", "HTML"]))
            .await
            .unwrap();

        assert_eq!(result.matched, labels(&["react", "css"]));
        assert_eq!(result.missing, labels(&["git"]));
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_inclusive() {
        let matcher = SkillMatcher::new(skills_table());
        let required = labels(&["css"]);
        let resume = labels(&["HTML"]);

        let report = matcher.match_skills_detailed(&required, &resume, 0.8).await.unwrap();
        let score = report.scores[0].similarity.unwrap();

        let at_score = matcher
            .match_skills_with_threshold(&required, &resume, score)
            .await
            .unwrap();
        assert_eq!(at_score.matched, required);

        let above = matcher
            .match_skills_with_threshold(&required, &resume, (score + 1e-4).min(1.0))
            .await
            .unwrap();
        assert_eq!(above.missing, required);
    }

    #[tokio::test]
    async fn test_identical_labels_match_at_full_threshold() {
        let matcher = SkillMatcher::new(TableEmbedder::new(&[
            ("kubernetes", vec![0.1, 0.2, 0.3]),
            ("tiny", vec![1e-4, 2e-4, 3e-4]),
            ("terraform", vec![0.3, 0.7, 0.2]),
        ]));
        let skills = labels(&["kubernetes", "tiny", "terraform"]);

        let report = matcher.match_skills_detailed(&skills, &skills, 1.0).await.unwrap();

        assert_eq!(report.result.matched, skills);
        assert!(report.result.missing.is_empty());
        assert!(report.scores.iter().all(|s| s.similarity == Some(1.0)));
    }

    #[tokio::test]
    async fn test_empty_resume_marks_everything_missing() {
        let matcher = SkillMatcher::new(skills_table());
        let result = matcher.match_skills(&labels(&["react", "git"]), &[]).await.unwrap();

        assert!(result.matched.is_empty());
        assert_eq!(result.missing, labels(&["react", "git"]));
        assert_eq!(matcher.embedder().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_required_yields_nothing() {
        let matcher = SkillMatcher::new(skills_table());
        let report = matcher
            .match_skills_detailed(&[], &labels(&["react"]), 0.7)
            .await
            .unwrap();

        assert_eq!(report.result, MatchResult::default());
        assert!(report.scores.is_empty());
        assert_eq!(report.embedding_dim, None);
        assert_eq!(matcher.embedder().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detailed_scores() {
        let matcher = SkillMatcher::new(skills_table());
        let report = matcher
            .match_skills_detailed(&labels(&["react", "git"]), &labels(&["HTML", "React.js"]), 0.7)
            .await
            .unwrap();

        assert_eq!(report.embedding_dim, Some(3));
        assert_eq!(report.model_name, "table");
        assert_eq!(report.scores[0].best_match.as_deref(), Some("React.js"));
        assert!(report.scores[0].matched);
        assert_eq!(report.scores[1].best_match.as_deref(), Some("HTML"));
        assert!(!report.scores[1].matched);
        assert!(report.scores.iter().all(|s| s.matched == report.result.matched.contains(&s.skill)));
    }

    #[tokio::test]
    async fn test_invalid_threshold_rejected_before_embedding() {
        let matcher = SkillMatcher::new(skills_table());
        let required = labels(&["react"]);
        let resume = labels(&["React.js"]);

        for threshold in [-0.1, 1.01, f32::NAN] {
            let result = matcher.match_skills_with_threshold(&required, &resume, threshold).await;
            assert!(matches!(result, Err(SkillMatcherError::InvalidInput(_))));
        }
        let empty = matcher.match_skills_with_threshold(&[], &resume, 2.0).await;
        assert!(matches!(empty, Err(SkillMatcherError::InvalidInput(_))));
        assert_eq!(matcher.embedder().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_between_calls() {
        let matcher = SkillMatcher::new(RaggedEmbedder);
        let result = matcher.match_skills(&labels(&["react"]), &labels(&["git"])).await;
        assert!(matches!(
            result,
            Err(SkillMatcherError::Embedding(EmbeddingError::DimensionMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_wrong_vector_count_is_malformed() {
        let matcher = SkillMatcher::new(ShortEmbedder);
        let result = matcher.match_skills(&labels(&["react", "git"]), &labels(&["css"])).await;
        assert!(matches!(
            result,
            Err(SkillMatcherError::Embedding(EmbeddingError::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_required_skills_each_classified() {
        let matcher = SkillMatcher::new(skills_table());
        let result = matcher
            .match_skills(&labels(&["react", "git", "react"]), &labels(&["React.js"]))
            .await
            .unwrap();

        assert_eq!(result.matched, labels(&["react", "react"]));
        assert_eq!(result.missing, labels(&["git"]));
    }
}
