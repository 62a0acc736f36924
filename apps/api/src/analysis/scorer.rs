//! Match Scorer — compares a normalized user skill set with a role's requirements.
//!
//! Produces the sorted list of missing role skills and a 0 – 100 score: each required
//! skill contributes 1.0 on a case-insensitive exact match, otherwise its best cosine
//! similarity against the user's skills. Contributions are averaged, scaled to 100 and
//! rounded to two decimals.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::embedding_client::{EmbeddingError, EmbeddingProvider};
use crate::errors::AppError;

/// Added to the cosine denominator so zero-norm vectors score 0 instead of NaN.
const COSINE_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// 0.0 – 100.0, two decimals.
    pub score: f64,
    /// Role skills absent from the user's set, canonical casing, sorted.
    pub missing: Vec<String>,
}

pub struct MatchScorer {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl MatchScorer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    pub fn backend(&self) -> &str {
        self.embedder.name()
    }

    pub async fn score(
        &self,
        user_skills: &[String],
        role_skills: &[String],
    ) -> Result<MatchResult, AppError> {
        let missing = compute_missing(user_skills, role_skills);
        let score = self.compute_score(user_skills, role_skills).await?;

        debug!(
            "Scored {} user skills against {} role skills: {score} ({} missing, backend={})",
            user_skills.len(),
            role_skills.len(),
            missing.len(),
            self.backend()
        );

        Ok(MatchResult { score, missing })
    }

    async fn compute_score(
        &self,
        user_skills: &[String],
        role_skills: &[String],
    ) -> Result<f64, AppError> {
        if user_skills.is_empty() || role_skills.is_empty() {
            return Ok(0.0);
        }

        let user_keys: HashSet<String> = user_skills.iter().map(|u| match_key(u)).collect();
        let unmatched: Vec<&String> = role_skills
            .iter()
            .filter(|r| !user_keys.contains(&match_key(r)))
            .collect();

        // Every requirement matched exactly: nothing to embed.
        if unmatched.is_empty() {
            return Ok(100.0);
        }

        // One embedding per distinct string, requested in a stable order.
        let items: Vec<String> = user_skills
            .iter()
            .chain(unmatched.iter().copied())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let vectors = self
            .embedder
            .embed(&items)
            .await
            .map_err(|e| AppError::Embedding(format!("{} provider: {e}", self.backend())))?;
        validate_embeddings(&items, &vectors)
            .map_err(|e| AppError::Embedding(format!("{} provider: {e}", self.backend())))?;

        let table: HashMap<&str, (&[f32], f64)> = items
            .iter()
            .zip(&vectors)
            .map(|(item, v)| (item.as_str(), (v.as_slice(), norm(v))))
            .collect();

        let mut total = 0.0_f64;
        for role_skill in role_skills {
            let key = match_key(role_skill);
            if user_keys.contains(&key) {
                total += 1.0;
                continue;
            }

            let (r_vec, r_norm) = table[role_skill.as_str()];
            let best = user_skills
                .iter()
                .map(|u| {
                    let (u_vec, u_norm) = table[u.as_str()];
                    cosine(r_vec, r_norm, u_vec, u_norm)
                })
                .fold(0.0_f64, f64::max);
            total += best.min(1.0);
        }

        let mean = total / role_skills.len() as f64;
        Ok(round2(mean * 100.0))
    }
}

/// Role skills the user lacks, compared case-insensitively, returned in the role's
/// casing and sorted. When a role lists the same skill twice with different casing,
/// the later spelling is reported.
pub fn compute_missing(user_skills: &[String], role_skills: &[String]) -> Vec<String> {
    let role_map: HashMap<String, &String> =
        role_skills.iter().map(|r| (r.to_lowercase(), r)).collect();
    let user_set: HashSet<String> = user_skills.iter().map(|u| match_key(u)).collect();

    let mut missing: Vec<String> = role_map
        .into_iter()
        .filter(|(lower, _)| !user_set.contains(lower))
        .map(|(_, canonical)| canonical.clone())
        .collect();
    missing.sort();
    missing
}

fn match_key(skill: &str) -> String {
    skill.trim().to_lowercase()
}

fn validate_embeddings(items: &[String], vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
    if vectors.len() != items.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: items.len(),
            got: vectors.len(),
        });
    }

    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let dims = first.len();

    for (item, v) in items.iter().zip(vectors) {
        if v.is_empty() {
            return Err(EmbeddingError::EmptyVector(item.clone()));
        }
        if v.len() != dims {
            return Err(EmbeddingError::DimensionMismatch {
                item: item.clone(),
                expected: dims,
                got: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::NonFinite(item.clone()));
        }
    }
    Ok(())
}

fn norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

fn cosine(a: &[f32], a_norm: f64, b: &[f32], b_norm: f64) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    dot / (a_norm * b_norm + COSINE_EPSILON)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding_client::HashingEmbedder;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Returns preset vectors and records every request.
    struct FixedEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FixedEmbedder {
        fn new(vectors: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: vectors
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, items: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.lock().unwrap().push(items.to_vec());
            Ok(items
                .iter()
                .map(|i| self.vectors.get(i).cloned().unwrap_or_else(|| vec![0.0, 0.0]))
                .collect())
        }
    }

    /// Returns whatever it was built with, regardless of input.
    struct BrokenEmbedder(Vec<Vec<f32>>);

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        fn name(&self) -> &str {
            "broken"
        }

        async fn embed(&self, _items: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    fn hashing_scorer() -> MatchScorer {
        MatchScorer::new(Arc::new(HashingEmbedder::default()))
    }

    #[test]
    fn test_missing_is_set_difference() {
        let missing = compute_missing(
            &skills(&["Python", "SQL"]),
            &skills(&["Python", "SQL", "Docker"]),
        );
        assert_eq!(missing, vec!["Docker"]);
    }

    #[test]
    fn test_missing_is_case_insensitive_and_sorted() {
        let missing = compute_missing(
            &skills(&[" python ", "docker"]),
            &skills(&["Terraform", "Python", "Docker", "AWS", "Bash"]),
        );
        assert_eq!(missing, vec!["AWS", "Bash", "Terraform"]);
    }

    #[test]
    fn test_missing_collapses_duplicate_requirements() {
        let missing = compute_missing(&[], &skills(&["SQL", "SQL", "Git"]));
        assert_eq!(missing, vec!["Git", "SQL"]);
    }

    #[test]
    fn test_missing_empty_role() {
        assert!(compute_missing(&skills(&["Python"]), &[]).is_empty());
    }

    #[tokio::test]
    async fn test_example_match_is_bounded() {
        let result = hashing_scorer()
            .score(
                &skills(&["Python", "SQL"]),
                &skills(&["Python", "SQL", "Docker"]),
            )
            .await
            .unwrap();
        assert_eq!(result.missing, vec!["Docker"]);
        assert!(result.score >= 2.0 / 3.0 * 100.0 - 0.01);
        assert!(result.score <= 100.0);
    }

    #[tokio::test]
    async fn test_empty_user_scores_zero() {
        let result = hashing_scorer()
            .score(&[], &skills(&["Rust", "Go"]))
            .await
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.missing, vec!["Go", "Rust"]);
    }

    #[tokio::test]
    async fn test_empty_role_scores_zero() {
        let result = hashing_scorer()
            .score(&skills(&["Rust"]), &[])
            .await
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.missing.is_empty());
    }

    #[tokio::test]
    async fn test_full_exact_match_skips_embedding() {
        let embedder = Arc::new(FixedEmbedder::new(&[]));
        let scorer = MatchScorer::new(embedder.clone());
        let result = scorer
            .score(&skills(&["python ", "SQL"]), &skills(&["Python", "sql"]))
            .await
            .unwrap();
        assert_eq!(result.score, 100.0);
        assert!(result.missing.is_empty());
        assert!(embedder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_semantic_similarity_contributes() {
        let embedder = Arc::new(FixedEmbedder::new(&[
            ("PyTorch", vec![1.0, 0.0]),
            ("TensorFlow", vec![1.0, 0.0]),
            ("Excel", vec![0.0, 1.0]),
        ]));
        let scorer = MatchScorer::new(embedder);
        let result = scorer
            .score(&skills(&["PyTorch"]), &skills(&["TensorFlow", "Excel"]))
            .await
            .unwrap();
        // TensorFlow ≈ 1.0, Excel = 0.0
        assert_eq!(result.score, 50.0);
        assert_eq!(result.missing, vec!["Excel", "TensorFlow"]);
    }

    #[tokio::test]
    async fn test_negative_similarity_floors_at_zero() {
        let embedder = Arc::new(FixedEmbedder::new(&[
            ("A", vec![1.0, 0.0]),
            ("B", vec![-1.0, 0.0]),
        ]));
        let result = MatchScorer::new(embedder)
            .score(&skills(&["A"]), &skills(&["B"]))
            .await
            .unwrap();
        assert_eq!(result.score, 0.0);
    }

    #[tokio::test]
    async fn test_zero_norm_vectors_do_not_produce_nan() {
        let embedder = Arc::new(FixedEmbedder::new(&[
            ("A", vec![0.0, 0.0]),
            ("B", vec![0.0, 0.0]),
        ]));
        let result = MatchScorer::new(embedder)
            .score(&skills(&["A"]), &skills(&["B"]))
            .await
            .unwrap();
        assert!(!result.score.is_nan());
        assert_eq!(result.score, 0.0);
    }

    #[tokio::test]
    async fn test_each_distinct_string_embedded_once() {
        let embedder = Arc::new(FixedEmbedder::new(&[]));
        let scorer = MatchScorer::new(embedder.clone());
        scorer
            .score(
                &skills(&["Rust", "Go", "Rust"]),
                &skills(&["Rust", "Kotlin", "Kotlin"]),
            )
            .await
            .unwrap();

        let calls = embedder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["Go", "Kotlin", "Rust"]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_embedding_error() {
        let scorer = MatchScorer::new(Arc::new(BrokenEmbedder(vec![vec![1.0]])));
        let err = scorer
            .score(&skills(&["A"]), &skills(&["B"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_embedding_error() {
        let scorer = MatchScorer::new(Arc::new(BrokenEmbedder(vec![
            vec![1.0, 0.0],
            vec![1.0],
        ])));
        let err = scorer
            .score(&skills(&["A"]), &skills(&["B"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimensions"));
    }

    #[tokio::test]
    async fn test_non_finite_embedding_is_embedding_error() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let scorer = MatchScorer::new(Arc::new(BrokenEmbedder(vec![
                vec![1.0, 0.0],
                vec![bad, 1.0],
            ])));
            let err = scorer
                .score(&skills(&["A"]), &skills(&["B"]))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Embedding(_)), "{bad} → {err}");
            assert!(err.to_string().contains("non-finite"));
        }
    }

    #[test]
    fn test_out_of_range_json_number_is_rejected() {
        // serde_json saturates values beyond f32 range to infinity.
        let vector: Vec<f32> = serde_json::from_str("[1e39, 0.0]").unwrap();
        let err = validate_embeddings(&skills(&["Rust"]), &[vector]).unwrap_err();
        assert!(matches!(err, EmbeddingError::NonFinite(item) if item == "Rust"));
    }

    #[tokio::test]
    async fn test_scores_are_bit_identical_across_calls() {
        let scorer = hashing_scorer();
        let user = skills(&["Python", "Machine Learning", "Pandas"]);
        let role = skills(&["Python", "Deep Learning", "NumPy", "Statistics"]);

        let first = scorer.score(&user, &role).await.unwrap();
        let second = scorer.score(&user, &role).await.unwrap();
        assert_eq!(first.score.to_bits(), second.score.to_bits());
        assert_eq!(first.missing, second.missing);
    }

    #[tokio::test]
    async fn test_score_bounds_hold_for_varied_inputs() {
        let scorer = hashing_scorer();
        let cases = [
            (vec!["Rust"], vec!["Excel", "Tableau"]),
            (vec!["Docker", "Kubernetes"], vec!["Kubernetes"]),
            (vec!["a", "b", "c"], vec!["d"]),
            (vec!["Data Analysis"], vec!["Data Visualization", "Statistics"]),
        ];
        for (user, role) in cases {
            let result = scorer.score(&skills(&user), &skills(&role)).await.unwrap();
            assert!(
                (0.0..=100.0).contains(&result.score),
                "{user:?} vs {role:?} → {}",
                result.score
            );
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }
}
