//! Consensus grouping
//!
//! Partitions summaries into agreement groups with a greedy single-link
//! rule: a summary joins the current group when it is similar enough to
//! *any* member already in it. Groups are built in index order and frozen
//! once the scan moves on, so the input order is the tie-break policy.
//!
//! This is not transitive-closure clustering. With non-transitive
//! similarity (A~C, B~C, A!~B) scanning `[A, B, C]` yields `[A, C], [B]`,
//! whereas an equivalence-class partition would put all three together.

use tracing::debug;

use super::similarity::TextSimilarityScorer;
use crate::config::ArbitrationConfig;

/// Square, symmetric pairwise similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Score every pair of texts once
    pub fn build<S: AsRef<str>>(scorer: &TextSimilarityScorer, texts: &[S]) -> Self {
        let size = texts.len();
        let mut values = vec![0.0; size * size];

        for i in 0..size {
            values[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let score = scorer.similarity(texts[i].as_ref(), texts[j].as_ref());
                values[i * size + j] = score;
                values[j * size + i] = score;
            }
        }

        Self { size, values }
    }

    /// Build from explicit rows; `None` unless the rows form a square matrix
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            size,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarity between summaries `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Mean similarity over unordered pairs of `indices`; 1.0 below two members
    pub fn mean_pairwise(&self, indices: &[usize]) -> f64 {
        if indices.len() < 2 {
            return 1.0;
        }

        let mut total = 0.0;
        let mut pairs = 0usize;
        for (pos, &i) in indices.iter().enumerate() {
            for &j in &indices[pos + 1..] {
                total += self.get(i, j);
                pairs += 1;
            }
        }
        total / pairs as f64
    }
}

/// Indices of summaries believed to agree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusGroup {
    members: Vec<usize>,
}

impl ConsensusGroup {
    fn seeded(first: usize) -> Self {
        Self {
            members: vec![first],
        }
    }

    /// Member indices in the order they joined
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Groups always hold at least their seed
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Greedy single-link grouper
#[derive(Debug, Clone)]
pub struct ConsensusGrouper {
    moderate_agreement: f64,
}

impl ConsensusGrouper {
    pub fn new(moderate_agreement: f64) -> Self {
        Self { moderate_agreement }
    }

    pub fn from_config(config: &ArbitrationConfig) -> Self {
        Self::new(config.similarity.moderate_agreement)
    }

    /// Partition `0..matrix.len()` into disjoint groups, every index exactly once
    pub fn group(&self, matrix: &SimilarityMatrix) -> Vec<ConsensusGroup> {
        let n = matrix.len();
        let mut assigned = vec![false; n];
        let mut groups = Vec::new();

        for i in 0..n {
            if assigned[i] {
                continue;
            }
            let mut group = ConsensusGroup::seeded(i);
            assigned[i] = true;

            for j in (i + 1)..n {
                if assigned[j] {
                    continue;
                }
                let max_similarity = group
                    .members
                    .iter()
                    .map(|&idx| matrix.get(idx, j))
                    .fold(f64::MIN, f64::max);

                if max_similarity >= self.moderate_agreement {
                    group.members.push(j);
                    assigned[j] = true;
                }
            }

            groups.push(group);
        }

        debug!(
            summaries = n,
            groups = groups.len(),
            threshold = self.moderate_agreement,
            "Consensus groups formed"
        );

        groups
    }
}

impl Default for ConsensusGrouper {
    fn default() -> Self {
        Self::from_config(&ArbitrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(groups: &[ConsensusGroup]) -> Vec<Vec<usize>> {
        groups.iter().map(|g| g.members().to_vec()).collect()
    }

    #[test]
    fn test_empty_matrix_yields_no_groups() {
        let matrix = SimilarityMatrix::from_rows(vec![]).unwrap();
        assert!(ConsensusGrouper::default().group(&matrix).is_empty());
    }

    #[test]
    fn test_single_summary_is_singleton() {
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0]]).unwrap();
        let groups = ConsensusGrouper::default().group(&matrix);
        assert_eq!(members(&groups), vec![vec![0]]);
    }

    #[test]
    fn test_two_agree_one_outlier() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.1],
            vec![0.9, 1.0, 0.2],
            vec![0.1, 0.2, 1.0],
        ])
        .unwrap();

        let groups = ConsensusGrouper::new(0.6).group(&matrix);
        assert_eq!(members(&groups), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_single_link_chains_through_members() {
        // 0~1 and 1~2, but 0 and 2 are dissimilar
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.7, 0.1],
            vec![0.7, 1.0, 0.7],
            vec![0.1, 0.7, 1.0],
        ])
        .unwrap();

        let groups = ConsensusGrouper::new(0.6).group(&matrix);
        assert_eq!(members(&groups), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_order_dependence_with_non_transitive_similarity() {
        // 0~2 and 1~2 but 0!~1; index 1 is scanned before 2 joins, so
        // it is left out of the first group.
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.1, 0.7],
            vec![0.1, 1.0, 0.7],
            vec![0.7, 0.7, 1.0],
        ])
        .unwrap();

        let groups = ConsensusGrouper::new(0.6).group(&matrix);
        assert_eq!(members(&groups), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let rows = vec![vec![1.0, 0.6], vec![0.6, 1.0]];
        let matrix = SimilarityMatrix::from_rows(rows).unwrap();
        let groups = ConsensusGrouper::new(0.6).group(&matrix);
        assert_eq!(members(&groups), vec![vec![0, 1]]);
    }

    #[test]
    fn test_from_rows_rejects_non_square() {
        assert!(SimilarityMatrix::from_rows(vec![vec![1.0, 0.5]]).is_none());
    }

    #[test]
    fn test_build_is_symmetric() {
        let texts = [
            "Candidate supports expanding healthcare coverage",
            "The candidate supports expanding healthcare coverage",
            "Candidate focuses on tax policy",
        ];
        let matrix = SimilarityMatrix::build(&TextSimilarityScorer::new(), &texts);
        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn test_mean_pairwise() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.8, 0.6],
            vec![0.8, 1.0, 0.4],
            vec![0.6, 0.4, 1.0],
        ])
        .unwrap();

        assert_eq!(matrix.mean_pairwise(&[1]), 1.0);
        assert!((matrix.mean_pairwise(&[0, 1]) - 0.8).abs() < 1e-12);
        assert!((matrix.mean_pairwise(&[0, 1, 2]) - 0.6).abs() < 1e-12);
    }
}
