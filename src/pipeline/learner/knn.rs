//! Nearest-neighbour strategy ranking

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{squared_distance, validate_prediction, validate_training, Learner, Standardizer};

/// Ranks classes by votes among the `neighbors` closest training points,
/// then by distance to the closest point of each class, then by label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnLearner {
    n_best: usize,
    neighbors: usize,
    n_classes: usize,
    standardizer: Standardizer,
    points: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl KnnLearner {
    pub fn new(n_best: usize, neighbors: usize) -> Self {
        Self {
            n_best,
            neighbors: neighbors.max(1),
            n_classes: 0,
            standardizer: Standardizer::default(),
            points: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn rank(&self, row: &[f64]) -> Vec<usize> {
        let query = self.standardizer.apply(row);

        let mut order: Vec<(usize, f64)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, squared_distance(&query, p)))
            .collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut votes = vec![0usize; self.n_classes];
        for &(i, _) in order.iter().take(self.neighbors) {
            votes[self.labels[i]] += 1;
        }

        let mut nearest = vec![f64::INFINITY; self.n_classes];
        for &(i, d) in &order {
            let label = self.labels[i];
            if d < nearest[label] {
                nearest[label] = d;
            }
        }

        let mut classes: Vec<usize> = (0..self.n_classes).collect();
        classes.sort_by(|&a, &b| {
            votes[b]
                .cmp(&votes[a])
                .then_with(|| nearest[a].total_cmp(&nearest[b]))
                .then(a.cmp(&b))
        });
        classes.truncate(self.n_best);
        classes
    }
}

impl Learner for KnnLearner {
    fn train(&mut self, features: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<()> {
        validate_training(features, labels, n_classes, self.n_best)?;

        self.standardizer = Standardizer::fit(features);
        self.points = features.iter().map(|row| self.standardizer.apply(row)).collect();
        self.labels = labels.to_vec();
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<usize>>> {
        validate_prediction(features, self.standardizer.dim(), self.points.len())?;
        Ok(features.iter().map(|row| self.rank(row)).collect())
    }

    fn n_best(&self) -> usize {
        self.n_best
    }

    fn n_train(&self) -> usize {
        self.points.len()
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained(n_best: usize, neighbors: usize) -> KnnLearner {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![10.0, 0.0],
        ];
        let labels = vec![0, 0, 1, 1, 2];
        let mut learner = KnnLearner::new(n_best, neighbors);
        learner.train(&features, &labels, 3).unwrap();
        learner
    }

    #[test]
    fn test_ranks_by_votes_then_distance() {
        let learner = trained(3, 2);
        let ranked = learner.predict(&[vec![0.05, 0.0]]).unwrap();
        assert_eq!(ranked[0][0], 0);
        assert_eq!(ranked[0].len(), 3);

        let ranked = learner.predict(&[vec![9.0, 0.5]]).unwrap();
        assert_eq!(ranked[0][0], 2);
    }

    #[test]
    fn test_n_best_truncates_and_caps_at_classes() {
        let learner = trained(1, 1);
        assert_eq!(learner.predict(&[vec![5.0, 5.0]]).unwrap(), vec![vec![1]]);

        let learner = trained(10, 1);
        let ranked = learner.predict(&[vec![5.0, 5.0]]).unwrap();
        assert_eq!(ranked[0].len(), 3);
        let mut sorted = ranked[0].clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn test_predict_checks_dimension() {
        let learner = trained(1, 1);
        assert!(learner.predict(&[vec![1.0]]).is_err());
        assert!(KnnLearner::new(1, 1).predict(&[vec![1.0]]).is_err());
    }
}
