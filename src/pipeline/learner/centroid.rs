//! Nearest-centroid strategy ranking

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{squared_distance, validate_prediction, validate_training, Learner, Standardizer};

/// Ranks classes by the distance from the query to each class mean in
/// standardized feature space. Classes without training rows rank last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidLearner {
    n_best: usize,
    n_train: usize,
    standardizer: Standardizer,
    centroids: Vec<Option<Vec<f64>>>,
}

impl CentroidLearner {
    pub fn new(n_best: usize) -> Self {
        Self {
            n_best,
            n_train: 0,
            standardizer: Standardizer::default(),
            centroids: Vec::new(),
        }
    }

    fn rank(&self, row: &[f64]) -> Vec<usize> {
        let query = self.standardizer.apply(row);
        let distance: Vec<f64> = self
            .centroids
            .iter()
            .map(|c| match c {
                Some(center) => squared_distance(&query, center),
                None => f64::INFINITY,
            })
            .collect();

        let mut classes: Vec<usize> = (0..self.centroids.len()).collect();
        classes.sort_by(|&a, &b| distance[a].total_cmp(&distance[b]).then(a.cmp(&b)));
        classes.truncate(self.n_best);
        classes
    }
}

impl Learner for CentroidLearner {
    fn train(&mut self, features: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<()> {
        validate_training(features, labels, n_classes, self.n_best)?;

        self.standardizer = Standardizer::fit(features);
        let dim = self.standardizer.dim();

        let mut sums = vec![vec![0.0; dim]; n_classes];
        let mut counts = vec![0usize; n_classes];
        for (row, &label) in features.iter().zip(labels) {
            for (acc, v) in sums[label].iter_mut().zip(self.standardizer.apply(row)) {
                *acc += v;
            }
            counts[label] += 1;
        }

        self.centroids = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                (count > 0).then(|| sum.into_iter().map(|v| v / count as f64).collect())
            })
            .collect();
        self.n_train = features.len();
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<usize>>> {
        validate_prediction(features, self.standardizer.dim(), self.n_train)?;
        Ok(features.iter().map(|row| self.rank(row)).collect())
    }

    fn n_best(&self) -> usize {
        self.n_best
    }

    fn n_train(&self) -> usize {
        self.n_train
    }

    fn n_classes(&self) -> usize {
        self.centroids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_by_centroid_distance() {
        let features = vec![vec![0.0], vec![2.0], vec![10.0], vec![12.0]];
        let labels = vec![0, 0, 1, 1];
        let mut learner = CentroidLearner::new(2);
        // class 2 has no rows and must rank after the others
        learner.train(&features, &labels, 3).unwrap();

        assert_eq!(learner.n_classes(), 3);
        assert_eq!(learner.n_train(), 4);
        assert_eq!(learner.predict(&[vec![1.0]]).unwrap(), vec![vec![0, 1]]);
        assert_eq!(learner.predict(&[vec![11.5]]).unwrap(), vec![vec![1, 0]]);
    }
}
