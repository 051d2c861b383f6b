pub mod boosting;
pub mod predictor;
pub mod random_forest;
pub mod resample;
pub mod scaler;
pub mod tree;

use ndarray::{Array2, ArrayView1};

use crate::dataset::POOL_SIZE;
use crate::error::Result;

/// Classifieur binaire : probabilité de la classe positive.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<()>;
    fn predict_proba(&self, row: ArrayView1<f64>) -> f64;
}

/// Moyenne pondérée de plusieurs classifieurs entraînés sur les mêmes données.
pub struct WeightedEnsemble {
    members: Vec<(Box<dyn Classifier>, f64)>,
}

impl WeightedEnsemble {
    pub fn new(members: Vec<(Box<dyn Classifier>, f64)>) -> Self {
        Self { members }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<()> {
        for (model, _) in &mut self.members {
            model.fit(x, y)?;
        }
        Ok(())
    }

    pub fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        let total: f64 = self.members.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.members.iter().map(|(m, w)| w * m.predict_proba(row)).sum::<f64>() / total
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|(m, _)| m.name()).collect()
    }
}

pub fn uniform_distribution() -> Vec<f64> {
    vec![1.0 / POOL_SIZE as f64; POOL_SIZE]
}

/// Normalise en place ; retombe sur l'uniforme si la masse est nulle.
pub fn normalize(scores: &mut Vec<f64>) {
    let total: f64 = scores.iter().filter(|s| s.is_finite() && **s > 0.0).sum();
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s = if s.is_finite() && *s > 0.0 { *s / total } else { 0.0 };
        }
    } else {
        *scores = vec![1.0 / scores.len().max(1) as f64; scores.len()];
    }
}

pub fn validate_distribution(dist: &[f64]) -> bool {
    if dist.len() != POOL_SIZE {
        return false;
    }
    if dist.iter().any(|&p| p < 0.0) {
        return false;
    }
    let sum: f64 = dist.iter().sum();
    (sum - 1.0).abs() < 1e-9
}

/// Matrice ndarray à partir de lignes de même longueur.
pub fn to_matrix(rows: &[Vec<f64>]) -> Array2<f64> {
    let n_cols = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat).unwrap_or_else(|_| Array2::zeros((0, n_cols)))
}
