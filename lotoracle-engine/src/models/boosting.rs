use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::tree::{TreeBuilder, TreeNode, TreeParams};
use super::Classifier;
use crate::config::BoostingConfig;
use crate::error::{OracleError, Result};

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Gradient boosting en perte logistique : chaque arbre ajuste les résidus
/// `y - p`, feuilles calculées par un pas de Newton.
pub struct GradientBoosting {
    config: BoostingConfig,
    init: f64,
    trees: Vec<TreeNode>,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config, init: 0.0, trees: Vec::new() }
    }

    fn raw_score(&self, row: ArrayView1<f64>) -> f64 {
        self.init + self.config.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &str {
        "GradientBoosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<()> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(OracleError::subsystem("gradient_boosting", "jeu d'entraînement vide ou incohérent"));
        }

        let p0 = (y.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        self.init = (p0 / (1.0 - p0)).ln();
        self.trees.clear();

        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: None,
        };
        let weights = vec![1.0; n];
        let mut raw = vec![self.init; n];
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..self.config.n_estimators {
            let probs: Vec<f64> = raw.iter().map(|&f| sigmoid(f)).collect();
            let residuals: Vec<f64> = y.iter().zip(&probs).map(|(yi, p)| yi - p).collect();

            let builder = TreeBuilder {
                x,
                targets: &residuals,
                weights: &weights,
                params: &params,
                leaf_value: |idx: &[usize]| {
                    let num: f64 = idx.iter().map(|&i| residuals[i]).sum();
                    let den: f64 = idx.iter().map(|&i| probs[i] * (1.0 - probs[i])).sum();
                    if den.abs() < 1e-12 { 0.0 } else { num / den }
                },
            };
            let mut indices: Vec<usize> = (0..n).collect();
            let tree = builder.build(&mut indices, &mut rng);

            for (i, f) in raw.iter_mut().enumerate() {
                *f += self.config.learning_rate * tree.predict(x.row(i));
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        sigmoid(self.raw_score(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_matrix;

    #[test]
    fn test_boosting_learns_threshold() {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i >= 20 { 1.0 } else { 0.0 }).collect();
        let mut gb = GradientBoosting::new(BoostingConfig { n_estimators: 30, ..BoostingConfig::default() });
        gb.fit(&to_matrix(&rows), &y).unwrap();
        assert!(gb.predict_proba(ndarray::array![35.0].view()) > 0.8);
        assert!(gb.predict_proba(ndarray::array![5.0].view()) < 0.2);
    }

    #[test]
    fn test_no_estimators_returns_prior() {
        let rows: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let y = vec![1.0, 0.0, 0.0, 0.0];
        let mut gb = GradientBoosting::new(BoostingConfig { n_estimators: 0, ..BoostingConfig::default() });
        gb.fit(&to_matrix(&rows), &y).unwrap();
        assert!((gb.predict_proba(ndarray::array![0.0].view()) - 0.25).abs() < 1e-9);
    }
}
