use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use super::tree::{weighted_mean, TreeBuilder, TreeNode, TreeParams};
use super::Classifier;
use crate::config::ForestConfig;
use crate::error::{OracleError, Result};

/// Forêt aléatoire : arbres sur échantillons bootstrap, √d features par nœud.
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<TreeNode>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config, trees: Vec::new() }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Poids inverses à l'effectif de chaque classe (n / (2 · n_classe)).
pub fn balanced_weights(y: &[f64]) -> Vec<f64> {
    let n = y.len() as f64;
    let n_pos = y.iter().filter(|&&l| l > 0.5).count() as f64;
    let n_neg = n - n_pos;
    y.iter()
        .map(|&l| {
            let count = if l > 0.5 { n_pos } else { n_neg };
            if count > 0.0 { n / (2.0 * count) } else { 1.0 }
        })
        .collect()
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "RandomForest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 || n_samples != y.len() {
            return Err(OracleError::subsystem("random_forest", "jeu d'entraînement vide ou incohérent"));
        }

        let weights = if self.config.class_balanced { balanced_weights(y) } else { vec![1.0; n_samples] };
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some((x.ncols() as f64).sqrt().ceil() as usize),
        };
        let seed = self.config.seed;

        // Un générateur par arbre : résultat indépendant de l'ordonnancement rayon
        self.trees = (0..self.config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let mut indices: Vec<usize> = (0..n_samples).map(|_| rng.random_range(0..n_samples)).collect();
                let builder = TreeBuilder {
                    x,
                    targets: y,
                    weights: &weights,
                    params: &params,
                    leaf_value: |idx: &[usize]| weighted_mean(y, &weights, idx),
                };
                builder.build(&mut indices, &mut rng)
            })
            .collect();

        Ok(())
    }

    fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }
}
