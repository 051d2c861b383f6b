use lotoracle_db::models::Numbers;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::boosting::GradientBoosting;
use super::random_forest::RandomForest;
use super::resample::balance;
use super::scaler::StandardScaler;
use super::{normalize, to_matrix, uniform_distribution, Classifier, WeightedEnsemble};
use crate::config::ClassifierConfig;
use crate::dataset::rank_numbers;
use crate::error::{OracleError, Result};
use crate::features;

/// Probabilité d'apparition de chaque numéro au prochain tirage : forêt et
/// boosting à parts égales sur les 7 features par numéro.
pub struct NumberPredictor {
    config: ClassifierConfig,
    scaler: Option<StandardScaler>,
    ensemble: WeightedEnsemble,
    trained: bool,
}

impl NumberPredictor {
    pub fn new(config: ClassifierConfig) -> Self {
        let ensemble = WeightedEnsemble::new(vec![
            (Box::new(RandomForest::new(config.forest.clone())) as Box<dyn Classifier>, 1.0),
            (Box::new(GradientBoosting::new(config.boosting.clone())) as Box<dyn Classifier>, 1.0),
        ]);
        Self { config, scaler: None, ensemble, trained: false }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Entraîne sur l'historique chronologique ; retourne le nombre
    /// d'échantillons après rééquilibrage.
    pub fn train(&mut self, draws: &[Numbers]) -> Result<usize> {
        if draws.len() < self.config.min_history {
            return Err(OracleError::InsufficientData { required: self.config.min_history, actual: draws.len() });
        }

        let rows = features::training_rows(draws, self.config.lookback);
        let (x_rows, labels): (Vec<Vec<f64>>, Vec<f64>) = rows.into_iter().map(|r| (r.features, r.label)).unzip();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let (x_balanced, y_balanced) = balance(&x_rows, &labels, self.config.smote_neighbors, &mut rng);
        debug!(raw = x_rows.len(), balanced = x_balanced.len(), "Échantillons du classifieur");

        let x = to_matrix(&x_balanced);
        let scaler = StandardScaler::fit(&x);
        let x_scaled = scaler.transform(&x);
        self.ensemble.fit(&x_scaled, &y_balanced)?;

        self.scaler = Some(scaler);
        self.trained = true;
        info!(samples = y_balanced.len(), models = ?self.ensemble.names(), "Classifieur entraîné");
        Ok(y_balanced.len())
    }

    /// Distribution sur 1..=90 (somme 1). Uniforme tant que le modèle n'est pas entraîné.
    pub fn predict_proba(&self, draws: &[Numbers]) -> Vec<f64> {
        let (true, Some(scaler)) = (self.trained, self.scaler.as_ref()) else {
            return uniform_distribution();
        };
        if draws.is_empty() {
            return uniform_distribution();
        }

        let mut probs: Vec<f64> = features::current_rows(draws, self.config.lookback)
            .iter()
            .map(|row| self.ensemble.predict_proba(scaler.transform_row(&row.features).view()))
            .collect();
        normalize(&mut probs);
        probs
    }
}

/// Top 3 par probabilité puis 2 numéros pris dans les rangs 4 à 15.
pub fn diverse_top_five(probs: &[f64]) -> Numbers {
    let ranked = rank_numbers(probs);
    let mut selected: Vec<u8> = ranked.iter().take(3).copied().collect();
    for &n in ranked.iter().skip(3).take(12).chain(ranked.iter()) {
        if selected.len() >= 5 {
            break;
        }
        if !selected.contains(&n) {
            selected.push(n);
        }
    }
    let mut ticket = [0u8; 5];
    ticket.copy_from_slice(&selected[..5]);
    ticket.sort_unstable();
    ticket
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::dataset::make_test_draws;
    use crate::models::validate_distribution;

    #[test]
    fn test_untrained_is_uniform() {
        let mut predictor = NumberPredictor::new(test_config().classifier);
        let draws = make_test_draws(59);
        let err = predictor.train(&draws).unwrap_err();
        assert_eq!(err, OracleError::InsufficientData { required: 60, actual: 59 });
        let probs = predictor.predict_proba(&draws);
        assert!(validate_distribution(&probs));
        let max = probs.iter().cloned().fold(f64::MIN, f64::max);
        let min = probs.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max - min < 1e-12, "distribution non uniforme");
    }

    #[test]
    fn test_trained_distribution_valid() {
        let mut predictor = NumberPredictor::new(test_config().classifier);
        let draws = make_test_draws(75);
        let samples = predictor.train(&draws).unwrap();
        assert!(samples >= 25 * 90, "au moins les échantillons bruts");
        assert!(predictor.is_trained());
        let probs = predictor.predict_proba(&draws);
        assert!(validate_distribution(&probs));
    }

    #[test]
    fn test_training_deterministic() {
        let draws = make_test_draws(70);
        let mut a = NumberPredictor::new(test_config().classifier);
        let mut b = NumberPredictor::new(test_config().classifier);
        a.train(&draws).unwrap();
        b.train(&draws).unwrap();
        assert_eq!(a.predict_proba(&draws), b.predict_proba(&draws));
    }

    #[test]
    fn test_diverse_top_five() {
        let mut probs = vec![0.0; 90];
        for (i, p) in probs.iter_mut().enumerate() {
            *p = 1.0 / (i + 1) as f64;
        }
        assert_eq!(diverse_top_five(&probs), [1, 2, 3, 4, 5]);
    }
}
