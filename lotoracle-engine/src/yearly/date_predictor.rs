use std::collections::BTreeMap;

use chrono::NaiveDate;
use lotoracle_db::models::Numbers;
use tracing::{debug, info};

use super::date_features::{date_context, number_row, DatedDraw, FrequencyTally};
use crate::config::YearlyConfig;
use crate::dataset::rank_numbers;
use crate::error::{OracleError, Result};
use crate::models::boosting::GradientBoosting;
use crate::models::random_forest::RandomForest;
use crate::models::scaler::StandardScaler;
use crate::models::{to_matrix, Classifier, WeightedEnsemble};

/// Classifieur (date, numéro) entraîné sur les années passées. Chaque
/// échantillon ne voit que les tirages antérieurs à sa date.
pub struct DatePredictor {
    config: YearlyConfig,
    scaler: Option<StandardScaler>,
    ensemble: WeightedEnsemble,
    trained: bool,
}

impl DatePredictor {
    pub fn new(config: YearlyConfig) -> Self {
        let forest_weight = config.forest_weight.clamp(0.0, 1.0);
        let ensemble = WeightedEnsemble::new(vec![
            (Box::new(RandomForest::new(config.forest.clone())) as Box<dyn Classifier>, forest_weight),
            (Box::new(GradientBoosting::new(config.boosting.clone())) as Box<dyn Classifier>, 1.0 - forest_weight),
        ]);
        Self { config, scaler: None, ensemble, trained: false }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Entraîne sur toutes les années sauf la dernière. Retourne le nombre
    /// d'échantillons (90 par tirage).
    pub fn train(&mut self, by_year: &BTreeMap<i32, Vec<DatedDraw>>) -> Result<usize> {
        let Some(last_year) = by_year.keys().next_back().copied() else {
            return Err(OracleError::InsufficientData { required: 2, actual: 0 });
        };
        if by_year.len() < 2 {
            return Err(OracleError::InsufficientData { required: 2, actual: by_year.len() });
        }

        let history: Vec<&DatedDraw> = by_year.values().flatten().collect();
        let training_len: usize = by_year.range(..last_year).map(|(_, draws)| draws.len()).sum();

        let mut tally = FrequencyTally::default();
        let mut prior: Vec<DatedDraw> = Vec::with_capacity(training_len);
        let mut rows = Vec::with_capacity(training_len * 90);
        let mut labels = Vec::with_capacity(training_len * 90);

        for draw in history.iter().take(training_len) {
            let lotto_type = draw.lotto_type.as_deref();
            let context = date_context(&prior, draw.date, lotto_type);
            for number in 1..=90u8 {
                rows.push(number_row(&context, &tally, number, lotto_type));
                labels.push(if draw.numbers.contains(&number) { 1.0 } else { 0.0 });
            }
            tally.add(draw);
            prior.push((*draw).clone());
        }

        if rows.len() < self.config.min_training_samples {
            return Err(OracleError::InsufficientData { required: self.config.min_training_samples, actual: rows.len() });
        }

        let x = to_matrix(&rows);
        let scaler = StandardScaler::fit(&x);
        self.ensemble.fit(&scaler.transform(&x), &labels)?;
        self.scaler = Some(scaler);
        self.trained = true;

        info!(samples = labels.len(), features = x.ncols(), "Prédicteur par date entraîné");
        Ok(labels.len())
    }

    /// Les 5 numéros les plus probables pour `target`. Sans modèle :
    /// fréquence pondérée par type.
    pub fn predict(&self, history: &[DatedDraw], target: NaiveDate, target_type: Option<&str>) -> Numbers {
        let tally = FrequencyTally::from_history(history);
        let (true, Some(scaler)) = (self.trained, self.scaler.as_ref()) else {
            return top_five(&tally.weighted_counts(target_type));
        };

        let context = date_context(history, target, target_type);
        let scores: Vec<f64> = (1..=90u8)
            .map(|n| {
                let row = number_row(&context, &tally, n, target_type);
                self.ensemble.predict_proba(scaler.transform_row(&row).view())
            })
            .collect();
        let ticket = top_five(&scores);
        debug!(%target, ?ticket, "Prédiction par date");
        ticket
    }
}

fn top_five(scores: &[f64]) -> Numbers {
    let mut ticket = [0u8; 5];
    ticket.copy_from_slice(&rank_numbers(scores)[..5]);
    ticket.sort_unstable();
    ticket
}
