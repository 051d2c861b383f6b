pub mod date_features;
pub mod date_predictor;
pub mod patterns;

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use lotoracle_db::models::Numbers;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{count_even, count_high, draw_sum};
use crate::config::YearlyConfig;
use crate::dataset::{frequencies, rank_counts, rank_numbers, HistoricalDataset, POOL_SIZE};
use crate::sampler::rank_weighted_sample;
use date_features::DatedDraw;
use date_predictor::DatePredictor;
use patterns::{confidence_weights, detect_patterns, YearlyPattern};

/// Poids des numéros du prédicteur par date dans le mélange final.
const DATE_MODEL_WEIGHT: f64 = 0.5;
/// Poids du taux d'apparition de l'année en cours.
const CURRENT_YEAR_WEIGHT: f64 = 0.3;

/// Fréquences d'une année et ses listes chaude/froide (15 numéros chacune).
#[derive(Debug, Clone, PartialEq)]
pub struct YearStats {
    pub draws: usize,
    /// Index = numéro - 1.
    pub frequencies: Vec<usize>,
    pub hot: Vec<u8>,
    /// Les 15 moins fréquents parmi les numéros sortis au moins une fois.
    pub cold: Vec<u8>,
}

impl YearStats {
    pub fn from_draws(draws: &[Numbers]) -> Self {
        let frequencies = frequencies(draws);
        let appeared: Vec<u8> =
            rank_counts(&frequencies).into_iter().filter(|&n| frequencies[(n - 1) as usize] > 0).collect();
        let hot = appeared.iter().take(15).copied().collect();
        let cold = appeared[appeared.len().saturating_sub(15)..].to_vec();
        Self { draws: draws.len(), frequencies, hot, cold }
    }

    pub fn frequency(&self, number: u8) -> usize {
        self.frequencies[(number - 1) as usize]
    }

    pub fn rate(&self, number: u8) -> f64 {
        if self.draws == 0 {
            return 0.0;
        }
        self.frequency(number) as f64 / self.draws as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearlySource {
    MlYearly,
    YearlyPattern,
    YearlyFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyPrediction {
    pub numbers: Numbers,
    pub confidence: f64,
    pub sum: u32,
    pub evens: usize,
    pub highs: usize,
    pub source: YearlySource,
}

impl YearlyPrediction {
    fn new(numbers: Numbers, confidence: f64, source: YearlySource) -> Self {
        Self {
            numbers,
            confidence,
            sum: draw_sum(&numbers),
            evens: count_even(&numbers),
            highs: count_high(&numbers),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySummary {
    pub years: Vec<i32>,
    pub total_years: usize,
    pub draws_per_year: BTreeMap<i32, usize>,
    /// Années déduites de la position faute de dates.
    pub estimated_years: bool,
    pub patterns_detected: usize,
    pub pattern_types: Vec<&'static str>,
    pub top_recurring_hot: Vec<u8>,
    pub stable_foundation: Vec<u8>,
    pub date_model_trained: bool,
    pub target_date: Option<String>,
    pub target_lotto_type: Option<String>,
}

/// Regroupement par année, motifs inter-annuels et prédicteur par date.
pub struct YearlyAnalyzer {
    config: YearlyConfig,
    years: BTreeMap<i32, YearStats>,
    estimated: bool,
    patterns: Vec<YearlyPattern>,
    date_model: DatePredictor,
    dated_history: Vec<DatedDraw>,
    target_date: Option<NaiveDate>,
    target_type: Option<String>,
    overall: Vec<usize>,
    total_draws: usize,
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok()
}

/// Tirages datés, ou `None` si une seule date est illisible.
fn dated_draws(dataset: &HistoricalDataset) -> Option<Vec<DatedDraw>> {
    let dates = dataset.dates()?;
    let types = dataset.lotto_types();
    dataset
        .draws()
        .iter()
        .zip(dates)
        .enumerate()
        .map(|(i, (numbers, date))| {
            Some(DatedDraw {
                date: parse_date(date)?,
                numbers: *numbers,
                lotto_type: types.map(|t| t[i].clone()),
            })
        })
        .collect()
}

/// Sans dates, découpe par blocs de `per_year` depuis le tirage le plus
/// récent. Les années sont numérotées 1, 2, ... de la plus ancienne à la
/// plus récente.
fn estimate_years(draws: &[Numbers], per_year: usize) -> BTreeMap<i32, Vec<Numbers>> {
    let mut grouped: BTreeMap<i32, Vec<Numbers>> = BTreeMap::new();
    if draws.is_empty() {
        return grouped;
    }
    let per_year = per_year.max(1);
    let span = (draws.len() - 1) / per_year + 1;
    for (i, draw) in draws.iter().enumerate() {
        let years_back = (draws.len() - 1 - i) / per_year;
        grouped.entry((span - years_back) as i32).or_default().push(*draw);
    }
    grouped
}

impl YearlyAnalyzer {
    pub fn analyze(dataset: &HistoricalDataset, config: YearlyConfig) -> Self {
        let dated = dated_draws(dataset);
        if dated.is_none() && dataset.dates().is_some() {
            warn!("Dates illisibles, années estimées par position");
        }

        let mut date_model = DatePredictor::new(config.clone());
        let (grouped, estimated, dated_history) = match dated {
            Some(history) => {
                let mut by_year: BTreeMap<i32, Vec<DatedDraw>> = BTreeMap::new();
                for draw in &history {
                    by_year.entry(draw.date.year()).or_default().push(draw.clone());
                }
                if by_year.len() >= 2 {
                    if let Err(e) = date_model.train(&by_year) {
                        warn!(error = %e, "Prédicteur par date non entraîné");
                    }
                }
                let grouped: BTreeMap<i32, Vec<Numbers>> = by_year
                    .into_iter()
                    .map(|(year, draws)| (year, draws.into_iter().map(|d| d.numbers).collect()))
                    .collect();
                (grouped, false, history)
            }
            None => (estimate_years(dataset.draws(), config.draws_per_year), true, Vec::new()),
        };

        let years: BTreeMap<i32, YearStats> =
            grouped.iter().map(|(&year, draws)| (year, YearStats::from_draws(draws))).collect();
        let patterns = detect_patterns(&years);
        let target_date = dated_history.last().and_then(|d| d.date.checked_add_signed(Duration::days(1)));
        let target_type = dataset.lotto_types().and_then(|t| t.last().cloned());

        info!(
            years = years.len(),
            estimated,
            patterns = patterns.len(),
            date_model = date_model.is_trained(),
            "Analyse annuelle terminée"
        );

        Self {
            config,
            years,
            estimated,
            patterns,
            date_model,
            dated_history,
            target_date,
            target_type,
            overall: frequencies(dataset.draws()),
            total_draws: dataset.len(),
        }
    }

    pub fn years(&self) -> &BTreeMap<i32, YearStats> {
        &self.years
    }

    pub fn patterns(&self) -> &[YearlyPattern] {
        &self.patterns
    }

    pub fn is_date_model_trained(&self) -> bool {
        self.date_model.is_trained()
    }

    fn current_year(&self) -> Option<&YearStats> {
        self.years.values().next_back()
    }

    /// Somme des confiances des motifs par numéro.
    pub fn pattern_weights(&self) -> Vec<f64> {
        confidence_weights(&self.patterns)
    }

    /// Mélange prédicteur par date, motifs et année en cours ; au pire,
    /// fréquence globale.
    fn blended_weights(&self, date_ticket: Option<&Numbers>) -> Vec<f64> {
        let mut weights = vec![0.0; POOL_SIZE];
        for &n in date_ticket.into_iter().flatten() {
            weights[(n - 1) as usize] += DATE_MODEL_WEIGHT;
        }
        for pattern in &self.patterns {
            let w = pattern.kind.weight() * pattern.confidence;
            for &n in &pattern.numbers {
                weights[(n - 1) as usize] += w;
            }
        }
        if let Some(current) = self.current_year().filter(|c| c.draws >= self.config.min_current_year_draws) {
            for n in 1..=POOL_SIZE as u8 {
                weights[(n - 1) as usize] += current.rate(n) * CURRENT_YEAR_WEIGHT;
            }
        }

        if weights.iter().all(|&w| w <= 0.0) && self.total_draws > 0 {
            debug!("Aucun motif annuel, pondération par fréquence");
            for (w, &count) in weights.iter_mut().zip(&self.overall) {
                *w = count as f64 / self.total_draws as f64;
            }
        }
        weights
    }

    /// Jusqu'à `count` prédictions : d'abord celle du prédicteur par date
    /// s'il est entraîné, puis des tirages pondérés par rang parmi les
    /// meilleurs candidats des motifs. Toujours au moins une prédiction.
    pub fn predict(&self, count: usize, rng: &mut StdRng) -> Vec<YearlyPrediction> {
        let mut predictions = Vec::with_capacity(count.max(1));

        let date_ticket = match (self.date_model.is_trained(), self.target_date) {
            (true, Some(target)) => Some(self.date_model.predict(&self.dated_history, target, self.target_type.as_deref())),
            _ => None,
        };
        if let Some(ticket) = date_ticket {
            predictions.push(YearlyPrediction::new(ticket, 0.75, YearlySource::MlYearly));
        }

        let weights = self.blended_weights(date_ticket.as_ref());
        let mut candidates: Vec<u8> = rank_numbers(&weights)
            .into_iter()
            .filter(|&n| weights[(n - 1) as usize] > 0.0)
            .take(self.config.candidate_pool)
            .collect();

        let current_draws = self.current_year().map_or(0, |c| c.draws);
        let mean_confidence = if self.patterns.is_empty() {
            0.0
        } else {
            self.patterns.iter().map(|p| p.confidence).sum::<f64>() / self.patterns.len() as f64
        };
        let confidence = 0.4 * (current_draws as f64 / 50.0).min(1.0) + 0.6 * mean_confidence;

        while predictions.len() < count {
            if candidates.len() < 5 {
                let used: Vec<u8> = predictions.iter().flat_map(|p| p.numbers).collect();
                let missing = 5 - candidates.len();
                let filler: Vec<u8> =
                    (1..=POOL_SIZE as u8).filter(|n| !used.contains(n) && !candidates.contains(n)).take(missing).collect();
                candidates.extend(filler);
            }
            let picked = rank_weighted_sample(&candidates, 5, rng);
            let Ok(mut ticket) = <Numbers>::try_from(picked.as_slice()) else {
                break;
            };
            ticket.sort_unstable();
            predictions.push(YearlyPrediction::new(ticket, confidence, YearlySource::YearlyPattern));
        }

        if predictions.is_empty() {
            let ticket = if self.total_draws > 0 {
                rank_counts(&self.overall).iter().take(5).copied().collect::<Vec<u8>>()
            } else {
                Vec::new()
            };
            if let Ok(mut ticket) = <Numbers>::try_from(ticket.as_slice()) {
                ticket.sort_unstable();
                predictions.push(YearlyPrediction::new(ticket, 0.3, YearlySource::YearlyFallback));
            }
        }

        predictions
    }

    pub fn summary(&self) -> YearlySummary {
        let numbers_of = |kind: patterns::PatternKind| -> Vec<u8> {
            self.patterns
                .iter()
                .find(|p| p.kind == kind)
                .map(|p| p.numbers.iter().take(5).copied().collect())
                .unwrap_or_default()
        };
        YearlySummary {
            years: self.years.keys().copied().collect(),
            total_years: self.years.len(),
            draws_per_year: self.years.iter().map(|(&y, s)| (y, s.draws)).collect(),
            estimated_years: self.estimated,
            patterns_detected: self.patterns.len(),
            pattern_types: self.patterns.iter().map(|p| p.kind.name()).collect(),
            top_recurring_hot: numbers_of(patterns::PatternKind::RecurringHot),
            stable_foundation: numbers_of(patterns::PatternKind::StableFoundation),
            date_model_trained: self.date_model.is_trained(),
            target_date: self.target_date.map(|d| d.format("%Y-%m-%d").to_string()),
            target_lotto_type: self.target_type.clone(),
        }
    }
}
