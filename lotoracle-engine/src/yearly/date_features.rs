use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use lotoracle_db::models::Numbers;

use crate::analysis::{draw_sum, mean_std};
use crate::dataset::{rank_counts, POOL_SIZE};
use crate::seed::stable_hash;

/// Poids d'un tirage d'un autre type de loterie.
pub const OTHER_TYPE_WEIGHT: f64 = 0.3;
/// Somme moyenne attendue d'un tirage 5/90, utilisée sans historique.
const DEFAULT_SUM: f64 = 225.0;

pub const CALENDAR_FEATURES: usize = 9;
pub const TEMPORAL_FEATURES: usize = 27;
/// Calendrier, hash du type, motifs temporels, numéro et fréquence pondérée.
pub const FEATURE_COUNT: usize = CALENDAR_FEATURES + 1 + TEMPORAL_FEATURES + 2;

#[derive(Debug, Clone, PartialEq)]
pub struct DatedDraw {
    pub date: NaiveDate,
    pub numbers: Numbers,
    pub lotto_type: Option<String>,
}

impl DatedDraw {
    fn same_type(&self, target_type: Option<&str>) -> bool {
        matches!((self.lotto_type.as_deref(), target_type), (Some(a), Some(b)) if a == b)
    }
}

pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Jour, jour de semaine, semaine du mois, mois, jour de l'année, puis
/// encodage cyclique jour/mois.
pub fn calendar_features(date: NaiveDate) -> [f64; CALENDAR_FEATURES] {
    let day = date.day() as f64;
    let month = date.month() as f64;
    [
        day,
        date.weekday().num_days_from_monday() as f64,
        week_of_month(date) as f64,
        month,
        date.ordinal() as f64,
        (2.0 * PI * day / 31.0).sin(),
        (2.0 * PI * day / 31.0).cos(),
        (2.0 * PI * month / 12.0).sin(),
        (2.0 * PI * month / 12.0).cos(),
    ]
}

/// Type de loterie ramené dans 0..1000, 0 sans type.
pub fn lotto_type_hash(lotto_type: Option<&str>) -> f64 {
    match lotto_type {
        Some(t) if !t.is_empty() => (stable_hash(t) % 1000) as f64,
        _ => 0.0,
    }
}

/// Fréquences relatives des `k` numéros les plus sortis, complétées par des zéros.
fn top_frequencies(draws: &[&Numbers], k: usize, scale: f64) -> Vec<f64> {
    let mut out = vec![0.0; k];
    if draws.is_empty() {
        return out;
    }
    let mut counts = vec![0usize; POOL_SIZE];
    for draw in draws {
        for &n in draw.iter() {
            counts[(n - 1) as usize] += 1;
        }
    }
    let total = draws.len() as f64;
    for (slot, n) in out.iter_mut().zip(rank_counts(&counts)) {
        let count = counts[(n - 1) as usize];
        if count == 0 {
            break;
        }
        *slot = count as f64 / total * scale;
    }
    out
}

fn sums(draws: &[&Numbers]) -> Vec<f64> {
    draws.iter().map(|d| draw_sum(d) as f64).collect()
}

/// Motifs des années passées pour la date visée : même jour du même mois,
/// puis même semaine du même mois. Les tirages du même type priment, les
/// autres comptent pour 0,3.
pub fn temporal_features(history: &[DatedDraw], target: NaiveDate, target_type: Option<&str>) -> Vec<f64> {
    let target_week = week_of_month(target);
    let mut date_same = Vec::new();
    let mut date_other = Vec::new();
    let mut week_same = Vec::new();
    let mut week_other = Vec::new();

    for draw in history.iter().filter(|d| d.date.month() == target.month()) {
        let same = draw.same_type(target_type);
        if draw.date.day() == target.day() {
            if same { date_same.push(&draw.numbers) } else { date_other.push(&draw.numbers) }
        }
        if week_of_month(draw.date) == target_week {
            if same { week_same.push(&draw.numbers) } else { week_other.push(&draw.numbers) }
        }
    }

    let mut features = Vec::with_capacity(TEMPORAL_FEATURES);

    features.extend(top_frequencies(&date_same, 10, 1.0));
    if date_same.is_empty() {
        features.extend([DEFAULT_SUM, 0.0, 0.0]);
    } else {
        let (mean, std) = mean_std(&sums(&date_same));
        let std = if date_same.len() > 1 { std } else { 0.0 };
        features.extend([mean, std, date_same.len() as f64]);
    }

    features.extend(top_frequencies(&date_other, 5, OTHER_TYPE_WEIGHT));
    let other_mean = if date_other.is_empty() { 0.0 } else { mean_std(&sums(&date_other)).0 * OTHER_TYPE_WEIGHT };
    features.push(other_mean);

    features.extend(top_frequencies(&week_same, 5, 1.0));
    features.extend(top_frequencies(&week_other, 3, OTHER_TYPE_WEIGHT));

    features
}

/// Compteurs cumulés par type de loterie, pour la fréquence pondérée
/// de chaque numéro sans rebalayer l'historique.
#[derive(Debug, Clone)]
pub struct FrequencyTally {
    all: Vec<usize>,
    all_draws: usize,
    by_type: BTreeMap<String, (Vec<usize>, usize)>,
}

impl Default for FrequencyTally {
    fn default() -> Self {
        Self { all: vec![0; POOL_SIZE], all_draws: 0, by_type: BTreeMap::new() }
    }
}

impl FrequencyTally {
    pub fn from_history(history: &[DatedDraw]) -> Self {
        let mut tally = Self::default();
        for draw in history {
            tally.add(draw);
        }
        tally
    }

    pub fn add(&mut self, draw: &DatedDraw) {
        let (counts, draws) = self
            .by_type
            .entry(draw.lotto_type.clone().unwrap_or_default())
            .or_insert_with(|| (vec![0; POOL_SIZE], 0));
        *draws += 1;
        self.all_draws += 1;
        for &n in &draw.numbers {
            counts[(n - 1) as usize] += 1;
            self.all[(n - 1) as usize] += 1;
        }
    }

    /// Part pondérée des tirages contenant `number` : poids 1 pour le type
    /// visé, 0,3 pour les autres.
    pub fn number_frequency(&self, number: u8, lotto_type: Option<&str>) -> f64 {
        let idx = (number - 1) as usize;
        let (same_count, same_draws) = self
            .by_type
            .get(lotto_type.unwrap_or(""))
            .map_or((0, 0), |(counts, draws)| (counts[idx], *draws));
        let hits = same_count as f64 + OTHER_TYPE_WEIGHT * (self.all[idx] - same_count) as f64;
        let total = same_draws as f64 + OTHER_TYPE_WEIGHT * (self.all_draws - same_draws) as f64;
        if total > 0.0 { hits / total } else { 0.0 }
    }

    pub fn weighted_counts(&self, lotto_type: Option<&str>) -> Vec<f64> {
        (1..=POOL_SIZE as u8).map(|n| self.number_frequency(n, lotto_type)).collect()
    }
}

/// Partie commune aux 90 lignes d'une date : calendrier, type et motifs temporels.
pub fn date_context(history: &[DatedDraw], target: NaiveDate, target_type: Option<&str>) -> Vec<f64> {
    let mut row = Vec::with_capacity(FEATURE_COUNT);
    row.extend(calendar_features(target));
    row.push(lotto_type_hash(target_type));
    row.extend(temporal_features(history, target, target_type));
    row
}

/// Ligne complète pour un numéro donné.
pub fn number_row(context: &[f64], tally: &FrequencyTally, number: u8, target_type: Option<&str>) -> Vec<f64> {
    let mut row = context.to_vec();
    row.push(number as f64);
    row.push(tally.number_frequency(number, target_type));
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(date: &str, numbers: Numbers, lotto_type: &str) -> DatedDraw {
        DatedDraw {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            numbers,
            lotto_type: Some(lotto_type.to_string()),
        }
    }

    #[test]
    fn test_calendar_features() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let f = calendar_features(date);
        assert_eq!(f[0], 15.0);
        assert_eq!(f[1], 4.0); // vendredi
        assert_eq!(f[2], 3.0);
        assert_eq!(f[3], 3.0);
        assert_eq!(f[4], 75.0);
        assert!((f[5].powi(2) + f[6].powi(2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lotto_type_hash_stable() {
        assert_eq!(lotto_type_hash(None), 0.0);
        let h = lotto_type_hash(Some("Fortune"));
        assert_eq!(h, lotto_type_hash(Some("Fortune")));
        assert!((0.0..1000.0).contains(&h));
    }

    #[test]
    fn test_temporal_features_prioritize_type() {
        let history = vec![
            dated("2022-03-15", [1, 2, 3, 4, 5], "A"),
            dated("2023-03-15", [1, 2, 3, 4, 6], "A"),
            dated("2023-03-15", [10, 20, 30, 40, 50], "B"),
            dated("2023-03-16", [7, 8, 9, 10, 11], "A"),
        ];
        let target = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let f = temporal_features(&history, target, Some("A"));
        assert_eq!(f.len(), TEMPORAL_FEATURES);
        // 1, 2, 3, 4 présents dans les deux tirages du même type
        assert_eq!(&f[..5], &[1.0, 1.0, 1.0, 1.0, 0.5]);
        assert_eq!(f[10], 15.5);
        assert_eq!(f[12], 2.0);
        assert!((f[13] - 0.3).abs() < 1e-12);
        assert!((f[18] - 150.0 * 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_features_defaults() {
        let target = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let f = temporal_features(&[], target, None);
        assert_eq!(f.len(), TEMPORAL_FEATURES);
        assert_eq!(f[10], 225.0);
        assert!(f.iter().enumerate().all(|(i, &v)| i == 10 || v == 0.0));
    }

    #[test]
    fn test_tally_weights_other_types() {
        let history = vec![dated("2024-01-01", [1, 2, 3, 4, 5], "A"), dated("2024-01-02", [1, 6, 7, 8, 9], "B")];
        let tally = FrequencyTally::from_history(&history);
        assert!((tally.number_frequency(1, Some("A")) - 1.0).abs() < 1e-12);
        // 6 n'apparaît que dans le tirage B : 0,3 / 1,3
        assert!((tally.number_frequency(6, Some("A")) - 0.3 / 1.3).abs() < 1e-12);
        assert_eq!(tally.number_frequency(90, Some("A")), 0.0);
        assert_eq!(FrequencyTally::default().number_frequency(1, None), 0.0);
    }

    #[test]
    fn test_row_width() {
        let history = vec![dated("2023-05-02", [1, 2, 3, 4, 5], "A")];
        let tally = FrequencyTally::from_history(&history);
        let target = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let context = date_context(&history, target, Some("A"));
        let row = number_row(&context, &tally, 7, Some("A"));
        assert_eq!(row.len(), FEATURE_COUNT);
        assert_eq!(row[FEATURE_COUNT - 2], 7.0);
    }
}
