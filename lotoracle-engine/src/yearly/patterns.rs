use std::collections::BTreeMap;

use serde::Serialize;

use super::YearStats;

/// Taux minimal d'apparition d'un numéro en tendance la dernière année.
const TRENDING_MIN_RATE: f64 = 0.05;
/// Taux annuel au-dessus duquel un numéro compte comme présent.
const STABLE_MIN_RATE: f64 = 0.03;
/// Part des années où le numéro doit être présent.
const STABLE_YEAR_SHARE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    RecurringHot,
    ColdToHot,
    Cyclical,
    Trending,
    StableFoundation,
}

impl PatternKind {
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::RecurringHot => "recurring_hot",
            PatternKind::ColdToHot => "cold_to_hot",
            PatternKind::Cyclical => "cyclical",
            PatternKind::Trending => "trending",
            PatternKind::StableFoundation => "stable_foundation",
        }
    }

    /// Poids du motif dans la prédiction annuelle, avant sa confiance.
    pub fn weight(&self) -> f64 {
        match self {
            PatternKind::StableFoundation | PatternKind::RecurringHot => 0.25,
            PatternKind::Trending => 0.20,
            PatternKind::ColdToHot | PatternKind::Cyclical => 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyPattern {
    pub kind: PatternKind,
    pub numbers: Vec<u8>,
    pub confidence: f64,
}

/// Motifs inter-annuels. Une seule année ne donne que la base stable
/// (ses 10 numéros les plus chauds).
pub fn detect_patterns(years: &BTreeMap<i32, YearStats>) -> Vec<YearlyPattern> {
    let stats: Vec<&YearStats> = years.values().collect();
    let mut patterns = Vec::new();

    if stats.len() < 2 {
        if let Some(year) = stats.first() {
            if !year.hot.is_empty() {
                patterns.push(YearlyPattern {
                    kind: PatternKind::StableFoundation,
                    numbers: year.hot.iter().take(10).copied().collect(),
                    confidence: 0.6,
                });
            }
        }
        return patterns;
    }

    let mut push = |kind: PatternKind, numbers: Vec<u8>, confidence: f64| {
        if !numbers.is_empty() {
            patterns.push(YearlyPattern { kind, numbers, confidence });
        }
    };

    let recurring = recurring_hot(&stats);
    let recurring_confidence = recurring.len() as f64 / 15.0;
    push(PatternKind::RecurringHot, recurring, recurring_confidence);
    push(PatternKind::ColdToHot, cold_to_hot(&stats), 0.6);
    push(PatternKind::Cyclical, cyclical(&stats), 0.5);
    push(PatternKind::Trending, trending(&stats), 0.7);
    push(PatternKind::StableFoundation, stable_foundation(&stats), 0.8);

    patterns
}

fn rates(stats: &[&YearStats], number: u8) -> Vec<f64> {
    stats.iter().map(|s| s.rate(number)).collect()
}

/// Numéros chauds au moins deux années, les plus récurrents d'abord.
fn recurring_hot(stats: &[&YearStats]) -> Vec<u8> {
    let mut year_counts: BTreeMap<u8, usize> = BTreeMap::new();
    for year in stats {
        for &n in &year.hot {
            *year_counts.entry(n).or_default() += 1;
        }
    }
    let mut recurring: Vec<(u8, usize)> = year_counts.into_iter().filter(|&(_, c)| c >= 2).collect();
    recurring.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    recurring.into_iter().take(10).map(|(n, _)| n).collect()
}

/// Froids l'an dernier, au-dessus de 10 % des tirages cette année.
fn cold_to_hot(stats: &[&YearStats]) -> Vec<u8> {
    let [.., previous, current] = stats else {
        return Vec::new();
    };
    let threshold = current.draws as f64 * 0.1;
    let mut cold = previous.cold.clone();
    cold.sort_unstable();
    cold.into_iter().filter(|&n| current.frequency(n) as f64 > threshold).take(5).collect()
}

/// Taux strictement alternés (haut-bas-haut ou bas-haut-bas) sur au moins trois années.
fn cyclical(stats: &[&YearStats]) -> Vec<u8> {
    if stats.len() < 3 {
        return Vec::new();
    }
    (1..=90u8)
        .filter(|&n| {
            rates(stats, n).windows(3).all(|w| (w[0] > w[1] && w[1] < w[2]) || (w[0] < w[1] && w[1] > w[2]))
        })
        .take(5)
        .collect()
}

/// Taux non décroissant, ou saut de 30 % la dernière année.
fn trending(stats: &[&YearStats]) -> Vec<u8> {
    let mut found: Vec<(u8, f64)> = (1..=90u8)
        .filter_map(|n| {
            let r = rates(stats, n);
            let last = *r.last()?;
            let monotonic = r.windows(2).all(|w| w[0] <= w[1]);
            let jump = r.len() >= 2 && last > r[r.len() - 2] * 1.3;
            ((monotonic || jump) && last > TRENDING_MIN_RATE).then_some((n, last))
        })
        .collect();
    found.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    found.into_iter().take(10).map(|(n, _)| n).collect()
}

fn stable_foundation(stats: &[&YearStats]) -> Vec<u8> {
    let required = stats.len() as f64 * STABLE_YEAR_SHARE;
    (1..=90u8)
        .filter(|&n| {
            let present = stats.iter().filter(|s| s.draws > 0 && s.rate(n) > STABLE_MIN_RATE).count();
            present as f64 >= required
        })
        .take(10)
        .collect()
}

/// Somme des confiances des motifs qui citent chaque numéro (index = numéro - 1).
pub fn confidence_weights(patterns: &[YearlyPattern]) -> Vec<f64> {
    let mut weights = vec![0.0; 90];
    for pattern in patterns {
        for &n in &pattern.numbers {
            weights[(n - 1) as usize] += pattern.confidence;
        }
    }
    weights
}
