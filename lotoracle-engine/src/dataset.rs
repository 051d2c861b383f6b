use std::cmp::Ordering;

use lotoracle_db::models::{Draw, Numbers, MAX_NUMBER};
use tracing::warn;

use crate::error::check_candidate;

pub const POOL_SIZE: usize = MAX_NUMBER as usize;

/// Historique ordonné du plus ancien au plus récent. Dates et types de
/// loterie sont optionnels ; quand ils sont présents ils sont alignés
/// index par index sur les tirages.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    draws: Vec<Numbers>,
    dates: Option<Vec<String>>,
    lotto_types: Option<Vec<String>>,
}

impl HistoricalDataset {
    pub fn new(draws: Vec<Numbers>) -> Self {
        Self::from_parts(draws, None, None)
    }

    /// Construit l'historique en écartant les tirages invalides. Une colonne
    /// de dates ou de types dont la longueur diffère est ignorée.
    pub fn from_parts(
        draws: Vec<Numbers>,
        dates: Option<Vec<String>>,
        lotto_types: Option<Vec<String>>,
    ) -> Self {
        let n = draws.len();
        let dates = dates.filter(|d| {
            let ok = d.len() == n;
            if !ok {
                warn!(dates = d.len(), draws = n, "Dates non alignées, ignorées");
            }
            ok
        });
        let lotto_types = lotto_types.filter(|t| {
            let ok = t.len() == n;
            if !ok {
                warn!(types = t.len(), draws = n, "Types non alignés, ignorés");
            }
            ok
        });

        let mut kept_draws = Vec::with_capacity(n);
        let mut kept_dates = dates.as_ref().map(|_| Vec::with_capacity(n));
        let mut kept_types = lotto_types.as_ref().map(|_| Vec::with_capacity(n));
        for (i, draw) in draws.iter().enumerate() {
            let Ok(numbers) = check_candidate(draw) else {
                warn!(index = i, ?draw, "Tirage invalide écarté");
                continue;
            };
            kept_draws.push(numbers);
            if let (Some(out), Some(src)) = (kept_dates.as_mut(), dates.as_ref()) {
                out.push(src[i].clone());
            }
            if let (Some(out), Some(src)) = (kept_types.as_mut(), lotto_types.as_ref()) {
                out.push(src[i].clone());
            }
        }

        Self { draws: kept_draws, dates: kept_dates, lotto_types: kept_types }
    }

    /// Les enregistrements de la base sont déjà chronologiques.
    pub fn from_records(records: &[Draw]) -> Self {
        Self::from_parts(
            records.iter().map(|d| d.winning).collect(),
            Some(records.iter().map(|d| d.date.clone()).collect()),
            Some(records.iter().map(|d| d.lotto_type.clone()).collect()),
        )
    }

    pub fn draws(&self) -> &[Numbers] {
        &self.draws
    }

    pub fn dates(&self) -> Option<&[String]> {
        self.dates.as_deref()
    }

    pub fn lotto_types(&self) -> Option<&[String]> {
        self.lotto_types.as_deref()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Les `n` derniers tirages (ou tout l'historique s'il est plus court).
    pub fn recent(&self, n: usize) -> &[Numbers] {
        recent(&self.draws, n)
    }
}

pub fn recent(draws: &[Numbers], n: usize) -> &[Numbers] {
    &draws[draws.len().saturating_sub(n)..]
}

/// Nombre d'apparitions de chaque numéro (index = numéro - 1).
pub fn frequencies(draws: &[Numbers]) -> Vec<usize> {
    let mut counts = vec![0usize; POOL_SIZE];
    for draw in draws {
        for &n in draw {
            counts[(n - 1) as usize] += 1;
        }
    }
    counts
}

/// Tirages écoulés depuis la dernière sortie de chaque numéro.
/// Un numéro jamais sorti reçoit la longueur de la fenêtre.
pub fn skip_counts(draws: &[Numbers]) -> Vec<usize> {
    let mut skips = vec![draws.len(); POOL_SIZE];
    let mut seen = [false; POOL_SIZE];
    for (age, draw) in draws.iter().rev().enumerate() {
        for &n in draw {
            let idx = (n - 1) as usize;
            if !seen[idx] {
                seen[idx] = true;
                skips[idx] = age;
            }
        }
    }
    skips
}

/// Numéros classés par score décroissant, égalités par numéro croissant.
pub fn rank_numbers(scores: &[f64]) -> Vec<u8> {
    let mut numbers: Vec<u8> = (1..=scores.len() as u8).collect();
    numbers.sort_by(|&a, &b| {
        scores[(b - 1) as usize]
            .partial_cmp(&scores[(a - 1) as usize])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    numbers
}

/// Même classement pour des compteurs entiers.
pub fn rank_counts(counts: &[usize]) -> Vec<u8> {
    let mut numbers: Vec<u8> = (1..=counts.len() as u8).collect();
    numbers.sort_by(|&a, &b| counts[(b - 1) as usize].cmp(&counts[(a - 1) as usize]).then(a.cmp(&b)));
    numbers
}

/// Grille des 5 numéros les plus fréquents.
pub fn frequency_ticket(draws: &[Numbers]) -> Numbers {
    let ranked = rank_counts(&frequencies(draws));
    let mut ticket = [0u8; 5];
    ticket.copy_from_slice(&ranked[..5]);
    ticket.sort_unstable();
    ticket
}

/// Tirages synthétiques déterministes pour les tests.
pub fn make_test_draws(n: usize) -> Vec<Numbers> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..n)
        .map(|_| {
            let mut picked: Vec<u8> = Vec::with_capacity(5);
            while picked.len() < 5 {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                let number = ((state >> 33) % POOL_SIZE as u64) as u8 + 1;
                if !picked.contains(&number) {
                    picked.push(number);
                }
            }
            let mut draw = [0u8; 5];
            draw.copy_from_slice(&picked);
            draw.sort_unstable();
            draw
        })
        .collect()
}

/// Dates ISO consécutives espacées de `step_days` à partir de `start`.
pub fn make_test_dates(n: usize, start: &str, step_days: i64) -> Vec<String> {
    let Ok(first) = chrono::NaiveDate::parse_from_str(start, "%Y-%m-%d") else {
        return Vec::new();
    };
    (0..n)
        .map(|i| (first + chrono::Duration::days(i as i64 * step_days)).format("%Y-%m-%d").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_test_draws_valid() {
        let draws = make_test_draws(200);
        assert_eq!(draws.len(), 200);
        for d in &draws {
            assert!(check_candidate(d).is_ok(), "tirage invalide : {d:?}");
        }
        assert_eq!(make_test_draws(10), make_test_draws(10));
    }

    #[test]
    fn test_invalid_draws_dropped_with_alignment() {
        let draws = vec![[1, 2, 3, 4, 5], [1, 1, 3, 4, 5], [10, 20, 30, 40, 50]];
        let dates = vec!["2020-01-01".to_string(), "2020-01-02".to_string(), "2020-01-03".to_string()];
        let ds = HistoricalDataset::from_parts(draws, Some(dates), None);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dates().unwrap(), &["2020-01-01".to_string(), "2020-01-03".to_string()]);
        assert!(ds.lotto_types().is_none());
    }

    #[test]
    fn test_misaligned_dates_ignored() {
        let ds = HistoricalDataset::from_parts(make_test_draws(5), Some(vec!["2020-01-01".into()]), None);
        assert_eq!(ds.len(), 5);
        assert!(ds.dates().is_none());
    }

    #[test]
    fn test_skip_counts() {
        let draws = vec![[1, 2, 3, 4, 5], [1, 6, 7, 8, 9], [10, 11, 12, 13, 14]];
        let skips = skip_counts(&draws);
        assert_eq!(skips[0], 1, "1 sorti il y a un tirage");
        assert_eq!(skips[1], 2);
        assert_eq!(skips[9], 0);
        assert_eq!(skips[89], 3, "jamais sorti = longueur de la fenêtre");
    }

    #[test]
    fn test_rank_ties_by_number() {
        let mut scores = vec![0.0; POOL_SIZE];
        scores[40] = 1.0;
        scores[4] = 1.0;
        let ranked = rank_numbers(&scores);
        assert_eq!(&ranked[..3], &[5, 41, 1]);
    }

    #[test]
    fn test_frequency_ticket() {
        let draws = vec![[1, 2, 3, 4, 5], [1, 2, 3, 4, 6], [1, 2, 3, 7, 8]];
        assert_eq!(frequency_ticket(&draws), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_make_test_dates() {
        let dates = make_test_dates(3, "2021-12-31", 1);
        assert_eq!(dates, vec!["2021-12-31", "2022-01-01", "2022-01-02"]);
    }
}
