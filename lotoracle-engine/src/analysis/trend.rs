use std::cmp::Ordering;

use lotoracle_db::models::Numbers;
use serde::Serialize;

use crate::dataset::{recent, POOL_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Momentum {
    pub number: u8,
    pub momentum: f64,
    pub acceleration: f64,
    pub direction: TrendDirection,
    /// Fréquence relative dans chaque fenêtre (5, 10, 20).
    pub frequencies: [f64; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendReport {
    pub rising: Vec<u8>,
    pub falling: Vec<u8>,
    pub accelerating: Vec<u8>,
}

pub struct TrendAnalyzer {
    windows: [usize; 3],
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self { windows: [5, 10, 20] }
    }
}

impl TrendAnalyzer {
    pub fn momentum(&self, draws: &[Numbers], number: u8) -> Momentum {
        let longest = self.windows[2];
        if draws.len() < longest {
            return Momentum {
                number,
                momentum: 0.0,
                acceleration: 0.0,
                direction: TrendDirection::Neutral,
                frequencies: [0.0; 3],
            };
        }

        let mut frequencies = [0.0f64; 3];
        for (slot, &w) in self.windows.iter().enumerate() {
            let hits = recent(draws, w).iter().filter(|d| d.contains(&number)).count();
            frequencies[slot] = hits as f64 / w as f64;
        }
        let [f_short, f_mid, f_long] = frequencies;

        let momentum = f_short - f_long;
        let acceleration = (f_short - f_mid) - (f_mid - f_long);
        let direction = if momentum > 0.05 {
            TrendDirection::Rising
        } else if momentum < -0.05 {
            TrendDirection::Falling
        } else {
            TrendDirection::Neutral
        };

        Momentum { number, momentum, acceleration, direction, frequencies }
    }

    /// Numéros en hausse, en baisse et en accélération (15 de chaque au plus).
    pub fn trending_numbers(&self, draws: &[Numbers], top_n: usize) -> TrendReport {
        let all: Vec<Momentum> = (1..=POOL_SIZE as u8).map(|n| self.momentum(draws, n)).collect();
        let by = |pred: &dyn Fn(&Momentum) -> bool, key: &dyn Fn(&Momentum) -> f64| -> Vec<u8> {
            let mut picked: Vec<&Momentum> = all.iter().filter(|m| pred(m)).collect();
            picked.sort_by(|a, b| {
                key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal).then(a.number.cmp(&b.number))
            });
            picked.iter().take(top_n).map(|m| m.number).collect()
        };

        TrendReport {
            rising: by(&|m| m.direction == TrendDirection::Rising, &|m| m.momentum),
            falling: by(&|m| m.direction == TrendDirection::Falling, &|m| -m.momentum),
            accelerating: by(&|m| m.acceleration > 0.02, &|m| m.acceleration),
        }
    }
}
