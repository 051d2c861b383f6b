use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::warn;

use crate::error::{OracleError, Result};

/// Jeu de données rééquilibré : lignes et labels.
pub type Balanced = (Vec<Vec<f64>>, Vec<f64>);

fn split_classes(rows: &[Vec<f64>], labels: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut pos = Vec::new();
    let mut neg = Vec::new();
    for (i, &l) in labels.iter().enumerate().take(rows.len()) {
        if l > 0.5 {
            pos.push(i);
        } else {
            neg.push(i);
        }
    }
    (pos, neg)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// SMOTE : interpolation entre un exemple minoritaire et l'un de ses `k`
/// plus proches voisins minoritaires, jusqu'à égalité des classes.
pub fn smote(rows: &[Vec<f64>], labels: &[f64], k: usize, rng: &mut StdRng) -> Result<Balanced> {
    let (pos, neg) = split_classes(rows, labels);
    if pos.len() <= k || k == 0 {
        return Err(OracleError::InsufficientData { required: k + 1, actual: pos.len() });
    }
    let mut out_rows = rows.to_vec();
    let mut out_labels = labels[..rows.len()].to_vec();
    if pos.len() >= neg.len() {
        return Ok((out_rows, out_labels));
    }

    // Voisinage calculé une fois par exemple minoritaire
    let neighbours: Vec<Vec<usize>> = pos
        .par_iter()
        .map(|&i| {
            let mut dists: Vec<(f64, usize)> =
                pos.iter().filter(|&&j| j != i).map(|&j| (squared_distance(&rows[i], &rows[j]), j)).collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect();

    for _ in 0..neg.len() - pos.len() {
        let slot = rng.random_range(0..pos.len());
        let base = &rows[pos[slot]];
        let Some(&other) = neighbours[slot].choose(rng) else {
            continue;
        };
        let gap: f64 = rng.random();
        let synthetic: Vec<f64> = base.iter().zip(&rows[other]).map(|(a, b)| a + gap * (b - a)).collect();
        out_rows.push(synthetic);
        out_labels.push(1.0);
    }

    Ok((out_rows, out_labels))
}

/// Suréchantillonnage aléatoire avec remise de la classe minoritaire.
pub fn random_oversample(rows: &[Vec<f64>], labels: &[f64], rng: &mut StdRng) -> Balanced {
    let (pos, neg) = split_classes(rows, labels);
    if pos.is_empty() || pos.len() >= neg.len() {
        return (rows.to_vec(), labels[..rows.len()].to_vec());
    }

    let mut out_rows: Vec<Vec<f64>> = Vec::with_capacity(2 * neg.len());
    let mut out_labels: Vec<f64> = Vec::with_capacity(2 * neg.len());
    for _ in 0..neg.len() {
        let i = pos[rng.random_range(0..pos.len())];
        out_rows.push(rows[i].clone());
        out_labels.push(1.0);
    }
    for &i in &neg {
        out_rows.push(rows[i].clone());
        out_labels.push(0.0);
    }
    (out_rows, out_labels)
}

/// SMOTE, ou suréchantillonnage simple s'il échoue.
pub fn balance(rows: &[Vec<f64>], labels: &[f64], k: usize, rng: &mut StdRng) -> Balanced {
    match smote(rows, labels, k, rng) {
        Ok(balanced) => balanced,
        Err(e) => {
            warn!(error = %e, "SMOTE impossible, suréchantillonnage aléatoire");
            random_oversample(rows, labels, rng)
        }
    }
}
