use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use rand::rngs::StdRng;

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tirées à chaque nœud ; `None` = toutes.
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum TreeNode {
    Leaf { value: f64 },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn predict(&self, row: ArrayView1<f64>) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split { feature_idx, threshold, left, right } => {
                if row[*feature_idx] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Arbre de régression pondéré (critère : somme des carrés pondérée).
/// Sur des labels 0/1 le critère est proportionnel à l'impureté de Gini.
pub struct TreeBuilder<'a, F: Fn(&[usize]) -> f64> {
    pub x: &'a Array2<f64>,
    pub targets: &'a [f64],
    pub weights: &'a [f64],
    pub params: &'a TreeParams,
    /// Valeur d'une feuille à partir de ses échantillons.
    pub leaf_value: F,
}

#[derive(Default, Clone, Copy)]
struct Moments {
    count: usize,
    w: f64,
    wy: f64,
    wy2: f64,
}

impl Moments {
    fn add(&mut self, w: f64, y: f64) {
        self.count += 1;
        self.w += w;
        self.wy += w * y;
        self.wy2 += w * y * y;
    }

    fn sub(&self, other: &Moments) -> Moments {
        Moments {
            count: self.count - other.count,
            w: self.w - other.w,
            wy: self.wy - other.wy,
            wy2: self.wy2 - other.wy2,
        }
    }

    fn sse(&self) -> f64 {
        if self.w <= 0.0 {
            return 0.0;
        }
        (self.wy2 - self.wy * self.wy / self.w).max(0.0)
    }
}

impl<'a, F: Fn(&[usize]) -> f64> TreeBuilder<'a, F> {
    pub fn build(&self, indices: &mut [usize], rng: &mut StdRng) -> TreeNode {
        self.grow(indices, 0, rng)
    }

    fn leaf(&self, indices: &[usize]) -> TreeNode {
        TreeNode::Leaf { value: (self.leaf_value)(indices) }
    }

    fn grow(&self, indices: &mut [usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let n = indices.len();
        if depth >= self.params.max_depth
            || n < self.params.min_samples_split.max(2)
            || n < 2 * self.params.min_samples_leaf.max(1)
        {
            return self.leaf(indices);
        }

        let first = self.targets[indices[0]];
        if indices.iter().all(|&i| (self.targets[i] - first).abs() < 1e-12) {
            return self.leaf(indices);
        }

        let mut parent = Moments::default();
        for &i in indices.iter() {
            parent.add(self.weights[i], self.targets[i]);
        }

        let n_features = self.x.ncols();
        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        if let Some(k) = self.params.max_features {
            feature_indices.shuffle(rng);
            feature_indices.truncate(k.clamp(1, n_features));
        }

        let mut best: Option<(f64, usize, f64)> = None;
        for &feat_idx in &feature_indices {
            if let Some((sse, threshold)) = self.best_split(indices, feat_idx) {
                if best.map_or(true, |(b, _, _)| sse < b) {
                    best = Some((sse, feat_idx, threshold));
                }
            }
        }

        let Some((best_sse, feature_idx, threshold)) = best else {
            return self.leaf(indices);
        };
        if best_sse >= parent.sse() - 1e-12 {
            return self.leaf(indices);
        }

        // Partition en place : gauche = valeurs ≤ seuil
        let mut mid = 0;
        for i in 0..n {
            if self.x[[indices[i], feature_idx]] <= threshold {
                indices.swap(i, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == n {
            return self.leaf(indices);
        }

        let (left, right) = indices.split_at_mut(mid);
        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.grow(left, depth + 1, rng)),
            right: Box::new(self.grow(right, depth + 1, rng)),
        }
    }

    /// Meilleur seuil pour une feature : (sse gauche + droite, seuil).
    fn best_split(&self, indices: &[usize], feat_idx: usize) -> Option<(f64, f64)> {
        let mut values: Vec<(f64, usize)> = indices.iter().map(|&i| (self.x[[i, feat_idx]], i)).collect();
        values.sort_by(|a, b| a.0.total_cmp(&b.0));
        if values[0].0 == values[values.len() - 1].0 {
            return None;
        }

        let mut total = Moments::default();
        for &(_, i) in &values {
            total.add(self.weights[i], self.targets[i]);
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut left = Moments::default();
        let mut best: Option<(f64, f64)> = None;
        for k in 0..values.len() - 1 {
            let (v, i) = values[k];
            left.add(self.weights[i], self.targets[i]);
            let next = values[k + 1].0;
            if v == next {
                continue;
            }
            let right = total.sub(&left);
            if left.count < min_leaf || right.count < min_leaf {
                continue;
            }
            let sse = left.sse() + right.sse();
            if best.map_or(true, |(b, _)| sse < b) {
                best = Some((sse, (v + next) / 2.0));
            }
        }
        best
    }
}

/// Moyenne pondérée des cibles d'un ensemble d'échantillons.
pub fn weighted_mean(targets: &[f64], weights: &[f64], indices: &[usize]) -> f64 {
    let (num, den) = indices
        .iter()
        .fold((0.0, 0.0), |(n, d), &i| (n + weights[i] * targets[i], d + weights[i]));
    if den > 0.0 { num / den } else { 0.0 }
}
