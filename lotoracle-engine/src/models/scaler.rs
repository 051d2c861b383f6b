use ndarray::{Array1, Array2, Axis};

/// Centrage-réduction par colonne ; un écart-type nul est remplacé par 1.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Self {
        let n_features = x.ncols();
        let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        let stds = x.std_axis(Axis(0), 0.0).mapv(|s| if s < 1e-12 { 1.0 } else { s });
        Self { means, stds }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.means) / &self.stds
    }

    pub fn transform_row(&self, row: &[f64]) -> Array1<f64> {
        (Array1::from_vec(row.to_vec()) - &self.means) / &self.stds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaler_zero_mean_unit_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&x);
        let t = scaler.transform(&x);
        assert_eq!(t, array![[-1.0, 0.0], [1.0, 0.0]]);
        assert_eq!(scaler.transform_row(&[2.0, 7.0]), array![0.0, 2.0]);
    }
}
