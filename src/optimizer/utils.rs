//! # Optimizer Utilities
//!
//! Statistics and small vector helpers shared by the search strategies.

/// Statistical functions
pub mod statistics {
    /// Arithmetic mean
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation
    pub fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let m = mean(values);
        let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }

    /// Index of the smallest value; NaN never wins
    pub fn argmin(values: &[f64]) -> Option<usize> {
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

/// Unit-cube vector helpers
pub mod unit_cube {
    /// Componentwise projection onto [0, 1]
    pub fn project(u: &mut [f64]) {
        for x in u.iter_mut() {
            *x = x.clamp(0.0, 1.0);
        }
    }

    /// `‖P(u - g) - u‖∞`, the first-order stationarity measure on the box
    pub fn projected_gradient_norm(u: &[f64], g: &[f64]) -> f64 {
        u.iter()
            .zip(g)
            .map(|(ui, gi)| ((ui - gi).clamp(0.0, 1.0) - ui).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((statistics::mean(&values) - 3.0).abs() < 1e-10);
        assert!((statistics::std_dev(&values) - 2f64.sqrt()).abs() < 1e-10);
        assert_eq!(statistics::std_dev(&[7.0]), 0.0);
    }

    #[test]
    fn test_argmin() {
        assert_eq!(statistics::argmin(&[3.0, f64::NAN, 1.0, 2.0]), Some(2));
        assert_eq!(statistics::argmin(&[]), None);
    }

    #[test]
    fn test_projected_gradient() {
        // at the lower bound a positive gradient is blocked
        let u = [0.0, 0.5];
        let g = [1.0, 0.1];
        assert!((unit_cube::projected_gradient_norm(&u, &g) - 0.1).abs() < 1e-15);
        let mut v = vec![-0.2, 1.3, 0.4];
        unit_cube::project(&mut v);
        assert_eq!(v, vec![0.0, 1.0, 0.4]);
    }
}
