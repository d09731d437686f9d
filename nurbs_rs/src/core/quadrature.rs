//! Adaptive-order Gauss-Legendre quadrature for definite integrals of the rational
//! algebra.

use std::f64::consts::PI;

/// Tolerances and order limits of [`integrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureSettings {
    /// Absolute tolerance on the difference between two successive orders.
    pub tolerance: f64,
    /// Relative tolerance on the same difference.
    pub relative_tolerance: f64,
    /// Highest Gauss-Legendre order tried before giving up.
    pub max_order: usize,
    /// First Gauss-Legendre order evaluated.
    pub min_order: usize,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        QuadratureSettings {
            tolerance: 1.49e-8,
            relative_tolerance: 1.49e-8,
            max_order: 50,
            min_order: 1,
        }
    }
}

/// Result of a definite integral: the estimate and the difference between the last two
/// orders, which serves as the error estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub value: f64,
    pub error: f64,
}

impl Quadrature {
    pub fn zero() -> Self {
        Quadrature { value: 0.0, error: 0.0 }
    }
}

impl std::ops::Add for Quadrature {
    type Output = Quadrature;

    fn add(self, rhs: Quadrature) -> Quadrature {
        Quadrature {
            value: self.value + rhs.value,
            error: self.error + rhs.error,
        }
    }
}

/// Integrates `f` over `[a, b]`, raising the Gauss-Legendre order until two successive
/// estimates agree within the configured tolerances or `max_order` is reached.
///
/// No singularity detection is done: a pole inside `[a, b]` yields a large error or a
/// non-finite value.
pub fn integrate<F>(f: F, a: f64, b: f64, settings: &QuadratureSettings) -> Quadrature
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return Quadrature::zero();
    }

    let mut value = f64::INFINITY;
    let mut error = f64::INFINITY;
    for order in settings.min_order.max(1)..=settings.max_order.max(1) {
        let estimate = fixed_order(&f, a, b, order);
        error = (estimate - value).abs();
        value = estimate;
        if error < settings.tolerance || error < settings.relative_tolerance * value.abs() {
            break;
        }
    }
    Quadrature { value, error }
}

/// Gauss-Legendre rule of the given order mapped from [-1, 1] onto [a, b].
fn fixed_order<F>(f: &F, a: f64, b: f64, order: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let (nodes, weights) = gauss_legendre(order);
    let c1 = (b - a) / 2.0;
    let c2 = (b + a) / 2.0;
    let sum: f64 = nodes
        .iter()
        .zip(&weights)
        .map(|(&x, &w)| w * f(c1 * x + c2))
        .sum();
    sum * c1
}

/// Nodes and weights of the `n`-point rule, found by Newton iteration on `P_n`.
fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;

    for i in 0..(n + 1) / 2 {
        let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut derivative = 1.0;
        for _ in 0..100 {
            let mut p1 = 1.0;
            let mut p2 = 0.0;
            for j in 0..n {
                let p3 = p2;
                p2 = p1;
                let jf = j as f64;
                p1 = ((2.0 * jf + 1.0) * z * p2 - jf * p3) / (jf + 1.0);
            }
            derivative = nf * (z * p1 - p2) / (z * z - 1.0);
            let previous = z;
            z = previous - p1 / derivative;
            if (z - previous).abs() < 1e-15 {
                break;
            }
        }
        let weight = 2.0 / ((1.0 - z * z) * derivative * derivative);
        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        weights[i] = weight;
        weights[n - 1 - i] = weight;
    }
    (nodes, weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_gauss_legendre_five_points() {
        let (nodes, weights) = gauss_legendre(5);
        let expected_nodes = [-0.906179845938664, -0.538469310105683, 0.0, 0.538469310105683, 0.906179845938664];
        let expected_weights = [0.236926885056189, 0.478628670499366, 0.568888888888889, 0.478628670499366, 0.236926885056189];
        for i in 0..5 {
            assert!((nodes[i] - expected_nodes[i]).abs() < 1e-12, "node {}", i);
            assert!((weights[i] - expected_weights[i]).abs() < 1e-12, "weight {}", i);
        }
        assert!((weights.iter().sum::<f64>() - 2.0).abs() < TOL);
    }

    #[test]
    fn test_integrate_polynomial_is_exact() {
        let q = integrate(|x| 3.0 * x * x, 0.0, 2.0, &QuadratureSettings::default());
        assert!((q.value - 8.0).abs() < TOL);
        assert!(q.error < 1e-8);
    }

    #[test]
    fn test_integrate_rational() {
        // ln(2)
        let q = integrate(|x| 1.0 / (x + 1.0), 0.0, 1.0, &QuadratureSettings::default());
        assert!((q.value - std::f64::consts::LN_2).abs() < 1e-9);
    }

    #[test]
    fn test_integrate_reversed_and_empty() {
        let settings = QuadratureSettings::default();
        let forward = integrate(|x| x, 0.0, 1.0, &settings);
        let backward = integrate(|x| x, 1.0, 0.0, &settings);
        assert!((forward.value + backward.value).abs() < TOL);
        assert_eq!(integrate(|x| x, 0.5, 0.5, &settings), Quadrature::zero());
    }
}
