use ndarray::Array1;

use crate::core::error::{BasisError, Result};
use crate::core::knots::KnotSequence;
use crate::core::splines::{BasisCache, NonUniformBSpline};

/// All basis functions of order `degree + 1` on a knot sequence, or their derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineSpace {
    degree: usize,
    derivative: usize,
    functions: Vec<NonUniformBSpline>,
}

impl BSplineSpace {
    /// Builds every basis function with key in `kmin..=kmax` through `cache`.
    pub fn new<K: KnotSequence + ?Sized>(knots: &K, cache: &mut BasisCache) -> Result<Self> {
        let degree = knots.degree();
        let functions = (knots.kmin()..=knots.kmax())
            .map(|k| NonUniformBSpline::new(knots, degree + 1, k, cache))
            .collect::<Result<Vec<_>>>()?;
        Ok(BSplineSpace { degree, derivative: 0, functions })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn derivative(&self) -> usize {
        self.derivative
    }

    pub fn functions(&self) -> &[NonUniformBSpline] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Space of the `n`-th derivatives, each looked up in or added to `cache`.
    pub fn diff(&self, n: usize, cache: &mut BasisCache) -> BSplineSpace {
        BSplineSpace {
            degree: self.degree,
            derivative: self.derivative + n,
            functions: self.functions.iter().map(|f| f.diff(n, cache)).collect(),
        }
    }

    /// Values of all basis functions at `x`.
    pub fn evaluate(&self, x: f64) -> Array1<f64> {
        self.functions.iter().map(|f| f.evaluate(x)).collect()
    }

    /// Evaluates the spline `sum_k a_k B_k(x)`.
    ///
    /// # Arguments
    /// * `coefficients` - One coefficient a_k per basis function.
    /// * `x` - Evaluation point.
    ///
    /// # Returns
    /// The spline value, or an error if the number of coefficients does not match the space.
    pub fn evaluate_spline(&self, coefficients: &Array1<f64>, x: f64) -> Result<f64> {
        self.check_coefficients(coefficients)?;
        Ok(self.evaluate(x).dot(coefficients))
    }

    /// Evaluates the spline at every point of `xs`.
    pub fn evaluate_spline_array(&self, coefficients: &Array1<f64>, xs: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_coefficients(coefficients)?;
        Ok(xs.mapv(|x| self.evaluate(x).dot(coefficients)))
    }

    fn check_coefficients(&self, coefficients: &Array1<f64>) -> Result<()> {
        if coefficients.len() != self.functions.len() {
            return Err(BasisError::LengthMismatch {
                what: "coefficients",
                expected: self.functions.len(),
                actual: coefficients.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::knots::KnotVector;
    use ndarray::arr1;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_space_size() {
        let mut cache = BasisCache::new();
        let t = KnotVector::uniform(3, (0.0, 1.0), 4).unwrap();
        let space = BSplineSpace::new(&t, &mut cache).unwrap();
        assert_eq!(space.len(), t.nr_functions());
        assert_eq!(space.len(), 8);
        assert_eq!(space.degree(), 3);
    }

    #[test]
    fn test_evaluate_linear_spline_order2() {
        // Order m=2 (linear). N_coeffs = 3.
        let mut cache = BasisCache::new();
        let t = KnotVector::from_knots(1, arr1(&[0.0, 0.0, 1.0, 2.0, 2.0])).unwrap();
        let space = BSplineSpace::new(&t, &mut cache).unwrap();
        let coeffs = arr1(&[1.0, 2.0, 1.5]);

        assert!((space.evaluate_spline(&coeffs, 0.0).unwrap() - 1.0).abs() < TOL);
        assert!((space.evaluate_spline(&coeffs, 0.5).unwrap() - 1.5).abs() < TOL);
        assert!((space.evaluate_spline(&coeffs, 1.0).unwrap() - 2.0).abs() < TOL);
        assert!((space.evaluate_spline(&coeffs, 1.5).unwrap() - 1.75).abs() < TOL);
        assert!((space.evaluate_spline(&coeffs, 2.0).unwrap() - 1.5).abs() < TOL);
        // outside the support
        assert_eq!(space.evaluate_spline(&coeffs, 2.5).unwrap(), 0.0);

        let values = space.evaluate_spline_array(&coeffs, &arr1(&[0.0, 0.5])).unwrap();
        assert!((values[1] - 1.5).abs() < TOL);
    }

    #[test]
    fn test_evaluate_spline_input_validation() {
        let mut cache = BasisCache::new();
        let t = KnotVector::clamped(1, (0.0, 1.0)).unwrap();
        let space = BSplineSpace::new(&t, &mut cache).unwrap();
        assert_eq!(
            space.evaluate_spline(&arr1(&[1.0, 2.0, 3.0]), 0.5),
            Err(BasisError::LengthMismatch { what: "coefficients", expected: 2, actual: 3 })
        );
    }

    #[test]
    fn test_derivative_space() {
        let mut cache = BasisCache::new();
        let t = KnotVector::from_knots(1, arr1(&[0.0, 0.0, 1.0, 2.0, 2.0])).unwrap();
        let space = BSplineSpace::new(&t, &mut cache).unwrap();
        let slopes = space.diff(1, &mut cache);
        assert_eq!(slopes.derivative(), 1);

        let coeffs = arr1(&[1.0, 2.0, 1.5]);
        assert!((slopes.evaluate_spline(&coeffs, 0.5).unwrap() - 1.0).abs() < TOL);
        assert!((slopes.evaluate_spline(&coeffs, 1.5).unwrap() + 0.5).abs() < TOL);
    }

    #[test]
    fn test_evaluate_sums_to_one() {
        let mut cache = BasisCache::new();
        let t = KnotVector::uniform(2, (-1.0, 3.0), 3).unwrap();
        let space = BSplineSpace::new(&t, &mut cache).unwrap();
        for x in [-1.0, -0.2, 0.5, 1.3, 2.9, 3.0] {
            assert!((space.evaluate(x).sum() - 1.0).abs() < TOL, "x = {}", x);
        }
    }
}
