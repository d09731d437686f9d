//! Real roots of a polynomial from the eigenvalues of its companion matrix.

use log::trace;
use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::core::polynomial::Polynomial;

const LEADING_ZERO_TOL: f64 = 1e-14;
const IMAGINARY_TOL: f64 = 1e-6;

/// Returns the real roots of `p`, unsorted.
///
/// Constant polynomials (including zero) have no roots reported. Complex conjugate pairs are
/// discarded; a root is kept when its imaginary part is negligible relative to its modulus.
pub fn real_roots(p: &Polynomial) -> Vec<f64> {
    let coeffs = p.coefficients();
    match p.degree() {
        0 => Vec::new(),
        1 => vec![-coeffs[1] / coeffs[0]],
        degree => {
            let leading = coeffs[0];
            if leading.abs() <= LEADING_ZERO_TOL * coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs())) {
                // numerically degenerate leading term: retry one degree lower
                return real_roots(&Polynomial::new(coeffs[1..].to_vec()));
            }

            let mut companion = DMatrix::<Complex64>::zeros(degree, degree);
            for row in 1..degree {
                companion[(row, row - 1)] = Complex64::new(1.0, 0.0);
            }
            for (column, &c) in coeffs.iter().skip(1).enumerate() {
                companion[(0, column)] = Complex64::new(-c / leading, 0.0);
            }

            match companion.eigenvalues() {
                Some(eigenvalues) => eigenvalues
                    .iter()
                    .filter(|z| z.im.abs() <= IMAGINARY_TOL * (1.0 + z.re.abs()))
                    .map(|z| z.re)
                    .collect(),
                None => {
                    trace!("roots: eigenvalue iteration did not converge for {}", p);
                    Vec::new()
                }
            }
        }
    }
}
