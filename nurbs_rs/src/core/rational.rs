//! Rational functions `N(x) / D(x)` over [`Polynomial`] numerator and denominator.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use ndarray::Array1;

use crate::core::polynomial::Polynomial;
use crate::core::quadrature::{integrate, Quadrature, QuadratureSettings};

/// Quotient of two polynomials.
///
/// The denominator is expected to be non-zero but this is not enforced: evaluation follows
/// IEEE division and yields infinities or NaN at poles. Equality is structural, so `x / x`
/// and `1 / 1` compare unequal.
#[derive(Debug, Clone, PartialEq)]
pub struct Rational {
    numerator: Polynomial,
    denominator: Polynomial,
}

impl Rational {
    pub fn new(numerator: Polynomial, denominator: Polynomial) -> Self {
        Rational { numerator, denominator }
    }

    pub fn from_polynomial(numerator: Polynomial) -> Self {
        Rational::new(numerator, Polynomial::one())
    }

    pub fn constant(value: f64) -> Self {
        Rational::from_polynomial(Polynomial::constant(value))
    }

    pub fn zero() -> Self {
        Rational::constant(0.0)
    }

    pub fn numerator(&self) -> &Polynomial {
        &self.numerator
    }

    pub fn denominator(&self) -> &Polynomial {
        &self.denominator
    }

    pub fn into_parts(self) -> (Polynomial, Polynomial) {
        (self.numerator, self.denominator)
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.numerator.evaluate(x) / self.denominator.evaluate(x)
    }

    pub fn evaluate_array(&self, xs: &Array1<f64>) -> Array1<f64> {
        xs.mapv(|x| self.evaluate(x))
    }

    /// Returns `D / N`.
    pub fn reciprocal(&self) -> Rational {
        Rational::new(self.denominator.clone(), self.numerator.clone())
    }

    pub fn pow(&self, power: u32) -> Rational {
        Rational::new(self.numerator.pow(power), self.denominator.pow(power))
    }

    /// Returns `f(x + h)`.
    pub fn shift(&self, h: f64) -> Rational {
        Rational::new(self.numerator.shift(h), self.denominator.shift(h))
    }

    /// Returns `f(c * x)`.
    pub fn scale(&self, c: f64) -> Rational {
        Rational::new(self.numerator.scale(c), self.denominator.scale(c))
    }

    /// Returns the `n`-th derivative by applying the quotient rule `n` times:
    /// `(N, D) -> (N'D - ND', D^2)`.
    ///
    /// No common factors are cancelled, so the denominator degree doubles at every step.
    pub fn diff(&self, n: usize) -> Rational {
        let mut numerator = self.numerator.clone();
        let mut denominator = self.denominator.clone();
        for _ in 0..n {
            let next = &(&numerator.diff(1) * &denominator) - &(&numerator * &denominator.diff(1));
            denominator = denominator.pow(2);
            numerator = next;
        }
        Rational::new(numerator, denominator)
    }

    /// Definite integral over `[x1, x2]` with the default quadrature settings.
    pub fn integral(&self, x1: f64, x2: f64) -> Quadrature {
        self.integral_with(x1, x2, &QuadratureSettings::default())
    }

    pub fn integral_with(&self, x1: f64, x2: f64, settings: &QuadratureSettings) -> Quadrature {
        integrate(|x| self.evaluate(x), x1, x2, settings)
    }

    /// Cancels a shared factor `x` (both constant terms zero) and makes the denominator's
    /// leading coefficient 1.
    pub fn simplify(&mut self) -> &mut Self {
        if self.numerator.constant_term() == 0.0
            && self.denominator.constant_term() == 0.0
            && !self.denominator.is_zero()
        {
            self.numerator = self.numerator.without_constant_term();
            self.denominator = self.denominator.without_constant_term();
        }

        let leading = self.denominator.leading_coefficient();
        if leading != 0.0 && leading != 1.0 {
            self.numerator = &self.numerator / leading;
            self.denominator = &self.denominator / leading;
        }
        self
    }

    /// Divides the numerator by `value`, leaving the denominator untouched.
    pub(crate) fn divide_numerator(&mut self, value: f64) {
        self.numerator = &self.numerator / value;
    }
}

impl From<f64> for Rational {
    fn from(value: f64) -> Self {
        Rational::constant(value)
    }
}

impl From<Polynomial> for Rational {
    fn from(value: Polynomial) -> Self {
        Rational::from_polynomial(value)
    }
}

impl<'a> Add<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn add(self, rhs: &'a Rational) -> Rational {
        let numerator = &(&self.numerator * &rhs.denominator) + &(&self.denominator * &rhs.numerator);
        Rational::new(numerator, &self.denominator * &rhs.denominator)
    }
}

impl<'a> Sub<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn sub(self, rhs: &'a Rational) -> Rational {
        self + &(-rhs)
    }
}

impl<'a> Mul<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn mul(self, rhs: &'a Rational) -> Rational {
        Rational::new(
            &self.numerator * &rhs.numerator,
            &self.denominator * &rhs.denominator,
        )
    }
}

impl<'a> Div<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn div(self, rhs: &'a Rational) -> Rational {
        self * &rhs.reciprocal()
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational::new(-&self.numerator, self.denominator.clone())
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        -&self
    }
}

macro_rules! impl_rational_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $imp<&'a Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: &'a Rational) -> Rational {
                (&self).$method(rhs)
            }
        }

        impl $imp<f64> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: f64) -> Rational {
                self.$method(&Rational::constant(rhs))
            }
        }

        impl $imp<f64> for Rational {
            type Output = Rational;

            fn $method(self, rhs: f64) -> Rational {
                (&self).$method(&Rational::constant(rhs))
            }
        }
    };
}

impl_rational_binop!(Add, add);
impl_rational_binop!(Sub, sub);
impl_rational_binop!(Mul, mul);
impl_rational_binop!(Div, div);

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) / ({})", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-9;

    fn x_over_x_plus_one() -> Rational {
        Rational::new(Polynomial::linear(1.0, 0.0), Polynomial::linear(1.0, 1.0))
    }

    #[test]
    fn test_evaluate_follows_ieee_at_poles() {
        let r = Rational::new(Polynomial::linear(1.0, 0.0), Polynomial::linear(1.0, -1.0));
        assert!((r.evaluate(2.0) - 2.0).abs() < TOL);
        assert_eq!(r.evaluate(1.0), f64::INFINITY);

        let zero_over_zero = Rational::new(Polynomial::zero(), Polynomial::zero());
        assert!(zero_over_zero.evaluate(0.5).is_nan());
    }

    #[test]
    fn test_arithmetic() {
        let r = x_over_x_plus_one();
        let s = Rational::constant(2.0);
        for x in [-0.5, 0.0, 0.5, 3.0] {
            let fx = x / (x + 1.0);
            assert_abs_diff_eq!((&r + &s).evaluate(x), fx + 2.0, epsilon = TOL);
            assert_abs_diff_eq!((&r - &s).evaluate(x), fx - 2.0, epsilon = TOL);
            assert_abs_diff_eq!((&r * &s).evaluate(x), fx * 2.0, epsilon = TOL);
            assert_abs_diff_eq!((&s / &r).evaluate(x + 1.0), 2.0 * (x + 2.0) / (x + 1.0), epsilon = TOL);
            assert_abs_diff_eq!((-&r).evaluate(x), -fx, epsilon = TOL);
            assert_abs_diff_eq!(r.pow(2).evaluate(x), fx * fx, epsilon = TOL);
        }
        assert_abs_diff_eq!((r.clone() * 3.0).evaluate(1.0), 1.5, epsilon = TOL);
    }

    #[test]
    fn test_reciprocal_swaps_parts() {
        let r = x_over_x_plus_one();
        let inv = r.reciprocal();
        assert_eq!(inv.numerator(), r.denominator());
        assert_eq!(inv.denominator(), r.numerator());
    }

    #[test]
    fn test_shift_and_scale() {
        let r = x_over_x_plus_one();
        let shifted = r.shift(2.0);
        let scaled = r.scale(3.0);
        for x in [0.0, 0.5, 1.0] {
            assert_abs_diff_eq!(shifted.evaluate(x), r.evaluate(x + 2.0), epsilon = TOL);
            assert_abs_diff_eq!(scaled.evaluate(x), r.evaluate(3.0 * x), epsilon = TOL);
        }
    }

    #[test]
    fn test_diff_quotient_rule() {
        // d/dx x/(x+1) = 1/(x+1)^2
        let r = x_over_x_plus_one();
        let dr = r.diff(1);
        for x in [0.0, 0.5, 2.0] {
            assert_abs_diff_eq!(dr.evaluate(x), 1.0 / (x + 1.0).powi(2), epsilon = TOL);
        }
        // second derivative: -2/(x+1)^3, with denominator degree 4
        let d2r = r.diff(2);
        assert_eq!(d2r.denominator().degree(), 4);
        for x in [0.0, 0.5, 2.0] {
            assert_abs_diff_eq!(d2r.evaluate(x), -2.0 / (x + 1.0).powi(3), epsilon = TOL);
        }
        assert_eq!(r.diff(0), r);
    }

    #[test]
    fn test_integral_of_derivative_recovers_difference() {
        let r = Rational::new(
            Polynomial::new(vec![1.0, -2.0, 3.0]),
            Polynomial::new(vec![1.0, 0.0, 4.0]),
        );
        let (a, b) = (-1.0, 2.5);
        let q = r.diff(1).integral(a, b);
        assert_abs_diff_eq!(q.value, r.evaluate(b) - r.evaluate(a), epsilon = 1e-7);
        assert!(q.error < 1e-6);
    }

    #[test]
    fn test_simplify_cancels_x_and_normalizes() {
        // (2x^2 + 4x) / (2x) -> (x + 2) / 1
        let mut r = Rational::new(
            Polynomial::new(vec![2.0, 4.0, 0.0]),
            Polynomial::new(vec![2.0, 0.0]),
        );
        r.simplify();
        assert_eq!(r.numerator().coefficients(), &[1.0, 2.0]);
        assert_eq!(r.denominator().coefficients(), &[1.0]);

        // constant denominator is folded into the numerator
        let mut s = Rational::new(Polynomial::linear(1.0, -0.5), Polynomial::constant(0.5));
        s.simplify();
        assert_eq!(s.numerator().coefficients(), &[2.0, -1.0]);
        assert_eq!(s.denominator().coefficients(), &[1.0]);
    }

    #[test]
    fn test_display() {
        assert_eq!(x_over_x_plus_one().to_string(), "(x) / (x + 1)");
    }
}
