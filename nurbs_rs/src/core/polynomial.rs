//! Dense univariate polynomials with coefficients stored highest degree first.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use ndarray::Array1;

use crate::core::error::{BasisError, Result};

/// A real polynomial `c_0 x^n + c_1 x^(n-1) + ... + c_n`.
///
/// Leading zero coefficients are dropped on construction, so `degree()` is the true degree
/// and the zero polynomial is stored as `[0.0]`. Every operation returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

/// Right-hand side accepted by [`Polynomial::divide`].
#[derive(Debug, Clone, PartialEq)]
pub enum PolyOperand {
    Scalar(f64),
    Polynomial(Polynomial),
}

impl From<f64> for PolyOperand {
    fn from(value: f64) -> Self {
        PolyOperand::Scalar(value)
    }
}

impl From<Polynomial> for PolyOperand {
    fn from(value: Polynomial) -> Self {
        PolyOperand::Polynomial(value)
    }
}

impl Polynomial {
    /// Creates a polynomial from coefficients in decreasing order of power.
    ///
    /// # Arguments
    /// * `coefficients` - `[1.0, 2.0, 3.0]` represents `x^2 + 2x + 3`.
    pub fn new(coefficients: Vec<f64>) -> Self {
        let first_nonzero = coefficients
            .iter()
            .position(|&c| c != 0.0)
            .unwrap_or(coefficients.len());
        let mut coefficients = coefficients;
        coefficients.drain(..first_nonzero);
        if coefficients.is_empty() {
            coefficients.push(0.0);
        }
        Polynomial { coefficients }
    }

    pub fn constant(value: f64) -> Self {
        Polynomial::new(vec![value])
    }

    pub fn zero() -> Self {
        Polynomial::constant(0.0)
    }

    pub fn one() -> Self {
        Polynomial::constant(1.0)
    }

    /// `slope * x + intercept`
    pub fn linear(slope: f64, intercept: f64) -> Self {
        Polynomial::new(vec![slope, intercept])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn leading_coefficient(&self) -> f64 {
        self.coefficients[0]
    }

    pub fn constant_term(&self) -> f64 {
        self.coefficients[self.coefficients.len() - 1]
    }

    /// True when every coefficient is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|&c| c == 0.0)
    }

    /// Evaluates the polynomial at `x` with Horner's scheme.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .fold(0.0, |acc, &c| f64::mul_add(acc, x, c))
    }

    pub fn evaluate_array(&self, xs: &Array1<f64>) -> Array1<f64> {
        xs.mapv(|x| self.evaluate(x))
    }

    /// Raises the polynomial to a non-negative integer power.
    pub fn pow(&self, power: u32) -> Polynomial {
        (0..power).fold(Polynomial::one(), |acc, _| &acc * self)
    }

    /// Returns the `n`-th derivative.
    pub fn diff(&self, n: usize) -> Polynomial {
        let mut coefficients = self.coefficients.clone();
        for _ in 0..n {
            let degree = coefficients.len() - 1;
            if degree == 0 {
                return Polynomial::zero();
            }
            coefficients = coefficients[..degree]
                .iter()
                .enumerate()
                .map(|(i, &c)| (degree - i) as f64 * c)
                .collect();
        }
        Polynomial::new(coefficients)
    }

    /// Returns `p(x + h)` through the Taylor expansion `sum_n p^(n)(x) h^n / n!`.
    ///
    /// The expansion is evaluated with explicit derivatives and factorials, so round-off
    /// grows with the degree and with `|h|`.
    pub fn shift(&self, h: f64) -> Polynomial {
        let mut shifted = self.clone();
        let mut factorial = 1.0;
        for n in 1..=self.degree() {
            factorial *= n as f64;
            shifted = &shifted + &(self.diff(n) * (h.powi(n as i32) / factorial));
        }
        shifted
    }

    /// Returns `p(c * x)`.
    pub fn scale(&self, c: f64) -> Polynomial {
        let degree = self.degree();
        Polynomial::new(
            self.coefficients
                .iter()
                .enumerate()
                .map(|(i, &coef)| coef * c.powi((degree - i) as i32))
                .collect(),
        )
    }

    /// Divides by a scalar. Dividing by another polynomial is refused; a quotient of
    /// polynomials must be built as a `Rational`.
    pub fn divide(&self, rhs: impl Into<PolyOperand>) -> Result<Polynomial> {
        match rhs.into() {
            PolyOperand::Scalar(value) => Ok(self / value),
            PolyOperand::Polynomial(_) => Err(BasisError::UnsupportedOperation {
                operation: "Polynomial division",
                hint: "use a Rational for a quotient of polynomials",
            }),
        }
    }

    /// Drops the constant coefficient, i.e. divides by `x` when the constant term is zero.
    pub(crate) fn without_constant_term(&self) -> Polynomial {
        Polynomial::new(self.coefficients[..self.coefficients.len() - 1].to_vec())
    }

    fn zip_with(&self, other: &Polynomial, op: impl Fn(f64, f64) -> f64) -> Polynomial {
        let n = self.coefficients.len().max(other.coefficients.len());
        let offset_a = n - self.coefficients.len();
        let offset_b = n - other.coefficients.len();
        let coefficients = (0..n)
            .map(|i| {
                let a = if i >= offset_a { self.coefficients[i - offset_a] } else { 0.0 };
                let b = if i >= offset_b { other.coefficients[i - offset_b] } else { 0.0 };
                op(a, b)
            })
            .collect();
        Polynomial::new(coefficients)
    }
}

impl From<f64> for Polynomial {
    fn from(value: f64) -> Self {
        Polynomial::constant(value)
    }
}

impl<'a> Add<&'a Polynomial> for &'a Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &'a Polynomial) -> Polynomial {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<'a> Sub<&'a Polynomial> for &'a Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &'a Polynomial) -> Polynomial {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<'a> Mul<&'a Polynomial> for &'a Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &'a Polynomial) -> Polynomial {
        let mut coefficients = vec![0.0; self.coefficients.len() + rhs.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            for (j, &b) in rhs.coefficients.iter().enumerate() {
                coefficients[i + j] += a * b;
            }
        }
        Polynomial::new(coefficients)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| -c).collect())
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

impl Mul<f64> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: f64) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| c * rhs).collect())
    }
}

impl Div<f64> for &Polynomial {
    type Output = Polynomial;

    fn div(self, rhs: f64) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| c / rhs).collect())
    }
}

impl Add<f64> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: f64) -> Polynomial {
        self + &Polynomial::constant(rhs)
    }
}

impl Sub<f64> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: f64) -> Polynomial {
        self - &Polynomial::constant(rhs)
    }
}

// Owned operands delegate to the borrowed implementations.
macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Polynomial> for Polynomial {
            type Output = Polynomial;

            fn $method(self, rhs: Polynomial) -> Polynomial {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $imp<&'a Polynomial> for Polynomial {
            type Output = Polynomial;

            fn $method(self, rhs: &'a Polynomial) -> Polynomial {
                (&self).$method(rhs)
            }
        }

        impl $imp<f64> for Polynomial {
            type Output = Polynomial;

            fn $method(self, rhs: f64) -> Polynomial {
                (&self).$method(rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl Div<f64> for Polynomial {
    type Output = Polynomial;

    fn div(self, rhs: f64) -> Polynomial {
        &self / rhs
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let degree = self.degree();
        let mut first = true;
        for (i, &c) in self.coefficients.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            let power = degree - i;
            if first {
                if c < 0.0 {
                    write!(f, "-")?;
                }
                first = false;
            } else {
                write!(f, " {} ", if c < 0.0 { '-' } else { '+' })?;
            }
            let magnitude = c.abs();
            if magnitude != 1.0 || power == 0 {
                write!(f, "{}", magnitude)?;
            }
            match power {
                0 => {}
                1 => write!(f, "x")?,
                _ => write!(f, "x^{}", power)?,
            }
        }
        Ok(())
    }
}
