//! A rational formula restricted to an interval with boundary-inclusion flags.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use ndarray::Array1;

use crate::core::error::{BasisError, Result};
use crate::core::quadrature::{Quadrature, QuadratureSettings};
use crate::core::rational::Rational;
use crate::core::roots::real_roots;

/// A closed, open or half-open interval `[lower, upper]` with independent boundary flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl Interval {
    /// Half-open interval `[lower, upper)`.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        Interval::with_flags(lower, upper, true, false)
    }

    /// Closed interval `[lower, upper]`.
    pub fn closed(lower: f64, upper: f64) -> Result<Self> {
        Interval::with_flags(lower, upper, true, true)
    }

    pub fn with_flags(lower: f64, upper: f64, include_lower: bool, include_upper: bool) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(BasisError::InvalidSupport { lower, upper });
        }
        Ok(Interval { lower, upper, include_lower, include_upper })
    }

    /// The whole real line, both (infinite) ends included.
    pub fn everywhere() -> Self {
        Interval {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            include_lower: true,
            include_upper: true,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        let above = if self.include_lower { x >= self.lower } else { x > self.lower };
        let below = if self.include_upper { x <= self.upper } else { x < self.upper };
        above && below
    }

    /// Intersection of two intervals; `None` when they do not meet.
    ///
    /// A bound of the result is included only if both operands include that coordinate.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lower = self.lower.max(other.lower);
        let upper = self.upper.min(other.upper);
        if lower > upper {
            return None;
        }
        Some(Interval {
            lower,
            upper,
            include_lower: self.contains(lower) && other.contains(lower),
            include_upper: self.contains(upper) && other.contains(upper),
        })
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }
}

/// A point strictly inside `(a, b)` that stays finite for unbounded intervals.
pub(crate) fn representative_point(a: f64, b: f64) -> f64 {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => 0.5 * (a + b),
        (false, true) => b - b.abs().max(1.0),
        (true, false) => a + a.abs().max(1.0),
        (false, false) => 0.0,
    }
}

/// Maps `-0.0` to `0.0`.
fn unsigned_zero(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{},{}{}",
            if self.include_lower { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.include_upper { ']' } else { ')' }
        )
    }
}

/// A [`Rational`] that is only active on its support and exactly zero elsewhere.
///
/// Arithmetic between branches acts on the intersection of the two supports. When the
/// supports do not meet the result carries no support at all (`support() == None`) and
/// evaluates to zero everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    formula: Rational,
    support: Option<Interval>,
}

impl Branch {
    pub fn new(formula: impl Into<Rational>, support: Interval) -> Self {
        Branch { formula: formula.into(), support: Some(support) }
    }

    /// Branch on `[lower, upper)`.
    pub fn on(formula: impl Into<Rational>, lower: f64, upper: f64) -> Result<Self> {
        Ok(Branch::new(formula, Interval::new(lower, upper)?))
    }

    /// Constant branch active on the whole real line.
    pub fn constant(value: f64) -> Self {
        Branch::new(value, Interval::everywhere())
    }

    /// Branch without support.
    pub fn empty(formula: impl Into<Rational>) -> Self {
        Branch { formula: formula.into(), support: None }
    }

    pub fn formula(&self) -> &Rational {
        &self.formula
    }

    pub fn support(&self) -> Option<&Interval> {
        self.support.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_none()
    }

    pub fn includes(&self, x: f64) -> bool {
        self.support.map_or(false, |s| s.contains(x))
    }

    /// Formula value inside the support, exactly `0.0` outside it.
    pub fn evaluate(&self, x: f64) -> f64 {
        if self.includes(x) {
            self.formula.evaluate(x)
        } else {
            0.0
        }
    }

    pub fn evaluate_array(&self, xs: &Array1<f64>) -> Array1<f64> {
        xs.mapv(|x| self.evaluate(x))
    }

    pub fn common_support(&self, other: &Branch) -> Option<Interval> {
        match (&self.support, &other.support) {
            (Some(a), Some(b)) => a.intersect(b),
            _ => None,
        }
    }

    pub fn midpoint(&self) -> Option<f64> {
        self.support.map(|s| s.midpoint())
    }

    /// Support rendered as `[a,b)`, or `{}` without support.
    pub fn domain(&self) -> String {
        match &self.support {
            Some(s) => s.to_string(),
            None => "{}".to_string(),
        }
    }

    /// Returns `f(x + h)` on the support moved by `-h`.
    pub fn shift(&self, h: f64) -> Branch {
        Branch {
            formula: self.formula.shift(h),
            support: self.support.map(|s| Interval {
                lower: s.lower - h,
                upper: s.upper - h,
                ..s
            }),
        }
    }

    /// Returns `f(c * x)` on the support divided by `c`. A negative factor mirrors the
    /// support, so the bounds and their flags swap.
    pub fn scale(&self, c: f64) -> Result<Branch> {
        if c == 0.0 || !c.is_finite() {
            return Err(BasisError::InvalidScale(c));
        }
        let support = self.support.map(|s| {
            if c > 0.0 {
                Interval {
                    lower: unsigned_zero(s.lower / c),
                    upper: unsigned_zero(s.upper / c),
                    ..s
                }
            } else {
                Interval {
                    lower: unsigned_zero(s.upper / c),
                    upper: unsigned_zero(s.lower / c),
                    include_lower: s.include_upper,
                    include_upper: s.include_lower,
                }
            }
        });
        Ok(Branch { formula: self.formula.scale(c), support })
    }

    pub fn diff(&self, n: usize) -> Branch {
        Branch { formula: self.formula.diff(n), support: self.support }
    }

    pub fn reciprocal(&self) -> Branch {
        Branch { formula: self.formula.reciprocal(), support: self.support }
    }

    pub fn simplify(&mut self) -> &mut Self {
        self.formula.simplify();
        self
    }

    /// Integral over `[x1, x2]` clipped to the support.
    pub fn integral(&self, x1: f64, x2: f64) -> Quadrature {
        self.integral_with(x1, x2, &QuadratureSettings::default())
    }

    pub fn integral_with(&self, x1: f64, x2: f64, settings: &QuadratureSettings) -> Quadrature {
        if x1 > x2 {
            let q = self.integral_with(x2, x1, settings);
            return Quadrature { value: -q.value, error: q.error };
        }
        match &self.support {
            Some(s) if x1 < s.upper && x2 > s.lower => {
                self.formula
                    .integral_with(x1.max(s.lower), x2.min(s.upper), settings)
            }
            _ => Quadrature::zero(),
        }
    }

    /// Value of largest magnitude attained on the closed support.
    ///
    /// Candidates are the real critical points strictly inside the support and both
    /// endpoints; the formula is evaluated there without the boundary gate. Infinite
    /// endpoints and non-finite values are skipped; when nothing else is left, a finite
    /// point inside the support is used. A branch without support returns `0.0`.
    pub fn extreme(&self) -> f64 {
        let support = match &self.support {
            Some(s) => *s,
            None => return 0.0,
        };

        let derivative = self.formula.diff(1);
        let mut candidates: Vec<f64> = real_roots(derivative.numerator())
            .into_iter()
            .filter(|&r| r > support.lower && r < support.upper)
            .collect();
        candidates.push(support.lower);
        candidates.push(support.upper);

        let mut values: Vec<f64> = candidates
            .into_iter()
            .filter(|x| x.is_finite())
            .map(|x| self.formula.evaluate(x))
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            let x = representative_point(support.lower, support.upper);
            values.push(self.formula.evaluate(x));
            values.retain(|v| v.is_finite());
        }

        let (min, max) = values.into_iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min > max {
            return 0.0;
        }
        if max.abs() >= min.abs() {
            max
        } else {
            min
        }
    }

    pub(crate) fn set_include_upper(&mut self, include: bool) {
        if let Some(s) = self.support.as_mut() {
            s.include_upper = include;
        }
    }

    pub(crate) fn divide_numerator(&mut self, value: f64) {
        self.formula.divide_numerator(value);
    }

    fn combine(&self, other: &Branch, formula: Rational) -> Branch {
        Branch { formula, support: self.common_support(other) }
    }
}

impl From<f64> for Branch {
    fn from(value: f64) -> Self {
        Branch::constant(value)
    }
}

impl<'a> Add<&'a Branch> for &'a Branch {
    type Output = Branch;

    fn add(self, rhs: &'a Branch) -> Branch {
        self.combine(rhs, &self.formula + &rhs.formula)
    }
}

impl<'a> Sub<&'a Branch> for &'a Branch {
    type Output = Branch;

    fn sub(self, rhs: &'a Branch) -> Branch {
        self.combine(rhs, &self.formula - &rhs.formula)
    }
}

impl<'a> Mul<&'a Branch> for &'a Branch {
    type Output = Branch;

    fn mul(self, rhs: &'a Branch) -> Branch {
        self.combine(rhs, &self.formula * &rhs.formula)
    }
}

impl<'a> Div<&'a Branch> for &'a Branch {
    type Output = Branch;

    fn div(self, rhs: &'a Branch) -> Branch {
        self.combine(rhs, &self.formula / &rhs.formula)
    }
}

impl Neg for &Branch {
    type Output = Branch;

    fn neg(self) -> Branch {
        Branch { formula: -&self.formula, support: self.support }
    }
}

macro_rules! impl_branch_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Branch> for Branch {
            type Output = Branch;

            fn $method(self, rhs: Branch) -> Branch {
                (&self).$method(&rhs)
            }
        }

        impl $imp<f64> for &Branch {
            type Output = Branch;

            fn $method(self, rhs: f64) -> Branch {
                self.$method(&Branch::constant(rhs))
            }
        }

        impl $imp<f64> for Branch {
            type Output = Branch;

            fn $method(self, rhs: f64) -> Branch {
                (&self).$method(&Branch::constant(rhs))
            }
        }
    };
}

impl_branch_binop!(Add, add);
impl_branch_binop!(Sub, sub);
impl_branch_binop!(Mul, mul);
impl_branch_binop!(Div, div);

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.formula, self.domain())
    }
}
