//! Piecewise rational functions: an ordered list of [`Branch`]es kept in a canonical
//! one-branch-per-interval form.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use log::trace;
use ndarray::Array1;

use crate::core::branch::{representative_point, Branch, Interval};
use crate::core::error::{BasisError, Result};
use crate::core::quadrature::{Quadrature, QuadratureSettings};
use crate::core::rational::Rational;

/// A function defined branch by branch over the real line.
///
/// After construction (and after `+`) the branches are merged: consecutive breakpoints
/// delimit disjoint intervals `[a, b)` carrying one branch each, sub-intervals whose
/// combined numerator vanishes are pruned, a branch followed by a gap includes its right
/// bound and the last branch always does. Branch-wise transforms (`shift`, `scale`, `diff`,
/// `reciprocal`) keep the partition as is.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseFunction {
    branches: Vec<Branch>,
}

impl PiecewiseFunction {
    /// Builds a function from possibly overlapping branches and merges them.
    pub fn new(branches: Vec<Branch>) -> Self {
        PiecewiseFunction { branches: merge(&branches) }
    }

    /// Builds a function from `n + 1` breakpoints and `n` formulas, the `i`-th formula
    /// active on `[breakpoints[i], breakpoints[i + 1])`.
    ///
    /// # Arguments
    /// * `breakpoints` - Non-decreasing interval bounds.
    /// * `formulas` - One formula per interval.
    ///
    /// # Returns
    /// * `Result<PiecewiseFunction>` - The merged function, or an error if the lengths do not
    ///   match or a pair of breakpoints is not ordered.
    pub fn from_pieces(breakpoints: &[f64], formulas: Vec<Rational>) -> Result<Self> {
        if breakpoints.len() != formulas.len() + 1 {
            return Err(BasisError::LengthMismatch {
                what: "breakpoints",
                expected: formulas.len() + 1,
                actual: breakpoints.len(),
            });
        }
        let branches = formulas
            .into_iter()
            .zip(breakpoints.windows(2))
            .map(|(formula, bounds)| Branch::on(formula, bounds[0], bounds[1]))
            .collect::<Result<Vec<_>>>()?;
        Ok(PiecewiseFunction::new(branches))
    }

    /// Constant function on the whole real line.
    pub fn constant(value: f64) -> Self {
        PiecewiseFunction { branches: vec![Branch::constant(value)] }
    }

    /// The explicit zero function: a single zero branch on `[0, 1]`.
    pub fn zero() -> Self {
        let unit = Interval {
            lower: 0.0,
            upper: 1.0,
            include_lower: true,
            include_upper: true,
        };
        PiecewiseFunction { branches: vec![Branch::new(0.0, unit)] }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn nr_branches(&self) -> usize {
        self.branches.len()
    }

    /// Sorted unique support bounds of all branches.
    pub fn breakpoints(&self) -> Vec<f64> {
        breakpoints_of(self.branches.iter())
    }

    pub fn nr_breakpoints(&self) -> usize {
        self.breakpoints().len()
    }

    /// True when every branch has an identically zero numerator.
    pub fn is_zero(&self) -> bool {
        self.branches.iter().all(|branch| branch.formula().numerator().is_zero())
    }

    /// Smallest lower bound and largest upper bound over all branches.
    pub fn support(&self) -> Option<(f64, f64)> {
        self.branches
            .iter()
            .filter_map(Branch::support)
            .fold(None, |acc, s| match acc {
                None => Some((s.lower, s.upper)),
                Some((lo, hi)) => Some((f64::min(lo, s.lower), f64::max(hi, s.upper))),
            })
    }

    /// Branches active inside `(a, b)`, judged at a representative point of the interval.
    /// The whole real line selects every branch.
    pub fn branches_in_interval(&self, a: f64, b: f64) -> Vec<&Branch> {
        if a == f64::NEG_INFINITY && b == f64::INFINITY {
            return self.branches.iter().collect();
        }
        let x = representative_point(a, b);
        self.branches.iter().filter(|branch| branch.includes(x)).collect()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.branches.iter().map(|branch| branch.evaluate(x)).sum()
    }

    pub fn evaluate_array(&self, xs: &Array1<f64>) -> Array1<f64> {
        xs.mapv(|x| self.evaluate(x))
    }

    /// Re-runs the canonical merge. Merging an already merged function is a no-op.
    pub fn merge_branches(&self) -> PiecewiseFunction {
        PiecewiseFunction::new(self.branches.clone())
    }

    pub fn shift(&self, h: f64) -> PiecewiseFunction {
        self.map_branches(|branch| branch.shift(h))
    }

    /// Returns `f(c * x)`. A negative factor mirrors the function; branches stay ordered
    /// left to right.
    pub fn scale(&self, c: f64) -> Result<PiecewiseFunction> {
        let mut branches = self
            .branches
            .iter()
            .map(|branch| branch.scale(c))
            .collect::<Result<Vec<_>>>()?;
        if c < 0.0 {
            branches.reverse();
        }
        Ok(PiecewiseFunction { branches })
    }

    pub fn diff(&self, n: usize) -> PiecewiseFunction {
        self.map_branches(|branch| branch.diff(n))
    }

    pub fn reciprocal(&self) -> PiecewiseFunction {
        self.map_branches(Branch::reciprocal)
    }

    pub fn simplify(&mut self) -> &mut Self {
        for branch in &mut self.branches {
            branch.simplify();
        }
        self
    }

    /// Definite integral over `[x1, x2]`, summed branch by branch.
    pub fn integral(&self, x1: f64, x2: f64) -> Quadrature {
        self.integral_with(x1, x2, &QuadratureSettings::default())
    }

    pub fn integral_with(&self, x1: f64, x2: f64, settings: &QuadratureSettings) -> Quadrature {
        self.branches
            .iter()
            .map(|branch| branch.integral_with(x1, x2, settings))
            .fold(Quadrature::zero(), |acc, q| acc + q)
    }

    /// Value of largest magnitude over all branches.
    pub fn extreme(&self) -> f64 {
        self.branches
            .iter()
            .map(Branch::extreme)
            .fold(0.0, |best, v| if v.abs() > best.abs() { v } else { best })
    }

    /// Divides every numerator by [`extreme`](Self::extreme) so the largest magnitude
    /// becomes 1. A function whose extreme is zero is returned unchanged.
    pub fn normalize(&self) -> PiecewiseFunction {
        let extreme = self.extreme();
        let mut normalized = self.clone();
        if extreme == 0.0 {
            return normalized;
        }
        for branch in &mut normalized.branches {
            branch.divide_numerator(extreme);
        }
        normalized
    }

    fn map_branches(&self, f: impl Fn(&Branch) -> Branch) -> PiecewiseFunction {
        PiecewiseFunction { branches: self.branches.iter().map(f).collect() }
    }
}

/// Sorted unique bounds of every branch that has a support.
fn breakpoints_of<'a>(branches: impl Iterator<Item = &'a Branch>) -> Vec<f64> {
    let mut points: Vec<f64> = branches
        .filter_map(Branch::support)
        .flat_map(|s| [s.lower, s.upper])
        .collect();
    points.sort_by(f64::total_cmp);
    points.dedup();
    points
}

fn merge(branches: &[Branch]) -> Vec<Branch> {
    let breakpoints = breakpoints_of(branches.iter());
    let mut merged: Vec<Branch> = Vec::with_capacity(breakpoints.len());

    for bounds in breakpoints.windows(2) {
        let (a, b) = (bounds[0], bounds[1]);
        let x = representative_point(a, b);
        let formula = branches
            .iter()
            .filter(|branch| branch.includes(x))
            .fold(None, |acc: Option<Rational>, branch| match acc {
                None => Some(branch.formula().clone()),
                Some(sum) => Some(&sum + branch.formula()),
            });

        match formula {
            Some(formula) if !formula.numerator().is_zero() => {
                let support = Interval {
                    lower: a,
                    upper: b,
                    include_lower: true,
                    include_upper: false,
                };
                merged.push(Branch::new(formula, support));
            }
            Some(_) => trace!("merge: dropping cancelled interval [{}, {})", a, b),
            None => trace!("merge: no branch covers [{}, {})", a, b),
        }
    }

    if merged.is_empty() {
        return PiecewiseFunction::zero().branches;
    }

    for i in 0..merged.len() - 1 {
        let upper = merged[i].support().map(|s| s.upper);
        let next_lower = merged[i + 1].support().map(|s| s.lower);
        if let (Some(upper), Some(next_lower)) = (upper, next_lower) {
            if next_lower > upper {
                merged[i].set_include_upper(true);
            }
        }
    }
    if let Some(last) = merged.last_mut() {
        last.set_include_upper(true);
    }
    merged
}

impl From<f64> for PiecewiseFunction {
    fn from(value: f64) -> Self {
        PiecewiseFunction::constant(value)
    }
}

impl From<Branch> for PiecewiseFunction {
    fn from(branch: Branch) -> Self {
        PiecewiseFunction::new(vec![branch])
    }
}

impl<'a> Add<&'a PiecewiseFunction> for &'a PiecewiseFunction {
    type Output = PiecewiseFunction;

    fn add(self, rhs: &'a PiecewiseFunction) -> PiecewiseFunction {
        let branches: Vec<Branch> = self.branches.iter().chain(&rhs.branches).cloned().collect();
        PiecewiseFunction::new(branches)
    }
}

impl<'a> Sub<&'a PiecewiseFunction> for &'a PiecewiseFunction {
    type Output = PiecewiseFunction;

    fn sub(self, rhs: &'a PiecewiseFunction) -> PiecewiseFunction {
        self + &(-rhs)
    }
}

impl<'a> Mul<&'a PiecewiseFunction> for &'a PiecewiseFunction {
    type Output = PiecewiseFunction;

    /// Multiplies interval by interval over the union of both breakpoint sets. An interval
    /// covered by only one operand is zero in the product.
    fn mul(self, rhs: &'a PiecewiseFunction) -> PiecewiseFunction {
        let breakpoints = breakpoints_of(self.branches.iter().chain(&rhs.branches));
        let mut products = Vec::new();
        for bounds in breakpoints.windows(2) {
            let (a, b) = (bounds[0], bounds[1]);
            let x = representative_point(a, b);
            let left = self.branches.iter().find(|branch| branch.includes(x));
            let right = rhs.branches.iter().find(|branch| branch.includes(x));
            match (left, right) {
                (Some(l), Some(r)) => {
                    let support = Interval {
                        lower: a,
                        upper: b,
                        include_lower: true,
                        include_upper: false,
                    };
                    products.push(Branch::new(l.formula() * r.formula(), support));
                }
                _ => trace!("product: interval [{}, {}) is not covered by both operands", a, b),
            }
        }
        if products.is_empty() {
            return PiecewiseFunction::zero();
        }
        PiecewiseFunction::new(products)
    }
}

impl<'a> Div<&'a PiecewiseFunction> for &'a PiecewiseFunction {
    type Output = PiecewiseFunction;

    fn div(self, rhs: &'a PiecewiseFunction) -> PiecewiseFunction {
        self * &rhs.reciprocal()
    }
}

impl Neg for &PiecewiseFunction {
    type Output = PiecewiseFunction;

    fn neg(self) -> PiecewiseFunction {
        self.map_branches(|branch| -branch)
    }
}

impl Neg for PiecewiseFunction {
    type Output = PiecewiseFunction;

    fn neg(self) -> PiecewiseFunction {
        -&self
    }
}

macro_rules! impl_function_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<PiecewiseFunction> for PiecewiseFunction {
            type Output = PiecewiseFunction;

            fn $method(self, rhs: PiecewiseFunction) -> PiecewiseFunction {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $imp<&'a PiecewiseFunction> for PiecewiseFunction {
            type Output = PiecewiseFunction;

            fn $method(self, rhs: &'a PiecewiseFunction) -> PiecewiseFunction {
                (&self).$method(rhs)
            }
        }

        impl $imp<f64> for &PiecewiseFunction {
            type Output = PiecewiseFunction;

            fn $method(self, rhs: f64) -> PiecewiseFunction {
                self.$method(&PiecewiseFunction::constant(rhs))
            }
        }

        impl $imp<f64> for PiecewiseFunction {
            type Output = PiecewiseFunction;

            fn $method(self, rhs: f64) -> PiecewiseFunction {
                (&self).$method(&PiecewiseFunction::constant(rhs))
            }
        }
    };
}

impl_function_binop!(Add, add);
impl_function_binop!(Sub, sub);
impl_function_binop!(Mul, mul);
impl_function_binop!(Div, div);

impl fmt::Display for PiecewiseFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, branch) in self.branches.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", branch)?;
        }
        Ok(())
    }
}
