use log::debug;
use ndarray::Array1;

use crate::core::branch::{Branch, Interval};
use crate::core::error::{BasisError, Result};
use crate::core::function::PiecewiseFunction;
use crate::core::knots::{KnotIdentity, KnotSequence};
use crate::core::polynomial::Polynomial;
use crate::core::rational::Rational;
use crate::core::registry::Registry;

/// Evaluates the B-spline basis function B_k,m(x) using the Cox-de Boor recursion formula.
///
/// # Arguments
/// * `knots` - Knot sequence T = {t_0, t_1, ...}.
/// * `k` - Index of the basis function (0-indexed).
/// * `m` - Order of the B-spline (degree = m-1).
/// * `x` - Evaluation point.
///
/// # Returns
/// The value of B_k,m(x), or an error if `m` is zero or `t_{k+m}` does not exist.
///
/// Spans are half-open `[t_j, t_{j+1})` except the last non-empty one, which also contains the
/// final knot. Terms whose knot difference is zero are dropped.
pub fn b_spline_basis<K: KnotSequence + ?Sized>(knots: &K, k: usize, m: usize, x: f64) -> Result<f64> {
    if m == 0 {
        return Err(BasisError::InvalidOrder(m));
    }
    if k + m >= knots.len() {
        return Err(BasisError::KnotIndexOutOfBounds { index: k + m, len: knots.len() });
    }
    let last = knots.value_at(knots.len() - 1)?;
    basis_value(knots, k, m, x, last)
}

fn basis_value<K: KnotSequence + ?Sized>(knots: &K, k: usize, m: usize, x: f64, last: f64) -> Result<f64> {
    let t_k = knots.value_at(k)?;
    let t_k1 = knots.value_at(k + 1)?;

    // Base case (m=1, piecewise constant)
    if m == 1 {
        let inside = t_k <= x && x < t_k1;
        let closing = x == last && t_k1 == last && t_k < t_k1;
        return Ok(if inside || closing { 1.0 } else { 0.0 });
    }

    // B_k,m(x) = (x - t_k) / (t_{k+m-1} - t_k) * B_k,m-1(x) +
    //            (t_{k+m} - x) / (t_{k+m} - t_{k+1}) * B_k+1,m-1(x)
    let t_km1 = knots.value_at(k + m - 1)?;
    let t_km = knots.value_at(k + m)?;

    let mut value = 0.0;
    let den1 = t_km1 - t_k;
    if den1 != 0.0 {
        value += (x - t_k) / den1 * basis_value(knots, k, m - 1, x, last)?;
    }
    let den2 = t_km - t_k1;
    if den2 != 0.0 {
        value += (t_km - x) / den2 * basis_value(knots, k + 1, m - 1, x, last)?;
    }
    Ok(value)
}

/// Cache key of a cardinal basis function: order and derivative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardinalKey {
    pub m: usize,
    pub derivative: usize,
}

/// Cache key of a non-uniform basis function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonUniformKey {
    pub knots: KnotIdentity,
    pub m: usize,
    pub k: usize,
    pub derivative: usize,
}

/// Memoized basis functions, one registry per family.
///
/// Pass the same cache to every builder call of a session to share intermediate results.
#[derive(Debug, Clone)]
pub struct BasisCache {
    pub cardinal: Registry<CardinalKey, PiecewiseFunction>,
    pub non_uniform: Registry<NonUniformKey, PiecewiseFunction>,
}

impl BasisCache {
    pub fn new() -> Self {
        BasisCache {
            cardinal: Registry::new("CardinalBSpline"),
            non_uniform: Registry::new("NonUniformBSpline"),
        }
    }

    /// Total number of cached functions.
    pub fn len(&self) -> usize {
        self.cardinal.len() + self.non_uniform.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.cardinal.clear();
        self.non_uniform.clear();
    }
}

impl Default for BasisCache {
    fn default() -> Self {
        BasisCache::new()
    }
}

/// Cardinal B-spline of order `m` on the integer knots `0, 1, ..., m`, or one of its
/// derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct CardinalBSpline {
    m: usize,
    derivative: usize,
    function: PiecewiseFunction,
}

impl CardinalBSpline {
    /// Builds (or fetches from `cache`) the cardinal B-spline of order `m`.
    pub fn new(m: usize, cache: &mut BasisCache) -> Result<Self> {
        let function = cardinal_function(m, cache)?;
        Ok(CardinalBSpline { m, derivative: 0, function })
    }

    pub fn order(&self) -> usize {
        self.m
    }

    pub fn derivative(&self) -> usize {
        self.derivative
    }

    pub fn function(&self) -> &PiecewiseFunction {
        &self.function
    }

    pub fn into_function(self) -> PiecewiseFunction {
        self.function
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.function.evaluate(x)
    }

    pub fn evaluate_array(&self, xs: &Array1<f64>) -> Array1<f64> {
        self.function.evaluate_array(xs)
    }

    /// `n`-th derivative of this function, cached under its absolute derivative order.
    pub fn diff(&self, n: usize, cache: &mut BasisCache) -> CardinalBSpline {
        let key = CardinalKey { m: self.m, derivative: self.derivative + n };
        let function = match cache.cardinal.retrieve(&key) {
            Some(function) => {
                debug!("CardinalBSpline: cache hit for {:?}", key);
                function
            }
            None => {
                debug!("CardinalBSpline: differentiating for {:?}", key);
                let function = self.function.diff(n);
                cache.cardinal.store(key, &function);
                function
            }
        };
        CardinalBSpline { m: self.m, derivative: key.derivative, function }
    }
}

fn cardinal_function(m: usize, cache: &mut BasisCache) -> Result<PiecewiseFunction> {
    let key = CardinalKey { m, derivative: 0 };
    if let Some(function) = cache.cardinal.retrieve(&key) {
        debug!("CardinalBSpline: cache hit for {:?}", key);
        return Ok(function);
    }
    if m == 0 {
        return Err(BasisError::InvalidOrder(m));
    }
    debug!("CardinalBSpline: building {:?}", key);

    let function = if m == 1 {
        PiecewiseFunction::from(Branch::on(1.0, 0.0, 1.0)?)
    } else {
        let lower = cardinal_function(m - 1, cache)?;
        let support = Interval::new(0.0, m as f64)?;
        let scale = Polynomial::constant((m - 1) as f64);
        let rising = PiecewiseFunction::from(Branch::new(
            Rational::new(Polynomial::linear(1.0, 0.0), scale.clone()),
            support,
        ));
        let falling = PiecewiseFunction::from(Branch::new(
            Rational::new(Polynomial::linear(-1.0, m as f64), scale),
            support,
        ));
        let mut sum = &(&rising * &lower) + &(&falling * &lower.shift(-1.0));
        sum.simplify();
        sum
    };

    cache.cardinal.store(key, &function);
    Ok(function)
}

/// B-spline basis function B_k,m on an arbitrary knot sequence, or one of its derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct NonUniformBSpline {
    knots: KnotIdentity,
    m: usize,
    k: usize,
    derivative: usize,
    function: PiecewiseFunction,
}

impl NonUniformBSpline {
    /// Builds (or fetches from `cache`) the basis function of order `m` and index `k`.
    ///
    /// # Arguments
    /// * `knots` - Knot sequence; only its values and identity are read.
    /// * `m` - Order of the basis function (degree = m-1).
    /// * `k` - Index of the basis function, supported on `[t_k, t_{k+m}]`.
    /// * `cache` - Registry shared across builds.
    pub fn new<K: KnotSequence + ?Sized>(
        knots: &K,
        m: usize,
        k: usize,
        cache: &mut BasisCache,
    ) -> Result<Self> {
        let identity = knots.identity();
        let function = non_uniform_function(knots, &identity, m, k, cache)?;
        Ok(NonUniformBSpline { knots: identity, m, k, derivative: 0, function })
    }

    pub fn order(&self) -> usize {
        self.m
    }

    pub fn index(&self) -> usize {
        self.k
    }

    pub fn derivative(&self) -> usize {
        self.derivative
    }

    pub fn function(&self) -> &PiecewiseFunction {
        &self.function
    }

    pub fn into_function(self) -> PiecewiseFunction {
        self.function
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.function.evaluate(x)
    }

    pub fn evaluate_array(&self, xs: &Array1<f64>) -> Array1<f64> {
        self.function.evaluate_array(xs)
    }

    /// `n`-th derivative of this function, cached under its absolute derivative order.
    pub fn diff(&self, n: usize, cache: &mut BasisCache) -> NonUniformBSpline {
        let key = NonUniformKey {
            knots: self.knots.clone(),
            m: self.m,
            k: self.k,
            derivative: self.derivative + n,
        };
        let function = match cache.non_uniform.retrieve(&key) {
            Some(function) => {
                debug!("NonUniformBSpline: cache hit for m={} k={} derivative={}", key.m, key.k, key.derivative);
                function
            }
            None => {
                let function = self.function.diff(n);
                cache.non_uniform.store(key.clone(), &function);
                function
            }
        };
        NonUniformBSpline {
            knots: key.knots,
            m: self.m,
            k: self.k,
            derivative: key.derivative,
            function,
        }
    }
}

fn non_uniform_function<K: KnotSequence + ?Sized>(
    knots: &K,
    identity: &KnotIdentity,
    m: usize,
    k: usize,
    cache: &mut BasisCache,
) -> Result<PiecewiseFunction> {
    let key = NonUniformKey { knots: identity.clone(), m, k, derivative: 0 };
    if let Some(function) = cache.non_uniform.retrieve(&key) {
        debug!("NonUniformBSpline: cache hit for m={} k={}", m, k);
        return Ok(function);
    }
    if m == 0 {
        return Err(BasisError::InvalidOrder(m));
    }
    if k + m >= knots.len() {
        return Err(BasisError::KnotIndexOutOfBounds { index: k + m, len: knots.len() });
    }
    debug!("NonUniformBSpline: building m={} k={}", m, k);

    let t_k = knots.value_at(k)?;
    let t_k1 = knots.value_at(k + 1)?;

    let function = if m == 1 {
        if t_k1 > t_k {
            PiecewiseFunction::from(Branch::on(1.0, t_k, t_k1)?)
        } else {
            PiecewiseFunction::zero()
        }
    } else {
        let t_km1 = knots.value_at(k + m - 1)?;
        let t_km = knots.value_at(k + m)?;

        // A zero knot difference makes the whole term vanish.
        let rising = blend(Polynomial::linear(1.0, -t_k), t_km1 - t_k)
            .map(|c| non_uniform_function(knots, identity, m - 1, k, cache).map(|f| &c * &f))
            .transpose()?;
        let falling = blend(Polynomial::linear(-1.0, t_km), t_km - t_k1)
            .map(|c| non_uniform_function(knots, identity, m - 1, k + 1, cache).map(|f| &c * &f))
            .transpose()?;

        let terms: Vec<PiecewiseFunction> = [rising, falling]
            .into_iter()
            .flatten()
            .filter(|term| !term.is_zero())
            .collect();
        let mut sum = match terms.as_slice() {
            [] => PiecewiseFunction::zero(),
            [single] => single.clone(),
            [first, second, ..] => first + second,
        };
        sum.simplify();
        sum
    };

    cache.non_uniform.store(key, &function);
    Ok(function)
}

/// Blending coefficient `numerator / denominator` valid on the whole real line, or `None`
/// when the knot difference is zero.
fn blend(numerator: Polynomial, denominator: f64) -> Option<PiecewiseFunction> {
    if denominator == 0.0 {
        return None;
    }
    let formula = Rational::new(numerator, Polynomial::constant(denominator));
    Some(PiecewiseFunction::from(Branch::new(formula, Interval::everywhere())))
}
