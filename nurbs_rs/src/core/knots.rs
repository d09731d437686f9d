use ndarray::Array1;

use crate::core::error::{BasisError, Result};

/// Read-only view of an ordered knot sequence as consumed by the basis builders.
///
/// Keys are 0-based positions. The basis function with key `k` of order `degree + 1` is
/// supported on `[t_k, t_{k + degree + 1}]`.
pub trait KnotSequence {
    /// Knot value at `key`.
    fn value_at(&self, key: usize) -> Result<f64>;

    /// Parameter interval on which the basis functions are evaluated.
    fn domain(&self) -> (f64, f64);

    fn degree(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest key that generates a basis function.
    fn kmin(&self) -> usize {
        0
    }

    /// Largest key that generates a basis function: `len - degree - 2`.
    fn kmax(&self) -> usize {
        self.len().saturating_sub(self.degree() + 2)
    }

    /// Structural identity used as part of cache keys.
    fn identity(&self) -> KnotIdentity;
}

/// Value-based identity of a knot sequence: its degree and the bit patterns of its knots.
///
/// Two sequences with identical knots but different degrees produce different identities.
/// `-0.0` and `0.0` are treated as the same knot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KnotIdentity {
    degree: usize,
    knots: Vec<u64>,
}

impl KnotIdentity {
    pub fn new(degree: usize, knots: impl IntoIterator<Item = f64>) -> Self {
        let knots = knots
            .into_iter()
            .map(|t| if t == 0.0 { 0.0_f64.to_bits() } else { t.to_bits() })
            .collect();
        KnotIdentity { degree, knots }
    }
}

/// Knot refinement strategies of [`KnotVector::refine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// Insert the midpoint of every non-empty span once.
    Bisect,
    /// Insert the midpoint of every non-empty span `degree` times.
    H,
    /// Raise the degree by one and repeat every distinct knot once, per iteration.
    P,
}

/// An owned, validated knot vector with a polynomial degree.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotVector {
    degree: usize,
    domain: (f64, f64),
    knots: Array1<f64>,
}

impl KnotVector {
    /// Clamped knot vector: each end of `domain` repeated `degree + 1` times.
    pub fn clamped(degree: usize, domain: (f64, f64)) -> Result<Self> {
        KnotVector::uniform(degree, domain, 0)
    }

    /// Clamped knot vector with `num_internal` equally spaced interior knots.
    ///
    /// # Arguments
    /// * `degree` - Polynomial degree (order - 1).
    /// * `domain` - Interval `(lower, upper)` with `lower < upper`.
    /// * `num_internal` - Number of knots placed strictly between the domain ends.
    ///
    /// # Returns
    /// A `Result` containing the knot vector of length `2 * (degree + 1) + num_internal`.
    pub fn uniform(degree: usize, domain: (f64, f64), num_internal: usize) -> Result<Self> {
        validate_domain(domain)?;
        let (lower, upper) = domain;
        let repeat = degree + 1;

        let mut knots = Vec::with_capacity(2 * repeat + num_internal);
        knots.extend(std::iter::repeat(lower).take(repeat));
        let step = (upper - lower) / (num_internal + 1) as f64;
        knots.extend((1..=num_internal).map(|i| lower + i as f64 * step));
        knots.extend(std::iter::repeat(upper).take(repeat));

        Ok(KnotVector { degree, domain, knots: Array1::from(knots) })
    }

    /// Wraps an arbitrary knot sequence. The domain is `[t_degree, t_{len - degree - 1}]`.
    ///
    /// # Returns
    /// An error if the sequence is too short, not sorted, contains NaN, or leaves a basis
    /// function with an empty support.
    pub fn from_knots(degree: usize, knots: Array1<f64>) -> Result<Self> {
        validate_knots(&knots, degree)?;
        let domain = (knots[degree], knots[knots.len() - degree - 1]);
        validate_domain(domain)?;
        Ok(KnotVector { degree, domain, knots })
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.knots
    }

    /// Number of basis functions of order `degree + 1`.
    pub fn nr_functions(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Keys `kmin..=kmax`.
    pub fn valid_function_keys(&self) -> std::ops::RangeInclusive<usize> {
        self.kmin()..=self.kmax()
    }

    /// Number of knots exactly equal to `value`.
    pub fn multiplicity(&self, value: f64) -> usize {
        self.knots.iter().filter(|&&t| t == value).count()
    }

    /// Key `k` with `t_k <= x < t_{k+1}`, or `None` when no span contains `x`.
    pub fn find_span(&self, x: f64) -> Option<usize> {
        (0..self.knots.len() - 1).find(|&k| self.knots[k] <= x && x < self.knots[k + 1])
    }

    /// Returns a copy with `values` merged into the sorted knots.
    pub fn insert_knots(&self, values: &[f64]) -> Result<KnotVector> {
        let (lower, upper) = self.domain;
        if let Some(&value) = values.iter().find(|&&v| !(lower <= v && v <= upper)) {
            return Err(BasisError::KnotOutsideDomain { value, lower, upper });
        }
        self.with_inserted(self.degree, values)
    }

    /// Returns a copy refined `times` times with the given strategy.
    pub fn refine(&self, times: usize, method: Refinement) -> Result<KnotVector> {
        match method {
            Refinement::Bisect | Refinement::H => {
                let copies = if method == Refinement::Bisect { 1 } else { self.degree };
                let mut refined = self.clone();
                for _ in 0..times {
                    let midpoints: Vec<f64> = refined
                        .knots
                        .to_vec()
                        .windows(2)
                        .filter(|span| span[1] > span[0])
                        .flat_map(|span| std::iter::repeat(0.5 * (span[0] + span[1])).take(copies))
                        .collect();
                    refined = refined.insert_knots(&midpoints)?;
                }
                Ok(refined)
            }
            Refinement::P => {
                let mut distinct = self.knots.to_vec();
                distinct.dedup();
                let repeated: Vec<f64> = (0..times).flat_map(|_| distinct.iter().copied()).collect();
                self.with_inserted(self.degree + times, &repeated)
            }
        }
    }

    fn with_inserted(&self, degree: usize, values: &[f64]) -> Result<KnotVector> {
        let mut knots = self.knots.to_vec();
        knots.extend_from_slice(values);
        knots.sort_by(f64::total_cmp);
        let knots = Array1::from(knots);
        validate_knots(&knots, degree)?;
        Ok(KnotVector { degree, domain: self.domain, knots })
    }
}

impl KnotSequence for KnotVector {
    fn value_at(&self, key: usize) -> Result<f64> {
        self.knots
            .get(key)
            .copied()
            .ok_or(BasisError::KnotIndexOutOfBounds { index: key, len: self.knots.len() })
    }

    fn domain(&self) -> (f64, f64) {
        self.domain
    }

    fn degree(&self) -> usize {
        self.degree
    }

    fn len(&self) -> usize {
        self.knots.len()
    }

    fn identity(&self) -> KnotIdentity {
        KnotIdentity::new(self.degree, self.knots.iter().copied())
    }
}

fn validate_domain(domain: (f64, f64)) -> Result<()> {
    let (lower, upper) = domain;
    if !(lower.is_finite() && upper.is_finite() && lower < upper) {
        return Err(BasisError::InvalidDomain { lower, upper });
    }
    Ok(())
}

/// Validates a knot vector for basis functions of order `degree + 1`.
///
/// # Arguments
/// * `knots` - The knot vector to validate.
/// * `degree` - Polynomial degree of the basis functions.
///
/// # Returns
/// `Ok(())` if the knot vector is valid.
pub fn validate_knots(knots: &Array1<f64>, degree: usize) -> Result<()> {
    let order = degree + 1;
    if knots.len() < order + 1 {
        return Err(BasisError::InvalidKnotVector(format!(
            "Expected at least {} knots for degree {}, got {}.",
            order + 1,
            degree,
            knots.len()
        )));
    }
    if let Some(index) = knots.iter().position(|t| t.is_nan()) {
        return Err(BasisError::InvalidKnotVector(format!("Knot at index {} is NaN.", index)));
    }

    for i in 0..(knots.len() - 1) {
        if knots[i] > knots[i + 1] {
            return Err(BasisError::UnsortedKnots { index: i, left: knots[i], right: knots[i + 1] });
        }
    }

    // Every basis function B_j needs t_{j+order} > t_j.
    for j in 0..(knots.len() - order) {
        if knots[j + order] <= knots[j] {
            return Err(BasisError::InvalidKnotVector(format!(
                "Basis function {} has an empty support: t_{} = t_{} = {}.",
                j,
                j,
                j + order,
                knots[j]
            )));
        }
    }

    Ok(())
}
