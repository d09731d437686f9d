//! Piecewise rational algebra and memoized B-spline basis construction.
//!
//! Every basis function is built as an explicit [`PiecewiseFunction`]: an ordered set of
//! [`Branch`]es, each a [`Rational`] valid on one interval. The Cox-de Boor recursion in
//! [`CardinalBSpline`] and [`NonUniformBSpline`] assembles order `m` from order `m - 1`
//! and memoizes every intermediate result in a [`BasisCache`].

pub mod core;

pub use crate::core::branch::{Branch, Interval};
pub use crate::core::error::{BasisError, Result};
pub use crate::core::function::PiecewiseFunction;
pub use crate::core::knots::{KnotIdentity, KnotSequence, KnotVector, Refinement};
pub use crate::core::polynomial::{PolyOperand, Polynomial};
pub use crate::core::quadrature::{Quadrature, QuadratureSettings};
pub use crate::core::rational::Rational;
pub use crate::core::registry::Registry;
pub use crate::core::space::BSplineSpace;
pub use crate::core::splines::{
    b_spline_basis, BasisCache, CardinalBSpline, CardinalKey, NonUniformBSpline, NonUniformKey,
};
