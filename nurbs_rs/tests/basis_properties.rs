use approx::assert_abs_diff_eq;
use ndarray::Array1;
use nurbs_rs::{
    b_spline_basis, BSplineSpace, BasisCache, Branch, CardinalBSpline, Interval, KnotSequence,
    KnotVector, NonUniformBSpline, PiecewiseFunction, Polynomial, Rational, Refinement,
};

const TOL: f64 = 1e-9;

#[test]
fn polynomial_addition_is_invertible() {
    let p = Polynomial::new(vec![0.25, -3.0, 2.0, 1.0]);
    let q = Polynomial::new(vec![5.0, 0.0, -1.5]);
    let r = (&p + &q) - &q;
    for x in Array1::linspace(-4.0, 4.0, 17).iter() {
        assert_abs_diff_eq!(r.evaluate(*x), p.evaluate(*x), epsilon = 1e-9);
    }
}

#[test]
fn polynomial_shift_round_trip() {
    let p = Polynomial::new(vec![2.0, 0.0, -1.0, 0.5]);
    for h in [-3.0, 0.0, 1.5, 10.0] {
        let back = p.shift(h).shift(-h);
        assert_eq!(back.degree(), p.degree());
        for (a, b) in back.coefficients().iter().zip(p.coefficients()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-8);
        }
    }
}

#[test]
fn rational_derivative_integrates_back() {
    // (x^2 + 1) / (x + 3) on [0, 2], away from the pole at -3
    let r = Rational::new(Polynomial::new(vec![1.0, 0.0, 1.0]), Polynomial::linear(1.0, 3.0));
    let q = r.diff(1).integral(0.0, 2.0);
    assert_abs_diff_eq!(q.value, r.evaluate(2.0) - r.evaluate(0.0), epsilon = 1e-8);
}

#[test]
fn branch_boundary_gating() {
    let formula = Rational::new(Polynomial::linear(2.0, 1.0), Polynomial::one());
    let branch = Branch::new(formula, Interval::with_flags(0.0, 2.0, true, false).unwrap());
    assert_abs_diff_eq!(branch.evaluate(0.0), 1.0, epsilon = TOL);
    assert_eq!(branch.evaluate(2.0), 0.0);
    assert_eq!(branch.evaluate(-0.001), 0.0);
}

#[test]
fn branch_common_support() {
    let a = Branch::new(1.0, Interval::with_flags(0.0, 2.0, true, false).unwrap());
    let b = Branch::new(1.0, Interval::with_flags(1.0, 3.0, true, true).unwrap());
    let support = a.common_support(&b).unwrap();
    assert_eq!((support.lower, support.upper), (1.0, 2.0));
    assert!(support.include_lower);
    assert!(!support.include_upper);

    let sum = &a + &b;
    assert_eq!(sum.support(), Some(&support));
    assert_abs_diff_eq!(sum.evaluate(1.5), 2.0, epsilon = TOL);
}

#[test]
fn cardinal_quadratic_at_knot() {
    let mut cache = BasisCache::new();
    // order 2 (piecewise linear) peaks at its middle knot
    let hat = CardinalBSpline::new(2, &mut cache).unwrap();
    assert_abs_diff_eq!(hat.evaluate(1.0), 1.0, epsilon = TOL);
    // order 3 (piecewise quadratic) on knots {0, 1, 2, 3}
    let quadratic = CardinalBSpline::new(3, &mut cache).unwrap();
    assert_abs_diff_eq!(quadratic.evaluate(1.0), 0.5, epsilon = TOL);
    assert_abs_diff_eq!(quadratic.evaluate(1.5), 0.75, epsilon = TOL);
}

#[test]
fn partition_of_unity_on_clamped_knots() {
    let mut cache = BasisCache::new();
    for degree in 1..=4 {
        let t = KnotVector::clamped(degree, (0.0, 1.0))
            .unwrap()
            .insert_knots(&[0.3, 0.6])
            .unwrap();
        let basis: Vec<NonUniformBSpline> = t
            .valid_function_keys()
            .map(|k| NonUniformBSpline::new(&t, degree + 1, k, &mut cache).unwrap())
            .collect();
        for x in Array1::linspace(0.0, 1.0, 41).iter() {
            let total: f64 = basis.iter().map(|b| b.evaluate(*x)).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn piecewise_and_direct_evaluation_agree() {
    let mut cache = BasisCache::new();
    let t = KnotVector::uniform(3, (0.0, 2.0), 3)
        .unwrap()
        .refine(1, Refinement::Bisect)
        .unwrap();
    let space = BSplineSpace::new(&t, &mut cache).unwrap();
    for x in [0.01, 0.37, 0.8, 1.1, 1.63, 1.99] {
        let values = space.evaluate(x);
        for (k, value) in values.iter().enumerate() {
            let direct = b_spline_basis(&t, k, t.degree() + 1, x).unwrap();
            assert_abs_diff_eq!(*value, direct, epsilon = 1e-9);
        }
    }
}

#[test]
fn repeated_knots_do_not_fail() {
    let mut cache = BasisCache::new();
    // interior knot of full multiplicity plus clamped ends
    let t = KnotVector::clamped(2, (0.0, 2.0))
        .unwrap()
        .insert_knots(&[1.0, 1.0, 1.0])
        .unwrap();
    for k in t.valid_function_keys() {
        let b = NonUniformBSpline::new(&t, 3, k, &mut cache).unwrap();
        assert!(b.evaluate(0.5).is_finite());
        assert!(b.evaluate(1.5).is_finite());
    }
    let space = BSplineSpace::new(&t, &mut cache).unwrap();
    assert_abs_diff_eq!(space.evaluate(0.5).sum(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(space.evaluate(1.5).sum(), 1.0, epsilon = 1e-9);

    // at the full-multiplicity knot the function ending there keeps its closed right end,
    // while the pointwise recursion only counts the span starting there
    assert_abs_diff_eq!(space.evaluate(1.0).sum(), 2.0, epsilon = 1e-9);
    let direct: f64 = t
        .valid_function_keys()
        .map(|k| b_spline_basis(&t, k, 3, 1.0).unwrap())
        .sum();
    assert_abs_diff_eq!(direct, 1.0, epsilon = 1e-9);
}

#[test]
fn merge_keeps_adjacent_branches_and_is_idempotent() {
    let f = PiecewiseFunction::new(vec![
        Branch::on(Polynomial::linear(1.0, 0.0), 0.0, 1.0).unwrap(),
        Branch::on(Polynomial::linear(-1.0, 2.0), 1.0, 2.0).unwrap(),
    ]);
    assert_eq!(f.nr_branches(), 2);
    let again = f.merge_branches();
    assert_eq!(again, f);
    assert_eq!(again.merge_branches(), f);
}

#[test]
fn memoized_results_are_independent() {
    let mut cache = BasisCache::new();
    let t = KnotVector::uniform(2, (0.0, 1.0), 2).unwrap();
    let first = NonUniformBSpline::new(&t, 3, 1, &mut cache).unwrap();
    let second = NonUniformBSpline::new(&t, 3, 1, &mut cache).unwrap();
    assert_eq!(first, second);

    // consuming and rescaling one copy leaves the other and the cache untouched
    let mut changed = first.into_function();
    changed = &changed * 10.0;
    changed.simplify();
    assert!((changed.evaluate(0.4) - 10.0 * second.evaluate(0.4)).abs() < TOL);

    let third = NonUniformBSpline::new(&t, 3, 1, &mut cache).unwrap();
    assert_eq!(third, second);
}

#[test]
fn cache_distinguishes_degree_in_knot_identity() {
    let mut cache = BasisCache::new();
    let values = Array1::linspace(0.0, 1.0, 6);
    let linear = KnotVector::from_knots(1, values.clone()).unwrap();
    let quadratic = KnotVector::from_knots(2, values).unwrap();
    assert_ne!(linear.identity(), quadratic.identity());

    let a = NonUniformBSpline::new(&linear, 2, 0, &mut cache).unwrap();
    let cached = cache.non_uniform.len();
    let b = NonUniformBSpline::new(&quadratic, 2, 0, &mut cache).unwrap();
    // same values, but a separate set of cache entries
    assert!(cache.non_uniform.len() > cached);
    assert_abs_diff_eq!(a.evaluate(0.1), b.evaluate(0.1), epsilon = TOL);
}

#[test]
fn derivatives_are_cached_per_order() {
    let mut cache = BasisCache::new();
    let quartic = CardinalBSpline::new(5, &mut cache).unwrap();
    let base = cache.len();
    let d1 = quartic.diff(1, &mut cache);
    let d2 = quartic.diff(2, &mut cache);
    assert_eq!(cache.len(), base + 2);

    // chaining reaches the same cached entry as the direct request
    let chained = d1.diff(1, &mut cache);
    assert_eq!(cache.len(), base + 2);
    assert_eq!(chained.function(), d2.function());

    // the derivative of a cardinal B-spline integrates to zero over its support
    assert_abs_diff_eq!(d1.function().integral(0.0, 5.0).value, 0.0, epsilon = 1e-9);
}

#[test]
fn normalize_scales_to_unit_extreme() {
    let mut cache = BasisCache::new();
    let b = CardinalBSpline::new(4, &mut cache).unwrap();
    // the cubic cardinal B-spline peaks at 2/3
    assert_abs_diff_eq!(b.function().extreme(), 2.0 / 3.0, epsilon = 1e-9);
    let normalized = b.function().normalize();
    assert_abs_diff_eq!(normalized.evaluate(2.0), 1.0, epsilon = 1e-9);
}
