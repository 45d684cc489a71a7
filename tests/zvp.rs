// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! End-to-end tests of the analysis pipeline on the 64-bit test curve.

use std::collections::BTreeMap;
use std::time::Duration;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use ec_zvp::distinguish::evaluate_at;
use ec_zvp::{
    catalog, execute, lookup, zvp_points, zvp_test_curve, CoordinateModel, Deadline, Distinguisher,
    Error, FactorSet, FilterPolicy, Poly,
};

#[test]
fn every_catalog_formula_agrees_with_affine_arithmetic() {
    let curve = zvp_test_curve().unwrap();
    let field = curve.field();
    let g = curve.generator();
    let h = curve.mul(&BigUint::from(11u32), g);

    for formula in catalog().unwrap() {
        let (p1, p2) = (g, &h);
        let mut bindings = BTreeMap::new();
        for (i, point) in [p1, p2].iter().enumerate().take(formula.arity()) {
            let (x, y) = point.coordinates().unwrap();
            let [xv, yv, zv] = formula.model().input_variables(i + 1);
            bindings.insert(xv, x.clone());
            bindings.insert(yv, y.clone());
            bindings.insert(zv, BigUint::from(1u32));
        }
        bindings.insert("a".to_owned(), curve.a().clone());
        bindings.insert("b".to_owned(), curve.b().clone());

        let trace = execute(&formula, &bindings, field).unwrap();
        let outputs: Vec<&BigUint> = trace.outputs().iter().map(|(_, v)| v).collect();
        let (x3, y3, z3) = (outputs[0], outputs[1], outputs[2]);
        assert!(!z3.is_zero(), "{} produced a zero Z", formula.name());

        let expected = if formula.arity() == 2 {
            curve.add(g, &h)
        } else {
            curve.double(g)
        };
        let (ex, ey) = expected.coordinates().unwrap();
        let zi = field.invert(z3);
        let (ax, ay) = match formula.model() {
            CoordinateModel::Projective => (field.mul(x3, &zi), field.mul(y3, &zi)),
            CoordinateModel::Jacobian => {
                let zi2 = field.mul(&zi, &zi);
                let zi3 = field.mul(&zi2, &zi);
                (field.mul(x3, &zi2), field.mul(y3, &zi3))
            }
        };
        assert_eq!(&ax, ex, "{} x mismatch", formula.name());
        assert_eq!(&ay, ey, "{} y mismatch", formula.name());
    }
}

#[test]
fn unified_and_chord_addition_are_distinguishable() {
    // The worked distinguishing experiment: projective add-2007-bl
    // reads y1 + y2 (among others), Jacobian add-1986-cc reads
    // x2 - x1 and y2 - y1 instead, so a swept zero-value input must
    // separate them on this curve.
    let curve = zvp_test_curve().unwrap();
    let mut rng = rand::thread_rng();
    let bl = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
    let cc = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();

    let result = Distinguisher::new(&curve)
        .with_multipliers(vec![2, 3, 4, 5, 6])
        .distinguish(&bl, &cc, &mut rng)
        .unwrap()
        .expect("the formulas expose different factor sets on this curve");
    assert!(result.distinguishes());
    assert!(curve.is_on_curve(&result.point().point));

    // The verdict must hold row by row under fresh coordinate
    // randomization: the hit formula keeps its witnessed zero and the
    // clean formula stays clean, for every lift.
    let q = curve.mul(
        &BigUint::from(result.point().multiplier),
        &result.point().point,
    );
    for _ in 0..4 {
        for formula in [&bl, &cc] {
            let row = evaluate_at(formula, &curve, &result.point().point, &q, &mut rng).unwrap();
            let witnessed = result
                .rows()
                .iter()
                .find(|r| r.model == row.model && r.formula == row.formula)
                .unwrap();
            assert_eq!(
                row.has_zero(),
                witnessed.has_zero(),
                "{} changed its verdict under a fresh lift",
                formula.name()
            );
        }
    }
}

#[test]
fn randomized_lifts_preserve_each_formulas_verdict() {
    // A lift scales every homogeneous intermediate by a nonzero factor,
    // so a vanishing intermediate vanishes in every lift and a clean
    // execution is clean in every lift.
    let curve = zvp_test_curve().unwrap();
    let field = curve.field();
    let mut rng = rand::thread_rng();
    let bl = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
    let cc = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();

    // y1 + y2 is in add-2007-bl's factor set and not in add-1986-cc's;
    // pick a point of it that leaves the chord formula clean.
    let target = Poly::variable("y1").add(&Poly::variable("y2"), field);
    let points = zvp_points(&target, &curve, 3, Deadline::none()).unwrap();
    let z = points
        .iter()
        .find(|z| {
            let q = curve.mul(&BigUint::from(z.multiplier), &z.point);
            !evaluate_at(&cc, &curve, &z.point, &q, &mut rng)
                .unwrap()
                .has_zero()
        })
        .expect("a y1 + y2 point that add-1986-cc computes through cleanly");
    let q = curve.mul(&BigUint::from(z.multiplier), &z.point);

    for _ in 0..16 {
        assert!(evaluate_at(&bl, &curve, &z.point, &q, &mut rng)
            .unwrap()
            .has_zero());
        assert!(!evaluate_at(&cc, &curve, &z.point, &q, &mut rng)
            .unwrap()
            .has_zero());
    }
}

#[test]
fn a_formula_never_distinguishes_itself() {
    let curve = zvp_test_curve().unwrap();
    let mut rng = rand::thread_rng();
    let bl = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
    let result = Distinguisher::new(&curve)
        .distinguish(&bl, &bl, &mut rng)
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn zero_value_points_are_sound() {
    // Every point the constructor returns must actually zero its
    // condition at (P, kP), checked through an independent evaluation.
    let curve = zvp_test_curve().unwrap();
    let field = curve.field();
    let f_bl = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
    let f_cc = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();
    let bl = FactorSet::compute(&f_bl, field, FilterPolicy::default(), Deadline::none()).unwrap();
    let cc = FactorSet::compute(&f_cc, field, FilterPolicy::default(), Deadline::none()).unwrap();

    let mut total = 0usize;
    for condition in bl.difference(&cc) {
        for k in [2u64, 3, 4] {
            let points = match zvp_points(&condition, &curve, k, Deadline::none()) {
                Ok(points) => points,
                Err(e) if e.kind() == ec_zvp::ErrorKind::Domain => continue,
                Err(e) => panic!("unexpected error: {}", e),
            };
            for z in points {
                total += 1;
                let p = &z.point;
                let q = curve.mul(&BigUint::from(z.multiplier), p);
                let (px, py) = p.coordinates().unwrap();
                let (qx, qy) = q.coordinates().unwrap();
                let mut assignment = BTreeMap::new();
                assignment.insert("x1".to_owned(), px.clone());
                assignment.insert("y1".to_owned(), py.clone());
                assignment.insert("x2".to_owned(), qx.clone());
                assignment.insert("y2".to_owned(), qy.clone());
                assignment.insert("a".to_owned(), curve.a().clone());
                assignment.insert("b".to_owned(), curve.b().clone());
                assert!(condition.evaluate(&assignment, field).unwrap().is_zero());
                assert!(curve.is_on_curve(p));
            }
        }
    }
    // The difference set contains y1 + y2 and friends; at least one
    // (condition, k) pair yields points over this curve.
    assert!(total > 0);
}

#[test]
fn zvp_search_is_deterministic() {
    let curve = zvp_test_curve().unwrap();
    let field = curve.field();
    let q = Poly::variable("y1").add(&Poly::variable("y2"), field);
    let first = zvp_points(&q, &curve, 3, Deadline::none()).unwrap();
    let second = zvp_points(&q, &curve, 3, Deadline::none()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn exhausted_deadline_surfaces_as_timeout() {
    let curve = zvp_test_curve().unwrap();
    let mut rng = rand::thread_rng();
    let bl = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
    let cc = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();
    let err = Distinguisher::new(&curve)
        .with_deadline(Deadline::after(Duration::ZERO))
        .distinguish(&bl, &cc, &mut rng)
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[test]
fn multiplier_wraps_around_the_group_order() {
    let curve = zvp_test_curve().unwrap();
    let field = curve.field();
    let order = curve.order().to_u64().unwrap();
    let q = Poly::variable("x1").sub(&Poly::variable("x2"), field);
    let small = zvp_points(&q, &curve, 2, Deadline::none()).unwrap();
    let wrapped = zvp_points(&q, &curve, order + 2, Deadline::none()).unwrap();
    assert_eq!(small, wrapped);
}
