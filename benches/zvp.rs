// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

#[macro_use]
extern crate criterion;

use criterion::Criterion;

use ec_zvp::{
    lookup, zvp_points, zvp_test_curve, CoordinateModel, Deadline, FactorSet, FilterPolicy, Poly,
};

mod factor_set_benches {
    use super::*;

    fn addition_factor_set(c: &mut Criterion) {
        let curve = zvp_test_curve().unwrap();
        let formula = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
        c.bench_function("factor set: projective add-2007-bl", move |b| {
            b.iter(|| {
                FactorSet::compute(
                    &formula,
                    curve.field(),
                    FilterPolicy::default(),
                    Deadline::none(),
                )
                .unwrap()
            })
        });
    }

    fn doubling_factor_set(c: &mut Criterion) {
        let curve = zvp_test_curve().unwrap();
        let formula = lookup(CoordinateModel::Jacobian, "dbl-2007-bl").unwrap();
        c.bench_function("factor set: jacobian dbl-2007-bl", move |b| {
            b.iter(|| {
                FactorSet::compute(
                    &formula,
                    curve.field(),
                    FilterPolicy::default(),
                    Deadline::none(),
                )
                .unwrap()
            })
        });
    }

    criterion_group! {
        name = factor_set_benches;
        config = Criterion::default();
        targets = addition_factor_set, doubling_factor_set,
    }
}

mod zvp_benches {
    use super::*;

    fn zvp_point_search(c: &mut Criterion) {
        let curve = zvp_test_curve().unwrap();
        let field = curve.field();
        let condition = Poly::variable("y1").add(&Poly::variable("y2"), field);
        c.bench_function("zvp points: y1 + y2, k = 3", move |b| {
            b.iter(|| zvp_points(&condition, &curve, 3, Deadline::none()).unwrap())
        });
    }

    criterion_group! {
        name = zvp_benches;
        config = Criterion::default();
        targets = zvp_point_search,
    }
}

criterion_main!(
    factor_set_benches::factor_set_benches,
    zvp_benches::zvp_benches,
);
