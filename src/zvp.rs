// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Construction of zero-value points for a factor-set condition.
//!
//! Given a condition `q(x1, y1, x2, y2, a, b)` from a factor set, a
//! curve fixing `a` and `b`, and a multiplier `k` tying the second
//! input to the first by `Q = kP`, this module finds the affine points
//! `P` for which the condition vanishes when the formula is run on
//! `(P, kP)`.
//!
//! The pipeline: bind the curve parameters, rewrite `x2` and `y2`
//! through the multiplication-by-`k` rational maps of
//! [`crate::divpoly`], clear denominators into a single element
//! `A(x) + y·B(x)` of the curve's coordinate ring, eliminate `y` via
//! the norm `U = A^2 - (x^3 + ax + b)·B^2`, find the roots of `U` over
//! the base field, lift each root to curve points, and finally verify
//! every candidate by evaluating the original condition at the concrete
//! coordinate assignment. Clearing denominators can introduce spurious
//! roots (the map's denominators vanish on `k`-torsion abscissae); the
//! verification step removes them.
//!
//! An empty result is a meaningful outcome: the condition has no
//! zero-value point on this curve for this `k`. Only a condition that
//! vanishes *identically* under the substitution is an error
//! ([`Error::DegenerateTarget`]), since its zero set would be the whole
//! curve.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::{debug, info};

use crate::curve::{AffinePoint, WeierstrassCurve};
use crate::deadline::Deadline;
use crate::divpoly::{self, CurveRing, MultiplicationMap, RingElem};
use crate::errors::Error;
use crate::field::PrimeField;
use crate::poly::{Monomial, Poly};
use crate::uni::{self, UniPoly};

/// A point at which a formula intermediate vanishes, together with the
/// discrete-log relation and the condition it satisfies.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZvpPoint {
    /// The first formula input `P`; the second is `multiplier * P`.
    pub point: AffinePoint,
    /// The multiplier `k` of the relation `Q = kP`, reduced modulo the
    /// group order.
    pub multiplier: u64,
    /// The vanishing condition, rendered as a polynomial in
    /// `x1, y1, x2, y2, a, b`.
    pub condition: String,
}

impl fmt::Display for ZvpPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.point.coordinates() {
            None => write!(f, "identity"),
            Some((x, y)) => write!(
                f,
                "({:#x}, {:#x}) with Q = {}P zeroes {}",
                x, y, self.multiplier, self.condition
            ),
        }
    }
}

/// Find all affine points `P` on `curve` such that `condition`
/// vanishes at `(P, kP)`.
///
/// `k` is reduced modulo the group order first; a reduction to zero or
/// one leaves no usable relation and fails with
/// [`Error::UnsupportedMultiplier`].
pub fn zvp_points(
    condition: &Poly,
    curve: &WeierstrassCurve,
    k: u64,
    deadline: Deadline,
) -> Result<BTreeSet<ZvpPoint>, Error> {
    let field = curve.field();
    let k_reduced = reduce_multiplier(k, curve)?;

    let bound = bind_parameters(condition, curve);
    for v in bound.variables() {
        if v != "x1" && v != "y1" && v != "x2" && v != "y2" {
            return Err(Error::UnboundVariable { name: v });
        }
    }

    let ring = CurveRing::new(field.clone(), curve.a().clone(), curve.b().clone());
    let needs_map = bound.degree_in("x2") > 0 || bound.degree_in("y2") > 0;
    let map = if needs_map {
        Some(divpoly::multiplication_map(&ring, k_reduced, deadline)?)
    } else {
        None
    };

    let elem = substitute(&bound, &ring, map.as_ref(), deadline)?;
    // Norm to eliminate y: U(x) = A^2 - f * B^2 vanishes at the
    // abscissa of every curve point where A + yB does.
    let norm = elem
        .even()
        .mul(elem.even(), field)
        .sub(&elem.odd().mul(elem.odd(), field).mul(ring.rhs(), field), field);
    if norm.is_zero() {
        return Err(Error::DegenerateTarget);
    }
    let roots = uni::roots(&norm, field, deadline)?;
    debug!(roots = roots.len(), degree = ?norm.degree(), "norm polynomial solved");

    let mut out = BTreeSet::new();
    let k_big = BigUint::from(k_reduced);
    for x in &roots {
        deadline.check("candidate verification")?;
        for p in curve.lift_x(x) {
            let q_point = curve.mul(&k_big, &p);
            let (qx, qy) = match q_point.coordinates() {
                // kP = identity: the relation degenerates at this point
                None => continue,
                Some(c) => c,
            };
            let (px, py) = match p.coordinates() {
                None => continue,
                Some(c) => c,
            };
            let mut assignment = BTreeMap::new();
            assignment.insert("x1".to_owned(), px.clone());
            assignment.insert("y1".to_owned(), py.clone());
            assignment.insert("x2".to_owned(), qx.clone());
            assignment.insert("y2".to_owned(), qy.clone());
            assignment.insert("a".to_owned(), curve.a().clone());
            assignment.insert("b".to_owned(), curve.b().clone());
            if !condition.evaluate(&assignment, field)?.is_zero() {
                continue;
            }
            out.insert(ZvpPoint {
                point: p,
                multiplier: k_reduced,
                condition: condition.to_string(),
            });
        }
    }
    info!(
        condition = %condition,
        k = k_reduced,
        points = out.len(),
        "zero-value point search finished"
    );
    Ok(out)
}

/// Reduce `k` modulo the group order and reject degenerate relations.
fn reduce_multiplier(k: u64, curve: &WeierstrassCurve) -> Result<u64, Error> {
    let reduced = BigUint::from(k) % curve.order();
    let reduced = reduced
        .to_u64()
        .ok_or(Error::Internal("reduced multiplier exceeds u64"))?;
    if reduced < 2 {
        return Err(Error::UnsupportedMultiplier { k });
    }
    Ok(reduced)
}

/// Substitute the concrete curve parameters for the variables `a`, `b`.
fn bind_parameters(q: &Poly, curve: &WeierstrassCurve) -> Poly {
    let field = curve.field();
    let terms = q.terms().map(|(m, c)| {
        let mut coeff = c.clone();
        let mut monomial = Monomial::one();
        for v in m.variables() {
            let e = m.exponent(v);
            match v {
                "a" => coeff = field.mul(&coeff, &field.pow(curve.a(), &BigUint::from(e))),
                "b" => coeff = field.mul(&coeff, &field.pow(curve.b(), &BigUint::from(e))),
                _ => {
                    for _ in 0..e {
                        monomial = monomial.mul(&Monomial::variable(v));
                    }
                }
            }
        }
        (monomial, coeff)
    });
    Poly::from_terms(terms, field)
}

/// Rewrite a condition in `x1, y1, x2, y2` as a single coordinate-ring
/// element, clearing the multiplication-map denominators.
///
/// With `x2 = N_x/D_x` and `y2 = y * N_y/D_y`, every term is multiplied
/// through by the common denominator `D_x^{deg_{x2}} * D_y^{deg_{y2}}`,
/// and all powers of `y` (from `y1` directly and from `y2`) reduce via
/// `y^2 = x^3 + ax + b`.
fn substitute(
    q: &Poly,
    ring: &CurveRing,
    map: Option<&MultiplicationMap>,
    deadline: Deadline,
) -> Result<RingElem, Error> {
    let field = ring.field();
    let dx = q.degree_in("x2");
    let dy = q.degree_in("y2");

    let mut acc = ring.zero();
    for (m, c) in q.terms() {
        deadline.check("condition substitution")?;
        let e_x1 = m.exponent("x1");
        let e_y1 = m.exponent("y1");
        let e_x2 = m.exponent("x2");
        let e_y2 = m.exponent("y2");

        let mut uni = UniPoly::monomial(c.clone(), e_x1 as usize);
        if let Some(map) = map {
            uni = uni.mul(&uni_pow(map.x_num(), e_x2, field), field);
            uni = uni.mul(&uni_pow(map.x_den(), dx - e_x2, field), field);
            uni = uni.mul(&uni_pow(map.y_num(), e_y2, field), field);
            uni = uni.mul(&uni_pow(map.y_den(), dy - e_y2, field), field);
        }
        // total power of y carried by this term
        let y_power = e_y1 + e_y2;
        uni = uni.mul(&uni_pow(ring.rhs(), y_power / 2, field), field);

        let term = if y_power % 2 == 0 {
            ring.elem(uni, UniPoly::zero())
        } else {
            ring.elem(UniPoly::zero(), uni)
        };
        acc = ring.add(&acc, &term);
    }
    Ok(acc)
}

fn uni_pow(base: &UniPoly, e: u32, field: &PrimeField) -> UniPoly {
    let mut acc = UniPoly::one();
    for _ in 0..e {
        acc = acc.mul(base, field);
    }
    acc
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::zvp_test_curve;

    fn var(name: &str) -> Poly {
        Poly::variable(name)
    }

    #[test]
    fn recovers_point_from_known_target_abscissa() {
        let curve = zvp_test_curve().unwrap();
        let f = curve.field();
        let g = curve.generator();
        let two_g = curve.mul(&BigUint::from(2u32), g);
        let (tx, _) = two_g.coordinates().unwrap();

        // x2 - x(2G) vanishes exactly when the second input has the
        // abscissa of 2G; with k = 2 the generator must be a solution.
        let q = var("x2").sub(&Poly::constant(tx, f), f);
        let points = zvp_points(&q, &curve, 2, Deadline::none()).unwrap();
        assert!(points.iter().any(|z| &z.point == g));
        for z in &points {
            assert_eq!(z.multiplier, 2);
            assert!(curve.is_on_curve(&z.point));
        }
    }

    #[test]
    fn absence_of_solutions_is_an_empty_set() {
        let curve = zvp_test_curve().unwrap();
        let f = curve.field();
        // x1 = x(2P) requires 3P = identity; the group order is a prime
        // other than 3, so no such point exists.
        let q = var("x1").sub(&var("x2"), f);
        let points = zvp_points(&q, &curve, 2, Deadline::none()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn quadratic_nonresidue_condition_has_no_points() {
        let curve = zvp_test_curve().unwrap();
        let f = curve.field();
        // x1^2 + 1 has no roots: p ≡ 3 (mod 4), so -1 is a nonresidue.
        let q = var("x1")
            .sqr(f)
            .add(&Poly::constant(&BigUint::from(1u32), f), f);
        let points = zvp_points(&q, &curve, 2, Deadline::none()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn curve_equation_condition_is_degenerate() {
        let curve = zvp_test_curve().unwrap();
        let f = curve.field();
        // y2^2 - x2^3 - a*x2 - b holds identically on the curve.
        let q = var("y2")
            .sqr(f)
            .sub(&var("x2").pow(3, f), f)
            .sub(&var("a").mul(&var("x2"), f), f)
            .sub(&var("b"), f);
        let err = zvp_points(&q, &curve, 3, Deadline::none()).unwrap_err();
        assert_eq!(err, Error::DegenerateTarget);
    }

    #[test]
    fn multiplier_reduces_modulo_group_order() {
        let curve = zvp_test_curve().unwrap();
        let q = var("y1");
        let order = curve.order().to_u64().unwrap();

        // k = order reduces to 0, k = order + 1 reduces to 1.
        for k in [0, 1, order, order + 1] {
            let err = zvp_points(&q, &curve, k, Deadline::none()).unwrap_err();
            assert_eq!(err, Error::UnsupportedMultiplier { k });
        }
        // k = order + 2 is the same relation as k = 2.
        let base = zvp_points(&q, &curve, 2, Deadline::none()).unwrap();
        let wrapped = zvp_points(&q, &curve, order + 2, Deadline::none()).unwrap();
        assert_eq!(base, wrapped);
    }

    #[test]
    fn first_point_conditions_skip_the_multiplication_map() {
        let curve = zvp_test_curve().unwrap();
        // y1 = 0 needs a rational 2-torsion point; the group order is an
        // odd prime, so there is none.
        let q = var("y1");
        let points = zvp_points(&q, &curve, 5, Deadline::none()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn foreign_variables_are_rejected() {
        let curve = zvp_test_curve().unwrap();
        let q = var("x3");
        let err = zvp_points(&q, &curve, 2, Deadline::none()).unwrap_err();
        assert_eq!(err, Error::UnboundVariable { name: "x3".to_owned() });
    }
}
