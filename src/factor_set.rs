// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Factor sets: the zero-value conditions a formula can expose.
//!
//! A formula's factor set is computed by executing it symbolically in
//! affine-lifted form (every `Zi = 1`, coordinates as free variables
//! `x1, y1, x2, y2`, curve parameters as `a`, `b`), collecting every
//! intermediate polynomial of the trace, filtering out those that can
//! never distinguish anything, and factoring the survivors into monic
//! irreducible-ish pieces. Any point assignment zeroing one of these
//! factors zeroes the corresponding intermediate of the real
//! computation, which is exactly the event a zero-value side channel
//! observes.
//!
//! Filtered out by default:
//!
//! * the zero polynomial (the intermediate is identically zero);
//! * nonzero constants (never zero, nothing to observe);
//! * polynomials in the curve parameters only (constant once the curve
//!   is fixed, so they carry no point dependence) — unless the caller's
//!   [`FilterPolicy`] asks to keep them.
//!
//! Factors are deduplicated in monic form and refined pairwise across
//! the whole trace, so two intermediates sharing a factor contribute it
//! once.

use std::collections::BTreeSet;

use tracing::info;

use crate::deadline::Deadline;
use crate::errors::Error;
use crate::exec::{self, SymbolicDomain};
use crate::factor;
use crate::field::PrimeField;
use crate::formula::{CoordinateModel, Formula};
use crate::poly::Poly;

/// Which trace intermediates participate in the factor set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FilterPolicy {
    /// Keep factors depending only on the curve parameters `a` and `b`.
    /// Off by default: such factors are fixed by the curve choice and
    /// cannot be steered by input points.
    pub keep_parameter_only: bool,
}

/// The set of monic factors of a formula's intermediate polynomials.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FactorSet {
    formula: String,
    model: CoordinateModel,
    factors: BTreeSet<Poly>,
}

impl FactorSet {
    /// Compute the factor set of `formula` over `field`.
    pub fn compute(
        formula: &Formula,
        field: &PrimeField,
        policy: FilterPolicy,
        deadline: Deadline,
    ) -> Result<FactorSet, Error> {
        let domain = SymbolicDomain::new(field.clone());
        let bindings = exec::affine_symbolic_bindings(formula, &domain);
        let trace = exec::execute(formula, &bindings, &domain)?;

        let mut factors = BTreeSet::new();
        for (_name, value) in trace.intermediates() {
            deadline.check("factor-set computation")?;
            if !retained(value, policy) {
                continue;
            }
            factors.extend(factor::factor(value, field, deadline)?);
        }
        // cross-intermediate refinement: shared divisors are counted
        // once and composite survivors get split by their co-members
        let mut factors = factor::refine(factors, field, deadline)?;
        if !policy.keep_parameter_only {
            factors.retain(|f| retained(f, policy));
        }

        info!(
            formula = %formula.name(),
            model = formula.model().name(),
            factors = factors.len(),
            "factor set computed"
        );
        Ok(FactorSet {
            formula: formula.name().to_owned(),
            model: formula.model(),
            factors,
        })
    }

    /// Name of the formula this set belongs to.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Coordinate model of the originating formula.
    pub fn model(&self) -> CoordinateModel {
        self.model
    }

    /// The factors, in the canonical polynomial order.
    pub fn iter(&self) -> impl Iterator<Item = &Poly> {
        self.factors.iter()
    }

    /// Number of factors.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Whether `f` (in monic form) is a member.
    pub fn contains(&self, f: &Poly) -> bool {
        self.factors.contains(f)
    }

    /// Factors present in `self` but not in `other`: the conditions
    /// that can tell the two formulas apart.
    pub fn difference(&self, other: &FactorSet) -> BTreeSet<Poly> {
        self.factors.difference(&other.factors).cloned().collect()
    }

    /// Factors both formulas share.
    pub fn intersection(&self, other: &FactorSet) -> BTreeSet<Poly> {
        self.factors.intersection(&other.factors).cloned().collect()
    }
}

/// Filter predicate for intermediates and final factors.
fn retained(p: &Poly, policy: FilterPolicy) -> bool {
    if p.is_zero() || p.is_constant() {
        return false;
    }
    if !policy.keep_parameter_only {
        let point_dependent = p
            .variables()
            .iter()
            .any(|v| v != "a" && v != "b");
        if !point_dependent {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::formula::lookup;
    use num_bigint::BigUint;

    fn field() -> PrimeField {
        let p = BigUint::parse_bytes(b"c50de883f0e7b167", 16).unwrap();
        PrimeField::new(p).unwrap()
    }

    fn var(name: &str) -> Poly {
        Poly::variable(name)
    }

    #[test]
    fn addition_factor_set_contains_coordinate_sums() {
        let f = field();
        let formula = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
        let set =
            FactorSet::compute(&formula, &f, FilterPolicy::default(), Deadline::none()).unwrap();

        // T = x1 + x2 and M = y1 + y2 appear directly in the trace.
        assert!(set.contains(&var("x1").add(&var("x2"), &f)));
        assert!(set.contains(&var("y1").add(&var("y2"), &f)));
        assert!(!set.is_empty());
    }

    #[test]
    fn factor_sets_are_deterministic() {
        let f = field();
        let formula = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();
        let a =
            FactorSet::compute(&formula, &f, FilterPolicy::default(), Deadline::none()).unwrap();
        let b =
            FactorSet::compute(&formula, &f, FilterPolicy::default(), Deadline::none()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chudnovsky_addition_sees_coordinate_differences() {
        let f = field();
        let formula = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();
        let set =
            FactorSet::compute(&formula, &f, FilterPolicy::default(), Deadline::none()).unwrap();

        // P = x2 - x1 and R = y2 - y1, monic.
        assert!(set.contains(&var("x2").sub(&var("x1"), &f).monic(&f)));
        assert!(set.contains(&var("y2").sub(&var("y1"), &f).monic(&f)));
    }

    #[test]
    fn unified_and_chudnovsky_addition_differ() {
        let f = field();
        let bl = FactorSet::compute(
            &lookup(CoordinateModel::Projective, "add-2007-bl").unwrap(),
            &f,
            FilterPolicy::default(),
            Deadline::none(),
        )
        .unwrap();
        let cc = FactorSet::compute(
            &lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap(),
            &f,
            FilterPolicy::default(),
            Deadline::none(),
        )
        .unwrap();

        let diff = bl.difference(&cc);
        assert!(!diff.is_empty());
        // y1 + y2 vanishes only at P, -P pairs: unified addition sees
        // it, the chord-only Chudnovsky formula does not.
        assert!(diff.contains(&var("y1").add(&var("y2"), &f)));
        assert!(!cc.contains(&var("y1").add(&var("y2"), &f)));
    }

    #[test]
    fn parameter_only_factors_are_filtered() {
        let f = field();
        let formula = lookup(CoordinateModel::Jacobian, "dbl-2007-bl").unwrap();
        let set =
            FactorSet::compute(&formula, &f, FilterPolicy::default(), Deadline::none()).unwrap();
        for factor in set.iter() {
            let vars = factor.variables();
            assert!(vars.iter().any(|v| v != "a" && v != "b"), "parameter-only factor {} survived", factor);
        }

        // t4 = a * ZZ^2 lifts to the bare parameter a; the permissive
        // policy keeps it.
        let keep = FilterPolicy { keep_parameter_only: true };
        let set = FactorSet::compute(&formula, &f, keep, Deadline::none()).unwrap();
        assert!(set.contains(&var("a")));
    }

    #[test]
    fn doubling_set_contains_tangent_conditions() {
        let f = field();
        let formula = lookup(CoordinateModel::Projective, "dbl-2007-bl").unwrap();
        let set =
            FactorSet::compute(&formula, &f, FilterPolicy::default(), Deadline::none()).unwrap();

        // R = 2*y1^2 contributes y1; w = 3*x1^2 + a survives whole.
        assert!(set.contains(&var("y1")));
        let three_inv = f.invert(&BigUint::from(3u32));
        let w_monic = var("x1")
            .sqr(&f)
            .scale(&BigUint::from(3u32), &f)
            .add(&var("a"), &f)
            .scale(&three_inv, &f);
        assert!(set.contains(&w_monic));
    }
}
