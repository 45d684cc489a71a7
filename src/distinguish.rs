// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Telling formulas apart through zero-value behaviour.
//!
//! Two implementations of the same group operation can react
//! differently to the same input pair: a formula whose factor set
//! contains a condition the other's lacks will zero an intermediate on
//! a crafted input while the other computes through cleanly. An
//! attacker observing a zero-value side channel uses this to identify
//! which formula a black-box implementation runs; defensively, the same
//! experiment tells you whether two formulas are interchangeable on a
//! given curve.
//!
//! The [`Distinguisher`] automates the experiment end to end: compute
//! both factor sets, take the symmetric difference, construct candidate
//! zero-value points for each differing condition over a range of
//! multipliers, and evaluate every candidate against both formulas
//! concretely. Concrete runs use *randomized* projective or Jacobian
//! lifts of the affine inputs, matching how implementations re-randomize
//! coordinates in practice; zero-value behaviour of the affine inputs
//! survives the randomization.

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::RngCore;
use tracing::{debug, info};

use crate::curve::{AffinePoint, WeierstrassCurve};
use crate::deadline::Deadline;
use crate::errors::{Error, ErrorKind};
use crate::exec;
use crate::factor_set::{FactorSet, FilterPolicy};
use crate::field::PrimeField;
use crate::formula::{CoordinateModel, Formula};
use crate::zvp::{self, ZvpPoint};

/// One formula's reaction to a candidate input pair.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistinguishingRow {
    /// Coordinate model of the formula.
    pub model: CoordinateModel,
    /// Formula name.
    pub formula: String,
    /// Names of the intermediates that evaluated to zero, in operation
    /// order. Empty means the formula computed through cleanly.
    pub zeroed: Vec<String>,
}

impl DistinguishingRow {
    /// Whether any intermediate vanished.
    pub fn has_zero(&self) -> bool {
        !self.zeroed.is_empty()
    }
}

/// The outcome of evaluating one zero-value point against a set of
/// formulas.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistinguishingResult {
    point: ZvpPoint,
    rows: Vec<DistinguishingRow>,
}

impl DistinguishingResult {
    /// The input that was fed to every formula.
    pub fn point(&self) -> &ZvpPoint {
        &self.point
    }

    /// Per-formula reactions.
    pub fn rows(&self) -> &[DistinguishingRow] {
        &self.rows
    }

    /// Whether this input separates the formulas: at least one zeroed
    /// an intermediate and at least one did not.
    pub fn distinguishes(&self) -> bool {
        self.rows.iter().any(DistinguishingRow::has_zero)
            && self.rows.iter().any(|r| !r.has_zero())
    }
}

impl fmt::Display for DistinguishingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input: {}", self.point)?;
        for row in &self.rows {
            if row.zeroed.is_empty() {
                writeln!(f, "  {:10} {:16} clean", row.model.name(), row.formula)?;
            } else {
                writeln!(
                    f,
                    "  {:10} {:16} zeroes {}",
                    row.model.name(),
                    row.formula,
                    row.zeroed.join(", ")
                )?;
            }
        }
        Ok(())
    }
}

/// Run `formula` concretely on `(p, q)` under a fresh randomized
/// coordinate lift and report which intermediates vanished.
///
/// Both inputs must be affine; the identity has no affine lift and is
/// rejected with [`Error::DegenerateTarget`]. Doubling formulas only
/// consume `p`.
pub fn evaluate_at<R: RngCore + ?Sized>(
    formula: &Formula,
    curve: &WeierstrassCurve,
    p: &AffinePoint,
    q: &AffinePoint,
    rng: &mut R,
) -> Result<DistinguishingRow, Error> {
    let field = curve.field();
    let mut bindings = BTreeMap::new();
    let inputs: [&AffinePoint; 2] = [p, q];
    for i in 1..=formula.arity() {
        let (x, y) = inputs[i - 1]
            .coordinates()
            .ok_or(Error::DegenerateTarget)?;
        let lambda = field.random_nonzero(rng);
        let [xv, yv, zv] = formula.model().input_variables(i);
        let (lx, ly, lz) = randomized_lift(formula.model(), x, y, &lambda, field);
        bindings.insert(xv, lx);
        bindings.insert(yv, ly);
        bindings.insert(zv, lz);
    }
    bindings.insert("a".to_owned(), curve.a().clone());
    bindings.insert("b".to_owned(), curve.b().clone());

    let trace = exec::execute(formula, &bindings, field)?;
    let zeroed = trace
        .intermediates()
        .iter()
        .filter(|(_, v)| v.is_zero())
        .map(|(name, _)| name.clone())
        .collect();
    Ok(DistinguishingRow {
        model: formula.model(),
        formula: formula.name().to_owned(),
        zeroed,
    })
}

/// The lift `(X, Y, Z)` of an affine point under a random scale.
fn randomized_lift(
    model: CoordinateModel,
    x: &BigUint,
    y: &BigUint,
    lambda: &BigUint,
    field: &PrimeField,
) -> (BigUint, BigUint, BigUint) {
    match model {
        CoordinateModel::Projective => (
            field.mul(lambda, x),
            field.mul(lambda, y),
            lambda.clone(),
        ),
        CoordinateModel::Jacobian => {
            let l2 = field.mul(lambda, lambda);
            let l3 = field.mul(&l2, lambda);
            (field.mul(&l2, x), field.mul(&l3, y), lambda.clone())
        }
    }
}

/// End-to-end distinguishing experiment between two formulas on one
/// curve.
pub struct Distinguisher<'a> {
    curve: &'a WeierstrassCurve,
    multipliers: Vec<u64>,
    policy: FilterPolicy,
    deadline: Deadline,
}

impl<'a> Distinguisher<'a> {
    /// A distinguisher over `curve` with the default multiplier sweep
    /// `k = 2 ..= 8`.
    pub fn new(curve: &'a WeierstrassCurve) -> Distinguisher<'a> {
        Distinguisher {
            curve,
            multipliers: (2..=8).collect(),
            policy: FilterPolicy::default(),
            deadline: Deadline::none(),
        }
    }

    /// Replace the multiplier sweep.
    pub fn with_multipliers(mut self, multipliers: Vec<u64>) -> Distinguisher<'a> {
        self.multipliers = multipliers;
        self
    }

    /// Bound the whole experiment by a cooperative deadline.
    pub fn with_deadline(mut self, deadline: Deadline) -> Distinguisher<'a> {
        self.deadline = deadline;
        self
    }

    /// Search for an input pair that separates `left` from `right`.
    ///
    /// Conditions come from the symmetric difference of the two factor
    /// sets; every candidate point is verified concretely against both
    /// formulas. Returns `Ok(None)` when the sweep is exhausted without
    /// a separating input. Domain failures on individual conditions
    /// (degenerate targets, unusable multipliers) are skipped; all other
    /// errors abort.
    pub fn distinguish<R: RngCore + ?Sized>(
        &self,
        left: &Formula,
        right: &Formula,
        rng: &mut R,
    ) -> Result<Option<DistinguishingResult>, Error> {
        let field = self.curve.field();
        let left_set = FactorSet::compute(left, field, self.policy, self.deadline)?;
        let right_set = FactorSet::compute(right, field, self.policy, self.deadline)?;

        let mut conditions: Vec<_> = left_set.difference(&right_set).into_iter().collect();
        conditions.extend(right_set.difference(&left_set));
        info!(
            left = %left.name(),
            right = %right.name(),
            conditions = conditions.len(),
            "distinguishing sweep started"
        );

        for condition in &conditions {
            for &k in &self.multipliers {
                self.deadline.check("distinguishing sweep")?;
                let points = match zvp::zvp_points(condition, self.curve, k, self.deadline) {
                    Ok(points) => points,
                    Err(e) if e.kind() == ErrorKind::Domain => {
                        debug!(condition = %condition, k, error = %e, "condition skipped");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for zvp_point in points {
                    let result = self.evaluate(&[left, right], &zvp_point, rng)?;
                    if result.distinguishes() {
                        info!(point = %result.point(), "distinguishing input found");
                        return Ok(Some(result));
                    }
                }
            }
        }
        Ok(None)
    }

    /// The full decision table: one [`DistinguishingResult`] per
    /// candidate point, each evaluating every formula.
    pub fn table<R: RngCore + ?Sized>(
        &self,
        formulas: &[&Formula],
        points: &[ZvpPoint],
        rng: &mut R,
    ) -> Result<Vec<DistinguishingResult>, Error> {
        points
            .iter()
            .map(|point| {
                self.deadline.check("distinguishing table")?;
                self.evaluate(formulas, point, rng)
            })
            .collect()
    }

    /// Evaluate one zero-value point against a set of formulas.
    pub fn evaluate<R: RngCore + ?Sized>(
        &self,
        formulas: &[&Formula],
        point: &ZvpPoint,
        rng: &mut R,
    ) -> Result<DistinguishingResult, Error> {
        let q = self
            .curve
            .mul(&BigUint::from(point.multiplier), &point.point);
        let mut rows = Vec::with_capacity(formulas.len());
        for formula in formulas {
            rows.push(evaluate_at(formula, self.curve, &point.point, &q, rng)?);
        }
        Ok(DistinguishingResult {
            point: point.clone(),
            rows,
        })
    }
}
