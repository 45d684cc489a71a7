// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Formula execution over a pluggable value domain.
//!
//! The same interpreter runs a formula both *concretely* (values are
//! field elements, used to verify candidate points) and *symbolically*
//! (values are multivariate polynomials in the affine input coordinates,
//! used to compute factor sets). The two domains are instances of the
//! [`FormulaField`] trait; the interpreter itself is domain-agnostic and
//! records every intermediate it computes into an [`ExecutionTrace`].
//!
//! Inversion is the one operation whose meaning differs sharply between
//! domains. Concretely it is ordinary field inversion, failing only on
//! zero. Symbolically a non-constant polynomial has no polynomial
//! inverse, so a formula demanding one cannot be traced; the catalog
//! formulas are all inversion-free, and [`SymbolicDomain::inv`] rejects
//! non-constant arguments with [`Error::SymbolicInverse`].

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use tracing::debug;

use crate::errors::Error;
use crate::field::PrimeField;
use crate::formula::{Formula, Op, Operand};
use crate::poly::Poly;

/// A value domain the formula interpreter can run over.
pub trait FormulaField {
    /// The value type of this domain.
    type Element: Clone + PartialEq + fmt::Debug;

    /// Embed a small signed integer constant.
    fn constant(&self, c: i64) -> Self::Element;
    /// `a + b`.
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    /// `a - b`.
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    /// `a * b`.
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    /// `a^2`.
    fn sqr(&self, a: &Self::Element) -> Self::Element {
        self.mul(a, a)
    }
    /// `-a`.
    fn neg(&self, a: &Self::Element) -> Self::Element;
    /// `1/a`, where the domain defines it.
    fn inv(&self, a: &Self::Element) -> Result<Self::Element, Error>;
    /// Whether `a` is the domain's zero.
    fn is_zero(&self, a: &Self::Element) -> bool;
}

/// Concrete execution: values are canonical residues in the prime field.
impl FormulaField for PrimeField {
    type Element = BigUint;

    fn constant(&self, c: i64) -> BigUint {
        self.from_i64(c)
    }

    fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        PrimeField::add(self, a, b)
    }

    fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        PrimeField::sub(self, a, b)
    }

    fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        PrimeField::mul(self, a, b)
    }

    fn neg(&self, a: &BigUint) -> BigUint {
        PrimeField::neg(self, a)
    }

    fn inv(&self, a: &BigUint) -> Result<BigUint, Error> {
        if a.is_zero() {
            return Err(Error::ZeroInverse);
        }
        Ok(self.invert(a))
    }

    fn is_zero(&self, a: &BigUint) -> bool {
        Zero::is_zero(a)
    }
}

/// Symbolic execution: values are multivariate polynomials whose
/// coefficients live in a concrete prime field, so constants fold and
/// characteristic-dependent cancellations happen during the trace.
#[derive(Clone, Debug)]
pub struct SymbolicDomain {
    field: PrimeField,
}

impl SymbolicDomain {
    /// Symbolic domain with coefficients in `field`.
    pub fn new(field: PrimeField) -> SymbolicDomain {
        SymbolicDomain { field }
    }

    /// The coefficient field.
    pub fn field(&self) -> &PrimeField {
        &self.field
    }
}

impl FormulaField for SymbolicDomain {
    type Element = Poly;

    fn constant(&self, c: i64) -> Poly {
        Poly::constant(&self.field.from_i64(c), &self.field)
    }

    fn add(&self, a: &Poly, b: &Poly) -> Poly {
        a.add(b, &self.field)
    }

    fn sub(&self, a: &Poly, b: &Poly) -> Poly {
        a.sub(b, &self.field)
    }

    fn mul(&self, a: &Poly, b: &Poly) -> Poly {
        a.mul(b, &self.field)
    }

    fn sqr(&self, a: &Poly) -> Poly {
        a.sqr(&self.field)
    }

    fn neg(&self, a: &Poly) -> Poly {
        a.neg(&self.field)
    }

    fn inv(&self, a: &Poly) -> Result<Poly, Error> {
        match a.constant_value() {
            Some(c) if !c.is_zero() => Ok(Poly::constant(&self.field.invert(&c), &self.field)),
            Some(_) => Err(Error::ZeroInverse),
            None => Err(Error::SymbolicInverse),
        }
    }

    fn is_zero(&self, a: &Poly) -> bool {
        a.is_zero()
    }
}

/// The complete record of one formula execution: every intermediate in
/// operation order, plus the declared outputs.
#[derive(Clone, Debug)]
pub struct ExecutionTrace<E> {
    formula: String,
    steps: Vec<(String, E)>,
    outputs: Vec<(String, E)>,
}

impl<E: Clone> ExecutionTrace<E> {
    /// Name of the formula that produced this trace.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// The intermediates, in the order the formula computed them.
    pub fn intermediates(&self) -> &[(String, E)] {
        &self.steps
    }

    /// The declared outputs, in declaration order.
    pub fn outputs(&self) -> &[(String, E)] {
        &self.outputs
    }

    /// Look up an output by name.
    pub fn output(&self, name: &str) -> Option<&E> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Run `formula` over `domain` with the given variable bindings.
///
/// `bindings` must cover every input coordinate and both curve
/// parameters `a` and `b`; a missing name fails with
/// [`Error::UnboundVariable`]. The formula was validated at
/// construction, so the only runtime failures are inversion errors from
/// the domain.
pub fn execute<F: FormulaField>(
    formula: &Formula,
    bindings: &BTreeMap<String, F::Element>,
    domain: &F,
) -> Result<ExecutionTrace<F::Element>, Error> {
    let mut env: BTreeMap<String, F::Element> = BTreeMap::new();
    for name in formula.input_variables() {
        let value = bindings
            .get(&name)
            .ok_or_else(|| Error::UnboundVariable { name: name.clone() })?;
        env.insert(name, value.clone());
    }
    for name in Formula::parameters() {
        let value = bindings
            .get(name)
            .ok_or_else(|| Error::UnboundVariable { name: name.to_owned() })?;
        env.insert(name.to_owned(), value.clone());
    }

    let mut steps = Vec::with_capacity(formula.ops().len());
    for step in formula.ops() {
        let mut args = Vec::with_capacity(step.operands.len());
        for operand in &step.operands {
            match operand {
                Operand::Int(n) => args.push(domain.constant(*n)),
                Operand::Var(name) => {
                    // validation guarantees presence
                    let value = env
                        .get(name)
                        .ok_or_else(|| Error::UnboundVariable { name: name.clone() })?;
                    args.push(value.clone());
                }
            }
        }
        let value = match step.op {
            Op::Add => domain.add(&args[0], &args[1]),
            Op::Sub => domain.sub(&args[0], &args[1]),
            Op::Mul => domain.mul(&args[0], &args[1]),
            Op::Sqr => domain.sqr(&args[0]),
            Op::Inv => domain.inv(&args[0])?,
            Op::Neg => domain.neg(&args[0]),
        };
        env.insert(step.result.clone(), value.clone());
        steps.push((step.result.clone(), value));
    }

    let mut outputs = Vec::with_capacity(formula.outputs().len());
    for name in formula.outputs() {
        let value = env
            .get(name)
            .ok_or_else(|| Error::UnboundVariable { name: name.clone() })?;
        outputs.push((name.clone(), value.clone()));
    }
    debug!(
        formula = %formula.name(),
        steps = steps.len(),
        "formula executed"
    );
    Ok(ExecutionTrace {
        formula: formula.name().to_owned(),
        steps,
        outputs,
    })
}

/// The symbolic bindings of an affine execution: `Zi = 1` and
/// `Xi = xi`, `Yi = yi` for each input point, with the curve parameters
/// left symbolic as `a` and `b`.
pub fn affine_symbolic_bindings(
    formula: &Formula,
    domain: &SymbolicDomain,
) -> BTreeMap<String, Poly> {
    let mut bindings = BTreeMap::new();
    for i in 1..=formula.arity() {
        let [x, y, z] = formula.model().input_variables(i);
        bindings.insert(x, Poly::variable(&format!("x{}", i)));
        bindings.insert(y, Poly::variable(&format!("y{}", i)));
        bindings.insert(z, domain.constant(1));
    }
    bindings.insert("a".to_owned(), Poly::variable("a"));
    bindings.insert("b".to_owned(), Poly::variable("b"));
    bindings
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::formula::{lookup, CoordinateModel, FormulaBuilder};

    fn field() -> PrimeField {
        let p = BigUint::parse_bytes(b"c50de883f0e7b167", 16).unwrap();
        PrimeField::new(p).unwrap()
    }

    #[test]
    fn symbolic_affine_doubling_matches_tangent_line() {
        // For dbl-2007-bl in projective coordinates with Z1 = 1, the
        // output satisfies X3/Z3 = lambda^2 - 2*x1 with
        // lambda = (3*x1^2 + a) / (2*y1). Cross-multiplied:
        // X3 * (2*y1)^2 = (w^2 - 8*x1*y1^2) * s with s = 2*y1, i.e. the
        // projective X3 already equals h*s; sanity-check a concrete
        // instance instead of re-deriving symbolically.
        let f = field();
        let formula = lookup(CoordinateModel::Projective, "dbl-2007-bl").unwrap();
        let domain = SymbolicDomain::new(f.clone());
        let bindings = affine_symbolic_bindings(&formula, &domain);
        let trace = execute(&formula, &bindings, &domain).unwrap();

        // evaluate the symbolic outputs at the generator of the test
        // curve and compare against affine doubling
        let curve = crate::constants::zvp_test_curve().unwrap();
        let (gx, gy) = curve.generator().coordinates().unwrap();
        let mut assign = BTreeMap::new();
        assign.insert("x1".to_owned(), gx.clone());
        assign.insert("y1".to_owned(), gy.clone());
        assign.insert("a".to_owned(), curve.a().clone());
        assign.insert("b".to_owned(), curve.b().clone());

        let x3 = trace.output("X3").unwrap().evaluate(&assign, &f).unwrap();
        let y3 = trace.output("Y3").unwrap().evaluate(&assign, &f).unwrap();
        let z3 = trace.output("sss").unwrap().evaluate(&assign, &f).unwrap();
        assert!(!Zero::is_zero(&z3));

        let doubled = curve.double(curve.generator());
        let (dx, dy) = doubled.coordinates().unwrap();
        let z_inv = f.invert(&z3);
        assert_eq!(&f.mul(&x3, &z_inv), dx);
        assert_eq!(&f.mul(&y3, &z_inv), dy);
    }

    #[test]
    fn jacobian_addition_matches_affine_chord() {
        let f = field();
        let curve = crate::constants::zvp_test_curve().unwrap();
        let formula = lookup(CoordinateModel::Jacobian, "add-1986-cc").unwrap();

        let g = curve.generator();
        let h = curve.mul(&BigUint::from(5u32), g);
        let (gx, gy) = g.coordinates().unwrap();
        let (hx, hy) = h.coordinates().unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert("X1".to_owned(), gx.clone());
        bindings.insert("Y1".to_owned(), gy.clone());
        bindings.insert("Z1".to_owned(), BigUint::from(1u32));
        bindings.insert("X2".to_owned(), hx.clone());
        bindings.insert("Y2".to_owned(), hy.clone());
        bindings.insert("Z2".to_owned(), BigUint::from(1u32));
        bindings.insert("a".to_owned(), curve.a().clone());
        bindings.insert("b".to_owned(), curve.b().clone());

        let trace = execute(&formula, &bindings, &f).unwrap();
        let x3 = trace.output("X3").unwrap();
        let y3 = trace.output("Y3").unwrap();
        let z3 = trace.output("Z3").unwrap();

        let expected = curve.add(g, &h);
        let (ex, ey) = expected.coordinates().unwrap();
        let zz = f.mul(z3, z3);
        let zzz = f.mul(&zz, z3);
        assert_eq!(&f.mul(ex, &zz), x3);
        assert_eq!(&f.mul(ey, &zzz), y3);
    }

    #[test]
    fn trace_records_every_step_in_order() {
        let f = field();
        let formula = lookup(CoordinateModel::Jacobian, "dbl-2007-bl").unwrap();
        let domain = SymbolicDomain::new(f);
        let bindings = affine_symbolic_bindings(&formula, &domain);
        let trace = execute(&formula, &bindings, &domain).unwrap();
        assert_eq!(trace.intermediates().len(), formula.ops().len());
        assert_eq!(trace.intermediates()[0].0, "XX");
        assert_eq!(trace.outputs().len(), 3);
    }

    #[test]
    fn missing_binding_is_reported() {
        let f = field();
        let formula = lookup(CoordinateModel::Projective, "dbl-2007-bl").unwrap();
        let bindings: BTreeMap<String, BigUint> = BTreeMap::new();
        let err = execute(&formula, &bindings, &f).unwrap_err();
        assert!(matches!(err, Error::UnboundVariable { .. }));
    }

    #[test]
    fn symbolic_inverse_is_rejected() {
        let f = field();
        let formula = FormulaBuilder::new("inv-test", CoordinateModel::Projective, 1)
            .inv("A", "X1")
            .outputs(&["A"])
            .unwrap();
        let domain = SymbolicDomain::new(f.clone());
        let bindings = affine_symbolic_bindings(&formula, &domain);
        let err = execute(&formula, &bindings, &domain).unwrap_err();
        assert_eq!(err, Error::SymbolicInverse);

        // concretely, inversion of a nonzero value succeeds
        let mut concrete = BTreeMap::new();
        concrete.insert("X1".to_owned(), BigUint::from(7u32));
        concrete.insert("Y1".to_owned(), BigUint::from(11u32));
        concrete.insert("Z1".to_owned(), BigUint::from(1u32));
        concrete.insert("a".to_owned(), BigUint::from(1u32));
        concrete.insert("b".to_owned(), BigUint::from(1u32));
        assert!(execute(&formula, &concrete, &f).is_ok());

        concrete.insert("X1".to_owned(), BigUint::from(0u32));
        assert_eq!(execute(&formula, &concrete, &f).unwrap_err(), Error::ZeroInverse);
    }
}
