// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! The formula model and the built-in formula catalog.
//!
//! A [`Formula`] is an ordered sequence of primitive field operations
//! (add/sub/mul/sqr/inv/neg), each producing exactly one new named
//! value, over the input coordinates of one or two points and the curve
//! parameters `a`, `b`. This mirrors how the Explicit-Formulas Database
//! (EFD) publishes addition and doubling formulas, with every multi-step
//! expression decomposed into single-result steps.
//!
//! Formulas are immutable once built and validated: every operand must
//! be an input coordinate, a curve parameter, a small integer literal,
//! or the result of an earlier operation, and no name may be defined
//! twice. Violations surface as structural errors at construction, so
//! executing a catalog formula can only fail on arithmetic grounds.
//!
//! The catalog carries the EFD short Weierstrass formulas
//! `add-2007-bl`, `add-1998-cmo-2` and `dbl-2007-bl` in homogeneous
//! projective coordinates, and `add-2007-bl`, `add-1986-cc` and
//! `dbl-2007-bl` in Jacobian coordinates. Formula names are unique only
//! per coordinate model (the EFD reuses names across models), so lookup
//! is keyed by `(model, name)`.

use std::collections::BTreeSet;

use crate::errors::Error;

/// The coordinate systems the catalog covers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoordinateModel {
    /// Homogeneous projective: `x = X/Z`, `y = Y/Z`.
    Projective,
    /// Jacobian: `x = X/Z²`, `y = Y/Z³`.
    Jacobian,
}

impl CoordinateModel {
    /// Human-readable model name.
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateModel::Projective => "projective",
            CoordinateModel::Jacobian => "jacobian",
        }
    }

    /// The coordinate variable names of the `index`-th input point
    /// (1-based, matching the EFD convention `X1, Y1, Z1, X2, ...`).
    pub fn input_variables(&self, index: usize) -> [String; 3] {
        [
            format!("X{}", index),
            format!("Y{}", index),
            format!("Z{}", index),
        ]
    }
}

/// A primitive field operation. Closed set; formulas cannot introduce
/// new operation kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Op {
    /// Binary addition.
    Add,
    /// Binary subtraction.
    Sub,
    /// Binary multiplication.
    Mul,
    /// Unary squaring.
    Sqr,
    /// Unary multiplicative inverse.
    Inv,
    /// Unary negation.
    Neg,
}

impl Op {
    /// Number of operands this operation consumes.
    pub fn arity(&self) -> usize {
        match self {
            Op::Add | Op::Sub | Op::Mul => 2,
            Op::Sqr | Op::Inv | Op::Neg => 1,
        }
    }
}

/// An operand of a formula operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operand {
    /// A named value: input coordinate, curve parameter, or the result
    /// of an earlier operation.
    Var(String),
    /// A small integer literal (EFD constant multiplier).
    Int(i64),
}

/// One step of a formula: `result = op(operands...)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormulaOp {
    /// The unique name this step defines.
    pub result: String,
    /// The operation kind.
    pub op: Op,
    /// The operands, `op.arity()` of them.
    pub operands: Vec<Operand>,
}

/// An addition or doubling formula: an immutable, validated operation
/// sequence with declared outputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Formula {
    name: String,
    model: CoordinateModel,
    arity: usize,
    ops: Vec<FormulaOp>,
    outputs: Vec<String>,
}

impl Formula {
    /// The formula's short EFD-style name, e.g. `add-2007-bl`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The coordinate model this formula operates in.
    pub fn model(&self) -> CoordinateModel {
        self.model
    }

    /// Number of input points (1 for doubling, 2 for addition).
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// The ordered operation sequence.
    pub fn ops(&self) -> &[FormulaOp] {
        &self.ops
    }

    /// The declared output variable names.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// All input variable names (`X1, Y1, Z1[, X2, Y2, Z2]`).
    pub fn input_variables(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(3 * self.arity);
        for i in 1..=self.arity {
            out.extend(self.model.input_variables(i));
        }
        out
    }

    /// The curve parameter names every formula may reference.
    pub fn parameters() -> [&'static str; 2] {
        ["a", "b"]
    }

    /// Check defined-before-use, name uniqueness and output presence.
    fn validate(&self) -> Result<(), Error> {
        let mut defined: BTreeSet<String> = self.input_variables().into_iter().collect();
        for p in Formula::parameters() {
            defined.insert(p.to_owned());
        }
        for step in &self.ops {
            for operand in &step.operands {
                if let Operand::Var(name) = operand {
                    if !defined.contains(name) {
                        return Err(Error::UndefinedOperand {
                            formula: self.name.clone(),
                            name: name.clone(),
                        });
                    }
                }
            }
            if !defined.insert(step.result.clone()) {
                return Err(Error::DuplicateResult {
                    formula: self.name.clone(),
                    name: step.result.clone(),
                });
            }
        }
        for output in &self.outputs {
            if !defined.contains(output) {
                return Err(Error::MissingOutput {
                    formula: self.name.clone(),
                    name: output.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Incremental construction of a [`Formula`]; finished by
/// [`FormulaBuilder::outputs`], which validates the result.
pub struct FormulaBuilder {
    formula: Formula,
}

impl FormulaBuilder {
    /// Start a formula with the given name, model and input arity.
    pub fn new(name: &str, model: CoordinateModel, arity: usize) -> FormulaBuilder {
        FormulaBuilder {
            formula: Formula {
                name: name.to_owned(),
                model,
                arity,
                ops: Vec::new(),
                outputs: Vec::new(),
            },
        }
    }

    fn push(mut self, result: &str, op: Op, operands: &[&str]) -> FormulaBuilder {
        let operands = operands.iter().map(|s| parse_operand(s)).collect();
        self.formula.ops.push(FormulaOp {
            result: result.to_owned(),
            op,
            operands,
        });
        self
    }

    /// `result = l + r`.
    pub fn add(self, result: &str, l: &str, r: &str) -> FormulaBuilder {
        self.push(result, Op::Add, &[l, r])
    }

    /// `result = l - r`.
    pub fn sub(self, result: &str, l: &str, r: &str) -> FormulaBuilder {
        self.push(result, Op::Sub, &[l, r])
    }

    /// `result = l * r`.
    pub fn mul(self, result: &str, l: &str, r: &str) -> FormulaBuilder {
        self.push(result, Op::Mul, &[l, r])
    }

    /// `result = x^2`.
    pub fn sqr(self, result: &str, x: &str) -> FormulaBuilder {
        self.push(result, Op::Sqr, &[x])
    }

    /// `result = 1/x`.
    pub fn inv(self, result: &str, x: &str) -> FormulaBuilder {
        self.push(result, Op::Inv, &[x])
    }

    /// `result = -x`.
    pub fn neg(self, result: &str, x: &str) -> FormulaBuilder {
        self.push(result, Op::Neg, &[x])
    }

    /// Declare the output variables and validate the formula.
    pub fn outputs(mut self, outputs: &[&str]) -> Result<Formula, Error> {
        self.formula.outputs = outputs.iter().map(|s| (*s).to_owned()).collect();
        self.formula.validate()?;
        Ok(self.formula)
    }
}

/// Digits parse as integer literals, anything else is a name.
fn parse_operand(s: &str) -> Operand {
    match s.parse::<i64>() {
        Ok(n) => Operand::Int(n),
        Err(_) => Operand::Var(s.to_owned()),
    }
}

/// Look up a catalog formula by coordinate model and name.
pub fn lookup(model: CoordinateModel, name: &str) -> Result<Formula, Error> {
    catalog()?
        .into_iter()
        .find(|f| f.model() == model && f.name() == name)
        .ok_or(Error::UnknownFormula {
            model: model.name(),
            name: name.to_owned(),
        })
}

/// The built-in formula catalog.
///
/// Building the catalog revalidates every formula, so a corrupted entry
/// cannot reach the executor.
pub fn catalog() -> Result<Vec<Formula>, Error> {
    Ok(vec![
        projective_add_2007_bl()?,
        projective_add_1998_cmo_2()?,
        projective_dbl_2007_bl()?,
        jacobian_add_2007_bl()?,
        jacobian_add_1986_cc()?,
        jacobian_dbl_2007_bl()?,
    ])
}

/// EFD shortw projective `add-2007-bl` (Bernstein–Lange unified
/// addition; also valid for doubling as long as `Y1 + Y2 != 0`).
fn projective_add_2007_bl() -> Result<Formula, Error> {
    FormulaBuilder::new("add-2007-bl", CoordinateModel::Projective, 2)
        .mul("U1", "X1", "Z2")
        .mul("U2", "X2", "Z1")
        .mul("S1", "Y1", "Z2")
        .mul("S2", "Y2", "Z1")
        .mul("ZZ", "Z1", "Z2")
        .add("T", "U1", "U2")
        .sqr("TT", "T")
        .add("M", "S1", "S2")
        .mul("U1U2", "U1", "U2")
        .sub("t0", "TT", "U1U2")
        .sqr("ZZ2", "ZZ")
        .mul("aZZ2", "a", "ZZ2")
        .add("R", "t0", "aZZ2")
        .mul("F", "ZZ", "M")
        .mul("L", "M", "F")
        .sqr("LL", "L")
        .add("TL", "T", "L")
        .sqr("TL2", "TL")
        .sub("t1", "TL2", "TT")
        .sub("G", "t1", "LL")
        .sqr("RR", "R")
        .mul("t2", "2", "RR")
        .sub("W", "t2", "G")
        .mul("FW", "F", "W")
        .mul("X3", "2", "FW")
        .mul("t3", "2", "W")
        .sub("t4", "G", "t3")
        .mul("t5", "R", "t4")
        .mul("t6", "2", "LL")
        .sub("Y3", "t5", "t6")
        .sqr("FF", "F")
        .mul("FFF", "F", "FF")
        .mul("Z3", "4", "FFF")
        .outputs(&["X3", "Y3", "Z3"])
}

/// EFD shortw projective `add-1998-cmo-2` (Cohen–Miyaji–Ono).
fn projective_add_1998_cmo_2() -> Result<Formula, Error> {
    FormulaBuilder::new("add-1998-cmo-2", CoordinateModel::Projective, 2)
        .mul("Y1Z2", "Y1", "Z2")
        .mul("X1Z2", "X1", "Z2")
        .mul("Z1Z2", "Z1", "Z2")
        .mul("t0", "Y2", "Z1")
        .sub("u", "t0", "Y1Z2")
        .sqr("uu", "u")
        .mul("t1", "X2", "Z1")
        .sub("v", "t1", "X1Z2")
        .sqr("vv", "v")
        .mul("vvv", "v", "vv")
        .mul("R", "vv", "X1Z2")
        .mul("t2", "uu", "Z1Z2")
        .mul("t3", "2", "R")
        .sub("t4", "t2", "vvv")
        .sub("A", "t4", "t3")
        .mul("X3", "v", "A")
        .sub("t5", "R", "A")
        .mul("t6", "u", "t5")
        .mul("t7", "vvv", "Y1Z2")
        .sub("Y3", "t6", "t7")
        .mul("Z3", "vvv", "Z1Z2")
        .outputs(&["X3", "Y3", "Z3"])
}

/// EFD shortw projective `dbl-2007-bl`.
fn projective_dbl_2007_bl() -> Result<Formula, Error> {
    FormulaBuilder::new("dbl-2007-bl", CoordinateModel::Projective, 1)
        .sqr("XX", "X1")
        .sqr("ZZ", "Z1")
        .mul("t0", "a", "ZZ")
        .mul("t1", "3", "XX")
        .add("w", "t0", "t1")
        .mul("t2", "Y1", "Z1")
        .mul("s", "2", "t2")
        .sqr("ss", "s")
        .mul("sss", "s", "ss")
        .mul("R", "Y1", "s")
        .sqr("RR", "R")
        .add("t3", "X1", "R")
        .sqr("t4", "t3")
        .sub("t5", "t4", "XX")
        .sub("B", "t5", "RR")
        .sqr("ww", "w")
        .mul("t6", "2", "B")
        .sub("h", "ww", "t6")
        .mul("X3", "h", "s")
        .sub("t7", "B", "h")
        .mul("t8", "w", "t7")
        .mul("t9", "2", "RR")
        .sub("Y3", "t8", "t9")
        .outputs(&["X3", "Y3", "sss"])
}

/// EFD shortw Jacobian `add-2007-bl`.
fn jacobian_add_2007_bl() -> Result<Formula, Error> {
    FormulaBuilder::new("add-2007-bl", CoordinateModel::Jacobian, 2)
        .sqr("Z1Z1", "Z1")
        .sqr("Z2Z2", "Z2")
        .mul("U1", "X1", "Z2Z2")
        .mul("U2", "X2", "Z1Z1")
        .mul("t0", "Z2", "Z2Z2")
        .mul("S1", "Y1", "t0")
        .mul("t1", "Z1", "Z1Z1")
        .mul("S2", "Y2", "t1")
        .sub("H", "U2", "U1")
        .mul("t2", "2", "H")
        .sqr("I", "t2")
        .mul("J", "H", "I")
        .sub("t3", "S2", "S1")
        .mul("r", "2", "t3")
        .mul("V", "U1", "I")
        .sqr("rr", "r")
        .sub("t4", "rr", "J")
        .mul("t5", "2", "V")
        .sub("X3", "t4", "t5")
        .sub("t6", "V", "X3")
        .mul("t7", "r", "t6")
        .mul("t8", "S1", "J")
        .mul("t9", "2", "t8")
        .sub("Y3", "t7", "t9")
        .add("t10", "Z1", "Z2")
        .sqr("t11", "t10")
        .sub("t12", "t11", "Z1Z1")
        .sub("t13", "t12", "Z2Z2")
        .mul("Z3", "t13", "H")
        .outputs(&["X3", "Y3", "Z3"])
}

/// EFD shortw Jacobian `add-1986-cc` (Chudnovsky–Chudnovsky).
fn jacobian_add_1986_cc() -> Result<Formula, Error> {
    FormulaBuilder::new("add-1986-cc", CoordinateModel::Jacobian, 2)
        .sqr("ZZ1", "Z1")
        .mul("ZZZ1", "Z1", "ZZ1")
        .sqr("ZZ2", "Z2")
        .mul("ZZZ2", "Z2", "ZZ2")
        .mul("U1", "X1", "ZZ2")
        .mul("U2", "X2", "ZZ1")
        .mul("S1", "Y1", "ZZZ2")
        .mul("S2", "Y2", "ZZZ1")
        .sub("P", "U2", "U1")
        .sub("R", "S2", "S1")
        .sqr("PP", "P")
        .mul("PPP", "P", "PP")
        .sqr("RR", "R")
        .mul("t0", "U1", "PP")
        .mul("t1", "2", "t0")
        .sub("t2", "RR", "PPP")
        .sub("X3", "t2", "t1")
        .sub("t3", "t0", "X3")
        .mul("t4", "R", "t3")
        .mul("t5", "S1", "PPP")
        .sub("Y3", "t4", "t5")
        .mul("t6", "Z1", "Z2")
        .mul("Z3", "t6", "P")
        .outputs(&["X3", "Y3", "Z3"])
}

/// EFD shortw Jacobian `dbl-2007-bl`.
fn jacobian_dbl_2007_bl() -> Result<Formula, Error> {
    FormulaBuilder::new("dbl-2007-bl", CoordinateModel::Jacobian, 1)
        .sqr("XX", "X1")
        .sqr("YY", "Y1")
        .sqr("YYYY", "YY")
        .sqr("ZZ", "Z1")
        .add("t0", "X1", "YY")
        .sqr("t1", "t0")
        .sub("t2", "t1", "XX")
        .sub("t3", "t2", "YYYY")
        .mul("S", "2", "t3")
        .sqr("ZZ2", "ZZ")
        .mul("t4", "a", "ZZ2")
        .mul("t5", "3", "XX")
        .add("M", "t5", "t4")
        .sqr("MM", "M")
        .mul("t6", "2", "S")
        .sub("X3", "MM", "t6")
        .sub("t7", "S", "X3")
        .mul("t8", "M", "t7")
        .mul("t9", "8", "YYYY")
        .sub("Y3", "t8", "t9")
        .add("t10", "Y1", "Z1")
        .sqr("t11", "t10")
        .sub("t12", "t11", "YY")
        .sub("Z3", "t12", "ZZ")
        .outputs(&["X3", "Y3", "Z3"])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn catalog_builds_and_validates() {
        let formulas = catalog().unwrap();
        assert_eq!(formulas.len(), 6);
        for f in &formulas {
            assert!(!f.ops().is_empty());
            assert_eq!(f.outputs().len(), 3);
        }
    }

    #[test]
    fn lookup_is_keyed_by_model_and_name() {
        let proj = lookup(CoordinateModel::Projective, "add-2007-bl").unwrap();
        let jac = lookup(CoordinateModel::Jacobian, "add-2007-bl").unwrap();
        assert_ne!(proj, jac);
        assert_eq!(
            lookup(CoordinateModel::Projective, "add-1986-cc").unwrap_err(),
            Error::UnknownFormula {
                model: "projective",
                name: "add-1986-cc".to_owned(),
            }
        );
    }

    #[test]
    fn undefined_operand_is_rejected() {
        let err = FormulaBuilder::new("bogus", CoordinateModel::Projective, 1)
            .mul("A", "X1", "Nope")
            .outputs(&["A"])
            .unwrap_err();
        assert_eq!(
            err,
            Error::UndefinedOperand {
                formula: "bogus".to_owned(),
                name: "Nope".to_owned(),
            }
        );
    }

    #[test]
    fn duplicate_result_is_rejected() {
        let err = FormulaBuilder::new("bogus", CoordinateModel::Projective, 1)
            .sqr("A", "X1")
            .sqr("A", "Y1")
            .outputs(&["A"])
            .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateResult {
                formula: "bogus".to_owned(),
                name: "A".to_owned(),
            }
        );
    }

    #[test]
    fn missing_output_is_rejected() {
        let err = FormulaBuilder::new("bogus", CoordinateModel::Jacobian, 1)
            .sqr("A", "X1")
            .outputs(&["A", "B"])
            .unwrap_err();
        assert_eq!(
            err,
            Error::MissingOutput {
                formula: "bogus".to_owned(),
                name: "B".to_owned(),
            }
        );
    }

    #[test]
    fn operand_literals_parse() {
        assert_eq!(parse_operand("2"), Operand::Int(2));
        assert_eq!(parse_operand("X1"), Operand::Var("X1".to_owned()));
    }
}
