// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Errors which may occur during symbolic execution, factor-set
//! computation, ZVP point construction, or distinguishing.
//!
//! Every error carries enough context to identify the failing formula or
//! operation, and classifies itself into one of four [`ErrorKind`]s:
//!
//! * [`ErrorKind::Structural`] — a malformed formula or polynomial; fatal.
//! * [`ErrorKind::Configuration`] — the engine was configured without a
//!   concrete odd prime field; fatal, the caller must supply one.
//! * [`ErrorKind::Domain`] — a mathematically unsupported input (for
//!   example a degenerate discrete-log multiplier); the caller may skip
//!   the offending input and continue a sweep.
//! * [`ErrorKind::Timeout`] — a cooperative deadline expired during
//!   factoring or root finding; recoverable, the caller may retry with a
//!   larger budget or skip.
//!
//! An *empty* result (for example a target polynomial with no roots over
//! the field) is never an error; such outcomes are returned as empty sets.

use core::fmt;
use core::fmt::Display;

/// Broad classification of an [`Error`], mirroring how callers are
/// expected to react to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Malformed formula or polynomial; not retriable.
    Structural,
    /// The engine was not given a concrete odd prime field.
    Configuration,
    /// Unsupported mathematical input; skip and continue.
    Domain,
    /// A cooperative deadline expired; recoverable.
    Timeout,
}

/// Errors produced by the ZVP analysis engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A formula operation referenced an operand that has not been
    /// defined at that point in the operation sequence.
    UndefinedOperand {
        /// Name of the offending formula.
        formula: String,
        /// The operand that was not in scope.
        name: String,
    },
    /// A formula operation tried to redefine an existing name.
    DuplicateResult {
        /// Name of the offending formula.
        formula: String,
        /// The name that was defined twice.
        name: String,
    },
    /// A formula declared an output that no operation produced.
    MissingOutput {
        /// Name of the offending formula.
        formula: String,
        /// The missing output variable.
        name: String,
    },
    /// No formula with this name exists in the catalog for the requested
    /// coordinate model.
    UnknownFormula {
        /// Coordinate model name.
        model: &'static str,
        /// The requested formula name.
        name: String,
    },
    /// A polynomial was evaluated without a value for one of its free
    /// variables.
    UnboundVariable {
        /// The unbound variable name.
        name: String,
    },
    /// A formula requested the inverse of a non-constant symbolic value.
    /// The catalog formulas are inversion-free; a formula demanding a
    /// symbolic inverse cannot be traced by this engine.
    SymbolicInverse,
    /// A formula requested the inverse of zero during concrete execution.
    ZeroInverse,
    /// The supplied modulus is not an odd prime, so no finite field (and
    /// therefore no factorization) is defined over it.
    NotPrime,
    /// Curve parameters are inconsistent (for example the declared
    /// generator does not satisfy the curve equation).
    InvalidCurve,
    /// The discrete-log multiplier has no usable multiplication-by-k map
    /// (k is congruent to 0 or 1 modulo the group order).
    UnsupportedMultiplier {
        /// The rejected multiplier.
        k: u64,
    },
    /// The target polynomial vanishes identically under the requested
    /// substitution, so the set of zero-value points is not enumerable.
    DegenerateTarget,
    /// An internal arithmetic invariant was violated.
    Internal(&'static str),
    /// A cooperative deadline expired inside the named operation.
    Timeout {
        /// The operation that was cancelled.
        operation: &'static str,
    },
}

impl Error {
    /// Classify this error for batch drivers sweeping many inputs.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UndefinedOperand { .. }
            | Error::DuplicateResult { .. }
            | Error::MissingOutput { .. }
            | Error::UnknownFormula { .. }
            | Error::UnboundVariable { .. }
            | Error::SymbolicInverse
            | Error::Internal(_) => ErrorKind::Structural,
            Error::NotPrime => ErrorKind::Configuration,
            Error::ZeroInverse
            | Error::InvalidCurve
            | Error::UnsupportedMultiplier { .. }
            | Error::DegenerateTarget => ErrorKind::Domain,
            Error::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UndefinedOperand { formula, name } => {
                write!(f, "formula {} references undefined operand {}", formula, name)
            }
            Error::DuplicateResult { formula, name } => {
                write!(f, "formula {} defines {} more than once", formula, name)
            }
            Error::MissingOutput { formula, name } => {
                write!(f, "formula {} never defines its output {}", formula, name)
            }
            Error::UnknownFormula { model, name } => {
                write!(f, "no formula named {} in the {} catalog", name, model)
            }
            Error::UnboundVariable { name } => {
                write!(f, "no value bound for variable {}", name)
            }
            Error::SymbolicInverse => {
                write!(f, "cannot invert a non-constant symbolic value")
            }
            Error::ZeroInverse => write!(f, "cannot invert zero"),
            Error::NotPrime => write!(f, "modulus is not an odd prime"),
            Error::InvalidCurve => write!(f, "curve parameters are inconsistent"),
            Error::UnsupportedMultiplier { k } => {
                write!(f, "multiplier {} has no usable multiplication map", k)
            }
            Error::DegenerateTarget => {
                write!(f, "target polynomial vanishes identically under substitution")
            }
            Error::Internal(what) => write!(f, "internal invariant violated: {}", what),
            Error::Timeout { operation } => {
                write!(f, "deadline expired during {}", operation)
            }
        }
    }
}

impl std::error::Error for Error {}
