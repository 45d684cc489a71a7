// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

//!
//! # Quick start
//!
//! Compute the factor sets of two addition formulas over the built-in
//! 64-bit analysis curve and confirm they expose different zero-value
//! conditions:
//!
//! ```
//! use ec_zvp::{
//!     lookup, zvp_test_curve, CoordinateModel, Deadline, FactorSet, FilterPolicy,
//! };
//!
//! # fn main() -> Result<(), ec_zvp::Error> {
//! let curve = zvp_test_curve()?;
//! let unified = lookup(CoordinateModel::Projective, "add-2007-bl")?;
//! let chord = lookup(CoordinateModel::Jacobian, "add-1986-cc")?;
//!
//! let policy = FilterPolicy::default();
//! let u = FactorSet::compute(&unified, curve.field(), policy, Deadline::none())?;
//! let c = FactorSet::compute(&chord, curve.field(), policy, Deadline::none())?;
//!
//! // The unified formula adds the two y-coordinates; the chord-based
//! // one never does, so y1 + y2 separates them.
//! assert!(!u.difference(&c).is_empty());
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod curve;
pub mod deadline;
pub mod distinguish;
pub mod divpoly;
pub mod errors;
pub mod exec;
pub mod factor;
pub mod factor_set;
pub mod field;
pub mod formula;
pub mod poly;
pub mod uni;
pub mod zvp;

pub use crate::constants::zvp_test_curve;
pub use crate::curve::{AffinePoint, WeierstrassCurve};
pub use crate::deadline::Deadline;
pub use crate::distinguish::{DistinguishingResult, DistinguishingRow, Distinguisher};
pub use crate::errors::{Error, ErrorKind};
pub use crate::exec::{execute, ExecutionTrace, FormulaField, SymbolicDomain};
pub use crate::factor_set::{FactorSet, FilterPolicy};
pub use crate::field::PrimeField;
pub use crate::formula::{catalog, lookup, CoordinateModel, Formula, FormulaBuilder};
pub use crate::poly::{Monomial, Poly};
pub use crate::zvp::{zvp_points, ZvpPoint};
