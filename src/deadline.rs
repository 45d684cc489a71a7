// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Cooperative deadlines for long-running polynomial computations.
//!
//! Factoring and root finding are CPU-bound and their cost grows quickly
//! with symbolic degree. Every potentially long loop in this crate
//! periodically calls [`Deadline::check`], so a batch driver sweeping many
//! (polynomial, multiplier) pairs can bound each item and skip on
//! [`crate::Error::Timeout`] instead of hanging the whole sweep.

use std::time::{Duration, Instant};

use crate::errors::Error;

/// An optional point in time after which cooperative computations fail
/// with [`Error::Timeout`].
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline; computations run to completion.
    pub fn none() -> Deadline {
        Deadline { at: None }
    }

    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Deadline {
        Deadline {
            at: Some(Instant::now() + budget),
        }
    }

    /// Fail with [`Error::Timeout`] if the deadline has passed.
    ///
    /// `operation` names the computation being cancelled and is carried in
    /// the error for reporting.
    pub fn check(&self, operation: &'static str) -> Result<(), Error> {
        match self.at {
            Some(at) if Instant::now() >= at => Err(Error::Timeout { operation }),
            _ => Ok(()),
        }
    }
}

impl Default for Deadline {
    fn default() -> Deadline {
        Deadline::none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn none_never_expires() {
        let d = Deadline::none();
        assert!(d.check("anything").is_ok());
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let d = Deadline::after(Duration::ZERO);
        assert_eq!(
            d.check("factoring"),
            Err(Error::Timeout { operation: "factoring" })
        );
    }
}
