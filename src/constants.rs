// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Well-known analysis curves.
//!
//! Real deployment curves make distinguishing experiments slow to grind
//! through; the 64-bit curve below has a prime order and cofactor one,
//! and is small enough that factor sets, ZVP points and distinguishing
//! tables compute in moments while still exercising every code path a
//! full-size curve would.

use num_bigint::BigUint;

use crate::curve::WeierstrassCurve;
use crate::errors::Error;

fn hex(s: &[u8]) -> BigUint {
    BigUint::parse_bytes(s, 16).expect("constant is valid hex")
}

/// The 64-bit test curve used throughout the test suite and examples.
///
/// `p = 0xc50de883f0e7b167`, `a = 0x4833d7aa73fa6694`,
/// `b = 0xa6c44a61c5323f6a`, generator
/// `(0x5fd1f7d38d4f2333, 0x21f43957d7e20ceb)`,
/// order `n = 0xc50de885003b80eb`, cofactor `1`.
pub fn zvp_test_curve() -> Result<WeierstrassCurve, Error> {
    WeierstrassCurve::new(
        hex(b"c50de883f0e7b167"),
        hex(b"4833d7aa73fa6694"),
        hex(b"a6c44a61c5323f6a"),
        hex(b"5fd1f7d38d4f2333"),
        hex(b"21f43957d7e20ceb"),
        hex(b"c50de885003b80eb"),
        BigUint::from(1u32),
    )
}
