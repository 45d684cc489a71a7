// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Arithmetic in a dynamically chosen prime field \\(\mathbb{F}_p\\).
//!
//! Unlike a fixed-modulus curve library, the analysis engine must work
//! over whichever base field the curve under analysis uses, so the
//! modulus is a runtime value. Elements are canonical residues stored as
//! [`BigUint`]; all operations go through a [`PrimeField`] context that
//! owns the modulus.
//!
//! Constructing a [`PrimeField`] checks that the modulus is an odd prime
//! (Miller–Rabin). Symbolic execution and factoring are meaningless over
//! a non-field, so a bad modulus is rejected up front with
//! [`Error::NotPrime`] rather than producing garbage factorizations.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::RngCore;

use crate::errors::Error;

/// Miller–Rabin witnesses; deterministic for all moduli below 3.3e24,
/// and an overwhelming-probability test beyond that.
const MILLER_RABIN_BASES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// A prime field with a runtime modulus.
///
/// Elements are canonical residues in `[0, p)`. The context is cheap to
/// clone by reference and is threaded explicitly through every polynomial
/// and curve operation in this crate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrimeField {
    modulus: BigUint,
}

impl PrimeField {
    /// Construct the field \\(\mathbb{F}_p\\).
    ///
    /// Returns [`Error::NotPrime`] unless `modulus` is an odd prime.
    pub fn new(modulus: BigUint) -> Result<PrimeField, Error> {
        if modulus <= BigUint::from(2u32) || modulus.is_even() || !is_probable_prime(&modulus) {
            return Err(Error::NotPrime);
        }
        Ok(PrimeField { modulus })
    }

    /// The field modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Reduce an arbitrary integer into canonical form.
    pub fn reduce(&self, n: &BigUint) -> BigUint {
        n % &self.modulus
    }

    /// Map a (possibly negative) machine integer into the field.
    pub fn from_i64(&self, n: i64) -> BigUint {
        let mag = self.reduce(&BigUint::from(n.unsigned_abs()));
        if n < 0 {
            self.neg(&mag)
        } else {
            mag
        }
    }

    /// `a + b (mod p)`.
    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.modulus
    }

    /// `a - b (mod p)`.
    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        ((a + &self.modulus) - b) % &self.modulus
    }

    /// `-a (mod p)`.
    pub fn neg(&self, a: &BigUint) -> BigUint {
        if a.is_zero() {
            BigUint::zero()
        } else {
            &self.modulus - a
        }
    }

    /// `a * b (mod p)`.
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    /// `a^e (mod p)`.
    pub fn pow(&self, a: &BigUint, e: &BigUint) -> BigUint {
        a.modpow(e, &self.modulus)
    }

    /// Multiplicative inverse by Fermat's little theorem.
    ///
    /// Total function: maps zero to zero; callers that must reject
    /// zero check [`BigUint::is_zero`] first.
    pub fn invert(&self, a: &BigUint) -> BigUint {
        if a.is_zero() {
            return BigUint::zero();
        }
        let e = &self.modulus - BigUint::from(2u32);
        a.modpow(&e, &self.modulus)
    }

    /// Whether `a` is a nonzero quadratic residue, i.e. the Legendre
    /// symbol equals one.
    pub fn is_square(&self, a: &BigUint) -> bool {
        if a.is_zero() {
            return false;
        }
        let e = (&self.modulus - BigUint::one()) >> 1;
        a.modpow(&e, &self.modulus).is_one()
    }

    /// A square root of `a`, if one exists.
    ///
    /// Uses the `(p+1)/4` exponentiation when `p ≡ 3 (mod 4)` and
    /// Tonelli–Shanks otherwise. Returns `None` for quadratic
    /// non-residues; zero maps to zero.
    pub fn sqrt(&self, a: &BigUint) -> Option<BigUint> {
        if a.is_zero() {
            return Some(BigUint::zero());
        }
        if !self.is_square(a) {
            return None;
        }
        if (&self.modulus % BigUint::from(4u32)) == BigUint::from(3u32) {
            let e = (&self.modulus + BigUint::one()) >> 2;
            return Some(a.modpow(&e, &self.modulus));
        }
        Some(self.tonelli_shanks(a))
    }

    // Tonelli–Shanks for p ≡ 1 (mod 4). Caller has already verified that
    // `a` is a nonzero residue, so the main loop terminates.
    fn tonelli_shanks(&self, a: &BigUint) -> BigUint {
        let one = BigUint::one();
        let mut q = &self.modulus - &one;
        let mut s = 0u32;
        while q.is_even() {
            q >>= 1;
            s += 1;
        }

        // Smallest non-residue; half of all elements qualify, so the scan
        // is short.
        let mut z = BigUint::from(2u32);
        while self.is_square(&z) {
            z += &one;
        }

        let mut m = s;
        let mut c = z.modpow(&q, &self.modulus);
        let mut t = a.modpow(&q, &self.modulus);
        let e = (&q + &one) >> 1;
        let mut r = a.modpow(&e, &self.modulus);

        while !t.is_one() {
            let mut i = 0u32;
            let mut t2 = t.clone();
            while !t2.is_one() {
                t2 = self.mul(&t2, &t2);
                i += 1;
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = self.mul(&b, &b);
            }
            m = i;
            c = self.mul(&b, &b);
            t = self.mul(&t, &c);
            r = self.mul(&r, &b);
        }
        r
    }

    /// A uniformly random non-zero field element, for projective
    /// re-randomization and randomized checks.
    pub fn random_nonzero<R: RngCore + ?Sized>(&self, rng: &mut R) -> BigUint {
        let len = ((self.modulus.bits() + 7) / 8) as usize;
        let mut buf = vec![0u8; len + 8];
        loop {
            rng.fill_bytes(&mut buf);
            let candidate = BigUint::from_bytes_le(&buf) % &self.modulus;
            if !candidate.is_zero() {
                return candidate;
            }
        }
    }
}

/// Miller–Rabin primality test with the fixed witness set.
fn is_probable_prime(n: &BigUint) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let n_minus_one = n - &one;

    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    'witness: for base in MILLER_RABIN_BASES {
        let a = BigUint::from(base);
        if &a >= n {
            continue;
        }
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 0..s.saturating_sub(1) {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;

    fn f64_field() -> PrimeField {
        // The 64-bit analysis prime used throughout the test suite.
        let p = BigUint::parse_bytes(b"c50de883f0e7b167", 16).unwrap();
        PrimeField::new(p).unwrap()
    }

    #[test]
    fn rejects_composite_and_even_moduli() {
        assert_eq!(PrimeField::new(BigUint::from(1u32)).unwrap_err(), Error::NotPrime);
        assert_eq!(PrimeField::new(BigUint::from(16u32)).unwrap_err(), Error::NotPrime);
        assert_eq!(PrimeField::new(BigUint::from(91u32)).unwrap_err(), Error::NotPrime);
        assert!(PrimeField::new(BigUint::from(101u32)).is_ok());
    }

    #[test]
    fn subtraction_wraps() {
        let f = f64_field();
        let a = BigUint::from(3u32);
        let b = BigUint::from(5u32);
        let d = f.sub(&a, &b);
        assert_eq!(f.add(&d, &b), a);
    }

    #[test]
    fn inversion_round_trips() {
        let f = f64_field();
        let a = BigUint::from(0xdeadbeefu64);
        let inv = f.invert(&a);
        assert!(f.mul(&a, &inv).is_one());
        assert!(f.invert(&BigUint::zero()).is_zero());
    }

    #[test]
    fn signed_constants_reduce() {
        let f = f64_field();
        let minus_one = f.from_i64(-1);
        assert_eq!(f.add(&minus_one, &BigUint::one()), BigUint::zero());
    }

    #[test]
    fn sqrt_of_squares() {
        let f = f64_field();
        for n in [2u64, 3, 1234567891011, 0xdead_beef_cafe] {
            let a = BigUint::from(n);
            let sq = f.mul(&a, &a);
            let r = f.sqrt(&sq).unwrap();
            assert!(r == a || r == f.neg(&a));
        }
    }

    #[test]
    fn minus_one_is_nonresidue_for_p_3_mod_4() {
        // p = 0xc50de883f0e7b167 ≡ 3 (mod 4), so -1 has no square root.
        let f = f64_field();
        let minus_one = f.from_i64(-1);
        assert!(f.sqrt(&minus_one).is_none());
    }

    #[test]
    fn tonelli_shanks_on_1_mod_4_prime() {
        let f = PrimeField::new(BigUint::from(1000000007u64)).unwrap(); // ≡ 3 mod 4? 1000000007 % 4 == 3
        let g = PrimeField::new(BigUint::from(998244353u64)).unwrap(); // ≡ 1 mod 4
        for field in [f, g] {
            let a = BigUint::from(12345u64);
            let sq = field.mul(&a, &a);
            let r = field.sqrt(&sq).unwrap();
            assert_eq!(field.mul(&r, &r), sq);
        }
    }

    #[test]
    fn random_nonzero_is_in_range() {
        let f = f64_field();
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let x = f.random_nonzero(&mut rng);
            assert!(!x.is_zero());
            assert!(&x < f.modulus());
        }
    }
}
