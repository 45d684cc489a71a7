// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Dense univariate polynomial algebra over a [`PrimeField`].
//!
//! This module carries the computational core the ZVP constructor leans
//! on: Euclidean division, gcds, modular exponentiation in the quotient
//! ring, squarefree decomposition, factorization into irreducibles
//! (distinct-degree then equal-degree splitting), and root finding over
//! the field.
//!
//! Equal-degree splitting uses successive shifts `x + c` as splitting
//! elements instead of random polynomials, which makes factorization
//! fully deterministic; over a large prime field a handful of shifts
//! always suffices.
//!
//! All loops whose iteration count depends on the modulus size or the
//! polynomial degree observe a cooperative [`Deadline`].

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::deadline::Deadline;
use crate::errors::Error;
use crate::field::PrimeField;

/// A univariate polynomial, coefficients low-to-high with no trailing
/// zeros.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct UniPoly {
    coeffs: Vec<BigUint>,
}

impl UniPoly {
    /// The zero polynomial.
    pub fn zero() -> UniPoly {
        UniPoly { coeffs: Vec::new() }
    }

    /// The constant one.
    pub fn one() -> UniPoly {
        UniPoly { coeffs: vec![BigUint::one()] }
    }

    /// A constant polynomial (already reduced).
    pub fn constant(c: BigUint) -> UniPoly {
        UniPoly::from_coeffs(vec![c])
    }

    /// The polynomial `x`.
    pub fn x() -> UniPoly {
        UniPoly { coeffs: vec![BigUint::zero(), BigUint::one()] }
    }

    /// `c * x^d`.
    pub fn monomial(c: BigUint, d: usize) -> UniPoly {
        if c.is_zero() {
            return UniPoly::zero();
        }
        let mut coeffs = vec![BigUint::zero(); d + 1];
        coeffs[d] = c;
        UniPoly { coeffs }
    }

    /// Build from a coefficient vector (low-to-high), trimming zeros.
    pub fn from_coeffs(mut coeffs: Vec<BigUint>) -> UniPoly {
        while coeffs.last().map(BigUint::is_zero) == Some(true) {
            coeffs.pop();
        }
        UniPoly { coeffs }
    }

    /// Coefficient slice, low-to-high.
    pub fn coeffs(&self) -> &[BigUint] {
        &self.coeffs
    }

    /// Degree, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// Whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Whether this polynomial has degree zero or is zero.
    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    /// Leading coefficient, if nonzero.
    pub fn leading(&self) -> Option<&BigUint> {
        self.coeffs.last()
    }

    /// Coefficient of `x^i` (zero beyond the degree).
    pub fn coeff(&self, i: usize) -> BigUint {
        self.coeffs.get(i).cloned().unwrap_or_else(BigUint::zero)
    }

    /// `self + other`.
    pub fn add(&self, other: &UniPoly, field: &PrimeField) -> UniPoly {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(field.add(&self.coeff(i), &other.coeff(i)));
        }
        UniPoly::from_coeffs(out)
    }

    /// `self - other`.
    pub fn sub(&self, other: &UniPoly, field: &PrimeField) -> UniPoly {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(field.sub(&self.coeff(i), &other.coeff(i)));
        }
        UniPoly::from_coeffs(out)
    }

    /// `-self`.
    pub fn neg(&self, field: &PrimeField) -> UniPoly {
        UniPoly::from_coeffs(self.coeffs.iter().map(|c| field.neg(c)).collect())
    }

    /// `self * other`.
    pub fn mul(&self, other: &UniPoly, field: &PrimeField) -> UniPoly {
        if self.is_zero() || other.is_zero() {
            return UniPoly::zero();
        }
        let mut out = vec![BigUint::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = field.add(&out[i + j], &field.mul(a, b));
            }
        }
        UniPoly::from_coeffs(out)
    }

    /// `self * c`.
    pub fn scale(&self, c: &BigUint, field: &PrimeField) -> UniPoly {
        UniPoly::from_coeffs(self.coeffs.iter().map(|a| field.mul(a, c)).collect())
    }

    /// Scale so the leading coefficient is one.
    pub fn monic(&self, field: &PrimeField) -> UniPoly {
        match self.leading() {
            None => UniPoly::zero(),
            Some(lc) if lc.is_one() => self.clone(),
            Some(lc) => self.scale(&field.invert(lc), field),
        }
    }

    /// Formal derivative.
    pub fn derivative(&self, field: &PrimeField) -> UniPoly {
        if self.coeffs.len() <= 1 {
            return UniPoly::zero();
        }
        let mut out = Vec::with_capacity(self.coeffs.len() - 1);
        for (i, c) in self.coeffs.iter().enumerate().skip(1) {
            let k = field.reduce(&BigUint::from(i));
            out.push(field.mul(c, &k));
        }
        UniPoly::from_coeffs(out)
    }

    /// Evaluate at `x` by Horner's rule.
    pub fn eval(&self, x: &BigUint, field: &PrimeField) -> BigUint {
        let mut acc = BigUint::zero();
        for c in self.coeffs.iter().rev() {
            acc = field.add(&field.mul(&acc, x), c);
        }
        acc
    }

    /// Euclidean division: `(quotient, remainder)`.
    ///
    /// The divisor must be nonzero.
    pub fn divrem(&self, divisor: &UniPoly, field: &PrimeField) -> Result<(UniPoly, UniPoly), Error> {
        let d_deg = match divisor.degree() {
            None => return Err(Error::ZeroInverse),
            Some(d) => d,
        };
        let lc_inv = field.invert(divisor.leading().ok_or(Error::ZeroInverse)?);
        let mut rem = self.coeffs.clone();
        if rem.len() <= d_deg {
            return Ok((UniPoly::zero(), self.clone()));
        }
        let mut quot = vec![BigUint::zero(); rem.len() - d_deg];
        for i in (d_deg..rem.len()).rev() {
            let factor = field.mul(&rem[i], &lc_inv);
            if factor.is_zero() {
                continue;
            }
            quot[i - d_deg] = factor.clone();
            for (j, dc) in divisor.coeffs.iter().enumerate() {
                let idx = i - d_deg + j;
                rem[idx] = field.sub(&rem[idx], &field.mul(&factor, dc));
            }
        }
        Ok((UniPoly::from_coeffs(quot), UniPoly::from_coeffs(rem)))
    }

    /// Exact division; the divisor must divide `self`.
    pub fn exact_div(&self, divisor: &UniPoly, field: &PrimeField) -> Result<UniPoly, Error> {
        let (q, r) = self.divrem(divisor, field)?;
        if !r.is_zero() {
            return Err(Error::Internal("inexact univariate division"));
        }
        Ok(q)
    }

    /// `self mod m`.
    pub fn rem(&self, m: &UniPoly, field: &PrimeField) -> Result<UniPoly, Error> {
        Ok(self.divrem(m, field)?.1)
    }
}

/// Monic greatest common divisor.
pub fn gcd(a: &UniPoly, b: &UniPoly, field: &PrimeField, deadline: Deadline) -> Result<UniPoly, Error> {
    let mut a = a.clone();
    let mut b = b.clone();
    while !b.is_zero() {
        deadline.check("univariate gcd")?;
        let r = a.rem(&b, field)?;
        a = b;
        b = r;
    }
    Ok(a.monic(field))
}

/// `base^e mod m` by square-and-multiply in the quotient ring.
pub fn pow_mod(
    base: &UniPoly,
    e: &BigUint,
    m: &UniPoly,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<UniPoly, Error> {
    let mut acc = UniPoly::one().rem(m, field)?;
    let mut base = base.rem(m, field)?;
    let bits = e.bits();
    for i in 0..bits {
        deadline.check("polynomial exponentiation")?;
        if e.bit(i) {
            acc = acc.mul(&base, field).rem(m, field)?;
        }
        if i + 1 < bits {
            base = base.mul(&base, field).rem(m, field)?;
        }
    }
    Ok(acc)
}

/// Squarefree decomposition of a nonzero polynomial (Yun's algorithm):
/// pairs `(factor, multiplicity)` with the factors pairwise coprime and
/// squarefree.
///
/// Over the large primes this crate targets every degree is far below
/// the characteristic, so a vanishing derivative can only come from a
/// constant input.
pub fn squarefree_decomposition(
    f: &UniPoly,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Vec<(UniPoly, u32)>, Error> {
    let f = f.monic(field);
    if f.is_constant() {
        return Ok(Vec::new());
    }
    let df = f.derivative(field);
    if df.is_zero() {
        return Err(Error::Internal("derivative vanished below characteristic"));
    }
    let mut out = Vec::new();
    let mut g = gcd(&f, &df, field, deadline)?;
    let mut w = f.exact_div(&g, field)?;
    let mut i = 1u32;
    while !w.is_constant() {
        deadline.check("squarefree decomposition")?;
        let y = gcd(&w, &g, field, deadline)?;
        let z = w.exact_div(&y, field)?;
        if !z.is_constant() {
            out.push((z, i));
        }
        w = y;
        g = g.exact_div(&w, field)?;
        i += 1;
    }
    Ok(out)
}

/// Factor a nonzero polynomial into monic irreducibles with
/// multiplicities.
pub fn factor(
    f: &UniPoly,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Vec<(UniPoly, u32)>, Error> {
    let mut out = Vec::new();
    for (sf, mult) in squarefree_decomposition(f, field, deadline)? {
        for (g, d) in distinct_degree(&sf, field, deadline)? {
            for irr in equal_degree(&g, d, field, deadline)? {
                out.push((irr, mult));
            }
        }
    }
    Ok(out)
}

/// All roots of `f` in the field (without multiplicity).
///
/// An empty vector is a normal outcome: absence of roots is meaningful,
/// not a failure.
pub fn roots(f: &UniPoly, field: &PrimeField, deadline: Deadline) -> Result<Vec<BigUint>, Error> {
    let f = f.monic(field);
    match f.degree() {
        None | Some(0) => return Ok(Vec::new()),
        Some(1) => return Ok(vec![field.neg(&f.coeff(0))]),
        _ => {}
    }
    // Keep only the linear part: gcd(x^p - x, f).
    let xp = pow_mod(&UniPoly::x(), field.modulus(), &f, field, deadline)?;
    let linear_part = gcd(&xp.sub(&UniPoly::x(), field), &f, field, deadline)?;
    let mut out = Vec::new();
    for lin in equal_degree(&linear_part, 1, field, deadline)? {
        out.push(field.neg(&lin.coeff(0)));
    }
    out.sort();
    Ok(out)
}

/// Distinct-degree factorization of a monic squarefree polynomial:
/// pairs `(product, d)` where `product` is the product of all
/// irreducible factors of degree `d`.
fn distinct_degree(
    f: &UniPoly,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Vec<(UniPoly, usize)>, Error> {
    let mut out = Vec::new();
    let mut v = f.monic(field);
    let mut h = UniPoly::x();
    let mut d = 0usize;
    while v.degree().unwrap_or(0) >= 2 * (d + 1) {
        deadline.check("distinct-degree factorization")?;
        d += 1;
        h = pow_mod(&h, field.modulus(), &v, field, deadline)?;
        let g = gcd(&h.sub(&UniPoly::x(), field), &v, field, deadline)?;
        if !g.is_constant() {
            out.push((g.clone(), d));
            v = v.exact_div(&g, field)?;
            h = h.rem(&v, field)?;
        }
    }
    if !v.is_constant() {
        let deg = v.degree().unwrap_or(0);
        out.push((v, deg));
    }
    Ok(out)
}

/// Equal-degree splitting: factor a monic product of irreducibles all of
/// degree `d` into the individual irreducibles, deterministically, by
/// scanning splitting elements `x + c`.
fn equal_degree(
    g: &UniPoly,
    d: usize,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Vec<UniPoly>, Error> {
    let deg = match g.degree() {
        None | Some(0) => return Ok(Vec::new()),
        Some(deg) => deg,
    };
    if deg == d {
        return Ok(vec![g.monic(field)]);
    }
    // (p^d - 1) / 2
    let e = (field.modulus().pow(d as u32) - BigUint::one()) >> 1;
    let mut shift = BigUint::zero();
    loop {
        deadline.check("equal-degree splitting")?;
        let base = UniPoly::from_coeffs(vec![shift.clone(), BigUint::one()]);
        let h = pow_mod(&base, &e, g, field, deadline)?.sub(&UniPoly::one(), field);
        let s = gcd(&h, g, field, deadline)?;
        let s_deg = s.degree().unwrap_or(0);
        if s_deg > 0 && s_deg < deg {
            let rest = g.exact_div(&s, field)?;
            let mut out = equal_degree(&s, d, field, deadline)?;
            out.extend(equal_degree(&rest, d, field, deadline)?);
            return Ok(out);
        }
        shift += BigUint::one();
    }
}
