// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Sparse multivariate polynomials over a [`PrimeField`].
//!
//! These are the symbolic values produced by tracing a formula: the
//! variables are the *names* of affine coordinates and curve parameters
//! (`x1`, `y1`, `x2`, `y2`, `a`, `b`, …) while the coefficients live in
//! the concrete field, so that constants fold and cancel correctly during
//! execution.
//!
//! Terms are kept in a [`BTreeMap`] under a graded-lexicographic monomial
//! order, which makes equality, ordering, hashing and the canonical monic
//! form all deterministic — the executor's determinism property rests on
//! this representation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::errors::Error;
use crate::field::PrimeField;

/// A monomial: a finite map from variable name to positive exponent.
///
/// The empty monomial is the constant term. Ordering is graded
/// lexicographic: first by total degree, then by the variable/exponent
/// sequence.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Monomial(BTreeMap<String, u32>);

impl Monomial {
    /// The constant monomial.
    pub fn one() -> Monomial {
        Monomial(BTreeMap::new())
    }

    /// The monomial consisting of a single variable.
    pub fn variable(name: &str) -> Monomial {
        let mut m = BTreeMap::new();
        m.insert(name.to_owned(), 1);
        Monomial(m)
    }

    /// Total degree (sum of exponents).
    pub fn total_degree(&self) -> u32 {
        self.0.values().sum()
    }

    /// Exponent of `name` in this monomial.
    pub fn exponent(&self, name: &str) -> u32 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Product of two monomials (exponents add).
    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut out = self.0.clone();
        for (v, e) in &other.0 {
            *out.entry(v.clone()).or_insert(0) += e;
        }
        Monomial(out)
    }

    /// Quotient `self / other`, if `other` divides `self`.
    pub fn div(&self, other: &Monomial) -> Option<Monomial> {
        let mut out = self.0.clone();
        for (v, e) in &other.0 {
            let slot = out.get_mut(v)?;
            if *slot < *e {
                return None;
            }
            *slot -= e;
            if *slot == 0 {
                out.remove(v);
            }
        }
        Some(Monomial(out))
    }

    /// Variables appearing with positive exponent.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }
}

impl Ord for Monomial {
    // Graded lexicographic: total degree first, then lexicographic on the
    // exponent vector with variables in name order. The tie-break must be
    // a true lex order (not a map comparison) so that the order is
    // multiplicative, which leading-term division relies on.
    fn cmp(&self, other: &Monomial) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        let by_degree = self.total_degree().cmp(&other.total_degree());
        if by_degree != Ordering::Equal {
            return by_degree;
        }
        let mut a = self.0.iter();
        let mut b = other.0.iter();
        let mut xa = a.next();
        let mut xb = b.next();
        loop {
            match (xa, xb) {
                (None, None) => return Ordering::Equal,
                // leftover exponent on a variable the other side lacks:
                // positive exponent on an earlier variable sorts higher
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((va, ea)), Some((vb, eb))) => {
                    if va < vb {
                        return Ordering::Greater;
                    }
                    if va > vb {
                        return Ordering::Less;
                    }
                    match ea.cmp(eb) {
                        Ordering::Equal => {
                            xa = a.next();
                            xb = b.next();
                        }
                        unequal => return unequal,
                    }
                }
            }
        }
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Monomial) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A multivariate polynomial with coefficients in a prime field.
///
/// Invariant: no stored coefficient is zero; the zero polynomial has no
/// terms. All arithmetic goes through an explicit [`PrimeField`] context.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigUint>,
}

impl Poly {
    /// The zero polynomial.
    pub fn zero() -> Poly {
        Poly { terms: BTreeMap::new() }
    }

    /// A constant polynomial (reduced into the field).
    pub fn constant(c: &BigUint, field: &PrimeField) -> Poly {
        let c = field.reduce(c);
        let mut terms = BTreeMap::new();
        if !c.is_zero() {
            terms.insert(Monomial::one(), c);
        }
        Poly { terms }
    }

    /// The polynomial consisting of the single variable `name`.
    pub fn variable(name: &str) -> Poly {
        let mut terms = BTreeMap::new();
        terms.insert(Monomial::variable(name), BigUint::one());
        Poly { terms }
    }

    /// Build from explicit terms, dropping zero coefficients.
    pub fn from_terms(terms: impl IntoIterator<Item = (Monomial, BigUint)>, field: &PrimeField) -> Poly {
        let mut out = Poly::zero();
        for (m, c) in terms {
            out.add_term(m, field.reduce(&c), field);
        }
        out
    }

    fn add_term(&mut self, monomial: Monomial, coeff: BigUint, field: &PrimeField) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.remove(&monomial) {
            None => {
                self.terms.insert(monomial, coeff);
            }
            Some(existing) => {
                let sum = field.add(&existing, &coeff);
                if !sum.is_zero() {
                    self.terms.insert(monomial, sum);
                }
            }
        }
    }

    /// Whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether this polynomial is a (possibly zero) constant.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
            || (self.terms.len() == 1 && self.terms.keys().next().map(Monomial::total_degree) == Some(0))
    }

    /// The constant value, if this polynomial is constant.
    pub fn constant_value(&self) -> Option<BigUint> {
        if self.is_zero() {
            return Some(BigUint::zero());
        }
        if self.is_constant() {
            return self.terms.values().next().cloned();
        }
        None
    }

    /// The set of free variables this polynomial depends on.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for m in self.terms.keys() {
            for v in m.variables() {
                out.insert(v.to_owned());
            }
        }
        out
    }

    /// Iterate terms in the canonical monomial order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigUint)> {
        self.terms.iter()
    }

    /// Number of terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Total degree; zero for the zero polynomial.
    pub fn total_degree(&self) -> u32 {
        self.terms.keys().map(Monomial::total_degree).max().unwrap_or(0)
    }

    /// Degree in a single variable.
    pub fn degree_in(&self, name: &str) -> u32 {
        self.terms.keys().map(|m| m.exponent(name)).max().unwrap_or(0)
    }

    /// The leading (greatest) monomial and its coefficient.
    pub fn leading_term(&self) -> Option<(&Monomial, &BigUint)> {
        self.terms.iter().next_back()
    }

    /// `self + other`.
    pub fn add(&self, other: &Poly, field: &PrimeField) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), c.clone(), field);
        }
        out
    }

    /// `-self`.
    pub fn neg(&self, field: &PrimeField) -> Poly {
        let terms = self
            .terms
            .iter()
            .map(|(m, c)| (m.clone(), field.neg(c)))
            .collect();
        Poly { terms }
    }

    /// `self - other`.
    pub fn sub(&self, other: &Poly, field: &PrimeField) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), field.neg(c), field);
        }
        out
    }

    /// `self * other`.
    pub fn mul(&self, other: &Poly, field: &PrimeField) -> Poly {
        let mut out = Poly::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                out.add_term(m1.mul(m2), field.mul(c1, c2), field);
            }
        }
        out
    }

    /// `self * c` for a scalar `c`.
    pub fn scale(&self, c: &BigUint, field: &PrimeField) -> Poly {
        let mut out = Poly::zero();
        for (m, coeff) in &self.terms {
            out.add_term(m.clone(), field.mul(coeff, c), field);
        }
        out
    }

    /// `self^2`.
    pub fn sqr(&self, field: &PrimeField) -> Poly {
        self.mul(self, field)
    }

    /// `self^e` by repeated squaring.
    pub fn pow(&self, e: u32, field: &PrimeField) -> Poly {
        let mut base = self.clone();
        let mut acc = Poly::constant(&BigUint::one(), field);
        let mut e = e;
        while e > 0 {
            if e & 1 == 1 {
                acc = acc.mul(&base, field);
            }
            e >>= 1;
            if e > 0 {
                base = base.sqr(field);
            }
        }
        acc
    }

    /// Partial derivative with respect to `name`.
    pub fn derivative(&self, name: &str, field: &PrimeField) -> Poly {
        let mut out = Poly::zero();
        for (m, c) in &self.terms {
            let e = m.exponent(name);
            if e == 0 {
                continue;
            }
            let mut reduced = m.clone();
            // exponent e >= 1, so division by the single variable succeeds
            if let Some(r) = reduced.div(&Monomial::variable(name)) {
                reduced = r;
            }
            let coeff = field.mul(c, &field.reduce(&BigUint::from(e)));
            out.add_term(reduced, coeff, field);
        }
        out
    }

    /// Evaluate at a full assignment of the free variables.
    ///
    /// Fails with [`Error::UnboundVariable`] if a variable has no value.
    pub fn evaluate(
        &self,
        assignment: &BTreeMap<String, BigUint>,
        field: &PrimeField,
    ) -> Result<BigUint, Error> {
        let mut acc = BigUint::zero();
        for (m, c) in &self.terms {
            let mut term = c.clone();
            for v in m.variables() {
                let value = assignment
                    .get(v)
                    .ok_or_else(|| Error::UnboundVariable { name: v.to_owned() })?;
                let e = BigUint::from(m.exponent(v));
                term = field.mul(&term, &field.pow(value, &e));
            }
            acc = field.add(&acc, &term);
        }
        Ok(acc)
    }

    /// Canonical form: scale so the leading coefficient is one.
    ///
    /// Unit multiples (`2x` and `x`) collapse to the same monic
    /// polynomial, which is what factor-set deduplication keys on.
    pub fn monic(&self, field: &PrimeField) -> Poly {
        match self.leading_term() {
            None => Poly::zero(),
            Some((_, lc)) => {
                if lc.is_one() {
                    self.clone()
                } else {
                    let inv = field.invert(lc);
                    self.scale(&inv, field)
                }
            }
        }
    }

    /// View as a univariate coefficient vector in `name`, if no other
    /// variable occurs. Index `i` holds the coefficient of `name^i`.
    pub fn as_univariate(&self, name: &str) -> Option<Vec<BigUint>> {
        let vars = self.variables();
        if vars.iter().any(|v| v != name) {
            return None;
        }
        let deg = self.degree_in(name) as usize;
        let mut coeffs = vec![BigUint::zero(); deg + 1];
        for (m, c) in &self.terms {
            coeffs[m.exponent(name) as usize] = c.clone();
        }
        Some(coeffs)
    }

    /// Decompose as a polynomial in `name` with [`Poly`] coefficients.
    /// Index `i` holds the coefficient of `name^i`.
    pub fn coefficients_in(&self, name: &str, field: &PrimeField) -> Vec<Poly> {
        let deg = self.degree_in(name) as usize;
        let mut out = vec![Poly::zero(); deg + 1];
        let var = Monomial::variable(name);
        for (m, c) in &self.terms {
            let e = m.exponent(name) as usize;
            let mut stripped = m.clone();
            for _ in 0..e {
                if let Some(s) = stripped.div(&var) {
                    stripped = s;
                }
            }
            out[e].add_term(stripped, c.clone(), field);
        }
        out
    }

    /// Rebuild from a coefficient decomposition in `name`.
    pub fn from_coefficients_in(name: &str, coeffs: &[Poly], field: &PrimeField) -> Poly {
        let var = Poly::variable(name);
        let mut out = Poly::zero();
        let mut power = Poly::constant(&BigUint::one(), field);
        for (i, c) in coeffs.iter().enumerate() {
            if i > 0 {
                power = power.mul(&var, field);
            }
            out = out.add(&c.mul(&power, field), field);
        }
        out
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        // highest-degree terms first, matching how formulas are written
        for (m, c) in self.terms.iter().rev() {
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            if m.total_degree() == 0 {
                write!(f, "{}", c)?;
                continue;
            }
            if !c.is_one() {
                write!(f, "{}*", c)?;
            }
            let mut first_var = true;
            for v in m.variables() {
                if !first_var {
                    write!(f, "*")?;
                }
                first_var = false;
                let e = m.exponent(v);
                if e == 1 {
                    write!(f, "{}", v)?;
                } else {
                    write!(f, "{}^{}", v, e)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field() -> PrimeField {
        PrimeField::new(BigUint::from(1000003u64)).unwrap()
    }

    fn x() -> Poly {
        Poly::variable("x")
    }

    fn y() -> Poly {
        Poly::variable("y")
    }

    #[test]
    fn arithmetic_identities() {
        let f = field();
        let p = x().mul(&y(), &f).add(&Poly::constant(&BigUint::from(5u32), &f), &f);
        assert_eq!(p.sub(&p, &f), Poly::zero());
        assert_eq!(p.add(&p.neg(&f), &f), Poly::zero());
        assert_eq!(p.sqr(&f), p.mul(&p, &f));
        assert_eq!(p.pow(3, &f), p.mul(&p.mul(&p, &f), &f));
    }

    #[test]
    fn difference_of_squares_expands() {
        let f = field();
        let sum = x().add(&y(), &f);
        let diff = x().sub(&y(), &f);
        let lhs = sum.mul(&diff, &f);
        let rhs = x().sqr(&f).sub(&y().sqr(&f), &f);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn variables_are_tracked() {
        let f = field();
        let p = x().mul(&y(), &f).add(&Poly::variable("a"), &f);
        let vars: Vec<String> = p.variables().into_iter().collect();
        assert_eq!(vars, vec!["a".to_owned(), "x".to_owned(), "y".to_owned()]);
        assert!(!p.is_constant());
        assert!(Poly::constant(&BigUint::from(7u32), &f).is_constant());
    }

    #[test]
    fn monic_collapses_unit_multiples() {
        let f = field();
        let p = x().add(&y(), &f);
        let two_p = p.scale(&BigUint::from(2u32), &f);
        assert_ne!(p, two_p);
        assert_eq!(p.monic(&f), two_p.monic(&f));
    }

    #[test]
    fn evaluation_matches_by_hand() {
        let f = field();
        // x^2*y + 3 at (x, y) = (5, 7): 25*7 + 3 = 178
        let p = x()
            .sqr(&f)
            .mul(&y(), &f)
            .add(&Poly::constant(&BigUint::from(3u32), &f), &f);
        let mut assign = BTreeMap::new();
        assign.insert("x".to_owned(), BigUint::from(5u32));
        assign.insert("y".to_owned(), BigUint::from(7u32));
        assert_eq!(p.evaluate(&assign, &f).unwrap(), BigUint::from(178u32));

        assign.remove("y");
        assert_eq!(
            p.evaluate(&assign, &f).unwrap_err(),
            Error::UnboundVariable { name: "y".to_owned() }
        );
    }

    #[test]
    fn derivative_of_power() {
        let f = field();
        // d/dx x^3 = 3x^2
        let p = x().pow(3, &f);
        let expected = x().sqr(&f).scale(&BigUint::from(3u32), &f);
        assert_eq!(p.derivative("x", &f), expected);
    }

    #[test]
    fn univariate_round_trip() {
        let f = field();
        let p = x().pow(2, &f).add(&Poly::constant(&BigUint::from(9u32), &f), &f);
        let coeffs = p.as_univariate("x").unwrap();
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[0], BigUint::from(9u32));
        assert_eq!(coeffs[2], BigUint::one());
        assert!(p.mul(&y(), &f).as_univariate("x").is_none());
    }

    #[test]
    fn coefficient_decomposition_round_trips() {
        let f = field();
        let p = x()
            .sqr(&f)
            .mul(&y(), &f)
            .add(&x().mul(&Poly::variable("a"), &f), &f)
            .add(&Poly::constant(&BigUint::from(11u32), &f), &f);
        let coeffs = p.coefficients_in("x", &f);
        let rebuilt = Poly::from_coefficients_in("x", &coeffs, &f);
        assert_eq!(p, rebuilt);
    }

    #[test]
    fn graded_order_puts_high_degree_last() {
        let m1 = Monomial::variable("x");
        let m2 = Monomial::variable("x").mul(&Monomial::variable("y"));
        assert!(m1 < m2);
    }
}
