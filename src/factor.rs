// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Factorization of multivariate trace polynomials.
//!
//! Formula intermediates are built almost entirely by ring operations on
//! earlier values, so the polynomials reaching this module are small:
//! monomial contents, repeated factors, and factors linear in one of the
//! few variables account for essentially everything that splits.
//!
//! The pipeline applied to each polynomial:
//!
//! 1. strip the monomial content (powers of single variables);
//! 2. polynomials in a single variable go to the complete univariate
//!    factorizer in [`crate::uni`];
//! 3. repeated factors are split off via a multivariate gcd with a
//!    partial derivative;
//! 4. polynomials linear in some variable split off the gcd of their two
//!    coefficient polynomials; the primitive linear remainder is
//!    irreducible;
//! 5. polynomials quadratic in some variable with constant leading
//!    coefficient split via the discriminant when it is a perfect
//!    polynomial square;
//! 6. what remains is kept whole, in canonical monic form, after a final
//!    pairwise-gcd refinement across the whole result set.
//!
//! Step 6 means splitting is best-effort beyond the cases above (no
//! multivariate Hensel lifting); the residual heuristics are policy, not
//! contract, and a composite survivor only makes a factor set coarser,
//! never unsound, because a product is zero exactly when a factor is.
//!
//! The multivariate gcd is the classic primitive pseudo-remainder
//! sequence, recursing on the variable set through content and primitive
//! parts.

use std::collections::BTreeSet;

use num_bigint::BigUint;
use num_traits::One;
use tracing::trace;

use crate::deadline::Deadline;
use crate::errors::Error;
use crate::field::PrimeField;
use crate::poly::{Monomial, Poly};
use crate::uni::{self, UniPoly};

/// Factor `f` into distinct monic factors (multiplicities dropped: the
/// factor-set construction only cares which conditions can vanish).
///
/// Constants and the zero polynomial yield an empty set.
pub fn factor(f: &Poly, field: &PrimeField, deadline: Deadline) -> Result<BTreeSet<Poly>, Error> {
    let mut out = BTreeSet::new();
    let mut stack = vec![f.clone()];
    while let Some(g) = stack.pop() {
        deadline.check("multivariate factorization")?;
        if g.is_constant() {
            continue;
        }

        // 1. Monomial content: each variable dividing every term splits
        //    off as a factor of its own.
        let (content_vars, g) = strip_monomial_content(&g, field);
        for v in content_vars {
            out.insert(Poly::variable(&v));
        }
        if g.is_constant() {
            continue;
        }

        let vars: Vec<String> = g.variables().into_iter().collect();

        // 2. Univariate images get the complete factorizer.
        if vars.len() == 1 {
            let coeffs = g
                .as_univariate(&vars[0])
                .ok_or(Error::Internal("univariate view disagreed with variable set"))?;
            for (irr, _mult) in uni::factor(&UniPoly::from_coeffs(coeffs), field, deadline)? {
                out.insert(univariate_to_poly(&irr, &vars[0], field));
            }
            continue;
        }

        // 3. Repeated factors: gcd with a partial derivative.
        if let Some((h, rest)) = split_squarefree(&g, &vars, field, deadline)? {
            stack.push(h);
            stack.push(rest);
            continue;
        }

        // 4. Linear in some variable: split off the coefficient gcd.
        if let Some((h, rest)) = split_linear(&g, &vars, field, deadline)? {
            stack.push(h);
            stack.push(rest);
            continue;
        }

        // 5. Quadratic in some variable with constant leading
        //    coefficient: complete the square.
        if let Some((h, rest)) = split_quadratic(&g, &vars, field, deadline)? {
            stack.push(h);
            stack.push(rest);
            continue;
        }

        // 6. No further splitting available.
        trace!(poly = %g, "keeping unsplit factor");
        out.insert(g.monic(field));
    }
    refine(out, field, deadline)
}

/// Pairwise-gcd refinement across a whole set of polynomials; used both
/// per-factorization and by the factor-set engine across a trace.
///
/// Replace any two set members sharing a proper
/// common divisor with the divisor and the cofactors, until the set is
/// pairwise coprime. Lets composites that survived the per-polynomial
/// pipeline be split by their co-members.
pub(crate) fn refine(
    set: BTreeSet<Poly>,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<BTreeSet<Poly>, Error> {
    let mut items: Vec<Poly> = set.into_iter().collect();
    'restart: loop {
        deadline.check("factor refinement")?;
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let g = gcd(&items[i], &items[j], field, deadline)?;
                if g.is_constant() {
                    continue;
                }
                let a = items[i].monic(field);
                let b = items[j].monic(field);
                if g == a && g == b {
                    continue;
                }
                // replace the pair by gcd and proper cofactors
                let mut replacements = vec![g.clone()];
                for item in [&a, &b] {
                    if let Some(q) = div_exact(item, &g, field) {
                        if !q.is_constant() {
                            replacements.push(q.monic(field));
                        }
                    }
                }
                items.swap_remove(j);
                items.swap_remove(i);
                items.extend(replacements);
                items.sort();
                items.dedup();
                continue 'restart;
            }
        }
        return Ok(items.into_iter().collect());
    }
}

/// Exact multivariate division by a single divisor under the graded
/// monomial order; `None` when the division is not exact.
pub fn div_exact(f: &Poly, divisor: &Poly, field: &PrimeField) -> Option<Poly> {
    let (lead_m, lead_c) = divisor.leading_term()?;
    let lead_m = lead_m.clone();
    let lead_c_inv = field.invert(lead_c);
    let mut rem = f.clone();
    let mut quot = Poly::zero();
    while !rem.is_zero() {
        let (m, c) = rem.leading_term()?;
        let qm = m.div(&lead_m)?;
        let qc = field.mul(c, &lead_c_inv);
        let term = Poly::from_terms([(qm, qc)], field);
        quot = quot.add(&term, field);
        rem = rem.sub(&term.mul(divisor, field), field);
    }
    Some(quot)
}

/// Multivariate monic gcd via a primitive pseudo-remainder sequence.
pub fn gcd(a: &Poly, b: &Poly, field: &PrimeField, deadline: Deadline) -> Result<Poly, Error> {
    deadline.check("multivariate gcd")?;
    if a.is_zero() {
        return Ok(b.monic(field));
    }
    if b.is_zero() {
        return Ok(a.monic(field));
    }
    if a.is_constant() || b.is_constant() {
        return Ok(Poly::constant(&BigUint::one(), field));
    }

    let common: Vec<String> = a
        .variables()
        .intersection(&b.variables())
        .cloned()
        .collect();
    let v = match common.first() {
        // No shared variable: coprime up to constants.
        None => return Ok(Poly::constant(&BigUint::one(), field)),
        Some(v) => v.clone(),
    };

    // Handle the single-shared-variable case through the dense algebra
    // when both sides are univariate in it.
    if let (Some(ca), Some(cb)) = (a.as_univariate(&v), b.as_univariate(&v)) {
        let g = uni::gcd(
            &UniPoly::from_coeffs(ca),
            &UniPoly::from_coeffs(cb),
            field,
            deadline,
        )?;
        return Ok(univariate_to_poly(&g, &v, field));
    }

    let fa = a.coefficients_in(&v, field);
    let fb = b.coefficients_in(&v, field);
    let cont_a = content(&fa, field, deadline)?;
    let cont_b = content(&fb, field, deadline)?;
    let pp_a = divide_coeffs(&fa, &cont_a, field)?;
    let pp_b = divide_coeffs(&fb, &cont_b, field)?;
    let cont = gcd(&cont_a, &cont_b, field, deadline)?;

    let (mut u, mut w) = if pp_a.len() >= pp_b.len() {
        (pp_a, pp_b)
    } else {
        (pp_b, pp_a)
    };
    loop {
        deadline.check("multivariate gcd")?;
        let r = pseudo_rem(&u, &w, field)?;
        if r.is_empty() {
            break;
        }
        let r_cont = content(&r, field, deadline)?;
        let r = divide_coeffs(&r, &r_cont, field)?;
        u = w;
        w = r;
    }
    let pp_gcd = Poly::from_coefficients_in(&v, &w, field);
    Ok(pp_gcd.mul(&cont, field).monic(field))
}

/// Strip every variable that divides all terms; returns the stripped
/// variables and the remaining polynomial.
fn strip_monomial_content(f: &Poly, field: &PrimeField) -> (Vec<String>, Poly) {
    let mut stripped = Vec::new();
    let mut g = f.clone();
    for v in f.variables() {
        let min = g.terms().map(|(m, _)| m.exponent(&v)).min().unwrap_or(0);
        if min == 0 {
            continue;
        }
        stripped.push(v.clone());
        let divisor = Poly::variable(&v).pow(min, field);
        if let Some(q) = div_exact(&g, &divisor, field) {
            g = q;
        }
    }
    (stripped, g)
}

/// Try to split a repeated factor out of `g` via `gcd(g, ∂g/∂v)`.
fn split_squarefree(
    g: &Poly,
    vars: &[String],
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Option<(Poly, Poly)>, Error> {
    for v in vars {
        if g.degree_in(v) == 0 {
            continue;
        }
        let d = g.derivative(v, field);
        if d.is_zero() {
            continue;
        }
        let h = gcd(g, &d, field, deadline)?;
        if h.is_constant() {
            continue;
        }
        let rest = div_exact(g, &h, field)
            .ok_or(Error::Internal("gcd does not divide its argument"))?;
        return Ok(Some((h, rest)));
    }
    Ok(None)
}

/// If `g = A·v + B` for some variable `v`, split off `gcd(A, B)`; a
/// primitive polynomial linear in a variable is irreducible.
fn split_linear(
    g: &Poly,
    vars: &[String],
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Option<(Poly, Poly)>, Error> {
    for v in vars {
        if g.degree_in(v) != 1 {
            continue;
        }
        let coeffs = g.coefficients_in(v, field);
        let c = gcd(&coeffs[0], &coeffs[1], field, deadline)?;
        if c.is_constant() {
            continue;
        }
        let rest = div_exact(g, &c, field)
            .ok_or(Error::Internal("coefficient gcd does not divide"))?;
        return Ok(Some((c, rest)));
    }
    Ok(None)
}

/// If `g = A·v² + B·v + C` with `A` a nonzero constant and the
/// discriminant `B² - 4AC` a perfect polynomial square `D²`, split into
/// the two linear-in-`v` factors `2Av + B ± D` (their product is `4A·g`,
/// so after monic normalization they are exactly the factors of `g`).
fn split_quadratic(
    g: &Poly,
    vars: &[String],
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Option<(Poly, Poly)>, Error> {
    let four = BigUint::from(4u32);
    let two = BigUint::from(2u32);
    for v in vars {
        if g.degree_in(v) != 2 {
            continue;
        }
        let coeffs = g.coefficients_in(v, field);
        let a = match coeffs[2].constant_value() {
            Some(a) => a,
            None => continue,
        };
        let b = &coeffs[1];
        let c = &coeffs[0];
        // B^2 - 4AC
        let disc = b
            .sqr(field)
            .sub(&c.scale(&field.mul(&four, &a), field), field);
        let d = match perfect_sqrt(&disc, field, deadline)? {
            Some(d) => d,
            None => continue,
        };
        let av = Poly::variable(v).scale(&field.mul(&two, &a), field);
        let f1 = av.add(b, field).add(&d, field);
        let f2 = av.add(b, field).sub(&d, field);
        if f1.is_constant() || f2.is_constant() {
            continue;
        }
        return Ok(Some((f1, f2)));
    }
    Ok(None)
}

/// The polynomial square root of `p`, if `p` is a perfect square.
///
/// Newton-style term-by-term extraction under the graded monomial order:
/// start from the square root of the leading term, then repeatedly divide
/// the residual's leading term by twice the initial root term.
fn perfect_sqrt(
    p: &Poly,
    field: &PrimeField,
    deadline: Deadline,
) -> Result<Option<Poly>, Error> {
    if p.is_zero() {
        return Ok(Some(Poly::zero()));
    }
    let (lead_m, lead_c) = match p.leading_term() {
        Some(t) => t,
        None => return Ok(Some(Poly::zero())),
    };
    // Leading monomial must have even exponents and a square coefficient.
    let lead_m = lead_m.clone();
    let lead_c = lead_c.clone();
    let mut half = Monomial::one();
    for v in lead_m.variables() {
        let e = lead_m.exponent(v);
        if e % 2 != 0 {
            return Ok(None);
        }
        for _ in 0..(e / 2) {
            half = half.mul(&Monomial::variable(v));
        }
    }
    let root_c = match field.sqrt(&lead_c) {
        Some(r) => r,
        None => return Ok(None),
    };
    let lead = Poly::from_terms([(half, root_c)], field);
    let twice_lead = lead.scale(&BigUint::from(2u32), field);

    let mut root = lead;
    loop {
        deadline.check("polynomial square root")?;
        let residual = p.sub(&root.sqr(field), field);
        if residual.is_zero() {
            return Ok(Some(root));
        }
        let (rm, rc) = match residual.leading_term() {
            Some(t) => (t.0.clone(), t.1.clone()),
            None => return Ok(Some(root)),
        };
        let (tm, tc) = match twice_lead.leading_term() {
            Some(t) => (t.0.clone(), t.1.clone()),
            None => return Ok(None),
        };
        let qm = match rm.div(&tm) {
            Some(qm) => qm,
            None => return Ok(None),
        };
        let qc = field.mul(&rc, &field.invert(&tc));
        let next = Poly::from_terms([(qm, qc)], field);
        // each correction strictly lowers the residual's leading monomial
        let updated = root.add(&next, field);
        if updated == root {
            return Ok(None);
        }
        root = updated;
    }
}

/// Gcd of a coefficient vector (the content of a polynomial viewed
/// univariately).
fn content(coeffs: &[Poly], field: &PrimeField, deadline: Deadline) -> Result<Poly, Error> {
    let mut acc = Poly::zero();
    for c in coeffs {
        if c.is_zero() {
            continue;
        }
        acc = gcd(&acc, c, field, deadline)?;
        if acc.is_constant() && !acc.is_zero() {
            break;
        }
    }
    if acc.is_zero() {
        acc = Poly::constant(&BigUint::one(), field);
    }
    Ok(acc)
}

fn divide_coeffs(coeffs: &[Poly], divisor: &Poly, field: &PrimeField) -> Result<Vec<Poly>, Error> {
    coeffs
        .iter()
        .map(|c| {
            if c.is_zero() {
                Ok(Poly::zero())
            } else {
                div_exact(c, divisor, field).ok_or(Error::Internal("content does not divide"))
            }
        })
        .collect()
}

/// Pseudo-remainder of two coefficient vectors in the eliminated
/// variable; empty vector encodes zero.
fn pseudo_rem(u: &[Poly], w: &[Poly], field: &PrimeField) -> Result<Vec<Poly>, Error> {
    let dw = w.len().checked_sub(1).ok_or(Error::Internal("pseudo-remainder by zero"))?;
    let lc_w = w[dw].clone();
    let mut r: Vec<Poly> = u.to_vec();
    loop {
        // trim
        while r.last().map(Poly::is_zero) == Some(true) {
            r.pop();
        }
        let dr = match r.len().checked_sub(1) {
            None => return Ok(Vec::new()),
            Some(dr) => dr,
        };
        if dr < dw {
            return Ok(r);
        }
        let lc_r = r[dr].clone();
        // r := lc(w)*r - lc(r)*w*x^(dr-dw)
        for item in r.iter_mut() {
            *item = item.mul(&lc_w, field);
        }
        for (j, wc) in w.iter().enumerate() {
            let idx = dr - dw + j;
            let sub = lc_r.mul(wc, field);
            r[idx] = r[idx].sub(&sub, field);
        }
    }
}

fn univariate_to_poly(f: &UniPoly, var: &str, field: &PrimeField) -> Poly {
    let terms = f.coeffs().iter().enumerate().filter_map(|(i, c)| {
        if num_traits::Zero::is_zero(c) {
            None
        } else {
            let mut m = Monomial::one();
            for _ in 0..i {
                m = m.mul(&Monomial::variable(var));
            }
            Some((m, c.clone()))
        }
    });
    Poly::from_terms(terms, field).monic(field)
}
