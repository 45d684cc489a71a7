// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Division polynomials and multiplication-by-`k` maps.
//!
//! Work happens in the coordinate ring of the curve,
//! \\(\mathbb{F}_p[x, y] / (y^2 - x^3 - ax - b)\\), whose elements are
//! uniquely written \\(A(x) + y \cdot B(x)\\) with `A`, `B` univariate.
//! The division polynomials \\(\psi_k\\) live in this ring (\\(\psi_k\\)
//! is univariate in `x` for odd `k` and `y` times a univariate for even
//! `k`) and satisfy the classical recurrences
//!
//! \\[ \psi_{2m+1} = \psi_{m+2}\psi_m^3 - \psi_{m-1}\psi_{m+1}^3, \qquad
//!     \psi_{2m} = \frac{\psi_m(\psi_{m+2}\psi_{m-1}^2 -
//!     \psi_{m-2}\psi_{m+1}^2)}{2y}. \\]
//!
//! From them the multiplication-by-`k` map on `x` and `y` coordinates is
//! the pair of rational functions
//!
//! \\[ x(kP) = x - \frac{\psi_{k-1}\psi_{k+1}}{\psi_k^2}, \qquad
//!     y(kP) = \frac{\psi_{2k}}{2\psi_k^4}, \\]
//!
//! which is what lets the ZVP constructor rewrite a second input point
//! `Q = kP` as rational functions of the first.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::debug;

use crate::deadline::Deadline;
use crate::errors::Error;
use crate::field::PrimeField;
use crate::uni::UniPoly;

/// The coordinate ring of a short Weierstrass curve over a prime field.
#[derive(Clone, Debug)]
pub struct CurveRing {
    field: PrimeField,
    a: BigUint,
    b: BigUint,
    /// The curve right-hand side `x^3 + ax + b`, i.e. the image of `y^2`.
    f: UniPoly,
}

impl CurveRing {
    /// The ring of the curve `y^2 = x^3 + ax + b`.
    pub fn new(field: PrimeField, a: BigUint, b: BigUint) -> CurveRing {
        let a = field.reduce(&a);
        let b = field.reduce(&b);
        let f = UniPoly::from_coeffs(vec![
            b.clone(),
            a.clone(),
            BigUint::zero(),
            BigUint::one(),
        ]);
        CurveRing { field, a, b, f }
    }

    /// The coefficient field.
    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    /// Curve coefficient `a`.
    pub fn a(&self) -> &BigUint {
        &self.a
    }

    /// Curve coefficient `b`.
    pub fn b(&self) -> &BigUint {
        &self.b
    }

    /// The polynomial `x^3 + ax + b` that `y^2` reduces to.
    pub fn rhs(&self) -> &UniPoly {
        &self.f
    }

    /// The zero element.
    pub fn zero(&self) -> RingElem {
        RingElem {
            a: UniPoly::zero(),
            b: UniPoly::zero(),
        }
    }

    /// The constant one.
    pub fn one(&self) -> RingElem {
        RingElem {
            a: UniPoly::one(),
            b: UniPoly::zero(),
        }
    }

    /// The element `A(x) + y * B(x)`.
    pub fn elem(&self, a: UniPoly, b: UniPoly) -> RingElem {
        RingElem { a, b }
    }

    /// `u + v`.
    pub fn add(&self, u: &RingElem, v: &RingElem) -> RingElem {
        RingElem {
            a: u.a.add(&v.a, &self.field),
            b: u.b.add(&v.b, &self.field),
        }
    }

    /// `u - v`.
    pub fn sub(&self, u: &RingElem, v: &RingElem) -> RingElem {
        RingElem {
            a: u.a.sub(&v.a, &self.field),
            b: u.b.sub(&v.b, &self.field),
        }
    }

    /// `u * v`, reducing `y^2` to the curve right-hand side.
    pub fn mul(&self, u: &RingElem, v: &RingElem) -> RingElem {
        let cross = u.b.mul(&v.b, &self.field).mul(&self.f, &self.field);
        RingElem {
            a: u.a.mul(&v.a, &self.field).add(&cross, &self.field),
            b: u.a
                .mul(&v.b, &self.field)
                .add(&u.b.mul(&v.a, &self.field), &self.field),
        }
    }

    /// `u * c` for a field constant.
    pub fn scale(&self, u: &RingElem, c: &BigUint) -> RingElem {
        RingElem {
            a: u.a.scale(c, &self.field),
            b: u.b.scale(c, &self.field),
        }
    }

    /// `u^e` for a small exponent.
    pub fn pow(&self, u: &RingElem, e: u32) -> RingElem {
        let mut acc = self.one();
        for _ in 0..e {
            acc = self.mul(&acc, u);
        }
        acc
    }

    /// Exact division by `2y`.
    ///
    /// `(A + yB) / (2y) = B/2 + y * (A/f)/2`; defined exactly when the
    /// curve right-hand side divides `A`, which the even division
    /// polynomial recurrence guarantees.
    pub fn div_2y(&self, u: &RingElem) -> Result<RingElem, Error> {
        let half = self.field.invert(&BigUint::from(2u32));
        let new_b = if u.a.is_zero() {
            UniPoly::zero()
        } else {
            u.a.exact_div(&self.f, &self.field)?.scale(&half, &self.field)
        };
        Ok(RingElem {
            a: u.b.scale(&half, &self.field),
            b: new_b,
        })
    }

    /// The division polynomials `psi_0 ..= psi_n`.
    pub fn division_polynomials(
        &self,
        n: u64,
        deadline: Deadline,
    ) -> Result<Vec<RingElem>, Error> {
        let f = &self.field;
        let a = &self.a;
        let b = &self.b;

        let mut psi = Vec::with_capacity((n + 1) as usize);
        psi.push(self.zero());
        if n >= 1 {
            psi.push(self.one());
        }
        if n >= 2 {
            // psi_2 = 2y
            psi.push(self.elem(UniPoly::zero(), UniPoly::constant(BigUint::from(2u32))));
        }
        if n >= 3 {
            // psi_3 = 3x^4 + 6a x^2 + 12b x - a^2
            let a2 = f.mul(a, a);
            psi.push(self.elem(
                UniPoly::from_coeffs(vec![
                    f.neg(&a2),
                    f.mul(&BigUint::from(12u32), b),
                    f.mul(&BigUint::from(6u32), a),
                    BigUint::zero(),
                    BigUint::from(3u32),
                ]),
                UniPoly::zero(),
            ));
        }
        if n >= 4 {
            // psi_4 = 4y (x^6 + 5a x^4 + 20b x^3 - 5a^2 x^2 - 4ab x
            //             - 8b^2 - a^3)
            let a2 = f.mul(a, a);
            let a3 = f.mul(&a2, a);
            let b2 = f.mul(b, b);
            let inner = UniPoly::from_coeffs(vec![
                f.neg(&f.add(&f.mul(&BigUint::from(8u32), &b2), &a3)),
                f.neg(&f.mul(&BigUint::from(4u32), &f.mul(a, b))),
                f.neg(&f.mul(&BigUint::from(5u32), &a2)),
                f.mul(&BigUint::from(20u32), b),
                f.mul(&BigUint::from(5u32), a),
                BigUint::zero(),
                BigUint::one(),
            ]);
            psi.push(self.elem(
                UniPoly::zero(),
                inner.scale(&BigUint::from(4u32), f),
            ));
        }

        for i in 5..=n {
            deadline.check("division polynomial recurrence")?;
            let i = i as usize;
            let next = if i % 2 == 1 {
                let m = (i - 1) / 2;
                let lhs = self.mul(&psi[m + 2], &self.pow(&psi[m], 3));
                let rhs = self.mul(&psi[m - 1], &self.pow(&psi[m + 1], 3));
                self.sub(&lhs, &rhs)
            } else {
                let m = i / 2;
                let lhs = self.mul(&psi[m + 2], &self.pow(&psi[m - 1], 2));
                let rhs = self.mul(&psi[m - 2], &self.pow(&psi[m + 1], 2));
                let num = self.mul(&psi[m], &self.sub(&lhs, &rhs));
                self.div_2y(&num)?
            };
            psi.push(next);
        }
        Ok(psi)
    }
}

/// An element `A(x) + y * B(x)` of a [`CurveRing`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RingElem {
    a: UniPoly,
    b: UniPoly,
}

impl RingElem {
    /// The `y`-free part `A`.
    pub fn even(&self) -> &UniPoly {
        &self.a
    }

    /// The coefficient `B` of `y`.
    pub fn odd(&self) -> &UniPoly {
        &self.b
    }

    /// Whether this is the zero element.
    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }

    /// The univariate part, if the element is free of `y`.
    pub fn univariate(&self) -> Result<&UniPoly, Error> {
        if self.b.is_zero() {
            Ok(&self.a)
        } else {
            Err(Error::Internal("ring element unexpectedly depends on y"))
        }
    }
}

/// The multiplication-by-`k` map as a pair of rational functions:
/// `x(kP) = x_num / x_den` and `y(kP) = y * y_num / y_den`, all
/// univariate in the x-coordinate of `P`.
#[derive(Clone, Debug)]
pub struct MultiplicationMap {
    k: u64,
    x_num: UniPoly,
    x_den: UniPoly,
    y_num: UniPoly,
    y_den: UniPoly,
}

impl MultiplicationMap {
    /// The multiplier `k`.
    pub fn k(&self) -> u64 {
        self.k
    }

    /// Numerator of the x-map.
    pub fn x_num(&self) -> &UniPoly {
        &self.x_num
    }

    /// Denominator of the x-map (`psi_k^2`).
    pub fn x_den(&self) -> &UniPoly {
        &self.x_den
    }

    /// The `y`-free part of the y-map numerator.
    pub fn y_num(&self) -> &UniPoly {
        &self.y_num
    }

    /// Denominator of the y-map (`2 psi_k^4`).
    pub fn y_den(&self) -> &UniPoly {
        &self.y_den
    }

    /// Evaluate the map at a concrete affine point `(x, y)`, if the
    /// denominators do not vanish there.
    pub fn eval(
        &self,
        x: &BigUint,
        y: &BigUint,
        field: &PrimeField,
    ) -> Option<(BigUint, BigUint)> {
        let xd = self.x_den.eval(x, field);
        let yd = self.y_den.eval(x, field);
        if xd.is_zero() || yd.is_zero() {
            return None;
        }
        let kx = field.mul(&self.x_num.eval(x, field), &field.invert(&xd));
        let ky = field.mul(
            &field.mul(y, &self.y_num.eval(x, field)),
            &field.invert(&yd),
        );
        Some((kx, ky))
    }
}

/// Build the multiplication-by-`k` map over `ring`.
///
/// `k` must be at least two: `k = 0` maps everything to the identity
/// and `k = 1` leaves no independent second point, so neither admits a
/// usable map ([`Error::UnsupportedMultiplier`]).
pub fn multiplication_map(
    ring: &CurveRing,
    k: u64,
    deadline: Deadline,
) -> Result<MultiplicationMap, Error> {
    if k < 2 {
        return Err(Error::UnsupportedMultiplier { k });
    }
    let field = ring.field();
    let psi = ring.division_polynomials(2 * k, deadline)?;
    let k = k as usize;

    // psi_k^2 and psi_{k-1} psi_{k+1} are y-free whatever the parity.
    let psi_k_sq = ring.pow(&psi[k], 2);
    let x_den = psi_k_sq.univariate()?.clone();
    let cross = ring.mul(&psi[k - 1], &psi[k + 1]);
    let x_num = UniPoly::x()
        .mul(&x_den, field)
        .sub(cross.univariate()?, field);

    // psi_{2k} = y * g, so y(kP) = y * g / (2 psi_k^4).
    let psi_2k = &psi[2 * k];
    if !psi_2k.even().is_zero() {
        return Err(Error::Internal("even division polynomial has a y-free part"));
    }
    let y_num = psi_2k.odd().clone();
    let psi_k_4 = ring.mul(&psi_k_sq, &psi_k_sq);
    let y_den = psi_k_4
        .univariate()?
        .scale(&BigUint::from(2u32), field);

    debug!(k, x_deg = ?x_num.degree(), "multiplication map built");
    Ok(MultiplicationMap {
        k: k as u64,
        x_num,
        x_den,
        y_num,
        y_den,
    })
}
