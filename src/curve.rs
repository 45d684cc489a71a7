// -*- mode: rust; -*-
//
// This file is part of ec-zvp.
// See LICENSE for licensing information.

//! Short Weierstrass curves \\(y^2 = x^3 + ax + b\\) over a dynamic
//! prime field, with affine point arithmetic.
//!
//! The analysis engine only needs variable-base scalar multiplication,
//! point addition/doubling, and lifting an x-coordinate to the curve;
//! all of it in affine coordinates, since this arithmetic serves as the
//! *independent* reference the symbolic pipeline is checked against.
//! Nothing here is constant-time, and nothing needs to be: the inputs
//! are public analysis targets, not secrets.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::errors::Error;
use crate::field::PrimeField;

/// An affine point on a short Weierstrass curve.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AffinePoint {
    /// The point at infinity.
    Identity,
    /// An affine point with coordinates (x, y).
    Affine {
        /// x-coordinate.
        x: BigUint,
        /// y-coordinate.
        y: BigUint,
    },
}

impl AffinePoint {
    /// Return the identity point.
    pub fn identity() -> AffinePoint {
        AffinePoint::Identity
    }

    /// Whether this is the point at infinity.
    pub fn is_identity(&self) -> bool {
        matches!(self, AffinePoint::Identity)
    }

    /// Affine coordinates, unless this is the identity.
    pub fn coordinates(&self) -> Option<(&BigUint, &BigUint)> {
        match self {
            AffinePoint::Identity => None,
            AffinePoint::Affine { x, y } => Some((x, y)),
        }
    }
}

/// A short Weierstrass curve with its group context.
///
/// Immutable once constructed; every operation takes `&self`.
#[derive(Clone, Debug)]
pub struct WeierstrassCurve {
    field: PrimeField,
    a: BigUint,
    b: BigUint,
    generator: AffinePoint,
    order: BigUint,
    cofactor: BigUint,
}

impl WeierstrassCurve {
    /// Construct a curve and validate its parameters.
    ///
    /// The modulus must be an odd prime ([`Error::NotPrime`]) and the
    /// generator must satisfy the curve equation ([`Error::InvalidCurve`]).
    pub fn new(
        modulus: BigUint,
        a: BigUint,
        b: BigUint,
        generator_x: BigUint,
        generator_y: BigUint,
        order: BigUint,
        cofactor: BigUint,
    ) -> Result<WeierstrassCurve, Error> {
        let field = PrimeField::new(modulus)?;
        let curve = WeierstrassCurve {
            a: field.reduce(&a),
            b: field.reduce(&b),
            generator: AffinePoint::Affine {
                x: field.reduce(&generator_x),
                y: field.reduce(&generator_y),
            },
            order,
            cofactor,
            field,
        };
        if !curve.is_on_curve(&curve.generator) {
            return Err(Error::InvalidCurve);
        }
        Ok(curve)
    }

    /// The base field.
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

    /// The declared generator.
    pub fn generator(&self) -> &AffinePoint {
        &self.generator
    }

    /// The order of the generator's subgroup.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    /// The cofactor.
    pub fn cofactor(&self) -> &BigUint {
        &self.cofactor
    }

    /// The right-hand side `x^3 + ax + b`.
    pub fn rhs(&self, x: &BigUint) -> BigUint {
        let f = &self.field;
        let x2 = f.mul(x, x);
        let x3 = f.mul(&x2, x);
        f.add(&f.add(&x3, &f.mul(&self.a, x)), &self.b)
    }

    /// Whether a point satisfies the curve equation.
    pub fn is_on_curve(&self, point: &AffinePoint) -> bool {
        match point {
            AffinePoint::Identity => true,
            AffinePoint::Affine { x, y } => self.field.mul(y, y) == self.rhs(x),
        }
    }

    /// Negate a point.
    pub fn negate(&self, point: &AffinePoint) -> AffinePoint {
        match point {
            AffinePoint::Identity => AffinePoint::Identity,
            AffinePoint::Affine { x, y } => AffinePoint::Affine {
                x: x.clone(),
                y: self.field.neg(y),
            },
        }
    }

    /// Add two points in affine coordinates.
    pub fn add(&self, p: &AffinePoint, q: &AffinePoint) -> AffinePoint {
        let f = &self.field;
        match (p, q) {
            (AffinePoint::Identity, _) => q.clone(),
            (_, AffinePoint::Identity) => p.clone(),
            (AffinePoint::Affine { x: x1, y: y1 }, AffinePoint::Affine { x: x2, y: y2 }) => {
                if x1 == x2 {
                    if y1 == y2 && !y1.is_zero() {
                        return self.double(p);
                    }
                    // P + (-P)
                    return AffinePoint::Identity;
                }
                let lambda = f.mul(&f.sub(y2, y1), &f.invert(&f.sub(x2, x1)));
                let x3 = f.sub(&f.sub(&f.mul(&lambda, &lambda), x1), x2);
                let y3 = f.sub(&f.mul(&lambda, &f.sub(x1, &x3)), y1);
                AffinePoint::Affine { x: x3, y: y3 }
            }
        }
    }

    /// Double a point.
    pub fn double(&self, p: &AffinePoint) -> AffinePoint {
        let f = &self.field;
        match p {
            AffinePoint::Identity => AffinePoint::Identity,
            AffinePoint::Affine { x, y } => {
                if y.is_zero() {
                    return AffinePoint::Identity;
                }
                // lambda = (3x^2 + a) / 2y
                let three_x2 = f.mul(&BigUint::from(3u32), &f.mul(x, x));
                let num = f.add(&three_x2, &self.a);
                let den = f.mul(&BigUint::from(2u32), y);
                let lambda = f.mul(&num, &f.invert(&den));
                let x3 = f.sub(&f.sub(&f.mul(&lambda, &lambda), x), x);
                let y3 = f.sub(&f.mul(&lambda, &f.sub(x, &x3)), y);
                AffinePoint::Affine { x: x3, y: y3 }
            }
        }
    }

    /// Variable-base scalar multiplication, MSB-first double-and-add.
    pub fn mul(&self, k: &BigUint, p: &AffinePoint) -> AffinePoint {
        let mut acc = AffinePoint::Identity;
        let bits = k.bits();
        for i in (0..bits).rev() {
            acc = self.double(&acc);
            if k.bit(i) {
                acc = self.add(&acc, p);
            }
        }
        acc
    }

    /// The 0, 1 or 2 points with the given x-coordinate, in a
    /// deterministic order.
    pub fn lift_x(&self, x: &BigUint) -> Vec<AffinePoint> {
        let x = self.field.reduce(x);
        let rhs = self.rhs(&x);
        match self.field.sqrt(&rhs) {
            None => Vec::new(),
            Some(y) if y.is_zero() => vec![AffinePoint::Affine { x, y }],
            Some(y) => {
                let neg_y = self.field.neg(&y);
                let mut out = vec![
                    AffinePoint::Affine { x: x.clone(), y },
                    AffinePoint::Affine { x, y: neg_y },
                ];
                out.sort();
                out
            }
        }
    }
}
