//! R1CS gadgets for Jubjub arithmetic over the BLS12-381 scalar field.
//!
//! Jubjub is the twisted Edwards curve -u^2 + v^2 = 1 + d·u^2·v^2 with
//! d = -(10240/10241), defined over the field the circuit works in, so point
//! coordinates are native circuit values.

use bellman::gadgets::boolean::{AllocatedBit, Boolean};
use bellman::{ConstraintSystem, LinearCombination, SynthesisError, Variable};
use bls12_381::Scalar;
use group::Group;
use jubjub::{Fr, SubgroupPoint};
use once_cell::sync::Lazy;

use auction_crypto::{generators, primitives::affine_coordinates};

/// Bits of a bid value.
pub const VALUE_BITS: usize = 32;

/// Bits of a randomness scalar; the Jubjub subgroup order is below 2^252.
pub const RANDOMNESS_BITS: usize = 252;

/// Affine coordinates of 2^j · g for every value bit.
pub static G_TABLE: Lazy<Vec<(Scalar, Scalar)>> =
    Lazy::new(|| doubling_table(generators().g, VALUE_BITS));

/// Affine coordinates of 2^j · h for every randomness bit.
pub static H_TABLE: Lazy<Vec<(Scalar, Scalar)>> =
    Lazy::new(|| doubling_table(generators().h, RANDOMNESS_BITS));

fn doubling_table(base: SubgroupPoint, len: usize) -> Vec<(Scalar, Scalar)> {
    let mut point = base;
    (0..len)
        .map(|_| {
            let coords = affine_coordinates(&point);
            point = point.double();
            coords
        })
        .collect()
}

/// A field element tracked as a linear combination plus its witness value.
#[derive(Clone)]
pub struct Coordinate {
    lc: LinearCombination<Scalar>,
    value: Option<Scalar>,
}

impl Coordinate {
    fn from_variable(var: Variable, value: Option<Scalar>) -> Self {
        Self {
            lc: LinearCombination::zero() + var,
            value,
        }
    }

    pub fn lc(&self) -> &LinearCombination<Scalar> {
        &self.lc
    }

    pub fn value(&self) -> Option<Scalar> {
        self.value
    }
}

/// A Jubjub point inside the circuit.
#[derive(Clone)]
pub struct EdwardsPoint {
    pub u: Coordinate,
    pub v: Coordinate,
}

impl EdwardsPoint {
    /// Select `point` if `bit` is set, the identity (0, 1) otherwise.
    ///
    /// Both coordinates are linear in the bit, so no constraints are added.
    pub fn conditional_constant<CS: ConstraintSystem<Scalar>>(
        bit: &Boolean,
        point: (Scalar, Scalar),
    ) -> Self {
        let (pu, pv) = point;
        let set = bit.get_value();

        let u = Coordinate {
            lc: bit.lc(CS::one(), pu),
            value: set.map(|b| if b { pu } else { Scalar::zero() }),
        };
        let v = Coordinate {
            lc: LinearCombination::zero() + CS::one() + &bit.lc(CS::one(), pv - Scalar::one()),
            value: set.map(|b| if b { pv } else { Scalar::one() }),
        };
        Self { u, v }
    }

    pub fn get_u(&self) -> Option<Scalar> {
        self.u.value
    }

    pub fn get_v(&self) -> Option<Scalar> {
        self.v.value
    }

    /// Complete twisted Edwards addition in six constraints.
    ///
    /// U = (u1 + v1)·(u2 + v2), A = u1·v2, B = u2·v1, C = d·A·B,
    /// u3 = (A + B) / (1 + C), v3 = (U - A - B) / (1 - C).
    pub fn add<CS: ConstraintSystem<Scalar>>(
        &self,
        mut cs: CS,
        other: &Self,
    ) -> Result<Self, SynthesisError> {
        let (u1, v1) = (&self.u, &self.v);
        let (u2, v2) = (&other.u, &other.v);

        let uu_val = match (u1.value, v1.value, u2.value, v2.value) {
            (Some(u1), Some(v1), Some(u2), Some(v2)) => Some((u1 + v1) * (u2 + v2)),
            _ => None,
        };
        let a_val = u1.value.zip(v2.value).map(|(x, y)| x * y);
        let b_val = u2.value.zip(v1.value).map(|(x, y)| x * y);

        let uu = cs.alloc(|| "U", || uu_val.ok_or(SynthesisError::AssignmentMissing))?;
        cs.enforce(
            || "U = (u1 + v1) * (u2 + v2)",
            |lc| lc + &u1.lc + &v1.lc,
            |lc| lc + &u2.lc + &v2.lc,
            |lc| lc + uu,
        );

        let a = cs.alloc(|| "A", || a_val.ok_or(SynthesisError::AssignmentMissing))?;
        cs.enforce(|| "A = u1 * v2", |lc| lc + &u1.lc, |lc| lc + &v2.lc, |lc| lc + a);

        let b = cs.alloc(|| "B", || b_val.ok_or(SynthesisError::AssignmentMissing))?;
        cs.enforce(|| "B = u2 * v1", |lc| lc + &u2.lc, |lc| lc + &v1.lc, |lc| lc + b);

        // 10241·C = -10240·A·B
        let c_val = match (a_val, b_val) {
            (Some(a), Some(b)) => Some(edwards_d()? * a * b),
            _ => None,
        };
        let c = cs.alloc(|| "C", || c_val.ok_or(SynthesisError::AssignmentMissing))?;
        cs.enforce(
            || "C = d * A * B",
            |lc| lc + (-Scalar::from(10240u64), a),
            |lc| lc + b,
            |lc| lc + (Scalar::from(10241u64), c),
        );

        let u3_val = match (a_val, b_val, c_val) {
            (Some(a), Some(b), Some(c)) => Some(divide(a + b, Scalar::one() + c)?),
            _ => None,
        };
        let u3 = cs.alloc(|| "u3", || u3_val.ok_or(SynthesisError::AssignmentMissing))?;
        cs.enforce(
            || "(1 + C) * u3 = A + B",
            |lc| lc + CS::one() + c,
            |lc| lc + u3,
            |lc| lc + a + b,
        );

        let v3_val = match (uu_val, a_val, b_val, c_val) {
            (Some(uu), Some(a), Some(b), Some(c)) => Some(divide(uu - a - b, Scalar::one() - c)?),
            _ => None,
        };
        let v3 = cs.alloc(|| "v3", || v3_val.ok_or(SynthesisError::AssignmentMissing))?;
        cs.enforce(
            || "(1 - C) * v3 = U - A - B",
            |lc| lc + CS::one() - c,
            |lc| lc + v3,
            |lc| lc + uu - a - b,
        );

        Ok(Self {
            u: Coordinate::from_variable(u3, u3_val),
            v: Coordinate::from_variable(v3, v3_val),
        })
    }

    /// Constrain this point to equal the public point allocated as two
    /// public inputs, in (u, v) order.
    pub fn expose_as_input<CS: ConstraintSystem<Scalar>>(
        &self,
        mut cs: CS,
        public: Option<(Scalar, Scalar)>,
    ) -> Result<(), SynthesisError> {
        let u = cs.alloc_input(
            || "u",
            || public.map(|p| p.0).ok_or(SynthesisError::AssignmentMissing),
        )?;
        let v = cs.alloc_input(
            || "v",
            || public.map(|p| p.1).ok_or(SynthesisError::AssignmentMissing),
        )?;

        cs.enforce(|| "u = public u", |lc| lc + &self.u.lc, |lc| lc + CS::one(), |lc| lc + u);
        cs.enforce(|| "v = public v", |lc| lc + &self.v.lc, |lc| lc + CS::one(), |lc| lc + v);
        Ok(())
    }
}

/// The curve parameter d = -(10240/10241).
fn edwards_d() -> Result<Scalar, SynthesisError> {
    divide(-Scalar::from(10240u64), Scalar::from(10241u64))
}

fn divide(num: Scalar, den: Scalar) -> Result<Scalar, SynthesisError> {
    let inv: Option<Scalar> = den.invert().into();
    inv.map(|inv| num * inv).ok_or(SynthesisError::DivisionByZero)
}

/// Multiply a fixed base by a little-endian bit string, given the base's
/// doubling table.
pub fn fixed_base_mul<CS: ConstraintSystem<Scalar>>(
    mut cs: CS,
    bits: &[Boolean],
    table: &[(Scalar, Scalar)],
) -> Result<EdwardsPoint, SynthesisError> {
    if bits.is_empty() || bits.len() != table.len() {
        return Err(SynthesisError::Unsatisfiable);
    }

    let mut acc = EdwardsPoint::conditional_constant::<CS>(&bits[0], table[0]);
    for (i, (bit, entry)) in bits.iter().zip(table.iter()).enumerate().skip(1) {
        let term = EdwardsPoint::conditional_constant::<CS>(bit, *entry);
        acc = acc.add(cs.namespace(|| format!("add bit {}", i)), &term)?;
    }
    Ok(acc)
}

/// Allocate `len` boolean-constrained bits, little-endian.
pub fn alloc_bits<CS: ConstraintSystem<Scalar>>(
    mut cs: CS,
    bits: Option<&[bool]>,
    len: usize,
) -> Result<Vec<Boolean>, SynthesisError> {
    (0..len)
        .map(|i| {
            let value = bits.map(|b| b[i]);
            AllocatedBit::alloc(cs.namespace(|| format!("bit {}", i)), value).map(Boolean::from)
        })
        .collect()
}

/// Σ 2^i · bits[i]
pub fn bits_lc<CS: ConstraintSystem<Scalar>>(bits: &[Boolean]) -> LinearCombination<Scalar> {
    let mut coeff = Scalar::one();
    let mut lc = LinearCombination::zero();
    for bit in bits {
        lc = lc + &bit.lc(CS::one(), coeff);
        coeff = coeff.double();
    }
    lc
}

/// Enforce value ≤ bound for two 32-bit decomposed numbers.
///
/// bound - value is decomposed into 32 fresh bits. Both operands are below
/// 2^32, so the difference fits iff it is not negative.
pub fn enforce_less_or_equal<CS: ConstraintSystem<Scalar>>(
    mut cs: CS,
    value_bits: &[Boolean],
    bound_bits: &[Boolean],
    difference: Option<u32>,
) -> Result<(), SynthesisError> {
    let diff_bits = difference.map(u32_bits);
    let diff = alloc_bits(cs.namespace(|| "difference"), diff_bits.as_deref(), VALUE_BITS)?;

    let value_lc = bits_lc::<CS>(value_bits);
    let bound_lc = bits_lc::<CS>(bound_bits);
    let diff_lc = bits_lc::<CS>(&diff);

    cs.enforce(
        || "bound - value = difference",
        |lc| lc + &bound_lc - &value_lc - &diff_lc,
        |lc| lc + CS::one(),
        |lc| lc,
    );
    Ok(())
}

/// Little-endian bits of a bid value.
pub fn u32_bits(value: u32) -> Vec<bool> {
    (0..VALUE_BITS).map(|i| (value >> i) & 1 == 1).collect()
}

/// Little-endian bits of a randomness scalar.
pub fn scalar_bits(scalar: &Fr) -> Vec<bool> {
    let bytes = scalar.to_bytes();
    (0..RANDOMNESS_BITS)
        .map(|i| (bytes[i / 8] >> (i % 8)) & 1 == 1)
        .collect()
}
