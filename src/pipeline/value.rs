//! Numeric cells carried in packet channels.
//!
//! A `Value` is either an integer or a float cell plus a validity flag.
//! Arithmetic keeps the cell's own representation: adding a float to an
//! integer cell truncates the result back to an integer.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Signed 16.16 fixed-point number.
pub type Fix = i32;

const FIX_ONE: f32 = 65536.0;

/// The numeric representation held by a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i32),
    Float(f32),
}

/// A polymorphic numeric cell with a validity flag.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    scalar: Scalar,
    valid: bool,
}

impl Value {
    pub fn int(v: i32) -> Self {
        Self {
            scalar: Scalar::Int(v),
            valid: true,
        }
    }

    pub fn float(v: f32) -> Self {
        Self {
            scalar: Scalar::Float(v),
            valid: true,
        }
    }

    pub fn with_validity(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    #[inline]
    pub fn scalar(&self) -> Scalar {
        self.scalar
    }

    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self.scalar, Scalar::Int(_))
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self.scalar, Scalar::Float(_))
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Integer view. Floats are truncated toward zero (saturating).
    pub fn as_int(&self) -> i32 {
        match self.scalar {
            Scalar::Int(v) => v,
            Scalar::Float(v) => v as i32,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self.scalar {
            Scalar::Int(v) => v as f32,
            Scalar::Float(v) => v,
        }
    }

    /// 16.16 fixed-point view.
    pub fn as_fix(&self) -> Fix {
        match self.scalar {
            Scalar::Int(v) => v.wrapping_shl(16),
            Scalar::Float(v) => (v * FIX_ONE) as Fix,
        }
    }

    /// Store an integer, converting to this cell's representation.
    pub fn set_int(&mut self, v: i32) {
        self.scalar = match self.scalar {
            Scalar::Int(_) => Scalar::Int(v),
            Scalar::Float(_) => Scalar::Float(v as f32),
        };
    }

    /// Store a float, converting to this cell's representation.
    pub fn set_float(&mut self, v: f32) {
        self.scalar = match self.scalar {
            Scalar::Int(_) => Scalar::Int(v as i32),
            Scalar::Float(_) => Scalar::Float(v),
        };
    }

    /// Square root. Integer cells use an integer square root; negative
    /// integers yield 0.
    pub fn sqrt(&mut self) -> &mut Self {
        self.scalar = match self.scalar {
            Scalar::Int(v) if v < 0 => {
                tracing::error!("sqrt of negative integer {}", v);
                Scalar::Int(0)
            }
            Scalar::Int(v) => Scalar::Int(integer_sqrt(v as u32) as i32),
            Scalar::Float(v) => Scalar::Float(v.sqrt()),
        };
        self
    }

    pub fn log2(&mut self) -> &mut Self {
        self.map_real(f64::log2)
    }

    pub fn exp2(&mut self) -> &mut Self {
        self.map_real(f64::exp2)
    }

    pub fn exp(&mut self) -> &mut Self {
        self.map_real(f64::exp)
    }

    pub fn sin(&mut self) -> &mut Self {
        self.map_real(f64::sin)
    }

    pub fn cos(&mut self) -> &mut Self {
        self.map_real(f64::cos)
    }

    pub fn tan(&mut self) -> &mut Self {
        self.map_real(f64::tan)
    }

    pub fn asin(&mut self) -> &mut Self {
        self.map_real(f64::asin)
    }

    pub fn acos(&mut self) -> &mut Self {
        self.map_real(f64::acos)
    }

    pub fn atan(&mut self) -> &mut Self {
        self.map_real(f64::atan)
    }

    pub fn abs(&mut self) -> &mut Self {
        self.scalar = match self.scalar {
            Scalar::Int(v) => Scalar::Int(v.wrapping_abs()),
            Scalar::Float(v) => Scalar::Float(v.abs()),
        };
        self
    }

    // Integer cells go through f64 and truncate back.
    fn map_real(&mut self, f: impl Fn(f64) -> f64) -> &mut Self {
        self.scalar = match self.scalar {
            Scalar::Int(v) => Scalar::Int(f(v as f64) as i32),
            Scalar::Float(v) => Scalar::Float(f(v as f64) as f32),
        };
        self
    }

    fn combine(
        &mut self,
        rhs: Value,
        int_op: fn(i32, i32) -> Option<i32>,
        float_op: fn(f32, f32) -> f32,
    ) {
        self.scalar = match self.scalar {
            Scalar::Int(v) => match int_op(v, rhs.as_int()) {
                Some(r) => Scalar::Int(r),
                None => {
                    tracing::warn!(
                        "integer operation on {} and {} is undefined; value unchanged",
                        v,
                        rhs
                    );
                    Scalar::Int(v)
                }
            },
            Scalar::Float(v) => Scalar::Float(float_op(v, rhs.as_float())),
        };
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::int(0)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::float(v)
    }
}

impl AddAssign<Value> for Value {
    fn add_assign(&mut self, rhs: Value) {
        self.combine(rhs, |a, b| Some(a.wrapping_add(b)), |a, b| a + b);
    }
}

impl SubAssign<Value> for Value {
    fn sub_assign(&mut self, rhs: Value) {
        self.combine(rhs, |a, b| Some(a.wrapping_sub(b)), |a, b| a - b);
    }
}

impl MulAssign<Value> for Value {
    fn mul_assign(&mut self, rhs: Value) {
        self.combine(rhs, |a, b| Some(a.wrapping_mul(b)), |a, b| a * b);
    }
}

impl DivAssign<Value> for Value {
    fn div_assign(&mut self, rhs: Value) {
        self.combine(rhs, i32::checked_div, |a, b| a / b);
    }
}

impl AddAssign<i32> for Value {
    fn add_assign(&mut self, rhs: i32) {
        *self += Value::int(rhs);
    }
}

impl SubAssign<i32> for Value {
    fn sub_assign(&mut self, rhs: i32) {
        *self -= Value::int(rhs);
    }
}

impl MulAssign<i32> for Value {
    fn mul_assign(&mut self, rhs: i32) {
        *self *= Value::int(rhs);
    }
}

impl DivAssign<i32> for Value {
    fn div_assign(&mut self, rhs: i32) {
        *self /= Value::int(rhs);
    }
}

// Two integer cells compare as integers; anything involving a float compares
// as floats. Validity is not part of the comparison.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.scalar, other.scalar) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(&b)),
            _ => self.as_float().partial_cmp(&other.as_float()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scalar {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{:e}", v),
        }
    }
}

fn integer_sqrt(y: u32) -> u32 {
    if y < 2 {
        return y;
    }
    let mut x = y;
    let mut next = (x + y / x) / 2;
    while next < x {
        x = next;
        next = (x + y / x) / 2;
    }
    x
}
