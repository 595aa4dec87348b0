use std::cmp::Ordering;
use std::fmt;

/// A FEEL number.
///
/// Integral values stay integral through `+`, `-`, `*`, `%` and `**` with a
/// non-negative exponent; everything else (and any integer overflow) promotes
/// to floating point. Division always yields a float.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Number {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
}

impl Number {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// The value as an integer, if it has no fractional part.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v),
            Number::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                if v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Some(v as i64)
                } else {
                    None
                }
            }
            Number::Float(_) => None,
        }
    }

    #[must_use]
    pub fn is_integral(self) -> bool {
        self.as_i64().is_some()
    }

    /// Collapse a whole float back into an integer where it fits.
    #[must_use]
    pub fn normalized(self) -> Number {
        match self {
            Number::Float(_) => self.as_i64().map_or(self, Number::Int),
            Number::Int(_) => self,
        }
    }

    #[must_use]
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map_or_else(|| Number::Float(self.as_f64() + other.as_f64()), Number::Int),
            _ => Number::Float(self.as_f64() + other.as_f64()),
        }
    }

    #[must_use]
    pub fn sub(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map_or_else(|| Number::Float(self.as_f64() - other.as_f64()), Number::Int),
            _ => Number::Float(self.as_f64() - other.as_f64()),
        }
    }

    #[must_use]
    pub fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map_or_else(|| Number::Float(self.as_f64() * other.as_f64()), Number::Int),
            _ => Number::Float(self.as_f64() * other.as_f64()),
        }
    }

    /// Float division. Returns `None` for a zero divisor.
    #[must_use]
    pub fn div(self, other: Number) -> Option<Number> {
        if other.is_zero() {
            return None;
        }
        Some(Number::Float(self.as_f64() / other.as_f64()))
    }

    /// Floored modulo: the result takes the sign of the divisor.
    /// Returns `None` for a zero divisor.
    #[must_use]
    pub fn rem(self, other: Number) -> Option<Number> {
        if other.is_zero() {
            return None;
        }
        Some(match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                let r = a.checked_rem(b).unwrap_or(0);
                if r != 0 && (r < 0) != (b < 0) {
                    Number::Int(r + b)
                } else {
                    Number::Int(r)
                }
            }
            _ => {
                let (a, b) = (self.as_f64(), other.as_f64());
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    Number::Float(r + b)
                } else {
                    Number::Float(r)
                }
            }
        })
    }

    #[must_use]
    pub fn pow(self, exponent: Number) -> Number {
        if let (Number::Int(base), Number::Int(exp)) = (self, exponent) {
            if let Ok(exp) = u32::try_from(exp) {
                if let Some(v) = base.checked_pow(exp) {
                    return Number::Int(v);
                }
            }
        }
        Number::Float(self.as_f64().powf(exponent.as_f64()))
    }

    #[must_use]
    pub fn neg(self) -> Number {
        match self {
            Number::Int(v) => v
                .checked_neg()
                .map_or_else(|| Number::Float(-self.as_f64()), Number::Int),
            Number::Float(v) => Number::Float(-v),
        }
    }

    #[must_use]
    pub fn abs(self) -> Number {
        match self {
            Number::Int(v) => v
                .checked_abs()
                .map_or_else(|| Number::Float(self.as_f64().abs()), Number::Int),
            Number::Float(v) => Number::Float(v.abs()),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}
