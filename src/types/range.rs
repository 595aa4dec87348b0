use std::cmp::Ordering;
use std::fmt;

use super::Value;

/// A FEEL interval with independently inclusive or exclusive endpoints.
///
/// `[1..5]` includes both ends, `(1..5)` neither, and the two sides may be
/// mixed freely. Both endpoints are always mutually comparable.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValue {
    start: Box<Value>,
    end: Box<Value>,
    start_inclusive: bool,
    end_inclusive: bool,
}

impl RangeValue {
    /// Build a range. Returns `None` when the endpoints cannot be ordered
    /// against each other (e.g. a number and a string).
    #[must_use]
    pub fn new(start: Value, end: Value, start_inclusive: bool, end_inclusive: bool) -> Option<Self> {
        start.partial_cmp_value(&end)?;
        Some(Self {
            start: Box::new(start),
            end: Box::new(end),
            start_inclusive,
            end_inclusive,
        })
    }

    #[must_use]
    pub fn start(&self) -> &Value {
        &self.start
    }

    #[must_use]
    pub fn end(&self) -> &Value {
        &self.end
    }

    #[must_use]
    pub fn start_inclusive(&self) -> bool {
        self.start_inclusive
    }

    #[must_use]
    pub fn end_inclusive(&self) -> bool {
        self.end_inclusive
    }

    /// Whether `value` lies inside the range, honouring each side's
    /// inclusivity. Returns `None` if `value` is not comparable with the
    /// endpoints.
    #[must_use]
    pub fn contains(&self, value: &Value) -> Option<bool> {
        let lower = value.partial_cmp_value(&self.start)?;
        let upper = value.partial_cmp_value(&self.end)?;
        let above_start = match lower {
            Ordering::Greater => true,
            Ordering::Equal => self.start_inclusive,
            Ordering::Less => false,
        };
        let below_end = match upper {
            Ordering::Less => true,
            Ordering::Equal => self.end_inclusive,
            Ordering::Greater => false,
        };
        Some(above_start && below_end)
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.start_inclusive { '[' } else { '(' };
        let close = if self.end_inclusive { ']' } else { ')' };
        write!(f, "{open}{}..{}{close}", self.start, self.end)
    }
}
