//! Tagged value slot for tables that store either an owned value or a
//! bare scalar.

/// A table value that is either an owned payload or an inline scalar.
///
/// Use it as the `V` of a [`Dict`](crate::Dict) when some entries carry
/// data and others only a counter or a score.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Ptr(T),
    Signed(i64),
    Unsigned(u64),
    Double(f64),
}

impl<T> Value<T> {
    pub fn as_ptr(&self) -> Option<&T> {
        match self {
            Value::Ptr(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ptr_mut(&mut self) -> Option<&mut T> {
        match self {
            Value::Ptr(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_signed(&self) -> Option<i64> {
        match *self {
            Value::Signed(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match *self {
            Value::Unsigned(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match *self {
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_ptr(self) -> Option<T> {
        match self {
            Value::Ptr(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Ptr(_))
    }
}

impl<T> From<i64> for Value<T> {
    fn from(v: i64) -> Self {
        Value::Signed(v)
    }
}

impl<T> From<u64> for Value<T> {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl<T> From<f64> for Value<T> {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: each accessor only answers for its own variant.
    #[test]
    fn accessors_are_variant_exclusive() {
        let p: Value<String> = Value::Ptr("x".to_string());
        assert_eq!(p.as_ptr().map(String::as_str), Some("x"));
        assert_eq!(p.as_signed(), None);
        assert!(!p.is_scalar());

        let s: Value<String> = (-3i64).into();
        assert_eq!(s.as_signed(), Some(-3));
        assert_eq!(s.as_unsigned(), None);
        assert!(s.is_scalar());

        let u: Value<String> = 7u64.into();
        assert_eq!(u.as_unsigned(), Some(7));

        let d: Value<String> = 1.5f64.into();
        assert_eq!(d.as_double(), Some(1.5));
        assert_eq!(d.into_ptr(), None);
    }
}
