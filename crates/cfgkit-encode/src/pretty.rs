//! Pretty-printed integers
//!
//! Provides [`PrettyInt`], an integer that prints with thousands separators or
//! with a caller-supplied label. Mostly used for generated documentation of
//! config defaults.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use serde::{Serialize, Serializer};

/// Integer with a human-friendly text form
///
/// Equality, ordering, hashing and arithmetic only look at the integer;
/// the label never takes part. Arithmetic yields plain `i64` values.
///
/// # Examples
/// ```
/// # use cfgkit_encode::PrettyInt;
/// assert_eq!(PrettyInt::new(100_000).to_string(), "100,000");
/// assert_eq!(PrettyInt::labelled(5, "five").to_string(), "five");
/// assert_eq!(PrettyInt::labelled(5, "five"), 5_i64);
/// ```
#[derive(Debug, Clone)]
pub struct PrettyInt {
    value: i64,
    label: Option<String>,
}

impl PrettyInt {
    /// Create from an integer
    #[inline]
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self { value, label: None }
    }

    /// Create with a custom text form
    #[inline]
    #[must_use]
    pub fn labelled(value: i64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: Some(label.into()),
        }
    }

    /// Underlying integer
    #[inline]
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Negated integer, `None` on overflow
    #[inline]
    #[must_use]
    pub fn checked_neg(&self) -> Option<i64> {
        self.value.checked_neg()
    }

    /// Custom text form, if a non-empty one was given
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|label| !label.is_empty())
    }
}

/// Format an integer with `,` between groups of three digits
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

impl Display for PrettyInt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => f.write_str(&group_thousands(self.value)),
        }
    }
}

impl From<i64> for PrettyInt {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<PrettyInt> for i64 {
    fn from(pretty: PrettyInt) -> Self {
        pretty.value
    }
}

impl PartialEq for PrettyInt {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for PrettyInt {}

impl PartialEq<i64> for PrettyInt {
    fn eq(&self, other: &i64) -> bool {
        self.value == *other
    }
}

impl PartialEq<PrettyInt> for i64 {
    fn eq(&self, other: &PrettyInt) -> bool {
        *self == other.value
    }
}

impl PartialOrd for PrettyInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrettyInt {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialOrd<i64> for PrettyInt {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        Some(self.value.cmp(other))
    }
}

impl Hash for PrettyInt {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Neg for PrettyInt {
    type Output = i64;

    /// # Panics
    /// Panics if the value is `i64::MIN`, in every build profile
    fn neg(self) -> i64 {
        match self.checked_neg() {
            Some(negated) => negated,
            None => panic!("attempt to negate PrettyInt with overflow"),
        }
    }
}

macro_rules! int_binop {
    ($($trait:ident :: $method:ident),* $(,)?) => {
        $(
            impl $trait for PrettyInt {
                type Output = i64;

                fn $method(self, rhs: Self) -> i64 {
                    $trait::$method(self.value, rhs.value)
                }
            }

            impl $trait<i64> for PrettyInt {
                type Output = i64;

                fn $method(self, rhs: i64) -> i64 {
                    $trait::$method(self.value, rhs)
                }
            }

            impl $trait<PrettyInt> for i64 {
                type Output = i64;

                fn $method(self, rhs: PrettyInt) -> i64 {
                    $trait::$method(self, rhs.value)
                }
            }
        )*
    };
}

int_binop!(Add::add, Sub::sub, Mul::mul, Div::div, Rem::rem);

impl Serialize for PrettyInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn groups_thousands() {
        assert_eq!(PrettyInt::new(100_000).to_string(), "100,000");
        assert_eq!(PrettyInt::new(1_000_000_000).to_string(), "1,000,000,000");
        assert_eq!(PrettyInt::new(999).to_string(), "999");
        assert_eq!(PrettyInt::new(0).to_string(), "0");
    }

    #[test]
    fn negative_values_keep_sign() {
        assert_eq!(PrettyInt::new(-1234).to_string(), "-1,234");
        assert_eq!(PrettyInt::new(i64::MIN).to_string(), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn negation_of_minimum_is_checked() {
        assert_eq!(PrettyInt::new(i64::MIN).checked_neg(), None);
        assert_eq!(PrettyInt::new(-5).checked_neg(), Some(5));
        assert_eq!(-PrettyInt::labelled(7, "seven"), -7_i64);
    }

    #[test]
    #[should_panic(expected = "negate PrettyInt with overflow")]
    fn negation_of_minimum_panics() {
        let _ = -PrettyInt::new(i64::MIN);
    }

    #[test]
    fn label_replaces_digits() {
        assert_eq!(PrettyInt::labelled(5, "five").to_string(), "five");
        assert_eq!(PrettyInt::labelled(5, "five").label(), Some("five"));
    }

    #[test]
    fn empty_label_falls_back_to_digits() {
        let pretty = PrettyInt::labelled(12_345, "");
        assert_eq!(pretty.label(), None);
        assert_eq!(pretty.to_string(), "12,345");
    }

    #[test]
    fn behaves_as_integer() {
        let a = PrettyInt::labelled(10, "ten");
        let b = PrettyInt::new(10);
        assert_eq!(a, b);
        assert_eq!(a, 10_i64);
        assert_eq!(10_i64, b);
        assert!(PrettyInt::new(3) < PrettyInt::labelled(4, "four"));
        assert!(PrettyInt::new(3) < 4_i64);

        assert_eq!(a.clone() + b.clone(), 20);
        assert_eq!(a.clone() * 3_i64, 30);
        assert_eq!(100_i64 / b.clone(), 10);
        assert_eq!(a.clone() - 11_i64, -1);
        assert_eq!(a.clone() % 3_i64, 1);
        assert_eq!(-b, -10);
    }

    #[test]
    fn hash_ignores_label() {
        let mut set = HashSet::new();
        set.insert(PrettyInt::labelled(7, "seven"));
        assert!(set.contains(&PrettyInt::new(7)));
    }

    #[test]
    fn serializes_as_plain_integer() {
        let value = serde_json::to_value(PrettyInt::labelled(1_000_000, "1M")).unwrap();
        assert_eq!(value, serde_json::json!(1_000_000));
    }

    proptest! {
        #[test]
        fn grouping_only_inserts_commas(value in any::<i64>()) {
            let text = PrettyInt::new(value).to_string();
            prop_assert_eq!(text.replace(',', ""), value.to_string());
        }

        #[test]
        fn groups_are_three_digits(value in 0i64..i64::MAX) {
            let text = PrettyInt::new(value).to_string();
            let groups: Vec<&str> = text.split(',').collect();
            prop_assert!(groups[0].len() <= 3 && !groups[0].is_empty());
            for group in &groups[1..] {
                prop_assert_eq!(group.len(), 3);
            }
        }
    }
}
