//! Converter compatibility levels.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// How well a converter fits a request or response, as a bitset.
///
/// Higher numeric values are better matches. [`NONE`](Self::NONE) means
/// incompatible and is never selected.
///
/// | Level | Bits |
/// |---|---|
/// | `PROTOCOL_MATCH` | `0x1` |
/// | `TYPE_MATCH` | `0x2` |
/// | `EXACT_PROTOCOL_MATCH` | `0x4 \| PROTOCOL_MATCH` |
/// | `EXACT_TYPE_MATCH` | `0x8 \| TYPE_MATCH` |
/// | `EXACT_MATCH` | `EXACT_PROTOCOL_MATCH \| EXACT_TYPE_MATCH` |
///
/// # Example
///
/// ```
/// use hypatia_core::CompatibilityLevel;
///
/// let level = CompatibilityLevel::PROTOCOL_MATCH | CompatibilityLevel::EXACT_TYPE_MATCH;
/// assert!(level.has_type_match());
/// assert!(!level.has_exact_protocol_match());
/// assert!(CompatibilityLevel::EXACT_MATCH > level);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CompatibilityLevel(u8);

impl CompatibilityLevel {
    /// Incompatible.
    pub const NONE: Self = Self(0);
    /// The media type is acceptable.
    pub const PROTOCOL_MATCH: Self = Self(0x1);
    /// The value type can be handled.
    pub const TYPE_MATCH: Self = Self(0x2);
    /// The media type is exactly the converter's own.
    pub const EXACT_PROTOCOL_MATCH: Self = Self(0x4 | 0x1);
    /// The value type is exactly the converter's own.
    pub const EXACT_TYPE_MATCH: Self = Self(0x8 | 0x2);
    /// Both exact.
    pub const EXACT_MATCH: Self = Self(0x4 | 0x1 | 0x8 | 0x2);

    const EXACT_PROTOCOL_BIT: u8 = 0x4;

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` for [`NONE`](Self::NONE).
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when the protocol bit is set.
    #[must_use]
    pub const fn has_protocol_match(self) -> bool {
        self.contains(Self::PROTOCOL_MATCH)
    }

    /// Returns `true` when the type bit is set.
    #[must_use]
    pub const fn has_type_match(self) -> bool {
        self.contains(Self::TYPE_MATCH)
    }

    /// Returns `true` when the exact protocol bits are set.
    #[must_use]
    pub const fn has_exact_protocol_match(self) -> bool {
        self.contains(Self::EXACT_PROTOCOL_MATCH)
    }

    /// Returns `true` when the exact type bits are set.
    #[must_use]
    pub const fn has_exact_type_match(self) -> bool {
        self.contains(Self::EXACT_TYPE_MATCH)
    }

    /// Clears every protocol bit, keeping only the type bits.
    ///
    /// Used when ranking converters while ignoring the media type.
    #[must_use]
    pub const fn without_protocol(self) -> Self {
        Self(self.0 & !(Self::EXACT_PROTOCOL_BIT | 0x1))
    }

    /// Combines a protocol and a type level; incompatible if the type does
    /// not match at all.
    #[must_use]
    pub const fn combine(protocol: Self, value_type: Self) -> Self {
        if value_type.has_type_match() {
            Self(protocol.0 | value_type.0)
        } else {
            Self::NONE
        }
    }
}

impl BitOr for CompatibilityLevel {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for CompatibilityLevel {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "None",
            Self::PROTOCOL_MATCH => "ProtocolMatch",
            Self::TYPE_MATCH => "TypeMatch",
            Self::EXACT_PROTOCOL_MATCH => "ExactProtocolMatch",
            Self::EXACT_TYPE_MATCH => "ExactTypeMatch",
            Self::EXACT_MATCH => "ExactMatch",
            _ => return write!(f, "{:#04x}", self.0),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_numeric_values() {
        assert_eq!(CompatibilityLevel::PROTOCOL_MATCH.bits(), 1);
        assert_eq!(CompatibilityLevel::TYPE_MATCH.bits(), 2);
        assert_eq!(CompatibilityLevel::EXACT_PROTOCOL_MATCH.bits(), 5);
        assert_eq!(CompatibilityLevel::EXACT_TYPE_MATCH.bits(), 10);
        assert_eq!(CompatibilityLevel::EXACT_MATCH.bits(), 15);
    }

    #[test]
    fn test_ordering_follows_numeric_value() {
        let mut levels = vec![
            CompatibilityLevel::EXACT_TYPE_MATCH,
            CompatibilityLevel::NONE,
            CompatibilityLevel::EXACT_MATCH,
            CompatibilityLevel::TYPE_MATCH | CompatibilityLevel::PROTOCOL_MATCH,
        ];
        levels.sort();
        assert_eq!(
            levels,
            vec![
                CompatibilityLevel::NONE,
                CompatibilityLevel(3),
                CompatibilityLevel::EXACT_TYPE_MATCH,
                CompatibilityLevel::EXACT_MATCH,
            ]
        );
    }

    #[test]
    fn test_exact_levels_imply_plain_bits() {
        assert!(CompatibilityLevel::EXACT_PROTOCOL_MATCH.has_protocol_match());
        assert!(CompatibilityLevel::EXACT_TYPE_MATCH.has_type_match());
        assert!(!CompatibilityLevel::PROTOCOL_MATCH.has_exact_protocol_match());
    }

    #[test]
    fn test_without_protocol() {
        assert_eq!(
            CompatibilityLevel::EXACT_MATCH.without_protocol(),
            CompatibilityLevel::EXACT_TYPE_MATCH
        );
    }

    #[test]
    fn test_combine_requires_type_match() {
        assert_eq!(
            CompatibilityLevel::combine(
                CompatibilityLevel::EXACT_PROTOCOL_MATCH,
                CompatibilityLevel::NONE
            ),
            CompatibilityLevel::NONE
        );
        assert_eq!(
            CompatibilityLevel::combine(
                CompatibilityLevel::NONE,
                CompatibilityLevel::TYPE_MATCH
            ),
            CompatibilityLevel::TYPE_MATCH
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CompatibilityLevel::EXACT_MATCH.to_string(), "ExactMatch");
        assert_eq!(CompatibilityLevel(3).to_string(), "0x03");
    }

    fn protocol_level() -> impl Strategy<Value = CompatibilityLevel> {
        prop_oneof![
            Just(CompatibilityLevel::NONE),
            Just(CompatibilityLevel::PROTOCOL_MATCH),
            Just(CompatibilityLevel::EXACT_PROTOCOL_MATCH),
        ]
    }

    fn type_level() -> impl Strategy<Value = CompatibilityLevel> {
        prop_oneof![
            Just(CompatibilityLevel::NONE),
            Just(CompatibilityLevel::TYPE_MATCH),
            Just(CompatibilityLevel::EXACT_TYPE_MATCH),
        ]
    }

    proptest! {
        #[test]
        fn prop_combine_requires_type_match(protocol in protocol_level(), value_type in type_level()) {
            let combined = CompatibilityLevel::combine(protocol, value_type);
            prop_assert_eq!(combined.is_none(), !value_type.has_type_match());
            if value_type.has_type_match() {
                prop_assert_eq!(combined.without_protocol(), value_type);
                prop_assert!(combined >= value_type);
            }
        }

        #[test]
        fn prop_exact_type_outranks_any_protocol(protocol in protocol_level()) {
            let exact = CompatibilityLevel::combine(CompatibilityLevel::PROTOCOL_MATCH, CompatibilityLevel::EXACT_TYPE_MATCH);
            let plain = CompatibilityLevel::combine(protocol, CompatibilityLevel::TYPE_MATCH);
            prop_assert!(exact > plain);
        }
    }
}
