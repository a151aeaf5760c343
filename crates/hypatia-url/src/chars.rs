//! Character classes and percent-encoding.
//!
//! The classes follow RFC 1738. Equality of rebuilt URLs depends on these
//! tables, so they are spelled out literally rather than derived.

/// `alpha = lowalpha | hialpha`
pub const ALPHA: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `digit`
pub const DIGIT: &str = "0123456789";

/// `safe = "$" | "-" | "_" | "." | "+"`
pub const SAFE: &str = "$-_.+";

/// `extra = "!" | "*" | "'" | "(" | ")" | ","`
pub const EXTRA: &str = "!*'(),";

/// `reserved = ";" | "/" | "?" | ":" | "@" | "&" | "="`
pub const RESERVED: &str = ";/?:@&=";

/// `unreserved = alpha | digit | safe | extra`
pub const UNRESERVED: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.+!*'(),";

/// Characters allowed verbatim in an HTTP path segment (`hsegment`).
pub const HTTP_SEGMENT: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.+!*'(),;:@&=";

/// Characters allowed verbatim in a query key or value.
///
/// `&` and `=` delimit pairs and `+` reads back as a space, so all three are
/// escaped.
pub const QUERY_COMPONENT: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.!*'(),;:@/?";

/// Characters allowed verbatim in a fragment.
pub const FRAGMENT: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.+!*'(),;/?:@&=";

/// Characters allowed verbatim in an FTP path segment (`fsegment`).
pub const FTP_SEGMENT: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.+!*'(),?:@&=";

/// Characters allowed verbatim in FTP user names and passwords.
pub const FTP_USER: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.+!*'(),;?&=";

/// Characters allowed in a host name.
pub const HOST: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-.";

/// Percent-encodes every character of `value` that is not in `allowed`.
///
/// Each UTF-8 byte of an escaped character becomes its own `%XX` triplet
/// with upper-case hex digits.
///
/// # Example
///
/// ```rust
/// use hypatia_url::chars::{to_safe_string, HTTP_SEGMENT};
///
/// assert_eq!(to_safe_string("a b", HTTP_SEGMENT), "a%20b");
/// assert_eq!(to_safe_string("zażółć", HTTP_SEGMENT), "za%C5%BC%C3%B3%C5%82%C4%87");
/// ```
#[must_use]
pub fn to_safe_string(value: &str, allowed: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut buffer = [0_u8; 4];
    for character in value.chars() {
        if character.is_ascii() && allowed.contains(character) {
            result.push(character);
            continue;
        }

        for byte in character.encode_utf8(&mut buffer).bytes() {
            result.push('%');
            result.push_str(&format!("{byte:02X}"));
        }
    }

    result
}

/// Decodes `%XX` escapes; invalid UTF-8 sequences are replaced.
#[must_use]
pub fn unescape(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned(),
    }
}

/// Decodes a query component, treating `+` as a space.
#[must_use]
pub fn unescape_query(value: &str) -> String {
    unescape(&value.replace('+', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreserved_is_the_union_of_its_classes() {
        let union: String = [ALPHA, DIGIT, SAFE, EXTRA].concat();
        assert_eq!(union, UNRESERVED);
    }

    #[test]
    fn test_segment_class_is_unreserved_plus_path_punctuation() {
        assert_eq!(HTTP_SEGMENT, format!("{UNRESERVED};:@&="));
        assert_eq!(FTP_SEGMENT, format!("{UNRESERVED}?:@&="));
        assert_eq!(FRAGMENT, format!("{UNRESERVED}{RESERVED}"));
    }

    #[test]
    fn test_reserved_characters_are_escaped_outside_their_class() {
        assert_eq!(to_safe_string("a/b", HTTP_SEGMENT), "a%2Fb");
        assert_eq!(to_safe_string("a?b", HTTP_SEGMENT), "a%3Fb");
        assert_eq!(to_safe_string("a&b=c", QUERY_COMPONENT), "a%26b%3Dc");
        assert_eq!(to_safe_string("100%", UNRESERVED), "100%25");
    }

    #[test]
    fn test_multibyte_characters_escape_every_byte() {
        assert_eq!(to_safe_string("€", UNRESERVED), "%E2%82%AC");
    }

    #[test]
    fn test_unescape_round_trips_safe_string() {
        let original = "zażółć gęślą / jaźń";
        let escaped = to_safe_string(original, HTTP_SEGMENT);
        assert_eq!(unescape(&escaped), original);
    }

    #[test]
    fn test_unescape_query_plus_is_space() {
        assert_eq!(unescape_query("hello+world%21"), "hello world!");
        assert_eq!(unescape("hello+world"), "hello+world");
    }

    #[test]
    fn test_unescape_invalid_utf8_is_lossy() {
        assert_eq!(unescape("%FF"), "\u{FFFD}");
    }
}
