//! Naming conventions for verbs and routes.
//!
//! A method without an explicit verb gets one from its name: a leading HTTP
//! verb (`GetPerson`, `PostOrder`), else a leading popular word (`ListAll`,
//! `CreateUser`, `RemoveItem`), else `GET`. A method without an explicit
//! route is routed at its name lower-cased, with the leading word that
//! gave the verb stripped.

use http::Method;

const VERB_PREFIXES: [(&str, Method); 7] = [
    ("Get", Method::GET),
    ("Post", Method::POST),
    ("Put", Method::PUT),
    ("Delete", Method::DELETE),
    ("Patch", Method::PATCH),
    ("Head", Method::HEAD),
    ("Options", Method::OPTIONS),
];

const POPULAR_NAMES: [(&str, Method); 12] = [
    ("Query", Method::GET),
    ("All", Method::GET),
    ("List", Method::GET),
    ("Create", Method::POST),
    ("Build", Method::POST),
    ("Make", Method::POST),
    ("Set", Method::POST),
    ("Do", Method::POST),
    ("Replace", Method::POST),
    ("Update", Method::PUT),
    ("Remove", Method::DELETE),
    ("Teardown", Method::DELETE),
];

/// Splits a Pascal- or camel-case identifier into words.
///
/// Underscores separate words too; acronym runs stay together.
///
/// ```rust
/// use hypatia_router::conventions::split_words;
///
/// assert_eq!(split_words("GetPersonById"), ["Get", "Person", "By", "Id"]);
/// assert_eq!(split_words("parseHTTPRequest"), ["parse", "HTTP", "Request"]);
/// assert_eq!(split_words("list_all"), ["list", "all"]);
/// ```
#[must_use]
pub fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for chunk in name.split('_').filter(|chunk| !chunk.is_empty()) {
        let chars: Vec<(usize, char)> = chunk.char_indices().collect();
        let mut start = 0;
        for window in 1..chars.len() {
            let (index, current) = chars[window];
            let previous = chars[window - 1].1;
            let next_is_lower = chars.get(window + 1).is_some_and(|(_, c)| c.is_lowercase());
            let boundary = current.is_uppercase()
                && (previous.is_lowercase() || previous.is_ascii_digit() || (previous.is_uppercase() && next_is_lower));
            if boundary {
                words.push(&chunk[start..index]);
                start = index;
            }
        }
        words.push(&chunk[start..]);
    }
    words
}

/// A verb deduced from a method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeducedVerb {
    /// The verb.
    pub verb: Method,
    /// The HTTP verb or popular word found at the start of the name, if any.
    pub prefix: Option<&'static str>,
}

/// Deduces the verb for a method without explicit metadata.
///
/// ```rust
/// use hypatia_router::conventions::deduce_verb;
/// use http::Method;
///
/// assert_eq!(deduce_verb("GetGreeting").verb, Method::GET);
/// assert_eq!(deduce_verb("GetGreeting").prefix, Some("Get"));
/// assert_eq!(deduce_verb("CreateUser").verb, Method::POST);
/// assert_eq!(deduce_verb("CreateUser").prefix, Some("Create"));
/// assert_eq!(deduce_verb("TeardownCluster").verb, Method::DELETE);
/// assert_eq!(deduce_verb("Add").verb, Method::GET);
/// assert_eq!(deduce_verb("Add").prefix, None);
/// ```
#[must_use]
pub fn deduce_verb(method_name: &str) -> DeducedVerb {
    let Some(first) = split_words(method_name).first().copied() else {
        return DeducedVerb {
            verb: Method::GET,
            prefix: None,
        };
    };

    VERB_PREFIXES
        .iter()
        .chain(POPULAR_NAMES.iter())
        .find(|(word, _)| word.eq_ignore_ascii_case(first))
        .map_or(
            DeducedVerb {
                verb: Method::GET,
                prefix: None,
            },
            |(word, verb)| DeducedVerb {
                verb: verb.clone(),
                prefix: Some(*word),
            },
        )
}

/// The route of a method without explicit metadata, relative to its
/// controller.
///
/// ```rust
/// use hypatia_router::conventions::default_method_route;
///
/// assert_eq!(default_method_route("GetGreeting"), "greeting");
/// assert_eq!(default_method_route("Add"), "add");
/// assert_eq!(default_method_route("ListAll"), "all");
/// ```
#[must_use]
pub fn default_method_route(method_name: &str) -> String {
    let method_name = method_name.trim_start_matches('_');
    let name = match deduce_verb(method_name).prefix {
        Some(prefix) => &method_name[prefix.len()..],
        None => method_name,
    };
    name.trim_start_matches('_').to_lowercase()
}

/// The base route of a controller without an explicit one:
/// `/<prefix>/<type name without "Controller", lower-cased>`.
///
/// ```rust
/// use hypatia_router::conventions::default_controller_route;
///
/// assert_eq!(default_controller_route("PersonController", "api"), "/api/person");
/// assert_eq!(default_controller_route("Health", ""), "/health");
/// ```
#[must_use]
pub fn default_controller_route(type_name: &str, prefix: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    let name = short.strip_suffix("Controller").filter(|n| !n.is_empty()).unwrap_or(short);
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("/{}", name.to_lowercase())
    } else {
        format!("/{prefix}/{}", name.to_lowercase())
    }
}

/// Verbs that can be repeated without further effect.
#[must_use]
pub fn is_idempotent(verb: &Method) -> bool {
    matches!(
        *verb,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_digits_and_single_word() {
        assert_eq!(split_words("Get2Items"), ["Get2", "Items"]);
        assert_eq!(split_words("Add"), ["Add"]);
        assert!(split_words("").is_empty());
    }

    #[test]
    fn test_verb_prefix_wins_over_popular_name() {
        let deduced = deduce_verb("DeleteList");
        assert_eq!(deduced.verb, Method::DELETE);
        assert_eq!(deduced.prefix, Some("Delete"));
    }

    #[test]
    fn test_popular_names() {
        for (name, verb) in [
            ("QueryPeople", Method::GET),
            ("AllItems", Method::GET),
            ("BuildReport", Method::POST),
            ("MakeCoffee", Method::POST),
            ("SetName", Method::POST),
            ("DoWork", Method::POST),
            ("ReplaceAll", Method::POST),
            ("UpdateName", Method::PUT),
            ("RemoveItem", Method::DELETE),
        ] {
            assert_eq!(deduce_verb(name).verb, verb, "{name}");
            assert!(deduce_verb(name).prefix.is_some(), "{name}");
        }
    }

    #[test]
    fn test_prefix_must_be_a_whole_word() {
        // "Getaway" is one word, not Get + away
        assert_eq!(deduce_verb("Getaway").prefix, None);
        assert_eq!(default_method_route("Getaway"), "getaway");
        assert_eq!(default_method_route("Get"), "");
    }

    #[test]
    fn test_popular_name_is_stripped_from_route() {
        assert_eq!(default_method_route("QueryPeople"), "people");
        assert_eq!(default_method_route("RemoveItem"), "item");
        assert_eq!(default_method_route("teardown_cluster"), "cluster");
        assert_eq!(default_method_route("Listing"), "listing");
    }

    #[test]
    fn test_controller_route_keeps_bare_controller_name() {
        assert_eq!(default_controller_route("Controller", "api"), "/api/controller");
        assert_eq!(default_controller_route("app::TestController", "/v1/"), "/v1/test");
    }

    #[test]
    fn test_idempotent() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::PUT));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::PATCH));
    }
}
