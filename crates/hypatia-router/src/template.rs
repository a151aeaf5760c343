//! URI templates and their compiled matchers.
//!
//! A template is a path with `{name}` variables, optionally followed by a
//! single `{?a,b}` query placeholder listing the query-bound parameters:
//!
//! ```text
//! /api/person/{personId}/address/{id}{?expand,fields}
//! ```
//!
//! Matching is case-insensitive, a trailing slash is optional and any query
//! string or fragment is accepted after the path.

use std::fmt;

use hypatia_url::chars;
use regex::Regex;

use crate::error::DescriptionError;
use crate::params::RouteValues;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Variable(String),
}

/// A parsed route template.
///
/// # Example
///
/// ```rust
/// use hypatia_router::UriTemplate;
///
/// let template = UriTemplate::parse("/api/test/add{?operandA,operandB}").unwrap();
/// assert_eq!(template.path(), "/api/test/add");
/// assert_eq!(template.query_variables(), ["operandA", "operandB"]);
///
/// let matcher = template.compile().unwrap();
/// assert!(matcher.is_match("/API/Test/add/?operandB=2&operandA=1"));
/// assert!(!matcher.is_match("/api/test/add/extra"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    path: String,
    parts: Vec<Part>,
    query: Vec<String>,
}

impl UriTemplate {
    /// Parses a template.
    pub fn parse(template: &str) -> Result<Self, DescriptionError> {
        let (path, query) = match template.find("{?") {
            Some(start) => {
                let placeholder = &template[start..];
                if !placeholder.ends_with('}') || placeholder[2..placeholder.len() - 1].contains(['{', '}']) {
                    return Err(DescriptionError::invalid_template(
                        template,
                        "the query placeholder must close the template",
                    ));
                }
                let names = placeholder[2..placeholder.len() - 1]
                    .split(',')
                    .map(str::trim)
                    .map(|name| Self::variable_name(template, name))
                    .collect::<Result<Vec<_>, _>>()?;
                (&template[..start], names)
            }
            None => (template, Vec::new()),
        };

        let parts = Self::parse_path(template, path)?;
        let mut template = Self {
            raw: template.to_string(),
            path: String::new(),
            parts,
            query,
        };
        template.path = template.render_path(|name| format!("{{{name}}}"));
        Ok(template)
    }

    fn parse_path(template: &str, path: &str) -> Result<Vec<Part>, DescriptionError> {
        let mut parts = Vec::new();
        let mut rest = path;
        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    parts.push(Part::Literal(rest.to_string()));
                    break;
                }
                Some(index) if rest.as_bytes()[index] == b'}' => {
                    return Err(DescriptionError::invalid_template(template, "unmatched '}'"));
                }
                Some(index) => {
                    if index > 0 {
                        parts.push(Part::Literal(rest[..index].to_string()));
                    }
                    let after = &rest[index + 1..];
                    let end = after
                        .find('}')
                        .ok_or_else(|| DescriptionError::invalid_template(template, "unclosed '{'"))?;
                    let name = Self::variable_name(template, &after[..end])?;
                    parts.push(Part::Variable(name));
                    rest = &after[end + 1..];
                }
            }
        }

        // the optional trailing slash is part of every matcher
        if let Some(Part::Literal(last)) = parts.last_mut() {
            let trimmed = last.trim_end_matches('/').len();
            last.truncate(trimmed);
            if last.is_empty() {
                parts.pop();
            }
        }
        Ok(parts)
    }

    fn variable_name(template: &str, name: &str) -> Result<String, DescriptionError> {
        if name.is_empty() {
            return Err(DescriptionError::invalid_template(template, "empty variable name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DescriptionError::invalid_template(
                template,
                format!("variable '{name}' must be alphanumeric"),
            ));
        }
        Ok(name.to_string())
    }

    fn render_path(&self, mut variable: impl FnMut(&str) -> String) -> String {
        let path: String = self
            .parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) => text.clone(),
                Part::Variable(name) => variable(name),
            })
            .collect();
        if path.is_empty() {
            "/".to_string()
        } else {
            path
        }
    }

    /// Joins a controller base route and a method route.
    ///
    /// ```rust
    /// use hypatia_router::UriTemplate;
    ///
    /// assert_eq!(UriTemplate::join("/api/person", "/{id}"), "/api/person/{id}");
    /// assert_eq!(UriTemplate::join("/api/test/", "add"), "/api/test/add");
    /// assert_eq!(UriTemplate::join("/api/person", ""), "/api/person");
    /// ```
    #[must_use]
    pub fn join(base: &str, route: &str) -> String {
        let route = route.trim_start_matches('/');
        if route.is_empty() {
            return base.to_string();
        }
        format!("{}/{}", base.trim_end_matches('/'), route)
    }

    /// Returns the template text as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the path part with variables in braces and no trailing slash.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Iterates over path variable names in template order.
    pub fn path_variables(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Variable(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Returns the names listed in the query placeholder.
    #[must_use]
    pub fn query_variables(&self) -> &[String] {
        &self.query
    }

    /// Returns `true` if `name` is a path variable, ignoring ASCII case.
    #[must_use]
    pub fn has_path_variable(&self, name: &str) -> bool {
        self.path_variables().any(|v| v.eq_ignore_ascii_case(name))
    }

    /// Total length of the literal path text, the primary specificity
    /// measure when several templates match one URL.
    #[must_use]
    pub fn literal_len(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) => text.len(),
                Part::Variable(_) => 0,
            })
            .sum()
    }

    /// Returns the number of path variables.
    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.path_variables().count()
    }

    /// Lower-cased path with anonymous variables, equal for templates that
    /// match exactly the same URLs.
    #[must_use]
    pub fn pattern_key(&self) -> String {
        self.render_path(|_| "{}".to_string()).to_ascii_lowercase()
    }

    /// Substitutes path variables, escaping each value as a path segment.
    /// Variables without a value are left in braces.
    #[must_use]
    pub fn expand(&self, mut value: impl FnMut(&str) -> Option<String>) -> String {
        self.render_path(|name| match value(name) {
            Some(text) => chars::to_safe_string(&text, chars::HTTP_SEGMENT),
            None => format!("{{{name}}}"),
        })
    }

    /// Compiles the matcher for this template.
    pub fn compile(&self) -> Result<TemplateRegex, DescriptionError> {
        let mut pattern = String::from("(?i)^");
        for part in &self.parts {
            match part {
                Part::Literal(text) => pattern.push_str(&regex::escape(text)),
                Part::Variable(_) => pattern.push_str("([^/?#]+)"),
            }
        }
        pattern.push_str(r"/?(?:\?[^#]*)?(?:#.*)?$");

        let regex = Regex::new(&pattern).map_err(|err| DescriptionError::Regex {
            template: self.raw.clone(),
            message: err.to_string(),
        })?;
        Ok(TemplateRegex {
            regex,
            variables: self.path_variables().map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compiled matcher of a [`UriTemplate`].
#[derive(Debug, Clone)]
pub struct TemplateRegex {
    regex: Regex,
    variables: Vec<String>,
}

impl TemplateRegex {
    /// Returns `true` if `path_and_query` matches.
    #[must_use]
    pub fn is_match(&self, path_and_query: &str) -> bool {
        self.regex.is_match(path_and_query)
    }

    /// Matches `path_and_query` and returns the decoded variable values.
    #[must_use]
    pub fn captures(&self, path_and_query: &str) -> Option<RouteValues> {
        let captures = self.regex.captures(path_and_query)?;
        Some(
            self.variables
                .iter()
                .enumerate()
                .filter_map(|(index, name)| {
                    captures
                        .get(index + 1)
                        .map(|value| (name.clone(), chars::unescape(value.as_str())))
                })
                .collect(),
        )
    }

    /// Returns the regex source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
