//! Default parameter sources and result targets.

use std::fmt;

use http::Method;
use hypatia_core::{ParameterMetadata, ParameterSource, ResultMetadata, ResultTarget};

use crate::conventions::is_idempotent;

/// Chooses where a parameter is read from, or where a result goes, when the
/// metadata does not say.
pub trait DefaultValueRelationSelector: Send + Sync + fmt::Debug {
    /// Source of an input parameter declared without one.
    fn provide_default(&self, parameter: &ParameterMetadata, verb: &Method) -> ParameterSource;

    /// Target of a result or output parameter declared without one.
    fn provide_default_result(&self, _result: &ResultMetadata) -> ResultTarget {
        ResultTarget::Body
    }
}

/// Type- and verb-based defaults.
///
/// - identifier-named integer or GUID parameters of idempotent verbs bind
///   from the URL path
/// - other primitives and primitive collections bind from the query string
/// - everything else binds from the body
///
/// ```rust
/// use hypatia_core::{ParameterMetadata, ParameterSource, TypeDescriptor};
/// use hypatia_router::{ConventionSelector, DefaultValueRelationSelector};
/// use http::Method;
///
/// let id = ParameterMetadata::new("personId", TypeDescriptor::integer());
/// assert_eq!(ConventionSelector.provide_default(&id, &Method::GET), ParameterSource::Url);
/// assert_eq!(ConventionSelector.provide_default(&id, &Method::POST), ParameterSource::Query);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ConventionSelector;

impl ConventionSelector {
    fn is_identifier_name(name: &str) -> bool {
        name.eq_ignore_ascii_case("id")
            || name.ends_with("Id")
            || name.ends_with("ID")
            || name.to_ascii_lowercase().ends_with("_id")
    }
}

impl DefaultValueRelationSelector for ConventionSelector {
    fn provide_default(&self, parameter: &ParameterMetadata, verb: &Method) -> ParameterSource {
        let ty = parameter.ty().non_optional();
        if ty.is_identifier_like() && Self::is_identifier_name(parameter.name()) && is_idempotent(verb) {
            ParameterSource::Url
        } else if ty.is_primitive() || ty.is_primitive_collection() {
            ParameterSource::Query
        } else {
            ParameterSource::Body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypatia_core::TypeDescriptor;

    fn source(name: &str, ty: TypeDescriptor, verb: &Method) -> ParameterSource {
        ConventionSelector.provide_default(&ParameterMetadata::new(name, ty), verb)
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(source("id", TypeDescriptor::guid(), &Method::DELETE), ParameterSource::Url);
        assert_eq!(source("person_id", TypeDescriptor::integer(), &Method::PUT), ParameterSource::Url);
        // a string is never identifier-like
        assert_eq!(source("id", TypeDescriptor::string(), &Method::GET), ParameterSource::Query);
        // "paid" ends in "id" but is not an identifier name
        assert_eq!(source("paid", TypeDescriptor::integer(), &Method::GET), ParameterSource::Query);
    }

    #[test]
    fn test_collections_and_complex_types() {
        let tags = TypeDescriptor::array(TypeDescriptor::string());
        assert_eq!(source("tags", tags, &Method::GET), ParameterSource::Query);

        let person = TypeDescriptor::object("Person");
        assert_eq!(source("person", person, &Method::POST), ParameterSource::Body);

        let people = TypeDescriptor::array(TypeDescriptor::object("Person"));
        assert_eq!(source("people", people, &Method::PUT), ParameterSource::Body);
    }

    #[test]
    fn test_results_default_to_body() {
        let result = ResultMetadata::new(TypeDescriptor::integer());
        assert_eq!(ConventionSelector.provide_default_result(&result), ResultTarget::Body);
    }
}
