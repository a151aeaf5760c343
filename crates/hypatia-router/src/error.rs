//! Controller description errors.

use thiserror::Error;

/// Raised while turning controller metadata into operation descriptions.
///
/// These are registration-time configuration errors; requests never see
/// them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DescriptionError {
    /// A route template could not be parsed.
    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A compiled template was rejected by the regex engine.
    #[error("route template '{template}' does not compile: {message}")]
    Regex {
        /// The offending template.
        template: String,
        /// Regex engine message.
        message: String,
    },

    /// Two methods of one controller share a verb and path pattern.
    #[error("controller '{controller}' maps {verb} {route} to both '{first}' and '{second}'")]
    AmbiguousRoute {
        /// Controller type name.
        controller: String,
        /// HTTP verb.
        verb: String,
        /// Route template path.
        route: String,
        /// Method registered first.
        first: String,
        /// Method registered second.
        second: String,
    },
}

impl DescriptionError {
    pub(crate) fn invalid_template(template: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}
