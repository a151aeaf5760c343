//! `multipart/form-data` decomposition.
//!
//! Every part becomes one text field; file parts contribute their content
//! under the part name.

use std::io;

use bytes::Bytes;

use crate::error::{BindingError, BindingSource};
use crate::form::FormFields;

/// Media type of multipart forms.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Reads a multipart body into fields.
///
/// Unnamed parts are kept under an empty name so positional binding still
/// sees them.
pub async fn read_multipart(
    content_type: &str,
    body: Bytes,
    max_fields: usize,
) -> Result<FormFields, BindingError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| BindingError::malformed(BindingSource::ContentType, e))?;

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut fields = FormFields::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BindingError::malformed(BindingSource::Body, format!("multipart parse error: {e}")))?
    {
        if fields.len() >= max_fields {
            return Err(BindingError::too_many_fields(max_fields));
        }

        let name = field.name().unwrap_or_default().to_string();
        let text = field
            .text()
            .await
            .map_err(|e| BindingError::malformed(BindingSource::Body, format!("failed to read field '{name}': {e}")))?;
        fields.push(name, text);
    }

    tracing::debug!(fields = fields.len(), "decomposed multipart body");
    Ok(fields)
}
