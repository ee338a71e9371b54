//! Response emission.
//!
//! Turns rendered page text into a completed [`http::Response`]: UTF-8 body,
//! `Content-Type` with a charset parameter and an exact `Content-Length`.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use http::response::Builder;
use http::Response;

use crate::core::RenderError;

/// Content type used when the response does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// The only charset page text is encoded with.
pub const CHARSET: &str = "utf-8";

/// Complete a response with the rendered text.
///
/// An existing `Content-Type` keeps its media type; its charset is forced to
/// UTF-8. Consuming the builder means a response is completed at most once.
///
/// # Errors
///
/// Returns [`RenderError::Response`] when the builder already holds an error
/// or the resulting content type is not a valid header value.
pub fn emit(mut builder: Builder, text: String) -> Result<Response<Vec<u8>>, RenderError> {
    let existing = builder
        .headers_ref()
        .and_then(|headers| headers.get(CONTENT_TYPE))
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let content_type = content_type_with_charset(existing.as_deref());
    let content_type = HeaderValue::from_str(&content_type).map_err(http::Error::from)?;
    let body = text.into_bytes();

    if let Some(headers) = builder.headers_mut() {
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    }

    tracing::debug!("Emitting response ({} bytes)", body.len());
    Ok(builder.body(body)?)
}

/// Compute the `Content-Type` header value for a rendered page.
///
/// - no value (or a blank one) becomes `text/html; charset=utf-8`
/// - a value without a charset parameter gets `; charset=utf-8` appended
/// - a UTF-8 charset is kept as written
/// - any other charset is replaced by `utf-8` with a warning
pub fn content_type_with_charset(existing: Option<&str>) -> String {
    let existing = existing.map(str::trim).filter(|value| !value.is_empty());
    let Some(existing) = existing else {
        return format!("{}; charset={}", DEFAULT_CONTENT_TYPE, CHARSET);
    };

    let mut parts: Vec<String> = existing.split(';').map(|part| part.trim().to_string()).collect();
    let charset_index = parts.iter().skip(1).position(|param| {
        param
            .split_once('=')
            .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
    });

    match charset_index {
        None => format!("{}; charset={}", existing, CHARSET),
        Some(index) => {
            let index = index + 1;
            let declared = parts[index]
                .split_once('=')
                .map(|(_, value)| value.trim().trim_matches('"').to_string())
                .unwrap_or_default();

            if declared.eq_ignore_ascii_case("utf-8") || declared.eq_ignore_ascii_case("utf8") {
                return existing.to_string();
            }

            tracing::warn!(
                "Response declares charset '{}'; page text is always encoded as {}",
                declared,
                CHARSET
            );
            parts[index] = format!("charset={}", CHARSET);
            parts.join("; ")
        }
    }
}
