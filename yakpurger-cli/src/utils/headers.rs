use crate::error::AppError;
use tracing::{debug, error};

/// Parses `Name: value` header strings into name/value pairs.
///
/// Each string is split at the first `:`; surrounding whitespace is trimmed
/// from both parts. An empty name is rejected.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if a header has no `:` separator or an
/// empty name.
///
/// # Examples
///
/// ```
/// use yakpurger::utils::parse_headers;
///
/// let headers = vec![
///     "Referer: https://example.com/".to_string(),
///     "X-Token:abc".to_string(),
/// ];
/// let result = parse_headers(&headers).unwrap();
/// assert_eq!(result, vec![
///     ("Referer".to_string(), "https://example.com/".to_string()),
///     ("X-Token".to_string(), "abc".to_string()),
/// ]);
/// ```
pub fn parse_headers(headers: &[String]) -> Result<Vec<(String, String)>, AppError> {
    debug!("Parsing {} headers", headers.len());

    headers
        .iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| {
                    debug!("Added header: {name}");
                    (name.to_string(), value.to_string())
                })
                .ok_or_else(|| {
                    error!("Invalid header format: {header}");
                    AppError::InvalidInput(format!(
                        "Invalid header format `{header}`, expected `Name: value`"
                    ))
                })
        })
        .collect()
}
