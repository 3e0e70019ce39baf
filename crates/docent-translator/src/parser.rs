//! Parse LLM output into a query descriptor

use crate::error::TranslationError;
use docent_domain::QueryDescriptor;

/// Parse the model's reply into exactly one descriptor
///
/// The reply must be a single JSON object, optionally wrapped in one
/// markdown code fence. Anything else fails; nothing is repaired.
pub fn parse_llm_response(response: &str) -> Result<QueryDescriptor, TranslationError> {
    let json_str = extract_json(response)?;
    if json_str.is_empty() {
        return Err(TranslationError::InvalidFormat("empty response".to_string()));
    }

    let descriptor: QueryDescriptor = serde_json::from_str(json_str)?;

    if descriptor.collection.trim().is_empty() {
        return Err(TranslationError::InvalidFormat(
            "collection name is empty".to_string(),
        ));
    }

    Ok(descriptor)
}

/// Strip a surrounding markdown code fence, if any
fn extract_json(response: &str) -> Result<&str, TranslationError> {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return Ok(trimmed);
    }

    let body = match trimmed.strip_suffix("```") {
        Some(body) if trimmed.len() >= 6 => body,
        _ => {
            return Err(TranslationError::InvalidFormat(
                "unterminated code block".to_string(),
            ))
        }
    };

    // Drop the opening fence line, including any language tag
    let body = match body.split_once('\n') {
        Some((_, rest)) => rest,
        None => return Err(TranslationError::InvalidFormat("empty code block".to_string())),
    };

    Ok(body.trim())
}
