//! Zip normalization, validation and mask formatting.

use crate::domain::model::ZipValue;
use crate::utils::error::{Result, ZipCodeError};

/// Mask character that consumes one zip character.
pub const MASK_PLACEHOLDER: char = '9';

/// Drop every character that is not an ASCII letter or digit, keeping order.
pub fn clear(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).collect()
}

pub fn validate(input: &str, zip_length: usize) -> Result<ZipValue> {
    let cleared = clear(input);

    if cleared.is_empty() {
        return Err(ZipCodeError::invalid_zip(input, "no letters or digits"));
    }

    if cleared.len() != zip_length {
        return Err(ZipCodeError::invalid_zip(
            input,
            format!("expected {} characters, got {}", zip_length, cleared.len()),
        ));
    }

    Ok(ZipValue::new(cleared))
}

/// Apply `mask` to `zip`. Characters past what the mask consumes are dropped;
/// a zip shorter than the mask's placeholders is a `FormatMismatch`.
pub fn format(zip: &str, mask: &str) -> Result<String> {
    let placeholders = mask.chars().filter(|c| *c == MASK_PLACEHOLDER).count();
    if zip.chars().count() < placeholders {
        return Err(ZipCodeError::FormatMismatch {
            zip: zip.to_string(),
            mask: mask.to_string(),
        });
    }

    Ok(format_truncated(zip, mask))
}

/// Lenient variant of [`format`]: stops as soon as the zip runs out, so no
/// trailing separator is emitted for a short zip.
pub fn format_truncated(zip: &str, mask: &str) -> String {
    let mut chars = zip.chars().peekable();
    let mut formatted = String::with_capacity(mask.len());

    for m in mask.chars() {
        if chars.peek().is_none() {
            break;
        }
        if m == MASK_PLACEHOLDER {
            if let Some(c) = chars.next() {
                formatted.push(c);
            }
        } else {
            formatted.push(m);
        }
    }

    formatted
}
