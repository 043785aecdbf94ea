//! Internal helpers for input validation and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every operation enforces the same rules.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub(crate) const MAX_NAME_LEN: usize = 100;
pub(crate) const MAX_DESCRIPTION_LEN: usize = 200;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Trim a required name and enforce the length limit.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::InvalidName(format!(
            "{label} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim a required free-text description and enforce the length limit.
pub(crate) fn normalize_required_description(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(
            "description must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(EngineError::InvalidName(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Like [`normalize_optional_text`], with the description length limit.
pub(crate) fn normalize_optional_description(value: Option<&str>) -> ResultEngine<Option<String>> {
    let text = normalize_optional_text(value);
    if let Some(text) = &text
        && text.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(EngineError::InvalidName(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(text)
}

/// Accept `#RRGGBB` hex colors.
pub(crate) fn normalize_color(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(EngineError::InvalidName(format!(
            "invalid color '{trimmed}': expected #RRGGBB"
        )));
    }
    Ok(trimmed.to_string())
}

/// Key used to compare names case- and form-insensitively.
pub(crate) fn name_key(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

/// Reject non-positive amounts.
pub(crate) fn require_positive_amount(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}

/// Reject negative amounts.
pub(crate) fn require_non_negative_amount(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be >= 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_must_be_hex_rgb() {
        assert_eq!(normalize_color(" #a1B2c3 ").unwrap(), "#a1B2c3");
        assert!(normalize_color("#12345").is_err());
        assert!(normalize_color("123456#").is_err());
        assert!(normalize_color("#GGGGGG").is_err());
    }

    #[test]
    fn required_name_is_trimmed() {
        assert_eq!(
            normalize_required_name("  Trip ", "piggybank").unwrap(),
            "Trip"
        );
        assert!(normalize_required_name("   ", "piggybank").is_err());
        assert!(normalize_required_name(&"x".repeat(101), "piggybank").is_err());
    }

    #[test]
    fn name_key_folds_case_and_width() {
        assert_eq!(name_key(" Food "), "food");
        assert_eq!(name_key("ＦＯＯＤ"), "food");
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(Some(" hi ")), Some("hi".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }
}
