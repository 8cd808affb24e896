use lazy_static::lazy_static;
use regex::Regex;

use crate::workflow::WorkflowError;

/// Longest organization name Grafana stores.
const MAX_NAME_LEN: usize = 190;

lazy_static! {
    static ref PROJECT_NAME: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

/// Checks a project name before any Grafana call is made. The name becomes
/// the org name, the Loki tenant header value and the folder slug.
pub fn validate_project_name(name: &str, reserved_org_name: &str) -> Result<(), WorkflowError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkflowError::Validation("Project name must not be empty.".to_string()));
    }
    if name.eq_ignore_ascii_case(reserved_org_name.trim()) {
        return Err(WorkflowError::Validation(format!(
            "'{}' is the reserved default organization and cannot be used as a project name.",
            name
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(WorkflowError::Validation(format!(
            "Project name must be at most {} characters.",
            MAX_NAME_LEN
        )));
    }
    if !PROJECT_NAME.is_match(name) {
        return Err(WorkflowError::Validation(format!(
            "Invalid project name '{}': use letters, digits, '.', '_' or '-', starting with a letter or digit.",
            name
        )));
    }
    Ok(())
}

/// Telegram chat ids are signed; groups and channels are negative.
pub fn parse_chat_id(raw: &str) -> Result<i64, WorkflowError> {
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => Err(WorkflowError::Validation(format!(
            "Invalid chat id '{}': expected a non-zero integer such as 12345 or -1001234567890.",
            raw.trim()
        ))),
        Ok(id) => Ok(id),
    }
}

pub fn validate_chat_id(chat_id: i64) -> Result<(), WorkflowError> {
    if chat_id == 0 {
        return Err(WorkflowError::Validation("Chat id must not be 0.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["acme", "Acme-2", "team.billing", "a_b", "9lives"] {
            assert!(validate_project_name(name, "Main Org.").is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "   ", "-acme", "ac me", "acme/prod", "<b>x</b>"] {
            assert!(
                matches!(validate_project_name(name, "Main Org."), Err(WorkflowError::Validation(_))),
                "{:?}",
                name
            );
        }
        assert!(validate_project_name(&"a".repeat(191), "Main Org.").is_err());
    }

    #[test]
    fn test_reserved_name_is_rejected_case_insensitively() {
        assert!(validate_project_name("main org.", "Main Org.").is_err());
        assert!(validate_project_name("Main", "Main Org.").is_ok());
    }

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("12345").unwrap(), 12345);
        assert_eq!(parse_chat_id(" -1001234567890 ").unwrap(), -1001234567890);
        assert!(parse_chat_id("0").is_err());
        assert!(parse_chat_id("@channel").is_err());
        assert!(parse_chat_id("").is_err());
    }
}
