use std::fmt::{Display, Formatter};

use classgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Maximum accepted length of a classification code.
pub const CLASSIFICATION_CODE_MAX_LENGTH: usize = 64;

/// Identifier of a node in a hierarchical classification scheme, e.g. an IPC
/// code such as `H01M` or `H01M10/0525`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassificationCode(String);

impl ClassificationCode {
    /// Creates a validated classification code.
    ///
    /// Surrounding whitespace is removed. Codes are otherwise compared
    /// byte-for-byte.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "classification code must not be empty".to_owned(),
            ));
        }

        if trimmed.chars().count() > CLASSIFICATION_CODE_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "classification code must be at most {CLASSIFICATION_CODE_MAX_LENGTH} characters"
            )));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(AppError::Validation(
                "classification code must not contain control characters".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ClassificationCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for ClassificationCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClassificationCode> for String {
    fn from(value: ClassificationCode) -> Self {
        value.0
    }
}

/// One node of the classification tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationNode {
    code: ClassificationCode,
    parent_code: Option<ClassificationCode>,
    section: NonEmptyString,
    title: Option<String>,
}

impl ClassificationNode {
    /// Creates a classification node with validated fields.
    pub fn new(
        code: impl Into<String>,
        parent_code: Option<String>,
        section: impl Into<String>,
        title: Option<String>,
    ) -> AppResult<Self> {
        let code = ClassificationCode::new(code)?;
        let parent_code = parent_code.map(ClassificationCode::new).transpose()?;

        if parent_code.as_ref() == Some(&code) {
            return Err(AppError::Validation(format!(
                "classification node '{code}' cannot be its own parent"
            )));
        }

        Ok(Self {
            code,
            parent_code,
            section: NonEmptyString::new(section)?,
            title: title.filter(|value| !value.trim().is_empty()),
        })
    }

    /// Returns the node code.
    #[must_use]
    pub fn code(&self) -> &ClassificationCode {
        &self.code
    }

    /// Returns the parent code, or `None` for top-level nodes.
    #[must_use]
    pub fn parent_code(&self) -> Option<&ClassificationCode> {
        self.parent_code.as_ref()
    }

    /// Returns the top-level grouping label.
    #[must_use]
    pub fn section(&self) -> &NonEmptyString {
        &self.section
    }

    /// Returns the human-readable title, when known.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns whether the node starts a tree of the forest.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_code.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{CLASSIFICATION_CODE_MAX_LENGTH, ClassificationCode, ClassificationNode};

    #[test]
    fn code_is_trimmed() {
        let code = ClassificationCode::new("  H01M10/0525 ");
        assert_eq!(
            code.map(String::from).unwrap_or_default(),
            "H01M10/0525".to_owned()
        );
    }

    #[test]
    fn code_rejects_blank_and_oversized_values() {
        assert!(ClassificationCode::new("   ").is_err());
        assert!(ClassificationCode::new("A".repeat(CLASSIFICATION_CODE_MAX_LENGTH + 1)).is_err());
        assert!(ClassificationCode::new("H01\nM").is_err());
    }

    #[test]
    fn node_rejects_self_parent() {
        let node = ClassificationNode::new("H01M", Some("H01M".to_owned()), "H", None);
        assert!(node.is_err());
    }

    #[test]
    fn blank_title_is_dropped() {
        let node = ClassificationNode::new("H01M", Some("H01".to_owned()), "H", Some(" ".to_owned()));
        assert!(node.is_ok_and(|node| node.title().is_none() && !node.is_root()));
    }

    #[test]
    fn code_deserializes_through_validation() {
        let parsed: Result<ClassificationCode, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
    }
}
