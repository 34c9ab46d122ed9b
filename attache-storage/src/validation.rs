//! Pre-flight file validation.
//!
//! Rules run in the order they were added and the first failure wins.
//! Validation never touches the network.

use attache_config::UploadConfig;
use thiserror::Error;

use crate::UploadedFile;

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// File is too large.
    #[error("File size ({size} bytes) exceeds maximum allowed size ({max} bytes)")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Maximum size.
        max: u64,
    },

    /// File type not allowed.
    #[error("File type ({mime_type}) is not allowed. Allowed types: {}", .allowed.join(", "))]
    TypeNotAllowed {
        /// The rejected MIME type, or `unknown` when none was declared.
        mime_type: String,
        /// The configured patterns, in their original order.
        allowed: Vec<String>,
    },
}

/// A validation rule for files.
pub trait ValidationRule: Send + Sync {
    /// Validate a file.
    fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError>;

    /// Rule description for logs.
    fn description(&self) -> &str;
}

/// File validator with configurable rules.
#[derive(Default)]
pub struct FileValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl FileValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the size and type checks an upload configuration asks for.
    pub fn from_config(config: &UploadConfig) -> Self {
        let mut validator = Self::new();
        if let Some(max) = config.max_file_size {
            validator = validator.max_size(max);
        }
        if !config.allowed_types.is_empty() {
            validator = validator.allowed_types(config.allowed_types.as_slice());
        }
        validator
    }

    /// Add a validation rule.
    pub fn rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Set maximum file size.
    pub fn max_size(self, bytes: u64) -> Self {
        self.rule(MaxSizeRule(bytes))
    }

    /// Set allowed MIME types. Entries ending in `/*` match a whole category.
    pub fn allowed_types<S: AsRef<str>>(self, types: &[S]) -> Self {
        self.rule(AllowedTypesRule(
            types.iter().map(|s| s.as_ref().to_string()).collect(),
        ))
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a file, stopping at the first failing rule.
    pub fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        for rule in &self.rules {
            if let Err(e) = rule.validate(file) {
                tracing::debug!(rule = rule.description(), error = %e, "File rejected");
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Validate a file against an upload configuration.
pub fn validate(file: &UploadedFile, config: &UploadConfig) -> Result<(), ValidationError> {
    FileValidator::from_config(config).validate(file)
}

// Built-in validation rules

struct MaxSizeRule(u64);

impl ValidationRule for MaxSizeRule {
    fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        if file.size() > self.0 {
            Err(ValidationError::TooLarge {
                size: file.size(),
                max: self.0,
            })
        } else {
            Ok(())
        }
    }

    fn description(&self) -> &str {
        "Maximum file size"
    }
}

struct AllowedTypesRule(Vec<String>);

impl AllowedTypesRule {
    fn matches(pattern: &str, essence: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) if prefix.ends_with('/') => essence
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
            _ => pattern.eq_ignore_ascii_case(essence),
        }
    }
}

impl ValidationRule for AllowedTypesRule {
    fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Ok(());
        }

        let essence = file.content_type().map(|ct| ct.essence_str());
        let allowed = essence.is_some_and(|essence| {
            self.0
                .iter()
                .any(|pattern| Self::matches(pattern.trim(), essence))
        });

        if allowed {
            Ok(())
        } else {
            Err(ValidationError::TypeNotAllowed {
                mime_type: essence.unwrap_or("unknown").to_string(),
                allowed: self.0.clone(),
            })
        }
    }

    fn description(&self) -> &str {
        "Allowed MIME types"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attache_config::PartialUploadConfig;
    use bytes::Bytes;

    fn text_file(len: usize) -> UploadedFile {
        UploadedFile::from_bytes(Bytes::from(vec![b'a'; len]), "notes.txt")
    }

    #[test]
    fn test_max_size_validation() {
        let validator = FileValidator::new().max_size(1024);

        let small_file = UploadedFile::new(Bytes::from(vec![0u8; 512]));
        assert!(validator.validate(&small_file).is_ok());

        let exact_file = UploadedFile::new(Bytes::from(vec![0u8; 1024]));
        assert!(validator.validate(&exact_file).is_ok());

        let large_file = UploadedFile::new(Bytes::from(vec![0u8; 2048]));
        assert!(validator.validate(&large_file).is_err());
    }

    #[test]
    fn test_size_message_has_both_byte_counts() {
        let err = FileValidator::new().max_size(5).validate(&text_file(12)).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("12 bytes"));
        assert!(message.contains("5 bytes"));
    }

    #[test]
    fn test_allowed_types_validation() {
        let validator = FileValidator::new().allowed_types(&["image/jpeg", "image/png"]);

        let jpeg_file = UploadedFile::from_bytes(Bytes::from("data"), "test.jpg");
        assert!(validator.validate(&jpeg_file).is_ok());
        assert!(validator.validate(&text_file(1)).is_err());
    }

    #[test]
    fn test_wildcard_matches_category() {
        let validator = FileValidator::new().allowed_types(&["image/*"]);

        let gif = UploadedFile::from_bytes(Bytes::from("gif"), "a.gif");
        assert!(validator.validate(&gif).is_ok());

        let err = validator.validate(&text_file(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "File type (text/plain) is not allowed. Allowed types: image/*"
        );
    }

    #[test]
    fn test_allowed_list_kept_in_order() {
        let validator = FileValidator::new().allowed_types(&["image/png", "application/pdf", "video/*"]);
        let err = validator.validate(&text_file(1)).unwrap_err();

        assert!(err.to_string().ends_with("image/png, application/pdf, video/*"));
    }

    #[test]
    fn test_parameters_ignored_for_exact_match() {
        let validator = FileValidator::new().allowed_types(&["text/plain"]);
        let file = text_file(1).with_content_type("text/plain; charset=utf-8".parse().unwrap());

        assert!(validator.validate(&file).is_ok());
    }

    #[test]
    fn test_missing_type_is_rejected_when_list_set() {
        let validator = FileValidator::new().allowed_types(&["image/*"]);
        let file = UploadedFile::new(Bytes::from("x"));

        let err = validator.validate(&file).unwrap_err();
        assert!(matches!(err, ValidationError::TypeNotAllowed { ref mime_type, .. } if mime_type == "unknown"));
    }

    #[test]
    fn test_size_checked_before_type() {
        let config = attache_config::resolve_config(
            &attache_config::AmbientSettings::empty(),
            &PartialUploadConfig::new()
                .max_file_size(5)
                .allowed_types(["image/*"]),
        );

        let err = validate(&text_file(12), &config).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { size: 12, max: 5 }));
    }

    #[test]
    fn test_from_config_without_limits() {
        let config = UploadConfig {
            max_file_size: None,
            ..Default::default()
        };

        let validator = FileValidator::from_config(&config);
        assert!(validator.is_empty());
        assert!(validator.validate(&text_file(usize::from(u16::MAX))).is_ok());
    }
}
