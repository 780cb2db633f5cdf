//! Error types for provup-edit.
//!
//! Structural edits on a parsed tree do not fail. What can fail is turning a generated
//! requirement entry back into syntax, which only happens for names that are not valid
//! identifiers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// A generated entry did not parse back.
    #[error("cannot render requirement for provider {name:?}: {message}")]
    Render { name: String, message: String },

    /// A runtime/tool error occurred.
    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::EditError;

    #[test]
    fn render_error_names_provider() {
        let err = EditError::Render {
            name: "my.provider".to_string(),
            message: "expected `=`".to_string(),
        };
        assert!(err.to_string().contains("\"my.provider\""));
    }

    #[test]
    fn runtime_error_wraps_anyhow() {
        let err = EditError::from(anyhow::anyhow!("boom"));
        assert!(err.to_string().contains("runtime error"));
    }
}
