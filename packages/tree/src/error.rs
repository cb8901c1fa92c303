use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Malformed markup: {0}")]
    Markup(String),

    #[error("Element `{class}` has no id attribute")]
    MissingId { class: String },

    #[error("Rows container #npb-rows-wrapper not found")]
    MissingRowsContainer,

    #[error("Expected a {expected} fragment, found {found}")]
    UnexpectedFragment { expected: String, found: String },

    #[error("Invalid settings payload on {id}: {message}")]
    InvalidSettings { id: String, message: String },
}

impl TreeError {
    pub fn missing_id(class: impl Into<String>) -> Self {
        Self::MissingId {
            class: class.into(),
        }
    }

    pub fn unexpected_fragment(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedFragment {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
