use thiserror::Error;

/// Rejections raised while validating a matching request, before any trial runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid configuration field `{field}`: {detail}")]
    InvalidConfig { field: &'static str, detail: String },
    #[error("invalid mentee `{name}`: {detail}")]
    InvalidMentee { name: String, detail: String },
    #[error("invalid mentor `{name}`: {detail}")]
    InvalidMentor { name: String, detail: String },
}

impl MatchError {
    pub fn config(field: &'static str, detail: impl Into<String>) -> Self {
        MatchError::InvalidConfig {
            field,
            detail: detail.into(),
        }
    }
}
