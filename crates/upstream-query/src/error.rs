use itertools::Itertools;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The query text could not be parsed.
    #[error("Query contains syntax errors: {}", .errors.iter().join("; "))]
    Syntax { errors: Vec<String> },
    /// One or more operation limits were violated. Carries every violation, not only the first.
    #[error("Query validation failed: {}", .errors.iter().join("; "))]
    Validation { errors: Vec<String> },
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Messages carried by the error, one per failing rule.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            Error::Syntax { errors } | Error::Validation { errors } => errors.iter().map(String::as_str).collect(),
            Error::Configuration { message } => vec![message.as_str()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let error = Error::Validation {
            errors: vec!["too deep".to_string(), "too wide".to_string()],
        };

        insta::assert_snapshot!(error, @"Query validation failed: too deep; too wide");
        assert_eq!(error.messages(), vec!["too deep", "too wide"]);
    }

    #[test]
    fn configuration_error_display() {
        let error = Error::configuration("`max_depth` must be greater than zero");

        insta::assert_snapshot!(error, @"Invalid configuration: `max_depth` must be greater than zero");
    }
}
