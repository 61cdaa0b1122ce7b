use thiserror::Error;

/// Errors raised while configuring or running a fuzzing session.
///
/// None of these are retried by the engine. A `Selection` or `Configuration`
/// error aborts the session in progress and is handed back to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FuzzError {
    /// A probability outside the closed interval `[0.0, 1.0]` (or NaN) was supplied.
    #[error("Invalid probability {0}: expected a value within [0.0, 1.0]")]
    InvalidProbability(f64),

    /// A random choice was requested over an empty set of candidates.
    #[error("Unable to choose a random element: {0} is empty")]
    Selection(String),

    /// The exclusions given for an enumeration leave no constant to choose from.
    #[error("All constants of {enumeration} are excluded: {excluded}")]
    Configuration {
        enumeration: &'static str,
        excluded: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offending_input() {
        let invalid = FuzzError::InvalidProbability(1.5);
        assert!(invalid.to_string().contains("1.5"));

        let selection = FuzzError::Selection("list of mutators".to_string());
        assert!(selection.to_string().contains("list of mutators"));

        let configuration = FuzzError::Configuration {
            enumeration: "Gender",
            excluded: "Male, Female".to_string(),
        };
        let message = configuration.to_string();
        assert!(message.contains("Gender"));
        assert!(message.contains("Male, Female"));
    }
}
