pub type RulegateResult<T> = Result<T, RulegateError>;

#[derive(thiserror::Error, Debug)]
pub enum RulegateError {
    /// Malformed rule metadata: missing handler, duplicate handler name,
    /// rule attached to an undeclared property. Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A path segment names a property that does not exist on the type
    /// being navigated. Distinct from a merely-absent sub-object, which
    /// resolves to `Unresolved` instead.
    #[error("path resolution error: {0}")]
    PathResolution(String),

    /// A custom handler raised while running. Recovered locally into a
    /// diagnostic message on the affected property.
    #[error("handler execution error: {0}")]
    HandlerExecution(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RulegateError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn path_resolution(msg: impl Into<String>) -> Self {
        Self::PathResolution(msg.into())
    }

    pub fn handler_execution(msg: impl Into<String>) -> Self {
        Self::HandlerExecution(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RulegateError::configuration("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(
            RulegateError::path_resolution("x")
                .to_string()
                .contains("path resolution error:")
        );
        assert!(
            RulegateError::handler_execution("x")
                .to_string()
                .contains("handler execution error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RulegateError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
