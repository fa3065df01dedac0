pub type NavcamResult<T> = Result<T, NavcamError>;

#[derive(thiserror::Error, Debug)]
pub enum NavcamError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("episode error: {0}")]
    Episode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NavcamError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn episode(msg: impl Into<String>) -> Self {
        Self::Episode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            NavcamError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            NavcamError::episode("x")
                .to_string()
                .contains("episode error:")
        );
        assert!(NavcamError::encode("x").to_string().contains("encode error:"));
        assert!(
            NavcamError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = NavcamError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
