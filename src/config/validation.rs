use super::models::Config;
use crate::media::MediaRange;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("negotiation.fallback_media_type '{value}' is not a valid media type")]
    InvalidFallbackMediaType { value: String },

    #[error("negotiation.fallback_media_type '{value}' must be concrete (no wildcards)")]
    WildcardFallbackMediaType { value: String },

    #[error("server.max_body_bytes must be positive")]
    ZeroBodyLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_body_limit(config)?;
    validate_fallback_media_type(config)?;
    Ok(())
}

fn validate_body_limit(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_body_bytes == 0 {
        return Err(ValidationError::ZeroBodyLimit);
    }
    Ok(())
}

/// The wildcard-survivor substitute must itself be a concrete type,
/// otherwise negotiation could loop back to a wildcard.
fn validate_fallback_media_type(config: &Config) -> Result<(), ValidationError> {
    let value = &config.negotiation.fallback_media_type;
    let media = MediaRange::parse(value).map_err(|_| {
        ValidationError::InvalidFallbackMediaType {
            value: value.clone(),
        }
    })?;
    if !media.is_concrete() {
        return Err(ValidationError::WildcardFallbackMediaType {
            value: value.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_malformed_fallback() {
        let mut config = Config::default();
        config.negotiation.fallback_media_type = "not a type".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidFallbackMediaType { .. })
        ));
    }

    #[test]
    fn test_rejects_wildcard_fallback() {
        let mut config = Config::default();
        config.negotiation.fallback_media_type = "text/*".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::WildcardFallbackMediaType { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_body_limit() {
        let mut config = Config::default();
        config.server.max_body_bytes = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroBodyLimit)
        ));
    }
}
