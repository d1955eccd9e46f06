use super::models::Config;
use thiserror::Error;

/// Smallest size at which a version-40 symbol plus quiet zone still gets one pixel per module
const MIN_RENDER_SIZE: u32 = 185;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("style.min_size ({min}) must be at least 185 and not above style.max_size ({max})")]
    InvalidSizeBounds { min: u32, max: u32 },

    #[error("{field} ({value}) must lie within style.min_size..=style.max_size ({min}..={max})")]
    SizeOutOfBounds {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Logo scale must be in (0, 0.5]: {field} = {value}")]
    InvalidLogoScale { field: &'static str, value: f32 },

    #[error("style.default_logo_scale ({default}) exceeds style.max_logo_scale ({max})")]
    DefaultLogoScaleTooLarge { default: f32, max: f32 },

    #[error("Value must be positive: {field}")]
    NotPositive { field: &'static str },

    #[error("server.max_upload_bytes must be positive")]
    InvalidUploadLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_sizes(config)?;
    validate_logo_scales(config)?;
    validate_counts(config)?;
    Ok(())
}

/// Size bounds are ordered and every default size fits inside them
fn validate_sizes(config: &Config) -> Result<(), ValidationError> {
    let style = &config.style;
    if style.min_size < MIN_RENDER_SIZE || style.min_size > style.max_size {
        return Err(ValidationError::InvalidSizeBounds {
            min: style.min_size,
            max: style.max_size,
        });
    }

    let sized = [
        ("style.default_size", style.default_size),
        ("batch.tile_size", config.batch.tile_size),
    ];
    for (field, value) in sized {
        if !(style.min_size..=style.max_size).contains(&value) {
            return Err(ValidationError::SizeOutOfBounds {
                field,
                value,
                min: style.min_size,
                max: style.max_size,
            });
        }
    }

    Ok(())
}

fn validate_logo_scales(config: &Config) -> Result<(), ValidationError> {
    let style = &config.style;
    let scales = [
        ("style.default_logo_scale", style.default_logo_scale),
        ("style.max_logo_scale", style.max_logo_scale),
    ];
    for (field, value) in scales {
        if !(value > 0.0 && value <= 0.5) {
            return Err(ValidationError::InvalidLogoScale { field, value });
        }
    }

    if style.default_logo_scale > style.max_logo_scale {
        return Err(ValidationError::DefaultLogoScaleTooLarge {
            default: style.default_logo_scale,
            max: style.max_logo_scale,
        });
    }

    Ok(())
}

fn validate_counts(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_upload_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidUploadLimit);
    }

    let counts = [
        ("batch.max_rows", config.batch.max_rows as u64),
        ("batch.gallery_columns", config.batch.gallery_columns as u64),
        ("history.capacity", config.history.capacity as u64),
        ("url_check.timeout_secs", config.url_check.timeout_secs),
    ];
    for (field, value) in counts {
        if value == 0 {
            return Err(ValidationError::NotPositive { field });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_inverted_size_bounds() {
        let mut config = Config::default();
        config.style.min_size = 2000;
        config.style.max_size = 1000;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidSizeBounds { .. })));
    }

    #[test]
    fn test_tile_outside_bounds() {
        let mut config = Config::default();
        config.batch.tile_size = 5000;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::SizeOutOfBounds {
                field: "batch.tile_size",
                ..
            })
        ));
    }

    #[test]
    fn test_logo_scale_limits() {
        let mut config = Config::default();
        config.style.max_logo_scale = 0.8;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidLogoScale { .. })
        ));

        let mut config = Config::default();
        config.style.default_logo_scale = 0.3;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::DefaultLogoScaleTooLarge { .. })
        ));
    }

    #[test]
    fn test_zero_values() {
        let mut config = Config::default();
        config.history.capacity = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::NotPositive {
                field: "history.capacity"
            })
        ));

        let mut config = Config::default();
        config.server.max_upload_bytes = ByteSize(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUploadLimit)
        ));
    }
}
