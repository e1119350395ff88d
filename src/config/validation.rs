use super::models::{Config, MappingOverride};
use crate::mapping::ServiceType;
use reqwest::Url;
use thiserror::Error;

/// Output keys the transformer populates itself
const RESERVED_FIELDS: &[&str] = &["name", "index"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("source.url is required")]
    MissingUrl,

    #[error("source.url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("source.tag must not be empty")]
    EmptyTag,

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("request.proxy '{proxy}' is not a valid URL")]
    InvalidProxy { proxy: String },

    #[error("A basic auth password is set but request.user is missing")]
    PasswordWithoutUser,

    #[error("output.error_category must not be empty when output.emit_errors is on")]
    EmptyErrorCategory,

    #[error("Mapping key '{code}' is not a Monit service type code (0-8)")]
    UnknownServiceType { code: String },

    #[error("Mapping '{code}' has an empty index")]
    EmptyMappingIndex { code: String },

    #[error("Mapping '{code}' defines no fields")]
    EmptyMappingFields { code: String },

    #[error("Mapping '{code}' uses reserved output field '{field}'")]
    ReservedMappingField { code: String, field: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_source(config)?;
    validate_request(config)?;
    validate_output(config)?;
    validate_mappings(config)?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<(), ValidationError> {
    let source = &config.source;

    if source.url.trim().is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    let url = Url::parse(&source.url).map_err(|e| ValidationError::InvalidUrl {
        url: source.url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl {
            url: source.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if source.tag.trim().is_empty() {
        return Err(ValidationError::EmptyTag);
    }

    if source.interval.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "source.interval",
        });
    }

    Ok(())
}

fn validate_request(config: &Config) -> Result<(), ValidationError> {
    let request = &config.request;

    if request.timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "request.timeout",
        });
    }

    if let Some(proxy) = &request.proxy {
        if Url::parse(proxy).is_err() {
            return Err(ValidationError::InvalidProxy {
                proxy: proxy.clone(),
            });
        }
    }

    if request.password.is_some() && request.user.is_none() {
        return Err(ValidationError::PasswordWithoutUser);
    }

    if !request.verify_ssl && (request.ca_path.is_some() || request.ca_file.is_some()) {
        tracing::warn!("ca_path/ca_file are ignored because verify_ssl is off");
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ValidationError> {
    if config.output.emit_errors && config.output.error_category.trim().is_empty() {
        return Err(ValidationError::EmptyErrorCategory);
    }
    Ok(())
}

fn validate_mappings(config: &Config) -> Result<(), ValidationError> {
    for (code, mapping) in &config.mappings {
        validate_mapping(code, mapping)?;
    }
    Ok(())
}

fn validate_mapping(code: &str, mapping: &MappingOverride) -> Result<(), ValidationError> {
    if ServiceType::from_code(code).is_none() {
        return Err(ValidationError::UnknownServiceType {
            code: code.to_string(),
        });
    }

    if mapping.index.trim().is_empty() {
        return Err(ValidationError::EmptyMappingIndex {
            code: code.to_string(),
        });
    }

    if mapping.fields.is_empty() {
        return Err(ValidationError::EmptyMappingFields {
            code: code.to_string(),
        });
    }

    if let Some(field) = mapping
        .fields
        .keys()
        .find(|field| RESERVED_FIELDS.contains(&field.as_str()))
    {
        return Err(ValidationError::ReservedMappingField {
            code: code.to_string(),
            field: field.clone(),
        });
    }

    Ok(())
}
