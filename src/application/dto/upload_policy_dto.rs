use thiserror::Error;

use crate::domain::config::upload_policy::{
    AcceptedType, PolicyError, UploadPolicy, DEFAULT_MAX_BYTES, KIB, MIB,
};

pub const MAX_FILE_SIZE_VAR: &str = "UPLOAD_MAX_FILE_SIZE";
pub const ACCEPTED_TYPES_VAR: &str = "UPLOAD_ACCEPTED_TYPES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyConfigError {
    #[error("Invalid UPLOAD_MAX_FILE_SIZE value '{0}' (expected bytes or a size such as '5mb')")]
    InvalidSize(String),

    #[error("Invalid UPLOAD_ACCEPTED_TYPES entry '{0}' (expected 'mime/type=extension')")]
    InvalidAcceptedType(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Partial policy as read from configuration. Missing fields fall back to the
/// built-in logo policy.
#[derive(Debug, Default)]
pub struct UploadPolicyDTO {
    pub accepted_types: Option<Vec<AcceptedType>>,
    pub max_bytes: Option<u64>,
}

impl UploadPolicyDTO {
    pub fn from_env() -> Result<Self, PolicyConfigError> {
        let max_size = std::env::var(MAX_FILE_SIZE_VAR).ok();
        let accepted_types = std::env::var(ACCEPTED_TYPES_VAR).ok();
        Self::from_vars(max_size.as_deref(), accepted_types.as_deref())
    }

    pub fn from_vars(
        max_size: Option<&str>,
        accepted_types: Option<&str>,
    ) -> Result<Self, PolicyConfigError> {
        let max_bytes = match max_size.filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(
                parse_byte_size(raw).ok_or_else(|| PolicyConfigError::InvalidSize(raw.to_string()))?,
            ),
            None => None,
        };

        let accepted_types = match accepted_types.filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_accepted_types(raw)?),
            None => None,
        };

        Ok(Self {
            accepted_types,
            max_bytes,
        })
    }

    pub fn sanitize(&mut self) {
        if let Some(ref mut accepted_types) = self.accepted_types {
            accepted_types.retain(|a| !a.mime_type.trim().is_empty());
            for accepted in accepted_types.iter_mut() {
                accepted.mime_type = accepted.mime_type.trim().to_string();
                accepted.extension = accepted
                    .extension
                    .trim()
                    .trim_start_matches('.')
                    .to_ascii_lowercase();
            }
            if accepted_types.is_empty() {
                self.accepted_types = None;
            }
        }
    }
}

impl TryFrom<UploadPolicyDTO> for UploadPolicy {
    type Error = PolicyError;

    fn try_from(value: UploadPolicyDTO) -> Result<Self, Self::Error> {
        let mut value = value;
        value.sanitize();

        let defaults = UploadPolicy::default();
        UploadPolicy::new(
            value
                .accepted_types
                .unwrap_or_else(|| defaults.accepted_types().to_vec()),
            value.max_bytes.unwrap_or(DEFAULT_MAX_BYTES),
        )
    }
}

impl From<&UploadPolicy> for UploadPolicyDTO {
    fn from(value: &UploadPolicy) -> Self {
        UploadPolicyDTO {
            accepted_types: Some(value.accepted_types().to_vec()),
            max_bytes: Some(value.max_bytes()),
        }
    }
}

/// Parses `5242880`, `5mb`, `5 MB`, `2.5mib`, `512kb` or `300b` into bytes.
pub fn parse_byte_size(raw: &str) -> Option<u64> {
    let normalized = raw.trim().to_ascii_lowercase().replace(' ', "");

    let (number, multiplier) = if let Some(n) = normalized.strip_suffix("mib") {
        (n, MIB)
    } else if let Some(n) = normalized.strip_suffix("mb") {
        (n, MIB)
    } else if let Some(n) = normalized.strip_suffix("kib") {
        (n, KIB)
    } else if let Some(n) = normalized.strip_suffix("kb") {
        (n, KIB)
    } else if let Some(n) = normalized.strip_suffix('b') {
        (n, 1)
    } else {
        (normalized.as_str(), 1)
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let bytes = (value * multiplier as f64).round();
    if bytes < 1.0 || bytes > u64::MAX as f64 {
        return None;
    }
    Some(bytes as u64)
}

fn parse_accepted_types(raw: &str) -> Result<Vec<AcceptedType>, PolicyConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(mime_type, extension)| AcceptedType::new(mime_type.trim(), extension.trim()))
                .ok_or_else(|| PolicyConfigError::InvalidAcceptedType(entry.to_string()))
        })
        .collect()
}
