use thiserror::Error;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const DEFAULT_MAX_BYTES: u64 = 5 * MIB;

const DEFAULT_ACCEPTED_TYPES: [(&str, &str); 5] = [
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedType {
    pub mime_type: String,
    pub extension: String,
}

impl AcceptedType {
    pub fn new(mime_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            extension: extension.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Malformed MIME type: '{0}'")]
    MalformedMimeType(String),

    #[error("MIME type listed more than once: '{0}'")]
    DuplicateMimeType(String),

    #[error("Invalid extension '{extension}' for MIME type '{mime_type}'")]
    InvalidExtension {
        mime_type: String,
        extension: String,
    },

    #[error("Upload policy must accept at least one MIME type")]
    NoAcceptedTypes,

    #[error("Maximum upload size must be greater than zero")]
    ZeroSizeLimit,
}

/// Which uploads are accepted and how large they may be.
///
/// The accepted-type table is ordered: messages list types in the order they were
/// configured. Keys are stored as lowercase MIME essences (`type/subtype`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    accepted_types: Vec<AcceptedType>,
    max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(accepted_types: Vec<AcceptedType>, max_bytes: u64) -> Result<Self, PolicyError> {
        if accepted_types.is_empty() {
            return Err(PolicyError::NoAcceptedTypes);
        }
        if max_bytes == 0 {
            return Err(PolicyError::ZeroSizeLimit);
        }

        let mut normalized: Vec<AcceptedType> = Vec::with_capacity(accepted_types.len());
        for accepted in accepted_types {
            let mime_type = parse_essence(&accepted.mime_type)
                .ok_or_else(|| PolicyError::MalformedMimeType(accepted.mime_type.clone()))?;

            let extension = accepted.extension.trim();
            let extension_ok = !extension.is_empty()
                && extension
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !extension_ok {
                return Err(PolicyError::InvalidExtension {
                    mime_type,
                    extension: accepted.extension,
                });
            }

            if normalized.iter().any(|a| a.mime_type == mime_type) {
                return Err(PolicyError::DuplicateMimeType(mime_type));
            }

            normalized.push(AcceptedType::new(mime_type, extension));
        }

        Ok(Self {
            accepted_types: normalized,
            max_bytes,
        })
    }

    pub fn accepted_types(&self) -> &[AcceptedType] {
        &self.accepted_types
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Extension mapped from a declared content type. Parameters such as `; charset=`
    /// are ignored and the comparison is case-insensitive.
    pub fn extension_for(&self, declared_mime_type: &str) -> Option<&str> {
        let essence = parse_essence(declared_mime_type)?;
        self.accepted_types
            .iter()
            .find(|a| a.mime_type == essence)
            .map(|a| a.extension.as_str())
    }

    pub fn accepted_mime_types(&self) -> Vec<String> {
        self.accepted_types
            .iter()
            .map(|a| a.mime_type.clone())
            .collect()
    }

    /// Extensions in policy order with duplicates removed (`image/jpeg` and `image/jpg`
    /// both map to `jpg`).
    pub fn accepted_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = Vec::new();
        for accepted in &self.accepted_types {
            if !extensions.contains(&accepted.extension) {
                extensions.push(accepted.extension.clone());
            }
        }
        extensions
    }

    pub fn max_size_label(&self) -> String {
        human_size(self.max_bytes)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_types: DEFAULT_ACCEPTED_TYPES
                .iter()
                .map(|(mime_type, extension)| AcceptedType::new(*mime_type, *extension))
                .collect(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

fn parse_essence(raw: &str) -> Option<String> {
    let parsed: mime::Mime = raw.trim().parse().ok()?;
    Some(parsed.essence_str().to_ascii_lowercase())
}

/// Renders a byte count the way limits are shown to clients: `5MB`, `2.5MB`, `512KB`.
pub fn human_size(bytes: u64) -> String {
    if bytes >= MIB {
        format!("{}MB", trim_fraction(bytes as f64 / MIB as f64))
    } else if bytes >= KIB {
        format!("{}KB", trim_fraction(bytes as f64 / KIB as f64))
    } else {
        format!("{} bytes", bytes)
    }
}

fn trim_fraction(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
