use std::path::PathBuf;

/// Subdirectory of the upload root that receives company logos. Stored files are
/// served back under `/uploads/company-logos/`.
pub const LOGO_DIRECTORY: &str = "company-logos";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub upload_root: PathBuf,
    pub public_base_url: String,
    pub jwt_secret: Option<String>,
}

impl ServerConfig {
    pub fn logo_directory(&self) -> PathBuf {
        self.upload_root.join(LOGO_DIRECTORY)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_allowed_origins: None,
            upload_root: PathBuf::from("./uploads"),
            public_base_url: String::new(),
            jwt_secret: None,
        }
    }
}
