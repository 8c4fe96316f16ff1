use serde::{Deserialize, Serialize};

/// Claims carried by the bearer token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(rename = "companyCode", default)]
    pub company_code: Option<String>,
    pub exp: u64,
}

fn default_role() -> String {
    "user".to_string()
}
