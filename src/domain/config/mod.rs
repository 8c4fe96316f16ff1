pub mod server;
pub mod upload_policy;
