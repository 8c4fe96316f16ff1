pub mod health_controller;
pub mod upload_controller;
