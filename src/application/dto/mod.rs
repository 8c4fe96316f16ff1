pub mod upload_policy_dto;
