pub mod file_dto;
pub mod health_dto;
