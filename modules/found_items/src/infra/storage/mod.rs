pub mod fields;
pub mod mapper;
pub mod migrations;
pub mod sqlx_repo;
