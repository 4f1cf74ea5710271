pub mod config;
pub mod filename;
pub mod models;
pub mod policy;
