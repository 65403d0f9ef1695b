pub mod auth;
pub mod error;
pub mod file;
pub mod search;
pub mod sheets;
pub mod sink;
pub mod sql;
