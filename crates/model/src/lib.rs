pub mod core;
pub mod error;
pub mod records;
pub mod sync;
