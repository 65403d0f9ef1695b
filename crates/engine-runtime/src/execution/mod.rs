pub mod executor;
pub mod factory;
pub mod lazy_sink;
