pub mod target;
pub mod window;
