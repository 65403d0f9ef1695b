pub mod error;
pub mod execution;
pub mod settings;

#[cfg(test)]
mod tests;
