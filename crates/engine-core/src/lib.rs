pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod metrics;
pub mod planner;
pub mod report;
pub mod watermark;

mod bounded;
