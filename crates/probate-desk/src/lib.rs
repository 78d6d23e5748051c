pub mod config;
pub mod error;
pub mod integrations;
mod lenient;
pub mod telemetry;
pub mod workflows;
