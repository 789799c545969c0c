pub mod agent;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
