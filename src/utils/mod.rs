pub mod error;
pub mod logger;
pub mod telemetry;
pub mod validation;
