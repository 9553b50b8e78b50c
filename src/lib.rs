pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{CliConfig, ServiceCommand, ServiceConfig};
pub use crate::core::{
    aggregation::AggregationService, conversion::celsius_to_kelvin, gateway::GatewayService,
};
pub use domain::model::{ErrorEnvelope, PostalCodeQuery, WeatherResult};
pub use utils::error::{LookupError, PipelineError, Result};
