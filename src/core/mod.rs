pub mod aggregation;
pub mod conversion;
pub mod gateway;

pub use crate::domain::model::{
    ErrorEnvelope, LocationRecord, PostalCodeQuery, WeatherResult, WeatherSample,
};
pub use crate::domain::ports::{ConfigProvider, LocationResolver, WeatherLookup, WeatherResolver};
pub use crate::utils::error::Result;
