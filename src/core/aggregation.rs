use crate::core::conversion::celsius_to_kelvin;
use crate::domain::model::WeatherResult;
use crate::domain::ports::{LocationResolver, WeatherResolver};
use crate::utils::error::{LookupError, PipelineError, Result};
use crate::utils::validation::validate_postal_code;

/// CEP -> 城市 -> 氣溫，依序執行，任何一步失敗就中止
pub struct AggregationService<L: LocationResolver, W: WeatherResolver> {
    locations: L,
    weather: W,
}

impl<L: LocationResolver, W: WeatherResolver> AggregationService<L, W> {
    pub fn new(locations: L, weather: W) -> Self {
        Self { locations, weather }
    }

    #[tracing::instrument(name = "aggregation.resolve", skip(self))]
    pub async fn resolve(&self, code: &str) -> Result<WeatherResult> {
        validate_postal_code(code)?;

        // 查不到與查詢失敗都當成 404，呼叫端看不出差別
        let location = match self.locations.resolve(code).await {
            Ok(location) => location,
            Err(LookupError::NotFound) => {
                tracing::info!("Postal code {} not found", code);
                return Err(PipelineError::LocationNotFound);
            }
            Err(LookupError::Transport { message }) => {
                tracing::warn!("Location lookup for {} failed: {}", code, message);
                return Err(PipelineError::LocationNotFound);
            }
        };

        tracing::debug!("Postal code {} resolved to {}", code, location.name);

        let sample = self
            .weather
            .resolve(&location.name)
            .await
            .map_err(|e| {
                tracing::error!("Weather lookup for {} failed: {}", location.name, e);
                PipelineError::upstream(e.to_string())
            })?;

        Ok(WeatherResult {
            temp_k: celsius_to_kelvin(sample.celsius),
            temp_c: sample.celsius,
            temp_f: sample.fahrenheit,
            city: location.name,
        })
    }
}
