//! Store application configuration that gets read from disk
use crate::services::{
    new_geodata_handler, new_map_rendering_handler, GeodataService, MapRenderingService,
};
use crate::Error;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use simplelog::LevelFilter;
use std::collections::HashMap;
use std::io::prelude::*;
use std::str::FromStr;
use std::time::Duration;

/// Defines the allowed keys under the services map
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Geodata,
    MapRendering,
}

/// Type alias for clarity
pub type ServiceParameters = HashMap<String, Value>;

/// Configuration options for a single service of any type
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceConfig {
    handler: String,
    #[serde(default)]
    configuration: ServiceParameters,
}

/// Build a service handler from its configuration entry, see `speed_map_derive`
pub trait FromServiceConfig: Sized {
    fn from_config(config: &ServiceConfig) -> Result<Self, Error>;
}

impl ServiceConfig {
    pub fn new(handler: &str) -> Self {
        ServiceConfig {
            handler: handler.to_string(),
            configuration: HashMap::new(),
        }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn parameters(&self) -> impl Iterator<Item = &String> + '_ {
        self.configuration.keys()
    }

    pub fn get_parameter(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    pub fn set_parameter<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.configuration.insert(key.to_string(), value.into());
    }

    pub fn get_parameter_as_string(&self, key: &str) -> Option<Result<String, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_str()
                .map(|v| v.to_string())
                .ok_or_else(|| self.invalid_value(key, "a string", value))
        })
    }

    pub fn get_parameter_as_i64(&self, key: &str) -> Option<Result<i64, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_i64()
                .ok_or_else(|| self.invalid_value(key, "an integer", value))
        })
    }

    pub fn get_parameter_as_f64(&self, key: &str) -> Option<Result<f64, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_f64()
                .ok_or_else(|| self.invalid_value(key, "a floating point value", value))
        })
    }

    fn invalid_value(&self, key: &str, expected: &str, value: &Value) -> Error {
        Error::InvalidConfigurationValue(format!(
            "invalid value for {}.{}, expected {}: {:?}",
            &self.handler, key, expected, value
        ))
    }
}

/// Configuration struct that we can create from the config file used
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(
        deserialize_with = "deserialize_level_filter",
        default = "default_level_filter"
    )]
    log_level: LevelFilter,
    /// Seconds to wait after each speed limit request
    #[serde(default = "default_request_delay")]
    request_delay: f64,
    #[serde(default)]
    services: HashMap<ServiceType, ServiceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_level_filter(),
            request_delay: default_request_delay(),
            services: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load<T: Read>(source: &mut T) -> Result<Self, Error> {
        let config: Config = serde_yaml::from_reader(source)?;
        if !config.request_delay.is_finite() || config.request_delay < 0.0 {
            return Err(Error::InvalidConfigurationValue(format!(
                "invalid value for request_delay, expected a positive number of seconds: {}",
                config.request_delay
            )));
        }
        Ok(config)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis((self.request_delay * 1000.0).round() as u64)
    }

    pub fn get_geodata_handler(&self) -> Result<Box<dyn GeodataService>, Error> {
        match self.services.get(&ServiceType::Geodata) {
            Some(cfg) => new_geodata_handler(cfg),
            // the public overpass instance is the default data source
            None => new_geodata_handler(&ServiceConfig::new("overpass")),
        }
    }

    pub fn get_map_rendering_handler(&self) -> Result<Box<dyn MapRenderingService>, Error> {
        match self.services.get(&ServiceType::MapRendering) {
            Some(cfg) => new_map_rendering_handler(cfg),
            None => new_map_rendering_handler(&ServiceConfig::new("leaflet")),
        }
    }
}

fn deserialize_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    LevelFilter::from_str(&buf)
        .map_err(|_| serde::de::Error::custom(format!("invalid level value: {}", buf)))
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

fn default_request_delay() -> f64 {
    1.2
}

#[cfg(test)]
mod tests {
    use super::*;

    static FULL_CONFIG: &str = "
log_level: debug
request_delay: 0.5
services:
  geodata:
    handler: overpass
    configuration:
      base_url: http://localhost:12345/api/interpreter
      search_radius: 50
  map_rendering:
    handler: leaflet
    configuration:
      zoom_start: 9
";

    #[test]
    fn load_full_config() {
        let config = Config::load(&mut FULL_CONFIG.as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.request_delay(), Duration::from_millis(500));
        assert!(config.get_geodata_handler().is_ok());
        assert!(config.get_map_rendering_handler().is_ok());
    }

    #[test]
    fn empty_mapping_uses_defaults() {
        let config = Config::load(&mut "{}".as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Info);
        assert_eq!(config.request_delay(), Duration::from_millis(1200));
        assert!(config.get_geodata_handler().is_ok());
        assert!(config.get_map_rendering_handler().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::load(&mut "log_level: loud".as_bytes()).is_err());
        assert!(Config::load(&mut "request_delay: -1.0".as_bytes()).is_err());
    }

    #[test]
    fn unknown_handler_is_an_error() {
        let config = Config::load(
            &mut "services:\n  geodata:\n    handler: nominatim\n".as_bytes(),
        )
        .unwrap();
        match config.get_geodata_handler() {
            Err(Error::UnknownServiceHandler(_)) => {}
            _ => panic!("expected an unknown handler error"),
        }
    }

    #[test]
    fn typed_parameter_access() {
        let mut cfg = ServiceConfig::new("overpass");
        cfg.set_parameter("timeout", 30);
        cfg.set_parameter("base_url", "http://localhost");
        assert_eq!(cfg.get_parameter_as_i64("timeout").unwrap().unwrap(), 30);
        assert!(cfg.get_parameter_as_string("timeout").unwrap().is_err());
        assert_eq!(
            cfg.get_parameter_as_string("base_url").unwrap().unwrap(),
            "http://localhost"
        );
        assert!(cfg.get_parameter_as_i64("missing").is_none());
    }
}
