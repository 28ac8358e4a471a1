//! Access OpenStreetMap tag data for locations along a route using an external source
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::gps::{BoundingBox, Location};
use crate::Error;
mod overpass;
pub use overpass::{Overpass, OverpassConfig};

/// Name shown for stations without a `name` tag
pub const DEFAULT_STATION_NAME: &str = "Station-service";

/// A fuel station selling at least one of the unleaded grades we look for
#[derive(Clone, Debug, PartialEq)]
pub struct FuelStation {
    location: Location,
    name: String,
    has_sp95: bool,
    has_sp98: bool,
}

impl FuelStation {
    pub fn new(location: Location, name: String, has_sp95: bool, has_sp98: bool) -> Self {
        FuelStation {
            location,
            name,
            has_sp95,
            has_sp98,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the station is tagged as selling SP95 (95 octane unleaded)
    pub fn has_sp95(&self) -> bool {
        self.has_sp95
    }

    /// True when the station is tagged as selling SP98 (98 octane unleaded)
    pub fn has_sp98(&self) -> bool {
        self.has_sp98
    }
}

/// trait that defines how to find the posted speed limit close to a location
pub trait SpeedLimitSource {
    /// Return the raw `maxspeed` tag of a road near the location, None if no road has one
    fn max_speed_near(&self, location: &Location) -> Result<Option<String>, Error>;
}

/// trait that defines how to find fuel stations covering a route
pub trait FuelStationSource {
    /// Return every station inside the bounding box selling SP95 or SP98
    fn fuel_stations_within(&self, bbox: &BoundingBox) -> Result<Vec<FuelStation>, Error>;
}

/// A single data source answering both kinds of queries
pub trait GeodataService: SpeedLimitSource + FuelStationSource {}

impl<T: SpeedLimitSource + FuelStationSource> GeodataService for T {}

pub fn new_geodata_handler(config: &ServiceConfig) -> Result<Box<dyn GeodataService>, Error> {
    match config.handler() {
        "overpass" => {
            let overpass = Overpass::new(OverpassConfig::from_config(config)?)?;
            Ok(Box::new(overpass))
        }
        _ => Err(Error::UnknownServiceHandler(format!(
            "no geodata handler exists for: {}",
            config.handler()
        ))),
    }
}
