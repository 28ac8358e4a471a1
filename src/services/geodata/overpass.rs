//! Query OpenStreetMap tags near a route using the Overpass API
use super::{FuelStation, FuelStationSource, SpeedLimitSource, DEFAULT_STATION_NAME};
use crate::gps::{BoundingBox, Location};
use crate::Error;
use log::{trace, warn};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use speed_map_derive::FromServiceConfig;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Element {
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl Element {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_str())
    }

    /// Node coordinates, or the computed center for ways returned with `out center`
    fn location(&self) -> Option<Location> {
        match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some(Location::new(lat, lon)),
            (_, _, Some(center)) => Some(Location::new(center.lat, center.lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    elements: Vec<Element>,
    /// set by the server when the query hit a runtime error, the elements may be incomplete
    remark: Option<String>,
}

/// Defines the connection parameters to query an Overpass API interpreter endpoint
#[derive(Clone, Debug, FromServiceConfig)]
pub struct OverpassConfig {
    base_url: String,
    /// radius in meters around each point searched for tagged roads
    search_radius: u32,
    /// seconds, sent to the server as the query timeout and used for the HTTP request
    timeout: u64,
    user_agent: String,
}

impl OverpassConfig {
    fn max_speed_query(&self, location: &Location) -> String {
        format!(
            "[out:json][timeout:{}];\nway(around:{},{},{})[\"highway\"][\"maxspeed\"];\nout tags;",
            self.timeout,
            self.search_radius,
            location.latitude(),
            location.longitude()
        )
    }

    fn fuel_station_query(&self, bbox: &BoundingBox) -> String {
        let area = format!(
            "({},{},{},{})",
            bbox.south(),
            bbox.west(),
            bbox.north(),
            bbox.east()
        );
        format!(
            "[out:json][timeout:{0}];\n(\n  node[\"amenity\"=\"fuel\"][\"fuel:octane_98\"=\"yes\"]{1};\n  node[\"amenity\"=\"fuel\"][\"fuel:octane_95\"=\"yes\"]{1};\n);\nout center;",
            self.timeout, area
        )
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        OverpassConfig {
            base_url: "https://overpass-api.de/api/interpreter".to_string(),
            search_radius: 30,
            timeout: 60,
            user_agent: format!("speed_map/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Overpass API client, a single connection pool is shared by every query
#[derive(Clone, Debug)]
pub struct Overpass {
    config: OverpassConfig,
    client: Client,
}

impl Overpass {
    pub fn new(config: OverpassConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Overpass { config, client })
    }

    fn execute(&self, query: &str) -> Result<Response, Error> {
        trace!("Sending Overpass query: {}", query);
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("data", query)
            .finish();
        let resp = self
            .client
            .post(&self.config.base_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()?;
        if resp.status().is_success() {
            let json: Response = resp.json()?;
            if let Some(remark) = &json.remark {
                warn!("Overpass returned a partial result: {}", remark);
            }
            Ok(json)
        } else {
            // the server explains rate limiting and query errors in the body
            let code = resp.status();
            let message = resp.text()?;
            Err(Error::RequestError(
                code,
                format!("Overpass query failed: {}", message.trim()),
            ))
        }
    }
}

impl SpeedLimitSource for Overpass {
    fn max_speed_near(&self, location: &Location) -> Result<Option<String>, Error> {
        let response = self.execute(&self.config.max_speed_query(location))?;
        Ok(first_max_speed(&response))
    }
}

impl FuelStationSource for Overpass {
    fn fuel_stations_within(&self, bbox: &BoundingBox) -> Result<Vec<FuelStation>, Error> {
        let response = self.execute(&self.config.fuel_station_query(bbox))?;
        Ok(fuel_stations(response))
    }
}

fn first_max_speed(response: &Response) -> Option<String> {
    response
        .elements
        .iter()
        .find_map(|el| el.tag("maxspeed"))
        .map(|v| v.to_string())
}

fn fuel_stations(response: Response) -> Vec<FuelStation> {
    response
        .elements
        .into_iter()
        .filter_map(|el| {
            let location = match el.location() {
                Some(loc) => loc,
                None => {
                    warn!("Skipping fuel station without coordinates: {:?}", el.tags);
                    return None;
                }
            };
            Some(FuelStation::new(
                location,
                el.tag("name").unwrap_or(DEFAULT_STATION_NAME).to_string(),
                el.tag("fuel:octane_95") == Some("yes"),
                el.tag("fuel:octane_98") == Some("yes"),
            ))
        })
        .collect()
}
