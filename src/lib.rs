//! Map the posted speed limits along a GPX route using OpenStreetMap data.
//!
//! The route is sampled, the `maxspeed` tag of the road near each sampled point is requested
//! from a geodata service one point at a time and the result is drawn as an interactive map
//! with the segments at or above a speed threshold highlighted, along with nearby fuel stations.
use std::path::PathBuf;

pub mod analysis;
pub mod cli;
pub mod config;
mod error;
pub mod gps;
pub mod sampling;
pub mod services;
pub mod speed;

pub use analysis::{analyze_route, AnalysisOptions, RouteAnalysis, SpeedObservation};
pub use error::Error;
pub use gps::{load_gpx_points, BoundingBox, Location};

static CONFIG_DIR_NAME: &str = "speed-map";
static CONFIG_FILE_NAME: &str = "config.yml";

/// Location of the configuration file read when none is given on the command line
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}
