//! Module with GPS specific structures and the GPX track loader
use crate::Error;
use log::{debug, trace};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Stores a single geospatial point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    /// latitude coordinate in degrees
    latitude: f64,
    /// longitude coordinate in degrees
    longitude: f64,
}

impl Location {
    /// Create a location from coordinates in degrees
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            latitude,
            longitude,
        }
    }

    /// Return latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Return longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Area covered by a trace, stored in the (south, west, north, east) order Overpass expects
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        BoundingBox {
            south,
            west,
            north,
            east,
        }
    }

    /// Compute the smallest box containing every location, None for an empty trace
    pub fn from_locations(trace: &[Location]) -> Option<Self> {
        let first = trace.first()?;
        let init = BoundingBox::new(
            first.latitude(),
            first.longitude(),
            first.latitude(),
            first.longitude(),
        );
        Some(trace[1..].iter().fold(init, |bbox, loc| BoundingBox {
            south: bbox.south.min(loc.latitude()),
            west: bbox.west.min(loc.longitude()),
            north: bbox.north.max(loc.latitude()),
            east: bbox.east.max(loc.longitude()),
        }))
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }
}

/// Load every track point of a GPX file, in file order across all tracks and segments
pub fn load_gpx_points<P: AsRef<Path>>(path: P) -> Result<Vec<Location>, Error> {
    let path = path.as_ref();
    let display = path.display().to_string();
    trace!("Loading GPX file: {:?}", path);
    let fp = File::open(path).map_err(|e| Error::TrackLoadError(display.clone(), e.to_string()))?;
    let points = read_gpx_points(BufReader::new(fp))
        .map_err(|e| Error::TrackLoadError(display.clone(), e))?;
    if points.is_empty() {
        return Err(Error::EmptyTrackError(display));
    }
    debug!("Loaded {} track points from {:?}", points.len(), path);

    Ok(points)
}

/// Parse GPX data and flatten its tracks into a single trace
fn read_gpx_points<R: Read>(reader: R) -> Result<Vec<Location>, String> {
    let data = gpx::read(reader).map_err(|e| e.to_string())?;
    let points = data
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(|waypoint| {
            let point = waypoint.point();
            Location::new(point.y(), point.x())
        })
        .collect();

    Ok(points)
}
