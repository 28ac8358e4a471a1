//! Collect speed limits along a route and gather everything the map needs
use crate::gps::{load_gpx_points, BoundingBox, Location};
use crate::sampling::sample_points;
use crate::services::{FuelStation, FuelStationSource, SpeedLimitSource};
use crate::speed::{resolve_speed, speed_label};
use crate::Error;
use crossterm::style::Stylize;
use log::{debug, info, warn};
use std::path::Path;

/// Raw `maxspeed` value found near a sampled point
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedObservation {
    location: Location,
    raw_speed: Option<String>,
}

impl SpeedObservation {
    pub fn new(location: Location, raw_speed: Option<String>) -> Self {
        SpeedObservation {
            location,
            raw_speed,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Tag value as returned by the data source, None if nothing was found
    pub fn raw_speed(&self) -> Option<&str> {
        self.raw_speed.as_deref()
    }

    /// Speed limit in km/h, None when unknown
    pub fn speed(&self) -> Option<u32> {
        resolve_speed(self.raw_speed())
    }
}

/// Options controlling how a route is sampled and classified
#[derive(Clone, Copy, Debug)]
pub struct AnalysisOptions {
    /// maximum number of points queried for a speed limit, at least 2
    pub max_points: usize,
    /// speed in km/h at and above which a point or segment is highlighted
    pub threshold: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            max_points: 400,
            threshold: 110,
        }
    }
}

/// Everything gathered about a route, ready to be drawn
#[derive(Clone, Debug)]
pub struct RouteAnalysis {
    total_points: usize,
    observations: Vec<SpeedObservation>,
    stations: Vec<FuelStation>,
}

impl RouteAnalysis {
    pub fn new(
        total_points: usize,
        observations: Vec<SpeedObservation>,
        stations: Vec<FuelStation>,
    ) -> Self {
        RouteAnalysis {
            total_points,
            observations,
            stations,
        }
    }

    /// Number of points in the GPX file before sampling
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// One observation per sampled point, in route order
    pub fn observations(&self) -> &[SpeedObservation] {
        &self.observations
    }

    pub fn track(&self) -> Vec<Location> {
        self.observations.iter().map(|o| o.location()).collect()
    }

    pub fn stations(&self) -> &[FuelStation] {
        &self.stations
    }
}

/// Look up the speed limit near a location, request failures are logged and treated as unknown
pub fn lookup_max_speed<S>(source: &S, location: &Location) -> Option<String>
where
    S: SpeedLimitSource + ?Sized,
{
    match source.max_speed_near(location) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Speed limit lookup failed at ({:.5}, {:.5}): {}",
                location.latitude(),
                location.longitude(),
                e
            );
            None
        }
    }
}

/// Query the speed limit of every point one request at a time, calling `pause` after each one
/// so the caller controls the request rate.
pub fn collect_speed_data<S, F>(
    source: &S,
    points: &[Location],
    threshold: u32,
    mut pause: F,
) -> Vec<SpeedObservation>
where
    S: SpeedLimitSource + ?Sized,
    F: FnMut(),
{
    let mut observations = Vec::with_capacity(points.len());
    for (idx, location) in points.iter().enumerate() {
        let observation = SpeedObservation::new(*location, lookup_max_speed(source, location));
        debug!(
            "maxspeed at point {}: {:?}",
            idx + 1,
            observation.raw_speed()
        );
        println!(
            "{}",
            progress_line(idx + 1, points.len(), &observation, threshold)
        );
        observations.push(observation);
        pause();
    }

    observations
}

fn progress_line(
    position: usize,
    total: usize,
    observation: &SpeedObservation,
    threshold: u32,
) -> String {
    let location = observation.location();
    let prefix = format!(
        "[{}/{}] ({:.5}, {:.5}) →",
        position,
        total,
        location.latitude(),
        location.longitude()
    );
    match (observation.speed(), observation.raw_speed()) {
        (Some(kmh), _) if kmh >= threshold => {
            format!("{} {} ⚠️", prefix, speed_label(Some(kmh)))
                .red()
                .to_string()
        }
        (Some(kmh), _) => format!("{} {}", prefix, speed_label(Some(kmh))),
        (None, Some(raw)) => format!("{} Unknown speed (maxspeed={})", prefix, raw),
        (None, None) => format!("{} Unknown speed", prefix),
    }
}

/// Load, sample and annotate a GPX route.
///
/// The track is loaded and validated before any request is made. Fuel stations are only
/// searched for when a source is given, a failure of that query aborts the analysis.
pub fn analyze_route<P, S, F, D>(
    path: P,
    options: AnalysisOptions,
    speed_source: &S,
    fuel_source: Option<&F>,
    pause: D,
) -> Result<RouteAnalysis, Error>
where
    P: AsRef<Path>,
    S: SpeedLimitSource + ?Sized,
    F: FuelStationSource + ?Sized,
    D: FnMut(),
{
    if options.max_points < 2 {
        return Err(Error::InvalidArgument(format!(
            "at least 2 points must be sampled, got {}",
            options.max_points
        )));
    }

    let points = load_gpx_points(&path)?;
    println!("Total GPS points: {}", points.len());
    let track = sample_points(&points, options.max_points);
    println!("Sampled {} points", track.len());

    info!("Querying speed limits for {} points...", track.len());
    let observations = collect_speed_data(speed_source, &track, options.threshold, pause);

    let stations = match fuel_source {
        Some(source) => {
            let bbox = BoundingBox::from_locations(&track).ok_or_else(|| {
                Error::EmptyTrackError(path.as_ref().display().to_string())
            })?;
            info!("Searching for fuel stations within {:?}", bbox);
            let stations = source.fuel_stations_within(&bbox)?;
            info!("Found {} fuel stations", stations.len());
            stations
        }
        None => Vec::new(),
    };

    Ok(RouteAnalysis::new(points.len(), observations, stations))
}
