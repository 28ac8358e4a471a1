//! Resolve OpenStreetMap `maxspeed` values and classify them against a threshold

/// Regional `maxspeed` codes and their implicit limit in km/h
static SPEED_CODES: &[(&str, u32)] = &[
    ("FR:urban", 50),
    ("FR:rural", 80),
    ("FR:trunk", 110),
    ("FR:motorway", 130),
];

/// Convert a raw `maxspeed` tag value into km/h, None when the speed is unknown.
///
/// Regional codes come from a fixed table, anything else uses the leading integer of the value.
/// Units are not converted, "50 mph" resolves to 50.
pub fn resolve_speed(raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    if let Some((_, kmh)) = SPEED_CODES.iter().find(|(code, _)| *code == raw) {
        return Some(*kmh);
    }
    raw.split_whitespace().next()?.parse().ok()
}

/// Speed of the segment joining two points, the larger of the known values
pub fn segment_speed(start: Option<u32>, end: Option<u32>) -> Option<u32> {
    match (start, end) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// How a speed compares to the user supplied threshold
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpeedCategory {
    AtOrAbove,
    Below,
    Unknown,
}

impl SpeedCategory {
    /// Every category in the order they are drawn and listed
    pub const ALL: [SpeedCategory; 3] = [
        SpeedCategory::AtOrAbove,
        SpeedCategory::Below,
        SpeedCategory::Unknown,
    ];

    pub fn classify(speed: Option<u32>, threshold: u32) -> Self {
        match speed {
            Some(kmh) if kmh >= threshold => SpeedCategory::AtOrAbove,
            Some(_) => SpeedCategory::Below,
            None => SpeedCategory::Unknown,
        }
    }

    /// Color used for markers, lines and the legend
    pub fn color(&self) -> &'static str {
        match self {
            SpeedCategory::AtOrAbove => "red",
            SpeedCategory::Below => "blue",
            SpeedCategory::Unknown => "gray",
        }
    }

    /// Name of the map layer holding the segments of this category
    pub fn layer_name(&self, threshold: u32) -> String {
        match self {
            SpeedCategory::AtOrAbove => format!("Speed ≥ {} km/h", threshold),
            SpeedCategory::Below => format!("Speed < {} km/h", threshold),
            SpeedCategory::Unknown => "Unknown speed".to_string(),
        }
    }
}

/// Human readable speed for popups and console output
pub fn speed_label(speed: Option<u32>) -> String {
    match speed {
        Some(kmh) => format!("{} km/h", kmh),
        None => "Unknown".to_string(),
    }
}
