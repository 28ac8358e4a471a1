//! Render a self-contained HTML page drawing the route with the Leaflet javascript library
use super::MapRenderingService;
use crate::analysis::{RouteAnalysis, SpeedObservation};
use crate::services::FuelStation;
use crate::speed::{segment_speed, speed_label, SpeedCategory};
use crate::Error;
use log::debug;
use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;
use speed_map_derive::FromServiceConfig;
use std::collections::BTreeMap;

static PAGE_TMPL: &str = include_str!("./leaflet.html.jinja");
static STATION_POPUP_TMPL: &str = "{{ name }}<br>{{ sp98 }} SP98<br>{{ sp95 }} SP95";

#[derive(Debug, Serialize)]
struct MapMarker {
    lat: f64,
    lon: f64,
    color: &'static str,
    radius: u32,
    popup: String,
}

#[derive(Debug, Serialize)]
struct MapSegment {
    path: [[f64; 2]; 2],
    color: &'static str,
    popup: String,
}

#[derive(Debug, Serialize)]
struct SegmentLayer {
    name: String,
    segments: Vec<MapSegment>,
}

#[derive(Debug, Serialize)]
struct LegendRow {
    color: &'static str,
    label: String,
}

/// Data handed to the page script
#[derive(Debug, Serialize)]
struct MapData<'a> {
    center: [f64; 2],
    zoom: u32,
    tile_url: &'a str,
    attribution: &'a str,
    line_weight: u32,
    stations: Vec<MapMarker>,
    points: Vec<MapMarker>,
    layers: Vec<SegmentLayer>,
}

/// Defines the page layout and the tile server used to draw the map
#[derive(Debug, FromServiceConfig)]
pub struct LeafletMap {
    title: String,
    /// base url of the leaflet distribution, must contain leaflet.js and leaflet.css
    leaflet_url: String,
    tile_url: String,
    attribution: String,
    zoom_start: u32,
    line_weight: u32,
    point_radius: u32,
    station_radius: u32,
}

impl LeafletMap {
    fn templates() -> Result<Environment<'static>, Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template("page.html", PAGE_TMPL)?;
        env.add_template("station_popup.html", STATION_POPUP_TMPL)?;
        Ok(env)
    }

    fn map_data(
        &self,
        env: &Environment<'_>,
        analysis: &RouteAnalysis,
        threshold: u32,
    ) -> Result<MapData<'_>, Error> {
        let start = analysis
            .observations()
            .first()
            .ok_or_else(|| Error::Other("cannot draw a map without any points".to_string()))?
            .location();
        Ok(MapData {
            center: [start.latitude(), start.longitude()],
            zoom: self.zoom_start,
            tile_url: &self.tile_url,
            attribution: &self.attribution,
            line_weight: self.line_weight,
            stations: analysis
                .stations()
                .iter()
                .map(|s| station_marker(env, s, self.station_radius))
                .collect::<Result<_, _>>()?,
            points: analysis
                .observations()
                .iter()
                .map(|o| point_marker(o, threshold, self.point_radius))
                .collect(),
            layers: segment_layers(analysis.observations(), threshold),
        })
    }
}

impl Default for LeafletMap {
    fn default() -> Self {
        LeafletMap {
            title: "Speed map".to_string(),
            leaflet_url: "https://unpkg.com/leaflet@1.9.4/dist".to_string(),
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            zoom_start: 11,
            line_weight: 4,
            point_radius: 5,
            station_radius: 8,
        }
    }
}

impl MapRenderingService for LeafletMap {
    fn render(&self, analysis: &RouteAnalysis, threshold: u32) -> Result<String, Error> {
        let env = Self::templates()?;
        let data = self.map_data(&env, analysis, threshold)?;
        debug!(
            "Drawing {} points, {} fuel stations and {} segments",
            data.points.len(),
            data.stations.len(),
            data.layers.iter().map(|l| l.segments.len()).sum::<usize>()
        );
        // inserted unescaped, keep "</script>" in popups from closing the script block early
        let map_data = serde_json::to_string(&data)?.replace("</", "<\\/");

        let page = env.get_template("page.html")?.render(context! {
            title => &self.title,
            leaflet_url => &self.leaflet_url,
            legend => legend(threshold),
            map_data => map_data,
        })?;
        Ok(page)
    }

    fn extension(&self) -> &str {
        "html"
    }
}

fn legend(threshold: u32) -> Vec<LegendRow> {
    SpeedCategory::ALL
        .iter()
        .map(|c| LegendRow {
            color: c.color(),
            label: match c {
                SpeedCategory::AtOrAbove => format!("≥ {} km/h", threshold),
                SpeedCategory::Below => format!("< {} km/h", threshold),
                SpeedCategory::Unknown => "Unknown".to_string(),
            },
        })
        .collect()
}

/// Stations selling both grades stand out from the ones selling a single grade
fn station_color(station: &FuelStation) -> &'static str {
    if station.has_sp95() && station.has_sp98() {
        "green"
    } else {
        "orange"
    }
}

fn station_marker(
    env: &Environment<'_>,
    station: &FuelStation,
    radius: u32,
) -> Result<MapMarker, Error> {
    let mark = |available: bool| if available { "✅" } else { "❌" };
    let popup = env.get_template("station_popup.html")?.render(context! {
        name => station.name(),
        sp98 => mark(station.has_sp98()),
        sp95 => mark(station.has_sp95()),
    })?;
    Ok(MapMarker {
        lat: station.location().latitude(),
        lon: station.location().longitude(),
        color: station_color(station),
        radius,
        popup,
    })
}

fn point_marker(observation: &SpeedObservation, threshold: u32, radius: u32) -> MapMarker {
    let speed = observation.speed();
    MapMarker {
        lat: observation.location().latitude(),
        lon: observation.location().longitude(),
        color: SpeedCategory::classify(speed, threshold).color(),
        radius,
        popup: format!("Maxspeed: {}", speed_label(speed)),
    }
}

/// Split the lines joining consecutive points into one layer per speed category
fn segment_layers(observations: &[SpeedObservation], threshold: u32) -> Vec<SegmentLayer> {
    let mut grouped: BTreeMap<SpeedCategory, Vec<MapSegment>> = BTreeMap::new();
    for pair in observations.windows(2) {
        let (start, end) = (pair[0].location(), pair[1].location());
        let speed = segment_speed(pair[0].speed(), pair[1].speed());
        let category = SpeedCategory::classify(speed, threshold);
        let popup = match speed {
            Some(_) => format!("Maxspeed: {}", speed_label(speed)),
            None => "Maxspeed: Unknown speed".to_string(),
        };
        grouped.entry(category).or_default().push(MapSegment {
            path: [
                [start.latitude(), start.longitude()],
                [end.latitude(), end.longitude()],
            ],
            color: category.color(),
            popup,
        });
    }

    SpeedCategory::ALL
        .iter()
        .map(|c| SegmentLayer {
            name: c.layer_name(threshold),
            segments: grouped.remove(c).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::Location;

    fn observation(lat: f64, raw: Option<&str>) -> SpeedObservation {
        SpeedObservation::new(Location::new(lat, 4.0), raw.map(|r| r.to_string()))
    }

    fn sample_analysis() -> RouteAnalysis {
        RouteAnalysis::new(
            10,
            vec![
                observation(45.0, Some("130")),
                observation(45.1, Some("90")),
                observation(45.2, None),
                observation(45.3, None),
                observation(45.4, Some("FR:rural")),
            ],
            vec![
                FuelStation::new(Location::new(45.05, 4.1), "Total".to_string(), true, true),
                FuelStation::new(Location::new(45.15, 4.1), "<b>Shell</b>".to_string(), true, false),
            ],
        )
    }

    #[test]
    fn station_colors() {
        let loc = Location::new(0.0, 0.0);
        let both = FuelStation::new(loc, "a".to_string(), true, true);
        let sp95 = FuelStation::new(loc, "b".to_string(), true, false);
        let sp98 = FuelStation::new(loc, "c".to_string(), false, true);
        let neither = FuelStation::new(loc, "d".to_string(), false, false);
        assert_eq!(station_color(&both), "green");
        assert_eq!(station_color(&sp95), "orange");
        assert_eq!(station_color(&sp98), "orange");
        assert_eq!(station_color(&neither), "orange");
    }

    #[test]
    fn station_popup_lists_grades() {
        let env = LeafletMap::templates().unwrap();
        let station =
            FuelStation::new(Location::new(0.0, 0.0), "A & B".to_string(), false, true);
        assert_eq!(
            station_marker(&env, &station, 8).unwrap().popup,
            "A &amp; B<br>✅ SP98<br>❌ SP95"
        );
    }

    #[test]
    fn point_markers_follow_threshold() {
        let markers: Vec<(&str, String)> = sample_analysis()
            .observations()
            .iter()
            .map(|o| point_marker(o, 110, 5))
            .map(|m| (m.color, m.popup))
            .collect();
        assert_eq!(
            markers,
            vec![
                ("red", "Maxspeed: 130 km/h".to_string()),
                ("blue", "Maxspeed: 90 km/h".to_string()),
                ("gray", "Maxspeed: Unknown".to_string()),
                ("gray", "Maxspeed: Unknown".to_string()),
                ("blue", "Maxspeed: 80 km/h".to_string()),
            ]
        );
    }

    #[test]
    fn segments_grouped_by_larger_endpoint_speed() {
        let layers = segment_layers(sample_analysis().observations(), 110);
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Speed ≥ 110 km/h", "Speed < 110 km/h", "Unknown speed"]
        );
        // (130, 90) -> 130
        assert_eq!(layers[0].segments.len(), 1);
        assert_eq!(layers[0].segments[0].path, [[45.0, 4.0], [45.1, 4.0]]);
        assert_eq!(layers[0].segments[0].color, "red");
        // (90, unknown) -> 90 and (unknown, 80) -> 80
        assert_eq!(layers[1].segments.len(), 2);
        assert_eq!(layers[1].segments[0].popup, "Maxspeed: 90 km/h");
        assert_eq!(layers[1].segments[1].popup, "Maxspeed: 80 km/h");
        assert!(layers[1].segments.iter().all(|s| s.color == "blue"));
        // (unknown, unknown)
        assert_eq!(layers[2].segments.len(), 1);
        assert_eq!(layers[2].segments[0].color, "gray");
        assert_eq!(layers[2].segments[0].popup, "Maxspeed: Unknown speed");
    }

    #[test]
    fn single_point_has_empty_layers() {
        let layers = segment_layers(&[observation(45.0, Some("50"))], 110);
        assert_eq!(layers.len(), 3);
        assert!(layers.iter().all(|l| l.segments.is_empty()));
    }

    #[test]
    fn render_page() {
        let html = LeafletMap::default()
            .render(&sample_analysis(), 90)
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<b>Speed Legend</b>"));
        assert!(html.contains("■</span> ≥ 90 km/h"));
        assert!(html.contains("■</span> &lt; 90 km/h"));
        assert!(html.contains("\"center\":[45.0,4.0]"));
        assert!(html.contains("\"zoom\":11"));
        assert!(html.contains("\"name\":\"Speed ≥ 90 km/h\""));
        assert!(html.contains("\"name\":\"Speed < 90 km/h\""));
        assert!(html.contains("\"name\":\"Unknown speed\""));
        assert!(html.contains("L.control.layers(null, overlays, { collapsed: false })"));
        // station names are escaped and cannot close the script block
        assert!(html.contains("&lt;b&gt;Shell&lt;"));
        assert!(!html.contains("<b>Shell"));
    }

    #[test]
    fn page_settings_are_escaped() {
        let map = LeafletMap {
            title: "Lyon <-> Grenoble".to_string(),
            leaflet_url: "https://cdn.example.com/leaflet\"><script>alert(1)</script>"
                .to_string(),
            ..Default::default()
        };
        let html = map.render(&sample_analysis(), 110).unwrap();
        assert!(html.contains("<title>Lyon &lt;-&gt; Grenoble</title>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;alert(1)"));
        assert!(!html.contains("\"><script>alert"));
    }

    #[test]
    fn legend_lists_every_category() {
        let rows = legend(130);
        let labels: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.color, r.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("red", "≥ 130 km/h"),
                ("blue", "< 130 km/h"),
                ("gray", "Unknown")
            ]
        );
    }

    #[test]
    fn render_requires_points() {
        let empty = RouteAnalysis::new(0, Vec::new(), Vec::new());
        assert!(LeafletMap::default().render(&empty, 110).is_err());
    }
}
