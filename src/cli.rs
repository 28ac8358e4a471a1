//! Define the application's command line interface
use crate::analysis::{analyze_route, AnalysisOptions};
use crate::config::Config;
use crate::{default_config_path, Error};
use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use simplelog::LevelFilter;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use structopt::StructOpt;

/// Analyze a GPX file and generate an interactive map showing speed limits
#[derive(Debug, StructOpt)]
#[structopt(name = "speed_map")]
pub struct Cli {
    /// Path to the GPX file
    #[structopt(short, long, parse(from_os_str))]
    file: PathBuf,
    /// Speed threshold in km/h, segments at or above it are highlighted
    #[structopt(short, long, default_value = "110")]
    limit_speed: u32,
    /// Maximum number of GPS points to query, at least 2
    #[structopt(short, long, default_value = "400")]
    max_points: usize,
    /// Name of the file to write the map to, if "-" is used we will write to stdout. Defaults to
    /// speed_map_<timestamp>.html in the current directory
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// Configuration file to use instead of the one in the user config directory
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Do not search for fuel stations along the route
    #[structopt(long)]
    no_fuel_stations: bool,
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    /// Read the config file given on the command line, or the default one if it exists
    pub fn load_config(&self) -> Result<Config, Error> {
        match &self.config {
            Some(path) => Config::load(&mut File::open(path)?),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Config::load(&mut File::open(&path)?)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Consume options struct, build the map and write it out
    pub fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        let geodata = config.get_geodata_handler()?;
        let renderer = config.get_map_rendering_handler()?;
        let delay = config.request_delay();
        debug!("Waiting {:?} between speed limit requests", delay);

        let options = AnalysisOptions {
            max_points: self.max_points,
            threshold: self.limit_speed,
        };
        let fuel_source = if self.no_fuel_stations {
            None
        } else {
            Some(&*geodata)
        };
        let analysis = analyze_route(&self.file, options, &*geodata, fuel_source, || {
            thread::sleep(delay)
        })?;
        info!(
            "Queried speed limits for {} of {} track points",
            analysis.observations().len(),
            analysis.total_points()
        );
        let document = renderer.render(&analysis, self.limit_speed)?;

        let path = self.output.unwrap_or_else(|| {
            default_output_path(&Local::now().naive_local(), renderer.extension())
        });
        if path.to_string_lossy() == "-" {
            debug!("Writing map to STDOUT");
            write_to_stdout(document.as_bytes())?;
        } else {
            write_document(&path, &document)?;
            info!("Wrote {} bytes to {:?}", document.len(), path);
            println!(
                "✅ Map generated: '{}' (open it in your browser)",
                path.display()
            );
        }

        Ok(())
    }
}

/// Timestamped file name so each run keeps the maps of the previous ones
pub fn default_output_path(now: &NaiveDateTime, extension: &str) -> PathBuf {
    PathBuf::from(format!(
        "speed_map_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        extension
    ))
}

/// Write the rendered map to disk, replacing any existing file
pub fn write_document(path: &Path, document: &str) -> Result<(), Error> {
    let mut fp = File::create(path)?;
    fp.write_all(document.as_bytes())?;
    Ok(())
}

fn write_to_stdout(data: &[u8]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn parse_defaults() {
        let cli = Cli::from_iter(&["speed_map", "--file", "route.gpx"]);
        assert_eq!(cli.file, PathBuf::from("route.gpx"));
        assert_eq!(cli.limit_speed, 110);
        assert_eq!(cli.max_points, 400);
        assert!(cli.output.is_none());
        assert!(!cli.no_fuel_stations);
        assert_eq!(cli.verbosity(LevelFilter::Info), LevelFilter::Info);
    }

    #[test]
    fn parse_short_flags() {
        let cli = Cli::from_iter(&[
            "speed_map", "-f", "route.gpx", "-l", "90", "-m", "50", "-o", "out.html", "-vv",
        ]);
        assert_eq!(cli.limit_speed, 90);
        assert_eq!(cli.max_points, 50);
        assert_eq!(cli.output, Some(PathBuf::from("out.html")));
        assert_eq!(cli.verbosity(LevelFilter::Info), LevelFilter::Trace);

        let cli = Cli::from_iter(&["speed_map", "-f", "route.gpx", "-q"]);
        assert_eq!(cli.verbosity(LevelFilter::Info), LevelFilter::Warn);
    }

    #[test]
    fn file_is_required() {
        assert!(Cli::from_iter_safe(&["speed_map"]).is_err());
    }

    #[test]
    fn explicit_config_must_exist() {
        let cli = Cli::from_iter(&["speed_map", "-f", "route.gpx", "-c", "missing/config.yml"]);
        assert!(matches!(cli.load_config(), Err(Error::Io(_))));
    }

    #[test]
    fn output_name_uses_timestamp() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(8, 3, 9)
            .unwrap();
        assert_eq!(
            default_output_path(&now, "html"),
            PathBuf::from("speed_map_20240517_080309.html")
        );
    }

    #[test]
    fn writes_document() {
        let dir = TempDir::new("speed_map").unwrap();
        let path = dir.path().join("map.html");
        write_document(&path, "<html></html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");
    }
}
