//! Defines the general error type for the crate and various conversions into it
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    EmptyTrackError(String),
    InvalidArgument(String),
    InvalidConfigurationValue(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Other(String),
    Reqwest(reqwest::Error),
    RequestError(reqwest::StatusCode, String),
    Template(minijinja::Error),
    TrackLoadError(String, String),
    UnknownServiceHandler(String),
    Yaml(serde_yaml::Error),
}

impl Error {
    /// True for the errors raised while reading the input track, before any request is made
    pub fn is_load_error(&self) -> bool {
        matches!(self, Error::EmptyTrackError(_) | Error::TrackLoadError(..))
    }
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl convert::From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Reqwest(err)
    }
}

impl convert::From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Error {
        Error::Template(err)
    }
}

impl convert::From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyTrackError(path) => {
                write!(f, "GPX file '{}' does not contain any track points", path)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::Io(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "{}", e),
            Error::Other(msg) => write!(f, "{}", msg),
            Error::Reqwest(e) => write!(f, "{}", e),
            Error::RequestError(code, msg) => {
                write!(f, "Request failed with code: {} - {}", code, msg)
            }
            Error::Template(e) => write!(f, "{}", e),
            Error::TrackLoadError(path, msg) => {
                write!(f, "Could not load GPX file '{}': {}", path, msg)
            }
            Error::UnknownServiceHandler(msg) => write!(f, "{}", msg),
            Error::Yaml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
