//! Draw the analysed route and its speed limits as an interactive map
use crate::analysis::RouteAnalysis;
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::Error;
mod leaflet;
pub use leaflet::LeafletMap;

/// trait that defines how to turn an analysed route into a viewable document
pub trait MapRenderingService {
    /// Render the route with segments split by the speed threshold, returns the document text
    fn render(&self, analysis: &RouteAnalysis, threshold: u32) -> Result<String, Error>;

    /// File extension of the rendered document
    fn extension(&self) -> &str;
}

pub fn new_map_rendering_handler(
    config: &ServiceConfig,
) -> Result<Box<dyn MapRenderingService>, Error> {
    match config.handler() {
        "leaflet" => Ok(Box::new(LeafletMap::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no map rendering handler exists for: {}",
            config.handler()
        ))),
    }
}
