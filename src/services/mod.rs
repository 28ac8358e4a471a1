//! Service module that exports interfaces to external applications, APIs, etc.

pub mod geodata;
pub mod visualization;

// rexport some traits and utilty functions
pub use geodata::{
    new_geodata_handler, FuelStation, FuelStationSource, GeodataService, SpeedLimitSource,
};
pub use visualization::{new_map_rendering_handler, MapRenderingService};
