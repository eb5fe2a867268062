pub mod gpx_util;
pub mod queries;
pub mod report;
pub mod track_collection;
mod data_manager;

#[cfg(test)]
mod test_support;

pub use data_manager::*;

pub const GPX_EXTENSION: &str = "gpx";
