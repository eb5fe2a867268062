pub mod error;
pub mod geo_util;
pub mod raw_point;
pub mod track;
pub mod track_point;
pub mod track_stats;
