use chrono::{DateTime, FixedOffset};
use geo_types::Point;

/// A GPS sample exactly as read from a recording, before any derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<FixedOffset>>,
}

impl RawPoint {
    pub fn new(position: Point, elevation: Option<f64>, time: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            latitude: position.y(),
            longitude: position.x(),
            elevation,
            time,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// One recorded track with its segments flattened in recording order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrack {
    pub name: String,
    pub activity: Option<String>,
    pub points: Vec<RawPoint>,
}

impl RawTrack {
    pub fn new(name: String, activity: Option<String>, points: Vec<RawPoint>) -> Self {
        Self {
            name,
            activity,
            points,
        }
    }
}
