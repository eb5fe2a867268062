use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Serialize, Serializer};

/// A sample of a derived track, annotated with the distance covered before it
/// and the time elapsed since the first sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<FixedOffset>>,
    #[serde(serialize_with = "serialize_seconds")]
    pub time_since_start: Option<TimeDelta>,
    pub distance_2d: f64,
    pub distance_3d: f64,
}

fn serialize_seconds<S: Serializer>(delta: &Option<TimeDelta>, serializer: S) -> Result<S::Ok, S::Error> {
    match delta {
        Some(delta) => serializer.serialize_some(&(delta.num_milliseconds() as f64 / 1000.)),
        None => serializer.serialize_none(),
    }
}
