use chrono::{DateTime, TimeDelta};
use track_viewer_lib::{
    raw_point::{RawPoint, RawTrack},
    track::Track,
};

use crate::track_collection::TrackCollection;

/// A track whose points are one minute apart starting at `start`.
pub(crate) fn track_at(name: &str, activity: Option<&str>, start: Option<&str>, coordinates: &[(f64, f64)]) -> (String, Track) {
    let start = start.map(|start| DateTime::parse_from_rfc3339(start).unwrap());
    let points = coordinates
        .iter()
        .enumerate()
        .map(|(i, &(latitude, longitude))| RawPoint {
            latitude,
            longitude,
            elevation: None,
            time: start.map(|start| start + TimeDelta::minutes(i as i64)),
        })
        .collect();

    let raw = RawTrack::new(name.to_string(), activity.map(str::to_string), points);
    (name.to_string(), Track::derive(&raw))
}

pub(crate) fn collection(tracks: Vec<(String, Track)>) -> TrackCollection {
    tracks.into_iter().collect()
}
