//! Whole-track aggregates: time and geographic bounds, climbing, length and the
//! moving/stopped split.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{geo_util, raw_point::RawPoint};

/// Below this speed (km/h) a segment counts as stopped.
pub const STOPPED_SPEED_THRESHOLD: f64 = 1.;

/// Share of the fastest samples ignored when picking the max speed.
pub const IGNORE_TOP_SPEED_PERCENTILE: f64 = 0.05;

const MIN_SPEED_SAMPLES: usize = 20;

pub type TimeBounds = (DateTime<FixedOffset>, DateTime<FixedOffset>);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UphillDownhill {
    pub uphill: f64,
    pub downhill: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovingData {
    /// Seconds
    pub moving_time: f64,
    pub stopped_time: f64,
    /// Meters
    pub moving_distance: f64,
    pub stopped_distance: f64,
    /// Meters per second
    pub max_speed: f64,
}

/// Everything a track needs besides its per-point annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackSummary {
    pub time_bounds: Option<TimeBounds>,
    pub bounds: Option<Bounds>,
    pub uphill_downhill: UphillDownhill,
    pub length_2d: f64,
    pub length_3d: f64,
    pub moving_data: MovingData,
}

pub fn summarize(points: &[RawPoint]) -> TrackSummary {
    TrackSummary {
        time_bounds: time_bounds(points),
        bounds: bounds(points),
        uphill_downhill: uphill_downhill(points),
        length_2d: length_2d(points),
        length_3d: length_3d(points),
        moving_data: moving_data(points),
    }
}

/// Earliest and latest timestamp, `None` if no point carries one.
pub fn time_bounds(points: &[RawPoint]) -> Option<TimeBounds> {
    let mut times = points.iter().filter_map(|point| point.time);
    let first = times.next()?;
    Some(times.fold((first, first), |(start, end), time| (start.min(time), end.max(time))))
}

pub fn bounds(points: &[RawPoint]) -> Option<Bounds> {
    let (first, rest) = points.split_first()?;

    let initial = Bounds {
        min_latitude: first.latitude,
        max_latitude: first.latitude,
        min_longitude: first.longitude,
        max_longitude: first.longitude,
    };

    Some(rest.iter().fold(initial, |bounds, point| Bounds {
        min_latitude: bounds.min_latitude.min(point.latitude),
        max_latitude: bounds.max_latitude.max(point.latitude),
        min_longitude: bounds.min_longitude.min(point.longitude),
        max_longitude: bounds.max_longitude.max(point.longitude),
    }))
}

/// Total climb and descent over lightly smoothed elevations.
/// Points without elevation break the chain and contribute nothing.
pub fn uphill_downhill(points: &[RawPoint]) -> UphillDownhill {
    let elevations: Vec<Option<f64>> = points.iter().map(|point| point.elevation).collect();
    let smoothed: Vec<Option<f64>> = (0..elevations.len())
        .map(|index| smoothed_elevation(&elevations, index))
        .collect();

    let mut result = UphillDownhill::default();
    for pair in smoothed.windows(2) {
        if let [Some(previous), Some(current)] = pair {
            let delta = current - previous;
            if delta > 0. {
                result.uphill += delta;
            } else {
                result.downhill -= delta;
            }
        }
    }

    result
}

fn smoothed_elevation(elevations: &[Option<f64>], index: usize) -> Option<f64> {
    let current = elevations[index]?;

    if index > 0 && index + 1 < elevations.len() {
        if let (Some(previous), Some(next)) = (elevations[index - 1], elevations[index + 1]) {
            return Some(previous * 0.3 + current * 0.4 + next * 0.3);
        }
    }

    Some(current)
}

pub fn length_2d(points: &[RawPoint]) -> f64 {
    points
        .windows(2)
        .filter_map(|pair| geo_util::distance_2d(&pair[0], &pair[1]))
        .fold(0., |total, distance| total + distance)
}

pub fn length_3d(points: &[RawPoint]) -> f64 {
    points
        .windows(2)
        .filter_map(|pair| geo_util::distance_3d(&pair[0], &pair[1]))
        .fold(0., |total, distance| total + distance)
}

/// Splits the timed part of a track into moving and stopped time using
/// [`STOPPED_SPEED_THRESHOLD`]. Pairs where either point lacks a timestamp are skipped.
pub fn moving_data(points: &[RawPoint]) -> MovingData {
    let mut data = MovingData::default();
    let mut speeds_and_distances = Vec::new();

    for pair in points.windows(2) {
        let (previous, point) = (&pair[0], &pair[1]);
        let (Some(previous_time), Some(time)) = (previous.time, point.time) else {
            continue;
        };

        let distance = geo_util::distance_3d(previous, point).unwrap_or(0.);
        let seconds = (time - previous_time).num_milliseconds() as f64 / 1000.;

        let speed_kmh = if seconds > 0. {
            (distance / 1000.) / (seconds / 3600.)
        } else {
            0.
        };

        if speed_kmh <= STOPPED_SPEED_THRESHOLD {
            data.stopped_time += seconds;
            data.stopped_distance += distance;
        } else {
            data.moving_time += seconds;
            data.moving_distance += distance;
            speeds_and_distances.push((distance / seconds, distance));
        }
    }

    data.max_speed = max_speed(&speeds_and_distances).unwrap_or(0.);
    data
}

/// Picks a robust maximum from `(speed, distance)` samples: samples whose distance
/// is an outlier are dropped, then the top [`IGNORE_TOP_SPEED_PERCENTILE`] is ignored.
fn max_speed(speeds_and_distances: &[(f64, f64)]) -> Option<f64> {
    if speeds_and_distances.len() < MIN_SPEED_SAMPLES {
        return None;
    }

    let size = speeds_and_distances.len() as f64;
    let average = speeds_and_distances.iter().map(|(_, distance)| distance).sum::<f64>() / size;
    let deviation = (speeds_and_distances
        .iter()
        .map(|(_, distance)| (distance - average).powi(2))
        .sum::<f64>()
        / size)
        .sqrt();

    let mut speeds: Vec<f64> = speeds_and_distances
        .iter()
        .filter(|(_, distance)| (distance - average).abs() <= deviation * 1.5)
        .map(|(speed, _)| *speed)
        .collect();

    speeds.sort_by(f64::total_cmp);

    let index = (speeds.len() as f64 * (1. - IGNORE_TOP_SPEED_PERCENTILE)) as usize;
    speeds.get(index).or(speeds.last()).copied()
}
