use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    geo_util,
    raw_point::{RawPoint, RawTrack},
    track_point::TrackPoint,
    track_stats::{self, TrackSummary},
};

/// A recorded track with its derived statistics. Built once at load time and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub activity: Option<String>,
    pub points: Vec<TrackPoint>,

    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,

    pub length_2d: f64,
    pub length_3d: f64,

    pub uphill: f64,
    pub downhill: f64,

    pub moving_time: f64,
    pub stopped_time: f64,
    pub moving_distance: f64,
    pub stopped_distance: f64,
    pub max_speed: f64,

    pub min_latitude: Option<f64>,
    pub max_latitude: Option<f64>,
    pub min_longitude: Option<f64>,
    pub max_longitude: Option<f64>,
}

impl Track {
    /// Derives a track, computing every aggregate from the raw points.
    pub fn derive(raw: &RawTrack) -> Self {
        let summary = track_stats::summarize(&raw.points);
        Self::from_parts(raw.name.clone(), raw.activity.clone(), &raw.points, summary)
    }

    /// Builds a track from raw points and aggregates computed elsewhere.
    ///
    /// A track without points ignores `summary`, so that all of its numbers are
    /// zero and all of its bounds are absent.
    pub fn from_parts(name: String, activity: Option<String>, raw_points: &[RawPoint], summary: TrackSummary) -> Self {
        let summary = if raw_points.is_empty() {
            TrackSummary::default()
        } else {
            summary
        };

        let (start_time, end_time) = summary.time_bounds.unzip();
        let bounds = summary.bounds;

        Self {
            name,
            activity,
            points: build_points(raw_points),
            start_time,
            end_time,
            length_2d: summary.length_2d,
            length_3d: summary.length_3d,
            uphill: summary.uphill_downhill.uphill,
            downhill: summary.uphill_downhill.downhill,
            moving_time: summary.moving_data.moving_time,
            stopped_time: summary.moving_data.stopped_time,
            moving_distance: summary.moving_data.moving_distance,
            stopped_distance: summary.moving_data.stopped_distance,
            max_speed: summary.moving_data.max_speed,
            min_latitude: bounds.map(|b| b.min_latitude),
            max_latitude: bounds.map(|b| b.max_latitude),
            min_longitude: bounds.map(|b| b.min_longitude),
            max_longitude: bounds.map(|b| b.max_longitude),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Annotates raw points with the distance covered up to each of them and the
/// time elapsed since the first one (`point.time - first.time`).
///
/// Segments whose distance cannot be computed count as zero.
pub fn build_points(raw_points: &[RawPoint]) -> Vec<TrackPoint> {
    let Some(first) = raw_points.first() else {
        return Vec::new();
    };

    let mut total_2d = 0.;
    let mut total_3d = 0.;
    let mut points = Vec::with_capacity(raw_points.len());

    for (index, raw) in raw_points.iter().enumerate() {
        if index > 0 {
            let previous = &raw_points[index - 1];
            total_2d += geo_util::distance_2d(previous, raw).unwrap_or_else(|| {
                tracing::warn!("No 2D distance between points {} and {}, counting it as zero", index - 1, index);
                0.
            });
            total_3d += geo_util::distance_3d(previous, raw).unwrap_or_else(|| {
                tracing::warn!("No 3D distance between points {} and {}, counting it as zero", index - 1, index);
                0.
            });
        }

        points.push(TrackPoint {
            latitude: raw.latitude,
            longitude: raw.longitude,
            elevation: raw.elevation,
            time: raw.time,
            time_since_start: raw.time.zip(first.time).map(|(time, start)| time - start),
            distance_2d: total_2d,
            distance_3d: total_3d,
        });
    }

    points
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::geo_util::distance_2d;

    fn t0() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z").unwrap()
    }

    fn raw(latitude: f64, longitude: f64, elevation: Option<f64>, seconds: Option<i64>) -> RawPoint {
        RawPoint {
            latitude,
            longitude,
            elevation,
            time: seconds.map(|s| t0() + TimeDelta::seconds(s)),
        }
    }

    fn raw_track(points: Vec<RawPoint>) -> RawTrack {
        RawTrack::new("ride.gpx-0".into(), Some("biking".into()), points)
    }

    #[test]
    fn three_point_example() {
        let p0 = raw(48.0, 2.0, None, Some(0));
        let p1 = raw(48.001, 2.0, None, Some(60));
        let p2 = raw(48.002, 2.0, None, Some(180));
        let d01 = distance_2d(&p0, &p1).unwrap();
        let d12 = distance_2d(&p1, &p2).unwrap();

        let points = build_points(&[p0, p1, p2]);

        let distances: Vec<f64> = points.iter().map(|p| p.distance_2d).collect();
        assert_eq!(distances, vec![0., d01, d01 + d12]);
        assert_eq!(points[2].time_since_start, Some(TimeDelta::seconds(180)));
        assert_eq!(points[0].time_since_start, Some(TimeDelta::zero()));
    }

    #[test]
    fn distances_are_non_decreasing() {
        let raw_points = vec![
            raw(48.0, 2.0, Some(100.), None),
            raw(48.003, 2.001, Some(120.), None),
            raw(48.003, 2.001, Some(120.), None),
            raw(47.999, 1.998, Some(90.), None),
            raw(48.4, 2.5, None, None),
        ];

        let points = build_points(&raw_points);
        assert_eq!(points[0].distance_2d, 0.);
        assert_eq!(points[0].distance_3d, 0.);
        for pair in points.windows(2) {
            assert!(pair[0].distance_2d <= pair[1].distance_2d);
            assert!(pair[0].distance_3d <= pair[1].distance_3d);
        }
    }

    #[test]
    fn degenerate_segment_counts_as_zero() {
        let points = build_points(&[raw(48.0, 2.0, None, None), raw(f64::NAN, 2.0, None, None), raw(48.0, 2.0, None, None)]);
        assert_eq!(points[1].distance_2d, 0.);
        assert_eq!(points[2].distance_2d, 0.);
    }

    #[test]
    fn elapsed_time_absent_without_timestamps() {
        let points = build_points(&[raw(48.0, 2.0, None, None), raw(48.001, 2.0, None, Some(60))]);
        assert_eq!(points[0].time_since_start, None);
        assert_eq!(points[1].time_since_start, None);
    }

    #[test]
    fn out_of_order_time_is_not_corrected() {
        let points = build_points(&[raw(48.0, 2.0, None, Some(60)), raw(48.001, 2.0, None, Some(0))]);
        assert_eq!(points[1].time_since_start, Some(TimeDelta::seconds(-60)));
    }

    #[test]
    fn empty_track_has_zeros_and_no_bounds() {
        let track = Track::derive(&raw_track(Vec::new()));

        assert!(track.is_empty());
        for value in [
            track.length_2d,
            track.length_3d,
            track.uphill,
            track.downhill,
            track.moving_time,
            track.stopped_time,
            track.moving_distance,
            track.stopped_distance,
            track.max_speed,
        ] {
            assert_eq!(value, 0.);
        }
        assert_eq!(track.start_time, None);
        assert_eq!(track.end_time, None);
        assert_eq!(track.min_latitude, None);
        assert_eq!(track.max_latitude, None);
        assert_eq!(track.min_longitude, None);
        assert_eq!(track.max_longitude, None);
    }

    #[test]
    fn empty_track_ignores_supplied_summary() {
        let summary = TrackSummary {
            length_2d: 12.,
            ..Default::default()
        };
        let track = Track::from_parts("empty".into(), None, &[], summary);
        assert_eq!(track.length_2d, 0.);
    }

    #[test]
    fn single_point_track() {
        let track = Track::derive(&raw_track(vec![raw(48.5, 2.25, Some(40.), Some(0))]));

        assert_eq!(track.length_2d, 0.);
        assert_eq!(track.length_3d, 0.);
        assert_eq!(track.min_latitude, Some(48.5));
        assert_eq!(track.max_latitude, Some(48.5));
        assert_eq!(track.min_longitude, Some(2.25));
        assert_eq!(track.max_longitude, Some(2.25));
        assert_eq!(track.start_time, Some(t0()));
        assert_eq!(track.end_time, Some(t0()));
    }

    #[test]
    fn length_matches_last_cumulative_distance() {
        let track = Track::derive(&raw_track(vec![
            raw(48.0, 2.0, Some(100.), Some(0)),
            raw(48.001, 2.0, Some(105.), Some(60)),
            raw(48.002, 2.001, Some(103.), Some(120)),
        ]));

        let last = track.points.last().unwrap();
        assert_eq!(track.length_2d, last.distance_2d);
        assert_eq!(track.length_3d, last.distance_3d);
        assert_eq!(track.activity.as_deref(), Some("biking"));
    }

    #[test]
    fn derivation_is_idempotent() {
        let raw = raw_track(vec![
            raw(48.0, 2.0, Some(100.), Some(0)),
            raw(48.001, 2.0, Some(105.), Some(60)),
            raw(48.002, 2.001, None, Some(120)),
        ]);
        assert_eq!(Track::derive(&raw), Track::derive(&raw));
    }
}
