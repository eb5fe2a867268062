//! Read-only views over a [`TrackCollection`]: filtering, activity and month
//! listings, flattened points and heatmap grids.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Datelike;
use serde::Serialize;
use track_viewer_lib::{error::TrackError, track::Track};

use crate::track_collection::TrackCollection;

pub const DEFAULT_HEATMAP_PRECISION: u32 = 5;
const MAX_HEATMAP_PRECISION: u32 = 15;

/// Criteria a track must all satisfy. Dates are compared against the track's
/// start time in the offset it was recorded with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFilter {
    pub activity: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl TrackFilter {
    pub fn new(activity: Option<String>, year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Result<Self, TrackError> {
        if let Some(month) = month.filter(|month| !(1..=12).contains(month)) {
            return Err(TrackError::InvalidArgument(format!("month must be within 1..=12, got {month}")));
        }
        if let Some(day) = day.filter(|day| !(1..=31).contains(day)) {
            return Err(TrackError::InvalidArgument(format!("day must be within 1..=31, got {day}")));
        }

        Ok(Self {
            activity,
            year,
            month,
            day,
        })
    }

    pub fn activity(activity: &str) -> Self {
        Self {
            activity: Some(activity.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, track: &Track) -> bool {
        if let Some(activity) = &self.activity {
            if track.activity.as_ref() != Some(activity) {
                return false;
            }
        }

        if self.year.is_none() && self.month.is_none() && self.day.is_none() {
            return true;
        }

        let Some(start) = track.start_time else {
            return false;
        };

        self.year.is_none_or(|year| start.year() == year)
            && self.month.is_none_or(|month| start.month() == month)
            && self.day.is_none_or(|day| start.day() == day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
}

/// Point density on a grid of rounded coordinates. Bounds are `[lat, lng]`
/// pairs taken over the rounded cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    pub cells: Vec<HeatmapCell>,
    pub min_bound: [f64; 2],
    pub max_bound: [f64; 2],
}

pub fn filter_tracks<'a>(collection: &'a TrackCollection, filter: &TrackFilter) -> Vec<&'a Track> {
    collection.tracks().filter(|track| filter.matches(track)).collect()
}

/// Distinct activity labels, ignoring tracks without one.
pub fn activities_of<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> BTreeSet<String> {
    tracks
        .into_iter()
        .filter_map(|track| track.activity.as_ref())
        .filter(|activity| !activity.is_empty())
        .cloned()
        .collect()
}

/// Months with at least one track, grouped by year.
pub fn monthly_buckets(collection: &TrackCollection) -> BTreeMap<i32, BTreeSet<u32>> {
    let mut buckets: BTreeMap<i32, BTreeSet<u32>> = BTreeMap::new();

    for start in collection.tracks().filter_map(|track| track.start_time) {
        buckets.entry(start.year()).or_default().insert(start.month());
    }

    tracing::debug!("Monthly buckets: {:?}", buckets);
    buckets
}

/// `(latitude, longitude)` of every point of every matching track.
pub fn all_points(collection: &TrackCollection, filter: &TrackFilter) -> Vec<(f64, f64)> {
    let points: Vec<(f64, f64)> = filter_tracks(collection, filter)
        .into_iter()
        .flat_map(|track| track.points.iter().map(|point| (point.latitude, point.longitude)))
        .collect();

    tracing::debug!("{} points for {:?}", points.len(), filter);
    points
}

/// Counts points per cell after rounding coordinates to `precision` decimals.
///
/// Rounding is done on the scaled binary value with ties away from zero, so a
/// coordinate exactly halfway between two cells at the last decimal may land
/// in the other cell than a decimal half-to-even rounding would pick.
///
/// Returns `Ok(None)` when no point matches the filter.
pub fn heatmap_grid(collection: &TrackCollection, filter: &TrackFilter, precision: u32) -> Result<Option<HeatmapGrid>, TrackError> {
    if precision > MAX_HEATMAP_PRECISION {
        return Err(TrackError::InvalidArgument(format!(
            "heatmap precision must be at most {MAX_HEATMAP_PRECISION}, got {precision}"
        )));
    }

    let scale = 10f64.powi(precision as i32);
    let mut cells: Vec<HeatmapCell> = Vec::new();
    // Keyed on scaled integers so equal cells hash equally
    let mut positions: HashMap<(i64, i64), usize> = HashMap::new();

    for (latitude, longitude) in all_points(collection, filter) {
        let key = ((latitude * scale).round() as i64, (longitude * scale).round() as i64);
        match positions.get(&key) {
            Some(&position) => cells[position].count += 1,
            None => {
                positions.insert(key, cells.len());
                cells.push(HeatmapCell {
                    lat: key.0 as f64 / scale,
                    lng: key.1 as f64 / scale,
                    count: 1,
                });
            }
        }
    }

    let Some(first) = cells.first() else {
        return Ok(None);
    };

    let (min_bound, max_bound) = cells.iter().fold(
        ([first.lat, first.lng], [first.lat, first.lng]),
        |(min, max), cell| {
            (
                [min[0].min(cell.lat), min[1].min(cell.lng)],
                [max[0].max(cell.lat), max[1].max(cell.lng)],
            )
        },
    );

    Ok(Some(HeatmapGrid {
        cells,
        min_bound,
        max_bound,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{collection, track_at};

    #[test]
    fn filter_without_criteria_returns_everything_in_order() {
        let collection = collection(vec![
            track_at("c", Some("biking"), Some("2024-05-01T08:00:00Z"), &[(48., 2.)]),
            track_at("a", None, None, &[(48., 2.)]),
            track_at("b", Some("walking"), Some("2023-01-02T08:00:00Z"), &[(48., 2.)]),
        ]);

        let names: Vec<&str> = filter_tracks(&collection, &TrackFilter::default())
            .iter()
            .map(|track| track.name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn filter_by_activity_and_date() {
        let collection = collection(vec![
            track_at("may", Some("biking"), Some("2024-05-01T08:00:00Z"), &[(48., 2.)]),
            track_at("june", Some("biking"), Some("2024-06-01T08:00:00Z"), &[(48., 2.)]),
            track_at("walk", Some("walking"), Some("2024-05-01T09:00:00Z"), &[(48., 2.)]),
            track_at("untimed", Some("biking"), None, &[(48., 2.)]),
        ]);

        let filter = TrackFilter::new(Some("biking".into()), Some(2024), Some(5), Some(1)).unwrap();
        let names: Vec<&str> = filter_tracks(&collection, &filter).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["may"]);

        let names: Vec<&str> = filter_tracks(&collection, &TrackFilter::activity("biking"))
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["may", "june", "untimed"]);
    }

    #[test]
    fn date_filter_uses_recorded_offset() {
        // 23:30 on the 31st in UTC-02:00 is already June in UTC
        let collection = collection(vec![track_at(
            "late",
            None,
            Some("2024-05-31T23:30:00-02:00"),
            &[(48., 2.)],
        )]);

        let filter = TrackFilter::new(None, Some(2024), Some(5), Some(31)).unwrap();
        assert_eq!(filter_tracks(&collection, &filter).len(), 1);
    }

    #[test]
    fn untimed_track_matches_no_date_filter() {
        let collection = collection(vec![track_at("untimed", None, None, &[(48., 2.)])]);
        let filter = TrackFilter::new(None, Some(2024), None, None).unwrap();
        assert!(filter_tracks(&collection, &filter).is_empty());
    }

    #[test]
    fn filter_rejects_impossible_dates() {
        assert!(matches!(TrackFilter::new(None, None, Some(13), None), Err(TrackError::InvalidArgument(_))));
        assert!(matches!(TrackFilter::new(None, None, None, Some(0)), Err(TrackError::InvalidArgument(_))));
    }

    #[test]
    fn activities_skip_missing_and_empty_labels() {
        let collection = collection(vec![
            track_at("a", Some("biking"), None, &[(48., 2.)]),
            track_at("b", Some(""), None, &[(48., 2.)]),
            track_at("c", None, None, &[(48., 2.)]),
            track_at("d", Some("walking"), None, &[(48., 2.)]),
            track_at("e", Some("biking"), None, &[(48., 2.)]),
        ]);

        let activities = activities_of(collection.tracks());
        assert_eq!(activities, BTreeSet::from(["biking".to_string(), "walking".to_string()]));

        let filtered = filter_tracks(&collection, &TrackFilter::activity("walking"));
        assert_eq!(activities_of(filtered), BTreeSet::from(["walking".to_string()]));
    }

    #[test]
    fn monthly_buckets_group_by_year() {
        let collection = collection(vec![
            track_at("a", None, Some("2024-05-01T08:00:00Z"), &[(48., 2.)]),
            track_at("b", None, Some("2024-05-20T08:00:00Z"), &[(48., 2.)]),
            track_at("c", None, Some("2024-07-01T08:00:00Z"), &[(48., 2.)]),
            track_at("d", None, Some("2023-12-31T08:00:00Z"), &[(48., 2.)]),
            track_at("e", None, None, &[(48., 2.)]),
        ]);

        let buckets = monthly_buckets(&collection);
        assert_eq!(
            buckets,
            BTreeMap::from([(2023, BTreeSet::from([12])), (2024, BTreeSet::from([5, 7]))])
        );
    }

    #[test]
    fn all_points_flatten_in_track_then_point_order() {
        let collection = collection(vec![
            track_at("a", Some("biking"), None, &[(48., 2.), (48.1, 2.1)]),
            track_at("b", Some("walking"), None, &[(45., 6.)]),
            track_at("c", Some("biking"), None, &[(47., 3.)]),
        ]);

        assert_eq!(
            all_points(&collection, &TrackFilter::default()),
            vec![(48., 2.), (48.1, 2.1), (45., 6.), (47., 3.)]
        );
        assert_eq!(
            all_points(&collection, &TrackFilter::activity("biking")),
            vec![(48., 2.), (48.1, 2.1), (47., 3.)]
        );
    }

    #[test]
    fn heatmap_merges_points_in_same_cell() {
        let collection = collection(vec![track_at(
            "a",
            None,
            None,
            &[(48.00001, 2.00001), (48.00002, 2.00002)],
        )]);

        let grid = heatmap_grid(&collection, &TrackFilter::default(), 3).unwrap().unwrap();
        assert_eq!(grid.cells, vec![HeatmapCell { lat: 48.0, lng: 2.0, count: 2 }]);
        assert_eq!(grid.min_bound, [48.0, 2.0]);
        assert_eq!(grid.max_bound, [48.0, 2.0]);
    }

    #[test]
    fn heatmap_bounds_are_componentwise() {
        let collection = collection(vec![track_at(
            "a",
            None,
            None,
            &[(48.5, 2.1), (47.5, 2.9), (48.5, 2.1)],
        )]);

        let grid = heatmap_grid(&collection, &TrackFilter::default(), 1).unwrap().unwrap();
        assert_eq!(
            grid.cells,
            vec![
                HeatmapCell { lat: 48.5, lng: 2.1, count: 2 },
                HeatmapCell { lat: 47.5, lng: 2.9, count: 1 },
            ]
        );
        assert_eq!(grid.min_bound, [47.5, 2.1]);
        assert_eq!(grid.max_bound, [48.5, 2.9]);
    }

    #[test]
    fn heatmap_rounds_ties_away_from_zero() {
        let collection = collection(vec![track_at("a", None, None, &[(2.5, -2.5), (0.5, -0.5)])]);

        let grid = heatmap_grid(&collection, &TrackFilter::default(), 0).unwrap().unwrap();
        assert_eq!(
            grid.cells,
            vec![
                HeatmapCell { lat: 3.0, lng: -3.0, count: 1 },
                HeatmapCell { lat: 1.0, lng: -1.0, count: 1 },
            ]
        );
    }

    #[test]
    fn heatmap_without_points_is_none() {
        let collection = collection(vec![track_at("a", Some("biking"), None, &[(48., 2.)])]);
        let grid = heatmap_grid(&collection, &TrackFilter::activity("kayaking"), DEFAULT_HEATMAP_PRECISION).unwrap();
        assert_eq!(grid, None);
    }

    #[test]
    fn heatmap_rejects_excessive_precision() {
        let collection = TrackCollection::new();
        let result = heatmap_grid(&collection, &TrackFilter::default(), 16);
        assert!(matches!(result, Err(TrackError::InvalidArgument(_))));
    }
}
