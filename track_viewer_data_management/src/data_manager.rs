use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use chrono::FixedOffset;
use track_viewer_lib::{error::TrackError, track::Track};

use crate::{
    gpx_util,
    queries::{self, HeatmapGrid, TrackFilter},
    report::{self, Report},
    track_collection::TrackCollection,
};

/// The public interface for all track viewer data. Loaded once at startup and
/// only read afterwards.
#[derive(Debug, Clone)]
pub struct DataManager {
    pub(crate) root: PathBuf,
    pub(crate) collection: TrackCollection,
}

impl DataManager {
    /// Loads every GPX file below `root`.
    ///
    /// Files that cannot be parsed are logged and skipped, as are tracks without
    /// any length. Only an unreadable `root` is an error.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, TrackError> {
        let root = root.as_ref().to_path_buf();
        let files = gpx_util::find_gpx_files(&root)?;
        tracing::info!("Found {} GPX files in {:?}", files.len(), root);

        let mut collection = TrackCollection::new();
        for path in files {
            let raw_tracks = match gpx_util::read_gpx_file(&path) {
                Ok(raw_tracks) => raw_tracks,
                Err(err) => {
                    tracing::error!("Skipping {:?}: {}", path, err);
                    continue;
                }
            };

            for raw in raw_tracks {
                let track = Track::derive(&raw);
                if track.length_3d == 0. {
                    tracing::debug!("Skipping empty track {}", raw.name);
                    continue;
                }

                if collection.insert(raw.name.clone(), track).is_some() {
                    tracing::warn!("Track {} loaded twice, keeping the latest", raw.name);
                }
            }
        }

        tracing::info!("{} tracks loaded", collection.len());

        Ok(Self { root, collection })
    }

    pub fn from_collection(root: PathBuf, collection: TrackCollection) -> Self {
        Self { root, collection }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection(&self) -> &TrackCollection {
        &self.collection
    }

    pub fn get_track(&self, id: &str) -> Result<&Track, TrackError> {
        self.collection.get(id)
    }

    pub fn filter_tracks(&self, filter: &TrackFilter) -> Vec<&Track> {
        queries::filter_tracks(&self.collection, filter)
    }

    pub fn activities(&self) -> BTreeSet<String> {
        queries::activities_of(self.collection.tracks())
    }

    pub fn monthly_buckets(&self) -> BTreeMap<i32, BTreeSet<u32>> {
        queries::monthly_buckets(&self.collection)
    }

    pub fn all_points(&self, filter: &TrackFilter) -> Vec<(f64, f64)> {
        queries::all_points(&self.collection, filter)
    }

    pub fn heatmap_grid(&self, filter: &TrackFilter, precision: u32) -> Result<Option<HeatmapGrid>, TrackError> {
        queries::heatmap_grid(&self.collection, filter, precision)
    }

    pub fn year_report(&self, year: i32, timezone: FixedOffset) -> Result<Report<'_>, TrackError> {
        report::year_report(&self.collection, year, timezone)
    }

    pub fn month_report(&self, year: i32, month: u32, timezone: FixedOffset) -> Result<Report<'_>, TrackError> {
        report::month_report(&self.collection, year, month, timezone)
    }

    pub fn day_report(&self, year: i32, month: u32, day: u32, timezone: FixedOffset) -> Result<Report<'_>, TrackError> {
        report::day_report(&self.collection, year, month, day, timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpx_util::tests::TWO_TRACKS;

    #[test]
    fn load_skips_broken_files_and_empty_tracks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ride.gpx"), TWO_TRACKS).unwrap();
        std::fs::write(dir.path().join("broken.gpx"), "<gpx").unwrap();

        let data_manager = DataManager::load(dir.path()).unwrap();

        // The second track of ride.gpx has a single point and thus no length
        assert_eq!(data_manager.collection().ids().collect::<Vec<_>>(), vec!["ride.gpx-0"]);

        let track = data_manager.get_track("ride.gpx-0").unwrap();
        assert_eq!(track.points.len(), 3);
        assert_eq!(track.activity.as_deref(), Some("biking"));
        assert!(track.length_2d > 222.);
        assert_eq!(data_manager.activities(), BTreeSet::from(["biking".to_string()]));
        assert_eq!(data_manager.monthly_buckets(), BTreeMap::from([(2024, BTreeSet::from([5]))]));
    }

    #[test]
    fn same_file_name_in_two_folders_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/ride.gpx"), TWO_TRACKS).unwrap();
        std::fs::write(dir.path().join("b/ride.gpx"), TWO_TRACKS.replace("biking", "jogging")).unwrap();

        let data_manager = DataManager::load(dir.path()).unwrap();

        assert_eq!(data_manager.collection().len(), 1);
        assert_eq!(data_manager.get_track("ride.gpx-0").unwrap().activity.as_deref(), Some("jogging"));
    }

    #[test]
    fn unknown_track_is_not_found() {
        let data_manager = DataManager::from_collection(PathBuf::new(), TrackCollection::new());
        assert!(matches!(data_manager.get_track("missing.gpx-0"), Err(TrackError::NotFound(_))));
    }

    #[test]
    fn missing_root_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DataManager::load(dir.path().join("missing")).is_err());
    }
}
