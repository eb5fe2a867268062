use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use chrono::{DateTime, FixedOffset};
use gpx::{Time, Waypoint};
use track_viewer_lib::{
    error::TrackError,
    raw_point::{RawPoint, RawTrack},
};

use crate::GPX_EXTENSION;

/// Reads every track of a GPX document. Tracks are named `{file_name}-{index}`
/// and their segments are flattened in document order.
pub fn read_gpx_tracks<R: Read>(reader: R, file_name: &str) -> Result<Vec<RawTrack>, TrackError> {
    let gpx = gpx::read(reader).map_err(|err| TrackError::Load(format!("Failed to parse {file_name}: {err}")))?;

    gpx.tracks
        .into_iter()
        .enumerate()
        .map(|(index, track)| {
            let points = track
                .segments
                .iter()
                .flat_map(|segment| segment.points.iter())
                .map(raw_point)
                .collect::<Result<Vec<_>, _>>()?;

            Ok(RawTrack::new(format!("{file_name}-{index}"), track.type_, points))
        })
        .collect()
}

pub fn read_gpx_file(path: &Path) -> Result<Vec<RawTrack>, TrackError> {
    let file = File::open(path).map_err(|err| TrackError::Load(format!("Failed to open {:?}: {err}", path)))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    read_gpx_tracks(BufReader::new(file), &file_name)
}

/// Recursively collects the GPX files below `root`, sorted by path so that
/// loading order is stable between runs.
pub fn find_gpx_files(root: &Path) -> Result<Vec<PathBuf>, TrackError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = dir
            .read_dir()
            .map_err(|err| TrackError::Load(format!("Failed to read directory {:?}: {err}", dir)))?;

        for entry in entries {
            let path = entry
                .map(|entry| entry.path())
                .map_err(|err| TrackError::Load(format!("Failed to read directory {:?}: {err}", dir)))?;

            if path.is_dir() {
                pending.push(path);
            } else if is_gpx(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_gpx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(GPX_EXTENSION))
}

fn raw_point(waypoint: &Waypoint) -> Result<RawPoint, TrackError> {
    let time = waypoint.time.as_ref().map(parse_time).transpose()?;
    Ok(RawPoint::new(waypoint.point(), waypoint.elevation, time))
}

fn parse_time(time: &Time) -> Result<DateTime<FixedOffset>, TrackError> {
    let formatted = time
        .format()
        .map_err(|err| TrackError::Load(format!("Unformattable GPX time: {err}")))?;
    DateTime::parse_from_rfc3339(&formatted)
        .map_err(|err| TrackError::Load(format!("Invalid GPX time {formatted}: {err}")))
}
