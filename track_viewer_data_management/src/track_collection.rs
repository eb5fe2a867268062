use std::collections::HashMap;

use track_viewer_lib::{error::TrackError, track::Track};

/// Every loaded track, keyed by identifier and kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TrackCollection {
    entries: Vec<(String, Track)>,
    index: HashMap<String, usize>,
}

impl TrackCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `track` under `id`. An existing entry is replaced in place and returned.
    pub fn insert(&mut self, id: String, track: Track) -> Option<Track> {
        if let Some(&position) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.entries[position].1, track));
        }

        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, track));
        None
    }

    pub fn get(&self, id: &str) -> Result<&Track, TrackError> {
        self.index
            .get(id)
            .map(|&position| &self.entries[position].1)
            .ok_or_else(|| TrackError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All entries in insertion order.
    pub fn all(&self) -> &[(String, Track)] {
        &self.entries
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.entries.iter().map(|(_, track)| track)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Track)> for TrackCollection {
    fn from_iter<I: IntoIterator<Item = (String, Track)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (id, track) in iter {
            collection.insert(id, track);
        }
        collection
    }
}
