#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// No track is registered under the requested identifier.
    NotFound(String),
    /// A query received an argument outside of its accepted shape.
    InvalidArgument(String),
    /// A GPX file or folder could not be read or parsed.
    Load(String),
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Track not found: {id}"),
            Self::InvalidArgument(reason) => write!(f, "Invalid argument: {reason}"),
            Self::Load(reason) => write!(f, "Failed to load tracks: {reason}"),
        }
    }
}

impl std::error::Error for TrackError {}
