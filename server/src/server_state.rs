use std::collections::BTreeMap;

use chrono::FixedOffset;
use track_viewer_data_management::DataManager;

use crate::{config::Config, format::activity_color};

pub struct ServerState {
    pub data_manager: DataManager,
    pub config: Config,
    /// Offset in which report periods are laid out
    pub timezone: FixedOffset,
    /// Picked once so that unknown activities keep the same colour between requests
    pub activity_colors: BTreeMap<String, String>,
}

impl ServerState {
    pub fn new(data_manager: DataManager, config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let timezone = config.utc_offset()?;

        let activity_colors = data_manager
            .activities()
            .into_iter()
            .map(|activity| {
                let color = activity_color(&activity);
                (activity, color)
            })
            .collect();

        Ok(Self {
            data_manager,
            config,
            timezone,
            activity_colors,
        })
    }

    pub fn color_of(&self, activity: Option<&str>) -> Option<&str> {
        activity.and_then(|activity| self.activity_colors.get(activity)).map(String::as_str)
    }
}
