//! Display helpers shared by the JSON views.

use chrono::{DateTime, FixedOffset};

pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes:02}m {seconds:02}s")
}

pub fn format_datetime(time: &DateTime<FixedOffset>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn month_name(month: u32) -> Option<&'static str> {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September", "October",
        "November", "December",
    ];

    month.checked_sub(1).and_then(|index| MONTHS.get(index as usize)).copied()
}

/// Emoji for an activity, optionally followed by its name.
pub fn activity_emoji(activity: &str, with_text: bool) -> String {
    let emoji = match activity {
        "biking" => "🚴",
        "kayaking" => "🚣",
        "walking" | "off-trail walking" => "🚶",
        "jogging" => "🏃",
        _ => "",
    };

    match (emoji.is_empty(), with_text) {
        (true, _) => activity.to_string(),
        (false, true) => format!("{emoji} {activity}"),
        (false, false) => emoji.to_string(),
    }
}

/// Hex colour used to draw an activity. Unknown activities get a random one.
pub fn activity_color(activity: &str) -> String {
    match activity {
        "biking" => "#fff859".to_string(),
        "kayaking" => "#ffa559".to_string(),
        "walking" | "off-trail walking" => "#a559ff".to_string(),
        "jogging" => "#59b3ff".to_string(),
        _ => {
            let color = format!("#{:06x}", rand::random::<u32>() & 0xffffff);
            tracing::info!("No colour for activity {activity:?}, using {color}");
            color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.), "0h 00m 00s");
        assert_eq!(format_duration(3725.), "1h 02m 05s");
        assert_eq!(format_duration(90000.4), "25h 00m 00s");
        assert_eq!(format_duration(-5.), "0h 00m 00s");
    }

    #[test]
    fn test_format_datetime() {
        let time = DateTime::parse_from_rfc3339("2024-05-01T08:03:09+02:00").unwrap();
        assert_eq!(format_datetime(&time), "2024-05-01 08:03:09");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_activity_emoji() {
        assert_eq!(activity_emoji("biking", false), "🚴");
        assert_eq!(activity_emoji("jogging", true), "🏃 jogging");
        assert_eq!(activity_emoji("off-trail walking", false), "🚶");
        assert_eq!(activity_emoji("sailing", true), "sailing");
    }

    #[test]
    fn test_activity_color() {
        assert_eq!(activity_color("kayaking"), "#ffa559");

        let color = activity_color("sailing");
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
