//! Periodic reports. Period boundaries are built in the configured timezone,
//! while track selection uses each track's own recorded offset.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeDelta, TimeZone};
use serde::Serialize;
use track_viewer_lib::{error::TrackError, track::Track};

use crate::{
    queries::{activities_of, filter_tracks, TrackFilter},
    track_collection::TrackCollection,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActivityTotals {
    pub track_count: usize,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub moving_time: f64,
    pub uphill: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPeriod {
    pub label: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub totals: BTreeMap<String, ActivityTotals>,
}

#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub activities: BTreeSet<String>,
    pub tracks: Vec<&'a Track>,
    pub periods: Vec<ReportPeriod>,
}

/// One period per month of `year`.
pub fn year_report(collection: &TrackCollection, year: i32, timezone: FixedOffset) -> Result<Report<'_>, TrackError> {
    let tracks = filter_tracks(collection, &TrackFilter::new(None, Some(year), None, None)?);

    let periods = (1..=12)
        .map(|month| {
            let (next_year, next_month) = next_month(year, month);
            let start = local_midnight(timezone, date(year, month, 1)?)?;
            let end = local_midnight(timezone, date(next_year, next_month, 1)?)? - TimeDelta::microseconds(1);
            Ok(period(format!("{month:02}/{year}"), start, end, &tracks))
        })
        .collect::<Result<Vec<_>, TrackError>>()?;

    Ok(Report {
        year,
        month: None,
        day: None,
        activities: activities_of(tracks.iter().copied()),
        tracks,
        periods,
    })
}

/// One period per day of the month.
pub fn month_report(collection: &TrackCollection, year: i32, month: u32, timezone: FixedOffset) -> Result<Report<'_>, TrackError> {
    let first_day = date(year, month, 1)?;
    let tracks = filter_tracks(collection, &TrackFilter::new(None, Some(year), Some(month), None)?);

    let periods = first_day
        .iter_days()
        .take_while(|day| day.month() == month)
        .map(|day| day_period(day, format!("{:02}/{month:02}", day.day()), timezone, &tracks))
        .collect::<Result<Vec<_>, TrackError>>()?;

    Ok(Report {
        year,
        month: Some(month),
        day: None,
        activities: activities_of(tracks.iter().copied()),
        tracks,
        periods,
    })
}

pub fn day_report(collection: &TrackCollection, year: i32, month: u32, day: u32, timezone: FixedOffset) -> Result<Report<'_>, TrackError> {
    let date = date(year, month, day)?;
    let tracks = filter_tracks(collection, &TrackFilter::new(None, Some(year), Some(month), Some(day))?);
    let period = day_period(date, format!("{day:02}/{month:02}/{year}"), timezone, &tracks)?;

    Ok(Report {
        year,
        month: Some(month),
        day: Some(day),
        activities: activities_of(tracks.iter().copied()),
        tracks,
        periods: vec![period],
    })
}

fn day_period(day: NaiveDate, label: String, timezone: FixedOffset, tracks: &[&Track]) -> Result<ReportPeriod, TrackError> {
    let next_day = day
        .succ_opt()
        .ok_or_else(|| TrackError::InvalidArgument(format!("{day} has no following day")))?;
    let start = local_midnight(timezone, day)?;
    let end = local_midnight(timezone, next_day)? - TimeDelta::microseconds(1);
    Ok(period(label, start, end, tracks))
}

fn period(label: String, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>, tracks: &[&Track]) -> ReportPeriod {
    let mut totals: BTreeMap<String, ActivityTotals> = BTreeMap::new();

    for track in tracks {
        let (Some(activity), Some(track_start)) = (&track.activity, track.start_time) else {
            continue;
        };
        if track_start < start || track_start > end {
            continue;
        }

        let entry = totals.entry(activity.clone()).or_default();
        entry.track_count += 1;
        entry.distance += track.length_2d;
        entry.moving_time += track.moving_time;
        entry.uphill += track.uphill;
    }

    ReportPeriod {
        label,
        start,
        end,
        totals,
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, TrackError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| TrackError::InvalidArgument(format!("{year}-{month:02}-{day:02} is not a valid date")))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn local_midnight(timezone: FixedOffset, date: NaiveDate) -> Result<DateTime<FixedOffset>, TrackError> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| timezone.from_local_datetime(&midnight).single())
        .ok_or_else(|| TrackError::InvalidArgument(format!("No local midnight for {date}")))
}
