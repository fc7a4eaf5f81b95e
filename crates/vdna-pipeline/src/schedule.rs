//! Post-time assignment for new production jobs.
//!
//! Jobs post on the day after the run, at the track's fixed hours in the
//! configured UTC offset. The `slot`-th job of a track rotates through the
//! hour list so consecutive jobs do not all land on the first hour, and
//! platform `i` of that job posts at `hours[(slot + i) % hours.len()]`.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use vdna_core::{ContentType, Platform, ScheduleSettings};

use crate::types::ScheduledPost;

/// Hours of day used by a track.
#[must_use]
pub fn track_hours(settings: &ScheduleSettings, content_type: ContentType) -> &[u32] {
    match content_type {
        ContentType::ShortForm => &settings.short_form_hours,
        ContentType::LongForm => &settings.long_form_hours,
    }
}

/// One post per platform for the `slot`-th job of `content_type` in this run.
///
/// Hours outside `0..24` are skipped; settings validation rejects them.
#[must_use]
pub fn schedule_posts(
    content_type: ContentType,
    slot: usize,
    platforms: &[Platform],
    settings: &ScheduleSettings,
    now: DateTime<Utc>,
) -> Vec<ScheduledPost> {
    let hours = track_hours(settings, content_type);
    if hours.is_empty() {
        return Vec::new();
    }

    let offset = FixedOffset::east_opt(settings.utc_offset_minutes.saturating_mul(60))
        .unwrap_or(Utc.fix());
    let today = now.with_timezone(&offset).date_naive();
    let post_day = today.succ_opt().unwrap_or(today);

    platforms
        .iter()
        .enumerate()
        .filter_map(|(i, platform)| {
            let hour = hours[(slot + i) % hours.len()];
            let local = post_day.and_hms_opt(hour, 0, 0)?;
            let scheduled = local.and_local_timezone(offset).single()?;
            Some(ScheduledPost {
                platform: *platform,
                scheduled_for: scheduled.with_timezone(&Utc),
            })
        })
        .collect()
}
