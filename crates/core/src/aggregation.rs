//! Daily bucketing of sparse samples.
//!
//! Pure logic, no storage access. Samples are keyed by the calendar date
//! their instant falls on in the requested zone; within a day the latest
//! sample wins.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::metric::Metric;
use crate::timezone::{Timezone, TimezoneResolver};

/// Keep one sample per zone-local calendar date: the one with the greatest
/// timestamp. On equal timestamps the sample seen first is kept.
pub fn latest_per_day<'a>(
    samples: &'a [Metric],
    zone: &Timezone,
    resolver: &TimezoneResolver,
) -> Result<HashMap<NaiveDate, &'a Metric>, CoreError> {
    let mut buckets: HashMap<NaiveDate, &Metric> = HashMap::new();

    for sample in samples {
        let day = resolver.local_date(sample.timestamp, zone)?;
        match buckets.get(&day) {
            Some(kept) if sample.timestamp <= kept.timestamp => {}
            _ => {
                buckets.insert(day, sample);
            }
        }
    }

    Ok(buckets)
}

/// Every calendar date from `start` to `end`, inclusive.
///
/// Empty when `end < start`.
pub fn date_sequence(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Number of days in the inclusive range, `0` when `end < start`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
