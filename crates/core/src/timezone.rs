//! Timezone identifiers and UTC <-> zone-local conversion.
//!
//! Offset and DST rules come from an injected [`TimezoneDatabase`]; this
//! module only validates identifiers, parses date text and applies the
//! resolution policy for wall-clock times that a transition skips or
//! repeats:
//!
//! - a repeated wall-clock time (backward transition) resolves to the
//!   earliest instant;
//! - a skipped wall-clock time (forward transition) is read with the offset
//!   in effect before the transition, so it lands after the gap.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone,
};
use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::EpochSeconds;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Identifier of the UTC zone.
pub const UTC: &str = "UTC";

/// Default wall-clock rendering (`yyyy-MM-dd HH:mm:ss`).
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Calendar-date rendering used as the daily bucket key.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `Area/Location`, letters and underscores only.
pub const IANA_PATTERN: &str = r"^[A-Za-z_]+/[A-Za-z_]+$";

static IANA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(IANA_PATTERN).expect("valid regex"));

/// Wall-clock layouts accepted by [`TimezoneResolver::to_utc`], tried in order.
const LOCAL_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// ---------------------------------------------------------------------------
// Timezone value object
// ---------------------------------------------------------------------------

/// A syntactically valid timezone identifier.
///
/// Passing validation does not mean the zone exists; that is decided by the
/// [`TimezoneDatabase`] at conversion time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Timezone(String);

impl Timezone {
    /// `true` for `UTC` or an `Area/Location` identifier.
    pub fn is_valid(identifier: &str) -> bool {
        identifier == UTC || IANA_RE.is_match(identifier)
    }

    pub fn parse(identifier: &str) -> Result<Self, CoreError> {
        if !Self::is_valid(identifier) {
            return Err(CoreError::InvalidTimezone(format!(
                "Invalid IANA timezone format: {identifier}"
            )));
        }
        Ok(Self(identifier.to_string()))
    }

    pub fn utc() -> Self {
        Self(UTC.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Timezone database
// ---------------------------------------------------------------------------

/// Source of UTC offsets for named zones.
pub trait TimezoneDatabase: Send + Sync {
    /// Offset in effect at the UTC instant `utc`.
    fn offset_at(&self, zone: &Timezone, utc: NaiveDateTime) -> Result<FixedOffset, CoreError>;

    /// Offsets that map the wall-clock time `local` in `zone` to an instant.
    fn local_offsets(
        &self,
        zone: &Timezone,
        local: NaiveDateTime,
    ) -> Result<LocalResult<FixedOffset>, CoreError>;
}

fn unknown_zone(zone: &Timezone) -> CoreError {
    CoreError::InvalidTimezone(format!("Invalid IANA timezone: {zone}"))
}

/// The IANA database compiled into `chrono-tz`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IanaTimezoneDatabase;

impl IanaTimezoneDatabase {
    fn lookup(zone: &Timezone) -> Result<chrono_tz::Tz, CoreError> {
        zone.as_str()
            .parse::<chrono_tz::Tz>()
            .map_err(|_| unknown_zone(zone))
    }
}

impl TimezoneDatabase for IanaTimezoneDatabase {
    fn offset_at(&self, zone: &Timezone, utc: NaiveDateTime) -> Result<FixedOffset, CoreError> {
        let tz = Self::lookup(zone)?;
        Ok(tz.offset_from_utc_datetime(&utc).fix())
    }

    fn local_offsets(
        &self,
        zone: &Timezone,
        local: NaiveDateTime,
    ) -> Result<LocalResult<FixedOffset>, CoreError> {
        let tz = Self::lookup(zone)?;
        Ok(tz.offset_from_local_datetime(&local).map(|o| o.fix()))
    }
}

/// Zones with a constant offset and no transitions.
///
/// Deterministic stand-in for the IANA database in tests. `UTC` is always
/// known; any other identifier must be registered.
#[derive(Debug, Clone)]
pub struct FixedOffsetDatabase {
    zones: HashMap<String, FixedOffset>,
}

impl Default for FixedOffsetDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedOffsetDatabase {
    pub fn new() -> Self {
        let mut zones = HashMap::new();
        zones.insert(UTC.to_string(), chrono::Utc.fix());
        Self { zones }
    }

    /// Register `identifier` at `offset_secs` east of UTC.
    ///
    /// Offsets outside +/-24h are ignored.
    pub fn with_zone(mut self, identifier: &str, offset_secs: i32) -> Self {
        if let Some(offset) = FixedOffset::east_opt(offset_secs) {
            self.zones.insert(identifier.to_string(), offset);
        }
        self
    }

    fn lookup(&self, zone: &Timezone) -> Result<FixedOffset, CoreError> {
        self.zones
            .get(zone.as_str())
            .copied()
            .ok_or_else(|| unknown_zone(zone))
    }
}

impl TimezoneDatabase for FixedOffsetDatabase {
    fn offset_at(&self, zone: &Timezone, _utc: NaiveDateTime) -> Result<FixedOffset, CoreError> {
        self.lookup(zone)
    }

    fn local_offsets(
        &self,
        zone: &Timezone,
        _local: NaiveDateTime,
    ) -> Result<LocalResult<FixedOffset>, CoreError> {
        self.lookup(zone).map(LocalResult::Single)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Converts between UTC epoch seconds and zone-local wall-clock text.
#[derive(Clone)]
pub struct TimezoneResolver {
    db: Arc<dyn TimezoneDatabase>,
}

impl fmt::Debug for TimezoneResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimezoneResolver").finish_non_exhaustive()
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new(Arc::new(IanaTimezoneDatabase))
    }
}

impl TimezoneResolver {
    pub fn new(db: Arc<dyn TimezoneDatabase>) -> Self {
        Self { db }
    }

    /// Pattern check only; see [`Timezone::is_valid`].
    pub fn validate(&self, identifier: &str) -> bool {
        Timezone::is_valid(identifier)
    }

    /// Fail with `InvalidTimezone` unless `zone` exists in the database.
    pub fn ensure_known(&self, zone: &Timezone) -> Result<(), CoreError> {
        self.db.offset_at(zone, NaiveDateTime::default()).map(|_| ())
    }

    /// Parse `text` and return the UTC instant it denotes in `zone`.
    ///
    /// Text with an explicit offset is an absolute instant. Anything else is
    /// wall-clock time in `zone`. Sub-second precision is floored.
    pub fn to_utc(&self, text: &str, zone: &Timezone) -> Result<EpochSeconds, CoreError> {
        let text = text.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            self.ensure_known(zone)?;
            return Ok(instant.timestamp());
        }

        let local = parse_local(text)
            .ok_or_else(|| CoreError::InvalidDateFormat(format!("Invalid date format: {text}")))?;
        self.local_to_utc(local, zone)
    }

    /// UTC instant of a wall-clock time in `zone`, applying the DST policy.
    pub fn local_to_utc(
        &self,
        local: NaiveDateTime,
        zone: &Timezone,
    ) -> Result<EpochSeconds, CoreError> {
        let utc = match self.db.local_offsets(zone, local)? {
            LocalResult::Single(offset) => shift_to_utc(local, offset)?,
            LocalResult::Ambiguous(first, second) => {
                shift_to_utc(local, first)?.min(shift_to_utc(local, second)?)
            }
            LocalResult::None => {
                let day_before = local
                    .checked_sub_signed(Duration::days(1))
                    .ok_or_else(|| out_of_range(local))?;
                let before = self.db.offset_at(zone, day_before)?;
                shift_to_utc(local, before)?
            }
        };
        Ok(utc.and_utc().timestamp())
    }

    /// Render `epoch` as wall-clock time in `zone` using a strftime `format`.
    pub fn from_utc(
        &self,
        epoch: EpochSeconds,
        zone: &Timezone,
        format: &str,
    ) -> Result<String, CoreError> {
        let items = parse_format(format)?;
        let local = self.to_local(epoch, zone)?;
        Ok(local.format_with_items(items.iter()).to_string())
    }

    /// [`Self::from_utc`] with [`DEFAULT_DATETIME_FORMAT`].
    pub fn format_default(&self, epoch: EpochSeconds, zone: &Timezone) -> Result<String, CoreError> {
        self.from_utc(epoch, zone, DEFAULT_DATETIME_FORMAT)
    }

    /// Calendar date of `epoch` in `zone`, as `yyyy-MM-dd`.
    pub fn date_only(&self, epoch: EpochSeconds, zone: &Timezone) -> Result<String, CoreError> {
        self.from_utc(epoch, zone, DATE_FORMAT)
    }

    /// Calendar date of `epoch` in `zone`.
    pub fn local_date(&self, epoch: EpochSeconds, zone: &Timezone) -> Result<NaiveDate, CoreError> {
        Ok(self.to_local(epoch, zone)?.date_naive())
    }

    /// UTC instant at which `date` begins in `zone`.
    pub fn start_of_day(&self, date: NaiveDate, zone: &Timezone) -> Result<EpochSeconds, CoreError> {
        self.local_to_utc(date.and_time(NaiveTime::MIN), zone)
    }

    /// UTC instant of the last whole second of `date` in `zone`.
    pub fn end_of_day(&self, date: NaiveDate, zone: &Timezone) -> Result<EpochSeconds, CoreError> {
        let last = NaiveTime::from_hms_opt(23, 59, 59).expect("valid time");
        self.local_to_utc(date.and_time(last), zone)
    }

    fn to_local(
        &self,
        epoch: EpochSeconds,
        zone: &Timezone,
    ) -> Result<DateTime<FixedOffset>, CoreError> {
        let utc = DateTime::from_timestamp(epoch, 0).ok_or_else(|| {
            CoreError::InvalidDateFormat(format!("Timestamp out of range: {epoch}"))
        })?;
        let offset = self.db.offset_at(zone, utc.naive_utc())?;
        Ok(utc.with_timezone(&offset))
    }
}

/// Parse a `yyyy-MM-dd` calendar date.
pub fn parse_calendar_date(text: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDateFormat(format!("Invalid date format: {text}")))
}

fn parse_local(text: &str) -> Option<NaiveDateTime> {
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// `local` read at `offset`, as UTC. Fails at the edges of the representable range.
fn shift_to_utc(local: NaiveDateTime, offset: FixedOffset) -> Result<NaiveDateTime, CoreError> {
    local
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
        .ok_or_else(|| out_of_range(local))
}

fn out_of_range(local: NaiveDateTime) -> CoreError {
    CoreError::InvalidDateFormat(format!("Date out of range: {local}"))
}

fn parse_format(format: &str) -> Result<Vec<Item<'_>>, CoreError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return Err(CoreError::InvalidDateFormat(format!(
            "Invalid format string: {format}"
        )));
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// 2023-12-13 11:10:00 UTC.
    const SAMPLE_TS: EpochSeconds = 1_702_465_800;

    fn iana() -> TimezoneResolver {
        TimezoneResolver::default()
    }

    fn zone(id: &str) -> Timezone {
        Timezone::parse(id).unwrap()
    }

    // -- Validation --

    #[test]
    fn accepts_utc_and_area_location() {
        for id in ["UTC", "America/New_York", "Asia/Tokyo", "Europe/London", "Etc/UTC"] {
            assert!(Timezone::is_valid(id), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for id in [
            "",
            "invalid-timezone",
            "utc",
            "America/Argentina/Buenos_Aires",
            "Etc/GMT+5",
            "America/ New_York",
        ] {
            assert!(!Timezone::is_valid(id), "{id} should be invalid");
        }
        assert_matches!(
            Timezone::parse("invalid-timezone"),
            Err(CoreError::InvalidTimezone(msg)) if msg.contains("invalid-timezone")
        );
    }

    #[test]
    fn equality_is_identifier_equality() {
        assert_eq!(zone("UTC"), zone("UTC"));
        assert_ne!(zone("UTC"), zone("Etc/UTC"));
    }

    #[test]
    fn well_formed_but_unknown_zone_fails_on_conversion() {
        let mars = zone("Mars/Olympus_Mons");
        assert_matches!(
            iana().to_utc("2023-12-13 10:30:00", &mars),
            Err(CoreError::InvalidTimezone(_))
        );
        assert_matches!(
            iana().from_utc(SAMPLE_TS, &mars, DEFAULT_DATETIME_FORMAT),
            Err(CoreError::InvalidTimezone(_))
        );
        assert_matches!(
            iana().to_utc("2023-12-13T10:30:00Z", &mars),
            Err(CoreError::InvalidTimezone(_))
        );
    }

    // -- to_utc --

    #[test]
    fn parses_rfc3339_instant_regardless_of_zone() {
        let ts = iana()
            .to_utc("2023-12-13T10:30:00.000Z", &zone("America/New_York"))
            .unwrap();
        assert_eq!(ts, 1_702_463_400);
        let ts = iana()
            .to_utc("2023-12-13T12:30:00+02:00", &zone("UTC"))
            .unwrap();
        assert_eq!(ts, 1_702_463_400);
    }

    #[test]
    fn wall_clock_text_is_local_to_zone() {
        let r = iana();
        assert_eq!(r.to_utc("2023-12-13 10:30:00", &zone("UTC")).unwrap(), 1_702_463_400);
        // EST is UTC-5 in December.
        assert_eq!(
            r.to_utc("2023-12-13 10:30:00", &zone("America/New_York")).unwrap(),
            1_702_463_400 + 5 * 3600
        );
        assert_eq!(
            r.to_utc("2023-12-13T10:30:00", &zone("Asia/Tokyo")).unwrap(),
            1_702_463_400 - 9 * 3600
        );
    }

    #[test]
    fn bare_date_is_local_midnight() {
        assert_eq!(iana().to_utc("2023-12-13", &zone("UTC")).unwrap(), 1_702_425_600);
    }

    #[test]
    fn floors_fractional_seconds() {
        let r = iana();
        assert_eq!(
            r.to_utc("2023-12-13T10:30:00.999Z", &zone("UTC")).unwrap(),
            1_702_463_400
        );
        assert_eq!(
            r.to_utc("2023-12-13T10:30:00.750", &zone("UTC")).unwrap(),
            1_702_463_400
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        for text in ["invalid-date", "2023-13-01 00:00:00", "13/12/2023", ""] {
            assert_matches!(
                iana().to_utc(text, &zone("UTC")),
                Err(CoreError::InvalidDateFormat(_)),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn summer_and_winter_offsets_differ() {
        let r = iana();
        let ny = zone("America/New_York");
        let summer = r.to_utc("2023-07-15 12:00:00", &ny).unwrap();
        let winter = r.to_utc("2023-12-15 12:00:00", &ny).unwrap();
        // EDT (UTC-4) vs EST (UTC-5).
        assert_eq!(summer % 86_400, 16 * 3600);
        assert_eq!(winter % 86_400, 17 * 3600);
    }

    #[test]
    fn dates_at_the_calendar_edges_are_rejected_not_panicking() {
        let r = iana();
        assert_matches!(
            r.to_utc("+262142-12-31 23:59:59", &zone("America/New_York")),
            Err(CoreError::InvalidDateFormat(_))
        );
        assert_matches!(
            r.to_utc("-262143-01-01 00:00:00", &zone("Asia/Tokyo")),
            Err(CoreError::InvalidDateFormat(_))
        );

        let last = parse_calendar_date("+262142-12-31").unwrap();
        assert_matches!(
            r.end_of_day(last, &zone("America/New_York")),
            Err(CoreError::InvalidDateFormat(_))
        );
        let first = parse_calendar_date("-262143-01-01").unwrap();
        assert_matches!(
            r.start_of_day(first, &zone("Asia/Tokyo")),
            Err(CoreError::InvalidDateFormat(_))
        );
        // Same edges in UTC need no shift.
        assert!(r.end_of_day(last, &zone("UTC")).is_ok());
    }

    // -- DST policy --

    #[test]
    fn skipped_wall_clock_time_moves_forward() {
        // 02:30 does not exist on 2023-03-12 in New York; read with EST.
        let ts = iana()
            .to_utc("2023-03-12 02:30:00", &zone("America/New_York"))
            .unwrap();
        assert_eq!(ts, 1_678_606_200);
        assert_eq!(
            iana().format_default(ts, &zone("America/New_York")).unwrap(),
            "2023-03-12 03:30:00"
        );
    }

    #[test]
    fn repeated_wall_clock_time_takes_earliest_instant() {
        // 01:30 happens twice on 2023-11-05 in New York; EDT comes first.
        let ts = iana()
            .to_utc("2023-11-05 01:30:00", &zone("America/New_York"))
            .unwrap();
        assert_eq!(ts, 1_699_162_200);
    }

    // -- from_utc / date_only --

    #[test]
    fn formats_in_zone() {
        let r = iana();
        assert_eq!(
            r.format_default(SAMPLE_TS, &zone("UTC")).unwrap(),
            "2023-12-13 11:10:00"
        );
        assert_eq!(
            r.format_default(SAMPLE_TS, &zone("America/New_York")).unwrap(),
            "2023-12-13 06:10:00"
        );
        assert_eq!(
            r.format_default(SAMPLE_TS, &zone("Asia/Tokyo")).unwrap(),
            "2023-12-13 20:10:00"
        );
        assert_eq!(
            r.from_utc(1_689_422_400, &zone("Europe/London"), DEFAULT_DATETIME_FORMAT)
                .unwrap(),
            "2023-07-15 13:00:00"
        );
    }

    #[test]
    fn custom_and_invalid_formats() {
        let r = iana();
        assert_eq!(
            r.from_utc(SAMPLE_TS, &zone("UTC"), "%Y-%m-%d").unwrap(),
            "2023-12-13"
        );
        assert_matches!(
            r.from_utc(SAMPLE_TS, &zone("UTC"), "%Q"),
            Err(CoreError::InvalidDateFormat(_))
        );
    }

    #[test]
    fn date_only_uses_local_calendar() {
        let r = iana();
        // 2023-12-14 03:00 UTC is still the 13th in New York.
        let ts = 1_702_522_800;
        assert_eq!(r.date_only(ts, &zone("UTC")).unwrap(), "2023-12-14");
        assert_eq!(r.date_only(ts, &zone("America/New_York")).unwrap(), "2023-12-13");
        assert_eq!(
            r.local_date(ts, &zone("America/New_York")).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 13).unwrap()
        );
    }

    #[test]
    fn day_boundaries_follow_zone() {
        let r = iana();
        let d = NaiveDate::from_ymd_opt(2023, 12, 13).unwrap();
        assert_eq!(r.start_of_day(d, &zone("UTC")).unwrap(), 1_702_425_600);
        assert_eq!(
            r.start_of_day(d, &zone("America/New_York")).unwrap(),
            1_702_425_600 + 5 * 3600
        );
        assert_eq!(r.end_of_day(d, &zone("UTC")).unwrap(), 1_702_425_600 + 86_399);
    }

    // -- Fixed-offset double --

    #[test]
    fn fixed_offset_database_is_deterministic() {
        let db = FixedOffsetDatabase::new().with_zone("Test/Plus_Two", 2 * 3600);
        let r = TimezoneResolver::new(Arc::new(db));
        let z = zone("Test/Plus_Two");
        assert_eq!(r.to_utc("2023-12-13 02:00:00", &z).unwrap(), 1_702_425_600);
        assert_eq!(r.date_only(1_702_425_600, &z).unwrap(), "2023-12-13");
        assert_matches!(
            r.to_utc("2023-12-13 02:00:00", &zone("America/New_York")),
            Err(CoreError::InvalidTimezone(_))
        );
    }

    #[test]
    fn parse_calendar_date_strict() {
        assert_eq!(
            parse_calendar_date("2023-12-13").unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 13).unwrap()
        );
        assert_matches!(parse_calendar_date("2023/12/13"), Err(CoreError::InvalidDateFormat(_)));
        assert_matches!(
            parse_calendar_date("2023-12-13 00:00:00"),
            Err(CoreError::InvalidDateFormat(_))
        );
    }
}
