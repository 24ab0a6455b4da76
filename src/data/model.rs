use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Coded categories – integer codes in the source files, enums in memory
// ---------------------------------------------------------------------------

/// An integer code that has no entry in its category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i64,
}

/// Season code: 1=Spring, 2=Summer, 3=Fall, 4=Winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "i64")]
pub enum Season {
    Spring = 1,
    Summer = 2,
    Fall = 3,
    Winter = 4,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl TryFrom<i64> for Season {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Season::Spring),
            2 => Ok(Season::Summer),
            3 => Ok(Season::Fall),
            4 => Ok(Season::Winter),
            _ => Err(UnknownCode { kind: "season", code }),
        }
    }
}

/// Weather situation code, increasing severity from 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "i64")]
pub enum WeatherSituation {
    Clear = 1,
    MistCloudy = 2,
    LightPrecipitation = 3,
    HeavyPrecipitation = 4,
}

impl WeatherSituation {
    pub const ALL: [WeatherSituation; 4] = [
        WeatherSituation::Clear,
        WeatherSituation::MistCloudy,
        WeatherSituation::LightPrecipitation,
        WeatherSituation::HeavyPrecipitation,
    ];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            WeatherSituation::Clear => "Clear/Partly Cloudy",
            WeatherSituation::MistCloudy => "Mist/Cloudy",
            WeatherSituation::LightPrecipitation => "Light Snow/Rain",
            WeatherSituation::HeavyPrecipitation => "Heavy Rain/Snow",
        }
    }
}

impl TryFrom<i64> for WeatherSituation {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(WeatherSituation::Clear),
            2 => Ok(WeatherSituation::MistCloudy),
            3 => Ok(WeatherSituation::LightPrecipitation),
            4 => Ok(WeatherSituation::HeavyPrecipitation),
            _ => Err(UnknownCode { kind: "weather situation", code }),
        }
    }
}

/// `yr` column: 0 for the first calendar year of the dataset, 1 for the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "i64")]
pub enum YearFlag {
    First = 0,
    Second = 1,
}

impl YearFlag {
    pub const ALL: [YearFlag; 2] = [YearFlag::First, YearFlag::Second];

    pub fn code(self) -> i64 {
        self as i64
    }

    /// Calendar year shown in chart legends.
    pub fn label(self) -> &'static str {
        match self {
            YearFlag::First => "2011",
            YearFlag::Second => "2012",
        }
    }
}

impl TryFrom<i64> for YearFlag {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(YearFlag::First),
            1 => Ok(YearFlag::Second),
            _ => Err(UnknownCode { kind: "year flag", code }),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for WeatherSituation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for YearFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a `dteday` cell. Accepts `YYYY-MM-DD` as well as ISO datetimes
/// (`2011-01-01T00:00:00.000`, `2011-01-01 00:00:00`), keeping the date part.
pub fn parse_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    let text = text.trim();
    let day = text
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
}

/// Milliseconds since the Unix epoch, as `df.to_json(orient='records')`
/// writes dates by default.
pub fn date_from_epoch_millis(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

struct DateVisitor;

impl de::Visitor<'_> for DateVisitor {
    type Value = NaiveDate;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a YYYY-MM-DD date, an ISO datetime or epoch milliseconds")
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<NaiveDate, E> {
        parse_date(text).map_err(|e| E::custom(format!("invalid date '{text}': {e}")))
    }

    fn visit_i64<E: de::Error>(self, ms: i64) -> Result<NaiveDate, E> {
        date_from_epoch_millis(ms).ok_or_else(|| E::custom(format!("epoch millis {ms} out of range")))
    }

    fn visit_u64<E: de::Error>(self, ms: u64) -> Result<NaiveDate, E> {
        let ms = i64::try_from(ms).map_err(|_| E::custom(format!("epoch millis {ms} out of range")))?;
        self.visit_i64(ms)
    }
}

fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DateVisitor)
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Pull both ends inside `bounds`.
    pub fn clamp_to(&self, bounds: &DateRange) -> DateRange {
        DateRange {
            start: self.start.clamp(bounds.start, bounds.end),
            end: self.end.clamp(bounds.start, bounds.end),
        }
    }

    /// Smallest range covering every date, `None` for an empty iterator.
    pub fn spanning(dates: impl IntoIterator<Item = NaiveDate>) -> Option<DateRange> {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(DateRange::new(d, d)),
            Some(r) => Some(DateRange::new(r.start.min(d), r.end.max(d))),
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Records – one row of the hour / day tables
// ---------------------------------------------------------------------------

/// One (date, hour-of-day) observation from the hourly table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HourlyRecord {
    pub instant: u32,
    #[serde(rename = "dteday", deserialize_with = "de_date")]
    pub date: NaiveDate,
    pub season: Season,
    #[serde(rename = "yr")]
    pub year: YearFlag,
    #[serde(rename = "mnth")]
    pub month: u32,
    #[serde(rename = "hr")]
    pub hour: u32,
    pub holiday: u8,
    pub weekday: u8,
    pub workingday: u8,
    #[serde(rename = "weathersit")]
    pub weather: WeatherSituation,
    /// Normalised temperature.
    pub temp: f64,
    /// Normalised feeling temperature.
    pub atemp: f64,
    pub hum: f64,
    pub windspeed: f64,
    pub casual: u32,
    pub registered: u32,
    /// casual + registered
    pub cnt: u32,
}

/// One day from the daily table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRecord {
    pub instant: u32,
    #[serde(rename = "dteday", deserialize_with = "de_date")]
    pub date: NaiveDate,
    pub season: Season,
    #[serde(rename = "yr")]
    pub year: YearFlag,
    #[serde(rename = "mnth")]
    pub month: u32,
    pub holiday: u8,
    pub weekday: u8,
    pub workingday: u8,
    #[serde(rename = "weathersit")]
    pub weather: WeatherSituation,
    pub temp: f64,
    pub atemp: f64,
    pub hum: f64,
    pub windspeed: f64,
    pub casual: u32,
    pub registered: u32,
    pub cnt: u32,
}

// ---------------------------------------------------------------------------
// NumericColumn – the numeric columns of the hourly table
// ---------------------------------------------------------------------------

/// Numeric hourly columns in file order, as used by the statistics table
/// and the correlation heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericColumn {
    Instant,
    Season,
    Year,
    Month,
    Hour,
    Holiday,
    Weekday,
    WorkingDay,
    Weather,
    Temp,
    ATemp,
    Humidity,
    WindSpeed,
    Casual,
    Registered,
    Count,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 16] = [
        NumericColumn::Instant,
        NumericColumn::Season,
        NumericColumn::Year,
        NumericColumn::Month,
        NumericColumn::Hour,
        NumericColumn::Holiday,
        NumericColumn::Weekday,
        NumericColumn::WorkingDay,
        NumericColumn::Weather,
        NumericColumn::Temp,
        NumericColumn::ATemp,
        NumericColumn::Humidity,
        NumericColumn::WindSpeed,
        NumericColumn::Casual,
        NumericColumn::Registered,
        NumericColumn::Count,
    ];

    /// Column header as it appears in the source files.
    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::Instant => "instant",
            NumericColumn::Season => "season",
            NumericColumn::Year => "yr",
            NumericColumn::Month => "mnth",
            NumericColumn::Hour => "hr",
            NumericColumn::Holiday => "holiday",
            NumericColumn::Weekday => "weekday",
            NumericColumn::WorkingDay => "workingday",
            NumericColumn::Weather => "weathersit",
            NumericColumn::Temp => "temp",
            NumericColumn::ATemp => "atemp",
            NumericColumn::Humidity => "hum",
            NumericColumn::WindSpeed => "windspeed",
            NumericColumn::Casual => "casual",
            NumericColumn::Registered => "registered",
            NumericColumn::Count => "cnt",
        }
    }

    pub fn value(self, rec: &HourlyRecord) -> f64 {
        match self {
            NumericColumn::Instant => rec.instant as f64,
            NumericColumn::Season => rec.season.code() as f64,
            NumericColumn::Year => rec.year.code() as f64,
            NumericColumn::Month => rec.month as f64,
            NumericColumn::Hour => rec.hour as f64,
            NumericColumn::Holiday => rec.holiday as f64,
            NumericColumn::Weekday => rec.weekday as f64,
            NumericColumn::WorkingDay => rec.workingday as f64,
            NumericColumn::Weather => rec.weather.code() as f64,
            NumericColumn::Temp => rec.temp,
            NumericColumn::ATemp => rec.atemp,
            NumericColumn::Humidity => rec.hum,
            NumericColumn::WindSpeed => rec.windspeed,
            NumericColumn::Casual => rec.casual as f64,
            NumericColumn::Registered => rec.registered as f64,
            NumericColumn::Count => rec.cnt as f64,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – both tables, immutable after load
// ---------------------------------------------------------------------------

/// The loaded hour and day tables plus the hourly date span.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailyRecord>,
    /// `[min(dteday), max(dteday)]` of the hourly table.
    pub span: DateRange,
}

impl Dataset {
    /// Build the handle; `None` when the hourly table has no rows.
    pub fn new(hourly: Vec<HourlyRecord>, daily: Vec<DailyRecord>) -> Option<Self> {
        let span = DateRange::spanning(hourly.iter().map(|r| r.date))?;
        Some(Dataset {
            hourly,
            daily,
            span,
        })
    }

    /// Span of the daily table, if it has rows.
    pub fn daily_span(&self) -> Option<DateRange> {
        DateRange::spanning(self.daily.iter().map(|r| r.date))
    }

}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Hourly row with plausible covariates; counts are consistent.
    pub fn hourly(
        date: NaiveDate,
        hour: u32,
        season: Season,
        weather: WeatherSituation,
        casual: u32,
        registered: u32,
    ) -> HourlyRecord {
        use chrono::Datelike;
        let year = if date.year() <= 2011 {
            YearFlag::First
        } else {
            YearFlag::Second
        };
        HourlyRecord {
            instant: date.ordinal() * 24 + hour,
            date,
            season,
            year,
            month: date.month(),
            hour,
            holiday: 0,
            weekday: date.weekday().num_days_from_sunday() as u8,
            workingday: 1,
            weather,
            temp: 0.2 + hour as f64 * 0.01,
            atemp: 0.25 + hour as f64 * 0.009,
            hum: 0.8 - hour as f64 * 0.01,
            windspeed: 0.1 + (hour % 5) as f64 * 0.02,
            casual,
            registered,
            cnt: casual + registered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::date;
    use super::*;

    #[test]
    fn codes_map_to_labels() {
        assert_eq!(Season::try_from(1).unwrap().label(), "Spring");
        assert_eq!(Season::try_from(4).unwrap().label(), "Winter");
        assert_eq!(WeatherSituation::try_from(2).unwrap().label(), "Mist/Cloudy");
        assert_eq!(YearFlag::try_from(1).unwrap().label(), "2012");
    }

    #[test]
    fn unmapped_codes_fail_explicitly() {
        let err = Season::try_from(5).unwrap_err();
        assert_eq!(err, UnknownCode { kind: "season", code: 5 });
        assert!(WeatherSituation::try_from(0).is_err());
        assert!(YearFlag::try_from(2).is_err());
        assert_eq!(err.to_string(), "unknown season code 5");
    }

    #[test]
    fn parses_plain_and_iso_dates() {
        assert_eq!(parse_date("2011-01-01").unwrap(), date(2011, 1, 1));
        assert_eq!(parse_date("2012-12-31T00:00:00.000").unwrap(), date(2012, 12, 31));
        assert_eq!(parse_date(" 2012-02-29 00:00:00").unwrap(), date(2012, 2, 29));
        assert!(parse_date("01/02/2011").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn epoch_millis_map_to_utc_date() {
        assert_eq!(date_from_epoch_millis(1_293_840_000_000), Some(date(2011, 1, 1)));
        assert_eq!(date_from_epoch_millis(1_356_912_000_000), Some(date(2012, 12, 31)));
        assert_eq!(date_from_epoch_millis(i64::MAX), None);
    }

    #[test]
    fn date_range_clamps_and_spans() {
        let bounds = DateRange::new(date(2011, 1, 1), date(2012, 12, 31));
        let wide = DateRange::new(date(2010, 6, 1), date(2013, 1, 1));
        assert_eq!(wide.clamp_to(&bounds), bounds);

        let span = DateRange::spanning([date(2011, 5, 1), date(2011, 2, 1), date(2011, 9, 1)]);
        assert_eq!(span, Some(DateRange::new(date(2011, 2, 1), date(2011, 9, 1))));
        assert_eq!(DateRange::spanning(Vec::new()), None);
    }

    #[test]
    fn dataset_requires_hourly_rows() {
        assert!(Dataset::new(Vec::new(), Vec::new()).is_none());
    }
}
