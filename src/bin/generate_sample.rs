//! Write a synthetic two-year bike sharing dataset (`hour.*` and `day.*`)
//! in CSV and Parquet form.
//!
//! Usage: `generate_sample [out_dir] [--seed N]` (defaults: `data`, 42).
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const DAYS: u32 = 731;

/// US federal holidays observed in 2011 and 2012.
const HOLIDAYS: [(i32, u32, u32); 20] = [
    (2011, 1, 17),
    (2011, 2, 21),
    (2011, 4, 15),
    (2011, 5, 30),
    (2011, 7, 4),
    (2011, 9, 5),
    (2011, 10, 10),
    (2011, 11, 11),
    (2011, 11, 24),
    (2011, 12, 26),
    (2012, 1, 2),
    (2012, 1, 16),
    (2012, 2, 20),
    (2012, 4, 16),
    (2012, 5, 28),
    (2012, 7, 4),
    (2012, 9, 3),
    (2012, 10, 8),
    (2012, 11, 22),
    (2012, 12, 25),
];

// ---------------------------------------------------------------------------
// Deterministic PRNG (splitmix64)
// ---------------------------------------------------------------------------

struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(1e-12);
        let u2 = self.uniform();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Poisson-like count around `mean`.
    fn count(&mut self, mean: f64) -> u32 {
        self.normal(mean, mean.sqrt()).round().max(0.0) as u32
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HourRow {
    instant: u32,
    dteday: String,
    season: u8,
    yr: u8,
    mnth: u32,
    hr: u32,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    temp: f64,
    atemp: f64,
    hum: f64,
    windspeed: f64,
    casual: u32,
    registered: u32,
    cnt: u32,
}

#[derive(Debug, Serialize)]
struct DayRow {
    instant: u32,
    dteday: String,
    season: u8,
    yr: u8,
    mnth: u32,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    temp: f64,
    atemp: f64,
    hum: f64,
    windspeed: f64,
    casual: u32,
    registered: u32,
    cnt: u32,
}

/// 1 = spring, 2 = summer, 3 = fall, 4 = winter, split at the solstices and
/// equinoxes.
fn season_of(date: NaiveDate) -> u8 {
    match (date.month(), date.day()) {
        (3, 21..) | (4..=5, _) | (6, 1..=20) => 1,
        (6, _) | (7..=8, _) | (9, 1..=22) => 2,
        (9, _) | (10..=11, _) | (12, 1..=20) => 3,
        _ => 4,
    }
}

fn is_holiday(date: NaiveDate) -> bool {
    HOLIDAYS
        .iter()
        .any(|&(y, m, d)| (date.year(), date.month(), date.day()) == (y, m, d))
}

/// Demand shape over the day: commute peaks on working days, a midday hump
/// otherwise.
fn hour_profile(hour: u32, working: bool) -> (f64, f64) {
    let h = hour as f64;
    let bump = |mu: f64, sigma: f64| (-(h - mu).powi(2) / (2.0 * sigma * sigma)).exp();
    let night = 0.03;
    if working {
        let registered = night + bump(8.0, 1.0) * 1.6 + bump(17.5, 1.3) * 1.9 + bump(13.0, 3.0) * 0.5;
        let casual = night + bump(15.0, 3.5) * 0.35;
        (casual, registered)
    } else {
        let registered = night + bump(13.5, 3.5) * 0.9;
        let casual = night + bump(14.0, 3.0) * 0.9;
        (casual, registered)
    }
}

fn weather_factor(weather: u8) -> f64 {
    match weather {
        1 => 1.0,
        2 => 0.85,
        3 => 0.45,
        _ => 0.15,
    }
}

fn next_weather(rng: &mut Rng, current: u8) -> u8 {
    let u = rng.uniform();
    match current {
        1 if u < 0.10 => 2,
        2 if u < 0.15 => 1,
        2 if u < 0.22 => 3,
        3 if u < 0.30 => 2,
        3 if u < 0.31 => 4,
        4 => 3,
        w => w,
    }
}

fn generate(seed: u64) -> Result<(Vec<HourRow>, Vec<DayRow>)> {
    let mut rng = Rng(seed);
    let first = NaiveDate::from_ymd_opt(2011, 1, 1).context("invalid start date")?;

    let mut hours = Vec::with_capacity(DAYS as usize * 24);
    let mut days = Vec::with_capacity(DAYS as usize);
    let mut weather = 1u8;

    for (offset, date) in first.iter_days().take(DAYS as usize).enumerate() {
        let yr: u8 = if date.year() == 2011 { 0 } else { 1 };
        let holiday = is_holiday(date);
        let weekday = date.weekday().num_days_from_sunday() as u8;
        let working = (1..=5).contains(&weekday) && !holiday;

        // Warmest in late July.
        let phase = (date.ordinal() as f64 - 205.0) / 365.0 * std::f64::consts::TAU;
        let day_temp = 0.5 + 0.3 * phase.cos() + rng.normal(0.0, 0.05);
        let day_hum = (0.62 + rng.normal(0.0, 0.12)).clamp(0.15, 1.0);
        let growth = if yr == 0 { 1.0 } else { 1.6 };
        let day_start = hours.len();

        for hour in 0..24u32 {
            weather = next_weather(&mut rng, weather);
            let diurnal = -0.06 * ((hour as f64 - 15.0) / 24.0 * std::f64::consts::TAU).cos();
            let temp = (day_temp + diurnal + rng.normal(0.0, 0.01)).clamp(0.02, 1.0);
            let atemp = (temp * 0.92 + 0.03 + rng.normal(0.0, 0.01)).clamp(0.0, 1.0);
            let hum = (day_hum + rng.normal(0.0, 0.03) + 0.05 * (weather as f64 - 1.0)).clamp(0.0, 1.0);
            let windspeed = (0.19 + rng.normal(0.0, 0.08)).clamp(0.0, 0.85);

            let (casual_shape, registered_shape) = hour_profile(hour, working);
            let climate = weather_factor(weather) * (0.35 + 1.3 * temp.min(0.75));
            let casual = rng.count(120.0 * casual_shape * climate * growth);
            let registered = rng.count(260.0 * registered_shape * climate * growth);

            hours.push(HourRow {
                instant: hours.len() as u32 + 1,
                dteday: date.to_string(),
                season: season_of(date),
                yr,
                mnth: date.month(),
                hr: hour,
                holiday: holiday as u8,
                weekday,
                workingday: working as u8,
                weathersit: weather,
                temp: round4(temp),
                atemp: round4(atemp),
                hum: round4(hum),
                windspeed: round4(windspeed),
                casual,
                registered,
                cnt: casual + registered,
            });
        }

        days.push(summarize_day(offset as u32 + 1, &hours[day_start..]));
    }
    Ok((hours, days))
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Daily row from one day's hours: means for the weather readings, sums for
/// the counts, the most frequent weather situation.
fn summarize_day(instant: u32, hours: &[HourRow]) -> DayRow {
    let n = hours.len() as f64;
    let mean = |f: fn(&HourRow) -> f64| round4(hours.iter().map(f).sum::<f64>() / n);
    let mut tally = [0usize; 5];
    for h in hours {
        tally[h.weathersit as usize] += 1;
    }
    let weathersit = (1..=4u8)
        .max_by_key(|&w| (tally[w as usize], std::cmp::Reverse(w)))
        .unwrap_or(1);
    let casual = hours.iter().map(|h| h.casual).sum::<u32>();
    let registered = hours.iter().map(|h| h.registered).sum::<u32>();
    let first = &hours[0];

    DayRow {
        instant,
        dteday: first.dteday.clone(),
        season: first.season,
        yr: first.yr,
        mnth: first.mnth,
        holiday: first.holiday,
        weekday: first.weekday,
        workingday: first.workingday,
        weathersit,
        temp: mean(|h| h.temp),
        atemp: mean(|h| h.atemp),
        hum: mean(|h| h.hum),
        windspeed: mean(|h| h.windspeed),
        casual,
        registered,
        cnt: casual + registered,
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn int_column<T>(rows: &[T], f: impl Fn(&T) -> i64) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Int64Array>())
}

fn float_column<T>(rows: &[T], f: impl Fn(&T) -> f64) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Float64Array>())
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn hour_columns(rows: &[HourRow]) -> Vec<(&'static str, ArrayRef)> {
    vec![
        ("instant", int_column(rows, |r| r.instant.into())),
        (
            "dteday",
            Arc::new(rows.iter().map(|r| Some(r.dteday.as_str())).collect::<StringArray>()),
        ),
        ("season", int_column(rows, |r| r.season.into())),
        ("yr", int_column(rows, |r| r.yr.into())),
        ("mnth", int_column(rows, |r| r.mnth.into())),
        ("hr", int_column(rows, |r| r.hr.into())),
        ("holiday", int_column(rows, |r| r.holiday.into())),
        ("weekday", int_column(rows, |r| r.weekday.into())),
        ("workingday", int_column(rows, |r| r.workingday.into())),
        ("weathersit", int_column(rows, |r| r.weathersit.into())),
        ("temp", float_column(rows, |r| r.temp)),
        ("atemp", float_column(rows, |r| r.atemp)),
        ("hum", float_column(rows, |r| r.hum)),
        ("windspeed", float_column(rows, |r| r.windspeed)),
        ("casual", int_column(rows, |r| r.casual.into())),
        ("registered", int_column(rows, |r| r.registered.into())),
        ("cnt", int_column(rows, |r| r.cnt.into())),
    ]
}

fn day_columns(rows: &[DayRow]) -> Vec<(&'static str, ArrayRef)> {
    vec![
        ("instant", int_column(rows, |r| r.instant.into())),
        (
            "dteday",
            Arc::new(rows.iter().map(|r| Some(r.dteday.as_str())).collect::<StringArray>()),
        ),
        ("season", int_column(rows, |r| r.season.into())),
        ("yr", int_column(rows, |r| r.yr.into())),
        ("mnth", int_column(rows, |r| r.mnth.into())),
        ("holiday", int_column(rows, |r| r.holiday.into())),
        ("weekday", int_column(rows, |r| r.weekday.into())),
        ("workingday", int_column(rows, |r| r.workingday.into())),
        ("weathersit", int_column(rows, |r| r.weathersit.into())),
        ("temp", float_column(rows, |r| r.temp)),
        ("atemp", float_column(rows, |r| r.atemp)),
        ("hum", float_column(rows, |r| r.hum)),
        ("windspeed", float_column(rows, |r| r.windspeed)),
        ("casual", int_column(rows, |r| r.casual.into())),
        ("registered", int_column(rows, |r| r.registered.into())),
        ("cnt", int_column(rows, |r| r.cnt.into())),
    ]
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn parse_args() -> Result<(PathBuf, u64)> {
    let mut out_dir = PathBuf::from("data");
    let mut seed = 42u64;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--seed" {
            let value = args.next().context("--seed needs a value")?;
            seed = value
                .parse()
                .with_context(|| format!("invalid seed {value:?}"))?;
        } else if arg.starts_with("--") {
            bail!("unknown option {arg}");
        } else {
            out_dir = PathBuf::from(arg);
        }
    }
    Ok((out_dir, seed))
}

fn main() -> Result<()> {
    env_logger::init();
    let (out_dir, seed) = parse_args()?;
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let (hours, days) = generate(seed)?;
    log::info!("Generated {} hourly and {} daily rows (seed {seed})", hours.len(), days.len());

    write_csv(&out_dir.join("hour.csv"), &hours)?;
    write_csv(&out_dir.join("day.csv"), &days)?;
    write_parquet(&out_dir.join("hour.parquet"), hour_columns(&hours))?;
    write_parquet(&out_dir.join("day.parquet"), day_columns(&days))?;

    println!(
        "Wrote {} hours over {} days to {}",
        hours.len(),
        days.len(),
        out_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_add_up_and_days_aggregate_hours() {
        let (hours, days) = generate(7).unwrap();
        assert_eq!(hours.len(), DAYS as usize * 24);
        assert_eq!(days.len(), DAYS as usize);
        assert!(hours.iter().all(|h| h.cnt == h.casual + h.registered));
        assert!(hours.iter().all(|h| (1..=4).contains(&h.season)));
        assert!(hours.iter().all(|h| (1..=4).contains(&h.weathersit)));

        let day_total: u64 = days.iter().map(|d| d.cnt as u64).sum();
        let hour_total: u64 = hours.iter().map(|h| h.cnt as u64).sum();
        assert_eq!(day_total, hour_total);
        assert_eq!(days.last().unwrap().dteday, "2012-12-31");
    }

    #[test]
    fn seasons_split_at_solstices() {
        let d = |m, day| NaiveDate::from_ymd_opt(2011, m, day).unwrap();
        assert_eq!(season_of(d(1, 1)), 4);
        assert_eq!(season_of(d(3, 20)), 4);
        assert_eq!(season_of(d(3, 21)), 1);
        assert_eq!(season_of(d(6, 21)), 2);
        assert_eq!(season_of(d(9, 23)), 3);
        assert_eq!(season_of(d(12, 21)), 4);
    }

    #[test]
    fn same_seed_same_data() {
        let (a, _) = generate(3).unwrap();
        let (b, _) = generate(3).unwrap();
        assert!(a.iter().zip(&b).all(|(x, y)| x.cnt == y.cnt && x.temp == y.temp));
    }
}
