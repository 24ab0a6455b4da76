use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, AsArray, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{parse_date, DailyRecord, Dataset, HourlyRecord, UnknownCode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while loading the hour / day tables.
/// `row` counts data rows from 1 (the CSV header is not a row).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} row {row}: {message}")]
    Parse {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("{path:?} is not a readable table: {message}")]
    Format { path: PathBuf, message: String },

    #[error("{path:?} row {row}: cnt {cnt} != casual {casual} + registered {registered}")]
    CountMismatch {
        path: PathBuf,
        row: usize,
        casual: u32,
        registered: u32,
        cnt: u32,
    },

    #[error("{path:?} row {row}: {column} = {value} is out of range")]
    OutOfRange {
        path: PathBuf,
        row: usize,
        column: &'static str,
        value: i64,
    },

    #[error("{path:?} contains no rows")]
    Empty { path: PathBuf },

    #[error("unsupported file extension for {path:?} (expected .csv, .json or .parquet)")]
    UnsupportedFormat { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load both tables and build the immutable [`Dataset`] handle.
pub fn load_dataset(hourly_path: &Path, daily_path: &Path) -> Result<Dataset, LoadError> {
    let hourly: Vec<HourlyRecord> = load_table(hourly_path)?;
    let daily: Vec<DailyRecord> = load_table(daily_path)?;

    let dataset = Dataset::new(hourly, daily).ok_or_else(|| LoadError::Empty {
        path: hourly_path.to_path_buf(),
    })?;

    log::info!(
        "Loaded {} hourly rows ({}) and {} daily rows",
        dataset.hourly.len(),
        dataset.span,
        dataset.daily.len()
    );
    Ok(dataset)
}

/// Load one table, dispatching by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line
/// * `.json`    – `[{ "instant": 1, "dteday": "2011-01-01", ... }, ...]`
/// * `.parquet` – one column per field, as written by Pandas or Polars
pub fn load_table<T: TableRow>(path: &Path) -> Result<Vec<T>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    validate(path, &rows)?;
    log::debug!("{}: {} rows", path.display(), rows.len());
    Ok(rows)
}

/// Find `<stem>.csv`, `<stem>.parquet` or `<stem>.json` inside `dir`,
/// in that order of preference.
pub fn find_table(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["csv", "parquet", "pq", "json"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

// ---------------------------------------------------------------------------
// Row contract shared by both tables
// ---------------------------------------------------------------------------

/// A record type the loader knows how to read and check.
pub trait TableRow: DeserializeOwned + Sized {
    /// Build every row of a Parquet record batch.
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, CellError>;

    /// `(casual, registered, cnt)`
    fn counts(&self) -> (u32, u32, u32);

    /// First calendar column holding an impossible value, if any.
    fn out_of_range(&self) -> Option<(&'static str, i64)>;
}

impl TableRow for HourlyRecord {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, CellError> {
        let cols = RecordColumns::read(batch)?;
        let hr = int_column(batch, "hr")?;
        (0..batch.num_rows())
            .map(|row| -> Result<HourlyRecord, CellError> {
                Ok(HourlyRecord {
                    instant: uint_at(&cols.instant, row, "instant")?,
                    date: cols.dteday.at(row)?,
                    season: code_at(&cols.season, row, "season")?,
                    year: code_at(&cols.yr, row, "yr")?,
                    month: uint_at(&cols.mnth, row, "mnth")?,
                    hour: uint_at(&hr, row, "hr")?,
                    holiday: flag_at(&cols.holiday, row, "holiday")?,
                    weekday: flag_at(&cols.weekday, row, "weekday")?,
                    workingday: flag_at(&cols.workingday, row, "workingday")?,
                    weather: code_at(&cols.weathersit, row, "weathersit")?,
                    temp: float_at(&cols.temp, row, "temp")?,
                    atemp: float_at(&cols.atemp, row, "atemp")?,
                    hum: float_at(&cols.hum, row, "hum")?,
                    windspeed: float_at(&cols.windspeed, row, "windspeed")?,
                    casual: uint_at(&cols.casual, row, "casual")?,
                    registered: uint_at(&cols.registered, row, "registered")?,
                    cnt: uint_at(&cols.cnt, row, "cnt")?,
                })
            })
            .collect()
    }

    fn counts(&self) -> (u32, u32, u32) {
        (self.casual, self.registered, self.cnt)
    }

    fn out_of_range(&self) -> Option<(&'static str, i64)> {
        if !(1..=12).contains(&self.month) {
            return Some(("mnth", self.month as i64));
        }
        if self.hour > 23 {
            return Some(("hr", self.hour as i64));
        }
        None
    }
}

impl TableRow for DailyRecord {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, CellError> {
        let cols = RecordColumns::read(batch)?;
        (0..batch.num_rows())
            .map(|row| -> Result<DailyRecord, CellError> {
                Ok(DailyRecord {
                    instant: uint_at(&cols.instant, row, "instant")?,
                    date: cols.dteday.at(row)?,
                    season: code_at(&cols.season, row, "season")?,
                    year: code_at(&cols.yr, row, "yr")?,
                    month: uint_at(&cols.mnth, row, "mnth")?,
                    holiday: flag_at(&cols.holiday, row, "holiday")?,
                    weekday: flag_at(&cols.weekday, row, "weekday")?,
                    workingday: flag_at(&cols.workingday, row, "workingday")?,
                    weather: code_at(&cols.weathersit, row, "weathersit")?,
                    temp: float_at(&cols.temp, row, "temp")?,
                    atemp: float_at(&cols.atemp, row, "atemp")?,
                    hum: float_at(&cols.hum, row, "hum")?,
                    windspeed: float_at(&cols.windspeed, row, "windspeed")?,
                    casual: uint_at(&cols.casual, row, "casual")?,
                    registered: uint_at(&cols.registered, row, "registered")?,
                    cnt: uint_at(&cols.cnt, row, "cnt")?,
                })
            })
            .collect()
    }

    fn counts(&self) -> (u32, u32, u32) {
        (self.casual, self.registered, self.cnt)
    }

    fn out_of_range(&self) -> Option<(&'static str, i64)> {
        if !(1..=12).contains(&self.month) {
            return Some(("mnth", self.month as i64));
        }
        None
    }
}

fn validate<T: TableRow>(path: &Path, rows: &[T]) -> Result<(), LoadError> {
    for (i, rec) in rows.iter().enumerate() {
        let (casual, registered, cnt) = rec.counts();
        if casual as u64 + registered as u64 != cnt as u64 {
            return Err(LoadError::CountMismatch {
                path: path.to_path_buf(),
                row: i + 1,
                casual,
                registered,
                cnt,
            });
        }
        if let Some((column, value)) = rec.out_of_range() {
            return Err(LoadError::OutOfRange {
                path: path.to_path_buf(),
                row: i + 1,
                column,
                value,
            });
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with the column names of the UCI bike sharing files; extra
/// columns are ignored.
fn load_csv<T: TableRow>(path: &Path) -> Result<Vec<T>, LoadError> {
    let mut reader = csv::Reader::from_reader(open(path)?);

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<T>().enumerate() {
        let rec = result.map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            row: i + 1,
            message: e.to_string(),
        })?;
        rows.push(rec);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). `dteday` may be
/// ISO text or epoch milliseconds.
fn load_json<T: TableRow>(path: &Path) -> Result<Vec<T>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| LoadError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let JsonValue::Array(records) = root else {
        return Err(LoadError::Format {
            path: path.to_path_buf(),
            message: "expected top-level JSON array".into(),
        });
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| {
            serde_json::from_value(rec).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                row: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Integer columns may be any integer width, float columns any float width;
/// `dteday` may be Date32, a timestamp or a string.
fn load_parquet<T: TableRow>(path: &Path) -> Result<Vec<T>, LoadError> {
    let format_err = |message: String| LoadError::Format {
        path: path.to_path_buf(),
        message,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)
        .map_err(|e| format_err(format!("reading parquet metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| format_err(format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| format_err(format!("reading record batch: {e}")))?;
        let offset = rows.len();
        let mut batch_rows = T::from_batch(&batch).map_err(|e| match e.row {
            Some(row) => LoadError::Parse {
                path: path.to_path_buf(),
                row: offset + row + 1,
                message: e.message,
            },
            None => format_err(e.message),
        })?;
        rows.append(&mut batch_rows);
    }
    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// A problem with one cell (`row` set) or a whole column (`row` is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    pub row: Option<usize>,
    pub message: String,
}

impl CellError {
    fn column(message: String) -> Self {
        CellError { row: None, message }
    }

    fn cell(row: usize, message: String) -> Self {
        CellError {
            row: Some(row),
            message,
        }
    }
}

/// Columns present in both the hour and day tables, cast to uniform types.
struct RecordColumns {
    instant: Int64Array,
    dteday: DateColumn,
    season: Int64Array,
    yr: Int64Array,
    mnth: Int64Array,
    holiday: Int64Array,
    weekday: Int64Array,
    workingday: Int64Array,
    weathersit: Int64Array,
    temp: Float64Array,
    atemp: Float64Array,
    hum: Float64Array,
    windspeed: Float64Array,
    casual: Int64Array,
    registered: Int64Array,
    cnt: Int64Array,
}

impl RecordColumns {
    fn read(batch: &RecordBatch) -> Result<Self, CellError> {
        Ok(RecordColumns {
            instant: int_column(batch, "instant")?,
            dteday: DateColumn::read(batch, "dteday")?,
            season: int_column(batch, "season")?,
            yr: int_column(batch, "yr")?,
            mnth: int_column(batch, "mnth")?,
            holiday: int_column(batch, "holiday")?,
            weekday: int_column(batch, "weekday")?,
            workingday: int_column(batch, "workingday")?,
            weathersit: int_column(batch, "weathersit")?,
            temp: float_column(batch, "temp")?,
            atemp: float_column(batch, "atemp")?,
            hum: float_column(batch, "hum")?,
            windspeed: float_column(batch, "windspeed")?,
            casual: int_column(batch, "casual")?,
            registered: int_column(batch, "registered")?,
            cnt: int_column(batch, "cnt")?,
        })
    }
}

fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<arrow::array::ArrayRef, CellError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| CellError::column(format!("missing column '{name}'")))?;
    cast(col.as_ref(), to).map_err(|e| CellError::column(format!("column '{name}': {e}")))
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Int64Array, CellError> {
    let col = cast_column(batch, name, &DataType::Int64)?;
    Ok(col.as_primitive::<Int64Type>().clone())
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array, CellError> {
    let col = cast_column(batch, name, &DataType::Float64)?;
    Ok(col.as_primitive::<Float64Type>().clone())
}

fn int_at(col: &Int64Array, row: usize, name: &str) -> Result<i64, CellError> {
    if col.is_null(row) {
        return Err(CellError::cell(row, format!("null value in '{name}'")));
    }
    Ok(col.value(row))
}

fn uint_at(col: &Int64Array, row: usize, name: &str) -> Result<u32, CellError> {
    let v = int_at(col, row, name)?;
    u32::try_from(v).map_err(|_| CellError::cell(row, format!("'{name}' = {v} is not a count")))
}

fn flag_at(col: &Int64Array, row: usize, name: &str) -> Result<u8, CellError> {
    let v = int_at(col, row, name)?;
    u8::try_from(v).map_err(|_| CellError::cell(row, format!("'{name}' = {v} is not a small integer")))
}

fn code_at<C>(col: &Int64Array, row: usize, name: &str) -> Result<C, CellError>
where
    C: TryFrom<i64, Error = UnknownCode>,
{
    let v = int_at(col, row, name)?;
    C::try_from(v).map_err(|e| CellError::cell(row, e.to_string()))
}

fn float_at(col: &Float64Array, row: usize, name: &str) -> Result<f64, CellError> {
    if col.is_null(row) {
        return Err(CellError::cell(row, format!("null value in '{name}'")));
    }
    Ok(col.value(row))
}

/// `dteday` either as text to parse or as days since the Unix epoch.
enum DateColumn {
    Text(StringArray),
    Days(Date32Array),
}

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAY_CE: i32 = 719_163;

impl DateColumn {
    fn read(batch: &RecordBatch, name: &str) -> Result<Self, CellError> {
        let col = batch
            .column_by_name(name)
            .ok_or_else(|| CellError::column(format!("missing column '{name}'")))?;
        match col.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 => {
                let text = cast_column(batch, name, &DataType::Utf8)?;
                Ok(DateColumn::Text(text.as_string::<i32>().clone()))
            }
            _ => {
                let days = cast_column(batch, name, &DataType::Date32)?;
                Ok(DateColumn::Days(days.as_primitive::<Date32Type>().clone()))
            }
        }
    }

    fn at(&self, row: usize) -> Result<NaiveDate, CellError> {
        let null = || CellError::cell(row, "null value in 'dteday'".into());
        match self {
            DateColumn::Text(arr) => {
                if arr.is_null(row) {
                    return Err(null());
                }
                let text = arr.value(row);
                parse_date(text)
                    .map_err(|e| CellError::cell(row, format!("invalid date '{text}': {e}")))
            }
            DateColumn::Days(arr) => {
                if arr.is_null(row) {
                    return Err(null());
                }
                let days = arr.value(row);
                days.checked_add(UNIX_EPOCH_DAY_CE)
                    .and_then(NaiveDate::from_num_days_from_ce_opt)
                    .ok_or_else(|| CellError::cell(row, format!("date {days} out of range")))
            }
        }
    }
}
