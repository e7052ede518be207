//! Flat-file weather dataset: CSV rows keyed by a city column.
//!
//! Column names vary between exports, so each field is located through a list
//! of header aliases: exact header names first, then any header containing an
//! alias, in column order.

use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{config::DataConfig, text::parse_number};

const CITY: &[&str] = &["location_name", "location", "city", "name", "loc", "station"];
const DATE: &[&str] = &["date", "timestamp", "datetime", "last_updated"];
const TEMPERATURE: &[&str] = &["temp", "temperature", "temperature_celsius", "air_temperature"];
const HIGH: &[&str] = &["high", "temp_max", "tmax"];
const LOW: &[&str] = &["low", "temp_min", "tmin"];
const HUMIDITY: &[&str] = &["humidity", "rh", "rel_humidity"];
const WIND: &[&str] = &["wind", "wind_kph", "windspeed", "wind_speed", "wind_mph"];
const CONDITION: &[&str] =
    &["condition", "condition_text", "weather", "weather_description", "desc"];

/// One parsed dataset row. `city` is the canonical, original-case name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CityRow {
    pub city: Option<String>,
    pub date: Option<String>,
    pub temperature: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub humidity: Option<f64>,
    pub wind: Option<f64>,
    pub condition: Option<String>,
}

impl CityRow {
    /// Trimmed city name, `None` when missing or blank.
    pub fn city_name(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Read-only set of rows loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<CityRow>,
}

impl Dataset {
    pub fn new(rows: Vec<CityRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load every `*.csv` under `dir` (recursively, sorted by path).
    ///
    /// A file that fails to parse is logged and skipped; a missing directory
    /// yields an empty dataset.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "dataset directory not found");
            return Ok(Self::default());
        }

        let mut files = Vec::new();
        collect_csv_files(dir, &mut files)?;
        files.sort();

        let mut rows = Vec::new();
        for path in &files {
            match load_file(path) {
                Ok(mut parsed) => {
                    tracing::debug!(
                        file = %path.display(),
                        rows = parsed.len(),
                        "loaded dataset file"
                    );
                    rows.append(&mut parsed);
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping dataset file")
                }
            }
        }

        tracing::info!(files = files.len(), rows = rows.len(), "dataset loaded");
        Ok(Self { rows })
    }

    /// Dataset named by `[data] dataset_dir`, or an empty one.
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        match &config.dataset_dir {
            Some(dir) => Self::load_dir(dir),
            None => {
                tracing::info!("no dataset directory configured");
                Ok(Self::default())
            }
        }
    }
}

fn collect_csv_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read dataset directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            collect_csv_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            out.push(path);
        }
    }

    Ok(())
}

/// Parse a single CSV file.
pub fn load_file(path: &Path) -> Result<Vec<CityRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    parse_rows(file).with_context(|| format!("Failed to parse CSV file: {}", path.display()))
}

/// Parse CSV text with a header row into [`CityRow`]s.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<CityRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("CSV has no header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();
    let columns = Columns::detect(&headers);

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "skipping malformed CSV record");
                continue;
            }
        };
        rows.push(columns.row(&record));
    }

    Ok(rows)
}

/// Candidate column positions per field, in preference order.
#[derive(Debug, Default)]
struct Columns {
    city: Vec<usize>,
    date: Vec<usize>,
    temperature: Vec<usize>,
    high: Vec<usize>,
    low: Vec<usize>,
    humidity: Vec<usize>,
    wind: Vec<usize>,
    condition: Vec<usize>,
}

impl Columns {
    fn detect(headers: &[String]) -> Self {
        Self {
            city: candidates(headers, CITY),
            date: candidates(headers, DATE),
            temperature: candidates(headers, TEMPERATURE),
            high: candidates(headers, HIGH),
            low: candidates(headers, LOW),
            humidity: candidates(headers, HUMIDITY),
            wind: candidates(headers, WIND),
            condition: candidates(headers, CONDITION),
        }
    }

    fn row(&self, record: &csv::StringRecord) -> CityRow {
        let temperature = first_value(record, &self.temperature).and_then(parse_number);

        CityRow {
            city: first_value(record, &self.city).map(str::to_owned),
            date: first_value(record, &self.date).map(str::to_owned),
            temperature,
            high: first_value(record, &self.high).and_then(parse_number).or(temperature),
            low: first_value(record, &self.low).and_then(parse_number).or(temperature),
            humidity: first_value(record, &self.humidity).and_then(parse_number),
            wind: first_value(record, &self.wind).and_then(parse_number),
            condition: first_value(record, &self.condition).map(str::to_owned),
        }
    }
}

/// Exact alias matches first, then headers containing an alias.
fn candidates(headers: &[String], aliases: &[&str]) -> Vec<usize> {
    let mut out = Vec::new();

    for alias in aliases {
        if let Some(idx) = headers.iter().position(|h| h == alias) {
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
    }

    for alias in aliases {
        for (idx, header) in headers.iter().enumerate() {
            if header.contains(alias) && !out.contains(&idx) {
                out.push(idx);
            }
        }
    }

    out
}

fn first_value<'r>(record: &'r csv::StringRecord, columns: &[usize]) -> Option<&'r str> {
    columns
        .iter()
        .filter_map(|&idx| record.get(idx))
        .find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_with_simple_headers() {
        let csv = "city,temperature,humidity,wind,condition\n\
                   London,12.5,80,14.4,Light rain\n\
                   Paris,18,60,,Sunny\n";
        let rows = parse_rows(csv.as_bytes()).expect("csv should parse");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city.as_deref(), Some("London"));
        assert_eq!(rows[0].temperature, Some(12.5));
        assert_eq!(rows[0].high, Some(12.5));
        assert_eq!(rows[1].wind, None);
        assert_eq!(rows[1].condition.as_deref(), Some("Sunny"));
    }

    #[test]
    fn detects_aliased_headers_by_substring() {
        let csv = "country,location_name,temperature_celsius,wind_mph,wind_kph,humidity,\
                   condition_text\n\
                   France,Paris,21.0,6.5,10.4,55,Partly cloudy\n";
        let rows = parse_rows(csv.as_bytes()).expect("csv should parse");

        assert_eq!(rows[0].city.as_deref(), Some("Paris"));
        assert_eq!(rows[0].temperature, Some(21.0));
        assert_eq!(rows[0].wind, Some(10.4));
        assert_eq!(rows[0].condition.as_deref(), Some("Partly cloudy"));
    }

    #[test]
    fn blank_city_and_numeric_noise_are_tolerated() {
        let csv = "city,temp,humidity\n,10,50\nOslo,-3°C,n/a\n";
        let rows = parse_rows(csv.as_bytes()).expect("csv should parse");

        assert_eq!(rows[0].city_name(), None);
        assert_eq!(rows[1].temperature, Some(-3.0));
        assert_eq!(rows[1].humidity, None);
    }

    #[test]
    fn short_records_do_not_fail_the_file() {
        let csv = "city,temperature,condition\nRome\nMilan,25,Clear\n";
        let rows = parse_rows(csv.as_bytes()).expect("csv should parse");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].temperature, None);
        assert_eq!(rows[1].temperature, Some(25.0));
    }

    #[test]
    fn missing_directory_is_empty_dataset() {
        let ds = Dataset::load_dir(Path::new("/definitely/not/here"))
            .expect("missing dir is not an error");
        assert!(ds.is_empty());
    }

    #[test]
    fn load_dir_reads_nested_csv_files_in_order() {
        let root = std::env::temp_dir().join(format!("skycast-dataset-{}", std::process::id()));
        let nested = root.join("nested");
        fs::create_dir_all(&nested).expect("create temp dirs");
        fs::write(root.join("a.csv"), "city,temp\nAthens,30\n").expect("write a.csv");
        fs::write(nested.join("b.csv"), "city,temp\nBergen,9\n").expect("write b.csv");
        fs::write(root.join("notes.txt"), "ignored").expect("write notes");

        let ds = Dataset::load_dir(&root).expect("load dir");
        let cities: Vec<_> = ds.rows().iter().filter_map(CityRow::city_name).collect();
        assert_eq!(cities, vec!["Athens", "Bergen"]);

        fs::remove_dir_all(&root).ok();
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_loop_is_not_followed() {
        let root = std::env::temp_dir().join(format!("skycast-loop-{}", std::process::id()));
        fs::create_dir_all(&root).expect("create temp dir");
        fs::write(root.join("c.csv"), "city,temp\nCork,12\n").expect("write c.csv");
        std::os::unix::fs::symlink(&root, root.join("again")).expect("symlink");

        let ds = Dataset::load_dir(&root).expect("load dir");
        let cities: Vec<_> = ds.rows().iter().filter_map(CityRow::city_name).collect();
        assert_eq!(cities, vec!["Cork"]);

        fs::remove_dir_all(&root).ok();
    }
}
