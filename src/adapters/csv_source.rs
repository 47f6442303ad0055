//! CSV adapter: Implementation of `DatasetSource` for historical mission tables.
//!
//! Headers are matched case-insensitively with `_`, `-` and spaces ignored,
//! so `Space_time`, `space time` and `SPACE-TIME` all land in the same column.
//! Missing columns simply produce `None` fields.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::RawRecord;
use crate::ports::DatasetSource;

/// Error type for dataset loading.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset has no {0} column")]
    MissingColumn(&'static str),
}

/// Accepted header spellings per field, already normalized.
const NAME: &[&str] = &["name", "astronaut", "astronautname"];
const AGE: &[&str] = &["age"];
const NATIONALITY: &[&str] = &["nationality", "country", "agency"];
const MISSIONS: &[&str] = &["missions", "missioncount", "totalmissions"];
const SPACE_TIME: &[&str] = &["spacetime", "spacetimehours", "hoursinspace"];
const MISSION_TYPE: &[&str] = &["missiontype"];
const ROLE: &[&str] = &["role", "profession"];
const LAUNCH_WEATHER: &[&str] = &["launchweather", "weather"];
const MANUFACTURER: &[&str] = &["manufacturer", "vehiclemanufacturer"];
const MISSION_COMPLEXITY: &[&str] = &["missioncomplexity", "complexity"];
const SUCCESS_PROBABILITY: &[&str] = &["successprobability"];
const MILITARY: &[&str] = &["military"];
const DURATION: &[&str] = &["missiondurationhours", "durationhours", "duration"];

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolved column positions for one file.
#[derive(Debug, Default)]
struct ColumnMap {
    name: Option<usize>,
    age: Option<usize>,
    nationality: Option<usize>,
    missions: Option<usize>,
    space_time: Option<usize>,
    mission_type: Option<usize>,
    role: Option<usize>,
    launch_weather: Option<usize>,
    manufacturer: Option<usize>,
    mission_complexity: Option<usize>,
    success_probability: Option<usize>,
    military: Option<usize>,
    duration_hours: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Self {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias))
        };

        Self {
            name: find(NAME),
            age: find(AGE),
            nationality: find(NATIONALITY),
            missions: find(MISSIONS),
            space_time: find(SPACE_TIME),
            mission_type: find(MISSION_TYPE),
            role: find(ROLE),
            launch_weather: find(LAUNCH_WEATHER),
            manufacturer: find(MANUFACTURER),
            mission_complexity: find(MISSION_COMPLEXITY),
            success_probability: find(SUCCESS_PROBABILITY),
            military: find(MILITARY),
            duration_hours: find(DURATION),
        }
    }

    fn extract(&self, row: &StringRecord) -> RawRecord {
        let get = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        RawRecord {
            name: get(self.name),
            age: get(self.age),
            nationality: get(self.nationality),
            missions: get(self.missions),
            space_time: get(self.space_time),
            mission_type: get(self.mission_type),
            role: get(self.role),
            launch_weather: get(self.launch_weather),
            manufacturer: get(self.manufacturer),
            mission_complexity: get(self.mission_complexity),
            success_probability: get(self.success_probability),
            military: get(self.military),
            duration_hours: get(self.duration_hours),
        }
    }
}

/// Dataset source reading a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    path: PathBuf,
}

impl CsvDatasetSource {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for CsvDatasetSource {
    type Error = DatasetError;

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self) -> Result<Vec<RawRecord>, Self::Error> {
        if !self.path.exists() {
            return Err(DatasetError::NotFound(self.path.clone()));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(&self.path)?;

        let columns = ColumnMap::resolve(reader.headers()?);
        if columns.name.is_none() {
            return Err(DatasetError::MissingColumn("name"));
        }
        if columns.duration_hours.is_none() {
            return Err(DatasetError::MissingColumn("mission duration"));
        }

        let mut rows = Vec::new();
        let mut malformed = 0usize;
        for result in reader.records() {
            match result {
                Ok(row) => rows.push(columns.extract(&row)),
                Err(e) => {
                    malformed += 1;
                    tracing::debug!("Skipping malformed CSV row: {}", e);
                }
            }
        }

        if malformed > 0 {
            tracing::warn!("Skipped {} malformed rows in {}", malformed, self.path.display());
        }
        tracing::info!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_header_aliases_are_case_insensitive() {
        let file = write_csv(
            "Name,AGE,Nationality,Missions,Space_time,Mission_Duration_Hours\n\
             Ada,41,USA,2,300.5,250\n",
        );
        let rows = CsvDatasetSource::new(file.path()).load().expect("load");

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.name.as_deref(), Some("Ada"));
        assert_eq!(row.age.as_deref(), Some("41"));
        assert_eq!(row.space_time.as_deref(), Some("300.5"));
        assert_eq!(row.duration_hours.as_deref(), Some("250"));
        assert_eq!(row.role, None);
    }

    #[test]
    fn test_blank_cells_become_none() {
        let file = write_csv("name,age,duration_hours\nBo,,120\n");
        let rows = CsvDatasetSource::new(file.path()).load().expect("load");
        assert_eq!(rows[0].age, None);
        assert_eq!(rows[0].duration_hours.as_deref(), Some("120"));
    }

    #[test]
    fn test_missing_file() {
        let source = CsvDatasetSource::new("/nonexistent/astronauts.csv");
        assert!(matches!(source.load(), Err(DatasetError::NotFound(_))));
    }

    #[test]
    fn test_missing_label_column() {
        let file = write_csv("name,age\nCy,30\n");
        let err = CsvDatasetSource::new(file.path()).load();
        assert!(matches!(err, Err(DatasetError::MissingColumn(_))));
    }
}
