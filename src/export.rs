use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::ExportError;
use crate::models::{AttendanceRecord, MahasantriRecord, MentorRecord, NormalizedSubmission};

pub const CSV_MIME_TYPE: &str = "text/csv";

pub type CellFormatter<T> = Box<dyn Fn(&Value, &T) -> String>;

/// One exported column: which serialized field to read and what to call it.
pub struct CsvColumn<T> {
    pub key: String,
    pub header: String,
    format: Option<CellFormatter<T>>,
}

impl<T> CsvColumn<T> {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Fn(&Value, &T) -> String + 'static) -> Self {
        self.format = Some(Box::new(format));
        self
    }

    fn cell(&self, serialized: &Value, row: &T) -> String {
        let value = serialized.get(&self.key).unwrap_or(&Value::Null);
        match &self.format {
            Some(format) => format(value, row),
            None => coerce(value),
        }
    }
}

/// Where a finished export file ends up.
pub trait DownloadSink {
    fn deliver(
        &self,
        file_name: &str,
        mime_type: &str,
        contents: &[u8],
    ) -> Result<PathBuf, ExportError>;
}

/// Saves exports into a local directory, creating it if needed.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(
        &self,
        file_name: &str,
        mime_type: &str,
        contents: &[u8],
    ) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(file_name);
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Delivery {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(|source| ExportError::Delivery {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), mime_type, bytes = contents.len(), "export delivered");
        Ok(path)
    }
}

/// Null and missing values render empty; strings render bare.
pub fn coerce(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}

pub fn render_csv<T: Serialize>(
    rows: &[T],
    columns: &[CsvColumn<T>],
) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|column| column.header.as_str()))?;

    for (row_index, row) in rows.iter().enumerate() {
        let serialized = serde_json::to_value(row)
            .map_err(|source| ExportError::Serialize { row_index, source })?;
        let fields: Vec<String> = columns
            .iter()
            .map(|column| column.cell(&serialized, row))
            .collect();
        writer.write_record(&fields)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

pub fn export_file_name(base_name: &str, stamp: Option<NaiveDate>) -> String {
    match stamp {
        Some(date) => format!("{}_{}.csv", base_name, date.format("%Y-%m-%d")),
        None => format!("{base_name}.csv"),
    }
}

pub fn export_csv<T: Serialize>(
    rows: &[T],
    columns: &[CsvColumn<T>],
    base_name: &str,
    stamp: Option<NaiveDate>,
    sink: &dyn DownloadSink,
) -> Result<PathBuf, ExportError> {
    let contents = render_csv(rows, columns)?;
    let file_name = export_file_name(base_name, stamp);
    let path = sink.deliver(&file_name, CSV_MIME_TYPE, contents.as_bytes())?;
    info!(rows = rows.len(), file = %path.display(), "CSV export written");
    Ok(path)
}

pub fn submission_columns() -> Vec<CsvColumn<NormalizedSubmission>> {
    vec![
        CsvColumn::new("tanggal", "Tanggal"),
        CsvColumn::new("waktu", "Waktu")
            .with_format(|_, row: &NormalizedSubmission| row.record.waktu.to_string()),
        CsvColumn::new("kategori", "Kategori")
            .with_format(|_, row: &NormalizedSubmission| row.record.kategori.to_string()),
        CsvColumn::new("juz", "Juz"),
        CsvColumn::new("halaman", "Halaman"),
        CsvColumn::new("total_setoran", "Total Setoran"),
        CsvColumn::new("catatan", "Catatan"),
    ]
}

pub fn attendance_columns() -> Vec<CsvColumn<AttendanceRecord>> {
    vec![
        CsvColumn::new("tanggal", "Tanggal"),
        CsvColumn::new("waktu", "Waktu")
            .with_format(|_, row: &AttendanceRecord| row.waktu.to_string()),
        CsvColumn::new("status", "Status")
            .with_format(|_, row: &AttendanceRecord| row.status.to_string()),
        CsvColumn::new("keterangan", "Keterangan"),
    ]
}

pub fn mahasantri_columns() -> Vec<CsvColumn<MahasantriRecord>> {
    vec![
        CsvColumn::new("nim", "NIM"),
        CsvColumn::new("nama", "Nama"),
        CsvColumn::new("angkatan", "Angkatan"),
        CsvColumn::new("gender", "Gender"),
    ]
}

pub fn mentor_columns() -> Vec<CsvColumn<MentorRecord>> {
    vec![
        CsvColumn::new("nama", "Nama"),
        CsvColumn::new("email", "Email"),
        CsvColumn::new("gender", "Gender"),
    ]
}
