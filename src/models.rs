use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Kategori {
    Ziyadah,
    Murojaah,
}

impl fmt::Display for Kategori {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kategori::Ziyadah => write!(f, "Ziyadah"),
            Kategori::Murojaah => write!(f, "Murojaah"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Waktu {
    Shubuh,
    Isya,
}

impl fmt::Display for Waktu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waktu::Shubuh => write!(f, "Shubuh"),
            Waktu::Isya => write!(f, "Isya"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Hadir,
    Izin,
    Sakit,
    Alpha,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Hadir => write!(f, "Hadir"),
            AttendanceStatus::Izin => write!(f, "Izin"),
            AttendanceStatus::Sakit => write!(f, "Sakit"),
            AttendanceStatus::Alpha => write!(f, "Alpha"),
        }
    }
}

/// A hafalan (setoran) log entry as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub mahasantri_id: i64,
    pub mentor_id: i64,
    pub juz: u8,
    pub halaman: String,
    pub total_setoran: u32,
    pub kategori: Kategori,
    pub waktu: Waktu,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub catatan: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A submission with its parsed sort key and display date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSubmission {
    #[serde(flatten)]
    pub record: SubmissionRecord,
    pub original_created_at: Option<DateTime<Utc>>,
    pub tanggal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub mahasantri_id: i64,
    pub mentor_id: i64,
    pub tanggal: String,
    pub waktu: Waktu,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub keterangan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MahasantriRecord {
    pub id: i64,
    pub nama: String,
    pub nim: String,
    #[serde(default)]
    pub angkatan: Option<String>,
    #[serde(default)]
    pub mentor_id: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorRecord {
    pub id: i64,
    pub nama: String,
    pub email: String,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterTarget {
    pub id: i64,
    pub mahasantri_id: i64,
    pub semester: String,
    pub tahun_ajaran: String,
    pub target_halaman: u32,
    pub capaian_halaman: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub waktu: Waktu,
    pub hadir: u32,
    pub izin: u32,
    pub sakit: u32,
    pub alpha: u32,
}

impl AttendanceSummary {
    pub fn total(&self) -> u32 {
        self.hadir
            .saturating_add(self.izin)
            .saturating_add(self.sakit)
            .saturating_add(self.alpha)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HafalanSummary {
    pub kategori: Kategori,
    pub total_setoran: u32,
    pub total_halaman: u32,
}

/// Computed rapor for one mahasantri and one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReportRecord {
    pub mahasantri: MahasantriRecord,
    pub tahun: i32,
    #[serde(default)]
    pub absensi: Vec<AttendanceSummary>,
    #[serde(default)]
    pub hafalan: Vec<HafalanSummary>,
    #[serde(default)]
    pub targets: Vec<SemesterTarget>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub mahasantri_id: i64,
    pub juz: u8,
    pub halaman: String,
    pub total_setoran: u32,
    pub kategori: Kategori,
    pub waktu: Waktu,
    pub catatan: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAttendance {
    pub mahasantri_id: i64,
    pub tanggal: String,
    pub waktu: Waktu,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keterangan: Option<String>,
}

/// Response wrapper every API endpoint uses.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_accepts_null_catatan_and_missing_timestamp() {
        let record: SubmissionRecord = serde_json::from_value(json!({
            "id": 7,
            "mahasantri_id": 3,
            "mentor_id": 1,
            "juz": 30,
            "halaman": "582-583",
            "total_setoran": 2,
            "kategori": "murojaah",
            "waktu": "isya",
            "catatan": null
        }))
        .expect("record decodes");

        assert_eq!(record.catatan, "");
        assert_eq!(record.created_at, None);
        assert_eq!(record.kategori, Kategori::Murojaah);
        assert_eq!(record.waktu, Waktu::Isya);
    }

    #[test]
    fn unknown_kategori_is_rejected() {
        let result = serde_json::from_value::<SubmissionRecord>(json!({
            "id": 7,
            "mahasantri_id": 3,
            "mentor_id": 1,
            "juz": 30,
            "halaman": "1",
            "total_setoran": 1,
            "kategori": "tilawah",
            "waktu": "isya"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn attendance_summary_totals_every_status() {
        let summary = AttendanceSummary {
            waktu: Waktu::Shubuh,
            hadir: 20,
            izin: 2,
            sakit: 1,
            alpha: 3,
        };
        assert_eq!(summary.total(), 26);
    }

    #[test]
    fn attendance_total_saturates_on_huge_counts() {
        let summary = AttendanceSummary {
            waktu: Waktu::Isya,
            hadir: u32::MAX,
            izin: 1,
            sakit: 0,
            alpha: 0,
        };
        assert_eq!(summary.total(), u32::MAX);
    }
}
