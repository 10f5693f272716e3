use chrono::NaiveDate;

use crate::errors::ValidationError;
use crate::models::{NewAttendance, NewSubmission};

impl NewSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=30).contains(&self.juz) {
            return Err(ValidationError::JuzOutOfRange(self.juz));
        }
        if self.halaman.trim().is_empty() {
            return Err(ValidationError::EmptyHalaman);
        }
        if self.total_setoran == 0 {
            return Err(ValidationError::EmptySetoran);
        }
        Ok(())
    }
}

impl NewAttendance {
    pub fn validate(&self) -> Result<(), ValidationError> {
        NaiveDate::parse_from_str(&self.tanggal, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| ValidationError::InvalidTanggal(self.tanggal.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Kategori, Waktu};

    fn submission() -> NewSubmission {
        NewSubmission {
            mahasantri_id: 5,
            juz: 30,
            halaman: "585".to_string(),
            total_setoran: 1,
            kategori: Kategori::Ziyadah,
            waktu: Waktu::Isya,
            catatan: String::new(),
        }
    }

    #[test]
    fn accepts_a_complete_submission() {
        assert_eq!(submission().validate(), Ok(()));
    }

    #[test]
    fn rejects_each_bad_field() {
        let mut juz = submission();
        juz.juz = 31;
        assert_eq!(juz.validate(), Err(ValidationError::JuzOutOfRange(31)));
        juz.juz = 0;
        assert_eq!(juz.validate(), Err(ValidationError::JuzOutOfRange(0)));

        let mut halaman = submission();
        halaman.halaman = "  ".to_string();
        assert_eq!(halaman.validate(), Err(ValidationError::EmptyHalaman));

        let mut total = submission();
        total.total_setoran = 0;
        assert_eq!(total.validate(), Err(ValidationError::EmptySetoran));
    }

    #[test]
    fn attendance_needs_iso_date() {
        let mut attendance = NewAttendance {
            mahasantri_id: 5,
            tanggal: "2025-01-06".to_string(),
            waktu: Waktu::Shubuh,
            status: AttendanceStatus::Hadir,
            keterangan: None,
        };
        assert_eq!(attendance.validate(), Ok(()));

        attendance.tanggal = "06-01-2025".to_string();
        assert_eq!(
            attendance.validate(),
            Err(ValidationError::InvalidTanggal("06-01-2025".to_string()))
        );
    }
}
