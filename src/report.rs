use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{AnnualReportRecord, AttendanceSummary, Kategori, NormalizedSubmission};
use crate::progress::{self, ProgressLevel};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct KategoriTally {
    pub kategori: Kategori,
    pub entries: usize,
    pub total_setoran: u32,
}

pub fn summarize_by_kategori(entries: &[NormalizedSubmission]) -> Vec<KategoriTally> {
    let mut map: BTreeMap<&'static str, KategoriTally> = BTreeMap::new();

    for entry in entries {
        let kategori = entry.record.kategori;
        let key = match kategori {
            Kategori::Ziyadah => "ziyadah",
            Kategori::Murojaah => "murojaah",
        };
        let tally = map.entry(key).or_insert(KategoriTally {
            kategori,
            entries: 0,
            total_setoran: 0,
        });
        tally.entries += 1;
        tally.total_setoran = tally.total_setoran.saturating_add(entry.record.total_setoran);
    }

    let mut tallies: Vec<KategoriTally> = map.into_values().collect();
    tallies.sort_by(|a, b| b.entries.cmp(&a.entries));
    tallies
}

pub fn attendance_rate(summary: &AttendanceSummary) -> f64 {
    progress::percentage(summary.hadir, summary.total())
}

pub fn build_report(report: &AnnualReportRecord) -> String {
    let mut output = String::new();
    let mahasantri = &report.mahasantri;

    let _ = writeln!(output, "# Annual Hafalan Report {}", report.tahun);
    let _ = writeln!(
        output,
        "Generated for {} (NIM {}{})",
        mahasantri.nama,
        mahasantri.nim,
        mahasantri
            .angkatan
            .as_deref()
            .map(|angkatan| format!(", angkatan {angkatan}"))
            .unwrap_or_default()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");

    if report.absensi.is_empty() {
        let _ = writeln!(output, "No attendance recorded for this year.");
    } else {
        for summary in report.absensi.iter() {
            let rate = attendance_rate(summary);
            let _ = writeln!(
                output,
                "- {}: {}/{} hadir ({:.1}%, {}) izin {} sakit {} alpha {}",
                summary.waktu,
                summary.hadir,
                summary.total(),
                rate,
                ProgressLevel::from_percentage(rate),
                summary.izin,
                summary.sakit,
                summary.alpha
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Hafalan");

    if report.hafalan.is_empty() {
        let _ = writeln!(output, "No hafalan submitted this year.");
    } else {
        for summary in report.hafalan.iter() {
            let _ = writeln!(
                output,
                "- {}: {} setoran covering {} halaman",
                summary.kategori, summary.total_setoran, summary.total_halaman
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Semester Targets");

    if report.targets.is_empty() {
        let _ = writeln!(output, "No semester targets set.");
    } else {
        for target in report.targets.iter() {
            let pct = progress::percentage(target.capaian_halaman, target.target_halaman);
            let _ = writeln!(
                output,
                "- Semester {} {}: {}/{} halaman {} {:.1}% ({})",
                target.semester,
                target.tahun_ajaran,
                target.capaian_halaman,
                target.target_halaman,
                progress::render_bar(pct, BAR_WIDTH),
                pct,
                ProgressLevel::from_percentage(pct)
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        HafalanSummary, MahasantriRecord, SemesterTarget, SubmissionRecord, Waktu,
    };

    fn mahasantri() -> MahasantriRecord {
        MahasantriRecord {
            id: 3,
            nama: "Aisyah Putri".to_string(),
            nim: "2301045".to_string(),
            angkatan: Some("2023".to_string()),
            mentor_id: Some(2),
            gender: Some("P".to_string()),
        }
    }

    fn entry(kategori: Kategori, total_setoran: u32) -> NormalizedSubmission {
        NormalizedSubmission {
            record: SubmissionRecord {
                id: 1,
                mahasantri_id: 3,
                mentor_id: 2,
                juz: 2,
                halaman: "22".to_string(),
                total_setoran,
                kategori,
                waktu: Waktu::Shubuh,
                catatan: String::new(),
                created_at: None,
            },
            original_created_at: None,
            tanggal: String::new(),
        }
    }

    #[test]
    fn tallies_group_by_kategori() {
        let entries = vec![
            entry(Kategori::Murojaah, 4),
            entry(Kategori::Ziyadah, 1),
            entry(Kategori::Murojaah, 2),
        ];
        let tallies = summarize_by_kategori(&entries);
        assert_eq!(
            tallies,
            vec![
                KategoriTally {
                    kategori: Kategori::Murojaah,
                    entries: 2,
                    total_setoran: 6,
                },
                KategoriTally {
                    kategori: Kategori::Ziyadah,
                    entries: 1,
                    total_setoran: 1,
                },
            ]
        );
    }

    #[test]
    fn tallies_and_rates_survive_overflowing_counts() {
        let entries = vec![entry(Kategori::Ziyadah, u32::MAX), entry(Kategori::Ziyadah, 5)];
        assert_eq!(summarize_by_kategori(&entries)[0].total_setoran, u32::MAX);

        let summary = AttendanceSummary {
            waktu: Waktu::Shubuh,
            hadir: u32::MAX,
            izin: 1,
            sakit: 0,
            alpha: 0,
        };
        assert_eq!(attendance_rate(&summary), 100.0);
    }

    #[test]
    fn empty_sections_print_placeholders() {
        let report = AnnualReportRecord {
            mahasantri: mahasantri(),
            tahun: 2025,
            absensi: Vec::new(),
            hafalan: Vec::new(),
            targets: Vec::new(),
        };
        let output = build_report(&report);
        assert!(output.starts_with("# Annual Hafalan Report 2025\n"));
        assert!(output.contains("Generated for Aisyah Putri (NIM 2301045, angkatan 2023)"));
        assert!(output.contains("No attendance recorded for this year."));
        assert!(output.contains("No hafalan submitted this year."));
        assert!(output.contains("No semester targets set."));
    }

    #[test]
    fn sections_carry_rates_and_levels() {
        let report = AnnualReportRecord {
            mahasantri: mahasantri(),
            tahun: 2025,
            absensi: vec![AttendanceSummary {
                waktu: Waktu::Isya,
                hadir: 18,
                izin: 1,
                sakit: 1,
                alpha: 0,
            }],
            hafalan: vec![HafalanSummary {
                kategori: Kategori::Ziyadah,
                total_setoran: 40,
                total_halaman: 60,
            }],
            targets: vec![SemesterTarget {
                id: 1,
                mahasantri_id: 3,
                semester: "Ganjil".to_string(),
                tahun_ajaran: "2025/2026".to_string(),
                target_halaman: 40,
                capaian_halaman: 40,
            }],
        };
        let output = build_report(&report);
        assert!(output.contains("- Isya: 18/20 hadir (90.0%, high) izin 1 sakit 1 alpha 0"));
        assert!(output.contains("- Ziyadah: 40 setoran covering 60 halaman"));
        assert!(output.contains(
            "- Semester Ganjil 2025/2026: 40/40 halaman [####################] 100.0% (complete)"
        ));
    }
}
