use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod errors;
mod export;
mod models;
mod normalize;
mod progress;
mod report;
mod session;
mod validation;

use crate::api::ApiClient;
use crate::config::Config;
use crate::export::{CsvColumn, DirectorySink};
use crate::models::{AttendanceStatus, Kategori, NewAttendance, NewSubmission, Waktu};
use crate::progress::ProgressLevel;
use crate::session::{Role, Session, SessionStore};

#[derive(Parser)]
#[command(name = "hafalan-tracker")]
#[command(about = "Hafalan and absensi companion for mentors and mahasantri", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session locally
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// End the session and remove the local session file
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// List hafalan submissions, newest first
    Setoran {
        #[arg(long)]
        mahasantri_id: Option<i64>,
        /// Read a saved API response instead of calling the API
        #[arg(long)]
        input: Option<PathBuf>,
        /// Export the listing to <BASE>.csv
        #[arg(long, value_name = "BASE")]
        export: Option<String>,
        /// Append today's date to the export file name
        #[arg(long)]
        stamp: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Record a hafalan submission (mentor only)
    SetoranAdd {
        #[arg(long)]
        mahasantri_id: i64,
        #[arg(long)]
        juz: u8,
        #[arg(long)]
        halaman: String,
        #[arg(long, default_value_t = 1)]
        total: u32,
        #[arg(long, value_enum)]
        kategori: Kategori,
        #[arg(long, value_enum)]
        waktu: Waktu,
        #[arg(long, default_value = "")]
        catatan: String,
    },
    /// List attendance records
    Absensi {
        #[arg(long)]
        mahasantri_id: Option<i64>,
        #[arg(long, value_name = "BASE")]
        export: Option<String>,
        #[arg(long)]
        stamp: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Record attendance for a prayer-time session (mentor only)
    AbsensiAdd {
        #[arg(long)]
        mahasantri_id: i64,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        tanggal: String,
        #[arg(long, value_enum)]
        waktu: Waktu,
        #[arg(long, value_enum)]
        status: AttendanceStatus,
        #[arg(long)]
        keterangan: Option<String>,
    },
    /// List registered mahasantri (mentor only)
    Mahasantri {
        #[arg(long, value_name = "BASE")]
        export: Option<String>,
        #[arg(long)]
        stamp: bool,
    },
    /// List mentors
    Mentor {
        #[arg(long, value_name = "BASE")]
        export: Option<String>,
        #[arg(long)]
        stamp: bool,
    },
    /// Show semester target progress
    Target {
        #[arg(long)]
        mahasantri_id: Option<i64>,
    },
    /// Generate a markdown annual report card
    Report {
        #[arg(long)]
        mahasantri_id: Option<i64>,
        #[arg(long)]
        tahun: Option<i32>,
        #[arg(long, default_value = "rapor.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    let store = SessionStore::new(config.session_file.clone());

    match cli.command {
        Commands::Login { username, password } => {
            let client = api_client(&config)?;
            let session = client.login(&username, &password).await?;
            store.save(&session)?;
            info!(user = session.user.id, "logged in");
            println!(
                "Logged in as {} ({}). Session stored in {}.",
                session.user.nama,
                session.user.role.label(),
                store.path().display()
            );
        }
        Commands::Logout => match store.load()? {
            Some(session) => {
                let client = api_client(&config)?;
                if let Err(err) = client.logout(&session).await {
                    warn!("remote logout failed: {err}");
                }
                store.clear()?;
                println!("Logged out.");
            }
            None => println!("No active session."),
        },
        Commands::Whoami => {
            let session = store.require()?;
            println!(
                "{} ({}), user id {}",
                session.user.nama,
                session.user.role.label(),
                session.user.id
            );
            if let Some(email) = session.user.email.as_deref() {
                println!("Email: {email}");
            }
        }
        Commands::Setoran {
            mahasantri_id,
            input,
            export,
            stamp,
            limit,
        } => {
            let records = match input {
                Some(path) => {
                    let body = std::fs::read(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    api::decode_envelope(&path.display().to_string(), 200, &body)?
                }
                None => {
                    let session = store.require()?;
                    let scope = session.scope_for(mahasantri_id)?;
                    let client = api_client(&config)?;
                    client.submissions(&session, scope).await?
                }
            };

            let mut entries = normalize::normalize_submissions(records, &config.timezone);
            normalize::sort_newest_first(&mut entries);

            if entries.is_empty() {
                println!("No setoran recorded.");
            } else {
                println!("Latest setoran:");
                for entry in entries.iter().take(limit) {
                    let record = &entry.record;
                    println!(
                        "- {} | {} {} | juz {} halaman {} | {} setoran{}",
                        entry.tanggal,
                        record.kategori,
                        record.waktu,
                        record.juz,
                        record.halaman,
                        record.total_setoran,
                        if record.catatan.is_empty() {
                            String::new()
                        } else {
                            format!(" | {}", record.catatan)
                        }
                    );
                }
                for tally in report::summarize_by_kategori(&entries) {
                    println!(
                        "{}: {} entries, {} setoran",
                        tally.kategori, tally.entries, tally.total_setoran
                    );
                }
            }

            if let Some(base) = export {
                write_export(&config, &entries, &export::submission_columns(), &base, stamp)?;
            }
        }
        Commands::SetoranAdd {
            mahasantri_id,
            juz,
            halaman,
            total,
            kategori,
            waktu,
            catatan,
        } => {
            let session = mentor_session(&store)?;
            let submission = NewSubmission {
                mahasantri_id,
                juz,
                halaman,
                total_setoran: total,
                kategori,
                waktu,
                catatan,
            };
            submission.validate()?;
            let client = api_client(&config)?;
            let created = client.create_submission(&session, &submission).await?;
            println!(
                "Recorded setoran {} for mahasantri {}: juz {} halaman {}.",
                created.id, created.mahasantri_id, created.juz, created.halaman
            );
        }
        Commands::Absensi {
            mahasantri_id,
            export,
            stamp,
            limit,
        } => {
            let session = store.require()?;
            let scope = session.scope_for(mahasantri_id)?;
            let client = api_client(&config)?;
            let records = client.attendance(&session, scope).await?;

            if records.is_empty() {
                println!("No absensi recorded.");
            } else {
                for record in records.iter().take(limit) {
                    println!(
                        "- {} {} | mahasantri {} | {}{}",
                        record.tanggal,
                        record.waktu,
                        record.mahasantri_id,
                        record.status,
                        record
                            .keterangan
                            .as_deref()
                            .map(|note| format!(" ({note})"))
                            .unwrap_or_default()
                    );
                }
            }

            if let Some(base) = export {
                write_export(&config, &records, &export::attendance_columns(), &base, stamp)?;
            }
        }
        Commands::AbsensiAdd {
            mahasantri_id,
            tanggal,
            waktu,
            status,
            keterangan,
        } => {
            let session = mentor_session(&store)?;
            let attendance = NewAttendance {
                mahasantri_id,
                tanggal,
                waktu,
                status,
                keterangan,
            };
            attendance.validate()?;
            let client = api_client(&config)?;
            let created = client.create_attendance(&session, &attendance).await?;
            println!(
                "Recorded {} {} as {} for mahasantri {}.",
                created.tanggal, created.waktu, created.status, created.mahasantri_id
            );
        }
        Commands::Mahasantri { export, stamp } => {
            let session = mentor_session(&store)?;
            let client = api_client(&config)?;
            let records = client.mahasantri(&session).await?;

            if records.is_empty() {
                println!("No mahasantri registered.");
            }
            for record in records.iter() {
                println!(
                    "- {} {} (angkatan {})",
                    record.nim,
                    record.nama,
                    record.angkatan.as_deref().unwrap_or("-")
                );
            }

            if let Some(base) = export {
                write_export(&config, &records, &export::mahasantri_columns(), &base, stamp)?;
            }
        }
        Commands::Mentor { export, stamp } => {
            let session = store.require()?;
            let client = api_client(&config)?;
            let records = client.mentors(&session).await?;

            if records.is_empty() {
                println!("No mentors registered.");
            }
            for record in records.iter() {
                println!("- {} <{}>", record.nama, record.email);
            }

            if let Some(base) = export {
                write_export(&config, &records, &export::mentor_columns(), &base, stamp)?;
            }
        }
        Commands::Target { mahasantri_id } => {
            let session = store.require()?;
            let id = required_scope(&session, mahasantri_id)?;
            let client = api_client(&config)?;
            let targets = client.targets(&session, id).await?;

            if targets.is_empty() {
                println!("No semester targets set.");
            }
            for target in targets.iter() {
                let pct = progress::percentage(target.capaian_halaman, target.target_halaman);
                println!(
                    "Semester {} {}: {}/{} halaman {} {:.1}% ({})",
                    target.semester,
                    target.tahun_ajaran,
                    target.capaian_halaman,
                    target.target_halaman,
                    progress::render_bar(pct, 20),
                    pct,
                    ProgressLevel::from_percentage(pct)
                );
            }
        }
        Commands::Report {
            mahasantri_id,
            tahun,
            out,
        } => {
            let session = store.require()?;
            let id = required_scope(&session, mahasantri_id)?;
            let tahun = tahun.unwrap_or_else(|| today(&config).year());
            let client = api_client(&config)?;
            let annual = client.annual_report(&session, id, tahun).await?;
            let rendered = report::build_report(&annual);
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn api_client(config: &Config) -> anyhow::Result<ApiClient> {
    ApiClient::new(config.api_url()?, config.http_timeout).context("failed to build HTTP client")
}

fn mentor_session(store: &SessionStore) -> anyhow::Result<Session> {
    let session = store.require()?;
    session.require_role(Role::Mentor)?;
    Ok(session)
}

fn required_scope(session: &Session, requested: Option<i64>) -> anyhow::Result<i64> {
    session
        .scope_for(requested)?
        .context("--mahasantri-id is required for mentors")
}

fn today(config: &Config) -> NaiveDate {
    Utc::now().with_timezone(&config.timezone).date_naive()
}

fn write_export<T: Serialize>(
    config: &Config,
    rows: &[T],
    columns: &[CsvColumn<T>],
    base: &str,
    stamp: bool,
) -> anyhow::Result<()> {
    let sink = DirectorySink::new(config.export_dir.clone());
    let stamp = stamp.then(|| today(config));
    let path = export::export_csv(rows, columns, base, stamp, &sink)
        .with_context(|| format!("export of {base} failed"))?;
    println!("Exported {} rows to {}.", rows.len(), path.display());
    Ok(())
}
