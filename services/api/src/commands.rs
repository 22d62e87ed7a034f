use crate::infra::{build_service, demo_companies, ApiService};
use auto_apply::config::AppConfig;
use auto_apply::error::AppError;
use auto_apply::telemetry;
use auto_apply::workflows::outreach::{
    ApplicationLogEntry, CompanyId, MailDispatcher, NewCompany, OutreachService, RecordStore,
    ResumeRepository,
};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SendArgs {
    /// Identifier of the company to email
    pub(crate) company_id: i64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct HistoryArgs {
    /// Write the application log as CSV instead of a table
    #[arg(long)]
    pub(crate) csv: bool,
}

/// Installs the log subscriber and opens the configured stores for a one-shot command.
pub(crate) fn prepare(config: &AppConfig) -> Result<Arc<ApiService>, AppError> {
    telemetry::init(&config.telemetry)?;
    build_service(config)
}

pub(crate) fn run_seed() -> Result<(), AppError> {
    let service = prepare(&AppConfig::load()?)?;
    let inserted = seed_companies(&service, demo_companies())?;
    println!("Seeded {inserted} companies");
    Ok(())
}

pub(crate) fn run_send(args: SendArgs) -> Result<(), AppError> {
    let service = prepare(&AppConfig::load()?)?;
    let application = service.dispatch(CompanyId(args.company_id))?;
    let view = application.dispatch_view();
    match view.error {
        Some(error) => println!("Dispatch {}: {}", view.status.label(), error),
        None => println!("Dispatch {}", view.status.label()),
    }
    Ok(())
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let service = prepare(&AppConfig::load()?)?;
    let entries = service.applications()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.csv {
        write_history_csv(&entries, &mut out)?;
    } else {
        write_history_table(&entries, &mut out)?;
    }
    Ok(())
}

/// Adds each company whose name is not already stored; returns how many were inserted.
pub(crate) fn seed_companies<S, R, M>(
    service: &OutreachService<S, R, M>,
    companies: Vec<NewCompany>,
) -> Result<usize, AppError>
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let mut inserted = 0;
    for company in companies {
        let name = company.name.clone().unwrap_or_default();
        if service.company_named(name.trim())?.is_some() {
            tracing::debug!(name = %name, "company already seeded");
            continue;
        }
        service.add_company(company)?;
        inserted += 1;
    }
    Ok(inserted)
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    id: i64,
    company_id: i64,
    company: &'a str,
    sent_at: String,
    status: &'static str,
    error: &'a str,
}

impl<'a> From<&'a ApplicationLogEntry> for HistoryRow<'a> {
    fn from(entry: &'a ApplicationLogEntry) -> Self {
        Self {
            id: entry.id.0,
            company_id: entry.company_id.0,
            company: entry.company.as_deref().unwrap_or(""),
            sent_at: entry.sent_at.to_rfc3339(),
            status: entry.status.label(),
            error: entry.error.as_deref().unwrap_or(""),
        }
    }
}

pub(crate) fn write_history_csv<W: Write>(
    entries: &[ApplicationLogEntry],
    out: W,
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for entry in entries {
        writer
            .serialize(HistoryRow::from(entry))
            .map_err(io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_history_table<W: Write>(
    entries: &[ApplicationLogEntry],
    mut out: W,
) -> Result<(), AppError> {
    if entries.is_empty() {
        writeln!(out, "No applications recorded yet")?;
        return Ok(());
    }
    for entry in entries {
        let row = HistoryRow::from(entry);
        let company = if row.company.is_empty() {
            "(deleted company)"
        } else {
            row.company
        };
        write!(
            out,
            "#{} {} {} -> {}",
            row.id, row.sent_at, row.status, company
        )?;
        if !row.error.is_empty() {
            write!(out, " ({})", row.error)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
