use auto_apply::config::AppConfig;
use auto_apply::error::AppError;
use auto_apply::workflows::outreach::{
    FsResumeStore, NewCompany, OutreachService, SmtpMailDispatcher, SqliteRecordStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ApiService = OutreachService<SqliteRecordStore, FsResumeStore, SmtpMailDispatcher>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the SQLite store, upload directory, and SMTP relay named in the config.
pub(crate) fn build_service(config: &AppConfig) -> Result<Arc<ApiService>, AppError> {
    let store = Arc::new(SqliteRecordStore::open(&config.storage.database_url)?);
    let resumes = Arc::new(FsResumeStore::create(config.storage.upload_dir.clone())?);
    let mailer = Arc::new(SmtpMailDispatcher::new(
        config.smtp.clone(),
        config.sender.clone(),
    ));
    Ok(Arc::new(OutreachService::new(
        store,
        resumes,
        mailer,
        config.sender.clone(),
    )))
}

pub(crate) fn demo_companies() -> Vec<NewCompany> {
    vec![
        NewCompany::new("Acme Corp", "nandanapramodak@gmail.com")
            .with_hr_name("nandana")
            .with_role("SDE Intern"),
        NewCompany::new("Globex", "rahul.verma@globex.com")
            .with_hr_name("Rahul Verma")
            .with_role("Frontend Engineer"),
    ]
}
