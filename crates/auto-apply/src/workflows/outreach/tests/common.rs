use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::SenderConfig;
use crate::workflows::outreach::clock::Clock;
use crate::workflows::outreach::domain::{
    Application, ApplicationId, ApplicationLogEntry, Company, CompanyId, NewApplication,
    NewCompany,
};
use crate::workflows::outreach::mail::{DispatchError, MailDispatcher};
use crate::workflows::outreach::repository::{RecordStore, RepositoryError};
use crate::workflows::outreach::resume::FsResumeStore;
use crate::workflows::outreach::{outreach_router, OutreachService};

pub(super) type TestService = OutreachService<MemoryStore, FsResumeStore, StubMailer>;

pub(super) fn sender() -> SenderConfig {
    SenderConfig {
        name: "Jane Candidate".to_string(),
        email: "jane@example.com".to_string(),
    }
}

pub(super) fn acme() -> NewCompany {
    NewCompany::new("Acme Corp", "hr@acme.com")
        .with_hr_name("Priya")
        .with_role("SDE Intern")
}

pub(super) fn instant(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 30, 0)
        .single()
        .expect("valid timestamp")
}

/// Everything a workflow test needs, with the upload directory kept alive.
pub(super) struct Fixture {
    pub(super) _dir: tempfile::TempDir,
    pub(super) store: Arc<MemoryStore>,
    pub(super) resumes: Arc<FsResumeStore>,
    pub(super) mailer: Arc<StubMailer>,
    pub(super) service: Arc<TestService>,
}

impl Fixture {
    pub(super) fn router(&self) -> axum::Router {
        outreach_router(self.service.clone())
    }

    pub(super) fn upload_dir(&self) -> &Path {
        self.resumes.dir()
    }
}

pub(super) fn build_service() -> Fixture {
    build_service_with_mailer(StubMailer::accepting())
}

pub(super) fn build_service_with_mailer(mailer: StubMailer) -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(MemoryStore::default());
    let resumes = Arc::new(FsResumeStore::new(dir.path().join("uploads")));
    let mailer = Arc::new(mailer);
    let clock = Arc::new(StepClock::starting_at(instant(9)));
    let service = Arc::new(OutreachService::with_clock(
        store.clone(),
        resumes.clone(),
        mailer.clone(),
        sender(),
        clock,
    ));
    Fixture {
        _dir: dir,
        store,
        resumes,
        mailer,
        service,
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    companies: Mutex<Vec<Company>>,
    applications: Mutex<Vec<Application>>,
}

impl MemoryStore {
    pub(super) fn application_count(&self) -> usize {
        self.applications.lock().unwrap().len()
    }
}

impl RecordStore for MemoryStore {
    fn create_company(&self, company: NewCompany) -> Result<Company, RepositoryError> {
        let valid = company.validate()?;
        let mut companies = self.companies.lock().unwrap();
        let company = valid.into_company(CompanyId(companies.len() as i64 + 1));
        companies.push(company.clone());
        Ok(company)
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(self.companies.lock().unwrap().clone())
    }

    fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|company| company.id == id)
            .cloned())
    }

    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|company| company.name == name)
            .cloned())
    }

    fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        if self.get_company(application.company_id)?.is_none() {
            return Err(RepositoryError::NotFound {
                entity: "company",
                id: application.company_id.to_string(),
            });
        }
        let mut applications = self.applications.lock().unwrap();
        let application = application.into_application(ApplicationId(applications.len() as i64 + 1));
        applications.push(application.clone());
        Ok(application)
    }

    fn list_applications(&self) -> Result<Vec<ApplicationLogEntry>, RepositoryError> {
        let companies = self.companies.lock().unwrap().clone();
        let mut entries: Vec<_> = self
            .applications
            .lock()
            .unwrap()
            .iter()
            .map(|application| {
                let name = companies
                    .iter()
                    .find(|company| company.id == application.company_id)
                    .map(|company| company.name.clone());
                ApplicationLogEntry::from_application(application, name)
            })
            .collect();
        entries.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn create_company(&self, _company: NewCompany) -> Result<Company, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get_company(&self, _id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_company_by_name(&self, _name: &str) -> Result<Option<Company>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn create_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_applications(&self) -> Result<Vec<ApplicationLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SentMail {
    pub(super) to: String,
    pub(super) subject: String,
    pub(super) body: String,
    pub(super) attachment: PathBuf,
}

/// Records every send; fails with an auth error when configured to.
pub(super) struct StubMailer {
    rejection: Option<String>,
    calls: Mutex<Vec<SentMail>>,
}

impl StubMailer {
    pub(super) fn accepting() -> Self {
        Self {
            rejection: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn rejecting(reason: &str) -> Self {
        Self {
            rejection: Some(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<SentMail> {
        self.calls.lock().unwrap().clone()
    }
}

impl MailDispatcher for StubMailer {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment: attachment.to_path_buf(),
        });
        match &self.rejection {
            Some(reason) => Err(DispatchError::Auth(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Clock advancing one minute per reading.
pub(super) struct StepClock {
    next: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub(super) fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let current = *next;
        *next = current + chrono::Duration::minutes(1);
        current
    }
}

pub(super) const BOUNDARY: &str = "outreach-test-boundary";

pub(super) fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn multipart_request(uri: &str, body: Vec<u8>) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
