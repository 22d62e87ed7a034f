use std::sync::Arc;

use tracing::{info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    Application, ApplicationLogEntry, ApplicationOutcome, Company, CompanyId, NewApplication,
    NewCompany, ValidationError,
};
use super::mail::MailDispatcher;
use super::repository::{RecordStore, RepositoryError};
use super::resume::{ResumeError, ResumeRepository, RESUME_URL};
use crate::config::SenderConfig;

/// Service composing the record store, resume slot, and mail dispatcher.
pub struct OutreachService<S, R, M> {
    store: Arc<S>,
    resumes: Arc<R>,
    mailer: Arc<M>,
    sender: SenderConfig,
    clock: Arc<dyn Clock>,
}

impl<S, R, M> OutreachService<S, R, M>
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    pub fn new(store: Arc<S>, resumes: Arc<R>, mailer: Arc<M>, sender: SenderConfig) -> Self {
        Self::with_clock(store, resumes, mailer, sender, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        resumes: Arc<R>,
        mailer: Arc<M>,
        sender: SenderConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            resumes,
            mailer,
            sender,
            clock,
        }
    }

    pub fn add_company(&self, company: NewCompany) -> Result<Company, OutreachError> {
        let company = self.store.create_company(company)?;
        info!(company_id = %company.id, name = %company.name, "company added");
        Ok(company)
    }

    /// Looks a company up by its exact name.
    pub fn company_named(&self, name: &str) -> Result<Option<Company>, OutreachError> {
        Ok(self.store.find_company_by_name(name)?)
    }

    pub fn companies(&self) -> Result<Vec<Company>, OutreachError> {
        Ok(self.store.list_companies()?)
    }

    /// Replaces the stored resume; invalid uploads leave the previous file in place.
    pub fn upload_resume(
        &self,
        bytes: &[u8],
        declared_filename: &str,
    ) -> Result<String, OutreachError> {
        Ok(self.resumes.save_resume(bytes, declared_filename)?)
    }

    pub fn resume_url(&self) -> Option<String> {
        self.resumes.has_resume().then(|| RESUME_URL.to_string())
    }

    pub fn read_upload(&self, filename: &str) -> Result<Option<Vec<u8>>, OutreachError> {
        Ok(self.resumes.read_upload(filename)?)
    }

    pub fn applications(&self) -> Result<Vec<ApplicationLogEntry>, OutreachError> {
        Ok(self.store.list_applications()?)
    }

    /// Emails the stored resume to the company's HR contact and records the attempt.
    ///
    /// Unknown companies and a missing resume abort without writing anything. Once a
    /// send is attempted exactly one application is persisted, whether the relay
    /// accepted the message or not; send failures are reported through the record's
    /// status rather than as an `Err`.
    pub fn dispatch(&self, company_id: CompanyId) -> Result<Application, OutreachError> {
        let company = self
            .store
            .get_company(company_id)?
            .ok_or(OutreachError::CompanyNotFound(company_id))?;
        let resume = self
            .resumes
            .resume_path()
            .ok_or(OutreachError::ResumeMissing)?;

        let subject = self.subject_for(&company);
        let body = self.body_for(&company);

        let outcome = match self
            .mailer
            .send(&company.hr_email, &subject, &body, &resume)
        {
            Ok(()) => ApplicationOutcome::Sent,
            Err(err) => {
                warn!(company_id = %company.id, error = %err, "resume dispatch failed");
                ApplicationOutcome::failed(err.to_string())
            }
        };

        let application = self.store.create_application(NewApplication {
            company_id: company.id,
            sent_at: self.clock.now(),
            outcome,
        })?;
        info!(
            company_id = %company.id,
            application_id = application.id.0,
            status = application.status().label(),
            "dispatch recorded"
        );
        Ok(application)
    }

    pub fn subject_for(&self, company: &Company) -> String {
        format!(
            "Application for {} — {}",
            company.role_label(),
            self.sender.name
        )
    }

    pub fn body_for(&self, company: &Company) -> String {
        format!(
            "Dear {},\n\n\
             I hope you're doing well. Please find my resume attached for your consideration.\n\n\
             Best regards,\n\
             {}\n\
             {}",
            company.greeting_name(),
            self.sender.name,
            self.sender.email
        )
    }
}

/// Error raised by the outreach service.
#[derive(Debug, thiserror::Error)]
pub enum OutreachError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error("Company not found")]
    CompanyNotFound(CompanyId),
    #[error("Upload resume first")]
    ResumeMissing,
    #[error(transparent)]
    Resume(#[from] ResumeError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OutreachError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Validation(err) => OutreachError::Validation(err),
            other => OutreachError::Repository(other),
        }
    }
}
