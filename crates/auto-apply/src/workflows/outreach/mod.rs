//! Resume outreach: target companies, a single stored resume, and the dispatch
//! workflow that mails it to each company's HR contact while logging every attempt.

pub mod clock;
pub mod domain;
pub mod mail;
pub mod repository;
pub mod resume;
pub mod router;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use domain::{
    Application, ApplicationId, ApplicationLogEntry, ApplicationOutcome, ApplicationStatus,
    Company, CompanyId, DispatchView, NewApplication, NewCompany, ValidationError,
};
pub use mail::{DispatchError, MailDispatcher, SmtpMailDispatcher};
pub use repository::{RecordStore, RepositoryError};
pub use resume::{
    FsResumeStore, InvalidResume, ResumeError, ResumeRepository, RESUME_FILE_NAME, RESUME_URL,
};
pub use router::{outreach_router, MAX_UPLOAD_BYTES};
pub use service::{OutreachError, OutreachService};
pub use sqlite::SqliteRecordStore;
