use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier for a target company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub i64);

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned identifier for one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub i64);

/// A company the candidate is applying to, with its HR contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub hr_name: Option<String>,
    pub hr_email: String,
    pub role: Option<String>,
    pub notes: Option<String>,
}

impl Company {
    /// Salutation target, falling back when no HR contact name is on file.
    pub fn greeting_name(&self) -> &str {
        non_blank(self.hr_name.as_deref()).unwrap_or("Hiring Team")
    }

    pub fn role_label(&self) -> &str {
        non_blank(self.role.as_deref()).unwrap_or("Role")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Fields accepted when adding a company. Optional fields mirror the HTTP payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hr_name: Option<String>,
    #[serde(default)]
    pub hr_email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A [`NewCompany`] whose required fields have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCompany {
    pub name: String,
    pub hr_name: Option<String>,
    pub hr_email: String,
    pub role: Option<String>,
    pub notes: Option<String>,
}

impl ValidCompany {
    pub fn into_company(self, id: CompanyId) -> Company {
        Company {
            id,
            name: self.name,
            hr_name: self.hr_name,
            hr_email: self.hr_email,
            role: self.role,
            notes: self.notes,
        }
    }
}

impl NewCompany {
    pub fn new(name: impl Into<String>, hr_email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            hr_email: Some(hr_email.into()),
            ..Self::default()
        }
    }

    pub fn with_hr_name(mut self, hr_name: impl Into<String>) -> Self {
        self.hr_name = Some(hr_name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks that `name` and `hr_email` are present and not blank.
    pub fn validate(self) -> Result<ValidCompany, ValidationError> {
        let name = required(self.name, "name")?;
        let hr_email = required(self.hr_email, "hr_email")?;
        Ok(ValidCompany {
            name,
            hr_name: self.hr_name,
            hr_email,
            role: self.role,
            notes: self.notes,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Raised when a required company field is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing {0}")]
    MissingField(&'static str),
}

/// Persisted status of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Sent,
    Failed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Sent => "SENT",
            ApplicationStatus::Failed => "FAILED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SENT" => Some(Self::Sent),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Result of a send attempt. The error text exists only on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationOutcome {
    Sent,
    Failed { error: String },
}

impl ApplicationOutcome {
    /// Builds a failure outcome; blank diagnostics are replaced so the message is never empty.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "unknown dispatch error".to_string()
        } else {
            error
        };
        Self::Failed { error }
    }

    pub fn status(&self) -> ApplicationStatus {
        match self {
            ApplicationOutcome::Sent => ApplicationStatus::Sent,
            ApplicationOutcome::Failed { .. } => ApplicationStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ApplicationOutcome::Sent => None,
            ApplicationOutcome::Failed { error } => Some(error.as_str()),
        }
    }
}

/// Audit record of one dispatch attempt. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: ApplicationId,
    pub company_id: CompanyId,
    pub sent_at: DateTime<Utc>,
    pub outcome: ApplicationOutcome,
}

impl Application {
    pub fn status(&self) -> ApplicationStatus {
        self.outcome.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.outcome.error_message()
    }

    /// Response body reported back to the caller of a dispatch.
    pub fn dispatch_view(&self) -> DispatchView {
        DispatchView {
            status: self.status(),
            error: self.error_message().map(str::to_string),
        }
    }
}

/// Fields written when recording a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub company_id: CompanyId,
    pub sent_at: DateTime<Utc>,
    pub outcome: ApplicationOutcome,
}

impl NewApplication {
    pub fn into_application(self, id: ApplicationId) -> Application {
        Application {
            id,
            company_id: self.company_id,
            sent_at: self.sent_at,
            outcome: self.outcome,
        }
    }
}

/// `{status, error}` payload returned from a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchView {
    pub status: ApplicationStatus,
    pub error: Option<String>,
}

/// Application log row enriched with the owning company's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationLogEntry {
    pub id: ApplicationId,
    pub company_id: CompanyId,
    pub company: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub error: Option<String>,
}

impl ApplicationLogEntry {
    pub fn from_application(application: &Application, company: Option<String>) -> Self {
        Self {
            id: application.id,
            company_id: application.company_id,
            company,
            sent_at: application.sent_at,
            status: application.status(),
            error: application.error_message().map(str::to_string),
        }
    }
}
