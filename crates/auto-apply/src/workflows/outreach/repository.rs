use super::domain::{
    Application, ApplicationLogEntry, Company, CompanyId, NewApplication, NewCompany,
    ValidationError,
};

/// Storage abstraction for companies and the application log.
///
/// Implementations must reject invalid companies and applications that point at an
/// unknown company, and list applications most recent first.
pub trait RecordStore: Send + Sync {
    fn create_company(&self, company: NewCompany) -> Result<Company, RepositoryError>;
    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;
    fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError>;
    fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError>;
    fn list_applications(&self) -> Result<Vec<ApplicationLogEntry>, RepositoryError>;
}

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
