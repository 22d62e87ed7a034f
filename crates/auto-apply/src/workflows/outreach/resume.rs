use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// File name of the single resume slot inside the upload directory.
pub const RESUME_FILE_NAME: &str = "resume.pdf";

/// Public URL the stored resume is served from.
pub const RESUME_URL: &str = "/uploads/resume.pdf";

/// Single-slot resume storage handed to the dispatch workflow.
pub trait ResumeRepository: Send + Sync {
    /// Replaces the stored resume and returns the URL it is served from.
    fn save_resume(&self, bytes: &[u8], declared_filename: &str) -> Result<String, ResumeError>;
    fn has_resume(&self) -> bool;
    fn resume_path(&self) -> Option<PathBuf>;
    /// Reads a file from the upload directory for static serving.
    fn read_upload(&self, filename: &str) -> Result<Option<Vec<u8>>, ResumeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    #[error("{0}")]
    InvalidInput(InvalidResume),
    #[error("resume storage failed: {0}")]
    Io(#[from] io::Error),
}

/// Reasons an upload is refused before anything touches the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidResume {
    #[error("No selected file")]
    MissingFilename,
    #[error("Only PDF allowed")]
    NotPdf,
    #[error("Uploaded file is empty")]
    EmptyFile,
}

impl From<InvalidResume> for ResumeError {
    fn from(value: InvalidResume) -> Self {
        Self::InvalidInput(value)
    }
}

/// Checks the declared filename and payload of an upload.
pub fn validate_upload(bytes: &[u8], declared_filename: &str) -> Result<(), InvalidResume> {
    let declared_filename = declared_filename.trim();
    if declared_filename.is_empty() {
        return Err(InvalidResume::MissingFilename);
    }
    let is_pdf = Path::new(declared_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(InvalidResume::NotPdf);
    }
    if bytes.is_empty() {
        return Err(InvalidResume::EmptyFile);
    }
    Ok(())
}

/// Filesystem resume slot rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct FsResumeStore {
    dir: PathBuf,
}

impl FsResumeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the upload directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, ResumeError> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir)?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot(&self) -> PathBuf {
        self.dir.join(RESUME_FILE_NAME)
    }
}

impl ResumeRepository for FsResumeStore {
    fn save_resume(&self, bytes: &[u8], declared_filename: &str) -> Result<String, ResumeError> {
        validate_upload(bytes, declared_filename)?;
        fs::create_dir_all(&self.dir)?;

        // Same directory as the slot so the rename stays on one filesystem.
        let mut staged = tempfile::Builder::new()
            .prefix(".resume-")
            .suffix(".part")
            .tempfile_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged
            .persist(self.slot())
            .map_err(|err| ResumeError::Io(err.error))?;

        tracing::info!(
            declared_filename,
            size = bytes.len(),
            "resume stored"
        );
        Ok(RESUME_URL.to_string())
    }

    fn has_resume(&self) -> bool {
        self.slot().is_file()
    }

    fn resume_path(&self) -> Option<PathBuf> {
        let slot = self.slot();
        slot.is_file().then_some(slot)
    }

    fn read_upload(&self, filename: &str) -> Result<Option<Vec<u8>>, ResumeError> {
        let mut components = Path::new(filename).components();
        let plain_name = match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => name,
            _ => return Ok(None),
        };
        let candidate = self.dir.join(plain_name);
        if !candidate.is_file() {
            return Ok(None);
        }
        match fs::read(&candidate) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ResumeError::Io(err)),
        }
    }
}
