use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::{SenderConfig, SmtpConfig};

/// Outbound mail boundary used by the dispatch workflow.
///
/// One call is one attempt with one recipient and one attachment. Implementations
/// must fail with [`DispatchError::AttachmentMissing`] before any network I/O when
/// the attachment cannot be read.
pub trait MailDispatcher: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Attachment not found: {}", path.display())]
    AttachmentMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid message: {0}")]
    Message(String),
    #[error("smtp authentication failed: {0}")]
    Auth(String),
    #[error("smtp transport error: {0}")]
    Transport(String),
}

/// Builds the single-part text mail with one PDF attachment.
pub fn compose_message(
    sender: &SenderConfig,
    to: &str,
    subject: &str,
    body: &str,
    attachment_name: &str,
    attachment: Vec<u8>,
) -> Result<Message, DispatchError> {
    let from = format!("{} <{}>", sender.name, sender.email)
        .parse::<Mailbox>()
        .map_err(|err| DispatchError::Message(format!("sender address: {err}")))?;
    let to = to
        .parse::<Mailbox>()
        .map_err(|err| DispatchError::Message(format!("recipient address '{to}': {err}")))?;
    let pdf = ContentType::parse(mime::APPLICATION_PDF.as_ref())
        .map_err(|err| DispatchError::Message(err.to_string()))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(Attachment::new(attachment_name.to_string()).body(attachment, pdf)),
        )
        .map_err(|err| DispatchError::Message(err.to_string()))
}

/// Reads the attachment and returns its base name alongside the bytes.
pub fn load_attachment(path: &Path) -> Result<(String, Vec<u8>), DispatchError> {
    let bytes = fs::read(path).map_err(|source| DispatchError::AttachmentMissing {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment.pdf".to_string());
    Ok((name, bytes))
}

/// Blocking lettre client that opens one STARTTLS session per send.
pub struct SmtpMailDispatcher {
    smtp: SmtpConfig,
    sender: SenderConfig,
}

impl SmtpMailDispatcher {
    pub fn new(smtp: SmtpConfig, sender: SenderConfig) -> Self {
        Self { smtp, sender }
    }

    fn transport(&self) -> Result<SmtpTransport, DispatchError> {
        if self.smtp.host.trim().is_empty() {
            return Err(DispatchError::Transport(
                "SMTP_HOST is not configured".to_string(),
            ));
        }

        let builder = if self.smtp.starttls {
            SmtpTransport::starttls_relay(&self.smtp.host)
                .map_err(|err| DispatchError::Transport(err.to_string()))?
        } else {
            SmtpTransport::builder_dangerous(&self.smtp.host)
        };

        let mut builder = builder
            .port(self.smtp.port)
            .timeout(Some(self.smtp.timeout));
        if !self.smtp.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.smtp.username.clone(),
                self.smtp.password.clone(),
            ));
        }
        Ok(builder.build())
    }
}

impl Debug for SmtpMailDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailDispatcher")
            .field("smtp", &self.smtp)
            .field("sender", &self.sender)
            .finish()
    }
}

impl MailDispatcher for SmtpMailDispatcher {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<(), DispatchError> {
        let (attachment_name, bytes) = load_attachment(attachment)?;
        let message = compose_message(&self.sender, to, subject, body, &attachment_name, bytes)?;
        let transport = self.transport()?;

        tracing::debug!(host = %self.smtp.host, port = self.smtp.port, to, "sending resume");
        transport.send(&message).map(|_| ()).map_err(classify_smtp_error)
    }
}

fn classify_smtp_error(err: lettre::transport::smtp::Error) -> DispatchError {
    let rejected_credentials = err
        .status()
        .is_some_and(|code| code.to_string().starts_with("53"));
    if rejected_credentials {
        DispatchError::Auth(err.to_string())
    } else {
        DispatchError::Transport(err.to_string())
    }
}
