use super::common::*;
use crate::workflows::outreach::domain::{ApplicationStatus, CompanyId, NewCompany, ValidationError};
use crate::workflows::outreach::resume::{InvalidResume, ResumeError, RESUME_URL};
use crate::workflows::outreach::{OutreachError, OutreachService};
use std::fs;
use std::sync::Arc;

#[test]
fn add_company_assigns_sequential_ids() {
    let fixture = build_service();

    let first = fixture.service.add_company(acme()).expect("acme stored");
    let second = fixture
        .service
        .add_company(NewCompany::new("Globex", "talent@globex.com"))
        .expect("globex stored");

    assert_eq!(first.id, CompanyId(1));
    assert_eq!(second.id, CompanyId(2));
    assert_eq!(fixture.service.companies().unwrap().len(), 2);
}

#[test]
fn add_company_requires_name_and_hr_email() {
    let fixture = build_service();

    let missing_email = NewCompany {
        name: Some("Acme".to_string()),
        ..NewCompany::default()
    };
    match fixture.service.add_company(missing_email) {
        Err(OutreachError::Validation(ValidationError::MissingField("hr_email"))) => {}
        other => panic!("expected missing hr_email, got {other:?}"),
    }

    let blank_name = NewCompany::new("   ", "hr@acme.com");
    match fixture.service.add_company(blank_name) {
        Err(err @ OutreachError::Validation(_)) => assert_eq!(err.to_string(), "Missing name"),
        other => panic!("expected missing name, got {other:?}"),
    }

    assert!(fixture.service.companies().unwrap().is_empty());
}

#[test]
fn successful_dispatch_records_one_sent_application() {
    let fixture = build_service();
    let company = fixture
        .service
        .add_company(NewCompany::new("Acme", "hr@acme.com"))
        .unwrap();
    assert_eq!(company.id, CompanyId(1));
    fixture
        .service
        .upload_resume(b"%PDF-1.4 resume", "resume.pdf")
        .expect("resume stored");

    let application = fixture.service.dispatch(company.id).expect("dispatch runs");

    assert_eq!(application.status(), ApplicationStatus::Sent);
    assert_eq!(application.error_message(), None);
    assert_eq!(application.company_id, CompanyId(1));
    assert_eq!(application.sent_at, instant(9));
    assert_eq!(fixture.store.application_count(), 1);

    let calls = fixture.mailer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, "hr@acme.com");
    assert_eq!(calls[0].attachment, fixture.upload_dir().join("resume.pdf"));
}

#[test]
fn failed_send_is_recorded_not_raised() {
    let fixture = build_service_with_mailer(StubMailer::rejecting("535 bad credentials"));
    let company = fixture.service.add_company(acme()).unwrap();
    fixture.service.upload_resume(b"%PDF", "cv.pdf").unwrap();

    let application = fixture
        .service
        .dispatch(company.id)
        .expect("send failure is not an error");

    assert_eq!(application.status(), ApplicationStatus::Failed);
    let message = application.error_message().expect("failure carries a message");
    assert!(message.contains("535 bad credentials"));
    assert_eq!(fixture.store.application_count(), 1);

    let log = fixture.service.applications().unwrap();
    assert_eq!(log[0].status, ApplicationStatus::Failed);
    assert_eq!(log[0].error.as_deref(), Some(message));
}

#[test]
fn unknown_company_aborts_without_recording() {
    let fixture = build_service();
    fixture.service.upload_resume(b"%PDF", "resume.pdf").unwrap();

    match fixture.service.dispatch(CompanyId(42)) {
        Err(OutreachError::CompanyNotFound(CompanyId(42))) => {}
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(fixture.store.application_count(), 0);
    assert!(fixture.mailer.calls().is_empty());
}

#[test]
fn dispatch_without_resume_is_a_precondition_failure() {
    let fixture = build_service();
    let company = fixture
        .service
        .add_company(NewCompany::new("Acme", "hr@acme.com"))
        .unwrap();

    match fixture.service.dispatch(company.id) {
        Err(err @ OutreachError::ResumeMissing) => {
            assert_eq!(err.to_string(), "Upload resume first")
        }
        other => panic!("expected missing resume, got {other:?}"),
    }
    assert_eq!(fixture.store.application_count(), 0);
    assert!(fixture.mailer.calls().is_empty());
}

#[test]
fn mail_uses_role_and_contact_fallbacks() {
    let fixture = build_service();
    let named = fixture.service.add_company(acme()).unwrap();
    let bare = fixture
        .service
        .add_company(NewCompany::new("Globex", "talent@globex.com"))
        .unwrap();
    fixture.service.upload_resume(b"%PDF", "resume.pdf").unwrap();

    fixture.service.dispatch(named.id).unwrap();
    fixture.service.dispatch(bare.id).unwrap();

    let calls = fixture.mailer.calls();
    assert_eq!(calls[0].subject, "Application for SDE Intern — Jane Candidate");
    assert!(calls[0].body.starts_with("Dear Priya,\n\n"));
    assert!(calls[0].body.ends_with("Best regards,\nJane Candidate\njane@example.com"));
    assert_eq!(calls[1].subject, "Application for Role — Jane Candidate");
    assert!(calls[1].body.starts_with("Dear Hiring Team,"));
}

#[test]
fn applications_are_listed_newest_first_with_company_name() {
    let fixture = build_service();
    let company = fixture.service.add_company(acme()).unwrap();
    fixture.service.upload_resume(b"%PDF", "resume.pdf").unwrap();

    let earlier = fixture.service.dispatch(company.id).unwrap();
    let later = fixture.service.dispatch(company.id).unwrap();
    assert!(earlier.sent_at < later.sent_at);

    let log = fixture.service.applications().unwrap();
    let ids: Vec<_> = log.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![later.id, earlier.id]);
    assert!(log
        .iter()
        .all(|entry| entry.company.as_deref() == Some("Acme Corp")));
}

#[test]
fn rejected_upload_keeps_previous_resume() {
    let fixture = build_service();
    fixture
        .service
        .upload_resume(b"%PDF original", "resume.pdf")
        .unwrap();

    match fixture.service.upload_resume(b"PK docx", "resume.docx") {
        Err(OutreachError::Resume(ResumeError::InvalidInput(InvalidResume::NotPdf))) => {}
        other => panic!("expected non-pdf rejection, got {other:?}"),
    }

    assert_eq!(fixture.service.resume_url().as_deref(), Some(RESUME_URL));
    let stored = fs::read(fixture.upload_dir().join("resume.pdf")).unwrap();
    assert_eq!(stored, b"%PDF original");
}

#[test]
fn resume_url_is_absent_until_upload() {
    let fixture = build_service();
    assert_eq!(fixture.service.resume_url(), None);

    let url = fixture.service.upload_resume(b"%PDF", "resume.pdf").unwrap();
    assert_eq!(url, RESUME_URL);
    assert_eq!(fixture.service.resume_url().as_deref(), Some(RESUME_URL));
}

#[test]
fn store_outage_is_reported_as_repository_error() {
    let fixture = build_service();
    let service = OutreachService::new(
        Arc::new(UnavailableStore),
        fixture.resumes.clone(),
        fixture.mailer.clone(),
        sender(),
    );

    assert!(matches!(
        service.dispatch(CompanyId(1)),
        Err(OutreachError::Repository(_))
    ));
    assert!(matches!(
        service.add_company(acme()),
        Err(OutreachError::Repository(_))
    ));
    assert!(fixture.mailer.calls().is_empty());
}
