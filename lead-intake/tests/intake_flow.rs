//! End-to-end submissions against the local intake stub.

use std::sync::Arc;

use intake_stub::{spawn, AppState, Status, StubHandle};
use lead_intake::error::GENERIC_FAILURE;
use lead_intake::notify::NoticeLevel;
use lead_intake::{
    Config, FormKind, IntakeClient, IntakeError, LeadForm, NoticeLog, ObjectUrlRegistry, RawFile, ServiceVariant,
    SubmissionCoordinator, SubmissionState, SubmitOutcome,
};

async fn stub(state: AppState) -> (StubHandle, IntakeClient) {
    let handle = spawn(state).await.unwrap();
    let client = IntakeClient::new(Config::new(&handle.base_url()).unwrap());
    (handle, client)
}

fn coordinator(
    kind: FormKind,
    client: IntakeClient,
) -> (SubmissionCoordinator<IntakeClient, Arc<NoticeLog>>, Arc<NoticeLog>, Arc<ObjectUrlRegistry>) {
    let registry = Arc::new(ObjectUrlRegistry::new());
    let notices = Arc::new(NoticeLog::new());
    let form = LeadForm::new(kind.schema(), registry.clone());
    (SubmissionCoordinator::new(form, client, notices.clone()), notices, registry)
}

// ── POST /api/consultations ─────────────────────────────────────────

#[tokio::test]
async fn consultation_with_reports_reaches_the_backend() {
    let (handle, client) = stub(AppState::new().unwrap()).await;
    let (c, notices, registry) = coordinator(FormKind::Consultation, client);

    c.set_field("name", "John Doe");
    c.set_field("email", "john@example.com");
    c.set_field("phone", "9876543210");
    c.set_field("countryCode", "+91");
    c.set_field("message", "Need a consultation");
    c.admit("reports", RawFile::new("mri.pdf", "application/pdf", vec![1u8; 2048])).unwrap();
    c.admit("reports", RawFile::new("xray.png", "image/png", vec![2u8; 512])).unwrap();
    assert_eq!(registry.live_count(), 1);

    let outcome = c.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Succeeded { .. }), "{outcome:?}");
    assert_eq!(c.state(), SubmissionState::Succeeded);
    assert_eq!(registry.live_count(), 0);
    assert_eq!(notices.last().unwrap().level, NoticeLevel::Success);

    let received = handle.submissions();
    assert_eq!(received.len(), 1);
    let submission = &received[0];
    assert_eq!(submission.endpoint, "/api/consultations");
    assert_eq!(submission.fields["name"], "John Doe");
    assert_eq!(submission.fields["countryCode"], "+91");
    let files: Vec<_> = submission
        .files
        .iter()
        .map(|f| (f.field.as_str(), f.file_name.as_deref(), f.size))
        .collect();
    assert_eq!(
        files,
        vec![("reports[]", Some("mri.pdf"), 2048), ("reports[]", Some("xray.png"), 512)]
    );
}

// ── POST /api/service-inquiries ─────────────────────────────────────

#[tokio::test]
async fn visa_inquiry_sends_passport_under_its_own_name() {
    let (handle, client) = stub(AppState::new().unwrap()).await;
    let (c, _, _) = coordinator(FormKind::ServiceInquiry(ServiceVariant::VisaTravel), client);

    c.set_field("name", "Fatima Bello");
    c.set_field("email", "fatima@example.com");
    c.set_field("phone", "+234 803 555 0101");
    c.set_field("message", "Medical visa for my mother and me");

    assert!(matches!(c.submit().await, SubmitOutcome::Invalid { .. }));
    assert!(handle.submissions().is_empty());

    c.admit("passport", RawFile::new("passport.jpg", "image/jpeg", vec![0u8; 1024])).unwrap();
    assert!(matches!(c.submit().await, SubmitOutcome::Succeeded { .. }));

    let received = handle.submissions();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].fields["service"], "visa-travel");
    assert_eq!(received[0].files[0].field, "passport");
    assert_eq!(received[0].files[0].content_type.as_deref(), Some("image/jpeg"));
}

// ── Failure paths ───────────────────────────────────────────────────

#[tokio::test]
async fn server_message_is_shown_and_form_is_kept() {
    let state = AppState::new()
        .unwrap()
        .rejecting(Status::UNPROCESSABLE_ENTITY, "Please call us, uploads are paused");
    let (handle, client) = stub(state).await;
    let (c, notices, registry) = coordinator(FormKind::Review, client);

    c.set_field("name", "Grace Mwangi");
    c.set_field("email", "grace@example.com");
    c.set_field("rating", "5");
    c.set_field("message", "Wonderful care from start to finish.");
    c.admit("photo", RawFile::new("smile.webp", "image/webp", vec![3u8; 256])).unwrap();

    let outcome = c.submit().await;
    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            message: "Please call us, uploads are paused".into()
        }
    );
    assert_eq!(notices.last().unwrap().level, NoticeLevel::Error);
    c.with_form(|form| {
        assert_eq!(form.field("name"), "Grace Mwangi");
        assert_eq!(form.attachments().count("photo"), 1);
    });
    assert_eq!(registry.live_count(), 1);
    assert!(handle.submissions().is_empty());
}

#[tokio::test]
async fn unreachable_backend_degrades_to_generic_message() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = IntakeClient::new(Config::new(&format!("http://127.0.0.1:{port}")).unwrap());
    let (c, _, _) = coordinator(FormKind::CulturalSupport, client);

    c.set_field("name", "Dilnoza Karimova");
    c.set_field("email", "dilnoza@example.com");
    c.set_field("phone", "+998 90 123 45 67");
    c.set_field("language", "Uzbek");
    c.set_field("message", "Interpreter for oncology visits");

    assert_eq!(
        c.submit().await,
        SubmitOutcome::Failed {
            message: GENERIC_FAILURE.into()
        }
    );
    c.with_form(|form| assert_eq!(form.field("language"), "Uzbek"));
}

// ── Read endpoints ──────────────────────────────────────────────────

#[tokio::test]
async fn approved_reviews_and_gallery_are_unwrapped() {
    let (_handle, client) = stub(AppState::new().unwrap()).await;

    let reviews = client.approved_reviews().await.unwrap();
    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[0].name, "Amina Yusuf");
    assert!(reviews.iter().all(|r| (1..=5).contains(&r.rating)));

    let gallery = client.gallery().await.unwrap();
    assert_eq!(gallery[1].category.as_deref(), Some("travel"));
}

#[tokio::test]
async fn missing_read_endpoint_is_an_api_error() {
    let (handle, _) = stub(AppState::new().unwrap()).await;
    let client = IntakeClient::new(Config::new(&format!("{}/v2", handle.base_url())).unwrap());

    match client.gallery().await {
        Err(IntakeError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected Api error, got {other:?}"),
    }
}
