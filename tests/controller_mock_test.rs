//! Upload Controller Tests with a mocked transport
//!
//! Verifies exactly when, and with what, the controller calls its transport.

use bytes::Bytes;
use mockall::mock;
use mockall::predicate::always;
use presign_uploadr::transport::{
    EventSink, TransferEvent, TransferHandle, TransferNotice, TransferRequest, Transport,
};
use presign_uploadr::{Phase, SelectedFile, UploadController};
use reqwest::Method;
use tokio::sync::mpsc;

mock! {
    pub Transport {}

    impl Transport for Transport {
        fn dispatch(&self, request: TransferRequest, events: EventSink) -> TransferHandle;
    }
}

const VALID_URL: &str = "https://bucket.example.com/key?sig=abc";

fn controller(mock: MockTransport) -> UploadController<MockTransport> {
    let (tx, _rx) = mpsc::unbounded_channel();
    UploadController::new(mock, tx)
}

fn file(mime_type: &str) -> SelectedFile {
    SelectedFile::from_bytes("upload.bin", mime_type, Bytes::from(vec![1u8; 256]))
}

#[test]
fn test_invalid_url_makes_no_transport_call() {
    let mut mock = MockTransport::new();
    mock.expect_dispatch().never();

    let mut c = controller(mock);
    c.set_target("not-a-url");
    c.select_file(file("text/plain"));
    c.submit();

    assert_eq!(c.state().phase, Phase::Failed);
    assert_eq!(c.state().error.as_deref(), Some("Invalid presigned URL format"));
}

#[test]
fn test_missing_file_makes_no_transport_call() {
    let mut mock = MockTransport::new();
    mock.expect_dispatch().never();

    let mut c = controller(mock);
    c.set_target(VALID_URL);
    c.submit();

    assert_eq!(c.state().phase, Phase::Failed);
    let error = c.state().error.clone().unwrap();
    assert!(error.contains("file") && error.contains("presigned URL"));
}

#[test]
fn test_submit_dispatches_single_put() {
    let mut mock = MockTransport::new();
    mock.expect_dispatch()
        .withf(|request, events| {
            request.method == Method::PUT
                && request.url.as_str() == VALID_URL
                && request.content_type == "image/png"
                && request.size == 256
                && request.id == events.id()
        })
        .times(1)
        .returning(|_, events| TransferHandle::detached(events.id()));

    let mut c = controller(mock);
    c.set_target(VALID_URL);
    c.select_file(file("image/png"));
    c.submit();
    c.submit();

    assert_eq!(c.state().phase, Phase::Uploading);
    assert_eq!(c.state().progress, 0);
}

#[test]
fn test_empty_content_type_is_passed_through() {
    let mut mock = MockTransport::new();
    mock.expect_dispatch()
        .withf(|request, _| request.content_type.is_empty())
        .times(1)
        .returning(|_, events| TransferHandle::detached(events.id()));

    let mut c = controller(mock);
    c.set_target(VALID_URL);
    c.select_file(file(""));
    c.submit();
}

#[test]
fn test_scripted_events_drive_states() {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut mock = MockTransport::new();
    mock.expect_dispatch()
        .with(always(), always())
        .times(1)
        .returning(|_, events| {
            events.emit(TransferEvent::Progress {
                loaded: 50,
                total: 100,
                length_computable: true,
            });
            events.emit(TransferEvent::Load { status: 200 });
            TransferHandle::detached(events.id())
        });

    let mut c = UploadController::new(mock, tx);
    c.set_target(VALID_URL);
    c.select_file(file("text/plain"));
    c.submit();

    let progress: TransferNotice = rx.try_recv().unwrap();
    c.apply(progress);
    assert_eq!(c.state().progress, 50);
    assert_eq!(c.state().phase, Phase::Uploading);

    c.apply(rx.try_recv().unwrap());
    assert_eq!(c.state().phase, Phase::Succeeded);
    assert_eq!(c.state().progress, 100);
}

#[test]
fn test_http_failure_status_in_message() {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut mock = MockTransport::new();
    mock.expect_dispatch().times(1).returning(|_, events| {
        events.emit(TransferEvent::Load { status: 403 });
        TransferHandle::detached(events.id())
    });

    let mut c = UploadController::new(mock, tx);
    c.set_target(VALID_URL);
    c.select_file(file("text/plain"));
    c.submit();
    assert_eq!(c.state().phase, Phase::Uploading);

    c.apply(rx.try_recv().unwrap());
    assert_eq!(c.state().phase, Phase::Failed);
    assert!(c.state().error.as_deref().unwrap().contains("403"));
}
