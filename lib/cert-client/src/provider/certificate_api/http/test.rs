use std::collections::BTreeMap;
use std::fmt::{Debug, Write as _};
use std::sync::{Arc, Mutex};

use indexmap::indexmap;
use rstest::rstest;
use serde_json::{Value, json};
use time::macros::datetime;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{HTTPCertificateApi, RequestOptions};
use crate::model::certificate::CertificateStatus;
use crate::provider::certificate_api::CertificateApi;
use crate::provider::certificate_api::error::CertificateApiError;
use crate::provider::http_client::reqwest_client::ReqwestClient;
use crate::provider::http_client::{Error, Headers, Method, StatusCode};

fn certificate_json(id: i64) -> Value {
    json!({
        "id": id,
        "name": "example.com",
        "type": "DV",
        "email": "admin@example.com",
        "description": null,
        "status": "PENDING",
        "createdAt": "2024-03-01T10:15:30.123456",
        "updatedAt": "2024-03-01T10:15:30",
        "issuer": "test-ca"
    })
}

fn api_for(mock_server: &MockServer) -> HTTPCertificateApi {
    HTTPCertificateApi::new(
        Arc::new(ReqwestClient::default()),
        format!("{}/api", mock_server.uri()),
    )
}

#[tokio::test]
async fn test_list_certificates() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates"))
        .and(header("Content-Type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([certificate_json(1), certificate_json(2)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let certificates = api_for(&mock_server).list().await.unwrap();

    assert_eq!(certificates.len(), 2);
    assert_eq!(certificates[0].id(), Some(1.into()));
    assert_eq!(certificates[1].id(), Some(2.into()));
}

#[tokio::test]
async fn test_get_by_id_keeps_the_body_verbatim() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(certificate_json(42)))
        .mount(&mock_server)
        .await;

    let certificate = api_for(&mock_server)
        .get_by_id(42.into())
        .await
        .unwrap();

    assert_eq!(certificate.as_value(), &certificate_json(42));
    assert_eq!(certificate.id(), Some(42.into()));
    assert_eq!(certificate.name(), Some("example.com"));
    assert_eq!(certificate.r#type(), Some("DV"));
    assert_eq!(certificate.description(), None);
    assert_eq!(certificate.status(), Some(CertificateStatus::Pending));
    assert_eq!(
        certificate.created_at(),
        Some(datetime!(2024-03-01 10:15:30.123456))
    );
    assert_eq!(certificate.updated_at(), Some(datetime!(2024-03-01 10:15:30)));
    assert_eq!(certificate.get("issuer"), Some(&json!("test-ca")));
}

#[rstest]
#[case::offset_timestamp(json!({ "id": 7, "createdAt": "2024-03-01T10:15:30Z" }))]
#[case::string_id(json!({ "id": "7", "name": "example.com" }))]
#[case::unexpected_field_type(json!({ "id": 7, "name": 123 }))]
#[case::missing_id(json!({ "name": "example.com" }))]
#[case::not_an_object(json!("created"))]
#[tokio::test]
async fn test_any_json_body_is_accepted(#[case] body: Value) {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&mock_server)
        .await;

    let certificate = api_for(&mock_server)
        .get_by_id(7.into())
        .await
        .unwrap();

    assert_eq!(certificate.into_value(), body);
}

#[tokio::test]
async fn test_offset_timestamp_and_string_id_are_read() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7",
            "createdAt": "2024-03-01T10:15:30Z"
        })))
        .mount(&mock_server)
        .await;

    let certificate = api_for(&mock_server)
        .get_by_id(7.into())
        .await
        .unwrap();

    assert_eq!(certificate.id(), Some(7.into()));
    assert_eq!(certificate.created_at(), Some(datetime!(2024-03-01 10:15:30)));
}

#[tokio::test]
async fn test_get_by_id_twice_hits_the_service_twice() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(certificate_json(7)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let api = api_for(&mock_server);
    let first = api.get_by_id(7.into()).await.unwrap();
    let second = api.get_by_id(7.into()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_apply_posts_payload_as_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/certificates"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "name": "example.com",
            "type": "DV",
            "email": "admin@example.com",
            "description": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(certificate_json(9)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let payload = indexmap! {
        "name".to_string() => "example.com".to_string(),
        "type".to_string() => "DV".to_string(),
        "email".to_string() => "admin@example.com".to_string(),
        "description".to_string() => "".to_string(),
    };

    let certificate = api_for(&mock_server).apply(payload).await.unwrap();
    assert_eq!(certificate.id(), Some(9.into()));
}

#[tokio::test]
async fn test_non_success_status_is_an_error_with_the_code() {
    for status in [400u16, 404, 500, 503] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "id": 1 })))
            .mount(&mock_server)
            .await;

        let error = api_for(&mock_server).list().await.unwrap_err();

        assert_eq!(error.status_code(), Some(status));
        assert!(error.to_string().contains(&status.to_string()));
    }
}

#[tokio::test]
async fn test_unparsable_body_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let error = api_for(&mock_server).list().await.unwrap_err();

    assert!(matches!(
        error,
        CertificateApiError::Transport(Error::JsonError(_))
    ));
    assert_eq!(error.status_code(), None);
}

#[tokio::test]
async fn test_network_failure_is_an_error() {
    let api = HTTPCertificateApi::new(
        Arc::new(ReqwestClient::default()),
        "http://127.0.0.1:1/api",
    );

    let error = api.get_by_id(1.into()).await.unwrap_err();
    assert!(matches!(
        error,
        CertificateApiError::Transport(Error::HttpError(_))
    ));
}

#[tokio::test]
async fn test_invalid_base_url() {
    let api = HTTPCertificateApi::new(Arc::new(ReqwestClient::default()), "/api");

    let error = api.list().await.unwrap_err();
    assert!(matches!(error, CertificateApiError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = HTTPCertificateApi::new(
        Arc::new(ReqwestClient::default()),
        format!("{}/api/", mock_server.uri()),
    );

    assert!(api.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_caller_headers_replace_defaults() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let api = api_for(&mock_server);
    let _: Vec<Value> = api
        .request(
            "/certificates",
            RequestOptions {
                headers: Some(Headers::from([(
                    "X-Trace".to_string(),
                    "abc".to_string(),
                )])),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].headers.get("X-Trace").unwrap().to_str().unwrap(),
        "abc"
    );
    assert!(requests[0].headers.get("Content-Type").is_none());
}

#[test]
fn test_status_code_of_other_errors() {
    let error = CertificateApiError::Transport(Error::StatusCodeIsError(StatusCode(418)));
    assert_eq!(error.status_code(), Some(418));
    assert_eq!(error.to_string(), "HTTP error! status: 418");
}

#[tokio::test]
async fn test_one_click_apply_posts_payload_as_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/certificates/one-click"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({ "name": "example.com", "type": "DV" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(certificate_json(12)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let payload = indexmap! {
        "name".to_string() => "example.com".to_string(),
        "type".to_string() => "DV".to_string(),
    };

    let certificate = api_for(&mock_server)
        .one_click_apply(payload)
        .await
        .unwrap();
    assert_eq!(certificate.id(), Some(12.into()));
}

#[tokio::test]
async fn test_download_returns_content_and_file_name() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates/download/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"example.pem\"")
                .set_body_bytes(b"-----BEGIN CERTIFICATE-----\n".to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let file = api_for(&mock_server).download(7.into()).await.unwrap();

    assert_eq!(file.file_name.as_deref(), Some("example.pem"));
    assert_eq!(file.content, b"-----BEGIN CERTIFICATE-----\n");
}

#[tokio::test]
async fn test_download_without_disposition_has_no_file_name() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates/download/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 159, 146, 150]))
        .mount(&mock_server)
        .await;

    let file = api_for(&mock_server).download(7.into()).await.unwrap();

    assert_eq!(file.file_name, None);
    assert_eq!(file.content, vec![0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_file_name_is_one_encoded_path_segment() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/certificates/file/a%20b%2Fc.pem"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let content = api_for(&mock_server).file("a b/c.pem").await.unwrap();

    assert_eq!(content, b"content");
}

#[tokio::test]
async fn test_file_endpoints_propagate_status_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let api = api_for(&mock_server);

    let error = api.download(7.into()).await.unwrap_err();
    assert_eq!(error.status_code(), Some(404));

    let error = api.file("example.pem").await.unwrap_err();
    assert_eq!(error.status_code(), Some(404));
}

#[derive(Clone, Default)]
struct RecordedEvents(Arc<Mutex<Vec<(Level, String)>>>);

impl RecordedEvents {
    fn errors(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == Level::ERROR)
            .map(|(_, fields)| fields.to_owned())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for RecordedEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), fields.0));
    }
}

#[derive(Default)]
struct EventFields(String);

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

#[tokio::test]
async fn test_status_error_is_logged_before_it_is_returned() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let events = RecordedEvents::default();
    let subscriber = tracing_subscriber::registry().with(events.clone());

    let error = api_for(&mock_server)
        .list()
        .with_subscriber(subscriber)
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(503));
    let errors = events.errors();
    assert!(!errors.is_empty());
    assert!(
        errors
            .iter()
            .any(|fields| fields.contains("503") && fields.contains("/certificates")),
        "{errors:?}"
    );
}

#[tokio::test]
async fn test_unserializable_body_is_logged_and_never_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(certificate_json(1)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let events = RecordedEvents::default();
    let subscriber = tracing_subscriber::registry().with(events.clone());

    // JSON object keys must be strings
    let body = BTreeMap::from([((1, 2), 3)]);
    let result: Result<Value, _> = api_for(&mock_server)
        .request_json(
            "/certificates",
            RequestOptions {
                method: Some(Method::Post),
                ..Default::default()
            },
            &body,
        )
        .with_subscriber(subscriber)
        .await;

    assert!(matches!(
        result,
        Err(CertificateApiError::Transport(Error::JsonError(_)))
    ));
    assert!(
        events
            .errors()
            .iter()
            .any(|fields| fields.contains("/certificates"))
    );
}
