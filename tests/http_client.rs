use std::time::Duration;
use httpmock::{Method::GET, Method::POST, MockServer};
use websmart::{encode_xml, AddressClient, AddressField, AddressRecord, BatchRequest, ClientConfig, ConnectionFailure, ResponseValue, Url, WebsmartError};

const RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ResponseArray>
  <Version>2.0.76</Version>
  <TotalRecords>1</TotalRecords>
  <Record>
    <RecordID>0</RecordID>
    <Results>AS01</Results>
    <Address>
      <Address1>22382 Avenida Empresa</Address1>
      <City><Name>Rancho Santa Margarita</Name></City>
      <Zip>92688</Zip>
      <Plus4>2112</Plus4>
    </Address>
  </Record>
</ResponseArray>"#;

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new("123456789")
        .with_xml_endpoint(Url::parse(&server.url("/v2/XML/Service.svc/doAddressCheck")).unwrap())
        .with_rest_endpoint(Url::parse(&server.url("/v2/REST/Service.svc/doAddressCheck")).unwrap())
        .with_timeout(Duration::from_secs(5))
}

fn example_record() -> AddressRecord {
    AddressRecord::new()
        .with(AddressField::Address1, "22382 Avenida Empresa")
        .with(AddressField::City, "Rancho Santa Margarita")
        .with(AddressField::State, "CA")
        .with(AddressField::Zip, "92688")
}

#[tokio::test]
async fn batch_is_posted_as_xml() {
    let server = MockServer::start_async().await;
    let config = config_for(&server);
    let batch = BatchRequest::new(vec![example_record()]);
    let content_length = encode_xml(&config, &batch).unwrap().len().to_string();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/XML/Service.svc/doAddressCheck")
                .header("content-type", "text/xml")
                .header("content-length", content_length.as_str())
                .body_contains("<CustomerID>123456789</CustomerID>")
                .body_contains("<OptAddressParsed>True</OptAddressParsed>")
                .body_contains("<RecordID>0</RecordID>")
                .body_contains("<AddressLine1>22382 Avenida Empresa</AddressLine1>")
                .body_contains("<Plus4/>");
            then.status(200)
                .header("content-type", "text/xml; charset=utf-8")
                .body(RESPONSE);
        })
        .await;

    let client = AddressClient::new(config).unwrap();
    let response = client.verify_batch(&batch).await.unwrap();

    mock.assert();
    assert_eq!(response.root(), "ResponseArray");
    let record = &response.get("Record").unwrap().items()[0];
    assert_eq!(record.get("Results").and_then(ResponseValue::as_text), Some("AS01"));
    assert_eq!(
        record.get("Address").and_then(|a| a.get("Plus4")).and_then(ResponseValue::as_text),
        Some("2112")
    );
}

#[tokio::test]
async fn single_record_is_sent_as_query() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/REST/Service.svc/doAddressCheck")
                .query_param("id", "123456789")
                .query_param("opt", "1")
                .query_param("state", "CA")
                .query_param("zip", "92688");
            then.status(200).body(RESPONSE);
        })
        .await;

    let client = AddressClient::new(config_for(&server)).unwrap();
    let response = client.verify_single(&example_record()).await.unwrap();

    mock.assert();
    assert_eq!(response.get("Version").and_then(ResponseValue::as_text), Some("2.0.76"));
}

#[tokio::test]
async fn server_error_is_reported_with_its_body() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/XML/Service.svc/doAddressCheck");
            then.status(500).body("internal error");
        })
        .await;

    let client = AddressClient::new(config_for(&server)).unwrap();
    let err = client
        .verify_batch(&BatchRequest::new(vec![example_record()]))
        .await
        .unwrap_err();

    mock.assert_hits(1);
    match err {
        WebsmartError::Connection { failure: ConnectionFailure::Status { status, body }, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_xml_body_is_malformed() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/REST/Service.svc/doAddressCheck");
            then.status(200).body("Service temporarily unavailable");
        })
        .await;

    let client = AddressClient::new(config_for(&server)).unwrap();
    let err = client.verify_single(&example_record()).await.unwrap_err();

    assert!(matches!(err, WebsmartError::MalformedResponse { .. }));
    assert_eq!(err.body(), Some("Service temporarily unavailable"));
}

#[tokio::test]
async fn unreachable_service_is_a_connection_error() {
    // nothing listens on port 1
    let config = ClientConfig::new("123456789")
        .with_rest_endpoint(Url::parse("http://127.0.0.1:1/doAddressCheck").unwrap())
        .with_timeout(Duration::from_secs(2));
    let client = AddressClient::new(config).unwrap();

    let err = client.verify_single(&example_record()).await.unwrap_err();
    assert!(matches!(err, WebsmartError::Connection { failure: ConnectionFailure::Transport(_), .. }));
}

#[tokio::test]
async fn oversized_batch_sends_nothing() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).body(RESPONSE);
        })
        .await;

    let client = AddressClient::new(config_for(&server)).unwrap();
    let batch = (0..101).map(|_| example_record()).collect::<BatchRequest>();
    let err = client.verify_batch(&batch).await.unwrap_err();

    assert!(matches!(err, WebsmartError::TooManyRecords { count: 101, limit: 100 }));
    mock.assert_hits(0);
}
