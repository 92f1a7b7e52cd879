use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use url::Url;
use crate::config::ClientConfig;
use crate::error::ConnectionFailure;

const XML_CONTENT_TYPE: &str = "text/xml";

/// A single request to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    /// batch submission to the XML interface
    PostXml { url: Url, body: Vec<u8> },
    /// single-record lookup on the REST interface, query included in `url`
    Get { url: Url },
}

impl OutboundRequest {
    pub fn url(&self) -> &Url {
        match self {
            OutboundRequest::PostXml { url, .. } | OutboundRequest::Get { url } => url,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            OutboundRequest::PostXml { .. } => "POST",
            OutboundRequest::Get { .. } => "GET",
        }
    }
}

/// What came back from the service, whatever the status
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Performs one HTTP exchange.
///
/// Implementations only report failures to get a response at all; status
/// handling is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ConnectionFailure>;
}

/// [`Transport`] backed by `reqwest`
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(
            Self {
                client: Client::builder()
                    .default_headers(Self::default_headers())
                    .user_agent(config.user_agent())
                    .timeout(config.timeout())
                    .build()?,
            }
        )
    }

    fn default_headers() -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static(XML_CONTENT_TYPE));
        map
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ConnectionFailure> {
        let builder = match request {
            OutboundRequest::PostXml { url, body } => self.client
                .post(url)
                .header(CONTENT_TYPE, XML_CONTENT_TYPE)
                .header(CONTENT_LENGTH, body.len())
                .body(body),
            OutboundRequest::Get { url } => self.client.get(url),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
