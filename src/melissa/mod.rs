use log::{debug, warn};
use crate::config::ClientConfig;
use crate::error::{ConnectionFailure, WebsmartError};
use crate::record::AddressRecord;
use crate::melissa::encode::{encode_query_string, encode_xml};
use crate::melissa::model::{BatchRequest, MAX_BATCH_RECORDS};
use crate::melissa::response::{decode_response, ServiceResponse};
use crate::melissa::transport::{HttpTransport, OutboundRequest, Transport};

pub mod encode;
pub mod model;
pub mod response;
pub mod transport;

/// Client for the Melissa Data WebSmart address check service
///
/// Every call performs exactly one request and returns once its response
/// has been decoded. Nothing is retried.
pub struct AddressClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl AddressClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, WebsmartError> {
        let transport = HttpTransport::new(&config).map_err(WebsmartError::ClientBuild)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> AddressClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Verify up to [`MAX_BATCH_RECORDS`] addresses through the XML interface.
    ///
    /// Size limits are checked before anything is sent.
    pub async fn verify_batch(&self, batch: &BatchRequest) -> Result<ServiceResponse, WebsmartError> {
        if batch.is_empty() {
            return Err(WebsmartError::EmptyBatch);
        }
        if batch.len() > MAX_BATCH_RECORDS {
            return Err(WebsmartError::TooManyRecords {
                count: batch.len(),
                limit: MAX_BATCH_RECORDS,
            });
        }

        let payload = encode_xml(&self.config, batch)?;
        let body = self.send_xml_request(payload).await?;
        self.decode(&body)
    }

    /// Verify a single address through the REST interface.
    pub async fn verify_single(&self, record: &AddressRecord) -> Result<ServiceResponse, WebsmartError> {
        let query = encode_query_string(&self.config, record);
        let body = self.send_rest_request(&query).await?;
        self.decode(&body)
    }

    async fn send_xml_request(&self, payload: Vec<u8>) -> Result<Vec<u8>, WebsmartError> {
        let url = self.config.xml_endpoint().clone();
        self.exchange(OutboundRequest::PostXml { url, body: payload }).await
    }

    async fn send_rest_request(&self, query: &str) -> Result<Vec<u8>, WebsmartError> {
        let mut url = self.config.rest_endpoint().clone();
        url.set_query(Some(query));
        self.exchange(OutboundRequest::Get { url }).await
    }

    /// send `request`, accepting only a successful status with a non-empty body
    async fn exchange(&self, request: OutboundRequest) -> Result<Vec<u8>, WebsmartError> {
        let url = request.url().clone();
        match &request {
            OutboundRequest::PostXml { body, .. } => debug!("POST [{}] with {} bytes", url, body.len()),
            OutboundRequest::Get { .. } => debug!("GET [{}]", url),
        }

        let response = self.transport.send(request).await
            .map_err(|failure| WebsmartError::connection(&url, failure))?;

        if !response.status.is_success() {
            warn!("service at [{}] answered with status {}", url, response.status);
            return Err(WebsmartError::connection(&url, ConnectionFailure::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }));
        }
        if response.body.iter().all(u8::is_ascii_whitespace) {
            warn!("service at [{}] answered with an empty body", url);
            return Err(WebsmartError::connection(&url, ConnectionFailure::EmptyBody));
        }
        Ok(response.body)
    }

    fn decode(&self, body: &[u8]) -> Result<ServiceResponse, WebsmartError> {
        decode_response(body).map_err(|err| {
            if let Some(raw) = err.body() {
                warn!("cannot decode service response: {} - body: {}", err, raw);
            }
            err
        })
    }
}
