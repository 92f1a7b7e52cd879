//! Client for the Melissa Data WebSmart address check service.
//!
//! Addresses go out either as an XML batch of up to 100 records
//! ([`AddressClient::verify_batch`]) or as a single-record REST query
//! ([`AddressClient::verify_single`]). Responses come back as a generic tree,
//! see [`ServiceResponse`].

pub mod config;
pub mod error;
pub mod melissa;
pub mod record;

pub use config::ClientConfig;
pub use error::{ConfigError, ConnectionFailure, WebsmartError};
pub use record::{AddressField, AddressRecord};
pub use melissa::encode::{encode_query_string, encode_xml};
pub use melissa::model::{BatchRequest, MAX_BATCH_RECORDS};
pub use melissa::response::{decode_response, ResponseMap, ResponseValue, ServiceResponse};
pub use melissa::transport::{HttpTransport, OutboundRequest, Transport, TransportResponse};
pub use melissa::AddressClient;

pub use url::Url;
