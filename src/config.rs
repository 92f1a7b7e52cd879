use std::sync::LazyLock;
use std::time::Duration;
use url::Url;
use crate::error::ConfigError;
use crate::melissa::model::{REST_ENDPOINT, XML_ENDPOINT};

static DEFAULT_XML_URL: LazyLock<Url> = LazyLock::new(|| Url::parse(XML_ENDPOINT).unwrap());
static DEFAULT_REST_URL: LazyLock<Url> = LazyLock::new(|| Url::parse(REST_ENDPOINT).unwrap());

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_UA: &str = concat!("websmart/", env!("CARGO_PKG_VERSION"));

const ENV_CUSTOMER_ID: &str = "WEBSMART_CUSTOMER_ID";
const ENV_PARSE_ADDRESS: &str = "WEBSMART_PARSE_ADDRESS";
const ENV_XML_URL: &str = "WEBSMART_XML_URL";
const ENV_REST_URL: &str = "WEBSMART_REST_URL";
const ENV_TIMEOUT_SECS: &str = "WEBSMART_TIMEOUT_SECS";

/// Settings an [`AddressClient`](crate::melissa::AddressClient) is built with.
///
/// Built once by the embedding application and handed to the client, which
/// owns it for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    customer_id: String,
    parse_address: bool,
    xml_endpoint: Url,
    rest_endpoint: Url,
    timeout: Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Config for `customer_id` against the public Melissa Data endpoints,
    /// with parsed addresses requested.
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            parse_address: true,
            xml_endpoint: DEFAULT_XML_URL.clone(),
            rest_endpoint: DEFAULT_REST_URL.clone(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_UA.to_string(),
        }
    }

    pub fn with_parse_address(mut self, parse_address: bool) -> Self {
        self.parse_address = parse_address;
        self
    }

    pub fn with_xml_endpoint(mut self, url: Url) -> Self {
        self.xml_endpoint = url;
        self
    }

    pub fn with_rest_endpoint(mut self, url: Url) -> Self {
        self.rest_endpoint = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn parse_address(&self) -> bool {
        self.parse_address
    }

    pub fn xml_endpoint(&self) -> &Url {
        &self.xml_endpoint
    }

    pub fn rest_endpoint(&self) -> &Url {
        &self.rest_endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Load configuration from `WEBSMART_*` environment variables.
    ///
    /// `WEBSMART_CUSTOMER_ID` is required; everything else falls back to the
    /// defaults of [`ClientConfig::new`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let customer_id = optional(ENV_CUSTOMER_ID)
            .ok_or_else(|| ConfigError::MissingVariable(ENV_CUSTOMER_ID.to_string()))?;
        let mut config = Self::new(customer_id.trim());

        if let Some(value) = optional(ENV_PARSE_ADDRESS) {
            let parse_address = parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_PARSE_ADDRESS.to_string(),
                value: value.clone(),
            })?;
            config = config.with_parse_address(parse_address);
        }
        if let Some(value) = optional(ENV_XML_URL) {
            config = config.with_xml_endpoint(parse_url(&value)?);
        }
        if let Some(value) = optional(ENV_REST_URL) {
            config = config.with_rest_endpoint(parse_url(&value)?);
        }
        if let Some(value) = optional(ENV_TIMEOUT_SECS) {
            let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS.to_string(),
                value: value.clone(),
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    let value = value.trim();
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        url: value.to_string(),
        source,
    })
}
