use crate::record::{AddressField, AddressRecord};

/// Largest batch the XML interface accepts in one request.
pub const MAX_BATCH_RECORDS: usize = 100;

pub const XML_ENDPOINT: &str = "https://addresscheck.melissadata.net/v2/XML/Service.svc/doAddressCheck";
pub const REST_ENDPOINT: &str = "https://addresscheck.melissadata.net/v2/REST/Service.svc/doAddressCheck";

/// How one record field is carried on each interface.
#[derive(Debug, Clone, Copy)]
pub struct FieldEncoding {
    pub field: AddressField,
    /// element inside `<Record>`, `None` when not sent per record
    pub xml_element: Option<&'static str>,
    /// query parameter, `None` when not sent over REST
    pub rest_param: Option<&'static str>,
}

const fn encoding(field: AddressField, xml_element: Option<&'static str>, rest_param: Option<&'static str>) -> FieldEncoding {
    FieldEncoding { field, xml_element, rest_param }
}

/// Field mapping shared by both encoders, in wire order.
pub const FIELD_ENCODINGS: [FieldEncoding; 11] = [
    encoding(AddressField::TransmissionReference, None, Some("t")),
    encoding(AddressField::Company, Some("Company"), Some("comp")),
    encoding(AddressField::Urbanization, Some("Urbanization"), Some("u")),
    encoding(AddressField::Address1, Some("AddressLine1"), Some("a1")),
    encoding(AddressField::Address2, Some("AddressLine2"), Some("a2")),
    encoding(AddressField::Suite, Some("Suite"), Some("ste")),
    encoding(AddressField::City, Some("City"), Some("city")),
    encoding(AddressField::State, Some("State"), Some("state")),
    encoding(AddressField::Zip, Some("Zip"), Some("zip")),
    encoding(AddressField::Plus4, Some("Plus4"), None),
    encoding(AddressField::Country, Some("Country"), Some("ctry")),
];

/// Records submitted together through the XML interface
///
/// Each record's `RecordID` on the wire is its index in `records`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub records: Vec<AddressRecord>,
    /// sent once as the top-level `TransmissionReference`
    pub transmission_reference: Option<String>,
}

impl BatchRequest {
    pub fn new(records: Vec<AddressRecord>) -> Self {
        Self {
            records,
            transmission_reference: None,
        }
    }

    pub fn with_transmission_reference(mut self, reference: impl Into<String>) -> Self {
        self.transmission_reference = Some(reference.into());
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<AddressRecord>> for BatchRequest {
    fn from(records: Vec<AddressRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<AddressRecord> for BatchRequest {
    fn from_iter<T: IntoIterator<Item = AddressRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
