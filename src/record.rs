use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// A postal address as submitted to WebSmart
///
/// Every field is optional. The service itself requires `address1` and either
/// `city` + `state` or `zip`, but that rule is left to the service.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressRecord {
    pub company: Option<String>,
    /// only meaningful for Puerto Rican addresses
    pub urbanization: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub plus4: Option<String>,
    pub country: Option<String>,
    /// echoed back by the service to match a response to its request
    pub transmissionreference: Option<String>,
}

/// Recognized fields of an [`AddressRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Company,
    Urbanization,
    Address1,
    Address2,
    Suite,
    City,
    State,
    Zip,
    Plus4,
    Country,
    TransmissionReference,
}

impl AddressField {
    pub const ALL: [AddressField; 11] = [
        AddressField::Company,
        AddressField::Urbanization,
        AddressField::Address1,
        AddressField::Address2,
        AddressField::Suite,
        AddressField::City,
        AddressField::State,
        AddressField::Zip,
        AddressField::Plus4,
        AddressField::Country,
        AddressField::TransmissionReference,
    ];

    /// the lowercase key used in records and CSV headers
    pub fn name(self) -> &'static str {
        match self {
            AddressField::Company => "company",
            AddressField::Urbanization => "urbanization",
            AddressField::Address1 => "address1",
            AddressField::Address2 => "address2",
            AddressField::Suite => "suite",
            AddressField::City => "city",
            AddressField::State => "state",
            AddressField::Zip => "zip",
            AddressField::Plus4 => "plus4",
            AddressField::Country => "country",
            AddressField::TransmissionReference => "transmissionreference",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AddressField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        AddressField::ALL.into_iter()
            .find(|field| field.name() == lowered)
            .ok_or_else(|| s.to_string())
    }
}

impl AddressRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// builder-style setter
    pub fn with(mut self, field: AddressField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Value of `field`, treating an empty string as absent.
    pub fn get(&self, field: AddressField) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .filter(|value| !value.is_empty())
    }

    fn slot(&self, field: AddressField) -> &Option<String> {
        match field {
            AddressField::Company => &self.company,
            AddressField::Urbanization => &self.urbanization,
            AddressField::Address1 => &self.address1,
            AddressField::Address2 => &self.address2,
            AddressField::Suite => &self.suite,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Zip => &self.zip,
            AddressField::Plus4 => &self.plus4,
            AddressField::Country => &self.country,
            AddressField::TransmissionReference => &self.transmissionreference,
        }
    }

    fn slot_mut(&mut self, field: AddressField) -> &mut Option<String> {
        match field {
            AddressField::Company => &mut self.company,
            AddressField::Urbanization => &mut self.urbanization,
            AddressField::Address1 => &mut self.address1,
            AddressField::Address2 => &mut self.address2,
            AddressField::Suite => &mut self.suite,
            AddressField::City => &mut self.city,
            AddressField::State => &mut self.state,
            AddressField::Zip => &mut self.zip,
            AddressField::Plus4 => &mut self.plus4,
            AddressField::Country => &mut self.country,
            AddressField::TransmissionReference => &mut self.transmissionreference,
        }
    }

    /// Build a record from `(name, value)` pairs. Unknown names are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::default();
        for (name, value) in pairs {
            let field = name.as_ref().parse::<AddressField>()?;
            record.set(field, value);
        }
        Ok(record)
    }
}
