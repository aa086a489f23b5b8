use std::fmt;

use serde::{Deserialize, Serialize};

/// A candidate address as the registry hands it out, before it belongs to anyone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddressRecord {
    pub postcode: String,
    pub house_number: String,
    pub street: String,
    pub city: String,
    pub lon: String,
    pub lat: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub house_number: String,
    pub postcode: String,
    pub city: String,
    pub lon: String,
    pub lat: String,
}

/// Fields to overwrite on top of a transformed record. `None` leaves the field alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressPatch {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub lon: Option<String>,
    pub lat: Option<String>,
}

impl AddressPatch {
    /// Blanks out everything a bare search result must not carry yet.
    pub fn search_result() -> Self {
        Self {
            id: Some(String::new()),
            first_name: Some(String::new()),
            last_name: Some(String::new()),
            lon: Some(String::new()),
            lat: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn person(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            ..Self::default()
        }
    }
}

impl Address {
    pub fn from_raw(raw: &RawAddressRecord, overrides: AddressPatch) -> Self {
        Self {
            street: raw.street.clone(),
            house_number: raw.house_number.clone(),
            postcode: raw.postcode.clone(),
            city: raw.city.clone(),
            lon: raw.lon.clone(),
            lat: raw.lat.clone(),
            ..Self::default()
        }
        .patched(overrides)
    }

    #[must_use]
    pub fn patched(mut self, patch: AddressPatch) -> Self {
        let AddressPatch {
            id,
            first_name,
            last_name,
            street,
            house_number,
            postcode,
            city,
            lon,
            lat,
        } = patch;

        for (field, value) in [
            (&mut self.id, id),
            (&mut self.first_name, first_name),
            (&mut self.last_name, last_name),
            (&mut self.street, street),
            (&mut self.house_number, house_number),
            (&mut self.postcode, postcode),
            (&mut self.city, city),
            (&mut self.lon, lon),
            (&mut self.lat, lat),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }

        self
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.first_name.is_empty() || !self.last_name.is_empty() {
            write!(f, "{} {}, ", self.first_name, self.last_name)?;
        }
        write!(
            f,
            "{} {}, {} {}",
            self.street, self.house_number, self.postcode, self.city
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    NSW,
    VIC,
    QLD,
    SA,
    WA,
    TAS,
    NT,
    ACT,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NSW => write!(f, "NSW"),
            Self::VIC => write!(f, "VIC"),
            Self::QLD => write!(f, "QLD"),
            Self::SA => write!(f, "SA"),
            Self::WA => write!(f, "WA"),
            Self::TAS => write!(f, "TAS"),
            Self::NT => write!(f, "NT"),
            Self::ACT => write!(f, "ACT"),
        }
    }
}

impl State {
    pub fn all() -> Vec<Self> {
        vec![
            Self::NSW,
            Self::VIC,
            Self::QLD,
            Self::SA,
            Self::WA,
            Self::TAS,
            Self::NT,
            Self::ACT,
        ]
    }
}
