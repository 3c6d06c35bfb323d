//! Postal address owned by a single student.

use serde::{Deserialize, Serialize};

/// Surrogate key of an `addresses` row.
pub type AddressId = i64;

/// Postal details of one student.
///
/// An address has no life of its own once attached: deleting or detaching
/// it from the owning student removes the row. Every field apart from `id`
/// is optional; `Address::default()` is an empty, unsaved address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Option<AddressId>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Street and house number line.
    pub street: Option<String>,
    pub zip_code: Option<u32>,
}

impl Address {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn with_zip_code(mut self, zip_code: u32) -> Self {
        self.zip_code = Some(zip_code);
        self
    }
}
