//! Typed views over the payload, one per data step.
//!
//! Form inputs hold text, so scalar fields are read leniently: a JSON number
//! or boolean is accepted wherever text is expected. These types are also
//! exported as TypeScript bindings and JSON Schemas by `generate_types`.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::payload::value_text;

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_text))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        _ => Vec::new(),
    })
}

fn lenient_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_text)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_text)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0))
}

/// A nested object that reads as `None` when it has the wrong shape
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok()))
}

/// Step 1 fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct BasicInfo {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub price: Option<String>,
    /// ISO currency code; USD when unset
    #[serde(deserialize_with = "lenient_text")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub property_type: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

/// Step 2 fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct PropertyDetails {
    #[serde(deserialize_with = "lenient_text")]
    pub bedrooms: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bathrooms: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub square_footage: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub amenities: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub additional_features: Option<String>,
}

/// Step 3 fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct MediaSection {
    /// Image URLs in display order
    #[serde(deserialize_with = "lenient_list")]
    pub images: Vec<String>,
    /// Index into `images` of the cover photo
    #[serde(deserialize_with = "lenient_index")]
    pub primary_image_index: usize,
}

/// Postal address collected on step 4
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Address {
    #[serde(deserialize_with = "lenient_text")]
    pub street: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub zip_code: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(default)]
#[ts(export)]
pub struct Coordinates {
    #[serde(deserialize_with = "lenient_number")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub lng: f64,
}

/// Step 4 fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct LocationSection {
    #[serde(deserialize_with = "lenient_object")]
    pub address: Option<Address>,
    #[serde(deserialize_with = "lenient_text")]
    pub neighborhood: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub coordinates: Option<Coordinates>,
}

/// Kinds of property a listing can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
    Townhouse,
    Villa,
    Studio,
}

impl PropertyType {
    pub fn from_value(value: &str) -> Option<Self> {
        match value.trim() {
            "apartment" => Some(PropertyType::Apartment),
            "house" => Some(PropertyType::House),
            "condo" => Some(PropertyType::Condo),
            "townhouse" => Some(PropertyType::Townhouse),
            "villa" => Some(PropertyType::Villa),
            "studio" => Some(PropertyType::Studio),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
            PropertyType::Condo => "Condo",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::Villa => "Villa",
            PropertyType::Studio => "Studio",
        }
    }
}

/// Availability of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ListingStatus {
    Available,
    Rented,
    Sold,
    Pending,
}

impl ListingStatus {
    pub fn from_value(value: &str) -> Option<Self> {
        match value.trim() {
            "available" => Some(ListingStatus::Available),
            "rented" => Some(ListingStatus::Rented),
            "sold" => Some(ListingStatus::Sold),
            "pending" => Some(ListingStatus::Pending),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListingStatus::Available => "Available",
            ListingStatus::Rented => "Rented",
            ListingStatus::Sold => "Sold",
            ListingStatus::Pending => "Pending",
        }
    }
}

/// Supported listing currencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }
}

impl MediaSection {
    pub fn add_images(&mut self, urls: impl IntoIterator<Item = String>) {
        self.images.extend(urls);
    }

    /// Remove an image, shifting the primary index down when it sat at or
    /// after the removed slot. Returns false for an out-of-range index.
    pub fn remove_image(&mut self, index: usize) -> bool {
        if index >= self.images.len() {
            return false;
        }
        self.images.remove(index);
        if self.primary_image_index >= index && self.primary_image_index > 0 {
            self.primary_image_index -= 1;
        }
        true
    }

    pub fn set_primary(&mut self, index: usize) -> bool {
        if index >= self.images.len() {
            return false;
        }
        self.primary_image_index = index;
        true
    }

    /// Move an image, keeping the primary index on the same photo
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.images.len() || to >= self.images.len() {
            return false;
        }
        let moved = self.images.remove(from);
        self.images.insert(to, moved);

        let primary = self.primary_image_index;
        if primary == from {
            self.primary_image_index = to;
        } else if from < primary && to >= primary {
            self.primary_image_index = primary - 1;
        } else if from > primary && to <= primary {
            self.primary_image_index = primary + 1;
        }
        true
    }
}
