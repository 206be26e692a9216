//! Review-step summary of the payload

use serde::de::DeserializeOwned;

use super::payload::FormPayload;
use super::sections::{
    Address, BasicInfo, Currency, ListingStatus, LocationSection, MediaSection, PropertyDetails,
    PropertyType,
};
use super::step::WizardStep;

const MISSING: &str = "-";

/// One block of the review screen, editable by jumping back to `step`
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSection {
    pub step: WizardStep,
    pub rows: Vec<(&'static str, String)>,
}

/// Build the review blocks for every data step
pub fn summarize(payload: &FormPayload) -> Vec<ReviewSection> {
    let basic: BasicInfo = section_or_default(payload, "basic info");
    let details: PropertyDetails = section_or_default(payload, "details");
    let media: MediaSection = section_or_default(payload, "media");
    let location: LocationSection = section_or_default(payload, "location");

    vec![
        ReviewSection {
            step: WizardStep::BasicInfo,
            rows: vec![
                ("Property Title", or_missing(basic.title.as_deref())),
                ("Description", or_missing(basic.description.as_deref())),
                (
                    "Price",
                    format_price(basic.price.as_deref(), basic.currency.as_deref()),
                ),
                (
                    "Property Type",
                    or_missing(
                        basic
                            .property_type
                            .as_deref()
                            .and_then(PropertyType::from_value)
                            .map(|t| t.label()),
                    ),
                ),
                (
                    "Status",
                    or_missing(
                        basic
                            .status
                            .as_deref()
                            .and_then(ListingStatus::from_value)
                            .map(|s| s.label()),
                    ),
                ),
            ],
        },
        ReviewSection {
            step: WizardStep::Details,
            rows: vec![
                ("Bedrooms", or_missing(details.bedrooms.as_deref())),
                ("Bathrooms", or_missing(details.bathrooms.as_deref())),
                (
                    "Square Footage",
                    details
                        .square_footage
                        .as_deref()
                        .map(|s| format!("{s} sq ft"))
                        .unwrap_or_else(|| MISSING.to_string()),
                ),
                (
                    "Amenities",
                    if details.amenities.is_empty() {
                        "No amenities selected".to_string()
                    } else {
                        details.amenities.join(", ")
                    },
                ),
                (
                    "Additional Features",
                    details
                        .additional_features
                        .unwrap_or_else(|| "No additional features".to_string()),
                ),
            ],
        },
        ReviewSection {
            step: WizardStep::Images,
            rows: vec![
                ("Images", media.images.len().to_string()),
                (
                    "Primary Image",
                    or_missing(media.images.get(media.primary_image_index).map(String::as_str)),
                ),
            ],
        },
        ReviewSection {
            step: WizardStep::Location,
            rows: vec![
                (
                    "Address",
                    location
                        .address
                        .as_ref()
                        .map(format_address)
                        .unwrap_or_else(|| MISSING.to_string()),
                ),
                (
                    "Neighborhood",
                    location
                        .neighborhood
                        .unwrap_or_else(|| "No neighborhood information".to_string()),
                ),
                (
                    "Coordinates",
                    location
                        .coordinates
                        .map(|c| format!("{:.6}, {:.6}", c.lat, c.lng))
                        .unwrap_or_else(|| "Not set".to_string()),
                ),
            ],
        },
    ]
}

fn section_or_default<T: DeserializeOwned + Default>(payload: &FormPayload, name: &str) -> T {
    payload.section().unwrap_or_else(|e| {
        tracing::warn!(section = name, error = %e, "Unreadable section in review");
        T::default()
    })
}

fn or_missing(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(MISSING)
        .to_string()
}

/// Price with currency symbol and thousands separators; unknown currencies use `$`
pub fn format_price(price: Option<&str>, currency: Option<&str>) -> String {
    let symbol = currency
        .and_then(Currency::from_code)
        .unwrap_or_default()
        .symbol();

    let Some(amount) = price.and_then(|p| p.trim().parse::<f64>().ok()) else {
        return MISSING.to_string();
    };
    if !amount.is_finite() {
        return MISSING.to_string();
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if fraction.is_empty() {
        format!("{sign}{symbol}{grouped}")
    } else {
        format!("{sign}{symbol}{grouped}.{fraction}")
    }
}

/// `street, city, state zip, country`
pub fn format_address(address: &Address) -> String {
    let part = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").to_string();
    format!(
        "{}, {}, {} {}, {}",
        part(&address.street),
        part(&address.city),
        part(&address.state),
        part(&address.zip_code),
        part(&address.country)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(Some("2500"), Some("USD")), "$2,500");
        assert_eq!(format_price(Some("1250000"), Some("EUR")), "€1,250,000");
        assert_eq!(format_price(Some("999.5"), Some("GBP")), "£999.5");
        assert_eq!(format_price(Some("100"), None), "$100");
        assert_eq!(format_price(Some("100"), Some("JPY")), "$100");
    }

    #[test]
    fn test_format_price_missing_or_invalid() {
        assert_eq!(format_price(None, Some("USD")), "-");
        assert_eq!(format_price(Some("lots"), None), "-");
    }

    #[test]
    fn test_format_address() {
        let address = Address {
            street: Some("123 Main Street".into()),
            city: Some("New York".into()),
            state: Some("NY".into()),
            zip_code: Some("10001".into()),
            country: Some("United States".into()),
        };
        assert_eq!(
            format_address(&address),
            "123 Main Street, New York, NY 10001, United States"
        );
    }

    #[test]
    fn test_summary_with_text_coordinates_keeps_address() {
        let mut payload = FormPayload::new();
        for (field, value) in [
            ("address.street", "1 Main St"),
            ("address.city", "Springfield"),
            ("address.state", "IL"),
            ("address.zipCode", "62701"),
            ("address.country", "United States"),
            ("coordinates.lat", "39.78"),
        ] {
            payload.set(field, json!(value));
        }

        let location = &summarize(&payload)[3];
        assert_eq!(location.step, WizardStep::Location);
        assert!(location.rows.contains(&(
            "Address",
            "1 Main St, Springfield, IL 62701, United States".to_string()
        )));
        assert!(location
            .rows
            .contains(&("Coordinates", "39.780000, 0.000000".to_string())));
    }

    #[test]
    fn test_summary_of_populated_payload() {
        let payload = FormPayload::from_value(json!({
            "title": "Luxury Downtown Apartment",
            "price": "2500",
            "currency": "USD",
            "propertyType": "apartment",
            "status": "available",
            "squareFootage": "1200",
            "amenities": ["wifi", "parking"],
            "images": ["a.jpg", "b.jpg"],
            "primaryImageIndex": 1,
            "coordinates": {"lat": 40.7128, "lng": -74.006}
        }))
        .unwrap();

        let sections = summarize(&payload);
        assert_eq!(sections.len(), 4);

        let basic = &sections[0];
        assert_eq!(basic.step, WizardStep::BasicInfo);
        assert!(basic.rows.contains(&("Price", "$2,500".to_string())));
        assert!(basic.rows.contains(&("Property Type", "Apartment".to_string())));
        assert!(basic.rows.contains(&("Description", "-".to_string())));

        let details = &sections[1];
        assert!(details.rows.contains(&("Square Footage", "1200 sq ft".to_string())));
        assert!(details.rows.contains(&("Amenities", "wifi, parking".to_string())));

        let media = &sections[2];
        assert!(media.rows.contains(&("Images", "2".to_string())));
        assert!(media.rows.contains(&("Primary Image", "b.jpg".to_string())));

        let location = &sections[3];
        assert!(location.rows.contains(&("Address", "-".to_string())));
        assert!(location
            .rows
            .contains(&("Coordinates", "40.712800, -74.006000".to_string())));
    }
}
