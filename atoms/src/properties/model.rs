use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::GalleryImage;

/// A property listing as stored and served.
///
/// `property_id` is the public numeric id used in routes; it is assigned by
/// the store and is distinct from the storage key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub property_id: u64,
    #[serde(flatten)]
    pub details: PropertyDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every caller-editable attribute of a property.
///
/// `Default` is the creation template (see `template.rs`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub project: String,
    pub status: String,
    pub title: String,
    pub description: String,
    pub img_src: String,
    pub alt: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub map_src: String,
    pub lat: f64,
    pub long: f64,
    pub beds: u32,
    pub rooms: u32,
    pub baths: u32,
    pub sqm: u32,
    pub floor: String,
    pub block: String,
    pub price: f64,
    pub year_built: i32,
    pub features: Vec<Vec<String>>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub tags: Vec<String>,
    pub filter_options: Vec<String>,
    pub avatar: String,
    pub agent: String,
    pub order: i64,
    pub gallery: Vec<GalleryImage>,
}

impl PropertyDetails {
    pub fn into_property(self, property_id: u64, now: DateTime<Utc>) -> Property {
        Property {
            property_id,
            details: self,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One page of `list` results; `total` counts every match.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PropertyPage {
    pub properties: Vec<Property>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}
