use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};

use crate::error::{PropertyError, PropertyResult};
use crate::media::GalleryImage;

use super::model::{Property, PropertyDetails, PropertyPage};
use super::payload::PropertyPatch;
use super::query::{self, PageRequest, PropertyFilter};
use super::repository::PropertyRepository;

const PROPERTY_PK: &str = "PROPERTY";
const PROPERTY_SK_PREFIX: &str = "PROPERTY#";
const COUNTER_PK: &str = "COUNTER";
const COUNTER_SK: &str = "PROPERTY";

type Item = HashMap<String, AttributeValue>;

/// Properties in a single DynamoDB table:
/// PK = "PROPERTY"
/// SK = "PROPERTY#{zero padded property_id}"
///
/// The id counter is its own item (PK = "COUNTER", SK = "PROPERTY").
#[derive(Debug, Clone)]
pub struct DynamoPropertyRepository {
    client: DynamoClient,
    table_name: String,
}

impl DynamoPropertyRepository {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Load every property record (pure storage access, no filtering)
    async fn load_all(&self) -> PropertyResult<Vec<Property>> {
        let mut properties = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(PROPERTY_PK.to_string()))
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(PROPERTY_SK_PREFIX.to_string()),
                )
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        "DynamoDB property query failed for table {}: {}",
                        self.table_name,
                        DisplayErrorContext(&e)
                    );
                    PropertyError::persistence(DisplayErrorContext(&e))
                })?;

            for item in result.items() {
                properties.push(property_from_item(item)?);
            }

            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(properties)
    }

    /// Atomically advance the id counter and return the new value
    async fn next_property_id(&self) -> PropertyResult<u64> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(COUNTER_PK.to_string()))
            .key("SK", AttributeValue::S(COUNTER_SK.to_string()))
            .update_expression("ADD next_id :one")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| PropertyError::persistence(DisplayErrorContext(&e)))?;

        result
            .attributes()
            .and_then(|attrs| attrs.get("next_id"))
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| PropertyError::Persistence("property id counter returned no value".to_string()))
    }
}

#[async_trait]
impl PropertyRepository for DynamoPropertyRepository {
    async fn list(&self, filter: &PropertyFilter, page: PageRequest) -> PropertyResult<PropertyPage> {
        let properties = self.load_all().await?;
        Ok(query::select_page(properties, filter, page))
    }

    async fn get(&self, property_id: u64) -> PropertyResult<Option<Property>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(PROPERTY_PK.to_string()))
            .key("SK", AttributeValue::S(property_sk(property_id)))
            .send()
            .await
            .map_err(|e| PropertyError::persistence(DisplayErrorContext(&e)))?;

        result.item().map(property_from_item).transpose()
    }

    async fn distinct_types(&self, project: Option<&str>) -> PropertyResult<Vec<String>> {
        let properties = self.load_all().await?;
        Ok(query::distinct_types(&properties, project))
    }

    async fn create(&self, details: PropertyDetails) -> PropertyResult<Property> {
        let property_id = self.next_property_id().await?;
        let property = details.into_property(property_id, Utc::now());

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(property_to_item(&property)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("DynamoDB put_item failed for property {}: {}", property_id, DisplayErrorContext(&e));
                PropertyError::persistence(DisplayErrorContext(&e))
            })?;

        Ok(property)
    }

    async fn update(&self, property_id: u64, patch: PropertyPatch) -> PropertyResult<Property> {
        let mut attributes = patch_attributes(&patch);
        attributes.push(("updated_at", timestamp(&Utc::now())));

        let mut update_expr = Vec::with_capacity(attributes.len());
        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(PROPERTY_PK.to_string()))
            .key("SK", AttributeValue::S(property_sk(property_id)))
            .condition_expression("attribute_exists(PK)")
            .return_values(ReturnValue::AllNew);

        for (i, (name, value)) in attributes.into_iter().enumerate() {
            update_expr.push(format!("#f{i} = :v{i}"));
            builder = builder
                .expression_attribute_names(format!("#f{i}"), name)
                .expression_attribute_values(format!(":v{i}"), value);
        }

        let result = builder
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_conditional_check_failed_exception() => {
                    PropertyError::NotFound(property_id)
                }
                _ => PropertyError::persistence(DisplayErrorContext(&e)),
            })?;

        let item = result
            .attributes()
            .ok_or_else(|| PropertyError::Persistence("update returned no attributes".to_string()))?;
        property_from_item(item)
    }

    async fn delete(&self, property_id: u64) -> PropertyResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(PROPERTY_PK.to_string()))
            .key("SK", AttributeValue::S(property_sk(property_id)))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_conditional_check_failed_exception() => {
                    PropertyError::NotFound(property_id)
                }
                _ => PropertyError::persistence(DisplayErrorContext(&e)),
            })?;

        Ok(())
    }
}

// ITEM CONVERSION

fn property_sk(property_id: u64) -> String {
    format!("{}{:010}", PROPERTY_SK_PREFIX, property_id)
}

fn string(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

fn number(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().map(|v| string(v)).collect())
}

fn timestamp(value: &DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(value.to_rfc3339())
}

fn gallery_list(images: &[GalleryImage]) -> AttributeValue {
    AttributeValue::L(
        images
            .iter()
            .map(|image| {
                AttributeValue::M(HashMap::from([
                    ("src".to_string(), string(&image.src)),
                    ("href".to_string(), string(&image.href)),
                    ("class_name".to_string(), string(&image.class_name)),
                ]))
            })
            .collect(),
    )
}

/// Attribute name/value pairs for every field present in `patch`
fn patch_attributes(patch: &PropertyPatch) -> Vec<(&'static str, AttributeValue)> {
    let mut attrs = Vec::new();

    let strings = [
        ("project", &patch.project),
        ("status", &patch.status),
        ("title", &patch.title),
        ("description", &patch.description),
        ("img_src", &patch.img_src),
        ("alt", &patch.alt),
        ("address", &patch.address),
        ("city", &patch.city),
        ("country", &patch.country),
        ("map_src", &patch.map_src),
        ("floor", &patch.floor),
        ("block", &patch.block),
        ("avatar", &patch.avatar),
        ("agent", &patch.agent),
    ];
    for (name, value) in strings {
        if let Some(value) = value {
            attrs.push((name, string(value)));
        }
    }

    let counts = [
        ("beds", patch.beds),
        ("rooms", patch.rooms),
        ("baths", patch.baths),
        ("sqm", patch.sqm),
    ];
    for (name, value) in counts {
        if let Some(value) = value {
            attrs.push((name, number(value)));
        }
    }

    let decimals = [("lat", patch.lat), ("long", patch.long), ("price", patch.price)];
    for (name, value) in decimals {
        if let Some(value) = value {
            attrs.push((name, number(value)));
        }
    }

    if let Some(year_built) = patch.year_built {
        attrs.push(("year_built", number(year_built)));
    }
    if let Some(order) = patch.order {
        attrs.push(("order", number(order)));
    }

    let lists = [
        ("types", &patch.types),
        ("tags", &patch.tags),
        ("filter_options", &patch.filter_options),
    ];
    for (name, value) in lists {
        if let Some(value) = value {
            attrs.push((name, string_list(value)));
        }
    }

    if let Some(features) = &patch.features {
        attrs.push((
            "features",
            AttributeValue::L(features.iter().map(|group| string_list(group)).collect()),
        ));
    }
    if let Some(gallery) = &patch.gallery {
        attrs.push(("gallery", gallery_list(gallery)));
    }

    attrs
}

fn property_to_item(property: &Property) -> Item {
    let mut item = Item::new();
    item.insert("PK".to_string(), string(PROPERTY_PK));
    item.insert("SK".to_string(), AttributeValue::S(property_sk(property.property_id)));
    item.insert("property_id".to_string(), number(property.property_id));
    item.insert("created_at".to_string(), timestamp(&property.created_at));
    item.insert("updated_at".to_string(), timestamp(&property.updated_at));

    for (name, value) in patch_attributes(&PropertyPatch::from(property.details.clone())) {
        item.insert(name.to_string(), value);
    }
    item
}

fn get_string(item: &Item, name: &str) -> String {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn get_number<T: std::str::FromStr + Default>(item: &Item, name: &str) -> T {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .unwrap_or_default()
}

fn as_string_list(value: &AttributeValue) -> Vec<String> {
    value
        .as_l()
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_s().ok())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn get_string_list(item: &Item, name: &str) -> Vec<String> {
    item.get(name).map(as_string_list).unwrap_or_default()
}

fn get_timestamp(item: &Item, name: &str) -> DateTime<Utc> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn get_gallery(item: &Item) -> Vec<GalleryImage> {
    let Some(Ok(images)) = item.get("gallery").map(|v| v.as_l()) else {
        return Vec::new();
    };

    images
        .iter()
        .filter_map(|v| v.as_m().ok())
        .map(|image| GalleryImage {
            src: get_string(image, "src"),
            href: get_string(image, "href"),
            class_name: get_string(image, "class_name"),
        })
        .collect()
}

fn property_from_item(item: &Item) -> PropertyResult<Property> {
    let property_id = item
        .get("property_id")
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| PropertyError::Persistence("property item without property_id".to_string()))?;

    let features = item
        .get("features")
        .and_then(|v| v.as_l().ok())
        .map(|groups| groups.iter().map(as_string_list).collect())
        .unwrap_or_default();

    Ok(Property {
        property_id,
        details: PropertyDetails {
            project: get_string(item, "project"),
            status: get_string(item, "status"),
            title: get_string(item, "title"),
            description: get_string(item, "description"),
            img_src: get_string(item, "img_src"),
            alt: get_string(item, "alt"),
            address: get_string(item, "address"),
            city: get_string(item, "city"),
            country: get_string(item, "country"),
            map_src: get_string(item, "map_src"),
            lat: get_number(item, "lat"),
            long: get_number(item, "long"),
            beds: get_number(item, "beds"),
            rooms: get_number(item, "rooms"),
            baths: get_number(item, "baths"),
            sqm: get_number(item, "sqm"),
            floor: get_string(item, "floor"),
            block: get_string(item, "block"),
            price: get_number(item, "price"),
            year_built: get_number(item, "year_built"),
            features,
            types: get_string_list(item, "types"),
            tags: get_string_list(item, "tags"),
            filter_options: get_string_list(item, "filter_options"),
            avatar: get_string(item, "avatar"),
            agent: get_string(item, "agent"),
            order: get_number(item, "order"),
            gallery: get_gallery(item),
        },
        created_at: get_timestamp(item, "created_at"),
        updated_at: get_timestamp(item, "updated_at"),
    })
}
