use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

use crate::error::{PropertyError, PropertyResult};
use crate::media::GalleryImage;

use super::model::PropertyDetails;

pub const REQUIRED_FIELDS_MESSAGE: &str = "City, type, order, and gallery are required";

/// Body of `PUT /update-property/{id}`: every field optional, only the
/// provided ones are replaced. Unknown fields (`propertyId`, `createdAt`,
/// ...) are ignored.
///
/// The dashboard forms post numbers as text and `type` as either a single
/// string or a list, so both shapes are accepted.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub project: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub img_src: Option<String>,
    pub alt: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub map_src: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub long: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub beds: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub baths: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sqm: Option<u32>,
    pub floor: Option<String>,
    pub block: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year_built: Option<i32>,
    pub features: Option<Vec<Vec<String>>>,
    #[serde(rename = "type", default, deserialize_with = "string_or_list")]
    pub types: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub filter_options: Option<Vec<String>>,
    pub avatar: Option<String>,
    pub agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub order: Option<i64>,
    pub gallery: Option<Vec<GalleryImage>>,
}

impl PropertyPatch {
    /// Overwrites each provided field of `details`.
    pub fn apply(self, details: &mut PropertyDetails) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut details.project, self.project);
        set(&mut details.status, self.status);
        set(&mut details.title, self.title);
        set(&mut details.description, self.description);
        set(&mut details.img_src, self.img_src);
        set(&mut details.alt, self.alt);
        set(&mut details.address, self.address);
        set(&mut details.city, self.city);
        set(&mut details.country, self.country);
        set(&mut details.map_src, self.map_src);
        set(&mut details.lat, self.lat);
        set(&mut details.long, self.long);
        set(&mut details.beds, self.beds);
        set(&mut details.rooms, self.rooms);
        set(&mut details.baths, self.baths);
        set(&mut details.sqm, self.sqm);
        set(&mut details.floor, self.floor);
        set(&mut details.block, self.block);
        set(&mut details.price, self.price);
        set(&mut details.year_built, self.year_built);
        set(&mut details.features, self.features);
        set(&mut details.types, self.types);
        set(&mut details.tags, self.tags);
        set(&mut details.filter_options, self.filter_options);
        set(&mut details.avatar, self.avatar);
        set(&mut details.agent, self.agent);
        set(&mut details.order, self.order);
        set(&mut details.gallery, self.gallery);
    }
}

impl From<PropertyDetails> for PropertyPatch {
    /// A patch that sets every field.
    fn from(details: PropertyDetails) -> Self {
        Self {
            project: Some(details.project),
            status: Some(details.status),
            title: Some(details.title),
            description: Some(details.description),
            img_src: Some(details.img_src),
            alt: Some(details.alt),
            address: Some(details.address),
            city: Some(details.city),
            country: Some(details.country),
            map_src: Some(details.map_src),
            lat: Some(details.lat),
            long: Some(details.long),
            beds: Some(details.beds),
            rooms: Some(details.rooms),
            baths: Some(details.baths),
            sqm: Some(details.sqm),
            floor: Some(details.floor),
            block: Some(details.block),
            price: Some(details.price),
            year_built: Some(details.year_built),
            features: Some(details.features),
            types: Some(details.types),
            tags: Some(details.tags),
            filter_options: Some(details.filter_options),
            avatar: Some(details.avatar),
            agent: Some(details.agent),
            order: Some(details.order),
            gallery: Some(details.gallery),
        }
    }
}

/// Body of `POST /create-property`.
///
/// `city`, `type`, `order` and a non-empty `gallery` are required; any other
/// property field overrides the template.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct CreatePropertyPayload {
    #[serde(flatten)]
    pub fields: PropertyPatch,
}

impl CreatePropertyPayload {
    pub fn validate(&self) -> PropertyResult<()> {
        let fields = &self.fields;
        let has_city = fields.city.as_deref().is_some_and(|city| !city.trim().is_empty());
        let has_type = fields
            .types
            .as_ref()
            .is_some_and(|types| types.iter().any(|t| !t.trim().is_empty()));
        let has_gallery = fields.gallery.as_ref().is_some_and(|gallery| !gallery.is_empty());

        if has_city && has_type && has_gallery && fields.order.is_some() {
            Ok(())
        } else {
            Err(PropertyError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))
        }
    }

    /// Template merged with the caller's overrides.
    pub fn into_details(self) -> PropertyDetails {
        let mut details = PropertyDetails::default();
        self.fields.apply(&mut details);
        details
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Numbers the store can hold: `NaN` and infinities are not among them.
trait FiniteNumber {
    fn is_finite_number(&self) -> bool {
        true
    }
}

impl FiniteNumber for u32 {}
impl FiniteNumber for i32 {}
impl FiniteNumber for i64 {}

impl FiniteNumber for f64 {
    fn is_finite_number(&self) -> bool {
        self.is_finite()
    }
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + FiniteNumber,
    T::Err: Display,
{
    let value = match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(NumberOrText::Text(text)) => text.trim().parse().map_err(de::Error::custom)?,
    };

    if value.is_finite_number() {
        Ok(Some(value))
    } else {
        Err(de::Error::custom("expected a finite number"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(one)) if one.is_empty() => Some(Vec::new()),
        Some(OneOrMany::One(one)) => Some(vec![one]),
        Some(OneOrMany::Many(many)) => Some(many),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreatePropertyPayload {
        serde_json::from_value(body).expect("payload parses")
    }

    #[test]
    fn create_requires_city_type_order_and_gallery() {
        let gallery = json!([{ "src": "data:image/png;base64,aGVsbG8=" }]);

        let complete = create(json!({ "city": "Tyre", "type": ["villa"], "order": 1, "gallery": gallery }));
        assert!(complete.validate().is_ok());

        for body in [
            json!({ "type": ["villa"], "order": 1, "gallery": gallery }),
            json!({ "city": "", "type": ["villa"], "order": 1, "gallery": gallery }),
            json!({ "city": "Tyre", "order": 1, "gallery": gallery }),
            json!({ "city": "Tyre", "type": [], "order": 1, "gallery": gallery }),
            json!({ "city": "Tyre", "type": ["villa"], "gallery": gallery }),
            json!({ "city": "Tyre", "type": ["villa"], "order": "", "gallery": gallery }),
            json!({ "city": "Tyre", "type": ["villa"], "order": 1 }),
            json!({ "city": "Tyre", "type": ["villa"], "order": 1, "gallery": [] }),
        ] {
            let err = create(body.clone()).validate().unwrap_err();
            assert!(matches!(err, PropertyError::Validation(_)), "{body}");
        }
    }

    #[test]
    fn accepts_form_shaped_values() {
        let payload = create(json!({
            "city": "Beirut",
            "type": "chalet",
            "order": "7",
            "beds": "3",
            "gallery": [{ "src": "x" }],
        }));

        assert_eq!(payload.fields.types, Some(vec!["chalet".to_string()]));
        assert_eq!(payload.fields.order, Some(7));
        assert_eq!(payload.fields.beds, Some(3));
    }

    #[test]
    fn rejects_non_numeric_order() {
        let parsed = serde_json::from_value::<PropertyPatch>(json!({ "order": "first" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_non_finite_numbers() {
        for body in [
            json!({ "price": "NaN" }),
            json!({ "lat": "inf" }),
            json!({ "long": "-infinity" }),
            json!({ "price": "1e400" }),
        ] {
            assert!(serde_json::from_value::<PropertyPatch>(body.clone()).is_err(), "{body}");
        }

        let patch: PropertyPatch = serde_json::from_value(json!({ "price": "1.5e3" })).unwrap();
        assert_eq!(patch.price, Some(1500.0));
    }

    #[test]
    fn order_zero_counts_as_present() {
        let payload = create(json!({ "city": "Tyre", "type": "villa", "order": 0, "gallery": [{ "src": "x" }] }));
        assert!(payload.validate().is_ok());

        let payload = create(json!({ "city": "   ", "type": "villa", "order": 0, "gallery": [{ "src": "x" }] }));
        assert!(payload.validate().is_err());
    }

    #[test]
    fn overrides_are_applied_over_template() {
        let details = create(json!({
            "city": "Sidon",
            "type": ["villa", "chalet"],
            "order": 2,
            "price": 250000,
            "gallery": [],
        }))
        .into_details();

        let template = PropertyDetails::default();
        assert_eq!(details.city, "Sidon");
        assert_eq!(details.types, vec!["villa".to_string(), "chalet".to_string()]);
        assert_eq!(details.order, 2);
        assert_eq!(details.price, 250000.0);
        assert!(details.gallery.is_empty());
        assert_eq!(details.title, template.title);
        assert_eq!(details.project, "mila one");
        assert_eq!(details.features, template.features);
    }

    #[test]
    fn patch_ignores_read_only_fields() {
        let patch: PropertyPatch = serde_json::from_value(json!({
            "propertyId": 99,
            "createdAt": "2020-01-01T00:00:00Z",
            "title": "Penthouse",
        }))
        .unwrap();

        let mut details = PropertyDetails::default();
        patch.apply(&mut details);
        assert_eq!(details.title, "Penthouse");
        assert_eq!(details.city, "Tyre");
    }
}
