use std::sync::Arc;

use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use crate::media::ObjectStorage;
use crate::response::{error_response, json_response, property_error_response};

use super::payload::{CreatePropertyPayload, PropertyPatch};
use super::query::{PageRequest, PropertyFilter};
use super::repository::PropertyRepository;
use super::service;

/// Builds the listing filter and page from `?search=&project=&types=&page=&limit=`.
///
/// `types` may repeat and each value may hold a comma-separated list.
/// Unparseable `page`/`limit` fall back to the defaults.
pub fn listing_params<I, K, V>(params: I) -> (PropertyFilter, PageRequest)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut project = None;
    let mut search = None;
    let mut types = Vec::new();
    let mut page = None;
    let mut limit = None;

    for (key, value) in params {
        let value = value.as_ref();
        match key.as_ref() {
            "project" => project = Some(value.to_string()),
            "search" => search = Some(value.to_string()),
            "types" => types.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            ),
            "page" => page = value.trim().parse().ok(),
            "limit" => limit = value.trim().parse().ok(),
            _ => {}
        }
    }

    (
        PropertyFilter::new(project, search, types),
        PageRequest::new(page, limit),
    )
}

fn parse_property_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn invalid_id() -> Result<Response<Body>, LambdaError> {
    error_response(StatusCode::BAD_REQUEST, "Invalid property id")
}

/// HTTP Handler: GET /get-all-properties
pub async fn list_properties_handler(
    repo: &dyn PropertyRepository,
    filter: &PropertyFilter,
    page: PageRequest,
) -> Result<Response<Body>, LambdaError> {
    match service::list_properties(repo, filter, page).await {
        Ok(page) => json_response(StatusCode::OK, &page),
        Err(e) => {
            tracing::error!("Failed to list properties: {}", e);
            property_error_response(&e)
        }
    }
}

/// HTTP Handler: GET /property/{id}
pub async fn get_property_handler(
    repo: &dyn PropertyRepository,
    raw_id: &str,
) -> Result<Response<Body>, LambdaError> {
    let Some(property_id) = parse_property_id(raw_id) else {
        return invalid_id();
    };

    match service::get_property(repo, property_id).await {
        Ok(property) => json_response(StatusCode::OK, &property),
        Err(e) => property_error_response(&e),
    }
}

/// HTTP Handler: GET /types
pub async fn list_types_handler(
    repo: &dyn PropertyRepository,
    project: Option<&str>,
) -> Result<Response<Body>, LambdaError> {
    let project = project.filter(|p| !p.is_empty());
    match service::list_types(repo, project).await {
        Ok(types) => json_response(StatusCode::OK, &types),
        Err(e) => {
            tracing::error!("Failed to list property types: {}", e);
            property_error_response(&e)
        }
    }
}

/// HTTP Handler: POST /create-property
pub async fn create_property_handler(
    repo: &dyn PropertyRepository,
    storage: &dyn ObjectStorage,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: CreatePropertyPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e)),
    };

    match service::create_property(repo, storage, payload).await {
        Ok(property) => json_response(StatusCode::CREATED, &property),
        Err(e) => property_error_response(&e),
    }
}

/// HTTP Handler: PUT /update-property/{id}
///
/// Responds once the record is written; superseded gallery files are
/// deleted in the background.
pub async fn update_property_handler(
    repo: &dyn PropertyRepository,
    storage: Arc<dyn ObjectStorage>,
    raw_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let Some(property_id) = parse_property_id(raw_id) else {
        return invalid_id();
    };

    let patch: PropertyPatch = match serde_json::from_slice(body) {
        Ok(patch) => patch,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e)),
    };

    match service::update_property(repo, storage, property_id, patch).await {
        Ok(updated) => json_response(StatusCode::OK, &updated.property),
        Err(e) => property_error_response(&e),
    }
}

/// HTTP Handler: DELETE /delete-property/{id}
pub async fn delete_property_handler(
    repo: &dyn PropertyRepository,
    raw_id: &str,
) -> Result<Response<Body>, LambdaError> {
    let Some(property_id) = parse_property_id(raw_id) else {
        return invalid_id();
    };

    match service::delete_property(repo, property_id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": "Property deleted successfully" }),
        ),
        Err(e) => property_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_accept_repeats_and_commas() {
        let (filter, page) = listing_params([
            ("types", "villa,chalet"),
            ("types", " commercial "),
            ("search", "Sea"),
            ("page", "2"),
        ]);

        assert_eq!(filter.types, vec!["villa", "chalet", "commercial"]);
        assert_eq!(filter.search.as_deref(), Some("sea"));
        assert_eq!(page, PageRequest::new(Some(2), None));
    }

    #[test]
    fn bad_paging_falls_back_to_defaults() {
        let (filter, page) = listing_params([("page", "abc"), ("limit", ""), ("project", "")]);

        assert_eq!(page, PageRequest::default());
        assert_eq!(filter, PropertyFilter::default());
    }

    #[test]
    fn property_ids_must_be_numeric() {
        assert_eq!(parse_property_id("42"), Some(42));
        assert_eq!(parse_property_id("abc"), None);
        assert_eq!(parse_property_id("-1"), None);
    }
}
