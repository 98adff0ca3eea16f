use std::sync::Arc;

use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use mila_atoms::properties;
use mila_atoms::response::{error_response, method_not_allowed, not_found};
use mila_shared::{auth, AppState};

const LISTING_PARAMS: [&str; 5] = ["search", "project", "types", "page", "limit"];

fn with_cors_headers(mut resp: Response<Body>, request_origin: Option<&str>, allowed: &[String]) -> Response<Body> {
    let cors_origin = auth::get_cors_origin(request_origin, allowed);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    if auth::allows_credentials(allowed) {
        headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
    }
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    request_origin: Option<&str>,
    allowed: &[String],
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, request_origin, allowed))
}

/// Routes this API serves; the id segments are still raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    ListProperties,
    GetProperty(&'a str),
    ListTypes,
    CreateProperty,
    UpdateProperty(&'a str),
    DeleteProperty(&'a str),
}

impl<'a> Route<'a> {
    fn resolve(parts: &[&'a str]) -> Option<Self> {
        Some(match parts {
            ["get-all-properties"] => Route::ListProperties,
            ["property", id] => Route::GetProperty(*id),
            ["types"] => Route::ListTypes,
            ["create-property"] => Route::CreateProperty,
            ["update-property", id] => Route::UpdateProperty(*id),
            ["delete-property", id] => Route::DeleteProperty(*id),
            _ => return None,
        })
    }

    fn method(&self) -> Method {
        match self {
            Route::ListProperties | Route::GetProperty(_) | Route::ListTypes => Method::GET,
            Route::CreateProperty => Method::POST,
            Route::UpdateProperty(_) => Method::PUT,
            Route::DeleteProperty(_) => Method::DELETE,
        }
    }

    fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::CreateProperty | Route::UpdateProperty(_) | Route::DeleteProperty(_)
        )
    }
}

/// Query pairs from the API Gateway event, or from the URI when the event
/// carries none (direct invocations).
fn query_pairs(event: &Request, keys: &[&str]) -> Vec<(String, String)> {
    let params = event.query_string_parameters_ref();
    if let Some(params) = params {
        let pairs: Vec<(String, String)> = keys
            .iter()
            .flat_map(|key| {
                params
                    .all(key)
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |value| (key.to_string(), value.to_string()))
            })
            .collect();
        if !pairs.is_empty() {
            return pairs;
        }
    }

    event
        .uri()
        .query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .filter(|(key, _)| keys.contains(&key.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

/// Main Lambda handler - routes property requests
pub async fn function_handler(event: Request, state: Arc<AppState>) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    let allowed_origins = state.config.cors_allowed_origins.as_slice();
    tracing::info!("API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, request_origin, allowed_origins));
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(route) = Route::resolve(&parts) else {
        tracing::warn!("No route matched - Method: {} Path: {}", method, path);
        return finalize_response(not_found(), request_origin, allowed_origins);
    };

    if method != route.method() {
        return finalize_response(method_not_allowed(), request_origin, allowed_origins);
    }

    if route.requires_auth() {
        if let Err(e) = state.guard.authorize(event.headers()) {
            tracing::warn!("Rejected {} {}: {}", method, path, e);
            return finalize_response(
                error_response(StatusCode::UNAUTHORIZED, &e.to_string()),
                request_origin,
                allowed_origins,
            );
        }
    }

    let repo = state.properties.as_ref();
    let resp = match route {
        // GET /get-all-properties?search=&project=&types=&page=&limit=
        Route::ListProperties => {
            let (filter, page) = properties::listing_params(query_pairs(&event, &LISTING_PARAMS));
            properties::list_properties_handler(repo, &filter, page).await
        }
        // GET /property/{id}
        Route::GetProperty(id) => properties::get_property_handler(repo, id).await,
        // GET /types?project=
        Route::ListTypes => {
            let project = query_pairs(&event, &["project"]).into_iter().next().map(|(_, v)| v);
            properties::list_types_handler(repo, project.as_deref()).await
        }
        // POST /create-property
        Route::CreateProperty => {
            properties::create_property_handler(repo, state.storage.as_ref(), body).await
        }
        // PUT /update-property/{id}
        Route::UpdateProperty(id) => {
            properties::update_property_handler(repo, state.storage.clone(), id, body).await
        }
        // DELETE /delete-property/{id}
        Route::DeleteProperty(id) => properties::delete_property_handler(repo, id).await,
    };

    finalize_response(resp, request_origin, allowed_origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_paths() {
        assert_eq!(Route::resolve(&["property", "7"]), Some(Route::GetProperty("7")));
        assert_eq!(Route::resolve(&["update-property", "7"]).map(|r| r.method()), Some(Method::PUT));
        assert_eq!(Route::resolve(&["property"]), None);
        assert_eq!(Route::resolve(&["properties", "7", "extra"]), None);
    }

    #[test]
    fn only_writes_are_guarded() {
        assert!(!Route::ListProperties.requires_auth());
        assert!(!Route::GetProperty("1").requires_auth());
        assert!(Route::CreateProperty.requires_auth());
        assert!(Route::DeleteProperty("1").requires_auth());
    }

    #[test]
    fn query_falls_back_to_uri() {
        let event = lambda_http::http::Request::builder()
            .uri("https://api.test/get-all-properties?types=villa&types=chalet%2Ccommercial&page=2&other=x")
            .body(Body::Empty)
            .unwrap();

        let pairs = query_pairs(&event, &LISTING_PARAMS);

        assert_eq!(
            pairs,
            vec![
                ("types".to_string(), "villa".to_string()),
                ("types".to_string(), "chalet,commercial".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }
}
