// Property listings: model, creation template, payloads, listing queries,
// the repository seam (DynamoDB and in-memory) and the HTTP handlers.
pub mod dynamo;
pub mod http;
pub mod model;
pub mod payload;
pub mod query;
pub mod repository;
pub mod service;
mod template;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use dynamo::DynamoPropertyRepository;
pub use http::{
    create_property_handler, delete_property_handler, get_property_handler, list_properties_handler,
    list_types_handler, listing_params, update_property_handler,
};
pub use model::{Property, PropertyDetails, PropertyPage};
pub use payload::{CreatePropertyPayload, PropertyPatch, REQUIRED_FIELDS_MESSAGE};
pub use query::{PageRequest, PropertyFilter};
pub use repository::PropertyRepository;
pub use service::UpdatedProperty;
