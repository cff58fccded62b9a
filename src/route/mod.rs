//! Boundary types for the route catalog. The catalog itself (fetching and
//! normalising route groups) lives outside this crate; these are the values
//! it hands over.

mod method;
mod model;
mod schema;

pub use method::HttpMethod;
pub use model::{Handler, RouteDescriptor};
pub use schema::{default_body, default_body_text, FieldRule, SchemaCatalog, ValidationSchema};
