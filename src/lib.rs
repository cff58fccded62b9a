pub mod error;
pub mod outcome;
pub mod params;
pub mod route;
pub mod stats;
pub mod validate;

#[cfg(feature = "cli")]
pub mod config;
#[cfg(feature = "cli")]
pub mod executor;
#[cfg(feature = "cli")]
pub mod session;

pub use error::ValidationError;
pub use outcome::{shape, BatchStatistics, RequestContext, ResponseData, SingleResult, TestOutcome};
pub use route::{HttpMethod, RouteDescriptor};
pub use validate::HeaderMapping;
