mod model;
mod shape;

pub use model::{
    BatchStatistics, RequestContext, ResponseData, SingleResult, TestOutcome, NETWORK_ERROR,
};
pub use shape::{shape, EXECUTION_FAILED};
