mod batch;
mod models;
mod printer;
mod runner;
mod transport;

pub use batch::{run_batch, BatchCount, BatchError, MAX_BATCH_COUNT};
pub use models::{BatchMode, BatchOptions, BatchRun, Progress, RequestSpec};
pub use printer::print_outcome;
pub use runner::RequestExecutor;
pub use transport::{
    OutboundRequest, ReqwestTransport, Transport, TransportError, TransportResponse,
};

#[cfg(test)]
pub(crate) use transport::testing;
