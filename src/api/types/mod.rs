//! Control API types

pub mod control;
pub mod error;

pub use control::{PartitionsResponse, StateResponse, SyncRequest, SyncResponse, WorkerInfo};
pub use error::{ApiError, ApiErrorResponse};
