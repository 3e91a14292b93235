//! Worker domain - lifecycle states and the event dispatch interface

mod events;
mod lifecycle;

pub use events::{
    ActivationReport, FetchOutcome, NotificationClick, PushOutcome, SyncOutcome, WorkerEvents,
};
pub use lifecycle::LifecycleState;
