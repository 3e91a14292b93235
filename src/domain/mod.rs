//! Domain layer - Core caching policy types and capability traits

pub mod error;
pub mod exchange;
pub mod host;
pub mod partition;
pub mod policy;
pub mod transport;
pub mod worker;

pub use error::DomainError;
pub use exchange::{ProxyRequest, ProxyResponse, ResponseSnapshot, ResponseSource};
pub use host::{HostController, HostEvent, Notification};
pub use partition::{PartitionKind, PartitionStore, RequestKey};
pub use policy::{PolicyClassifier, PolicyConfig, ResourceClass};
pub use transport::NetworkTransport;
pub use worker::{
    ActivationReport, FetchOutcome, LifecycleState, NotificationClick, PushOutcome, SyncOutcome,
    WorkerEvents,
};
