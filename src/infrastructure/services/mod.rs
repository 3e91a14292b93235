//! Infrastructure services

mod lifecycle_manager;
mod notification_bridge;
mod registration;
mod service_worker;
mod strategy_executor;

pub use lifecycle_manager::LifecycleManager;
pub use notification_bridge::{NotificationBridge, NotificationConfig};
pub use registration::Registration;
pub use service_worker::ServiceWorker;
pub use strategy_executor::StrategyExecutor;
