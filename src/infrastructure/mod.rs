//! Infrastructure layer - Storage backends, transports and the worker services

pub mod host;
pub mod logging;
pub mod observability;
pub mod partition;
pub mod services;
pub mod transport;
