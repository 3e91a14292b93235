//! Policy domain - classification rules and the versioned policy configuration

mod classifier;
mod config;

pub use classifier::{PolicyClassifier, ResourceClass};
pub use config::PolicyConfig;
