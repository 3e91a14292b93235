//! API layer - the intercepting proxy and the control endpoints

pub mod control;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod types;

pub use router::{CONTROL_PREFIX, create_control_router, create_router};
pub use state::AppState;
