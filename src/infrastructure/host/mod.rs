//! Host infrastructure - host controller implementations

mod broadcast;

pub use broadcast::BroadcastHostController;
