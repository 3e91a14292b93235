//! Transport infrastructure - reaching the upstream and third-party hosts

mod http_client;

pub use http_client::ReqwestTransport;
