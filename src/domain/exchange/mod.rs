//! Exchange domain - requests entering the gateway and the responses it produces

mod request;
mod response;

pub use request::ProxyRequest;
pub use response::{
    OFFLINE_API_BODY, OFFLINE_STATIC_BODY, ProxyResponse, ResponseSnapshot, ResponseSource,
};
