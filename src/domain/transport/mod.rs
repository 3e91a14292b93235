//! Network transport abstraction

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::exchange::{ProxyRequest, ResponseSnapshot};

/// Performs a request against the network
///
/// Only transport-level failures are errors; an HTTP error status is a successful
/// fetch of an error response.
#[async_trait]
pub trait NetworkTransport: Send + Sync + Debug {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ResponseSnapshot, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    enum Scripted {
        Respond(ResponseSnapshot),
        Fail(String),
        Hang,
    }

    /// Scripted transport that counts calls
    ///
    /// Unscripted URLs fail with a transport error, as if offline.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        routes: Mutex<HashMap<String, Scripted>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<ProxyRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: &str, snapshot: ResponseSnapshot) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), Scripted::Respond(snapshot));
            self
        }

        pub fn with_failure(self, url: &str, message: &str) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), Scripted::Fail(message.to_string()));
            self
        }

        /// The request never resolves
        pub fn with_hang(self, url: &str) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), Scripted::Hang);
            self
        }

        /// Takes the network down for every URL
        pub fn go_offline(&self) {
            self.routes.lock().unwrap().clear();
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn seen(&self) -> Vec<ProxyRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NetworkTransport for MockTransport {
        async fn fetch(&self, request: &ProxyRequest) -> Result<ResponseSnapshot, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());

            let scripted = self
                .routes
                .lock()
                .unwrap()
                .get(request.url().as_str())
                .cloned();

            match scripted {
                Some(Scripted::Respond(snapshot)) => Ok(snapshot),
                Some(Scripted::Fail(message)) => Err(DomainError::transport(message)),
                Some(Scripted::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(DomainError::transport("hung request woke up"))
                }
                None => Err(DomainError::transport(format!(
                    "network unreachable: {}",
                    request.url()
                ))),
            }
        }
    }
}
