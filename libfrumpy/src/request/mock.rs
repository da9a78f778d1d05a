//! Mock transport for testing
//!
//! Serves canned responses keyed by URL and records every request it sees.
//! It is available in all builds so integration tests and demos can wire a
//! request-capable dispatcher without any network access.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::TransportError;
use crate::request::{Request, Response, Transport};

/// Canned-response transport
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, Response>,
    failure: Option<String>,
    sent: RefCell<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `url` with `status` and `body`.
    pub fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Response {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// Fail every request with a connection error.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Requests sent so far (for test assertions).
    pub fn requests(&self) -> Vec<Request> {
        self.sent.borrow().clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        self.sent.borrow_mut().push(request.clone());

        if let Some(message) = &self.failure {
            return Err(TransportError::Connection(message.clone()));
        }

        Ok(self
            .responses
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response {
                status: 404,
                body: String::new(),
            }))
    }
}
