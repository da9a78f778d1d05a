//! Request helper mixin
//!
//! Installs a `request` capability that sends through a pluggable
//! [`Transport`] and reports back into the dispatcher as events:
//!
//! - `xhr:load` - a response arrived, whatever its status
//! - `xhr:error` - the transport could not complete the request
//!
//! The library ships no network transport. Callers provide one, or use
//! [`mock::MockTransport`] in tests and demos.
//!
//! # Example
//!
//! ```
//! use libfrumpy::request::{mock::MockTransport, RequestMixin, REQUEST_LOAD};
//! use libfrumpy::Dispatcher;
//! use serde_json::json;
//!
//! let transport = MockTransport::new().respond("/items", 200, "[1,2]");
//!
//! let app = Dispatcher::builder()
//!     .model(json!({ "status": null }))
//!     .on(REQUEST_LOAD, |model, args| {
//!         Ok(model.with("status", args[0]["status"].clone()).into())
//!     })
//!     .mixin(RequestMixin::new(transport))
//!     .build()
//!     .unwrap();
//!
//! app.call("request", &[json!("get"), json!("/items")]).unwrap();
//! assert_eq!(app.model().get("status"), Some(&json!(200)));
//! ```

pub mod mock;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{FrumpyError, Result, TransportError};
use crate::extension::{Capabilities, Mixin};

/// Fired with the serialized [`Response`] once a request completes.
pub const REQUEST_LOAD: &str = "xhr:load";

/// Fired with `{method, url, error}` when the transport fails.
pub const REQUEST_ERROR: &str = "xhr:error";

/// Name the capability is installed under.
pub const REQUEST_CAPABILITY: &str = "request";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests on behalf of the `request` capability.
pub trait Transport {
    fn send(&self, request: &Request) -> std::result::Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, request: &Request) -> std::result::Result<Response, TransportError> {
        (**self).send(request)
    }
}

/// Mixin installing the `request` capability over `T`.
pub struct RequestMixin<T> {
    transport: Rc<T>,
}

impl<T: Transport + 'static> RequestMixin<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Rc::new(transport),
        }
    }

    /// Share an existing transport, e.g. to inspect it after the fact.
    pub fn shared(transport: Rc<T>) -> Self {
        Self { transport }
    }
}

impl<T: Transport + 'static> Mixin for RequestMixin<T> {
    fn install(self, capabilities: &mut Capabilities) -> Result<()> {
        let transport = self.transport;
        capabilities.install(REQUEST_CAPABILITY, move |dispatcher, args| {
            let request = parse_request(args)?;
            debug!(method = %request.method, url = %request.url, "sending request");

            match transport.send(&request) {
                Ok(response) => {
                    let payload = serde_json::to_value(&response)
                        .map_err(|e| FrumpyError::handler(e.to_string()))?;
                    dispatcher.trigger(REQUEST_LOAD, &[payload.clone()])?;
                    Ok(payload)
                }
                Err(error) => {
                    debug!(%error, "request failed");
                    let payload = json!({
                        "method": request.method,
                        "url": request.url,
                        "error": error.to_string(),
                    });
                    dispatcher.trigger(REQUEST_ERROR, &[payload.clone()])?;
                    Ok(payload)
                }
            }
        });
        Ok(())
    }
}

/// `[method, url, body?]` into a [`Request`].
fn parse_request(args: &[Value]) -> Result<Request> {
    let method = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| FrumpyError::InvalidArgument("request method must be a string".into()))?;
    let url = args
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| FrumpyError::InvalidArgument("request url must be a string".into()))?;

    Ok(Request {
        method: method.to_uppercase(),
        url: url.to_string(),
        body: args.get(2).cloned(),
    })
}
