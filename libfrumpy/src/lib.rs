//! Frumpy - event-driven state dispatch
//!
//! An application holds one immutable model and a fixed table of handler
//! chains keyed by event name. Triggering an event folds the matching
//! chains over the current model; if the result differs structurally from
//! what was there, it replaces the model and `model:change` fires.

pub mod config;
pub mod dispatcher;
pub mod equality;
pub mod error;
pub mod extension;
pub mod logging;
pub mod model;
pub mod registry;
pub mod request;
pub mod store;
pub mod util;

// Re-export commonly used types
pub use config::{Config, DispatcherConfig};
pub use dispatcher::{Dispatcher, DispatcherBuilder, Listener, MODEL_CHANGE};
pub use equality::deep_equal;
pub use error::{FrumpyError, Result};
pub use extension::{Capabilities, Capability, Mixin};
pub use model::Model;
pub use registry::{handler, Handler, HandlerChain, Outcome, Registry};
pub use store::ModelStore;
pub use util::{copy_merge, first_of, last_of, mutable_extend, partial, rest_of, slice_from};
