//! The event dispatcher
//!
//! A [`Dispatcher`] owns one frozen [`Model`] and a fixed [`Registry`] of
//! handler chains. Binding an event name yields a [`Listener`]; calling it
//! folds every matching chain over the current model and proposes the
//! result to the model store. An accepted transition fires
//! [`MODEL_CHANGE`], which is an ordinary event name any chain may
//! subscribe to.
//!
//! # Change notifications
//!
//! Accepted transitions enqueue a pending `model:change` notification
//! instead of recursing. The outermost commit drains the queue one round at
//! a time; commits made while draining (including those made by
//! `model:change` handlers) only enqueue. A drain that runs more than
//! `max_change_cascade` rounds stops with `FrumpyError::ChangeCascade`.
//! Models committed before that point stay committed.
//!
//! # Example
//!
//! ```
//! use libfrumpy::Dispatcher;
//! use serde_json::json;
//!
//! let app = Dispatcher::builder()
//!     .model(json!({ "count": 0 }))
//!     .on("inc", |model, _args| {
//!         let count = model.get("count").and_then(|c| c.as_i64()).unwrap_or(0);
//!         Ok(model.with("count", json!(count + 1)).into())
//!     })
//!     .build()
//!     .unwrap();
//!
//! app.trigger("inc", &[]).unwrap();
//! app.trigger("inc", &[]).unwrap();
//! assert_eq!(app.model().get("count"), Some(&json!(2)));
//! ```

use std::cell::{Cell, RefCell};

use serde_json::Value;
use tracing::{debug, debug_span, trace, warn};

use crate::config::DispatcherConfig;
use crate::error::{FrumpyError, Result};
use crate::extension::{Capabilities, Mixin};
use crate::model::Model;
use crate::registry::{handler, Handler, HandlerChain, Outcome, Registry};
use crate::store::ModelStore;

/// Event fired after every accepted model transition.
pub const MODEL_CHANGE: &str = "model:change";

/// Synchronous event dispatcher over an immutable model.
///
/// Not `Sync`: every listener call runs to completion on the caller's
/// stack.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    store: RefCell<ModelStore>,
    capabilities: Capabilities,
    config: DispatcherConfig,
    pending_changes: Cell<usize>,
    draining: Cell<bool>,
}

impl Dispatcher {
    /// Create a dispatcher from an initial model and `(event, chain)`
    /// registrations.
    ///
    /// # Errors
    ///
    /// - `MissingModel` if `initial` is `null`
    /// - `InvalidModel` if `initial` is not an object
    /// - `EmptyChain` if a registration has no handlers
    /// - `Config` if `max_change_cascade` is zero
    /// - any error raised by a `model:change` handler fired by the initial
    ///   model
    pub fn new<I, S, C>(initial: Value, registrations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<HandlerChain>,
    {
        Self::with_config(initial, registrations, DispatcherConfig::default())
    }

    pub fn with_config<I, S, C>(
        initial: Value,
        registrations: I,
        config: DispatcherConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<HandlerChain>,
    {
        let initial = Model::from_value(initial)?;
        let registry = Registry::new(registrations)?;
        Self::assemble(initial, registry, Capabilities::new(), config)
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    fn assemble(
        initial: Model,
        registry: Registry,
        capabilities: Capabilities,
        config: DispatcherConfig,
    ) -> Result<Self> {
        config.validate()?;
        debug!(
            entries = registry.len(),
            events = ?registry.events(),
            capabilities = ?capabilities.names(),
            "assembling dispatcher"
        );

        let dispatcher = Self {
            registry,
            store: RefCell::new(ModelStore::new()),
            capabilities,
            config,
            pending_changes: Cell::new(0),
            draining: Cell::new(false),
        };

        // The store starts empty, so a non-empty initial model fires one
        // `model:change`.
        dispatcher.commit(Outcome::Replace(initial))?;
        Ok(dispatcher)
    }

    /// Current snapshot.
    pub fn model(&self) -> Model {
        self.store.borrow().current().clone()
    }

    /// Number of accepted transitions, counting the initial model.
    pub fn revision(&self) -> u64 {
        self.store.borrow().revision()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Listener for `event`. Binding is a lookup; binding the same name
    /// twice yields equivalent listeners.
    pub fn bind(&self, event: &str) -> Listener<'_> {
        Listener {
            dispatcher: self,
            event: event.to_string(),
            chains: self.registry.matching(event),
        }
    }

    /// One-shot `bind(event).call(args)`.
    pub fn trigger(&self, event: &str, args: &[Value]) -> Result<bool> {
        self.bind(event).call(args)
    }

    /// Run `mixin` against this dispatcher's method table.
    pub fn extend<M: Mixin>(&mut self, mixin: M) -> Result<()> {
        mixin.install(&mut self.capabilities)
    }

    /// Invoke an installed capability.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCapability` if nothing is installed under `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| FrumpyError::UnknownCapability(name.to_string()))?;
        capability(self, args)
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains(name)
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn commit(&self, outcome: Outcome) -> Result<bool> {
        let changed = self.store.borrow_mut().propose(outcome);
        if changed {
            debug!(revision = self.revision(), "model accepted");
            self.notify_change()?;
        }
        Ok(changed)
    }

    fn notify_change(&self) -> Result<()> {
        self.pending_changes.set(self.pending_changes.get() + 1);
        if self.draining.get() {
            return Ok(());
        }

        self.draining.set(true);
        let result = self.drain_changes();
        self.draining.set(false);
        self.pending_changes.set(0);
        result
    }

    fn drain_changes(&self) -> Result<()> {
        let limit = self.config.max_change_cascade;
        let listener = self.bind(MODEL_CHANGE);
        let mut rounds = 0;

        while self.pending_changes.get() > 0 {
            if rounds == limit {
                warn!(limit, "model change cascade did not settle");
                return Err(FrumpyError::ChangeCascade { limit });
            }
            self.pending_changes.set(self.pending_changes.get() - 1);
            rounds += 1;
            listener.call(&[])?;
        }

        trace!(rounds, "change notifications drained");
        Ok(())
    }
}

/// Callable bound to one event name.
#[derive(Clone)]
pub struct Listener<'a> {
    dispatcher: &'a Dispatcher,
    event: String,
    chains: Vec<HandlerChain>,
}

impl Listener<'_> {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Number of chains this listener folds.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Fold every matching chain over the current model, then propose the
    /// result.
    ///
    /// Returns `true` when a new model was committed. A handler error
    /// aborts the fold and nothing is committed.
    pub fn call(&self, args: &[Value]) -> Result<bool> {
        let span = debug_span!("dispatch", event = %self.event);
        let _enter = span.enter();

        if self.chains.is_empty() {
            trace!("no handlers registered");
            return Ok(false);
        }

        let seed = self.dispatcher.model();
        let folded = self
            .chains
            .iter()
            .try_fold(seed.clone(), |acc, chain| {
                trace!(handlers = chain.len(), "folding chain");
                chain.apply(acc, args)
            })?;

        let outcome = if Model::ptr_eq(&seed, &folded) {
            Outcome::NoChange
        } else {
            Outcome::Replace(folded)
        };
        self.dispatcher.commit(outcome)
    }
}

type DeferredMixin = Box<dyn FnOnce(&mut Capabilities) -> Result<()>>;

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    model: Option<Value>,
    registrations: Vec<(String, HandlerChain)>,
    mixins: Vec<DeferredMixin>,
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    pub fn model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    /// Register a single handler under `event`.
    pub fn on<F>(self, event: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Model, &[Value]) -> Result<Outcome> + 'static,
    {
        self.register(event, handler(f))
    }

    /// Register an ordered chain under `event`.
    pub fn chain(self, event: impl Into<String>, handlers: Vec<Handler>) -> Self {
        self.register(event, handlers)
    }

    pub fn register(mut self, event: impl Into<String>, chain: impl Into<HandlerChain>) -> Self {
        self.registrations.push((event.into(), chain.into()));
        self
    }

    /// Install `mixin` before the initial model is committed.
    pub fn mixin<M: Mixin + 'static>(mut self, mixin: M) -> Self {
        self.mixins
            .push(Box::new(move |caps: &mut Capabilities| mixin.install(caps)));
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let model = Model::from_value(self.model.ok_or(FrumpyError::MissingModel)?)?;
        let registry = Registry::new(self.registrations)?;

        let mut capabilities = Capabilities::new();
        for install in self.mixins {
            install(&mut capabilities)?;
        }

        Dispatcher::assemble(model, registry, capabilities, self.config)
    }
}
