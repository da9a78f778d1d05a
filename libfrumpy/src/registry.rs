//! Handlers and the event registry
//!
//! A handler maps the current model plus the arguments an event carried to
//! an [`Outcome`]. Handlers registered under the same event name form a
//! [`HandlerChain`] that runs in order, each step seeing the model produced
//! by the step before it.
//!
//! The [`Registry`] is fixed at construction. It never gains or loses
//! entries, so looking up an event name is a pure read.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::error::{FrumpyError, Result};
use crate::model::Model;

/// What a handler did with the model it was given.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Pass the incoming model through untouched.
    NoChange,
    /// Replace the model with a complete new snapshot.
    Replace(Model),
}

impl From<Model> for Outcome {
    fn from(model: Model) -> Self {
        Outcome::Replace(model)
    }
}

impl From<Option<Model>> for Outcome {
    fn from(model: Option<Model>) -> Self {
        model.map_or(Outcome::NoChange, Outcome::Replace)
    }
}

/// Event handler: `(model, args) -> Outcome`.
///
/// Returning an error aborts the chain and propagates to the caller of
/// the listener.
pub type Handler = Rc<dyn Fn(&Model, &[Value]) -> Result<Outcome>>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Model, &[Value]) -> Result<Outcome> + 'static,
{
    Rc::new(f)
}

/// Ordered handlers attached to one event.
#[derive(Clone)]
pub struct HandlerChain(Rc<[Handler]>);

impl HandlerChain {
    pub fn single(handler: Handler) -> Self {
        HandlerChain(Rc::from(vec![handler]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handler> {
        self.0.iter()
    }

    /// Fold the chain over `model`, skipping `NoChange` steps.
    pub fn apply(&self, model: Model, args: &[Value]) -> Result<Model> {
        self.iter().enumerate().try_fold(model, |acc, (index, step)| {
            Ok(match step(&acc, args)? {
                Outcome::NoChange => {
                    trace!(index, "handler left model unchanged");
                    acc
                }
                Outcome::Replace(next) => {
                    trace!(index, keys = next.len(), "handler replaced model");
                    next
                }
            })
        })
    }
}

impl From<Handler> for HandlerChain {
    fn from(handler: Handler) -> Self {
        HandlerChain::single(handler)
    }
}

impl From<Vec<Handler>> for HandlerChain {
    fn from(handlers: Vec<Handler>) -> Self {
        HandlerChain(Rc::from(handlers))
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.len())
            .finish()
    }
}

/// One `(event name, chain)` registration.
#[derive(Debug, Clone)]
pub struct Entry {
    pub event: String,
    pub chain: HandlerChain,
}

/// Fixed table of event registrations, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Build the registry, normalizing each registration into a chain.
    ///
    /// # Errors
    ///
    /// Returns `FrumpyError::EmptyChain` if a registration carries no
    /// handlers.
    pub fn new<I, S, C>(registrations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<HandlerChain>,
    {
        let entries = registrations
            .into_iter()
            .map(|(event, chain)| {
                let event = event.into();
                let chain = chain.into();
                if chain.is_empty() {
                    return Err(FrumpyError::EmptyChain(event));
                }
                Ok(Entry { event, chain })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Chains registered under exactly `event`, in registration order.
    pub fn matching(&self, event: &str) -> Vec<HandlerChain> {
        self.entries
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.chain.clone())
            .collect()
    }

    /// Distinct event names, in the order they were first registered.
    pub fn events(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.event.as_str()) {
                seen.push(&entry.event);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(key: &'static str, value: Value) -> Handler {
        handler(move |model: &Model, _args: &[Value]| Ok(model.with(key, value.clone()).into()))
    }

    fn noop() -> Handler {
        handler(|_model: &Model, _args: &[Value]| Ok(Outcome::NoChange))
    }

    #[test]
    fn test_single_handler_is_wrapped() {
        let registry = Registry::new(vec![("tick", HandlerChain::from(noop()))]).unwrap();
        let chains = registry.matching("tick");

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 1);
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let result = Registry::new(vec![("tick", HandlerChain::from(Vec::<Handler>::new()))]);
        match result {
            Err(FrumpyError::EmptyChain(event)) => assert_eq!(event, "tick"),
            other => panic!("Expected EmptyChain, got {:?}", other),
        }
    }

    #[test]
    fn test_matching_preserves_registration_order() {
        let registry = Registry::new(vec![
            ("a", HandlerChain::from(set("first", json!(1)))),
            ("b", HandlerChain::from(set("other", json!(0)))),
            ("a", HandlerChain::from(set("second", json!(2)))),
        ])
        .unwrap();

        let model = registry
            .matching("a")
            .iter()
            .try_fold(Model::empty(), |acc, chain| chain.apply(acc, &[]))
            .unwrap();

        assert_eq!(model.to_value(), json!({ "first": 1, "second": 2 }));
    }

    #[test]
    fn test_matching_is_exact() {
        let registry = Registry::new(vec![("xhr:load", HandlerChain::from(noop()))]).unwrap();

        assert!(registry.matching("xhr").is_empty());
        assert!(registry.matching("xhr:load:extra").is_empty());
        assert_eq!(registry.matching("xhr:load").len(), 1);
    }

    #[test]
    fn test_apply_skips_no_change() {
        let chain = HandlerChain::from(vec![set("a", json!(1)), noop(), set("b", json!(2))]);
        let model = chain.apply(Model::empty(), &[]).unwrap();

        assert_eq!(model.to_value(), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_apply_no_change_keeps_identity() {
        let start = Model::empty().with("a", json!(1));
        let model = HandlerChain::from(noop()).apply(start.clone(), &[]).unwrap();

        assert!(Model::ptr_eq(&start, &model));
    }

    #[test]
    fn test_apply_stops_at_first_error() {
        let chain = HandlerChain::from(vec![
            handler(|_: &Model, _: &[Value]| Err(FrumpyError::handler("boom"))),
            set("unreached", json!(true)),
        ]);

        assert!(matches!(
            chain.apply(Model::empty(), &[]),
            Err(FrumpyError::Handler(_))
        ));
    }

    #[test]
    fn test_events_lists_distinct_names() {
        let registry = Registry::new(vec![
            ("b", HandlerChain::from(noop())),
            ("a", HandlerChain::from(noop())),
            ("b", HandlerChain::from(noop())),
        ])
        .unwrap();

        assert_eq!(registry.events(), vec!["b", "a"]);
        assert_eq!(registry.len(), 3);
    }
}
