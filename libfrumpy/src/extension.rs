//! Named capabilities attached to a dispatcher
//!
//! A [`Mixin`] installs one or more [`Capability`] entries into the
//! dispatcher's method table. A capability is called with the dispatcher it
//! lives on, so it can feed results back in through
//! [`Dispatcher::trigger`](crate::Dispatcher::trigger).
//!
//! # Example
//!
//! ```
//! use libfrumpy::{Capabilities, Dispatcher};
//! use serde_json::{json, Value};
//!
//! let mut app = Dispatcher::builder()
//!     .model(json!({ "greeting": null }))
//!     .on("greet", |model, args| {
//!         Ok(model.with("greeting", args[0].clone()).into())
//!     })
//!     .build()
//!     .unwrap();
//!
//! app.extend(|caps: &mut Capabilities| -> libfrumpy::Result<()> {
//!     caps.install("hello", |dispatcher, _args| {
//!         dispatcher.trigger("greet", &[json!("hello")])?;
//!         Ok(Value::Null)
//!     });
//!     Ok(())
//! })
//! .unwrap();
//!
//! app.call("hello", &[]).unwrap();
//! assert_eq!(app.model().get("greeting"), Some(&json!("hello")));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use crate::dispatcher::Dispatcher;
use crate::error::Result;

/// Callable installed on a dispatcher under a name.
pub type Capability = Rc<dyn Fn(&Dispatcher, &[Value]) -> Result<Value>>;

/// The dispatcher's method table.
#[derive(Clone, Default)]
pub struct Capabilities {
    table: BTreeMap<String, Capability>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `f` under `name`. A later install under the same name
    /// replaces the earlier one.
    pub fn install<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Dispatcher, &[Value]) -> Result<Value> + 'static,
    {
        let name = name.into();
        if self.table.contains_key(&name) {
            warn!(capability = %name, "replacing installed capability");
        }
        self.table.insert(name, Rc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Capability> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Installed names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.table.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("names", &self.names())
            .finish()
    }
}

/// Something that installs capabilities. Runs once, when passed to
/// [`Dispatcher::extend`] or [`DispatcherBuilder::mixin`](crate::DispatcherBuilder::mixin).
pub trait Mixin {
    fn install(self, capabilities: &mut Capabilities) -> Result<()>;
}

impl<F> Mixin for F
where
    F: FnOnce(&mut Capabilities) -> Result<()>,
{
    fn install(self, capabilities: &mut Capabilities) -> Result<()> {
        self(capabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: i64) -> impl Fn(&Dispatcher, &[Value]) -> Result<Value> {
        move |_dispatcher: &Dispatcher, _args: &[Value]| Ok(Value::from(value))
    }

    #[test]
    fn test_install_and_lookup() {
        let mut caps = Capabilities::new();
        caps.install("one", constant(1));

        assert!(caps.contains("one"));
        assert!(!caps.contains("two"));
        assert!(caps.get("one").is_some());
        assert_eq!(caps.names(), vec!["one"]);
    }

    #[test]
    fn test_later_install_replaces() {
        let mut caps = Capabilities::new();
        caps.install("n", constant(1));
        caps.install("n", constant(2));

        let dispatcher = Dispatcher::builder()
            .model(serde_json::json!({}))
            .build()
            .unwrap();
        let n = caps.get("n").unwrap();
        assert_eq!(n(&dispatcher, &[]).unwrap(), Value::from(2));
        assert_eq!(caps.names().len(), 1);
    }

    #[test]
    fn test_closure_is_a_mixin() {
        let mut caps = Capabilities::new();
        let mixin = |c: &mut Capabilities| -> Result<()> {
            c.install("a", constant(1));
            c.install("b", constant(2));
            Ok(())
        };
        mixin.install(&mut caps).unwrap();

        assert_eq!(caps.names(), vec!["a", "b"]);
    }
}
