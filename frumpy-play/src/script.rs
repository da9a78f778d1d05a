//! Event scripts and the handler recipes they declare
//!
//! A script names an initial model, a list of handler chains built from
//! declarative steps, and the events to fire in order:
//!
//! ```toml
//! [model]
//! count = 0
//!
//! [[handlers]]
//! event = "inc"
//! chain = [{ op = "increment", key = "count" }]
//!
//! [[events]]
//! name = "inc"
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use libfrumpy::{
    handler, Dispatcher, DispatcherConfig, FrumpyError, Handler, Model, Outcome, MODEL_CHANGE,
};

#[derive(Debug, Deserialize)]
pub struct Script {
    pub model: Option<Value>,
    #[serde(default)]
    pub handlers: Vec<HandlerSpec>,
    #[serde(default)]
    pub events: Vec<EventCall>,
}

#[derive(Debug, Deserialize)]
pub struct HandlerSpec {
    pub event: String,
    pub chain: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct EventCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// One handler recipe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Increment {
        key: String,
        #[serde(default = "default_step")]
        by: i64,
    },
    Assign {
        key: String,
        #[serde(default)]
        arg: usize,
    },
    Merge {
        #[serde(default)]
        arg: usize,
    },
    Remove {
        key: String,
    },
    Toggle {
        key: String,
    },
    Clamp {
        key: String,
        min: i64,
        max: i64,
    },
}

fn default_step() -> i64 {
    1
}

impl Script {
    /// Read a script, choosing JSON for `.json` files and TOML otherwise.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON script {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML script {}", path.display()))
        }
    }
}

impl Step {
    pub fn into_handler(self) -> Handler {
        match self {
            Step::Increment { key, by } => handler(move |model: &Model, _args: &[Value]| {
                let current = integer_at(model, &key)?.unwrap_or(0);
                let next = current
                    .checked_add(by)
                    .ok_or_else(|| FrumpyError::handler(format!("'{key}' overflowed")))?;
                Ok(model.with(key.clone(), Value::from(next)).into())
            }),
            Step::Assign { key, arg } => handler(move |model: &Model, args: &[Value]| {
                let value = argument(args, arg)?;
                Ok(model.with(key.clone(), value.clone()).into())
            }),
            Step::Merge { arg } => handler(move |model: &Model, args: &[Value]| {
                let delta = argument(args, arg)?.as_object().ok_or_else(|| {
                    FrumpyError::InvalidArgument(format!("argument {arg} is not an object"))
                })?;
                Ok(model.merge(delta).into())
            }),
            Step::Remove { key } => handler(move |model: &Model, _args: &[Value]| {
                if model.contains_key(&key) {
                    Ok(model.without(&key).into())
                } else {
                    Ok(Outcome::NoChange)
                }
            }),
            Step::Toggle { key } => handler(move |model: &Model, _args: &[Value]| {
                let current = match model.get(&key) {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(b)) => *b,
                    Some(_) => {
                        return Err(FrumpyError::handler(format!("'{key}' is not a boolean")))
                    }
                };
                Ok(model.with(key.clone(), Value::Bool(!current)).into())
            }),
            Step::Clamp { key, min, max } => handler(move |model: &Model, _args: &[Value]| {
                match integer_at(model, &key)? {
                    Some(n) if n < min => Ok(model.with(key.clone(), Value::from(min)).into()),
                    Some(n) if n > max => Ok(model.with(key.clone(), Value::from(max)).into()),
                    _ => Ok(Outcome::NoChange),
                }
            }),
        }
    }
}

fn integer_at(model: &Model, key: &str) -> libfrumpy::Result<Option<i64>> {
    match model.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| FrumpyError::handler(format!("'{key}' is not an integer"))),
    }
}

fn argument(args: &[Value], index: usize) -> libfrumpy::Result<&Value> {
    args.get(index)
        .ok_or_else(|| FrumpyError::InvalidArgument(format!("event argument {index} is missing")))
}

/// What a replay produced.
#[derive(Debug)]
pub struct Replay {
    /// Every accepted model, in order, including the initial one.
    pub changes: Vec<Model>,
    pub final_model: Model,
    pub revision: u64,
}

/// Build a dispatcher from `script` and fire its events in order.
pub fn replay(script: Script, config: DispatcherConfig) -> libfrumpy::Result<Replay> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&changes);

    // Registered first so it sees each model exactly as committed
    let mut builder = Dispatcher::builder()
        .config(config)
        .on(MODEL_CHANGE, move |model, _args| {
            recorder.borrow_mut().push(model.clone());
            Ok(Outcome::NoChange)
        });

    if let Some(model) = script.model {
        builder = builder.model(model);
    }

    for spec in script.handlers {
        let chain = spec.chain.into_iter().map(Step::into_handler).collect();
        builder = builder.chain(spec.event, chain);
    }

    let app = builder.build()?;

    for event in &script.events {
        tracing::debug!(event = %event.name, args = event.args.len(), "triggering");
        app.trigger(&event.name, &event.args)?;
    }

    let changes = changes.borrow().clone();
    Ok(Replay {
        changes,
        final_model: app.model(),
        revision: app.revision(),
    })
}
