//! Dispatcher behavior end to end
//!
//! Covers construction, chain folding, change gating and `model:change`
//! notification through the public API only.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use libfrumpy::{
    handler, Dispatcher, FrumpyError, Handler, HandlerChain, Model, Outcome, MODEL_CHANGE,
};
use serde_json::{json, Value};

fn count_of(model: &Model) -> i64 {
    model.get("count").and_then(Value::as_i64).unwrap_or(0)
}

fn increment() -> Handler {
    handler(|model: &Model, _args: &[Value]| {
        Ok(model.with("count", json!(count_of(model) + 1)).into())
    })
}

/// `model:change` handler that only counts how often it ran
fn change_counter(counter: Rc<Cell<usize>>) -> Handler {
    handler(move |_model: &Model, _args: &[Value]| {
        counter.set(counter.get() + 1);
        Ok(Outcome::NoChange)
    })
}

#[test]
fn test_construct_without_model_fails() {
    let result = Dispatcher::new(Value::Null, Vec::<(String, HandlerChain)>::new());
    assert!(matches!(result, Err(FrumpyError::MissingModel)));
}

#[test]
fn test_construct_with_empty_model_and_handlers_succeeds() {
    let app = Dispatcher::new(json!({}), Vec::<(String, HandlerChain)>::new()).unwrap();
    assert!(app.model().is_empty());
    assert!(app.registry().is_empty());
}

#[test]
fn test_construct_with_scalar_model_fails() {
    let result = Dispatcher::new(json!("state"), Vec::<(String, HandlerChain)>::new());
    assert!(matches!(result, Err(FrumpyError::InvalidModel(_))));
}

#[test]
fn test_increment_once_and_twice() {
    let app = Dispatcher::new(json!({ "count": 0 }), vec![("inc", HandlerChain::from(increment()))])
        .unwrap();

    app.trigger("inc", &[]).unwrap();
    assert_eq!(app.model().to_value(), json!({ "count": 1 }));

    app.trigger("inc", &[]).unwrap();
    assert_eq!(app.model().to_value(), json!({ "count": 2 }));
}

#[test]
fn test_handler_receives_arguments() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);

    let app = Dispatcher::builder()
        .model(json!({}))
        .on("fizz", move |_model, args| {
            log.borrow_mut().extend_from_slice(args);
            Ok(Outcome::NoChange)
        })
        .build()
        .unwrap();

    app.trigger("fizz", &[json!(3)]).unwrap();
    assert_eq!(*seen.borrow(), vec![json!(3)]);
}

#[test]
fn test_chain_passes_model_to_next_handler() {
    let observed = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&observed);

    let app = Dispatcher::builder()
        .model(json!({}))
        .chain(
            "fizz",
            vec![
                handler(|model: &Model, args: &[Value]| {
                    Ok(model.with("arg", args[0].clone()).into())
                }),
                handler(move |model: &Model, _args: &[Value]| {
                    *slot.borrow_mut() = model.get("arg").cloned();
                    Ok(Outcome::NoChange)
                }),
            ],
        )
        .build()
        .unwrap();

    app.trigger("fizz", &[json!("A")]).unwrap();
    assert_eq!(*observed.borrow(), Some(json!("A")));
}

#[test]
fn test_chain_equals_sequential_fold() {
    let steps: Vec<Handler> = vec![
        increment(),
        handler(|_: &Model, _: &[Value]| Ok(Outcome::NoChange)),
        handler(|model: &Model, _: &[Value]| {
            Ok(model.with("count", json!(count_of(model) * 10)).into())
        }),
        increment(),
    ];

    let mut expected = Model::from_value(json!({ "count": 1 })).unwrap();
    for step in &steps {
        if let Outcome::Replace(next) = step(&expected, &[]).unwrap() {
            expected = next;
        }
    }

    let app = Dispatcher::builder()
        .model(json!({ "count": 1 }))
        .chain("go", steps)
        .build()
        .unwrap();
    app.trigger("go", &[]).unwrap();

    assert_eq!(app.model(), expected);
    assert_eq!(count_of(&app.model()), 21);
}

#[test]
fn test_multiple_entries_fire_in_registration_order() {
    let app = Dispatcher::builder()
        .model(json!({ "trail": "" }))
        .on("step", |model, _| {
            let trail = model.get("trail").and_then(Value::as_str).unwrap_or("");
            Ok(model.with("trail", json!(format!("{trail}a"))).into())
        })
        .on("other", |model, _| Ok(model.with("trail", json!("x")).into()))
        .on("step", |model, _| {
            let trail = model.get("trail").and_then(Value::as_str).unwrap_or("");
            Ok(model.with("trail", json!(format!("{trail}b"))).into())
        })
        .build()
        .unwrap();

    app.trigger("step", &[]).unwrap();
    assert_eq!(app.model().get("trail"), Some(&json!("ab")));
}

#[test]
fn test_unknown_event_is_noop() {
    let changes = Rc::new(Cell::new(0));
    let app = Dispatcher::builder()
        .model(json!({ "count": 0 }))
        .register("inc", increment())
        .register(MODEL_CHANGE, change_counter(Rc::clone(&changes)))
        .build()
        .unwrap();
    let before = app.model();
    let fired_at_start = changes.get();

    assert!(!app.trigger("nope", &[]).unwrap());
    assert!(Model::ptr_eq(&before, &app.model()));
    assert_eq!(changes.get(), fired_at_start);
}

#[test]
fn test_no_change_handler_keeps_model_identity() {
    let app = Dispatcher::builder()
        .model(json!({ "count": 0 }))
        .on("look", |_, _| Ok(Outcome::NoChange))
        .build()
        .unwrap();
    let before = app.model();

    assert!(!app.trigger("look", &[]).unwrap());
    assert!(Model::ptr_eq(&before, &app.model()));
}

#[test]
fn test_structurally_equal_result_does_not_notify() {
    let changes = Rc::new(Cell::new(0));
    let app = Dispatcher::builder()
        .model(json!({ "count": 0 }))
        .on("reset", |_, _| Ok(Model::from_value(json!({ "count": 0 }))?.into()))
        .register(MODEL_CHANGE, change_counter(Rc::clone(&changes)))
        .build()
        .unwrap();
    let fired_at_start = changes.get();

    assert!(!app.trigger("reset", &[]).unwrap());
    assert!(!app.trigger("reset", &[]).unwrap());
    assert_eq!(changes.get(), fired_at_start);
}

#[test]
fn test_model_change_fires_once_per_transition() {
    let changes = Rc::new(Cell::new(0));
    let app = Dispatcher::builder()
        .model(json!({ "count": 0 }))
        .register("inc", increment())
        .register(MODEL_CHANGE, change_counter(Rc::clone(&changes)))
        .build()
        .unwrap();

    // The non-empty initial model counts as one transition
    assert_eq!(changes.get(), 1);

    app.trigger("inc", &[]).unwrap();
    app.trigger("inc", &[]).unwrap();
    assert_eq!(changes.get(), 3);
    assert_eq!(app.revision(), 3);
}

#[test]
fn test_empty_initial_model_does_not_notify() {
    let changes = Rc::new(Cell::new(0));
    let _app = Dispatcher::builder()
        .model(json!({}))
        .register(MODEL_CHANGE, change_counter(Rc::clone(&changes)))
        .build()
        .unwrap();

    assert_eq!(changes.get(), 0);
}

#[test]
fn test_handler_error_propagates_and_commits_nothing() {
    let reached = Rc::new(Cell::new(false));
    let flag = Rc::clone(&reached);

    let app = Dispatcher::builder()
        .model(json!({ "count": 0 }))
        .chain(
            "explode",
            vec![
                increment(),
                handler(|_: &Model, _: &[Value]| Err(FrumpyError::handler("boom"))),
                handler(move |_: &Model, _: &[Value]| {
                    flag.set(true);
                    Ok(Outcome::NoChange)
                }),
            ],
        )
        .build()
        .unwrap();

    match app.trigger("explode", &[]) {
        Err(FrumpyError::Handler(message)) => assert_eq!(message, "boom"),
        other => panic!("Expected handler error, got {:?}", other),
    }
    assert!(!reached.get());
    assert_eq!(count_of(&app.model()), 0);
}

#[test]
fn test_bound_listener_is_reusable() {
    let app = Dispatcher::new(json!({ "count": 0 }), vec![("inc", HandlerChain::from(increment()))])
        .unwrap();
    let listener = app.bind("inc");

    for _ in 0..5 {
        listener.call(&[]).unwrap();
    }
    assert_eq!(count_of(&app.model()), 5);
}

#[test]
fn test_accepted_model_cannot_be_mutated_through_copies() {
    let app = Dispatcher::new(
        json!({ "count": 0, "ship": { "x": 1 } }),
        Vec::<(String, HandlerChain)>::new(),
    )
    .unwrap();

    let mut copy = app.model().to_value();
    copy["count"] = json!(99);
    copy["ship"]["x"] = json!(99);

    assert_eq!(app.model().to_value(), json!({ "count": 0, "ship": { "x": 1 } }));
}

#[test]
fn test_empty_chain_is_rejected() {
    let result = Dispatcher::builder()
        .model(json!({}))
        .chain("nothing", Vec::new())
        .build();

    assert!(matches!(result, Err(FrumpyError::EmptyChain(event)) if event == "nothing"));
}

#[test]
fn test_error_in_initial_change_fails_construction() {
    let result = Dispatcher::builder()
        .model(json!({ "count": 0 }))
        .on(MODEL_CHANGE, |_, _| Err(FrumpyError::handler("render failed")))
        .build();

    assert!(matches!(result, Err(FrumpyError::Handler(_))));
}
