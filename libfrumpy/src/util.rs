//! Small sequence and object helpers
//!
//! These are the building blocks handlers typically reach for: slicing
//! argument lists, merging a delta onto a model's fields, and binding
//! leading arguments of a callable.
//!
//! # Example
//!
//! ```
//! use libfrumpy::util::copy_merge;
//! use serde_json::{json, Value};
//!
//! let base = json!({ "a": 1 }).as_object().cloned().unwrap();
//! let delta = json!({ "b": 2 }).as_object().cloned().unwrap();
//!
//! let merged = copy_merge(&base, [&delta]);
//! assert_eq!(Value::Object(merged), json!({ "a": 1, "b": 2 }));
//! assert_eq!(base.len(), 1);
//! ```

use serde_json::{Map, Value};

/// Object type shared by models and merge helpers.
pub type Object = Map<String, Value>;

/// Copy elements `[start, end)` into a new vector.
///
/// `end` defaults to the sequence length. Out-of-range bounds are clamped,
/// and `start >= end` yields an empty vector.
pub fn slice_from<T: Clone>(seq: &[T], start: usize, end: Option<usize>) -> Vec<T> {
    let end = end.unwrap_or(seq.len()).min(seq.len());
    if start >= end {
        return Vec::new();
    }
    seq[start..end].to_vec()
}

/// Everything but the first element.
pub fn rest_of<T: Clone>(seq: &[T]) -> Vec<T> {
    slice_from(seq, 1, None)
}

pub fn first_of<T>(seq: &[T]) -> Option<&T> {
    seq.first()
}

pub fn last_of<T>(seq: &[T]) -> Option<&T> {
    seq.last()
}

/// Copy every key of each source into `target`, in order.
///
/// Later sources overwrite earlier ones and the target's own values.
/// Returns the same `target` it was given.
pub fn mutable_extend<'a, 's, I>(target: &'a mut Object, sources: I) -> &'a mut Object
where
    I: IntoIterator<Item = &'s Object>,
{
    for source in sources {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    target
}

/// Like [`mutable_extend`], but writes into a fresh object and leaves
/// `base` untouched.
pub fn copy_merge<'s, I>(base: &Object, sources: I) -> Object
where
    I: IntoIterator<Item = &'s Object>,
{
    let mut merged = base.clone();
    mutable_extend(&mut merged, sources);
    merged
}

/// Bind leading arguments of `f`.
///
/// The returned callable receives the call-time arguments and invokes `f`
/// with the bound arguments followed by them.
pub fn partial<A, R, F>(f: F, bound: Vec<A>) -> impl Fn(&[A]) -> R
where
    A: Clone,
    F: Fn(&[A]) -> R,
{
    move |args: &[A]| {
        let mut all = Vec::with_capacity(bound.len() + args.len());
        all.extend_from_slice(&bound);
        all.extend_from_slice(args);
        f(&all)
    }
}
