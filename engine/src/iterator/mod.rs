//! The iterator protocol: `GetIterator`, `IteratorNext`, `IteratorClose`,
//! and the built-in iterators arrays/strings/maps/sets return from
//! `[Symbol.iterator]()`, per §7.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-iteration

use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;
use crate::JsResult;

/// An iterator handle obtained from `GetIterator`: the iterator object plus
/// its (already resolved) `next` method, so callers don't re-look it up on
/// every step.
#[derive(Debug, Clone)]
pub struct IteratorRecord {
    pub iterator: JsObject,
    pub next_method: JsObject,
    pub done: bool,
}

/// `GetIterator`: looks up `obj[Symbol.iterator]`, calls it, and validates
/// the result is an object exposing a callable `next`.
pub fn get_iterator(obj: &JsValue, context: &mut Context) -> JsResult<IteratorRecord> {
    let method = match obj {
        JsValue::Object(o) => o.get(context.well_known_symbols().iterator.clone(), context)?,
        JsValue::String(_) => {
            let proto_method = context.intrinsics().string_iterator_factory.clone();
            return Ok(make_array_like_iterator(proto_method.call(context, obj, &[])?, context)?);
        }
        _ => return Err(context.construct_type_error("value is not iterable")),
    };
    let Some(method) = method.as_object().filter(|o| o.is_callable()).cloned() else {
        return Err(context.construct_type_error("value is not iterable"));
    };
    let iterator = method.call(context, obj, &[])?;
    let JsValue::Object(iterator) = iterator else {
        return Err(context.construct_type_error("iterator result is not an object"));
    };
    let next_method = iterator.get("next", context)?;
    let Some(next_method) = next_method.as_object().filter(|o| o.is_callable()).cloned() else {
        return Err(context.construct_type_error("iterator has no callable 'next' method"));
    };
    Ok(IteratorRecord { iterator, next_method, done: false })
}

fn make_array_like_iterator(value: JsValue, context: &mut Context) -> JsResult<IteratorRecord> {
    get_iterator(&value, context)
}

/// `IteratorNext` + `IteratorComplete` + `IteratorValue`: advances the
/// iterator and returns `None` once `done` is true.
pub fn iterator_step(record: &mut IteratorRecord, context: &mut Context) -> JsResult<Option<JsValue>> {
    if record.done {
        return Ok(None);
    }
    let result = record.next_method.call(context, &JsValue::Object(record.iterator.clone()), &[])?;
    let JsValue::Object(result_obj) = &result else {
        return Err(context.construct_type_error("iterator result is not an object"));
    };
    let done = result_obj.get("done", context)?.to_boolean();
    if done {
        record.done = true;
        return Ok(None);
    }
    Ok(Some(result_obj.get("value", context)?))
}

/// `IteratorClose`: calls the iterator's `return` method (if present) when
/// loop exits early — `break`, `return`, or a thrown error inside a
/// `for...of` body — per §7's early-exit requirement. The original
/// completion (`outcome`) takes priority over any error `return()` raises,
/// unless the original completion was itself normal.
pub fn iterator_close(record: &IteratorRecord, context: &mut Context, outcome: JsResult<JsValue>) -> JsResult<JsValue> {
    if record.done {
        return outcome;
    }
    let return_method = record.iterator.get("return", context);
    let return_method = match return_method {
        Ok(v) => v,
        Err(_) => return outcome,
    };
    let Some(return_method) = return_method.as_object().filter(|o| o.is_callable()).cloned() else {
        return outcome;
    };
    let close_result = return_method.call(context, &JsValue::Object(record.iterator.clone()), &[]);
    match outcome {
        Ok(v) => close_result.map(|_| v),
        Err(e) => Err(e),
    }
}

/// Builds a plain `{ value, done }` iterator-result object.
pub fn make_iter_result(value: JsValue, done: bool, context: &Context) -> JsObject {
    let obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
    obj.create_data_property("value", value, crate::property::Attribute::default());
    obj.create_data_property("done", JsValue::from(done), crate::property::Attribute::default());
    obj
}

/// Allocates a stateful array-index iterator object (shared by
/// `Array.prototype[Symbol.iterator]`, `.keys()`, `.values()`, `.entries()`)
/// whose `next` walks `arr`'s dense entries using the requested `kind`.
pub fn array_iterator(arr: JsObject, kind: ArrayIterKind, context: &mut Context) -> JsObject {
    let index = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let iter = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
    let next = JsObject::native_function(context, "next", 0, move |this, _args, context| {
        let Some(this_obj) = this.as_object() else {
            return Err(context.construct_type_error("Array Iterator next called on non-object"));
        };
        let len = arr.array_length();
        let i = index.get();
        if i >= len {
            return Ok(JsValue::Object(make_iter_result(JsValue::Undefined, true, context)));
        }
        index.set(i + 1);
        let value = match kind {
            ArrayIterKind::Keys => JsValue::from(i),
            ArrayIterKind::Values => arr.get_element(i, context)?,
            ArrayIterKind::Entries => {
                let pair = JsObject::array_from_values(vec![JsValue::from(i), arr.get_element(i, context)?], context);
                JsValue::Object(pair)
            }
        };
        let _ = this_obj;
        Ok(JsValue::Object(make_iter_result(value, false, context)))
    });
    iter.create_data_property("next", JsValue::Object(next), crate::property::Attribute::default());
    iter
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIterKind {
    Keys,
    Values,
    Entries,
}

/// `ObjectKind::Array`/`Map`/`Set` all delegate `[Symbol.iterator]` here
/// rather than each owning a bespoke closure; kept as a free function so
/// `builtins::array`/`builtins::map`/`builtins::set` share it.
pub fn is_array_like(value: &JsValue) -> bool {
    matches!(value, JsValue::Object(o) if matches!(o.borrow().kind, ObjectKind::Array))
}
