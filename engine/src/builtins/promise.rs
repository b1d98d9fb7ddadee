//! `Promise` and the microtask-driven reaction machinery behind
//! `.then`/`.catch`/`.finally` and `Promise.resolve/reject/all/race/
//! allSettled/any`, per §9: the engine's asynchrony model is entirely
//! promise- and microtask-based — [`crate::context::Context::enqueue_microtask`]
//! is the only scheduler, there is no OS-thread involvement anywhere here.

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::gc::{custom_trace, Finalize, Trace};
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;
use crate::JsResult;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone)]
enum PromiseState {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

/// One pending reaction registered by `.then`: the (optional) handler and
/// the derived promise `.then` returned, to be settled with the handler's
/// outcome once this reaction runs.
#[derive(Debug, Clone)]
struct Reaction {
    handler: Option<JsObject>,
    result_promise: JsObject,
}

#[derive(Debug, Clone)]
pub struct PromiseData {
    state: PromiseState,
    fulfill_reactions: Vec<Reaction>,
    reject_reactions: Vec<Reaction>,
}

impl Default for PromiseData {
    fn default() -> Self {
        PromiseData { state: PromiseState::Pending, fulfill_reactions: Vec::new(), reject_reactions: Vec::new() }
    }
}

unsafe impl Trace for PromiseData {
    custom_trace!(this, {
        match &this.state {
            PromiseState::Fulfilled(v) | PromiseState::Rejected(v) => mark(v),
            PromiseState::Pending => {}
        }
        for r in this.fulfill_reactions.iter().chain(this.reject_reactions.iter()) {
            if let Some(h) = &r.handler {
                mark(h);
            }
            mark(&r.result_promise);
        }
    });
}
impl Finalize for PromiseData {}

fn new_promise(context: &Context) -> JsObject {
    JsObject::new(ObjectKind::Promise(PromiseData::default()), Some(context.intrinsics().promise_prototype.clone()))
}

fn as_promise(this: &JsValue, context: &mut Context) -> JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::Promise(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a Promise")),
    }
}

/// `then` is read (and possibly throws) synchronously; the actual call
/// happens in a queued job, per `PromiseResolveThenableJob`.
fn thenable_then(value: &JsValue, context: &mut Context) -> JsResult<Option<JsObject>> {
    let JsValue::Object(o) = value else { return Ok(None) };
    let then = o.get("then", context)?;
    Ok(then.as_object().filter(|f| f.is_callable()).cloned())
}

/// The `Resolve` capability: adopts a thenable's eventual state, or
/// fulfills directly with any other value.
pub(crate) fn resolve_promise(promise: &JsObject, value: JsValue, context: &mut Context) {
    if let JsValue::Object(o) = &value {
        if JsObject::equals(o, promise) {
            let err = context.construct_type_error("chaining cycle detected for promise");
            reject_promise(promise, err, context);
            return;
        }
    }
    match thenable_then(&value, context) {
        Ok(Some(then_fn)) => {
            let promise = promise.clone();
            context.enqueue_microtask(move |context| {
                let resolve = make_resolving_function(promise.clone(), true, context);
                let reject = make_resolving_function(promise.clone(), false, context);
                if let Err(e) = then_fn.call(context, &value, &[JsValue::Object(resolve), JsValue::Object(reject)]) {
                    reject_promise(&promise, e, context);
                }
            });
        }
        Ok(None) => fulfill_promise(promise, value, context),
        Err(e) => reject_promise(promise, e, context),
    }
}

pub(crate) fn fulfill_promise(promise: &JsObject, value: JsValue, context: &mut Context) {
    let reactions = {
        let mut data = promise.borrow_mut();
        let ObjectKind::Promise(p) = &mut data.kind else { return };
        if !matches!(p.state, PromiseState::Pending) {
            return;
        }
        p.state = PromiseState::Fulfilled(value.clone());
        p.reject_reactions.clear();
        std::mem::take(&mut p.fulfill_reactions)
    };
    for r in reactions {
        schedule_reaction(r, true, value.clone(), context);
    }
}

pub(crate) fn reject_promise(promise: &JsObject, reason: JsValue, context: &mut Context) {
    let reactions = {
        let mut data = promise.borrow_mut();
        let ObjectKind::Promise(p) = &mut data.kind else { return };
        if !matches!(p.state, PromiseState::Pending) {
            return;
        }
        p.state = PromiseState::Rejected(reason.clone());
        p.fulfill_reactions.clear();
        std::mem::take(&mut p.reject_reactions)
    };
    for r in reactions {
        schedule_reaction(r, false, reason.clone(), context);
    }
}

fn schedule_reaction(reaction: Reaction, is_fulfill: bool, value: JsValue, context: &mut Context) {
    context.enqueue_microtask(move |context| {
        let outcome = match &reaction.handler {
            Some(handler) => handler.call(context, &JsValue::Undefined, &[value.clone()]),
            None if is_fulfill => Ok(value.clone()),
            None => Err(value.clone()),
        };
        match outcome {
            Ok(v) => resolve_promise(&reaction.result_promise, v, context),
            Err(e) => reject_promise(&reaction.result_promise, e, context),
        }
    });
}

fn make_resolving_function(promise: JsObject, is_resolve: bool, context: &Context) -> JsObject {
    JsObject::native_function(context, if is_resolve { "resolve" } else { "reject" }, 1, move |_this, args, context| {
        let value = arg(args, 0);
        if is_resolve {
            resolve_promise(&promise, value, context);
        } else {
            reject_promise(&promise, value, context);
        }
        Ok(JsValue::Undefined)
    })
}

/// `PerformPromiseThen`: registers (or immediately schedules, if already
/// settled) reactions and returns the derived promise.
fn promise_then(promise: &JsObject, on_fulfilled: Option<JsObject>, on_rejected: Option<JsObject>, context: &mut Context) -> JsObject {
    let derived = new_promise(context);
    let fulfill_reaction = Reaction { handler: on_fulfilled, result_promise: derived.clone() };
    let reject_reaction = Reaction { handler: on_rejected, result_promise: derived.clone() };
    let state = {
        let data = promise.borrow();
        let ObjectKind::Promise(p) = &data.kind else { unreachable!() };
        p.state.clone()
    };
    match state {
        PromiseState::Pending => {
            let mut data = promise.borrow_mut();
            let ObjectKind::Promise(p) = &mut data.kind else { unreachable!() };
            p.fulfill_reactions.push(fulfill_reaction);
            p.reject_reactions.push(reject_reaction);
        }
        PromiseState::Fulfilled(v) => schedule_reaction(fulfill_reaction, true, v, context),
        PromiseState::Rejected(r) => schedule_reaction(reject_reaction, false, r, context),
    }
    derived
}

fn coerce_to_promise(value: JsValue, context: &mut Context) -> JsObject {
    if let JsValue::Object(o) = &value {
        if matches!(o.borrow().kind, ObjectKind::Promise(_)) {
            return o.clone();
        }
    }
    let p = new_promise(context);
    resolve_promise(&p, value, context);
    p
}

fn collect_promises(iterable: &JsValue, context: &mut Context) -> JsResult<Vec<JsObject>> {
    let mut record = crate::iterator::get_iterator(iterable, context)?;
    let mut out = Vec::new();
    while let Some(item) = crate::iterator::iterator_step(&mut record, context)? {
        out.push(coerce_to_promise(item, context));
    }
    Ok(out)
}

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().promise_prototype.clone();

    install_method(context, &proto, "then", 2, |this, args, context| {
        let promise = as_promise(this, context)?;
        let on_fulfilled = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned();
        let on_rejected = arg(args, 1).as_object().filter(|o| o.is_callable()).cloned();
        Ok(JsValue::Object(promise_then(&promise, on_fulfilled, on_rejected, context)))
    });

    install_method(context, &proto, "catch", 1, |this, args, context| {
        let promise = as_promise(this, context)?;
        let on_rejected = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned();
        Ok(JsValue::Object(promise_then(&promise, None, on_rejected, context)))
    });

    install_method(context, &proto, "finally", 1, |this, args, context| {
        let promise = as_promise(this, context)?;
        let Some(on_finally) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Ok(JsValue::Object(promise_then(&promise, None, None, context)));
        };
        let f1 = on_finally.clone();
        let fulfill_wrapper = JsObject::native_function(context, "", 1, move |_this, args, context| {
            f1.call(context, &JsValue::Undefined, &[])?;
            Ok(arg(args, 0))
        });
        let f2 = on_finally;
        let reject_wrapper = JsObject::native_function(context, "", 1, move |_this, args, context| {
            f2.call(context, &JsValue::Undefined, &[])?;
            Err(arg(args, 0))
        });
        Ok(JsValue::Object(promise_then(&promise, Some(fulfill_wrapper), Some(reject_wrapper), context)))
    });

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "Promise", 1, move |_this, args, context| {
        let executor = arg(args, 0)
            .as_object()
            .filter(|o| o.is_callable())
            .cloned()
            .ok_or_else(|| context.construct_type_error("Promise resolver is not a function"))?;
        let promise = JsObject::new(ObjectKind::Promise(PromiseData::default()), Some(proto_for_ctor.clone()));
        let resolve_fn = make_resolving_function(promise.clone(), true, context);
        let reject_fn = make_resolving_function(promise.clone(), false, context);
        if let Err(e) = executor.call(context, &JsValue::Undefined, &[JsValue::Object(resolve_fn), JsValue::Object(reject_fn)]) {
            reject_promise(&promise, e, context);
        }
        Ok(JsValue::Object(promise))
    });

    install_method(context, &ctor, "resolve", 1, |_this, args, context| {
        let value = arg(args, 0);
        if let JsValue::Object(o) = &value {
            if matches!(o.borrow().kind, ObjectKind::Promise(_)) {
                return Ok(value);
            }
        }
        let promise = new_promise(context);
        resolve_promise(&promise, value, context);
        Ok(JsValue::Object(promise))
    });

    install_method(context, &ctor, "reject", 1, |_this, args, context| {
        let promise = new_promise(context);
        reject_promise(&promise, arg(args, 0), context);
        Ok(JsValue::Object(promise))
    });

    install_method(context, &ctor, "all", 1, |_this, args, context| {
        let promises = collect_promises(&arg(args, 0), context)?;
        let result = new_promise(context);
        let n = promises.len();
        if n == 0 {
            resolve_promise(&result, JsValue::Object(JsObject::array_from_values(Vec::new(), context)), context);
            return Ok(JsValue::Object(result));
        }
        let results = Rc::new(RefCell::new(vec![JsValue::Undefined; n]));
        let remaining = Rc::new(Cell::new(n));
        for (i, p) in promises.into_iter().enumerate() {
            let result_f = result.clone();
            let results_f = results.clone();
            let remaining_f = remaining.clone();
            let on_fulfilled = JsObject::native_function(context, "", 1, move |_this, args, context| {
                results_f.borrow_mut()[i] = arg(args, 0);
                remaining_f.set(remaining_f.get() - 1);
                if remaining_f.get() == 0 {
                    let values = results_f.borrow().clone();
                    resolve_promise(&result_f, JsValue::Object(JsObject::array_from_values(values, context)), context);
                }
                Ok(JsValue::Undefined)
            });
            let result_r = result.clone();
            let on_rejected = JsObject::native_function(context, "", 1, move |_this, args, context| {
                reject_promise(&result_r, arg(args, 0), context);
                Ok(JsValue::Undefined)
            });
            promise_then(&p, Some(on_fulfilled), Some(on_rejected), context);
        }
        Ok(JsValue::Object(result))
    });

    install_method(context, &ctor, "race", 1, |_this, args, context| {
        let promises = collect_promises(&arg(args, 0), context)?;
        let result = new_promise(context);
        for p in promises {
            let result_f = result.clone();
            let on_fulfilled = JsObject::native_function(context, "", 1, move |_this, args, context| {
                resolve_promise(&result_f, arg(args, 0), context);
                Ok(JsValue::Undefined)
            });
            let result_r = result.clone();
            let on_rejected = JsObject::native_function(context, "", 1, move |_this, args, context| {
                reject_promise(&result_r, arg(args, 0), context);
                Ok(JsValue::Undefined)
            });
            promise_then(&p, Some(on_fulfilled), Some(on_rejected), context);
        }
        Ok(JsValue::Object(result))
    });

    install_method(context, &ctor, "allSettled", 1, |_this, args, context| {
        let promises = collect_promises(&arg(args, 0), context)?;
        let result = new_promise(context);
        let n = promises.len();
        if n == 0 {
            resolve_promise(&result, JsValue::Object(JsObject::array_from_values(Vec::new(), context)), context);
            return Ok(JsValue::Object(result));
        }
        let results = Rc::new(RefCell::new(vec![JsValue::Undefined; n]));
        let remaining = Rc::new(Cell::new(n));
        for (i, p) in promises.into_iter().enumerate() {
            let result_f = result.clone();
            let results_f = results.clone();
            let remaining_f = remaining.clone();
            let on_fulfilled = JsObject::native_function(context, "", 1, move |_this, args, context| {
                let entry = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
                entry.create_data_property("status", JsValue::from("fulfilled"), method_attrs());
                entry.create_data_property("value", arg(args, 0), method_attrs());
                results_f.borrow_mut()[i] = JsValue::Object(entry);
                remaining_f.set(remaining_f.get() - 1);
                if remaining_f.get() == 0 {
                    let values = results_f.borrow().clone();
                    resolve_promise(&result_f, JsValue::Object(JsObject::array_from_values(values, context)), context);
                }
                Ok(JsValue::Undefined)
            });
            let result_r = result.clone();
            let results_r = results.clone();
            let remaining_r = remaining.clone();
            let on_rejected = JsObject::native_function(context, "", 1, move |_this, args, context| {
                let entry = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
                entry.create_data_property("status", JsValue::from("rejected"), method_attrs());
                entry.create_data_property("reason", arg(args, 0), method_attrs());
                results_r.borrow_mut()[i] = JsValue::Object(entry);
                remaining_r.set(remaining_r.get() - 1);
                if remaining_r.get() == 0 {
                    let values = results_r.borrow().clone();
                    resolve_promise(&result_r, JsValue::Object(JsObject::array_from_values(values, context)), context);
                }
                Ok(JsValue::Undefined)
            });
            promise_then(&p, Some(on_fulfilled), Some(on_rejected), context);
        }
        Ok(JsValue::Object(result))
    });

    // No `AggregateError` type exists in this engine (§2's error hierarchy
    // is `Error`/`TypeError`/`RangeError`/`ReferenceError`/`SyntaxError`/
    // `URIError` only), so `any`'s all-rejected case reports a plain `Error`
    // carrying an `errors` array rather than a real `AggregateError`.
    install_method(context, &ctor, "any", 1, |_this, args, context| {
        let promises = collect_promises(&arg(args, 0), context)?;
        let result = new_promise(context);
        let n = promises.len();
        if n == 0 {
            let err = context.construct_error("all promises were rejected");
            reject_promise(&result, err, context);
            return Ok(JsValue::Object(result));
        }
        let errors = Rc::new(RefCell::new(vec![JsValue::Undefined; n]));
        let remaining = Rc::new(Cell::new(n));
        for (i, p) in promises.into_iter().enumerate() {
            let result_f = result.clone();
            let on_fulfilled = JsObject::native_function(context, "", 1, move |_this, args, context| {
                resolve_promise(&result_f, arg(args, 0), context);
                Ok(JsValue::Undefined)
            });
            let result_r = result.clone();
            let errors_r = errors.clone();
            let remaining_r = remaining.clone();
            let on_rejected = JsObject::native_function(context, "", 1, move |_this, args, context| {
                errors_r.borrow_mut()[i] = arg(args, 0);
                remaining_r.set(remaining_r.get() - 1);
                if remaining_r.get() == 0 {
                    let err = context.construct_error("all promises were rejected");
                    if let JsValue::Object(e) = &err {
                        e.create_data_property(
                            "errors",
                            JsValue::Object(JsObject::array_from_values(errors_r.borrow().clone(), context)),
                            method_attrs(),
                        );
                    }
                    reject_promise(&result_r, err, context);
                }
                Ok(JsValue::Undefined)
            });
            promise_then(&p, Some(on_fulfilled), Some(on_rejected), context);
        }
        Ok(JsValue::Object(result))
    });

    link_constructor(&ctor, &proto);
    register_global(context, "Promise", ctor);
}

#[cfg(test)]
mod tests {
    use crate::{forward_val, Context};

    // `eval_program` computes a script's completion value *before* draining
    // the microtask queue (§9's async model), so a reaction's side effect is
    // only observable from a second, separate `forward_val` call against the
    // same `Context` — one that reads the now-settled variable rather than
    // evaluating it as part of the same top-level statement sequence.

    #[test]
    fn then_chain_settles_after_microtask_drain() {
        let mut ctx = Context::new();
        forward_val(&mut ctx, "let result; Promise.resolve(1).then(v => v + 1).then(v => v + 1).then(v => { result = v; });").unwrap();
        let v = forward_val(&mut ctx, "result").unwrap();
        assert_eq!(v.as_number(), Some(3.0));
    }

    #[test]
    fn catch_handles_rejection() {
        let mut ctx = Context::new();
        forward_val(&mut ctx, "let caught; Promise.reject('boom').catch(e => { caught = e; });").unwrap();
        let v = forward_val(&mut ctx, "caught").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "boom");
    }

    #[test]
    fn promise_all_resolves_with_array_of_results() {
        let mut ctx = Context::new();
        forward_val(&mut ctx, "let out; Promise.all([1, Promise.resolve(2), 3]).then(v => { out = v; });").unwrap();
        let v = forward_val(&mut ctx, "out.join(',')").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "1,2,3");
    }

    #[test]
    fn promise_all_rejects_on_first_rejection() {
        let mut ctx = Context::new();
        forward_val(&mut ctx, "let err; Promise.all([Promise.resolve(1), Promise.reject('no')]).catch(e => { err = e; });").unwrap();
        let v = forward_val(&mut ctx, "err").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "no");
    }

    #[test]
    fn new_promise_constructor_settles_via_executor() {
        let mut ctx = Context::new();
        forward_val(&mut ctx, "let out; new Promise((res) => res(5)).then(v => { out = v; });").unwrap();
        let v = forward_val(&mut ctx, "out").unwrap();
        assert_eq!(v.as_number(), Some(5.0));
    }
}
