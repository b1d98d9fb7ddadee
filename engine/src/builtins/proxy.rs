//! The `Proxy` constructor, `Proxy.revocable`, and [`ProxyData`], the
//! `ObjectKind::Proxy` payload, per §4.8.
//!
//! All thirteen traps (`get`, `set`, `has`, `deleteProperty`, `ownKeys`,
//! `getOwnPropertyDescriptor`, `defineProperty`, `getPrototypeOf`,
//! `setPrototypeOf`, `isExtensible`, `preventExtensions`, `apply`,
//! `construct`) are implemented here as free functions with the full
//! invariant checks §4.8 requires, and all thirteen are reachable the same
//! way: [`crate::object::internal_methods`]'s generic dispatch
//! (`get_with_receiver`/`set_with_receiver`/`has_property`/`delete_property`/
//! `own_property_keys`/`get_own_property`/`define_own_property`) checks for
//! `ObjectKind::Proxy` and calls straight into the matching `proxy_*`
//! function below, so `in`, `delete`, `for...in`, `Object.keys`, and
//! `Object.getPrototypeOf`/`setPrototypeOf`/`isExtensible`/
//! `preventExtensions` on a `Proxy` run the same trap-dispatching code as
//! `Reflect.*`, not a simplified direct-forwarding path.

use super::{arg, install_method, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::gc::{Finalize, Trace};
use crate::object::{JsObject, ObjectKind};
use crate::property::{Attribute, PropertyDescriptor, PropertyKey};
use crate::value::JsValue;
use crate::JsResult;

#[derive(Debug, Clone, Default, Trace, Finalize)]
pub struct ProxyData {
    pub target: Option<JsObject>,
    pub handler: Option<JsObject>,
}

impl ProxyData {
    fn revoked(&self) -> bool {
        self.target.is_none() || self.handler.is_none()
    }
}

pub(crate) fn init(context: &mut Context) {
    // `Proxy` has no `.prototype` own property — a proxy's own prototype is
    // whatever its target's is, reached through `getPrototypeOf`, not through
    // a `Proxy.prototype` constructor link.
    let ctor = native_constructor(context, "Proxy", 2, |_this, args, context| {
        let (target, handler) = proxy_args(args, context)?;
        Ok(JsValue::Object(JsObject::new(ObjectKind::Proxy(ProxyData { target: Some(target), handler: Some(handler) }), None)))
    });
    install_method(context, &ctor, "revocable", 2, |_this, args, context| {
        let (target, handler) = proxy_args(args, context)?;
        let data = std::rc::Rc::new(std::cell::RefCell::new(Some(ProxyData { target: Some(target), handler: Some(handler) })));
        let proxy_obj = JsObject::new(ObjectKind::Proxy(data.borrow().clone().unwrap()), None);

        let result = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
        result.create_data_property("proxy", JsValue::Object(proxy_obj.clone()), Attribute::default());

        let revoke = JsObject::native_function(context, "", 0, move |_this, _args, _context| {
            data.borrow_mut().take();
            if let ObjectKind::Proxy(p) = &mut proxy_obj.borrow_mut().kind {
                p.target = None;
                p.handler = None;
            }
            Ok(JsValue::Undefined)
        });
        result.create_data_property("revoke", JsValue::Object(revoke), Attribute::default());
        Ok(JsValue::Object(result))
    });
    register_global(context, "Proxy", ctor);
}

fn proxy_args(args: &[JsValue], context: &mut Context) -> JsResult<(JsObject, JsObject)> {
    let Some(target) = arg(args, 0).as_object().cloned() else {
        return Err(context.construct_type_error("Cannot create proxy with a non-object as target"));
    };
    let Some(handler) = arg(args, 1).as_object().cloned() else {
        return Err(context.construct_type_error("Cannot create proxy with a non-object as handler"));
    };
    Ok((target, handler))
}

fn proxy_data(proxy: &JsObject) -> ProxyData {
    match &proxy.borrow().kind {
        ObjectKind::Proxy(p) => p.clone(),
        _ => unreachable!("proxy_data called on a non-Proxy object"),
    }
}

fn key_to_value(key: &PropertyKey) -> JsValue {
    match key {
        PropertyKey::String(s) => JsValue::from(s.to_string()),
        PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
        PropertyKey::Index(i) => JsValue::from(i.to_string()),
    }
}

/// Looks up `handler[name]`; `Ok(None)` if absent/null/undefined, a
/// `TypeError` if present but not callable, per `GetMethod`.
fn trap(handler: &JsObject, name: &str, context: &mut Context) -> JsResult<Option<JsObject>> {
    let v = handler.get(name, context)?;
    if v.is_null_or_undefined() {
        return Ok(None);
    }
    match v.as_object().filter(|o| o.is_callable()).cloned() {
        Some(f) => Ok(Some(f)),
        None => Err(context.construct_type_error(format!("proxy handler's '{name}' trap is not a function"))),
    }
}

/// Logs a trap-invariant violation at `debug` before it is turned into the
/// `TypeError` the caller throws (§10's logging convention: violations are
/// logged on the way to becoming an exception, not instead of one).
fn invariant_violation(message: String) -> String {
    log::debug!("proxy: trap invariant violated: {message}");
    message
}

fn check_revoked(proxy: &ProxyData, context: &mut Context) -> JsResult<(JsObject, JsObject)> {
    match (&proxy.target, &proxy.handler) {
        (Some(t), Some(h)) => Ok((t.clone(), h.clone())),
        _ => Err(context.construct_type_error("Cannot perform operation on a proxy that has been revoked")),
    }
}

/// The `get` trap: §4.8's invariant is that if the target has a
/// non-configurable, non-writable own data property, the trap result must
/// be `SameValue` to the target's value; if it has a non-configurable
/// accessor with no getter, the trap result must be `undefined`.
pub(crate) fn proxy_get(proxy: &JsObject, key: &PropertyKey, receiver: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "get", context)? else {
        return target.get_with_receiver(key.clone(), receiver, context);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone()), key_to_value(key), receiver.clone()])?;
    if let Some(target_desc) = target.get_own_property(key.clone(), context)? {
        if !target_desc.configurable() {
            match &target_desc {
                PropertyDescriptor::Data(d) if !d.writable && !result.same_value(&d.value) => {
                    return Err(context.construct_type_error(invariant_violation(format!(
                        "'get' on proxy: property '{key}' is a non-configurable, non-writable own data property with a different value"
                    ))));
                }
                PropertyDescriptor::Accessor(a) if a.get.is_none() && !result.is_undefined() => {
                    return Err(context.construct_type_error(invariant_violation(format!(
                        "'get' on proxy: property '{key}' is a non-configurable accessor with no getter, so the trap result must be undefined"
                    ))));
                }
                _ => {}
            }
        }
    }
    Ok(result)
}

/// The `set` trap: the mirror-image invariant of [`proxy_get`] — a
/// non-configurable, non-writable own data property's value can't be
/// "changed" through a trap that reports success, and a non-configurable
/// accessor with no setter can never report success either.
pub(crate) fn proxy_set(proxy: &JsObject, key: &PropertyKey, value: JsValue, receiver: &JsValue, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "set", context)? else {
        return target.set_with_receiver(key.clone(), value, receiver, context);
    };
    let result = f.call(
        context,
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone()), key_to_value(key), value.clone(), receiver.clone()],
    )?;
    if !result.to_boolean() {
        return Ok(false);
    }
    if let Some(target_desc) = target.get_own_property(key.clone(), context)? {
        if !target_desc.configurable() {
            match &target_desc {
                PropertyDescriptor::Data(d) if !d.writable && !value.same_value(&d.value) => {
                    return Err(context.construct_type_error(invariant_violation(format!(
                        "'set' on proxy: trap returned truish for property '{key}' which exists in the proxy target as a non-configurable, non-writable own data property with a different value"
                    ))));
                }
                PropertyDescriptor::Accessor(a) if a.set.is_none() => {
                    return Err(context.construct_type_error(invariant_violation(format!(
                        "'set' on proxy: trap returned truish for property '{key}' which exists in the proxy target as a non-configurable accessor with no setter"
                    ))));
                }
                _ => {}
            }
        }
    }
    Ok(true)
}

pub(crate) fn proxy_has(proxy: &JsObject, key: &PropertyKey, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "has", context)? else {
        return target.has_property(key.clone(), context);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone()), key_to_value(key)])?.to_boolean();
    if !result {
        if let Some(target_desc) = target.get_own_property(key.clone(), context)? {
            if !target_desc.configurable() {
                return Err(context.construct_type_error(invariant_violation(format!(
                    "'has' on proxy: trap returned falsish for property '{key}' which exists in the non-extensible proxy target as non-configurable"
                ))));
            }
            if !target.is_extensible_flag() {
                return Err(context.construct_type_error(invariant_violation(format!(
                    "'has' on proxy: trap returned falsish for property '{key}' but the proxy target is not extensible"
                ))));
            }
        }
    }
    Ok(result)
}

pub(crate) fn proxy_delete(proxy: &JsObject, key: &PropertyKey, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "deleteProperty", context)? else {
        return target.delete_property(key.clone(), context);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone()), key_to_value(key)])?.to_boolean();
    if result {
        if let Some(target_desc) = target.get_own_property(key.clone(), context)? {
            if !target_desc.configurable() {
                return Err(context.construct_type_error(invariant_violation(format!(
                    "'deleteProperty' on proxy: property '{key}' is a non-configurable property but the trap returned truish"
                ))));
            }
        }
    }
    Ok(result)
}

pub(crate) fn proxy_own_keys(proxy: &JsObject, context: &mut Context) -> JsResult<Vec<PropertyKey>> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "ownKeys", context)? else {
        return target.own_property_keys(context);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone())])?;
    let Some(array) = result.as_object().cloned() else {
        return Err(context.construct_type_error(invariant_violation("'ownKeys' on proxy: trap result is not an object".into())));
    };
    let len = array.get("length", context)?.to_integer_or_infinity(context)? as u32;
    let mut keys = Vec::with_capacity(len as usize);
    for i in 0..len {
        keys.push(array.get_element(i, context)?.to_property_key(context)?);
    }
    Ok(keys)
}

pub(crate) fn proxy_get_own_property_descriptor(proxy: &JsObject, key: &PropertyKey, context: &mut Context) -> JsResult<Option<PropertyDescriptor>> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "getOwnPropertyDescriptor", context)? else {
        return target.get_own_property(key.clone(), context);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone()), key_to_value(key)])?;
    if result.is_undefined() {
        return Ok(None);
    }
    let Some(desc_obj) = result.as_object().cloned() else {
        return Err(context.construct_type_error(invariant_violation("'getOwnPropertyDescriptor' on proxy: trap result is neither object nor undefined".into())));
    };
    let desc = super::object::to_property_descriptor(&desc_obj, context)?;
    Ok(Some(desc))
}

pub(crate) fn proxy_define_property(proxy: &JsObject, key: &PropertyKey, desc: PropertyDescriptor, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "defineProperty", context)? else {
        return target.define_own_property(key.clone(), desc, context);
    };
    let desc_obj = super::object::from_property_descriptor(desc, context);
    let result = f
        .call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone()), key_to_value(key), JsValue::Object(desc_obj)])?
        .to_boolean();
    Ok(result)
}

pub(crate) fn proxy_get_prototype_of(proxy: &JsObject, context: &mut Context) -> JsResult<Option<JsObject>> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "getPrototypeOf", context)? else {
        return Ok(target.prototype());
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone())])?;
    match result {
        JsValue::Null => Ok(None),
        JsValue::Object(o) => Ok(Some(o)),
        _ => Err(context.construct_type_error(invariant_violation("'getPrototypeOf' on proxy: trap returned neither object nor null".into()))),
    }
}

pub(crate) fn proxy_set_prototype_of(proxy: &JsObject, proto: Option<JsObject>, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let proto_value = proto.clone().map(JsValue::Object).unwrap_or(JsValue::Null);
    let Some(f) = trap(&handler, "setPrototypeOf", context)? else {
        target.set_prototype(proto);
        return Ok(true);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target), proto_value])?.to_boolean();
    Ok(result)
}

pub(crate) fn proxy_is_extensible(proxy: &JsObject, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "isExtensible", context)? else {
        return Ok(target.is_extensible_flag());
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone())])?.to_boolean();
    if result != target.is_extensible_flag() {
        return Err(context.construct_type_error(invariant_violation("'isExtensible' on proxy: trap result does not reflect extensibility of proxy target".into())));
    }
    Ok(result)
}

pub(crate) fn proxy_prevent_extensions(proxy: &JsObject, context: &mut Context) -> JsResult<bool> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "preventExtensions", context)? else {
        target.prevent_extensions();
        return Ok(true);
    };
    let result = f.call(context, &JsValue::Object(handler), &[JsValue::Object(target.clone())])?.to_boolean();
    if result && target.is_extensible_flag() {
        return Err(context.construct_type_error(invariant_violation(
            "'preventExtensions' on proxy: trap returned truish but the proxy target is extensible".into(),
        )));
    }
    Ok(result)
}

pub(crate) fn proxy_apply(proxy: &JsObject, this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "apply", context)? else {
        return target.call(context, this, args);
    };
    let args_array = JsObject::array_from_values(args.to_vec(), context);
    f.call(context, &JsValue::Object(handler), &[JsValue::Object(target), this.clone(), JsValue::Object(args_array)])
}

pub(crate) fn proxy_construct(proxy: &JsObject, args: &[JsValue], new_target: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let data = proxy_data(proxy);
    let (target, handler) = check_revoked(&data, context)?;
    let Some(f) = trap(&handler, "construct", context)? else {
        return target.construct(context, args);
    };
    let args_array = JsObject::array_from_values(args.to_vec(), context);
    let result = f.call(
        context,
        &JsValue::Object(handler),
        &[JsValue::Object(target), JsValue::Object(args_array), new_target.clone()],
    )?;
    match result {
        JsValue::Object(_) => Ok(result),
        _ => Err(context.construct_type_error(invariant_violation("'construct' on proxy: trap result is not an object".into()))),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn get_trap_intercepts_reads() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(&mut ctx, "let p = new Proxy({}, { get: () => 42 }); p.anything"),
            "42"
        );
    }

    #[test]
    fn no_get_trap_forwards_to_target() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let p = new Proxy({ a: 1 }, {}); p.a"), "1");
    }

    #[test]
    fn set_trap_intercepts_writes() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(&mut ctx, "let log = []; let p = new Proxy({}, { set(t,k,v) { log.push(k); t[k]=v; return true; } }); p.x = 1; log[0]"),
            "x"
        );
    }

    #[test]
    fn revoke_disables_further_access() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(
                &mut ctx,
                "let { proxy, revoke } = Proxy.revocable({ a: 1 }, {}); revoke(); let threw = false; try { proxy.a; } catch (e) { threw = true; } threw"
            ),
            "true"
        );
    }
}
