//! `Reflect`, the meta-object-protocol surface that mirrors every internal
//! method 1:1 as a static function, per §4.9.
//!
//! Every operation here dispatches to the matching `proxy_*` free function
//! when the target is a `Proxy`, and to the plain `JsObject` internal method
//! otherwise — the same dispatch `internal_methods` itself now does
//! internally, so this `is_proxy` check is redundant with the one inside
//! `get_own_property`/`has_property`/etc., but kept for symmetry with
//! `apply`/`construct` below, which have no internal-method equivalent to
//! fall back on.

use super::object::{from_property_descriptor, to_property_descriptor};
use super::proxy::{
    proxy_define_property, proxy_delete, proxy_get, proxy_get_own_property_descriptor, proxy_get_prototype_of, proxy_has,
    proxy_is_extensible, proxy_own_keys, proxy_prevent_extensions, proxy_set, proxy_set_prototype_of,
};
use super::{arg, install_method, register_global};
use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::property::PropertyKey;
use crate::value::JsValue;
use crate::JsResult;

fn is_proxy(o: &JsObject) -> bool {
    matches!(o.borrow().kind, ObjectKind::Proxy(_))
}

fn target_object(value: &JsValue, context: &mut Context) -> JsResult<JsObject> {
    value.as_object().cloned().ok_or_else(|| context.construct_type_error("Reflect target must be an object"))
}

pub(crate) fn init(context: &mut Context) {
    let reflect = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));

    install_method(context, &reflect, "get", 2, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let key: PropertyKey = arg(args, 1).to_property_key(context)?;
        let receiver = if args.len() > 2 { arg(args, 2) } else { JsValue::Object(target.clone()) };
        if is_proxy(&target) {
            proxy_get(&target, &key, &receiver, context)
        } else {
            target.get_with_receiver(key, &receiver, context)
        }
    });

    install_method(context, &reflect, "set", 3, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let key: PropertyKey = arg(args, 1).to_property_key(context)?;
        let value = arg(args, 2);
        let receiver = if args.len() > 3 { arg(args, 3) } else { JsValue::Object(target.clone()) };
        let ok = if is_proxy(&target) { proxy_set(&target, &key, value, &receiver, context)? } else { target.set_with_receiver(key, value, &receiver, context)? };
        Ok(JsValue::from(ok))
    });

    install_method(context, &reflect, "has", 2, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let key: PropertyKey = arg(args, 1).to_property_key(context)?;
        let has = if is_proxy(&target) { proxy_has(&target, &key, context)? } else { target.has_property(key, context)? };
        Ok(JsValue::from(has))
    });

    install_method(context, &reflect, "deleteProperty", 2, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let key: PropertyKey = arg(args, 1).to_property_key(context)?;
        let ok = if is_proxy(&target) { proxy_delete(&target, &key, context)? } else { target.delete_property(key, context)? };
        Ok(JsValue::from(ok))
    });

    install_method(context, &reflect, "ownKeys", 1, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let keys = if is_proxy(&target) { proxy_own_keys(&target, context)? } else { target.own_property_keys(context)? };
        let values: Vec<JsValue> = keys
            .into_iter()
            .map(|k| match k {
                PropertyKey::String(s) => JsValue::from(s.to_string()),
                PropertyKey::Symbol(s) => JsValue::Symbol(s),
                PropertyKey::Index(i) => JsValue::from(i.to_string()),
            })
            .collect();
        Ok(JsValue::Object(JsObject::array_from_values(values, context)))
    });

    install_method(context, &reflect, "getPrototypeOf", 1, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let proto = if is_proxy(&target) { proxy_get_prototype_of(&target, context)? } else { target.prototype() };
        Ok(proto.map(JsValue::Object).unwrap_or(JsValue::Null))
    });

    install_method(context, &reflect, "setPrototypeOf", 2, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let proto = arg(args, 1).as_object().cloned();
        let ok = if is_proxy(&target) {
            proxy_set_prototype_of(&target, proto, context)?
        } else {
            target.set_prototype(proto);
            true
        };
        Ok(JsValue::from(ok))
    });

    install_method(context, &reflect, "isExtensible", 1, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let ext = if is_proxy(&target) { proxy_is_extensible(&target, context)? } else { target.is_extensible_flag() };
        Ok(JsValue::from(ext))
    });

    install_method(context, &reflect, "preventExtensions", 1, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let ok = if is_proxy(&target) {
            proxy_prevent_extensions(&target, context)?
        } else {
            target.prevent_extensions();
            true
        };
        Ok(JsValue::from(ok))
    });

    install_method(context, &reflect, "getOwnPropertyDescriptor", 2, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let key: PropertyKey = arg(args, 1).to_property_key(context)?;
        let desc = if is_proxy(&target) { proxy_get_own_property_descriptor(&target, &key, context)? } else { target.get_own_property(key, context)? };
        Ok(desc.map(|d| JsValue::Object(from_property_descriptor(d, context))).unwrap_or(JsValue::Undefined))
    });

    install_method(context, &reflect, "defineProperty", 3, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        let key: PropertyKey = arg(args, 1).to_property_key(context)?;
        let desc_obj = arg(args, 2).as_object().cloned().ok_or_else(|| context.construct_type_error("property descriptor must be an object"))?;
        let desc = to_property_descriptor(&desc_obj, context)?;
        let ok = if is_proxy(&target) { proxy_define_property(&target, &key, desc, context)? } else { target.define_own_property(key, desc, context)? };
        Ok(JsValue::from(ok))
    });

    install_method(context, &reflect, "apply", 3, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        if !target.is_callable() {
            return Err(context.construct_type_error("Reflect.apply target is not callable"));
        }
        let this_arg = arg(args, 1);
        let call_args = collect_array_like(&arg(args, 2), context)?;
        target.call(context, &this_arg, &call_args)
    });

    install_method(context, &reflect, "construct", 2, |_this, args, context| {
        let target = target_object(&arg(args, 0), context)?;
        if !target.is_constructor() {
            return Err(context.construct_type_error("Reflect.construct target is not a constructor"));
        }
        let call_args = collect_array_like(&arg(args, 1), context)?;
        if is_proxy(&target) {
            let new_target = if args.len() > 2 { arg(args, 2) } else { JsValue::Object(target.clone()) };
            super::proxy::proxy_construct(&target, &call_args, &new_target, context)
        } else {
            target.construct(context, &call_args)
        }
    });

    register_global(context, "Reflect", reflect);
}

/// Reads an array-like's `length` + indexed elements, the shape
/// `Reflect.apply`/`Reflect.construct`'s `argumentsList` parameter takes.
fn collect_array_like(value: &JsValue, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let obj = value.as_object().cloned().ok_or_else(|| context.construct_type_error("arguments list must be an object"))?;
    let len = obj.get("length", context)?.to_integer_or_infinity(context)?.max(0.0) as u32;
    let mut out = Vec::with_capacity(len as usize);
    for i in 0..len {
        out.push(obj.get_element(i, context)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::{forward_val, Context};

    #[test]
    fn get_set_has_delete_round_trip() {
        let mut ctx = Context::new();
        let v = forward_val(
            &mut ctx,
            "let o = {x: 1}; Reflect.set(o, 'y', 2); let before = Reflect.has(o, 'y'); Reflect.deleteProperty(o, 'y'); [Reflect.get(o, 'x'), before, Reflect.has(o, 'y')].join(',')",
        )
        .unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "1,true,false");
    }

    #[test]
    fn reflect_dispatches_through_proxy_traps() {
        let mut ctx = Context::new();
        let v = forward_val(
            &mut ctx,
            "let calls = []; let p = new Proxy({}, {get(t,k){ calls.push(k); return 42; }}); let r = Reflect.get(p, 'x'); calls[0] + ':' + r",
        )
        .unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "x:42");
    }

    #[test]
    fn apply_and_construct() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "function add(a,b){ return a+b; } Reflect.apply(add, null, [1,2])").unwrap();
        assert_eq!(v.as_number(), Some(3.0));

        let v = forward_val(&mut ctx, "function P(x){ this.x = x; } Reflect.construct(P, [5]).x").unwrap();
        assert_eq!(v.as_number(), Some(5.0));
    }

    #[test]
    fn own_keys_lists_string_and_symbol_keys() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "let s = Symbol('s'); let o = {a: 1, [s]: 2}; Reflect.ownKeys(o).length").unwrap();
        assert_eq!(v.as_number(), Some(2.0));
    }
}
