//! The `Object` constructor and `Object.prototype`, per §4.1/§4.2.
//!
//! [`to_property_descriptor`]/[`from_property_descriptor`] are shared with
//! `builtins::reflect` and `builtins::proxy`, since `Reflect.defineProperty`/
//! a proxy's `defineProperty` trap forward to the exact same descriptor
//! parsing `Object.defineProperty` does.

use super::proxy::{proxy_get_prototype_of, proxy_is_extensible, proxy_prevent_extensions, proxy_set_prototype_of};
use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::property::{Attribute, PropertyDescriptor, PropertyKey};
use crate::value::JsValue;
use crate::JsResult;

fn is_proxy(o: &JsObject) -> bool {
    matches!(o.borrow().kind, ObjectKind::Proxy(_))
}

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().object_prototype.clone();

    install_method(context, &proto, "toString", 0, |this, _args, context| {
        let obj = this.to_object(context)?;
        let tag = obj.get(context.well_known_symbols().to_string_tag.clone(), context)?;
        let name = match tag.as_string() {
            Some(s) => s.to_string(),
            None => obj.kind_name().to_string(),
        };
        Ok(JsValue::from(format!("[object {name}]")))
    });
    install_method(context, &proto, "toLocaleString", 0, |this, args, context| {
        let method = this.to_object(context)?.get("toString", context)?;
        match method.as_object().filter(|o| o.is_callable()) {
            Some(f) => f.call(context, this, args),
            None => Ok(JsValue::from("[object Object]")),
        }
    });
    install_method(context, &proto, "valueOf", 0, |this, _args, context| {
        Ok(JsValue::Object(this.to_object(context)?))
    });
    install_method(context, &proto, "hasOwnProperty", 1, |this, args, context| {
        let key = arg(args, 0).to_property_key(context)?;
        Ok(JsValue::from(this.to_object(context)?.has_own_property(key, context)?))
    });
    install_method(context, &proto, "isPrototypeOf", 1, |this, args, context| {
        let Some(candidate) = arg(args, 0).as_object().cloned() else {
            return Ok(JsValue::from(false));
        };
        let obj = this.to_object(context)?;
        let mut proto = candidate.prototype();
        while let Some(p) = proto {
            if JsObject::equals(&p, &obj) {
                return Ok(JsValue::from(true));
            }
            proto = p.prototype();
        }
        Ok(JsValue::from(false))
    });
    install_method(context, &proto, "propertyIsEnumerable", 1, |this, args, context| {
        let key = arg(args, 0).to_property_key(context)?;
        let obj = this.to_object(context)?;
        Ok(JsValue::from(obj.get_own_property(key, context)?.map(|d| d.enumerable()).unwrap_or(false)))
    });

    let ctor = native_constructor(context, "Object", 1, |_this, args, context| {
        match arg(args, 0) {
            JsValue::Undefined | JsValue::Null => {
                Ok(JsValue::Object(JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()))))
            }
            other => Ok(JsValue::Object(other.to_object(context)?)),
        }
    });
    link_constructor(&ctor, &proto);
    install_static_methods(context, &ctor);
    register_global(context, "Object", ctor);
}

fn install_static_methods(context: &mut Context, ctor: &JsObject) {
    install_method(context, ctor, "keys", 1, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let keys: Vec<JsValue> = obj.enumerable_own_string_keys(context)?.into_iter().map(|k| JsValue::from(k.to_string())).collect();
        Ok(JsValue::Object(JsObject::array_from_values(keys, context)))
    });
    install_method(context, ctor, "values", 1, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let mut values = Vec::new();
        for key in obj.enumerable_own_string_keys(context)? {
            values.push(obj.get(key, context)?);
        }
        Ok(JsValue::Object(JsObject::array_from_values(values, context)))
    });
    install_method(context, ctor, "entries", 1, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let mut entries = Vec::new();
        for key in obj.enumerable_own_string_keys(context)? {
            let value = obj.get(key.clone(), context)?;
            let pair = JsObject::array_from_values(vec![JsValue::from(key.to_string()), value], context);
            entries.push(JsValue::Object(pair));
        }
        Ok(JsValue::Object(JsObject::array_from_values(entries, context)))
    });
    install_method(context, ctor, "assign", 2, |_this, args, context| {
        let Some(target) = arg(args, 0).as_object().cloned() else {
            return Err(context.construct_type_error("Object.assign target must be an object"));
        };
        for source in &args[1.min(args.len())..] {
            if source.is_null_or_undefined() {
                continue;
            }
            let source_obj = source.to_object(context)?;
            for key in source_obj.enumerable_own_string_keys(context)? {
                let value = source_obj.get(key.clone(), context)?;
                target.set(key, value, true, context)?;
            }
        }
        Ok(JsValue::Object(target))
    });
    install_method(context, ctor, "freeze", 1, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Ok(arg(args, 0));
        };
        if is_proxy(&obj) {
            proxy_prevent_extensions(&obj, context)?;
        } else {
            obj.prevent_extensions();
        }
        for key in obj.own_property_keys(context)? {
            if let Some(desc) = obj.get_own_property(key.clone(), context)? {
                let mut builder =
                    PropertyDescriptor::builder().enumerable(desc.enumerable()).configurable(false);
                builder = match &desc {
                    PropertyDescriptor::Data(d) => builder.value(d.value.clone()).writable(false),
                    PropertyDescriptor::Accessor(a) => {
                        let mut b = builder;
                        if let Some(g) = &a.get {
                            b = b.get(g.clone());
                        }
                        if let Some(s) = &a.set {
                            b = b.set(s.clone());
                        }
                        b
                    }
                    PropertyDescriptor::Generic(_) => builder,
                };
                obj.define_own_property(key, builder.build(), context)?;
            }
        }
        Ok(JsValue::Object(obj))
    });
    install_method(context, ctor, "isFrozen", 1, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Ok(JsValue::from(true));
        };
        let extensible = if is_proxy(&obj) { proxy_is_extensible(&obj, context)? } else { obj.is_extensible_flag() };
        if extensible {
            return Ok(JsValue::from(false));
        }
        let mut frozen = true;
        for k in obj.own_property_keys(context)? {
            let ok = obj.get_own_property(k, context)?.map(|d| !d.configurable() && d.writable() != Some(true)).unwrap_or(true);
            if !ok {
                frozen = false;
                break;
            }
        }
        Ok(JsValue::from(frozen))
    });
    install_method(context, ctor, "seal", 1, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Ok(arg(args, 0));
        };
        if is_proxy(&obj) {
            proxy_prevent_extensions(&obj, context)?;
        } else {
            obj.prevent_extensions();
        }
        for key in obj.own_property_keys(context)? {
            obj.define_own_property(key, PropertyDescriptor::builder().configurable(false).build(), context)?;
        }
        Ok(JsValue::Object(obj))
    });
    install_method(context, ctor, "isSealed", 1, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Ok(JsValue::from(true));
        };
        let extensible = if is_proxy(&obj) { proxy_is_extensible(&obj, context)? } else { obj.is_extensible_flag() };
        if extensible {
            return Ok(JsValue::from(false));
        }
        let mut sealed = true;
        for k in obj.own_property_keys(context)? {
            if obj.get_own_property(k, context)?.map(|d| d.configurable()).unwrap_or(false) {
                sealed = false;
                break;
            }
        }
        Ok(JsValue::from(sealed))
    });
    install_method(context, ctor, "getPrototypeOf", 1, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let proto = if is_proxy(&obj) { proxy_get_prototype_of(&obj, context)? } else { obj.prototype() };
        Ok(proto.map(JsValue::Object).unwrap_or(JsValue::Null))
    });
    install_method(context, ctor, "setPrototypeOf", 2, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Ok(arg(args, 0));
        };
        let proto = match arg(args, 1) {
            JsValue::Object(p) => Some(p),
            JsValue::Null => None,
            _ => return Err(context.construct_type_error("prototype must be an object or null")),
        };
        if is_proxy(&obj) {
            proxy_set_prototype_of(&obj, proto, context)?;
        } else {
            obj.set_prototype(proto);
        }
        Ok(JsValue::Object(obj))
    });
    install_method(context, ctor, "create", 2, |_this, args, context| {
        let proto = match arg(args, 0) {
            JsValue::Object(p) => Some(p),
            JsValue::Null => None,
            _ => return Err(context.construct_type_error("Object.create proto must be an object or null")),
        };
        let obj = JsObject::ordinary(proto);
        if let Some(props) = arg(args, 1).as_object().cloned() {
            define_properties(&obj, &props, context)?;
        }
        Ok(JsValue::Object(obj))
    });
    install_method(context, ctor, "defineProperty", 3, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Err(context.construct_type_error("Object.defineProperty target must be an object"));
        };
        let key = arg(args, 1).to_property_key(context)?;
        let Some(desc_obj) = arg(args, 2).as_object().cloned() else {
            return Err(context.construct_type_error("property descriptor must be an object"));
        };
        let desc = to_property_descriptor(&desc_obj, context)?;
        if !obj.define_own_property(key.clone(), desc, context)? {
            return Err(context.construct_type_error(format!("cannot define property '{key}'")));
        }
        Ok(JsValue::Object(obj))
    });
    install_method(context, ctor, "defineProperties", 2, |_this, args, context| {
        let Some(obj) = arg(args, 0).as_object().cloned() else {
            return Err(context.construct_type_error("Object.defineProperties target must be an object"));
        };
        let Some(props) = arg(args, 1).as_object().cloned() else {
            return Err(context.construct_type_error("properties argument must be an object"));
        };
        define_properties(&obj, &props, context)?;
        Ok(JsValue::Object(obj))
    });
    install_method(context, ctor, "getOwnPropertyDescriptor", 2, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let key = arg(args, 1).to_property_key(context)?;
        match obj.get_own_property(key, context)? {
            Some(desc) => Ok(JsValue::Object(from_property_descriptor(desc, context))),
            None => Ok(JsValue::Undefined),
        }
    });
    install_method(context, ctor, "getOwnPropertyNames", 1, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let names: Vec<JsValue> = obj
            .own_property_keys(context)?
            .into_iter()
            .filter(|k| !matches!(k, PropertyKey::Symbol(_)))
            .map(|k| JsValue::from(k.to_string()))
            .collect();
        Ok(JsValue::Object(JsObject::array_from_values(names, context)))
    });
    install_method(context, ctor, "getOwnPropertySymbols", 1, |_this, args, context| {
        let obj = arg(args, 0).to_object(context)?;
        let symbols: Vec<JsValue> = obj
            .own_property_keys(context)?
            .into_iter()
            .filter_map(|k| match k {
                PropertyKey::Symbol(s) => Some(JsValue::Symbol(s)),
                _ => None,
            })
            .collect();
        Ok(JsValue::Object(JsObject::array_from_values(symbols, context)))
    });
    install_method(context, ctor, "is", 2, |_this, args, _context| {
        Ok(JsValue::from(arg(args, 0).same_value(&arg(args, 1))))
    });
    install_method(context, ctor, "preventExtensions", 1, |_this, args, context| {
        if let Some(obj) = arg(args, 0).as_object().cloned() {
            if is_proxy(&obj) {
                proxy_prevent_extensions(&obj, context)?;
            } else {
                obj.prevent_extensions();
            }
        }
        Ok(arg(args, 0))
    });
    install_method(context, ctor, "isExtensible", 1, |_this, args, context| {
        match arg(args, 0).as_object().cloned() {
            Some(obj) if is_proxy(&obj) => Ok(JsValue::from(proxy_is_extensible(&obj, context)?)),
            Some(obj) => Ok(JsValue::from(obj.is_extensible_flag())),
            None => Ok(JsValue::from(false)),
        }
    });
}

fn define_properties(obj: &JsObject, props: &JsObject, context: &mut Context) -> JsResult<()> {
    for key in props.enumerable_own_string_keys(context)? {
        let desc_val = props.get(key.clone(), context)?;
        let Some(desc_obj) = desc_val.as_object().cloned() else {
            return Err(context.construct_type_error("property descriptor must be an object"));
        };
        let desc = to_property_descriptor(&desc_obj, context)?;
        if !obj.define_own_property(key.clone(), desc, context)? {
            return Err(context.construct_type_error(format!("cannot define property '{key}'")));
        }
    }
    Ok(())
}

/// Parses a `{value, writable, get, set, enumerable, configurable}`-shaped
/// descriptor object into a [`PropertyDescriptor`], per `ToPropertyDescriptor`.
/// Shared by `Object.defineProperty`, `Reflect.defineProperty`, and the
/// `Proxy` `defineProperty` trap's argument marshaling.
pub(crate) fn to_property_descriptor(obj: &JsObject, context: &mut Context) -> JsResult<PropertyDescriptor> {
    let mut builder = PropertyDescriptor::builder();
    if obj.has_property("enumerable", context)? {
        builder = builder.enumerable(obj.get("enumerable", context)?.to_boolean());
    }
    if obj.has_property("configurable", context)? {
        builder = builder.configurable(obj.get("configurable", context)?.to_boolean());
    }
    if obj.has_property("value", context)? {
        builder = builder.value(obj.get("value", context)?);
    }
    if obj.has_property("writable", context)? {
        builder = builder.writable(obj.get("writable", context)?.to_boolean());
    }
    if obj.has_property("get", context)? {
        let g = obj.get("get", context)?;
        match g.as_object().filter(|o| o.is_callable()) {
            Some(g) => builder = builder.get(g.clone()),
            None if g.is_undefined() => {}
            None => return Err(context.construct_type_error("getter must be a function")),
        }
    }
    if obj.has_property("set", context)? {
        let s = obj.get("set", context)?;
        match s.as_object().filter(|o| o.is_callable()) {
            Some(s) => builder = builder.set(s.clone()),
            None if s.is_undefined() => {}
            None => return Err(context.construct_type_error("setter must be a function")),
        }
    }
    Ok(builder.build())
}

/// The inverse of [`to_property_descriptor`]: `FromPropertyDescriptor`.
pub(crate) fn from_property_descriptor(desc: PropertyDescriptor, context: &mut Context) -> JsObject {
    let obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
    match desc {
        PropertyDescriptor::Data(d) => {
            obj.create_data_property("value", d.value, Attribute::default());
            obj.create_data_property("writable", JsValue::from(d.writable), Attribute::default());
            obj.create_data_property("enumerable", JsValue::from(d.enumerable), Attribute::default());
            obj.create_data_property("configurable", JsValue::from(d.configurable), Attribute::default());
        }
        PropertyDescriptor::Accessor(a) => {
            obj.create_data_property("get", JsValue::from(a.get), Attribute::default());
            obj.create_data_property("set", JsValue::from(a.set), Attribute::default());
            obj.create_data_property("enumerable", JsValue::from(a.enumerable), Attribute::default());
            obj.create_data_property("configurable", JsValue::from(a.configurable), Attribute::default());
        }
        PropertyDescriptor::Generic(g) => {
            if let Some(w) = g.writable {
                obj.create_data_property("writable", JsValue::from(w), Attribute::default());
            }
            if let Some(e) = g.enumerable {
                obj.create_data_property("enumerable", JsValue::from(e), Attribute::default());
            }
            if let Some(c) = g.configurable {
                obj.create_data_property("configurable", JsValue::from(c), Attribute::default());
            }
        }
    }
    obj
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn keys_values_entries() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "Object.keys({a: 1, b: 2}).join(',')"), "a,b");
        assert_eq!(forward(&mut ctx, "Object.values({a: 1, b: 2}).join(',')"), "1,2");
    }

    #[test]
    fn freeze_rejects_writes() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(&mut ctx, "const o = Object.freeze({x: 1}); o.x = 2; o.x"),
            "1"
        );
        assert_eq!(forward(&mut ctx, "Object.isFrozen(Object.freeze({}))"), "true");
    }

    #[test]
    fn define_property_round_trips_through_get_own_property_descriptor() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(
                &mut ctx,
                "const o = {}; Object.defineProperty(o, 'x', {value: 5, writable: false}); \
                 const d = Object.getOwnPropertyDescriptor(o, 'x'); `${d.value},${d.writable},${d.enumerable}`"
            ),
            "5,false,false"
        );
    }
}
