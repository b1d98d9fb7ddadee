//! `JSON.parse`/`JSON.stringify`, per §8's round-trip testable property:
//! for any JSON-representable `v`, `JSON.parse(JSON.stringify(v))` must be
//! observationally equivalent to `v`.
//!
//! `json_parser.cpp`-equivalent territory is out of scope beyond that
//! property (§1 excludes "JSON" as a host built-in), so this carries just
//! the two top-level functions and no reviver/replacer support. `serde_json
//! ::Value` is the intermediate representation both directions convert
//! through; `preserve_order` keeps object keys in insertion order, which
//! §4.2's own-key enumeration order requires.

use super::{arg, install_method, register_global};
use crate::context::Context;
use crate::object::JsObject;
use crate::property::{Attribute, PropertyKey};
use crate::value::JsValue;
use crate::JsResult;

pub(crate) fn init(context: &mut Context) {
    let json = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));

    install_method(context, &json, "stringify", 3, |_this, args, context| {
        let value = arg(args, 0);
        let space = arg(args, 2);
        match to_json_value(&value, context)? {
            Some(v) => {
                let text = if is_truthy_space(&space) {
                    serde_json::to_string_pretty(&v).expect("serde_json::Value serialization cannot fail")
                } else {
                    serde_json::to_string(&v).expect("serde_json::Value serialization cannot fail")
                };
                Ok(JsValue::from(text))
            }
            None => Ok(JsValue::Undefined),
        }
    });

    install_method(context, &json, "parse", 2, |_this, args, context| {
        let text = arg(args, 0).to_js_string(context)?;
        let parsed: serde_json::Value = serde_json::from_str(text.as_str())
            .map_err(|e| context.construct_syntax_error(format!("JSON.parse: {e}")))?;
        Ok(from_json_value(parsed, context))
    });

    register_global(context, "JSON", json);
}

fn is_truthy_space(space: &JsValue) -> bool {
    match space {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Number(n) => *n > 0.0,
        JsValue::String(s) => !s.as_str().is_empty(),
        _ => true,
    }
}

/// `JSON.stringify`'s per-value serialization: `undefined`, functions and
/// symbols have no JSON representation and are omitted (`None`) rather than
/// erroring, matching how they're skipped in objects and replaced with
/// `null` in arrays (§8 scenario 6: a hole serializes as `null`, same as
/// `undefined`).
fn to_json_value(value: &JsValue, context: &mut Context) -> JsResult<Option<serde_json::Value>> {
    let value = resolve_to_json(value, context)?;
    match &value {
        JsValue::Undefined => Ok(None),
        JsValue::Null => Ok(Some(serde_json::Value::Null)),
        JsValue::Boolean(b) => Ok(Some(serde_json::Value::Bool(*b))),
        JsValue::Number(n) => Ok(Some(match serde_json::Number::from_f64(*n) {
            Some(num) => serde_json::Value::Number(num),
            None => serde_json::Value::Null,
        })),
        JsValue::String(s) => Ok(Some(serde_json::Value::String(s.to_string()))),
        JsValue::Symbol(_) => Ok(None),
        JsValue::Object(o) => {
            if o.is_callable() {
                return Ok(None);
            }
            if o.is_array() {
                let len = o.array_length();
                let holes = crate::object::array_prototype_holes(o);
                let mut out = Vec::with_capacity(len as usize);
                for i in 0..len {
                    if holes.contains(&i) {
                        out.push(serde_json::Value::Null);
                        continue;
                    }
                    let element = o.get_element(i, context)?;
                    out.push(to_json_value(&element, context)?.unwrap_or(serde_json::Value::Null));
                }
                return Ok(Some(serde_json::Value::Array(out)));
            }
            let mut map = serde_json::Map::new();
            for key in o.enumerable_own_string_keys(context)? {
                let name = match &key {
                    PropertyKey::String(s) => s.to_string(),
                    PropertyKey::Index(i) => i.to_string(),
                    PropertyKey::Symbol(_) => continue,
                };
                let prop_value = o.get(key.clone(), context)?;
                if let Some(v) = to_json_value(&prop_value, context)? {
                    map.insert(name, v);
                }
            }
            Ok(Some(serde_json::Value::Object(map)))
        }
    }
}

/// If `value` is an object with a callable `toJSON`, calls it and uses its
/// result in place of `value`, the one hook `JSON.stringify` keeps from the
/// full replacer/reviver machinery this implementation otherwise omits.
fn resolve_to_json(value: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let JsValue::Object(o) = value else { return Ok(value.clone()) };
    let to_json = o.get("toJSON", context)?;
    match to_json.as_object().filter(|f| f.is_callable()) {
        Some(f) => f.call(context, value, &[]),
        None => Ok(value.clone()),
    }
}

fn from_json_value(value: serde_json::Value, context: &mut Context) -> JsValue {
    match value {
        serde_json::Value::Null => JsValue::Null,
        serde_json::Value::Bool(b) => JsValue::from(b),
        serde_json::Value::Number(n) => JsValue::from(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsValue::from(s),
        serde_json::Value::Array(items) => {
            let values: Vec<JsValue> = items.into_iter().map(|v| from_json_value(v, context)).collect();
            JsValue::Object(JsObject::array_from_values(values, context))
        }
        serde_json::Value::Object(map) => {
            let obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
            for (key, v) in map {
                let js_value = from_json_value(v, context);
                obj.create_data_property(key, js_value, Attribute::default());
            }
            JsValue::Object(obj)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{forward, forward_val, Context};

    #[test]
    fn stringify_primitives_and_objects() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "JSON.stringify(null)"), "null");
        assert_eq!(forward(&mut ctx, "JSON.stringify(undefined)"), "undefined");
        assert_eq!(forward(&mut ctx, "JSON.stringify(42)"), "42");
        assert_eq!(forward(&mut ctx, "JSON.stringify('hi')"), "\"hi\"");
        assert_eq!(forward(&mut ctx, "JSON.stringify({b: 2, a: 1})"), "{\"b\":2,\"a\":1}");
    }

    #[test]
    fn stringify_array_holes_become_null() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "let a = []; a[2] = 'x'; JSON.stringify(a)").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "[null,null,\"x\"]");
    }

    #[test]
    fn stringify_skips_functions_and_symbols_in_objects() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "JSON.stringify({a: 1, b: function(){}, c: Symbol('s'), d: undefined})").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "{\"a\":1}");
    }

    #[test]
    fn parse_round_trips_objects_and_arrays() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "let o = JSON.parse('{\"x\":1,\"y\":[1,2,3],\"z\":null}'); o.x + o.y.length + (o.z === null)").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "4true");
    }

    #[test]
    fn parse_throws_syntax_error_on_invalid_input() {
        let mut ctx = Context::new();
        let err = forward_val(&mut ctx, "JSON.parse('{not valid}')").unwrap_err();
        let message = err.as_object().unwrap().get("name", &mut ctx).unwrap();
        assert_eq!(message.to_js_string(&mut ctx).unwrap().as_str(), "SyntaxError");
    }

    #[test]
    fn stringify_uses_to_json_hook() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "JSON.stringify({toJSON(){ return 'custom'; }})").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "\"custom\"");
    }

    #[test]
    fn round_trip_property_holds_for_nested_value() {
        let mut ctx = Context::new();
        let v = forward_val(
            &mut ctx,
            "let v = {a: 1, b: [1, 'two', null, true], c: {d: 4}}; JSON.stringify(JSON.parse(JSON.stringify(v))) === JSON.stringify(v)",
        )
        .unwrap();
        assert!(v.to_boolean());
    }
}
