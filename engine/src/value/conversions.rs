//! Abstract type-conversion operations (`ToNumber`, `ToString`, `ToBoolean`, …).
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-type-conversion

use super::{display_number, JsString, JsValue};
use crate::context::Context;
use crate::object::JsObject;

impl JsValue {
    /// `ToBoolean` — never fails.
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.as_str().is_empty(),
            JsValue::Symbol(_) | JsValue::Object(_) => true,
        }
    }

    /// `ToNumber`. Objects go through `ToPrimitive` with a `"number"` hint
    /// first; `Symbol` always throws.
    pub fn to_number(&self, context: &mut Context) -> Result<f64, JsValue> {
        match self {
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s.as_str())),
            JsValue::Symbol(_) => Err(context.construct_type_error("cannot convert a Symbol to a number")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(context, PreferredType::Number)?;
                if prim.is_object() {
                    return Err(context.construct_type_error("cannot convert object to primitive value"));
                }
                prim.to_number(context)
            }
        }
    }

    /// `ToString`.
    pub fn to_js_string(&self, context: &mut Context) -> Result<JsString, JsValue> {
        match self {
            JsValue::Undefined => Ok(JsString::from("undefined")),
            JsValue::Null => Ok(JsString::from("null")),
            JsValue::Boolean(b) => Ok(JsString::from(if *b { "true" } else { "false" })),
            JsValue::Number(n) => Ok(JsString::from(display_number(*n))),
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Symbol(_) => Err(context.construct_type_error("cannot convert a Symbol to a string")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(context, PreferredType::String)?;
                if prim.is_object() {
                    return Err(context.construct_type_error("cannot convert object to primitive value"));
                }
                prim.to_js_string(context)
            }
        }
    }

    /// `ToObject`. Primitives are boxed via the realm's boxed-primitive
    /// constructors; `undefined`/`null` throw.
    pub fn to_object(&self, context: &mut Context) -> Result<JsObject, JsValue> {
        match self {
            JsValue::Undefined | JsValue::Null => {
                Err(context.construct_type_error("cannot convert undefined or null to object"))
            }
            JsValue::Object(o) => Ok(o.clone()),
            _ => Ok(context.box_primitive(self.clone())),
        }
    }

    /// `ToPropertyKey`.
    pub fn to_property_key(&self, context: &mut Context) -> Result<crate::property::PropertyKey, JsValue> {
        if let JsValue::Symbol(s) = self {
            return Ok(crate::property::PropertyKey::Symbol(s.clone()));
        }
        let s = self.to_js_string(context)?;
        Ok(crate::property::PropertyKey::from(s.as_str()))
    }

    /// `ToInt32`.
    pub fn to_int32(&self, context: &mut Context) -> Result<i32, JsValue> {
        let n = self.to_number(context)?;
        Ok(to_int32_impl(n))
    }

    /// `ToUint32`.
    pub fn to_uint32(&self, context: &mut Context) -> Result<u32, JsValue> {
        let n = self.to_number(context)?;
        Ok(to_int32_impl(n) as u32)
    }

    /// `ToIntegerOrInfinity`.
    pub fn to_integer_or_infinity(&self, context: &mut Context) -> Result<f64, JsValue> {
        let n = self.to_number(context)?;
        if n.is_nan() {
            return Ok(0.0);
        }
        if n.is_infinite() {
            return Ok(n);
        }
        Ok(n.trunc())
    }

    /// `ToPrimitive`, honoring `Symbol.toPrimitive` if present, else falling
    /// back to `valueOf`/`toString` (or the reverse) per `hint`.
    pub fn to_primitive(&self, context: &mut Context, hint: PreferredType) -> Result<JsValue, JsValue> {
        let obj = match self {
            JsValue::Object(o) => o.clone(),
            other => return Ok(other.clone()),
        };

        let exotic = obj.get(context.well_known_symbols().to_primitive.clone().into(), context)?;
        if let Some(f) = exotic.as_object().filter(|o| o.is_callable()) {
            let hint_str = match hint {
                PreferredType::Default => "default",
                PreferredType::Number => "number",
                PreferredType::String => "string",
            };
            let result = f.call(context, &JsValue::Object(obj), &[JsValue::from(hint_str)])?;
            if !result.is_object() {
                return Ok(result);
            }
            return Err(context.construct_type_error("Symbol.toPrimitive did not return a primitive"));
        }

        let method_order: [&str; 2] = match hint {
            PreferredType::String => ["toString", "valueOf"],
            _ => ["valueOf", "toString"],
        };
        for name in method_order {
            let method = obj.get(name.into(), context)?;
            if let Some(f) = method.as_object().filter(|o| o.is_callable()) {
                let result = f.call(context, &JsValue::Object(obj.clone()), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(context.construct_type_error("cannot convert object to primitive value"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

fn to_int32_impl(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let n = n.trunc();
    let m = n.rem_euclid(4294967296.0);
    if m >= 2147483648.0 {
        (m - 4294967296.0) as i32
    } else {
        m as i32
    }
}

pub(crate) fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if trimmed == "Infinity" || trimmed == "+Infinity" {
        return f64::INFINITY;
    }
    if trimmed == "-Infinity" {
        return f64::NEG_INFINITY;
    }
    fast_float::parse(trimmed).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int32_wraps() {
        assert_eq!(to_int32_impl(4294967296.0), 0);
        assert_eq!(to_int32_impl(2147483648.0), -2147483648);
        assert_eq!(to_int32_impl(f64::NAN), 0);
    }

    #[test]
    fn string_number_parsing() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert!(string_to_number("nope").is_nan());
        assert_eq!(string_to_number(""), 0.0);
    }
}
