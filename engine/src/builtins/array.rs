//! The `Array` constructor and `Array.prototype`, per §4.2's array-exotic
//! behavior (length, holes) layered under the generic property protocol.
//!
//! Hole-skipping (`forEach`/`map`/`for...of` must not visit a deleted
//! index) is implemented in terms of [`crate::object::JsObject::array_dense_entries`],
//! the same helper the core object layer already uses for `§8 scenario 6`.

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::object::JsObject;
use crate::value::JsValue;
use crate::JsResult;

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().array_prototype.clone();

    install_method(context, &proto, "push", 1, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.push called on non-object"));
        };
        let mut len = 0;
        for v in args {
            len = arr.array_push(v.clone());
        }
        if args.is_empty() {
            len = arr.array_length();
        }
        Ok(JsValue::from(len))
    });
    install_method(context, &proto, "pop", 0, |this, _args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.pop called on non-object"));
        };
        Ok(arr.array_pop().unwrap_or(JsValue::Undefined))
    });
    install_method(context, &proto, "shift", 0, |this, _args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.shift called on non-object"));
        };
        let mut entries = arr.array_dense_entries();
        if entries.is_empty() {
            return Ok(JsValue::Undefined);
        }
        let first = entries.remove(0).1;
        let rest: Vec<JsValue> = entries.into_iter().map(|(_, v)| v).collect();
        replace_elements(&arr, rest);
        Ok(first)
    });
    install_method(context, &proto, "unshift", 1, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.unshift called on non-object"));
        };
        let mut values: Vec<JsValue> = args.to_vec();
        values.extend(arr.array_dense_entries().into_iter().map(|(_, v)| v));
        let len = values.len() as u32;
        replace_elements(&arr, values);
        Ok(JsValue::from(len))
    });
    install_method(context, &proto, "slice", 2, |this, args, context| {
        let arr = this.to_object(context)?;
        let len = arr.array_length() as i64;
        let start = normalize_index(arg(args, 0), len, 0, context)?;
        let end = normalize_index(arg(args, 1), len, len, context)?;
        let mut out = Vec::new();
        for i in start..end.max(start) {
            out.push(arr.get_element(i as u32, context)?);
        }
        Ok(JsValue::Object(JsObject::array_from_values(out, context)))
    });
    install_method(context, &proto, "splice", 2, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.splice called on non-object"));
        };
        let len = arr.array_length() as i64;
        let start = normalize_index(arg(args, 0), len, 0, context)?;
        let delete_count = match args.get(1) {
            Some(v) => (v.to_integer_or_infinity(context)?.max(0.0) as i64).min(len - start),
            None => len - start,
        };
        let mut current: Vec<JsValue> = arr.array_dense_entries().into_iter().map(|(_, v)| v).collect();
        let inserted: Vec<JsValue> = args.iter().skip(2).cloned().collect();
        let removed: Vec<JsValue> =
            current.splice(start as usize..(start + delete_count) as usize, inserted).collect();
        replace_elements(&arr, current);
        Ok(JsValue::Object(JsObject::array_from_values(removed, context)))
    });
    install_method(context, &proto, "concat", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let mut out: Vec<JsValue> = arr.array_dense_entries().into_iter().map(|(_, v)| v).collect();
        for a in args {
            match a.as_object().filter(|o| o.is_array()) {
                Some(o) => out.extend(o.array_dense_entries().into_iter().map(|(_, v)| v)),
                None => out.push(a.clone()),
            }
        }
        Ok(JsValue::Object(JsObject::array_from_values(out, context)))
    });
    install_method(context, &proto, "join", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let sep = match arg(args, 0) {
            JsValue::Undefined => ",".to_string(),
            other => other.to_js_string(context)?.to_string(),
        };
        let len = arr.array_length();
        let mut parts = Vec::with_capacity(len as usize);
        for i in 0..len {
            if arr.array_is_hole(i) {
                parts.push(String::new());
                continue;
            }
            let v = arr.get_element(i, context)?;
            parts.push(if v.is_null_or_undefined() { String::new() } else { v.to_js_string(context)?.to_string() });
        }
        Ok(JsValue::from(parts.join(&sep)))
    });
    install_method(context, &proto, "indexOf", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let target = arg(args, 0);
        for (i, v) in arr.array_dense_entries() {
            if v.strict_equals(&target) {
                return Ok(JsValue::from(i));
            }
        }
        Ok(JsValue::from(-1.0))
    });
    install_method(context, &proto, "lastIndexOf", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let target = arg(args, 0);
        for (i, v) in arr.array_dense_entries().into_iter().rev() {
            if v.strict_equals(&target) {
                return Ok(JsValue::from(i));
            }
        }
        Ok(JsValue::from(-1.0))
    });
    install_method(context, &proto, "includes", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let target = arg(args, 0);
        Ok(JsValue::from(arr.array_dense_entries().iter().any(|(_, v)| v.same_value_zero(&target))))
    });
    install_method(context, &proto, "find", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.find callback is not callable"));
        };
        let this_arg = arg(args, 1);
        for i in 0..arr.array_length() {
            let v = arr.get_element(i, context)?;
            if cb.call(context, &this_arg, &[v.clone(), JsValue::from(i), JsValue::Object(arr.clone())])?.to_boolean() {
                return Ok(v);
            }
        }
        Ok(JsValue::Undefined)
    });
    install_method(context, &proto, "findIndex", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.findIndex callback is not callable"));
        };
        let this_arg = arg(args, 1);
        for i in 0..arr.array_length() {
            let v = arr.get_element(i, context)?;
            if cb.call(context, &this_arg, &[v, JsValue::from(i), JsValue::Object(arr.clone())])?.to_boolean() {
                return Ok(JsValue::from(i));
            }
        }
        Ok(JsValue::from(-1.0))
    });
    install_method(context, &proto, "filter", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.filter callback is not callable"));
        };
        let this_arg = arg(args, 1);
        let mut out = Vec::new();
        for (i, v) in arr.array_dense_entries() {
            if cb.call(context, &this_arg, &[v.clone(), JsValue::from(i), JsValue::Object(arr.clone())])?.to_boolean() {
                out.push(v);
            }
        }
        Ok(JsValue::Object(JsObject::array_from_values(out, context)))
    });
    install_method(context, &proto, "map", 1, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.map called on non-object"));
        };
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.map callback is not callable"));
        };
        let this_arg = arg(args, 1);
        Ok(JsValue::Object(crate::object::array_map(&arr, &cb, &this_arg, context)?))
    });
    install_method(context, &proto, "forEach", 1, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.forEach called on non-object"));
        };
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.forEach callback is not callable"));
        };
        let this_arg = arg(args, 1);
        crate::object::array_for_each(&arr, &cb, &this_arg, context)?;
        Ok(JsValue::Undefined)
    });
    install_method(context, &proto, "reduce", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.reduce callback is not callable"));
        };
        let entries = arr.array_dense_entries();
        let mut iter = entries.into_iter();
        let mut acc = match args.get(1) {
            Some(v) => v.clone(),
            None => match iter.next() {
                Some((_, v)) => v,
                None => return Err(context.construct_type_error("Reduce of empty array with no initial value")),
            },
        };
        for (i, v) in iter {
            acc = cb.call(context, &JsValue::Undefined, &[acc, v, JsValue::from(i), JsValue::Object(arr.clone())])?;
        }
        Ok(acc)
    });
    install_method(context, &proto, "reduceRight", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.reduceRight callback is not callable"));
        };
        let entries: Vec<_> = arr.array_dense_entries().into_iter().rev().collect();
        let mut iter = entries.into_iter();
        let mut acc = match args.get(1) {
            Some(v) => v.clone(),
            None => match iter.next() {
                Some((_, v)) => v,
                None => return Err(context.construct_type_error("Reduce of empty array with no initial value")),
            },
        };
        for (i, v) in iter {
            acc = cb.call(context, &JsValue::Undefined, &[acc, v, JsValue::from(i), JsValue::Object(arr.clone())])?;
        }
        Ok(acc)
    });
    install_method(context, &proto, "some", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.some callback is not callable"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.array_dense_entries() {
            if cb.call(context, &this_arg, &[v, JsValue::from(i), JsValue::Object(arr.clone())])?.to_boolean() {
                return Ok(JsValue::from(true));
            }
        }
        Ok(JsValue::from(false))
    });
    install_method(context, &proto, "every", 1, |this, args, context| {
        let arr = this.to_object(context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Array.prototype.every callback is not callable"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.array_dense_entries() {
            if !cb.call(context, &this_arg, &[v, JsValue::from(i), JsValue::Object(arr.clone())])?.to_boolean() {
                return Ok(JsValue::from(false));
            }
        }
        Ok(JsValue::from(true))
    });
    install_method(context, &proto, "reverse", 0, |this, _args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.reverse called on non-object"));
        };
        let len = arr.array_length();
        let mut values: Vec<JsValue> = (0..len).map(|i| if arr.array_is_hole(i) { JsValue::Undefined } else { arr.get_element(i, context).unwrap_or(JsValue::Undefined) }).collect();
        values.reverse();
        replace_elements(&arr, values);
        Ok(this.clone())
    });
    install_method(context, &proto, "sort", 1, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.sort called on non-object"));
        };
        let comparator = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned();
        let mut values: Vec<JsValue> = arr.array_dense_entries().into_iter().map(|(_, v)| v).collect();
        let mut sort_err = None;
        values.sort_by(|a, b| {
            if sort_err.is_some() {
                return std::cmp::Ordering::Equal;
            }
            match &comparator {
                Some(f) => match f.call(context, &JsValue::Undefined, &[a.clone(), b.clone()]).and_then(|v| v.to_number(context)) {
                    Ok(n) if n < 0.0 => std::cmp::Ordering::Less,
                    Ok(n) if n > 0.0 => std::cmp::Ordering::Greater,
                    Ok(_) => std::cmp::Ordering::Equal,
                    Err(e) => {
                        sort_err = Some(e);
                        std::cmp::Ordering::Equal
                    }
                },
                None => {
                    let sa = a.to_js_string(context).map(|s| s.to_string()).unwrap_or_default();
                    let sb = b.to_js_string(context).map(|s| s.to_string()).unwrap_or_default();
                    sa.cmp(&sb)
                }
            }
        });
        if let Some(e) = sort_err {
            return Err(e);
        }
        replace_elements(&arr, values);
        Ok(this.clone())
    });
    install_method(context, &proto, "fill", 1, |this, args, context| {
        let Some(arr) = this.as_object().cloned() else {
            return Err(context.construct_type_error("Array.prototype.fill called on non-object"));
        };
        let len = arr.array_length() as i64;
        let value = arg(args, 0);
        let start = normalize_index(arg(args, 1), len, 0, context)?;
        let end = normalize_index(arg(args, 2), len, len, context)?;
        for i in start..end.max(start) {
            arr.set_element(i as u32, value.clone(), context)?;
        }
        Ok(this.clone())
    });
    install_method(context, &proto, "flat", 0, |this, args, context| {
        let arr = this.to_object(context)?;
        let depth = match args.first() {
            Some(v) => v.to_integer_or_infinity(context)?,
            None => 1.0,
        };
        Ok(JsValue::Object(JsObject::array_from_values(flatten(&arr, depth, context)?, context)))
    });
    install_method(context, &proto, "keys", 0, |this, _args, context| {
        let arr = this.to_object(context)?;
        Ok(JsValue::Object(crate::iterator::array_iterator(arr, crate::iterator::ArrayIterKind::Keys, context)))
    });
    install_method(context, &proto, "values", 0, |this, _args, context| {
        let arr = this.to_object(context)?;
        Ok(JsValue::Object(crate::iterator::array_iterator(arr, crate::iterator::ArrayIterKind::Values, context)))
    });
    install_method(context, &proto, "entries", 0, |this, _args, context| {
        let arr = this.to_object(context)?;
        Ok(JsValue::Object(crate::iterator::array_iterator(arr, crate::iterator::ArrayIterKind::Entries, context)))
    });
    install_method(context, &proto, "toString", 0, |this, _args, context| {
        let join = this.to_object(context)?.get("join", context)?;
        match join.as_object().filter(|o| o.is_callable()) {
            Some(f) => f.call(context, this, &[]),
            None => Ok(JsValue::from("")),
        }
    });
    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let values_fn = JsObject::native_function(context, "[Symbol.iterator]", 0, |this, _args, context| {
        let arr = this.to_object(context)?;
        Ok(JsValue::Object(crate::iterator::array_iterator(arr, crate::iterator::ArrayIterKind::Values, context)))
    });
    proto.create_data_property(iterator_symbol, JsValue::Object(values_fn), method_attrs());

    let ctor = native_constructor(context, "Array", 1, |_this, args, context| {
        if args.len() == 1 {
            if let JsValue::Number(n) = args[0] {
                if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                    return Err(context.construct_range_error("invalid array length"));
                }
                let arr = JsObject::array_from_values(Vec::new(), context);
                arr.set("length", JsValue::from(n), true, context)?;
                return Ok(JsValue::Object(arr));
            }
        }
        Ok(JsValue::Object(JsObject::array_from_values(args.to_vec(), context)))
    });
    link_constructor(&ctor, &proto);
    install_method(context, &ctor, "isArray", 1, |_this, args, _context| {
        Ok(JsValue::from(arg(args, 0).as_object().map(JsObject::is_array).unwrap_or(false)))
    });
    install_method(context, &ctor, "of", 0, |_this, args, context| {
        Ok(JsValue::Object(JsObject::array_from_values(args.to_vec(), context)))
    });
    install_method(context, &ctor, "from", 1, |_this, args, context| {
        let source = arg(args, 0);
        let map_fn = arg(args, 1).as_object().filter(|o| o.is_callable()).cloned();
        let mut out = Vec::new();
        let has_length = match source.as_object() {
            Some(o) => o.has_property("length", context)?,
            None => false,
        };
        if crate::iterator::is_array_like(&source) || has_length {
            if let Ok(mut record) = crate::iterator::get_iterator(&source, context) {
                let mut i = 0u32;
                while let Some(v) = crate::iterator::iterator_step(&mut record, context)? {
                    let mapped = match &map_fn {
                        Some(f) => f.call(context, &JsValue::Undefined, &[v, JsValue::from(i)])?,
                        None => v,
                    };
                    out.push(mapped);
                    i += 1;
                }
                return Ok(JsValue::Object(JsObject::array_from_values(out, context)));
            }
            let obj = source.to_object(context)?;
            let len = obj.get("length", context)?.to_number(context)?.max(0.0) as u32;
            for i in 0..len {
                let v = obj.get_element(i, context)?;
                let mapped = match &map_fn {
                    Some(f) => f.call(context, &JsValue::Undefined, &[v, JsValue::from(i)])?,
                    None => v,
                };
                out.push(mapped);
            }
        }
        Ok(JsValue::Object(JsObject::array_from_values(out, context)))
    });
    register_global(context, "Array", ctor);
}

/// Replaces an array's dense element vector wholesale (used by `shift`,
/// `unshift`, `splice`, `sort`, `reverse` — operations that rebuild the
/// whole element list rather than mutate one index at a time).
fn replace_elements(arr: &JsObject, values: Vec<JsValue>) {
    let mut data = arr.borrow_mut();
    *data.elements_mut() = values;
    data.deleted_elements_mut().clear();
}

/// `ToIntegerOrInfinity` + negative-index wraparound + clamp to `[0, len]`,
/// per `slice`/`splice`/`fill`'s shared index-normalization algorithm.
fn normalize_index(value: JsValue, len: i64, default: i64, context: &mut Context) -> JsResult<i64> {
    if value.is_undefined() {
        return Ok(default.clamp(0, len));
    }
    let n = value.to_integer_or_infinity(context)?;
    let n = if n.is_infinite() {
        if n > 0.0 { len } else { 0 }
    } else if n < 0.0 {
        (len + n as i64).max(0)
    } else {
        n as i64
    };
    Ok(n.clamp(0, len))
}

fn flatten(arr: &JsObject, depth: f64, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let mut out = Vec::new();
    for (_, v) in arr.array_dense_entries() {
        match v.as_object().filter(|o| o.is_array()).cloned() {
            Some(inner) if depth > 0.0 => out.extend(flatten(&inner, depth - 1.0, context)?),
            _ => out.push(v),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn push_grows_length_by_one() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let a = [1,2]; a.push(3); `${a.length},${a[2]}`"), "3,3");
    }

    #[test]
    fn map_preserves_holes() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(&mut ctx, "let a = []; a[5] = 1; let m = a.map(x => x); `${m.length}`"),
            "6"
        );
    }

    #[test]
    fn for_each_skips_holes() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(&mut ctx, "let a = []; a[3] = 1; let count = 0; a.forEach(() => count++); count"),
            "1"
        );
    }

    #[test]
    fn sort_defaults_to_string_order() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "[10, 2, 1].sort().join(',')"), "1,10,2");
    }

    #[test]
    fn reduce_without_initial_uses_first_element() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "[1,2,3].reduce((a,b) => a + b)"), "6");
    }

    #[test]
    fn array_from_iterable() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "Array.from('abc').join('-')"), "a-b-c");
    }
}
