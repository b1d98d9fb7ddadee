//! The `String` constructor, `String.prototype`, and the codepoint-aware
//! `StringIterator` (§8: "StringIterator codepoint-awareness" — a surrogate
//! pair must come back as a single iteration step, not two).

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::iterator::make_iter_result;
use crate::object::{JsObject, ObjectKind};
use crate::value::{JsString, JsValue};
use std::cell::Cell;
use std::rc::Rc;

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().string_prototype.clone();

    install_method(context, &proto, "toString", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string()))
    });
    install_method(context, &proto, "valueOf", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string()))
    });
    install_method(context, &proto, "charAt", 1, |this, args, context| {
        let s = string_value(this, context)?;
        let i = arg(args, 0).to_integer_or_infinity(context)?;
        Ok(JsValue::from(
            (i >= 0.0).then(|| s.chars().nth(i as usize)).flatten().map(|c| c.to_string()).unwrap_or_default(),
        ))
    });
    install_method(context, &proto, "charCodeAt", 1, |this, args, context| {
        let s = string_value(this, context)?;
        let i = arg(args, 0).to_integer_or_infinity(context)?;
        let units: Vec<u16> = s.encode_utf16().collect();
        Ok(if i >= 0.0 && (i as usize) < units.len() {
            JsValue::from(units[i as usize] as f64)
        } else {
            JsValue::from(f64::NAN)
        })
    });
    install_method(context, &proto, "codePointAt", 1, |this, args, context| {
        let s = string_value(this, context)?;
        let i = arg(args, 0).to_integer_or_infinity(context)?;
        Ok(match (i >= 0.0).then(|| s.chars().nth(i as usize)).flatten() {
            Some(c) => JsValue::from(c as u32),
            None => JsValue::Undefined,
        })
    });
    install_method(context, &proto, "indexOf", 1, |this, args, context| {
        let s = string_value(this, context)?;
        let needle = arg(args, 0).to_js_string(context)?.to_string();
        Ok(JsValue::from(char_index_of(&s.to_string(), &needle, 0).map(|i| i as f64).unwrap_or(-1.0)))
    });
    install_method(context, &proto, "lastIndexOf", 1, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let needle = arg(args, 0).to_js_string(context)?.to_string();
        let chars: Vec<char> = s.chars().collect();
        let needle_chars: Vec<char> = needle.chars().collect();
        let last = if needle_chars.is_empty() {
            Some(chars.len())
        } else if needle_chars.len() > chars.len() {
            None
        } else {
            (0..=chars.len() - needle_chars.len()).filter(|&start| chars[start..].starts_with(needle_chars.as_slice())).last()
        };
        Ok(JsValue::from(last.map(|i| i as f64).unwrap_or(-1.0)))
    });
    install_method(context, &proto, "includes", 1, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let needle = arg(args, 0).to_js_string(context)?.to_string();
        Ok(JsValue::from(s.contains(&needle)))
    });
    install_method(context, &proto, "startsWith", 1, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let needle = arg(args, 0).to_js_string(context)?.to_string();
        Ok(JsValue::from(s.starts_with(&needle)))
    });
    install_method(context, &proto, "endsWith", 1, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let needle = arg(args, 0).to_js_string(context)?.to_string();
        Ok(JsValue::from(s.ends_with(&needle)))
    });
    install_method(context, &proto, "slice", 2, |this, args, context| {
        let chars: Vec<char> = string_value(this, context)?.to_string().chars().collect();
        let len = chars.len() as i64;
        let start = normalize_index(arg(args, 0), len, 0, context)?;
        let end = normalize_index(arg(args, 1), len, len, context)?;
        Ok(JsValue::from(chars[start as usize..end.max(start) as usize].iter().collect::<String>()))
    });
    install_method(context, &proto, "substring", 2, |this, args, context| {
        let chars: Vec<char> = string_value(this, context)?.to_string().chars().collect();
        let len = chars.len() as i64;
        let a = arg(args, 0).to_integer_or_infinity(context)?.clamp(0.0, len as f64) as i64;
        let b = match args.get(1) {
            Some(v) if !v.is_undefined() => v.to_integer_or_infinity(context)?.clamp(0.0, len as f64) as i64,
            _ => len,
        };
        let (start, end) = (a.min(b), a.max(b));
        Ok(JsValue::from(chars[start as usize..end as usize].iter().collect::<String>()))
    });
    install_method(context, &proto, "split", 2, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let sep = arg(args, 0);
        let out: Vec<JsValue> = if sep.is_undefined() {
            vec![JsValue::from(s)]
        } else {
            let sep = sep.to_js_string(context)?.to_string();
            if sep.is_empty() {
                s.chars().map(|c| JsValue::from(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(|p| JsValue::from(p.to_string())).collect()
            }
        };
        Ok(JsValue::Object(JsObject::array_from_values(out, context)))
    });
    install_method(context, &proto, "replace", 2, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let pattern = arg(args, 0).to_js_string(context)?.to_string();
        let replacement_arg = arg(args, 1);
        let result = match s.find(&pattern) {
            Some(idx) => {
                let replacement = match replacement_arg.as_object().filter(|o| o.is_callable()) {
                    Some(f) => f
                        .call(context, &JsValue::Undefined, &[JsValue::from(pattern.clone()), JsValue::from(idx as f64), JsValue::from(s.clone())])?
                        .to_js_string(context)?
                        .to_string(),
                    None => replacement_arg.to_js_string(context)?.to_string(),
                };
                let mut out = String::with_capacity(s.len());
                out.push_str(&s[..idx]);
                out.push_str(&replacement);
                out.push_str(&s[idx + pattern.len()..]);
                out
            }
            None => s,
        };
        Ok(JsValue::from(result))
    });
    install_method(context, &proto, "replaceAll", 2, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let pattern = arg(args, 0).to_js_string(context)?.to_string();
        let replacement = arg(args, 1).to_js_string(context)?.to_string();
        if pattern.is_empty() {
            return Ok(JsValue::from(s));
        }
        Ok(JsValue::from(s.replace(&pattern, &replacement)))
    });
    install_method(context, &proto, "toUpperCase", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string().to_uppercase()))
    });
    install_method(context, &proto, "toLowerCase", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string().to_lowercase()))
    });
    install_method(context, &proto, "trim", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string().trim().to_string()))
    });
    install_method(context, &proto, "trimStart", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string().trim_start().to_string()))
    });
    install_method(context, &proto, "trimEnd", 0, |this, _args, context| {
        Ok(JsValue::from(string_value(this, context)?.to_string().trim_end().to_string()))
    });
    install_method(context, &proto, "concat", 1, |this, args, context| {
        let mut s = string_value(this, context)?.to_string();
        for a in args {
            s.push_str(&a.to_js_string(context)?.to_string());
        }
        Ok(JsValue::from(s))
    });
    install_method(context, &proto, "repeat", 1, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        let n = arg(args, 0).to_integer_or_infinity(context)?;
        if n < 0.0 || n.is_infinite() {
            return Err(context.construct_range_error("Invalid count value"));
        }
        Ok(JsValue::from(s.repeat(n as usize)))
    });
    install_method(context, &proto, "padStart", 2, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        Ok(JsValue::from(pad(&s, args, context, true)?))
    });
    install_method(context, &proto, "padEnd", 2, |this, args, context| {
        let s = string_value(this, context)?.to_string();
        Ok(JsValue::from(pad(&s, args, context, false)?))
    });
    install_method(context, &proto, "normalize", 1, |this, _args, context| {
        use unicode_normalization::UnicodeNormalization;
        let s = string_value(this, context)?.to_string();
        Ok(JsValue::from(s.nfc().collect::<String>()))
    });
    install_method(context, &proto, "at", 1, |this, args, context| {
        let chars: Vec<char> = string_value(this, context)?.to_string().chars().collect();
        let i = arg(args, 0).to_integer_or_infinity(context)?;
        let idx = if i < 0.0 { chars.len() as i64 + i as i64 } else { i as i64 };
        Ok(if idx >= 0 && (idx as usize) < chars.len() { JsValue::from(chars[idx as usize].to_string()) } else { JsValue::Undefined })
    });

    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let values_fn = JsObject::native_function(context, "[Symbol.iterator]", 0, |this, _args, context| {
        let s = string_value(this, context)?.to_string();
        Ok(JsValue::Object(string_iterator(s, context)))
    });
    proto.create_data_property(iterator_symbol, JsValue::Object(values_fn.clone()), method_attrs());

    let ctor = native_constructor(context, "String", 1, |_this, args, context| match args.first() {
        Some(v) => Ok(JsValue::from(v.to_js_string(context)?.to_string())),
        None => Ok(JsValue::from("")),
    });
    link_constructor(&ctor, &proto);
    install_method(context, &ctor, "fromCharCode", 1, |_this, args, context| {
        let mut units = Vec::with_capacity(args.len());
        for a in args {
            units.push(a.to_number(context)? as u16);
        }
        Ok(JsValue::from(String::from_utf16_lossy(&units)))
    });
    register_global(context, "String", ctor);

    // Replace the bootstrap placeholder now that a real factory exists.
    context.intrinsics_mut().string_iterator_factory = values_fn;
}

fn string_value(this: &JsValue, context: &mut Context) -> crate::JsResult<JsString> {
    match this {
        JsValue::String(s) => Ok(s.clone()),
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::BoxedString(s) => Ok(s.clone()),
            _ => Err(context.construct_type_error("String.prototype method called on incompatible receiver")),
        },
        _ => Err(context.construct_type_error("String.prototype method called on incompatible receiver")),
    }
}

fn char_index_of(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let chars: Vec<char> = haystack.chars().collect();
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() {
        return Some(from.min(chars.len()));
    }
    (from..=chars.len().saturating_sub(needle_chars.len())).find(|&start| chars[start..].starts_with(needle_chars.as_slice()))
}

fn normalize_index(value: JsValue, len: i64, default: i64, context: &mut Context) -> crate::JsResult<i64> {
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

fn pad(s: &str, args: &[JsValue], context: &mut Context, start: bool) -> crate::JsResult<String> {
    let target_len = arg(args, 0).to_integer_or_infinity(context)?.max(0.0) as usize;
    let filler = match args.get(1) {
        Some(v) if !v.is_undefined() => v.to_js_string(context)?.to_string(),
        _ => " ".to_string(),
    };
    let current_len = s.chars().count();
    if current_len >= target_len || filler.is_empty() {
        return Ok(s.to_string());
    }
    let need = target_len - current_len;
    let filler_chars: Vec<char> = filler.chars().collect();
    let padding: String = (0..need).map(|i| filler_chars[i % filler_chars.len()]).collect();
    Ok(if start { format!("{padding}{s}") } else { format!("{s}{padding}") })
}

/// Builds a `StringIterator`: a native-`next` object that yields one
/// codepoint (not UTF-16 code unit) per step, and whose own `[Symbol.iterator]`
/// returns itself (so `iterator::get_iterator`'s re-entrant lookup on the
/// returned object resolves without another `String.prototype` round trip).
fn string_iterator(s: String, context: &mut Context) -> JsObject {
    let chars: Rc<Vec<char>> = Rc::new(s.chars().collect());
    let index = Rc::new(Cell::new(0usize));
    let iter_obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));

    let next = JsObject::native_function(context, "next", 0, move |_this, _args, context| {
        if index.get() >= chars.len() {
            return Ok(JsValue::Object(make_iter_result(JsValue::Undefined, true, context)));
        }
        let c = chars[index.get()];
        index.set(index.get() + 1);
        Ok(JsValue::Object(make_iter_result(JsValue::from(c.to_string()), false, context)))
    });
    iter_obj.create_data_property("next", JsValue::Object(next), method_attrs());

    let self_ref = iter_obj.clone();
    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let self_fn = JsObject::native_function(context, "[Symbol.iterator]", 0, move |_this, _args, _context| Ok(JsValue::Object(self_ref.clone())));
    iter_obj.create_data_property(iterator_symbol, JsValue::Object(self_fn), method_attrs());

    iter_obj
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn slice_is_codepoint_based() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "'hello'.slice(1, 3)"), "el");
    }

    #[test]
    fn split_on_empty_separator_yields_chars() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "'abc'.split('').length"), "3");
    }

    #[test]
    fn pad_start_fills_to_length() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "'5'.padStart(3, '0')"), "005");
    }

    #[test]
    fn string_iterator_yields_codepoints() {
        let mut ctx = Context::new();
        assert_eq!(
            forward(&mut ctx, "let out = []; for (const c of 'ab') out.push(c); out.join(',')"),
            "a,b"
        );
    }
}
