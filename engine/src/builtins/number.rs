//! The `Number` constructor and `Number.prototype`, per §4.2's boxed
//! primitives and `value::display_number`'s ECMA-262 `Number::toString`.

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().number_prototype.clone();

    install_method(context, &proto, "toString", 1, |this, args, context| {
        let n = number_value(this, context)?;
        match args.first().filter(|v| !v.is_undefined()) {
            Some(radix) => {
                let radix = radix.to_integer_or_infinity(context)? as u32;
                if radix == 10 {
                    Ok(JsValue::from(crate::value::display_number(n)))
                } else if (2..=36).contains(&radix) && n.fract() == 0.0 && n.is_finite() {
                    Ok(JsValue::from(to_radix_string(n, radix)))
                } else {
                    Ok(JsValue::from(crate::value::display_number(n)))
                }
            }
            None => Ok(JsValue::from(crate::value::display_number(n))),
        }
    });
    install_method(context, &proto, "valueOf", 0, |this, _args, context| {
        Ok(JsValue::from(number_value(this, context)?))
    });
    install_method(context, &proto, "toFixed", 1, |this, args, context| {
        let n = number_value(this, context)?;
        let digits = arg(args, 0).to_integer_or_infinity(context)?.clamp(0.0, 100.0) as usize;
        Ok(JsValue::from(format!("{n:.digits$}")))
    });
    install_method(context, &proto, "toPrecision", 1, |this, args, context| {
        let n = number_value(this, context)?;
        match args.first().filter(|v| !v.is_undefined()) {
            Some(p) => {
                let precision = p.to_integer_or_infinity(context)?.max(1.0) as usize;
                Ok(JsValue::from(format!("{n:.precision$e}")))
            }
            None => Ok(JsValue::from(crate::value::display_number(n))),
        }
    });

    let ctor = native_constructor(context, "Number", 1, |_this, args, context| {
        let n = match args.first() {
            Some(v) => v.to_number(context)?,
            None => 0.0,
        };
        Ok(JsValue::from(n))
    });
    link_constructor(&ctor, &proto);
    ctor.create_data_property("MAX_SAFE_INTEGER", JsValue::from(9007199254740991.0), method_attrs());
    ctor.create_data_property("MIN_SAFE_INTEGER", JsValue::from(-9007199254740991.0), method_attrs());
    ctor.create_data_property("MAX_VALUE", JsValue::from(f64::MAX), method_attrs());
    ctor.create_data_property("MIN_VALUE", JsValue::from(f64::MIN_POSITIVE), method_attrs());
    ctor.create_data_property("EPSILON", JsValue::from(f64::EPSILON), method_attrs());
    ctor.create_data_property("POSITIVE_INFINITY", JsValue::from(f64::INFINITY), method_attrs());
    ctor.create_data_property("NEGATIVE_INFINITY", JsValue::from(f64::NEG_INFINITY), method_attrs());
    ctor.create_data_property("NaN", JsValue::from(f64::NAN), method_attrs());
    install_method(context, &ctor, "isInteger", 1, |_this, args, _context| {
        Ok(JsValue::from(matches!(arg(args, 0), JsValue::Number(n) if n.is_finite() && n.fract() == 0.0)))
    });
    install_method(context, &ctor, "isFinite", 1, |_this, args, _context| {
        Ok(JsValue::from(matches!(arg(args, 0), JsValue::Number(n) if n.is_finite())))
    });
    install_method(context, &ctor, "isNaN", 1, |_this, args, _context| {
        Ok(JsValue::from(matches!(arg(args, 0), JsValue::Number(n) if n.is_nan())))
    });
    install_method(context, &ctor, "isSafeInteger", 1, |_this, args, _context| {
        Ok(JsValue::from(
            matches!(arg(args, 0), JsValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() <= 9007199254740991.0),
        ))
    });
    install_method(context, &ctor, "parseFloat", 1, |_this, args, context| {
        let s = arg(args, 0).to_js_string(context)?.to_string();
        Ok(JsValue::from(parse_float(s.trim_start())))
    });
    install_method(context, &ctor, "parseInt", 2, |_this, args, context| {
        let s = arg(args, 0).to_js_string(context)?.to_string();
        let radix = match args.get(1) {
            Some(v) if !v.is_undefined() => v.to_integer_or_infinity(context)? as u32,
            _ => 10,
        };
        Ok(JsValue::from(parse_int(s.trim(), if radix == 0 { 10 } else { radix })))
    });
    register_global(context, "Number", ctor);
}

fn number_value(this: &JsValue, context: &mut Context) -> crate::JsResult<f64> {
    match this {
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::BoxedNumber(n) => Ok(*n),
            _ => Err(context.construct_type_error("Number.prototype method called on incompatible receiver")),
        },
        _ => Err(context.construct_type_error("Number.prototype method called on incompatible receiver")),
    }
}

fn to_radix_string(n: f64, radix: u32) -> String {
    let negative = n < 0.0;
    let mut i = n.abs() as u64;
    if i == 0 {
        return "0".to_string();
    }
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while i > 0 {
        out.push(digits[(i % radix as u64) as usize]);
        i /= radix as u64;
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `parseFloat`: parses the longest valid-float prefix of `s`, ignoring
/// trailing garbage (unlike `ToNumber`, which rejects the whole string).
fn parse_float(s: &str) -> f64 {
    if let Some(rest) = s.strip_prefix("Infinity").or_else(|| s.strip_prefix("+Infinity")) {
        let _ = rest;
        return f64::INFINITY;
    }
    if s.strip_prefix("-Infinity").is_some() {
        return f64::NEG_INFINITY;
    }
    let end = s
        .char_indices()
        .take_while(|&(i, c)| match i {
            0 => c.is_ascii_digit() || c == '+' || c == '-' || c == '.',
            _ => c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-',
        })
        .count();
    for len in (1..=end).rev() {
        if let Ok(v) = fast_float::parse::<f64, _>(&s[..len]) {
            return v;
        }
    }
    f64::NAN
}

fn parse_int(s: &str, radix: u32) -> f64 {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = rest.find(|c: char| !c.is_digit(radix.clamp(2, 36))).unwrap_or(rest.len());
    if end == 0 {
        return f64::NAN;
    }
    match i64::from_str_radix(&rest[..end], radix.clamp(2, 36)) {
        Ok(v) => sign * v as f64,
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn number_tofixed_pads_decimals() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "(1.5).toFixed(2)"), "1.50");
    }

    #[test]
    fn number_is_integer() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "`${Number.isInteger(4)},${Number.isInteger(4.5)}`"), "true,false");
    }

    #[test]
    fn parse_int_stops_at_non_digit() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "Number.parseInt('42px')"), "42");
    }
}
