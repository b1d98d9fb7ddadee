//! `Function.prototype`: `call`, `apply`, `bind`, `toString`, per §4.3.

use super::{arg, install_method};
use crate::context::Context;
use crate::function::{FunctionBody, FunctionData};
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().function_prototype.clone();

    install_method(context, &proto, "call", 1, |this, args, context| {
        let Some(f) = this.as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("value is not callable"));
        };
        let call_this = arg(args, 0);
        let call_args: Vec<JsValue> = args.iter().skip(1).cloned().collect();
        f.call(context, &call_this, &call_args)
    });

    install_method(context, &proto, "apply", 2, |this, args, context| {
        let Some(f) = this.as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("value is not callable"));
        };
        let call_this = arg(args, 0);
        let call_args = match arg(args, 1) {
            JsValue::Undefined | JsValue::Null => Vec::new(),
            array_like => array_like_to_vec(&array_like, context)?,
        };
        f.call(context, &call_this, &call_args)
    });

    install_method(context, &proto, "bind", 1, |this, args, context| {
        let Some(target) = this.as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("value is not callable"));
        };
        let bound_this = arg(args, 0);
        let bound_args: Vec<JsValue> = args.iter().skip(1).cloned().collect();
        let name = format!("bound {}", target.function_name().map(|n| n.to_string()).unwrap_or_default());
        let length = target
            .get("length", context)
            .ok()
            .and_then(|v| v.as_number())
            .map(|n| (n as usize).saturating_sub(bound_args.len()))
            .unwrap_or(0);
        let data = FunctionData {
            name: name.into(),
            length,
            body: FunctionBody::Bound { target, bound_this, bound_args },
            is_constructor: false,
            home_object: None,
        };
        let bound = JsObject::new(ObjectKind::Function(data), Some(context.intrinsics().function_prototype.clone()));
        Ok(JsValue::Object(bound))
    });

    install_method(context, &proto, "toString", 0, |this, _args, context| {
        let name = this.as_object().and_then(|o| o.function_name()).map(|n| n.to_string()).unwrap_or_default();
        if this.as_object().map(|o| o.is_callable()).unwrap_or(false) {
            Ok(JsValue::from(format!("function {name}() {{ [native code] }}")))
        } else {
            Err(context.construct_type_error("Function.prototype.toString requires a callable this"))
        }
    });
}

/// Reads `0..length` off an array-like value, per `CreateListFromArrayLike`,
/// used by `Function.prototype.apply`.
fn array_like_to_vec(value: &JsValue, context: &mut Context) -> crate::JsResult<Vec<JsValue>> {
    let obj = value
        .as_object()
        .cloned()
        .ok_or_else(|| context.construct_type_error("apply argument must be an array-like object"))?;
    let length = obj.get("length", context)?.to_number(context)?.max(0.0) as u32;
    let mut result = Vec::with_capacity(length as usize);
    for i in 0..length {
        result.push(obj.get_element(i, context)?);
    }
    Ok(result)
}
