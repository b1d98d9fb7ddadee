//! The `Boolean` constructor and `Boolean.prototype`, per §4.2's boxed-
//! primitive wrappers (`ObjectKind::BoxedBoolean`, allocated by
//! [`crate::context::Context::box_primitive`]).

use super::{arg, install_method, link_constructor, native_constructor, register_global};
use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().boolean_prototype.clone();

    install_method(context, &proto, "toString", 0, |this, _args, context| {
        Ok(JsValue::from(boolean_value(this, context)?.to_string()))
    });
    install_method(context, &proto, "valueOf", 0, |this, _args, context| {
        Ok(JsValue::from(boolean_value(this, context)?))
    });

    let ctor = native_constructor(context, "Boolean", 1, |_this, args, _context| {
        Ok(JsValue::from(arg(args, 0).to_boolean()))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "Boolean", ctor);
}

/// Unwraps `this` to a primitive `bool`, accepting either the unboxed
/// primitive or a `new Boolean(...)` wrapper object (§4.2's boxed-primitive
/// `[[BooleanData]]` slot).
fn boolean_value(this: &JsValue, context: &mut Context) -> crate::JsResult<bool> {
    match this {
        JsValue::Boolean(b) => Ok(*b),
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::BoxedBoolean(b) => Ok(*b),
            _ => Err(context.construct_type_error("Boolean.prototype method called on incompatible receiver")),
        },
        _ => Err(context.construct_type_error("Boolean.prototype method called on incompatible receiver")),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn boolean_coerces_truthiness() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "`${Boolean(0)},${Boolean('x')}`"), "false,true");
    }

    #[test]
    fn boxed_boolean_valueof() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "new Boolean(true).valueOf()"), "true");
    }
}
