//! `Error` and its five built-in subtypes (`TypeError`, `RangeError`,
//! `ReferenceError`, `SyntaxError`, `URIError`), per §7: a single
//! `ObjectKind::Error` tag, distinguished only by which prototype in the
//! chain a given instance was constructed against — there is no Rust-level
//! subclassing, matching [`crate::context::Context::construct_error_of`]
//! (the host-side equivalent already used for internally-thrown errors).

use super::{arg, install_method, link_constructor, native_constructor, register_global};
use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::property::Attribute;
use crate::value::JsValue;

pub(crate) fn init(context: &mut Context) {
    let error_proto = context.intrinsics().error_prototype.clone();
    let type_error_proto = context.intrinsics().type_error_prototype.clone();
    let range_error_proto = context.intrinsics().range_error_prototype.clone();
    let reference_error_proto = context.intrinsics().reference_error_prototype.clone();
    let syntax_error_proto = context.intrinsics().syntax_error_prototype.clone();
    let uri_error_proto = context.intrinsics().uri_error_prototype.clone();

    install_kind(context, "Error", error_proto.clone(), None);
    install_kind(context, "TypeError", type_error_proto, Some(error_proto.clone()));
    install_kind(context, "RangeError", range_error_proto, Some(error_proto.clone()));
    install_kind(context, "ReferenceError", reference_error_proto, Some(error_proto.clone()));
    install_kind(context, "SyntaxError", syntax_error_proto, Some(error_proto.clone()));
    install_kind(context, "URIError", uri_error_proto, Some(error_proto));
}

/// Wires one error constructor/prototype pair: sets `proto.name`/`proto.message`
/// defaults, installs `toString`, and registers `<Name>(message)` both as a
/// plain call and as `new <Name>(message)` (both build the same object, per
/// §7 — there's no script-observable difference between calling an error
/// constructor and `new`-ing it).
fn install_kind(context: &mut Context, name: &'static str, proto: JsObject, parent: Option<JsObject>) {
    if let Some(parent) = parent {
        proto.set_prototype(Some(parent));
    }
    proto.create_data_property("name", JsValue::from(name), Attribute::from_bools(true, false, true));
    proto.create_data_property("message", JsValue::from(""), Attribute::from_bools(true, false, true));
    install_method(context, &proto, "toString", 0, |this, _args, context| {
        let obj = this.to_object(context)?;
        let name = obj.get("name", context)?.to_js_string(context)?.to_string();
        let message = obj.get("message", context)?.to_js_string(context)?.to_string();
        Ok(JsValue::from(if message.is_empty() { name } else { format!("{name}: {message}") }))
    });

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, name, 1, move |_this, args, context| {
        let err = JsObject::new(ObjectKind::Error, Some(proto_for_ctor.clone()));
        if let Some(message) = args.first().filter(|v| !v.is_undefined()) {
            let message = message.to_js_string(context)?.to_string();
            err.create_data_property("message", JsValue::from(message), Attribute::from_bools(true, false, true));
        }
        Ok(JsValue::Object(err))
    });
    link_constructor(&ctor, &proto);
    register_global(context, name, ctor);
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn error_tostring_joins_name_and_message() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "new TypeError('bad').toString()"), "TypeError: bad");
    }

    #[test]
    fn error_without_message_is_just_name() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "new RangeError().toString()"), "RangeError");
    }

    #[test]
    fn type_error_inherits_error_prototype() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "new TypeError('x') instanceof Error"), "true");
    }
}
