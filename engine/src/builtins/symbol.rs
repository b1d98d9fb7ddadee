//! The `Symbol` function (callable, not constructible — `new Symbol()`
//! throws) plus the `Symbol.for`/`Symbol.keyFor` global registry and the
//! well-known symbols exposed as static properties, per §3's symbol type.

use super::{arg, install_method, method_attrs, register_global};
use crate::context::Context;
use crate::object::JsObject;
use crate::symbol::JsSymbol;
use crate::value::JsValue;
use crate::JsResult;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    /// `Symbol.for`'s global symbol registry. Per-thread because `JsSymbol`
    /// (an `Arc`) and the rest of the engine are not `Send`/`Sync` anyway.
    static REGISTRY: RefCell<HashMap<String, JsSymbol>> = RefCell::new(HashMap::new());
}

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().symbol_prototype.clone();

    install_method(context, &proto, "toString", 0, |this, _args, context| {
        let sym = symbol_value(this, context)?;
        Ok(JsValue::from(format!("Symbol({})", sym.description().unwrap_or_default())))
    });
    install_method(context, &proto, "valueOf", 0, |this, _args, context| Ok(JsValue::from(symbol_value(this, context)?)));
    let description_getter = JsObject::native_function(context, "get description", 0, |this, _args, context| {
        Ok(symbol_value(this, context)?.description().map(JsValue::from).unwrap_or(JsValue::Undefined))
    });
    proto
        .define_own_property(
            "description",
            crate::property::PropertyDescriptor::builder().get(description_getter).configurable(true).build(),
            context,
        )
        .expect("defining well-known prototype property should not fail");

    let ctor = JsObject::native_function(context, "Symbol", 0, |_this, args, context| {
        let description = match arg(args, 0) {
            JsValue::Undefined => None,
            other => Some(other.to_js_string(context)?.to_string()),
        };
        Ok(JsValue::from(JsSymbol::new(description)))
    });
    ctor.create_data_property("prototype", JsValue::Object(proto.clone()), crate::property::Attribute::empty());
    proto.create_data_property("constructor", JsValue::Object(ctor.clone()), method_attrs());

    let symbols = context.well_known_symbols().clone();
    ctor.create_data_property("iterator", JsValue::from(symbols.iterator.clone()), crate::property::Attribute::empty());
    ctor.create_data_property("asyncIterator", JsValue::from(symbols.async_iterator.clone()), crate::property::Attribute::empty());
    ctor.create_data_property("hasInstance", JsValue::from(symbols.has_instance.clone()), crate::property::Attribute::empty());
    ctor.create_data_property(
        "isConcatSpreadable",
        JsValue::from(symbols.is_concat_spreadable.clone()),
        crate::property::Attribute::empty(),
    );
    ctor.create_data_property("toPrimitive", JsValue::from(symbols.to_primitive.clone()), crate::property::Attribute::empty());
    ctor.create_data_property("toStringTag", JsValue::from(symbols.to_string_tag.clone()), crate::property::Attribute::empty());
    ctor.create_data_property("unscopables", JsValue::from(symbols.unscopables.clone()), crate::property::Attribute::empty());
    ctor.create_data_property("species", JsValue::from(symbols.species.clone()), crate::property::Attribute::empty());

    install_method(context, &ctor, "for", 1, |_this, args, context| {
        let key = arg(args, 0).to_js_string(context)?.to_string();
        let sym = REGISTRY.with(|r| r.borrow_mut().entry(key).or_insert_with(|| JsSymbol::new(None)).clone());
        Ok(JsValue::from(sym))
    });
    install_method(context, &ctor, "keyFor", 1, |_this, args, context| {
        let JsValue::Symbol(sym) = arg(args, 0) else {
            return Err(context.construct_type_error("Symbol.keyFor argument is not a symbol"));
        };
        Ok(REGISTRY.with(|r| r.borrow().iter().find(|(_, v)| **v == sym).map(|(k, _)| JsValue::from(k.clone())).unwrap_or(JsValue::Undefined)))
    });

    register_global(context, "Symbol", ctor);
}

fn symbol_value(this: &JsValue, context: &mut Context) -> JsResult<JsSymbol> {
    match this {
        JsValue::Symbol(s) => Ok(s.clone()),
        _ => Err(context.construct_type_error("Symbol.prototype method called on incompatible receiver")),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn symbol_for_interns_by_key() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "Symbol.for('x') === Symbol.for('x')"), "true");
    }

    #[test]
    fn distinct_symbols_are_not_equal() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "Symbol('a') === Symbol('a')"), "false");
    }
}
