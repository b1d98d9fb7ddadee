// Passing Rust closures into the engine as native functions, and capturing
// both `Copy` and `Clone` Rust values in them.

use vela_engine::context::Context;
use vela_engine::object::JsObject;
use vela_engine::property::Attribute;
use vela_engine::value::JsValue;

fn main() {
    let mut context = Context::new();

    // A `Copy` value moved into the closure.
    let variable = 128 + 64 + 32 + 16 + 8 + 4 + 2 + 1;

    let closure = JsObject::native_function(&context, "closure", 0, move |_this, _args, _context| {
        println!("Called `closure`, variable = {variable}");
        Ok(JsValue::from(variable))
    });
    context.global_object().create_data_property("closure", JsValue::Object(closure), Attribute::default());

    let result = vela_engine::forward_val(&mut context, "closure()").expect("closure() should not throw");
    assert_eq!(result.as_number(), Some(255.0));

    // A `Clone` value (here, a plain object with a `name` property) moved
    // into a second closure.
    let greeting = "Hello from Javascript!".to_string();
    let create_message = JsObject::native_function(&context, "createMessage", 0, move |_this, _args, context| {
        let message = format!("message from `vela`: {greeting}");
        println!("{message}");
        Ok(JsValue::from(message))
    });
    context
        .global_object()
        .create_data_property("createMessage", JsValue::Object(create_message), Attribute::default());

    let result = vela_engine::forward_val(&mut context, "createMessage()").expect("createMessage() should not throw");
    assert_eq!(result.to_js_string(&mut context).unwrap().as_str(), "message from `vela`: Hello from Javascript!");
}
