//! Built-in global objects, constructors, and prototype methods: everything
//! [`init`] installs onto the realm's global object and intrinsic prototypes
//! before any script runs, per §2's component table.
//!
//! Every submodule follows the same shape: a `pub(crate) fn init(context)`
//! that hangs methods off an already-bootstrapped intrinsic prototype (see
//! [`crate::context::intrinsics`]) and registers a constructor function on
//! the global object. Submodules that back an [`crate::object::ObjectKind`]
//! payload (`Map`, `Set`, `Proxy`, `Promise`, `ArrayBuffer`/`TypedArray`/
//! `DataView`) additionally export their data type and, where the object
//! protocol needs to reach into them directly (`Proxy`'s trap dispatch), a
//! handful of free functions.

mod array;
pub(crate) mod array_buffer;
mod boolean;
mod error;
mod function;
mod json;
pub(crate) mod map;
mod number;
mod object;
pub(crate) mod promise;
pub(crate) mod proxy;
mod reflect;
pub(crate) mod set;
mod string;
mod symbol;
pub(crate) mod weak;

pub use array_buffer::{ArrayBufferData, DataViewData, TypedArrayData};
pub use map::MapData;
pub use promise::PromiseData;
pub use proxy::{proxy_get, proxy_set, ProxyData};
pub use set::SetData;
pub use weak::{WeakMapData, WeakSetData};

use crate::context::Context;
use crate::object::{JsObject, ObjectKind};
use crate::property::Attribute;
use crate::value::JsValue;
use crate::JsResult;

/// Installs every built-in named in §2's component table onto `context`'s
/// global object and intrinsic prototypes. Called exactly once, from
/// [`crate::context::Context::new`], after the intrinsics have been
/// bootstrapped but before any script executes.
pub fn init(context: &mut Context) {
    object::init(context);
    function::init(context);
    array::init(context);
    string::init(context);
    number::init(context);
    boolean::init(context);
    symbol::init(context);
    error::init(context);
    map::init(context);
    set::init(context);
    weak::init(context);
    proxy::init(context);
    reflect::init(context);
    promise::init(context);
    array_buffer::init(context);
    json::init(context);
}

/// `args.get(n)`, defaulting to `undefined` — every native's argument list
/// is read this way rather than panicking on a short call (§4.3: missing
/// positional arguments bind to `undefined`).
pub(crate) fn arg(args: &[JsValue], n: usize) -> JsValue {
    args.get(n).cloned().unwrap_or(JsValue::Undefined)
}

/// The attribute set a built-in method or accessor is installed with:
/// writable and configurable, but not enumerable, so `for...in`/`Object.keys`
/// don't see prototype methods (§4.2's own-key enumeration only counts
/// enumerable keys).
pub(crate) fn method_attrs() -> Attribute {
    Attribute::WRITABLE | Attribute::CONFIGURABLE
}

/// Installs a native function as a non-enumerable own method of `target`.
pub(crate) fn install_method(
    context: &Context,
    target: &JsObject,
    name: &str,
    length: usize,
    f: impl Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue> + 'static,
) {
    let func = JsObject::native_function(context, name, length, f);
    target.create_data_property(name, JsValue::Object(func), method_attrs());
}

/// Builds a native function whose `[[Construct]]` is meaningful: `f` is
/// responsible for building and returning the constructed object itself
/// (native constructors ignore the `this` `[[Construct]]` would otherwise
/// allocate — see `function::construct`'s native-constructor short-circuit).
pub(crate) fn native_constructor(
    context: &Context,
    name: &str,
    length: usize,
    f: impl Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue> + 'static,
) -> JsObject {
    let ctor = JsObject::native_function(context, name, length, f);
    if let ObjectKind::Function(data) = &mut ctor.borrow_mut().kind {
        data.is_constructor = true;
    }
    ctor
}

/// Wires `ctor.prototype = proto` and `proto.constructor = ctor`, the
/// mutual link every built-in constructor/prototype pair carries.
pub(crate) fn link_constructor(ctor: &JsObject, proto: &JsObject) {
    ctor.create_data_property("prototype", JsValue::Object(proto.clone()), Attribute::empty());
    proto.create_data_property("constructor", JsValue::Object(ctor.clone()), method_attrs());
}

/// Registers `value` as a named property of the realm's global object, the
/// way every top-level built-in (`Object`, `Array`, `JSON`, ...) is reached
/// from script.
pub(crate) fn register_global(context: &Context, name: &str, value: JsObject) {
    context.global_object().create_data_property(name, JsValue::Object(value), method_attrs());
}
