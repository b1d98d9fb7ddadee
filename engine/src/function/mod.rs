//! Function objects: `[[Call]]`, `[[Construct]]`, native functions, bound
//! functions, and ordinary (script) functions closing over an
//! [`Environment`], per §4.3.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-ecmascript-function-objects

use crate::context::Context;
use crate::environment::Environment;
use crate::gc::{custom_trace, empty_trace, Finalize, Trace};
use crate::object::{JsObject, ObjectKind};
use crate::syntax::ast::{FunctionDef, Param, Stmt};
use crate::value::{JsString, JsValue};
use crate::JsResult;
use std::fmt;
use std::rc::Rc;

/// A native (Rust-implemented) function body. Deliberately holds no
/// `JsObject`/`Environment` captures of its own — the engine state a native
/// needs always arrives through its `this`/`args`/`context` parameters, so
/// it carries nothing for the collector to trace.
#[derive(Clone)]
pub struct NativeFunction(pub Rc<dyn Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>>);

impl NativeFunction {
    pub fn new(f: impl Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue> + 'static) -> Self {
        NativeFunction(Rc::new(f))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFunction(..)")
    }
}

unsafe impl Trace for NativeFunction {
    empty_trace!();
}
impl Finalize for NativeFunction {}

/// How `this` is bound on invocation, per §4.3's call algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisMode {
    /// Ordinary function: `this` is the call's receiver (or the global
    /// object/`undefined` in non-strict/strict sloppy calls).
    Global,
    /// Arrow function: `this` is lexically captured from `env` and never
    /// rebound by the call.
    Lexical,
}

#[derive(Debug, Clone)]
pub struct OrdinaryFunction {
    pub params: Vec<Param>,
    pub body: Rc<Vec<Stmt>>,
    pub env: Environment,
    pub this_mode: ThisMode,
    pub is_generator: bool,
}

unsafe impl Trace for OrdinaryFunction {
    custom_trace!(this, {
        mark(&this.env);
    });
}
impl Finalize for OrdinaryFunction {}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Native(NativeFunction),
    Ordinary(OrdinaryFunction),
    Bound { target: JsObject, bound_this: JsValue, bound_args: Vec<JsValue> },
}

unsafe impl Trace for FunctionBody {
    custom_trace!(this, {
        match this {
            FunctionBody::Native(n) => mark(n),
            FunctionBody::Ordinary(o) => mark(o),
            FunctionBody::Bound { target, bound_this, bound_args } => {
                mark(target);
                mark(bound_this);
                for a in bound_args {
                    mark(a);
                }
            }
        }
    });
}
impl Finalize for FunctionBody {}

/// The `[[Call]]`/`[[Construct]]`-carrying payload of a `Function`-kinded
/// object, per §4.3.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct FunctionData {
    #[unsafe_ignore_trace]
    pub name: JsString,
    pub length: usize,
    pub body: FunctionBody,
    pub is_constructor: bool,
    pub home_object: Option<JsObject>,
}

impl FunctionData {
    pub fn native(name: impl Into<JsString>, length: usize, f: NativeFunction) -> Self {
        FunctionData {
            name: name.into(),
            length,
            body: FunctionBody::Native(f),
            is_constructor: false,
            home_object: None,
        }
    }
}

impl JsObject {
    /// Constructs a native function object bound to `context`'s function
    /// prototype. The common entry point every builtin registration uses.
    pub fn native_function(
        context: &Context,
        name: &str,
        length: usize,
        f: impl Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue> + 'static,
    ) -> JsObject {
        let data = FunctionData::native(name, length, NativeFunction::new(f));
        JsObject::new(ObjectKind::Function(data), Some(context.intrinsics().function_prototype.clone()))
    }

    /// `[[Call]]`: invokes this object as a function. Throws `TypeError` if
    /// this object is not callable, per §4.3.
    pub fn call(&self, context: &mut Context, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        call(self, context, this, args)
    }

    /// `[[Construct]]`: invokes this object with `new`, per §4.3's
    /// algorithm — a fresh ordinary object is created with this function's
    /// `.prototype` as its `[[Prototype]]`, passed as `this`, and the
    /// function's return value is used only if it is an object.
    pub fn construct(&self, context: &mut Context, args: &[JsValue]) -> JsResult<JsValue> {
        construct(self, context, args)
    }

    pub fn function_name(&self) -> Option<JsString> {
        match &self.borrow().kind {
            ObjectKind::Function(f) => Some(f.name.clone()),
            _ => None,
        }
    }
}

/// Shared `[[Call]]` entry point used both by `JsObject::call` and by
/// internal algorithms (`get_with_receiver`'s accessor dispatch, etc.) that
/// only have a borrowed `&JsObject`.
pub fn call(func: &JsObject, context: &mut Context, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    context.enter_call()?;
    let result = call_inner(func, context, this, args);
    context.exit_call();
    result
}

fn call_inner(func: &JsObject, context: &mut Context, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let body = match &func.borrow().kind {
        ObjectKind::Function(f) => f.body.clone(),
        _ => return Err(context.construct_type_error("value is not a function")),
    };
    match body {
        FunctionBody::Native(native) => (native.0)(this, args, context),
        FunctionBody::Bound { target, bound_this, bound_args } => {
            let mut full_args = bound_args;
            full_args.extend_from_slice(args);
            call(&target, context, &bound_this, &full_args)
        }
        FunctionBody::Ordinary(ordinary) => {
            let call_env = crate::environment::Environment::new_function_scope(&ordinary.env);
            let effective_this = match ordinary.this_mode {
                ThisMode::Lexical => None,
                ThisMode::Global => Some(ordinary_call_bind_this(this, context)?),
            };
            bind_parameters(&call_env, &ordinary.params, args, context)?;
            if ordinary.this_mode == ThisMode::Global {
                call_env.set_this(effective_this.unwrap());
            }
            let arguments_object = build_arguments_object(context, args);
            call_env.create_binding("arguments", JsValue::Object(arguments_object), true, true);
            crate::exec::hoist_declarations(&ordinary.body, &call_env, context);
            match crate::exec::execute_block(&ordinary.body, &call_env, context)? {
                crate::exec::Completion::Return(v) => Ok(v),
                _ => Ok(JsValue::Undefined),
            }
        }
    }
}

/// `[[Construct]]`, per §4.3. Native constructors (e.g. `Array`, `Error`)
/// receive `new.target`-free treatment here: they are simply invoked with
/// `this = undefined` and are responsible for producing their own object.
pub fn construct(func: &JsObject, context: &mut Context, args: &[JsValue]) -> JsResult<JsValue> {
    if !func.is_constructor() {
        return Err(context.construct_type_error("value is not a constructor"));
    }
    let is_native = matches!(&func.borrow().kind, ObjectKind::Function(f) if matches!(f.body, FunctionBody::Native(_)));
    if is_native {
        return call(func, context, &JsValue::Undefined, args);
    }

    let proto = match func.get("prototype", context)? {
        JsValue::Object(p) => Some(p),
        _ => Some(context.intrinsics().object_prototype.clone()),
    };
    let instance = JsObject::ordinary(proto);
    let this = JsValue::Object(instance.clone());
    let result = call(func, context, &this, args)?;
    match result {
        JsValue::Object(o) => Ok(JsValue::Object(o)),
        _ => Ok(this),
    }
}

/// `OrdinaryCallBindThis` step 4-ish (§4.3): in strict mode `this` is used
/// exactly as passed. In sloppy mode, `undefined`/`null` are substituted
/// with the global object and any other primitive is boxed, so a function
/// body always sees an object for `this` unless it opted into strict mode.
fn ordinary_call_bind_this(this: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    if context.is_strict() {
        return Ok(this.clone());
    }
    if this.is_undefined() || this.is_null() {
        return Ok(JsValue::Object(context.global_object()));
    }
    if this.as_object().is_some() {
        return Ok(this.clone());
    }
    Ok(JsValue::Object(this.to_object(context)?))
}

fn bind_parameters(env: &Environment, params: &[Param], args: &[JsValue], context: &mut Context) -> JsResult<()> {
    for (i, param) in params.iter().enumerate() {
        if param.rest {
            let rest_values: Vec<JsValue> = args.get(i..).map(|s| s.to_vec()).unwrap_or_default();
            let arr = JsObject::array_from_values(rest_values, context);
            env.create_binding(&param.name, JsValue::Object(arr), true, true);
            break;
        }
        let mut value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
        if value.is_undefined() {
            if let Some(default) = &param.default {
                value = crate::exec::eval_expr(default, env, context)?;
            }
        }
        env.create_binding(&param.name, value, true, true);
    }
    Ok(())
}

fn build_arguments_object(context: &mut Context, args: &[JsValue]) -> JsObject {
    JsObject::array_from_values(args.to_vec(), context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn calling_a_non_function_throws_type_error() {
        let mut ctx = Context::new();
        let obj = JsObject::ordinary(None);
        let err = obj.call(&mut ctx, &JsValue::Undefined, &[]).unwrap_err();
        assert_eq!(err.type_of(), "object");
    }

    #[test]
    fn native_function_round_trips_args() {
        let mut ctx = Context::new();
        let f = JsObject::native_function(&ctx, "double", 1, |_this, args, _ctx| {
            let n = args.first().and_then(|v| v.as_number()).unwrap_or(0.0);
            Ok(JsValue::from(n * 2.0))
        });
        let result = f.call(&mut ctx, &JsValue::Undefined, &[JsValue::from(21.0)]).unwrap();
        assert_eq!(result.as_number(), Some(42.0));
    }
}
