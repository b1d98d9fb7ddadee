//! Execution context: environment stack, `this`, pending exception, the
//! microtask queue, and the intrinsics/well-known-symbol registries every
//! other subsystem reaches through, per §3's `Context` and §4.5.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-execution-contexts

mod intrinsics;

pub use intrinsics::Intrinsics;

use crate::environment::Environment;
use crate::object::{JsObject, ObjectKind};
use crate::property::Attribute;
use crate::symbol::WellKnownSymbols;
use crate::syntax::ast::Program;
use crate::value::JsValue;
use crate::JsResult;
use std::collections::VecDeque;

/// The kind of realm a [`Context`] is executing, per §3's `Context` kinds.
/// The evaluator in this crate only ever drives `Global`/`Function`
/// contexts; `Eval`/`Module` are carried as discriminants for API fidelity
/// with the specification but are not separately scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Global,
    Function,
    Eval,
    Module,
}

/// §3's `state` field: `Running | Suspended | Completed | Thrown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Running,
    Suspended,
    Completed,
    Thrown,
}

/// Maximum call depth before `enter_call` raises a stack-overflow
/// `RangeError`, per §4.5/§8 ("500 in the reference").
pub const MAX_EXECUTION_DEPTH: usize = 500;

/// A pending microtask: a thunk closing over everything it needs (callback,
/// argument, the settled `Promise` it resolves into), queued by
/// `builtins::promise` and drained by [`Context::run_jobs`] per §4.5.
pub struct Microtask(pub Box<dyn FnOnce(&mut Context)>);

impl std::fmt::Debug for Microtask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Microtask(..)")
    }
}

/// The engine's single execution context. This crate drives scripts
/// cooperatively and single-threaded (§5), so there is exactly one `Context`
/// alive per running engine, owning the realm's global object, its
/// intrinsics, and the microtask queue scripts enqueue `Promise` reactions
/// onto.
#[derive(Debug)]
pub struct Context {
    kind: ContextKind,
    state: ExecState,
    realm_env: Environment,
    global_object: JsObject,
    intrinsics: Intrinsics,
    well_known_symbols: WellKnownSymbols,
    execution_depth: usize,
    max_execution_depth: usize,
    new_target: Option<JsObject>,
    in_constructor_call: bool,
    microtasks: VecDeque<Microtask>,
    filename: Option<String>,
    strict: bool,
}

impl Context {
    /// Builds a fresh realm: bootstraps the intrinsic prototypes (§3's
    /// per-kind prototype objects), the well-known symbol registry, the
    /// global object/environment, then registers every built-in named in
    /// §2's component table onto the global object.
    pub fn new() -> Self {
        crate::gc::Heap::global().spawn_sweeper();

        let intrinsics = Intrinsics::bootstrap();
        let well_known_symbols = WellKnownSymbols::new();
        let global_object = JsObject::ordinary(Some(intrinsics.object_prototype.clone()));
        let realm_env = Environment::new_global(global_object.clone());

        let mut context = Context {
            kind: ContextKind::Global,
            state: ExecState::Running,
            realm_env,
            global_object,
            intrinsics,
            well_known_symbols,
            execution_depth: 0,
            max_execution_depth: MAX_EXECUTION_DEPTH,
            new_target: None,
            in_constructor_call: false,
            microtasks: VecDeque::new(),
            filename: None,
            strict: false,
        };
        crate::builtins::init(&mut context);
        context
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Mutable access to the realm's intrinsics, used once during
    /// `builtins::string::init` to replace the bootstrap placeholder
    /// `string_iterator_factory` with the real native function.
    pub(crate) fn intrinsics_mut(&mut self) -> &mut Intrinsics {
        &mut self.intrinsics
    }

    pub fn well_known_symbols(&self) -> &WellKnownSymbols {
        &self.well_known_symbols
    }

    pub fn global_object(&self) -> JsObject {
        self.global_object.clone()
    }

    pub fn realm_environment(&self) -> Environment {
        self.realm_env.clone()
    }

    pub fn set_filename(&mut self, name: impl Into<String>) {
        self.filename = Some(name.into());
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn new_target(&self) -> Option<JsObject> {
        self.new_target.clone()
    }

    pub fn set_new_target(&mut self, target: Option<JsObject>) {
        self.new_target = target;
    }

    pub fn in_constructor_call(&self) -> bool {
        self.in_constructor_call
    }

    pub fn set_in_constructor_call(&mut self, v: bool) {
        self.in_constructor_call = v;
    }

    /// Increments the call-stack depth, raising a `RangeError` if the
    /// configured execution-depth limit is exceeded (§4.5, §8).
    pub fn enter_call(&mut self) -> JsResult<()> {
        if self.execution_depth >= self.max_execution_depth {
            return Err(self.construct_range_error("Maximum call stack size exceeded"));
        }
        self.execution_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.execution_depth = self.execution_depth.saturating_sub(1);
    }

    pub fn execution_depth(&self) -> usize {
        self.execution_depth
    }

    /// Overrides the execution-depth limit. Exposed so tests (and the CLI's
    /// debug surface) can exercise §8's stack-overflow boundary behavior
    /// without recursing 500 frames deep in real test binaries.
    pub fn set_max_execution_depth(&mut self, limit: usize) {
        self.max_execution_depth = limit;
    }

    /// Enqueues a microtask (a `Promise` reaction), per §4.5's queue and
    /// §5's "microtasks run strictly after the turn that enqueued them, in
    /// FIFO order".
    pub fn enqueue_microtask(&mut self, job: impl FnOnce(&mut Context) + 'static) {
        self.microtasks.push_back(Microtask(Box::new(job)));
    }

    /// Drains the microtask queue to completion: each job may itself
    /// enqueue further jobs, which are drained in the same FIFO order,
    /// until the queue is empty (§4.5).
    pub fn run_jobs(&mut self) {
        while let Some(job) = self.microtasks.pop_front() {
            (job.0)(self);
        }
    }

    pub fn has_pending_jobs(&self) -> bool {
        !self.microtasks.is_empty()
    }

    /// Parses and evaluates `program` as a script in this realm's global
    /// environment: hoists `var`/function declarations first, per §5.
    pub fn eval_program(&mut self, program: &Program) -> JsResult<JsValue> {
        let env = self.realm_environment();
        crate::exec::hoist_declarations(program, &env, self);
        let result = match crate::exec::execute_block(program, &env, self) {
            Ok(crate::exec::Completion::Return(v)) => Ok(v),
            Ok(crate::exec::Completion::Normal(v)) => Ok(v),
            Ok(_) => Ok(JsValue::Undefined),
            Err(e) => Err(e),
        };
        self.run_jobs();
        match &result {
            Ok(_) => self.state = ExecState::Completed,
            Err(_) => self.state = ExecState::Thrown,
        }
        result
    }

    /// Formats a thrown value the way the CLI's "Uncaught ..." line and
    /// `forward`'s error text do: `toString()` the thrown value, but if
    /// *that* throws, recover by clearing the new exception and falling
    /// back to a generic description (§7: "with care to re-clear any
    /// exception raised by `toString` itself").
    pub fn stringify_thrown(&mut self, value: &JsValue) -> String {
        match value.to_js_string(self) {
            Ok(s) => s.to_string(),
            Err(_) => format!("{value}"),
        }
    }

    /// Boxes a primitive value (`Number`/`String`/`Boolean`) into its
    /// corresponding wrapper object, per `ToObject` (§4.2's object-kind
    /// prototypes; used when a method is called on a primitive receiver).
    pub fn box_primitive(&self, value: JsValue) -> JsObject {
        match value {
            JsValue::Boolean(b) => JsObject::new(ObjectKind::BoxedBoolean(b), Some(self.intrinsics.boolean_prototype.clone())),
            JsValue::Number(n) => JsObject::new(ObjectKind::BoxedNumber(n), Some(self.intrinsics.number_prototype.clone())),
            JsValue::String(s) => JsObject::new(ObjectKind::BoxedString(s), Some(self.intrinsics.string_prototype.clone())),
            other => JsObject::ordinary(Some(self.intrinsics.object_prototype.clone())).tap(|o| {
                o.create_data_property("__boxed__", other, Attribute::default());
            }),
        }
    }

    fn construct_error_of(&self, proto: JsObject, name: &'static str, message: impl Into<String>) -> JsValue {
        let err = JsObject::new(ObjectKind::Error, Some(proto));
        err.create_data_property("name", JsValue::from(name), Attribute::from_bools(true, false, true));
        err.create_data_property("message", JsValue::from(message.into()), Attribute::from_bools(true, false, true));
        JsValue::Object(err)
    }

    pub fn construct_error(&self, message: impl Into<String>) -> JsValue {
        self.construct_error_of(self.intrinsics.error_prototype.clone(), "Error", message)
    }

    pub fn construct_type_error(&self, message: impl Into<String>) -> JsValue {
        self.construct_error_of(self.intrinsics.type_error_prototype.clone(), "TypeError", message)
    }

    pub fn construct_range_error(&self, message: impl Into<String>) -> JsValue {
        self.construct_error_of(self.intrinsics.range_error_prototype.clone(), "RangeError", message)
    }

    pub fn construct_reference_error(&self, message: impl Into<String>) -> JsValue {
        self.construct_error_of(self.intrinsics.reference_error_prototype.clone(), "ReferenceError", message)
    }

    pub fn construct_syntax_error(&self, message: impl Into<String>) -> JsValue {
        self.construct_error_of(self.intrinsics.syntax_error_prototype.clone(), "SyntaxError", message)
    }

    pub fn construct_uri_error(&self, message: impl Into<String>) -> JsValue {
        self.construct_error_of(self.intrinsics.uri_error_prototype.clone(), "URIError", message)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

/// Small `Kestrel`-style tap helper so [`Context::box_primitive`]'s
/// never-taken `Symbol`/`Undefined`/`Null` arm can mutate-then-return
/// without a second binding. Kept local; not meant as a general utility.
trait Tap: Sized {
    fn tap(self, f: impl FnOnce(&Self)) -> Self {
        f(&self);
        self
    }
}
impl Tap for JsObject {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_empty_global_object_with_prototype() {
        let ctx = Context::new();
        assert!(ctx.global_object().prototype().is_some());
    }

    #[test]
    fn execution_depth_limit_raises_range_error() {
        let mut ctx = Context::new();
        ctx.set_max_execution_depth(3);
        ctx.enter_call().unwrap();
        ctx.enter_call().unwrap();
        ctx.enter_call().unwrap();
        assert!(ctx.enter_call().is_err());
    }

    #[test]
    fn microtasks_run_in_fifo_order_including_ones_they_enqueue() {
        let mut ctx = Context::new();
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let order2 = order.clone();
        ctx.enqueue_microtask(move |c| {
            order2.borrow_mut().push(1);
            let order3 = order2.clone();
            c.enqueue_microtask(move |_| order3.borrow_mut().push(3));
        });
        let order4 = order.clone();
        ctx.enqueue_microtask(move |_| order4.borrow_mut().push(2));
        ctx.run_jobs();
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }
}
