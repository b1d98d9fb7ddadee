//! Environment records: the binding chain that `exec` resolves identifiers
//! against and closures capture, per §5.
//!
//! A single [`EnvironmentKind`]-agnostic record type is used for every kind
//! the spec's glossary distinguishes (declarative, function, global, block):
//! they differ only in whether a `this` binding is present and where the
//! chain bottoms out, not in storage shape.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-lexical-environments

use crate::gc::{custom_trace, Finalize, Gc, GcCell, Trace};
use crate::object::JsObject;
use crate::value::JsValue;
use crate::JsResult;
use rustc_hash::FxHashMap;

/// A single name's binding: its current value, whether it can be
/// reassigned (`let`/`var`/function params are mutable, `const` is not),
/// and whether it has been initialized yet (the temporal-dead-zone flag for
/// `let`/`const`, per §5's TDZ note).
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: JsValue,
    pub mutable: bool,
    pub initialized: bool,
}

#[derive(Debug)]
struct EnvironmentRecord {
    parent: Option<Environment>,
    bindings: FxHashMap<Box<str>, Binding>,
    this_value: Option<JsValue>,
    /// The nearest enclosing object environment's bound object, used by
    /// `with`-free `in`/global lookups; `None` outside the global scope.
    object_record: Option<JsObject>,
}

unsafe impl Trace for EnvironmentRecord {
    custom_trace!(this, {
        if let Some(p) = &this.parent {
            mark(p);
        }
        for binding in this.bindings.values() {
            mark(&binding.value);
        }
        if let Some(t) = &this.this_value {
            mark(t);
        }
        if let Some(o) = &this.object_record {
            mark(o);
        }
    });
}
impl Finalize for EnvironmentRecord {}

/// A reference-counted, GC-traced handle to an environment record. Cloning
/// is a pointer copy, matching [`crate::object::JsObject`]'s handle shape —
/// a closure captures an `Environment` exactly the way it captures any other
/// GC-managed value.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct Environment(Gc<GcCell<EnvironmentRecord>>);

impl Environment {
    fn with_parent(parent: Option<Environment>) -> Self {
        Environment(Gc::new(GcCell::new(EnvironmentRecord {
            parent,
            bindings: FxHashMap::default(),
            this_value: None,
            object_record: None,
        })))
    }

    /// The outermost environment of a realm: hosts `var` declarations made
    /// at top level and owns the global object that backs unqualified
    /// global lookups (§5's `GlobalEnvironment`).
    pub fn new_global(global_object: JsObject) -> Self {
        let env = Environment::with_parent(None);
        env.0.borrow_mut().object_record = Some(global_object.clone());
        env.0.borrow_mut().this_value = Some(JsValue::Object(global_object));
        env
    }

    /// A fresh environment pushed when entering a function body, chained to
    /// the function's captured (lexical) environment — not to the caller's
    /// environment, which is what makes closures work.
    pub fn new_function_scope(captured: &Environment) -> Self {
        Environment::with_parent(Some(captured.clone()))
    }

    /// A fresh environment pushed for a `{ ... }` block, `for` loop body,
    /// `catch` clause, etc. (§5's block-scoping note for `let`/`const`).
    pub fn new_block_scope(parent: &Environment) -> Self {
        Environment::with_parent(Some(parent.clone()))
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Creates a binding in this environment's own record (never walks the
    /// chain) — used for parameter binding, `var`/`let`/`const`
    /// declarations, and function declarations' own names.
    pub fn create_binding(&self, name: &str, value: JsValue, mutable: bool, initialized: bool) {
        self.0.borrow_mut().bindings.insert(name.into(), Binding { value, mutable, initialized });
    }

    /// Reserves an uninitialized `let`/`const` binding — the TDZ state: the
    /// name resolves but reading or writing it before its declaration's
    /// initializer runs throws a `ReferenceError`.
    pub fn create_uninitialized_binding(&self, name: &str, mutable: bool) {
        self.0.borrow_mut().bindings.insert(name.into(), Binding { value: JsValue::Undefined, mutable, initialized: false });
    }

    pub fn has_own_binding(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// `GetBindingValue`: resolves `name`, honoring the object-environment
    /// (global object) fallback and the TDZ.
    pub fn get_binding(&self, name: &str, context: &mut crate::context::Context) -> JsResult<JsValue> {
        if let Some(binding) = self.0.borrow().bindings.get(name) {
            if !binding.initialized {
                return Err(context.construct_reference_error(format!("cannot access '{name}' before initialization")));
            }
            return Ok(binding.value.clone());
        }
        if let Some(obj) = self.0.borrow().object_record.clone() {
            if obj.has_property(name, context)? {
                return obj.get(name, context);
            }
        }
        match self.parent() {
            Some(p) => p.get_binding(name, context),
            None => Err(context.construct_reference_error(format!("{name} is not defined"))),
        }
    }

    /// `SetMutableBinding`: like [`Environment::get_binding`] but for
    /// assignment; rejects writes to `const`/uninitialized bindings.
    pub fn set_binding(&self, name: &str, value: JsValue, context: &mut crate::context::Context) -> JsResult<()> {
        let own = {
            let mut data = self.0.borrow_mut();
            if let Some(binding) = data.bindings.get_mut(name) {
                if !binding.initialized {
                    return Err(context.construct_reference_error(format!("cannot access '{name}' before initialization")));
                }
                if !binding.mutable {
                    return Err(context.construct_type_error(format!("assignment to constant variable '{name}'")));
                }
                binding.value = value.clone();
                true
            } else {
                false
            }
        };
        if own {
            return Ok(());
        }
        let obj_record = self.0.borrow().object_record.clone();
        if let Some(obj) = obj_record {
            if obj.has_property(name, context)? {
                obj.set(name, value, true, context)?;
                return Ok(());
            }
        }
        match self.parent() {
            Some(p) => p.set_binding(name, value, context),
            None => Err(context.construct_reference_error(format!("{name} is not defined"))),
        }
    }

    /// Marks a previously-uninitialized binding as initialized, writing its
    /// initializer's value — called once a `let`/`const` declaration's
    /// initializer has evaluated, ending its TDZ.
    pub fn initialize_binding(&self, name: &str, value: JsValue) {
        if let Some(binding) = self.0.borrow_mut().bindings.get_mut(name) {
            binding.value = value;
            binding.initialized = true;
        }
    }

    pub fn set_this(&self, value: JsValue) {
        self.0.borrow_mut().this_value = Some(value);
    }

    /// Resolves `this` by walking up to the nearest environment that
    /// carries one (arrow functions have none of their own, per §4.3's
    /// lexical-`this` note, so they inherit the enclosing scope's).
    pub fn this(&self) -> JsValue {
        if let Some(v) = &self.0.borrow().this_value {
            return v.clone();
        }
        match self.parent() {
            Some(p) => p.this(),
            None => JsValue::Undefined,
        }
    }

    pub fn global_object(&self) -> Option<JsObject> {
        if let Some(o) = &self.0.borrow().object_record {
            return Some(o.clone());
        }
        match self.parent() {
            Some(p) => p.global_object(),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn nested_scopes_shadow_but_parent_survives() {
        let mut ctx = Context::new();
        let outer = Environment::new_global(JsObject::ordinary(None));
        outer.create_binding("x", JsValue::from(1.0), true, true);
        let inner = Environment::new_block_scope(&outer);
        inner.create_binding("x", JsValue::from(2.0), true, true);
        assert_eq!(inner.get_binding("x", &mut ctx).unwrap().as_number(), Some(2.0));
        assert_eq!(outer.get_binding("x", &mut ctx).unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn tdz_binding_throws_before_initialization() {
        let mut ctx = Context::new();
        let env = Environment::new_global(JsObject::ordinary(None));
        env.create_uninitialized_binding("y", false);
        assert!(env.get_binding("y", &mut ctx).is_err());
        env.initialize_binding("y", JsValue::from(5.0));
        assert_eq!(env.get_binding("y", &mut ctx).unwrap().as_number(), Some(5.0));
    }

    #[test]
    fn const_rebinding_is_rejected() {
        let mut ctx = Context::new();
        let env = Environment::new_global(JsObject::ordinary(None));
        env.create_binding("z", JsValue::from(1.0), false, true);
        assert!(env.set_binding("z", JsValue::from(2.0), &mut ctx).is_err());
    }
}
