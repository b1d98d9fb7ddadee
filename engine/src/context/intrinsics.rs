//! The realm's intrinsic objects: the per-kind prototype objects every
//! heap-allocated object of that kind chains to, per §3's object-kind list.
//!
//! Bootstrapping order matters: `object_prototype` has no prototype of its
//! own, every other prototype chains (directly or indirectly) to it, and
//! `builtins::init` only attaches methods/constructors *after* every
//! prototype object named here already exists, since a method is itself a
//! `Function`-kinded object parented to `function_prototype`.

use crate::object::{JsObject, ObjectKind};

#[derive(Debug, Clone)]
pub struct Intrinsics {
    pub object_prototype: JsObject,
    pub function_prototype: JsObject,
    pub array_prototype: JsObject,
    pub string_prototype: JsObject,
    pub number_prototype: JsObject,
    pub boolean_prototype: JsObject,
    pub symbol_prototype: JsObject,
    pub error_prototype: JsObject,
    pub type_error_prototype: JsObject,
    pub range_error_prototype: JsObject,
    pub reference_error_prototype: JsObject,
    pub syntax_error_prototype: JsObject,
    pub uri_error_prototype: JsObject,
    pub map_prototype: JsObject,
    pub set_prototype: JsObject,
    pub weak_map_prototype: JsObject,
    pub weak_set_prototype: JsObject,
    pub promise_prototype: JsObject,
    pub array_buffer_prototype: JsObject,
    pub typed_array_prototype: JsObject,
    pub data_view_prototype: JsObject,
    /// A callable native function used as `String.prototype[@@iterator]`;
    /// stashed directly on `Intrinsics` because the core iterator protocol
    /// (`iterator::get_iterator`) needs it for bare string values before any
    /// `builtins::string` wiring has necessarily run.
    pub string_iterator_factory: JsObject,
}

impl Intrinsics {
    /// Phase one of realm creation: allocates every prototype object with
    /// its prototype chain wired up, but none of their methods yet — those
    /// are added by `builtins::init` once a `Context` (and therefore
    /// `JsObject::native_function`) is available.
    pub(crate) fn bootstrap() -> Self {
        let object_prototype = JsObject::ordinary(None);
        let function_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let array_prototype = JsObject::new(ObjectKind::Array, Some(object_prototype.clone()));
        let string_prototype = JsObject::new(ObjectKind::BoxedString("".into()), Some(object_prototype.clone()));
        let number_prototype = JsObject::new(ObjectKind::BoxedNumber(0.0), Some(object_prototype.clone()));
        let boolean_prototype = JsObject::new(ObjectKind::BoxedBoolean(false), Some(object_prototype.clone()));
        let symbol_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let error_prototype = JsObject::new(ObjectKind::Error, Some(object_prototype.clone()));
        let type_error_prototype = JsObject::new(ObjectKind::Error, Some(error_prototype.clone()));
        let range_error_prototype = JsObject::new(ObjectKind::Error, Some(error_prototype.clone()));
        let reference_error_prototype = JsObject::new(ObjectKind::Error, Some(error_prototype.clone()));
        let syntax_error_prototype = JsObject::new(ObjectKind::Error, Some(error_prototype.clone()));
        let uri_error_prototype = JsObject::new(ObjectKind::Error, Some(error_prototype.clone()));
        let map_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let set_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let weak_map_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let weak_set_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let promise_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let array_buffer_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let typed_array_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        let data_view_prototype = JsObject::ordinary(Some(object_prototype.clone()));
        // Placeholder until `builtins::string` installs the real iterator
        // factory; never observed by script since `init` runs before any
        // user code does.
        let string_iterator_factory = JsObject::ordinary(Some(function_prototype.clone()));

        Self {
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            symbol_prototype,
            error_prototype,
            type_error_prototype,
            range_error_prototype,
            reference_error_prototype,
            syntax_error_prototype,
            uri_error_prototype,
            map_prototype,
            set_prototype,
            weak_map_prototype,
            weak_set_prototype,
            promise_prototype,
            array_buffer_prototype,
            typed_array_prototype,
            data_view_prototype,
            string_iterator_factory,
        }
    }
}
