//! The heap-allocated [`JsObject`]: shape + inline slots + overflow map +
//! descriptor map + element vector, per §3.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-object-type

mod array;
mod internal_methods;

pub use array::{array_for_each, array_map, array_prototype_holes};
pub use internal_methods::is_array_index;

use crate::function::FunctionData;
use crate::gc::{Finalize, Gc, GcCell, GcMeta, Trace};
use crate::property::{Attribute, PropertyDescriptor, PropertyKey};
use crate::shape::{root_shape, Shape, INLINE_CAPACITY};
use crate::symbol::JsSymbol;
use crate::value::{JsString, JsValue};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashSet;
use std::fmt;

/// Discriminates the exotic internal-slot bundle an object carries, per §3's
/// `type_tag`. The property-storage fields on [`ObjectData`] (shape, slots,
/// overflow, descriptors, elements) are shared by every kind; this enum only
/// carries the *additional* state a kind needs.
#[derive(Debug, Trace, Finalize)]
pub enum ObjectKind {
    Ordinary,
    Array,
    Arguments,
    Function(FunctionData),
    BoxedBoolean(bool),
    BoxedNumber(f64),
    BoxedString(JsString),
    Error,
    Map(crate::builtins::map::MapData),
    Set(crate::builtins::set::SetData),
    WeakMap(crate::builtins::weak::WeakMapData),
    WeakSet(crate::builtins::weak::WeakSetData),
    Proxy(crate::builtins::proxy::ProxyData),
    Promise(crate::builtins::promise::PromiseData),
    ArrayBuffer(crate::builtins::array_buffer::ArrayBufferData),
    TypedArray(crate::builtins::array_buffer::TypedArrayData),
    DataView(crate::builtins::array_buffer::DataViewData),
}

impl Default for ObjectKind {
    fn default() -> Self {
        ObjectKind::Ordinary
    }
}

/// The data behind a [`JsObject`] handle. See §3 for the field-by-field
/// contract; the invariants enumerated there are maintained by
/// `internal_methods`, not by this module directly.
#[derive(Debug, Trace, Finalize)]
pub struct ObjectData {
    #[unsafe_ignore_trace]
    pub(crate) shape: Shape,
    pub(crate) prototype: Option<JsObject>,
    extensible: bool,
    slots: Vec<JsValue>,
    #[unsafe_ignore_trace]
    overflow: FxHashMap<Box<str>, JsValue>,
    overflow_descriptors: FxHashMap<Box<str>, PropertyDescriptor>,
    symbols: IndexMap<JsSymbol, PropertyDescriptor, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>,
    elements: Vec<JsValue>,
    #[unsafe_ignore_trace]
    deleted_elements: HashSet<u32>,
    #[unsafe_ignore_trace]
    deleted_shape_properties: FxHashSet<Box<str>>,
    pub(crate) kind: ObjectKind,
    pub(crate) gc_meta: GcMeta,
    /// Set by `Object.preventExtensions`/`Object.freeze`/`Object.seal`
    /// through `[[PreventExtensions]]`; mirrors `flags` bit 0 in §3.
    extensible_flag_locked: bool,
}

impl ObjectData {
    fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
        Self {
            shape: root_shape(),
            prototype,
            extensible: true,
            slots: Vec::new(),
            overflow: FxHashMap::default(),
            overflow_descriptors: FxHashMap::default(),
            symbols: IndexMap::default(),
            elements: Vec::new(),
            deleted_elements: HashSet::new(),
            deleted_shape_properties: FxHashSet::default(),
            kind,
            gc_meta: GcMeta::new(),
            extensible_flag_locked: false,
        }
    }
}

/// A reference-counted, GC-traced handle to heap object data. Cloning a
/// `JsObject` is a pointer copy; identity (`JsObject::equals`) is what `===`
/// and `Object.is` use for objects.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct JsObject(Gc<GcCell<ObjectData>>);

impl JsObject {
    pub fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
        JsObject(Gc::new(GcCell::new(ObjectData::new(kind, prototype))))
    }

    pub fn ordinary(prototype: Option<JsObject>) -> Self {
        Self::new(ObjectKind::Ordinary, prototype)
    }

    pub fn equals(a: &JsObject, b: &JsObject) -> bool {
        Gc::ptr_eq(&a.0, &b.0)
    }

    /// A stable identity for this object's heap allocation, valid only for
    /// pointer-equality comparisons (never dereferenced through this value).
    fn identity(&self) -> *const () {
        &*self.0 as *const GcCell<ObjectData> as *const ()
    }

    /// A non-owning handle used by `WeakMap`/`WeakSet` (§4.7, §4.9): holds no
    /// `Gc` reference to `self`, so it neither roots nor marks the object,
    /// only a pointer for identity comparison plus a liveness witness that
    /// flips to `false` once `self` is actually reclaimed.
    pub fn downgrade(&self) -> WeakJsObject {
        WeakJsObject {
            ptr: self.identity(),
            alive: self.0.borrow().gc_meta.alive_handle(),
        }
    }

    pub fn borrow(&self) -> crate::gc::Ref<'_, ObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> crate::gc::RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn prototype(&self) -> Option<JsObject> {
        self.0.borrow().prototype.clone()
    }

    pub fn set_prototype(&self, proto: Option<JsObject>) {
        self.0.borrow_mut().prototype = proto;
    }

    pub fn is_extensible_flag(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        let mut data = self.0.borrow_mut();
        data.extensible = false;
        data.extensible_flag_locked = true;
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        match &self.0.borrow().kind {
            ObjectKind::Function(f) => f.is_constructor,
            _ => false,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Array)
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.0.borrow().kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array => "Array",
            ObjectKind::Arguments => "Arguments",
            ObjectKind::Function(_) => "Function",
            ObjectKind::BoxedBoolean(_) => "Boolean",
            ObjectKind::BoxedNumber(_) => "Number",
            ObjectKind::BoxedString(_) => "String",
            ObjectKind::Error => "Error",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Set(_) => "Set",
            ObjectKind::WeakMap(_) => "WeakMap",
            ObjectKind::WeakSet(_) => "WeakSet",
            ObjectKind::Proxy(_) => "Proxy",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::ArrayBuffer(_) => "ArrayBuffer",
            ObjectKind::TypedArray(_) => "TypedArray",
            ObjectKind::DataView(_) => "DataView",
        }
    }

    /// Logical length for `Array`-tagged objects: one past the highest
    /// occupied (or holed) index, per §3 invariant 5.
    pub fn array_length(&self) -> u32 {
        self.0.borrow().elements.len() as u32
    }
}

impl fmt::Display for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[object {}]", self.kind_name())
    }
}

/// See [`JsObject::downgrade`]. Carries no `Gc` pointer, so it has nothing a
/// `Trace` impl could mark and nothing a drop could finalize.
#[derive(Debug, Clone)]
pub struct WeakJsObject {
    ptr: *const (),
    alive: std::rc::Rc<std::cell::Cell<bool>>,
}

impl WeakJsObject {
    /// `false` once the referent has actually been reclaimed by a collection.
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Identity comparison against a live object, e.g. an argument passed
    /// into `WeakMap.prototype.has`. Never dereferences `self.ptr`.
    pub fn matches(&self, other: &JsObject) -> bool {
        self.ptr == other.identity()
    }
}

// Accessors used by `internal_methods` and `builtins`; kept here so the
// storage fields above stay private to this module.
impl ObjectData {
    pub(crate) fn slot_capacity(&self) -> usize {
        INLINE_CAPACITY
    }
    pub(crate) fn property_count(&self) -> usize {
        self.shape.len()
    }
    pub(crate) fn slots(&self) -> &[JsValue] {
        &self.slots
    }
    pub(crate) fn slots_mut(&mut self) -> &mut Vec<JsValue> {
        &mut self.slots
    }
    pub(crate) fn overflow(&self) -> &FxHashMap<Box<str>, JsValue> {
        &self.overflow
    }
    pub(crate) fn overflow_mut(&mut self) -> &mut FxHashMap<Box<str>, JsValue> {
        &mut self.overflow
    }
    pub(crate) fn overflow_descriptors(&self) -> &FxHashMap<Box<str>, PropertyDescriptor> {
        &self.overflow_descriptors
    }
    pub(crate) fn overflow_descriptors_mut(&mut self) -> &mut FxHashMap<Box<str>, PropertyDescriptor> {
        &mut self.overflow_descriptors
    }
    pub(crate) fn symbols(
        &self,
    ) -> &IndexMap<JsSymbol, PropertyDescriptor, std::hash::BuildHasherDefault<rustc_hash::FxHasher>> {
        &self.symbols
    }
    pub(crate) fn symbols_mut(
        &mut self,
    ) -> &mut IndexMap<JsSymbol, PropertyDescriptor, std::hash::BuildHasherDefault<rustc_hash::FxHasher>> {
        &mut self.symbols
    }
    pub(crate) fn elements(&self) -> &[JsValue] {
        &self.elements
    }
    pub(crate) fn elements_mut(&mut self) -> &mut Vec<JsValue> {
        &mut self.elements
    }
    pub(crate) fn deleted_elements(&self) -> &HashSet<u32> {
        &self.deleted_elements
    }
    pub(crate) fn deleted_elements_mut(&mut self) -> &mut HashSet<u32> {
        &mut self.deleted_elements
    }
    pub(crate) fn deleted_shape_properties(&self) -> &FxHashSet<Box<str>> {
        &self.deleted_shape_properties
    }
    pub(crate) fn deleted_shape_properties_mut(&mut self) -> &mut FxHashSet<Box<str>> {
        &mut self.deleted_shape_properties
    }
    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }
    pub(crate) fn is_extensible(&self) -> bool {
        self.extensible
    }
}

/// Convenience used by the default attribute set everywhere an ordinary
/// `obj.x = v` creates a brand-new own property (§4.1 step 5's "unless").
pub(crate) fn default_attrs() -> Attribute {
    Attribute::default()
}

pub(crate) fn key_to_shape_name(key: &PropertyKey) -> Option<&str> {
    match key {
        PropertyKey::String(s) => Some(s),
        _ => None,
    }
}
