//! `[[Get]]`, `[[Set]]`, `[[Delete]]`, `[[DefineOwnProperty]]` and
//! `[[OwnPropertyKeys]]`: the ordinary object internal methods of §4.2.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots

use super::{default_attrs, JsObject, ObjectKind};
use crate::context::Context;
use crate::property::{Attribute, DataDescriptor, PropertyDescriptor, PropertyKey};
use crate::value::JsValue;
use crate::JsResult;

/// `true` iff `s` is a canonical array index per §4.2's `is_array_index`.
/// Delegates to [`PropertyKey::parse_array_index`]; kept as a free function
/// because the evaluator and builtins both need the predicate without first
/// constructing a `PropertyKey`.
pub fn is_array_index(s: &str) -> bool {
    PropertyKey::parse_array_index(s).is_some()
}

impl JsObject {
    /// `[[GetOwnProperty]]`: materializes a full descriptor for an own
    /// property regardless of which storage tier holds it, per §4.2's
    /// lookup order (descriptors, then shape+slot, then overflow, then
    /// elements). On a `Proxy`, runs the `getOwnPropertyDescriptor` trap
    /// (§4.8) rather than reading the target's storage directly.
    pub fn get_own_property<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> JsResult<Option<PropertyDescriptor>> {
        let key = key.into();
        if matches!(self.borrow().kind, ObjectKind::Proxy(_)) {
            return crate::builtins::proxy::proxy_get_own_property_descriptor(self, &key, context);
        }
        if let PropertyKey::Index(i) = &key {
            if matches!(self.borrow().kind, ObjectKind::TypedArray(_)) {
                return Ok(crate::builtins::array_buffer::typed_array_get_index(self, *i)
                    .map(PropertyDescriptor::default_data));
            }
        }
        let data = self.borrow();
        let result = match &key {
            PropertyKey::Index(i) => {
                if data.deleted_elements().contains(i) {
                    None
                } else {
                    data.elements().get(*i as usize).map(|v| PropertyDescriptor::default_data(v.clone()))
                }
            }
            PropertyKey::Symbol(s) => data.symbols().get(s).cloned(),
            PropertyKey::String(name) => {
                if let Some(desc) = data.overflow_descriptors().get(name.as_ref()) {
                    Some(desc.clone())
                } else if data.shape.has(name) && !data.deleted_shape_properties().contains(name.as_ref()) {
                    let info = data.shape.get_info(name).expect("just checked has()");
                    let value = data.slots().get(info.offset).cloned().unwrap_or(JsValue::Undefined);
                    Some(PropertyDescriptor::from_attribute(value, info.attributes))
                } else if let Some(v) = data.overflow().get(name.as_ref()) {
                    Some(PropertyDescriptor::default_data(v.clone()))
                } else {
                    computed_property(&data, name.as_ref())
                }
            }
        };
        Ok(result)
    }

    /// `[[HasProperty]]`: own property, else recurse up the prototype chain.
    /// On a `Proxy`, runs the `has` trap (§4.8) rather than forwarding
    /// straight to the target.
    pub fn has_property<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> JsResult<bool> {
        let key = key.into();
        if matches!(self.borrow().kind, ObjectKind::Proxy(_)) {
            return crate::builtins::proxy::proxy_has(self, &key, context);
        }
        if self.get_own_property(key.clone(), context)?.is_some() {
            return Ok(true);
        }
        match self.prototype() {
            Some(proto) => proto.has_property(key, context),
            None => Ok(false),
        }
    }

    pub fn has_own_property<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> JsResult<bool> {
        Ok(self.get_own_property(key, context)?.is_some())
    }

    /// `[[Get]](key, receiver)`, §4.2 steps 1–5. `receiver` is the value
    /// passed as `this` to an accessor getter — distinct from `self` when
    /// called through a `Proxy` or via `Reflect.get` with an explicit
    /// receiver.
    pub fn get_with_receiver<K: Into<PropertyKey>>(
        &self,
        key: K,
        receiver: &JsValue,
        context: &mut Context,
    ) -> JsResult<JsValue> {
        let key = key.into();
        if let ObjectKind::Proxy(_) = &self.borrow().kind {
            return crate::builtins::proxy::proxy_get(self, &key, receiver, context);
        }
        if let Some(desc) = self.get_own_property(key.clone(), context)? {
            return match desc {
                PropertyDescriptor::Data(d) => Ok(d.value),
                PropertyDescriptor::Accessor(a) => match a.get {
                    Some(getter) => crate::function::call(&getter, context, receiver, &[]),
                    None => Ok(JsValue::Undefined),
                },
                PropertyDescriptor::Generic(_) => Ok(JsValue::Undefined),
            };
        }
        match self.prototype() {
            Some(proto) => proto.get_with_receiver(key, receiver, context),
            None => Ok(JsValue::Undefined),
        }
    }

    pub fn get<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> JsResult<JsValue> {
        let receiver = JsValue::Object(self.clone());
        self.get_with_receiver(key, &receiver, context)
    }

    pub fn get_element(&self, index: u32, context: &mut Context) -> JsResult<JsValue> {
        self.get(PropertyKey::Index(index), context)
    }

    /// `[[Set]](key, value, receiver)`, §4.2 steps 1–6.
    pub fn set_with_receiver<K: Into<PropertyKey>>(
        &self,
        key: K,
        value: JsValue,
        receiver: &JsValue,
        context: &mut Context,
    ) -> JsResult<bool> {
        let key = key.into();
        if let ObjectKind::Proxy(_) = &self.borrow().kind {
            return crate::builtins::proxy::proxy_set(self, &key, value, receiver, context);
        }

        if matches!(self.borrow().kind, ObjectKind::TypedArray(_)) {
            if let PropertyKey::Index(i) = &key {
                crate::builtins::array_buffer::typed_array_set_index(self, *i, &value, context)?;
                return Ok(true);
            }
        }

        if matches!(self.borrow().kind, ObjectKind::Array) {
            if let PropertyKey::String(name) = &key {
                if name.as_ref() == "length" {
                    return self.set_array_length(&value, context);
                }
            }
        }

        // Walk own + prototype chain looking for an accessor to forward to,
        // or a non-writable own data property to reject.
        if let Some(desc) = self.get_own_property(key.clone(), context)? {
            match desc {
                PropertyDescriptor::Data(d) => {
                    if !d.writable {
                        return Ok(false);
                    }
                    self.put_own(key, value);
                    return Ok(true);
                }
                PropertyDescriptor::Accessor(a) => {
                    return match a.set {
                        Some(setter) => {
                            crate::function::call(&setter, context, receiver, &[value])?;
                            Ok(true)
                        }
                        None => Ok(false),
                    };
                }
                PropertyDescriptor::Generic(_) => {}
            }
        } else if let Some(proto) = self.prototype() {
            if let Some(desc) = find_inherited_accessor(&proto, &key, context)? {
                return match desc.setter().cloned() {
                    Some(setter) => {
                        crate::function::call(&setter, context, receiver, &[value])?;
                        Ok(true)
                    }
                    None => Ok(false),
                };
            }
        }

        if !self.is_extensible_flag() {
            return Ok(false);
        }
        self.put_own(key, value);
        Ok(true)
    }

    pub fn set<K: Into<PropertyKey>>(
        &self,
        key: K,
        value: JsValue,
        throw: bool,
        context: &mut Context,
    ) -> JsResult<bool> {
        let key = key.into();
        let receiver = JsValue::Object(self.clone());
        let success = self.set_with_receiver(key.clone(), value, &receiver, context)?;
        if !success && throw {
            return Err(context.construct_type_error(format!("cannot set property '{key}'")));
        }
        Ok(success)
    }

    pub fn set_element(&self, index: u32, value: JsValue, context: &mut Context) -> JsResult<bool> {
        self.set(PropertyKey::Index(index), value, false, context)
    }

    /// Writes an own property through the §4.1 add/update algorithm,
    /// assuming the caller has already checked writability/extensibility.
    pub(crate) fn put_own(&self, key: PropertyKey, value: JsValue) {
        match key {
            PropertyKey::Index(i) => self.set_element_storage(i, value),
            PropertyKey::Symbol(s) => {
                let mut data = self.borrow_mut();
                if let Some(existing) = data.symbols_mut().get_mut(&s) {
                    if let PropertyDescriptor::Data(d) = existing {
                        d.value = value;
                        return;
                    }
                }
                data.symbols_mut().insert(s, PropertyDescriptor::default_data(value));
            }
            PropertyKey::String(name) => self.put_own_named(&name, value, default_attrs()),
        }
    }

    fn put_own_named(&self, name: &str, value: JsValue, attrs: Attribute) {
        let mut data = self.borrow_mut();

        // Already shape-resident and not deleted: update the slot in place.
        if data.shape.has(name) && !data.deleted_shape_properties().contains(name) {
            let offset = data.shape.get_info(name).expect("just checked").offset;
            data.slots_mut()[offset] = value;
            return;
        }
        // Already in overflow: update in place.
        if data.overflow().contains_key(name) {
            data.overflow_mut().insert(name.into(), value);
            return;
        }
        // Previously deleted from the shape: resurrect into overflow rather
        // than reusing the nulled slot (the slot's shape offset is shared
        // with every other object on this shape).
        if data.deleted_shape_properties().contains(name) {
            data.overflow_mut().insert(name.into(), value.clone());
            data.deleted_shape_properties_mut().remove(name);
            if attrs != default_attrs() {
                data.overflow_descriptors_mut().insert(name.into(), PropertyDescriptor::from_attribute(value, attrs));
            }
            return;
        }

        // Brand-new property: §4.1 add algorithm.
        if data.property_count() < data.slot_capacity() {
            let shape = data.shape.add(name, attrs);
            data.slots_mut().push(value.clone());
            data.set_shape(shape);
        } else {
            data.overflow_mut().insert(name.into(), value.clone());
        }
        if attrs != default_attrs() {
            data.overflow_descriptors_mut().insert(name.into(), PropertyDescriptor::from_attribute(value, attrs));
        }
    }

    /// Defines (or creates) an own property with explicit attributes,
    /// bypassing the writable/extensible checks `set` performs — the entry
    /// point used by object-literal property creation and by
    /// `Object.defineProperty`'s data-descriptor path after validation.
    pub fn create_data_property<K: Into<PropertyKey>>(&self, key: K, value: JsValue, attrs: Attribute) {
        let key = key.into();
        match key {
            PropertyKey::Index(i) => self.set_element_storage(i, value),
            PropertyKey::Symbol(s) => {
                let mut data = self.borrow_mut();
                data.symbols_mut().insert(s, PropertyDescriptor::from_attribute(value, attrs));
            }
            PropertyKey::String(name) => self.put_own_named(&name, value, attrs),
        }
    }

    /// `[[DefineOwnProperty]]`, §4.2. Returns `false` on a rejected change
    /// (non-extensible + absent, or an illegal non-configurable mutation);
    /// callers that need `DefinePropertyOrThrow` wrap this. On a `Proxy`,
    /// runs the `defineProperty` trap (§4.8).
    pub fn define_own_property<K: Into<PropertyKey>>(&self, key: K, desc: PropertyDescriptor, context: &mut Context) -> JsResult<bool> {
        let key = key.into();
        if matches!(self.borrow().kind, ObjectKind::Proxy(_)) {
            return crate::builtins::proxy::proxy_define_property(self, &key, desc, context);
        }
        let current = self.get_own_property(key.clone(), context)?;
        match &current {
            None => {
                if !self.is_extensible_flag() {
                    return Ok(false);
                }
            }
            Some(current) => {
                if !current.configurable() {
                    // Can never go configurable:false -> true.
                    if let PropertyDescriptor::Generic(_) = &desc {
                        // attribute-only update: enumerable/writable changes
                        // are checked below; configurable cannot be forced
                        // true by a generic descriptor that omits it.
                    } else if desc.configurable() {
                        return Ok(false);
                    }
                    // Switching between data and accessor kind is never
                    // allowed on a non-configurable property.
                    if !matches!(desc, PropertyDescriptor::Generic(_))
                        && desc.is_accessor_descriptor() != current.is_accessor_descriptor()
                    {
                        return Ok(false);
                    }
                    // Data property: writable can only go true -> false.
                    if let (Some(cur_w), Some(new_w)) = (current.writable(), desc.writable()) {
                        if !cur_w && new_w != cur_w {
                            return Ok(false);
                        }
                        if cur_w && !new_w && current.enumerable() != desc.enumerable() {
                            return Ok(false);
                        }
                    }
                }
            }
        }
        self.write_descriptor(key, desc, current);
        Ok(true)
    }

    fn write_descriptor(&self, key: PropertyKey, desc: PropertyDescriptor, current: Option<PropertyDescriptor>) {
        let merged = merge_descriptor(current, desc);
        match &key {
            PropertyKey::Index(i) => {
                if let Some(v) = merged.value() {
                    self.set_element_storage(*i, v.clone());
                }
            }
            PropertyKey::Symbol(s) => {
                self.borrow_mut().symbols_mut().insert(s.clone(), merged);
            }
            PropertyKey::String(name) => {
                let mut data = self.borrow_mut();
                data.deleted_shape_properties_mut().remove(name.as_ref());
                if data.shape.has(name) && matches!(merged, PropertyDescriptor::Data(ref d) if Attribute::from_bools(d.writable, d.enumerable, d.configurable) == data.shape.get_info(name).unwrap().attributes)
                {
                    let offset = data.shape.get_info(name).unwrap().offset;
                    data.overflow_descriptors_mut().remove(name.as_ref());
                    if let Some(v) = merged.value() {
                        data.slots_mut()[offset] = v.clone();
                    }
                    return;
                }
                data.overflow_mut().remove(name.as_ref());
                data.overflow_descriptors_mut().insert(name.clone(), merged);
            }
        }
    }

    /// `[[Delete]]`, §4.2/§4.1: null the slot/element and record a
    /// tombstone so `has_own_property` stops seeing it, unless the property
    /// is non-configurable, in which case `delete` fails. On a `Proxy`,
    /// runs the `deleteProperty` trap (§4.8).
    pub fn delete_property<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> JsResult<bool> {
        let key = key.into();
        if matches!(self.borrow().kind, ObjectKind::Proxy(_)) {
            return crate::builtins::proxy::proxy_delete(self, &key, context);
        }
        let Some(desc) = self.get_own_property(key.clone(), context)? else {
            return Ok(true);
        };
        if !desc.configurable() {
            return Ok(false);
        }
        match key {
            PropertyKey::Index(i) => {
                let mut data = self.borrow_mut();
                data.deleted_elements_mut().insert(i);
                if let Some(slot) = data.elements_mut().get_mut(i as usize) {
                    *slot = JsValue::Undefined;
                }
            }
            PropertyKey::Symbol(s) => {
                self.borrow_mut().symbols_mut().shift_remove(&s);
            }
            PropertyKey::String(name) => {
                let mut data = self.borrow_mut();
                if data.overflow().contains_key(name.as_ref()) {
                    data.overflow_mut().remove(name.as_ref());
                    data.overflow_descriptors_mut().remove(name.as_ref());
                } else if data.shape.has(&name) {
                    data.deleted_shape_properties_mut().insert(name.clone());
                    data.overflow_descriptors_mut().remove(name.as_ref());
                }
            }
        }
        Ok(true)
    }

    pub fn delete_property_or_throw<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> JsResult<bool> {
        let key = key.into();
        let ok = self.delete_property(key.clone(), context)?;
        if !ok {
            return Err(context.construct_type_error(format!("cannot delete property '{key}'")));
        }
        Ok(ok)
    }

    /// `[[OwnPropertyKeys]]`, §4.2: integer indices ascending, then string
    /// keys in insertion order, then symbol keys in insertion order. On a
    /// `Proxy`, runs the `ownKeys` trap (§4.8).
    pub fn own_property_keys(&self, context: &mut Context) -> JsResult<Vec<PropertyKey>> {
        if matches!(self.borrow().kind, ObjectKind::Proxy(_)) {
            return crate::builtins::proxy::proxy_own_keys(self, context);
        }
        let data = self.borrow();
        let mut indices: Vec<u32> = (0..data.elements().len() as u32)
            .filter(|i| !data.deleted_elements().contains(i))
            .collect();
        indices.sort_unstable();

        let mut strings: Vec<Box<str>> = Vec::new();
        for name in data.shape.keys() {
            if !data.deleted_shape_properties().contains(name) {
                strings.push(name.into());
            }
        }
        for name in data.overflow().keys() {
            strings.push(name.clone());
        }

        let symbols: Vec<_> = data.symbols().keys().cloned().collect();

        let mut keys = Vec::with_capacity(indices.len() + strings.len() + symbols.len());
        keys.extend(indices.into_iter().map(PropertyKey::Index));
        keys.extend(strings.into_iter().map(PropertyKey::String));
        keys.extend(symbols.into_iter().map(PropertyKey::Symbol));
        Ok(keys)
    }

    /// Enumerable own string keys, the order `for...in`/`Object.keys` use.
    pub fn enumerable_own_string_keys(&self, context: &mut Context) -> JsResult<Vec<PropertyKey>> {
        let mut out = Vec::new();
        for k in self.own_property_keys(context)? {
            if matches!(k, PropertyKey::Symbol(_)) {
                continue;
            }
            if self.get_own_property(k.clone(), context)?.map(|d| d.enumerable()).unwrap_or(false) {
                out.push(k);
            }
        }
        Ok(out)
    }

    fn set_element_storage(&self, index: u32, value: JsValue) {
        let mut data = self.borrow_mut();
        let len = data.elements().len();
        if (index as usize) < len {
            data.elements_mut()[index as usize] = value;
            data.deleted_elements_mut().remove(&index);
        } else {
            let gap = index as usize - len;
            for _ in 0..gap {
                data.elements_mut().push(JsValue::Undefined);
            }
            data.elements_mut().push(value);
            let new_len = data.elements().len() as u32;
            for i in (index.saturating_sub(gap as u32))..new_len.saturating_sub(1) {
                if i >= len as u32 {
                    data.deleted_elements_mut().insert(i);
                }
            }
        }
    }

    /// `length` setter for `Array`-tagged objects (§4.2 step 1, §8 boundary
    /// behaviors): validates a `Uint32`, truncates or extends with holes.
    fn set_array_length(&self, value: &JsValue, context: &mut Context) -> JsResult<bool> {
        let n = value.to_number(context)?;
        if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
            return Err(context.construct_range_error("invalid array length"));
        }
        let new_len = n as u32;
        let mut data = self.borrow_mut();
        let cur_len = data.elements().len() as u32;
        if new_len < cur_len {
            data.elements_mut().truncate(new_len as usize);
            data.deleted_elements_mut().retain(|i| *i < new_len);
        } else if new_len > cur_len {
            for i in cur_len..new_len {
                data.elements_mut().push(JsValue::Undefined);
                data.deleted_elements_mut().insert(i);
            }
        }
        Ok(true)
    }
}

/// Properties that exist only as a view onto other state rather than as a
/// stored slot/overflow entry: `Function.prototype.length`/`.name` (derived
/// from [`crate::function::FunctionData`]) and `Array.prototype.length`
/// (derived from the element vector), per §4.2 step 6. Checked only after
/// the shape/overflow lookup has missed, so an explicit own `length`/`name`
/// (e.g. one installed by a native constructor) always takes priority.
fn computed_property(data: &super::ObjectData, name: &str) -> Option<PropertyDescriptor> {
    match &data.kind {
        ObjectKind::Function(f) if name == "length" => {
            Some(PropertyDescriptor::builder().value(f.length as f64).configurable(true).build())
        }
        ObjectKind::Function(f) if name == "name" => {
            Some(PropertyDescriptor::builder().value(f.name.to_string()).configurable(true).build())
        }
        ObjectKind::Array if name == "length" => {
            Some(PropertyDescriptor::builder().value(data.elements().len() as f64).writable(true).build())
        }
        ObjectKind::TypedArray(t) => match name {
            "length" => Some(PropertyDescriptor::builder().value(t.length as f64).build()),
            "byteLength" => {
                Some(PropertyDescriptor::builder().value((t.length * t.kind.bytes_per_element()) as f64).build())
            }
            "byteOffset" => Some(PropertyDescriptor::builder().value(t.byte_offset as f64).build()),
            "buffer" => Some(PropertyDescriptor::builder().value(JsValue::Object(t.buffer.clone())).build()),
            "BYTES_PER_ELEMENT" => {
                Some(PropertyDescriptor::builder().value(t.kind.bytes_per_element() as f64).build())
            }
            _ => None,
        },
        ObjectKind::ArrayBuffer(b) => match name {
            "byteLength" => Some(PropertyDescriptor::builder().value(b.bytes.len() as f64).build()),
            "maxByteLength" => {
                Some(PropertyDescriptor::builder().value(b.max_byte_length.unwrap_or(b.bytes.len()) as f64).build())
            }
            "resizable" => Some(PropertyDescriptor::builder().value(b.is_resizable).build()),
            _ => None,
        },
        ObjectKind::DataView(d) => match name {
            "byteLength" => Some(PropertyDescriptor::builder().value(d.byte_length as f64).build()),
            "byteOffset" => Some(PropertyDescriptor::builder().value(d.byte_offset as f64).build()),
            "buffer" => Some(PropertyDescriptor::builder().value(JsValue::Object(d.buffer.clone())).build()),
            _ => None,
        },
        _ => None,
    }
}

fn find_inherited_accessor(start: &JsObject, key: &PropertyKey, context: &mut Context) -> JsResult<Option<PropertyDescriptor>> {
    let mut current = Some(start.clone());
    while let Some(obj) = current {
        if let Some(desc) = obj.get_own_property(key.clone(), context)? {
            return Ok(if desc.is_accessor_descriptor() { Some(desc) } else { None });
        }
        current = obj.prototype();
    }
    Ok(None)
}

/// `Attribute` reconstruction used by `write_descriptor` to decide whether a
/// changed data descriptor still matches its shape-provided attributes.
impl Attribute {
    pub(crate) fn from_bools(writable: bool, enumerable: bool, configurable: bool) -> Attribute {
        let mut a = Attribute::empty();
        if writable {
            a |= Attribute::WRITABLE;
        }
        if enumerable {
            a |= Attribute::ENUMERABLE;
        }
        if configurable {
            a |= Attribute::CONFIGURABLE;
        }
        a
    }
}

/// Merges a partial (`Generic`) descriptor into the current full descriptor,
/// or simply returns `desc` if it is already `Data`/`Accessor`, per
/// `OrdinaryDefineOwnProperty`'s `CompletePropertyDescriptor` step.
fn merge_descriptor(current: Option<PropertyDescriptor>, desc: PropertyDescriptor) -> PropertyDescriptor {
    match desc {
        PropertyDescriptor::Generic(g) => match current {
            Some(PropertyDescriptor::Data(mut d)) => {
                if let Some(w) = g.writable {
                    d.writable = w;
                }
                if let Some(e) = g.enumerable {
                    d.enumerable = e;
                }
                if let Some(c) = g.configurable {
                    d.configurable = c;
                }
                PropertyDescriptor::Data(d)
            }
            Some(PropertyDescriptor::Accessor(mut a)) => {
                if let Some(e) = g.enumerable {
                    a.enumerable = e;
                }
                if let Some(c) = g.configurable {
                    a.configurable = c;
                }
                PropertyDescriptor::Accessor(a)
            }
            _ => PropertyDescriptor::Data(DataDescriptor {
                value: JsValue::Undefined,
                writable: g.writable.unwrap_or(false),
                enumerable: g.enumerable.unwrap_or(false),
                configurable: g.configurable.unwrap_or(false),
                present: Default::default(),
            }),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn set_then_get_round_trips() {
        let mut ctx = Context::new();
        let obj = JsObject::ordinary(None);
        obj.set("x", JsValue::from(1.0), true, &mut ctx).unwrap();
        assert_eq!(obj.get("x", &mut ctx).unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn delete_then_has_own_is_false() {
        let mut ctx = Context::new();
        let obj = JsObject::ordinary(None);
        obj.set("x", JsValue::from(1.0), true, &mut ctx).unwrap();
        assert!(obj.delete_property("x", &mut ctx).unwrap());
        assert!(!obj.has_own_property("x", &mut ctx).unwrap());
    }

    #[test]
    fn non_configurable_delete_fails() {
        let mut ctx = Context::new();
        let obj = JsObject::ordinary(None);
        obj.define_own_property(
            "x",
            PropertyDescriptor::builder().value(1.0).writable(true).configurable(false).enumerable(true).build(),
            &mut ctx,
        )
        .unwrap();
        assert!(!obj.delete_property("x", &mut ctx).unwrap());
        assert!(obj.has_own_property("x", &mut ctx).unwrap());
    }

    #[test]
    fn own_property_keys_ordering() {
        let mut ctx = Context::new();
        let obj = JsObject::ordinary(None);
        obj.put_own("b".into(), JsValue::from(1.0));
        obj.put_own("a".into(), JsValue::from(2.0));
        obj.put_own(2u32.into(), JsValue::from(3.0));
        obj.put_own(0u32.into(), JsValue::from(4.0));
        let keys = obj.own_property_keys(&mut ctx).unwrap();
        assert_eq!(keys[0], PropertyKey::Index(0));
        assert_eq!(keys[1], PropertyKey::Index(2));
        assert_eq!(keys[2], PropertyKey::String("b".into()));
        assert_eq!(keys[3], PropertyKey::String("a".into()));
    }

    #[test]
    fn overflow_spill_past_inline_capacity() {
        let mut ctx = Context::new();
        let obj = JsObject::ordinary(None);
        for i in 0..40 {
            obj.set(format!("p{i}"), JsValue::from(i as f64), true, &mut ctx).unwrap();
        }
        for i in 0..40 {
            assert_eq!(obj.get(format!("p{i}").as_str(), &mut ctx).unwrap().as_number(), Some(i as f64));
        }
    }
}
