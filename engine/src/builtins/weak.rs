//! `WeakMap`/`WeakSet`, per §4.7/§4.9: entries must not themselves keep a key
//! (or, for `WeakMap`, its value) alive. Entries are stored as
//! [`crate::object::WeakJsObject`] handles rather than `JsObject` clones, so
//! neither `Trace` impl below marks anything and a key with no other
//! reachable reference is reclaimed on the next collection like any other
//! unreachable object; `WeakMapData`/`WeakSetData::prune` then drops the
//! now-dead entries out of the backing `Vec` lazily, on the next `get`/`set`/
//! `delete`/`has` call, so script never observes a stale key.

use super::{arg, install_method, link_constructor, native_constructor, register_global};
use crate::context::Context;
use crate::gc::{custom_trace, Finalize, Trace};
use crate::object::{JsObject, ObjectKind, WeakJsObject};
use crate::value::JsValue;

#[derive(Debug, Clone, Default)]
pub struct WeakMapData {
    entries: Vec<(WeakJsObject, JsValue)>,
}

// `WeakJsObject` holds no `Gc` pointer (see its doc comment), so there is
// nothing here to mark; entries that outlive their key are pruned lazily by
// `position`/`prune`, not discovered through tracing.
unsafe impl Trace for WeakMapData {
    custom_trace!(this, {
        let _ = this;
    });
}
impl Finalize for WeakMapData {}

impl WeakMapData {
    fn prune(&mut self) {
        self.entries.retain(|(k, _)| k.is_alive());
    }

    fn position(&self, key: &JsObject) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.is_alive() && k.matches(key))
    }

    pub fn get(&mut self, key: &JsObject) -> Option<JsValue> {
        self.prune();
        self.position(key).map(|i| self.entries[i].1.clone())
    }

    pub fn set(&mut self, key: &JsObject, value: JsValue) {
        self.prune();
        match self.position(key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key.downgrade(), value)),
        }
    }

    pub fn delete(&mut self, key: &JsObject) -> bool {
        self.prune();
        match self.position(key) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn has(&mut self, key: &JsObject) -> bool {
        self.prune();
        self.position(key).is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeakSetData {
    values: Vec<WeakJsObject>,
}

unsafe impl Trace for WeakSetData {
    custom_trace!(this, {
        let _ = this;
    });
}
impl Finalize for WeakSetData {}

impl WeakSetData {
    fn prune(&mut self) {
        self.values.retain(|v| v.is_alive());
    }

    pub fn add(&mut self, value: &JsObject) {
        self.prune();
        if !self.values.iter().any(|v| v.is_alive() && v.matches(value)) {
            self.values.push(value.downgrade());
        }
    }

    pub fn delete(&mut self, value: &JsObject) -> bool {
        self.prune();
        match self.values.iter().position(|v| v.is_alive() && v.matches(value)) {
            Some(i) => {
                self.values.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn has(&mut self, value: &JsObject) -> bool {
        self.prune();
        self.values.iter().any(|v| v.is_alive() && v.matches(value))
    }
}

pub(crate) fn init(context: &mut Context) {
    init_weak_map(context);
    init_weak_set(context);
}

fn init_weak_map(context: &mut Context) {
    let proto = context.intrinsics().weak_map_prototype.clone();

    install_method(context, &proto, "get", 1, |this, args, context| {
        let map = as_weak_map(this, context)?;
        let Some(key) = arg(args, 0).as_object().cloned() else { return Ok(JsValue::Undefined) };
        Ok(with_weak_map_mut(&map, |m| m.get(&key)).unwrap_or(JsValue::Undefined))
    });
    install_method(context, &proto, "set", 2, |this, args, context| {
        let map = as_weak_map(this, context)?;
        let Some(key) = arg(args, 0).as_object().cloned() else {
            return Err(context.construct_type_error("Invalid value used as weak map key"));
        };
        with_weak_map_mut(&map, |m| m.set(&key, arg(args, 1)));
        Ok(this.clone())
    });
    install_method(context, &proto, "delete", 1, |this, args, context| {
        let map = as_weak_map(this, context)?;
        let Some(key) = arg(args, 0).as_object().cloned() else { return Ok(JsValue::from(false)) };
        Ok(JsValue::from(with_weak_map_mut(&map, |m| m.delete(&key))))
    });
    install_method(context, &proto, "has", 1, |this, args, context| {
        let map = as_weak_map(this, context)?;
        let Some(key) = arg(args, 0).as_object().cloned() else { return Ok(JsValue::from(false)) };
        Ok(JsValue::from(with_weak_map_mut(&map, |m| m.has(&key))))
    });

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "WeakMap", 0, move |_this, args, context| {
        let obj = JsObject::new(ObjectKind::WeakMap(WeakMapData::default()), Some(proto_for_ctor.clone()));
        if let Some(iterable) = args.first().filter(|v| !v.is_undefined() && !v.is_null()) {
            let mut record = crate::iterator::get_iterator(iterable, context)?;
            while let Some(entry) = crate::iterator::iterator_step(&mut record, context)? {
                let entry_obj = entry.to_object(context)?;
                let key = entry_obj.get_element(0, context)?;
                let Some(key) = key.as_object().cloned() else {
                    return Err(context.construct_type_error("Invalid value used as weak map key"));
                };
                let value = entry_obj.get_element(1, context)?;
                with_weak_map_mut(&obj, |m| m.set(&key, value));
            }
        }
        Ok(JsValue::Object(obj))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "WeakMap", ctor);
}

fn init_weak_set(context: &mut Context) {
    let proto = context.intrinsics().weak_set_prototype.clone();

    install_method(context, &proto, "add", 1, |this, args, context| {
        let set = as_weak_set(this, context)?;
        let Some(value) = arg(args, 0).as_object().cloned() else {
            return Err(context.construct_type_error("Invalid value used in weak set"));
        };
        with_weak_set_mut(&set, |s| s.add(&value));
        Ok(this.clone())
    });
    install_method(context, &proto, "delete", 1, |this, args, context| {
        let set = as_weak_set(this, context)?;
        let Some(value) = arg(args, 0).as_object().cloned() else { return Ok(JsValue::from(false)) };
        Ok(JsValue::from(with_weak_set_mut(&set, |s| s.delete(&value))))
    });
    install_method(context, &proto, "has", 1, |this, args, context| {
        let set = as_weak_set(this, context)?;
        let Some(value) = arg(args, 0).as_object().cloned() else { return Ok(JsValue::from(false)) };
        Ok(JsValue::from(with_weak_set_mut(&set, |s| s.has(&value))))
    });

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "WeakSet", 0, move |_this, args, context| {
        let obj = JsObject::new(ObjectKind::WeakSet(WeakSetData::default()), Some(proto_for_ctor.clone()));
        if let Some(iterable) = args.first().filter(|v| !v.is_undefined() && !v.is_null()) {
            let mut record = crate::iterator::get_iterator(iterable, context)?;
            while let Some(v) = crate::iterator::iterator_step(&mut record, context)? {
                let Some(v) = v.as_object().cloned() else {
                    return Err(context.construct_type_error("Invalid value used in weak set"));
                };
                with_weak_set_mut(&obj, |s| s.add(&v));
            }
        }
        Ok(JsValue::Object(obj))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "WeakSet", ctor);
}

fn as_weak_map(this: &JsValue, context: &mut Context) -> crate::JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::WeakMap(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a WeakMap")),
    }
}

fn as_weak_set(this: &JsValue, context: &mut Context) -> crate::JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::WeakSet(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a WeakSet")),
    }
}

fn with_weak_map_mut<T>(map: &JsObject, f: impl FnOnce(&mut WeakMapData) -> T) -> T {
    match &mut map.borrow_mut().kind {
        ObjectKind::WeakMap(m) => f(m),
        _ => unreachable!(),
    }
}

fn with_weak_set_mut<T>(set: &JsObject, f: impl FnOnce(&mut WeakSetData) -> T) -> T {
    match &mut set.borrow_mut().kind {
        ObjectKind::WeakSet(s) => f(s),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn weak_map_get_set_roundtrip() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let k = {}; let m = new WeakMap(); m.set(k, 42); m.get(k)"), "42");
    }

    #[test]
    fn weak_set_has_after_add() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let k = {}; let s = new WeakSet(); s.add(k); s.has(k)"), "true");
    }
}
