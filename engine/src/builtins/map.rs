//! The `Map` constructor/prototype and [`MapData`], the `ObjectKind::Map`
//! payload: an insertion-ordered `Vec` of entries compared with
//! `SameValueZero` (§8: "Map/Set size semantics" — `NaN` is one key, `+0`
//! and `-0` are one key).
//!
//! A hash map keyed by [`crate::value::JsValue`] isn't used because `JsValue`
//! has no `Eq`/`Hash` impl consistent with `SameValueZero` (`f64` isn't
//! `Eq`); a linear scan is the straightforward alternative, same tradeoff
//! the teacher's own `OrderedMap` sidesteps by requiring `Hash + Eq` keys.

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::gc::{custom_trace, Finalize, Trace};
use crate::iterator::make_iter_result;
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct MapData {
    entries: Vec<(JsValue, JsValue)>,
}

unsafe impl Trace for MapData {
    custom_trace!(this, {
        for (k, v) in &this.entries {
            mark(k);
            mark(v);
        }
    });
}
impl Finalize for MapData {}

impl MapData {
    fn position(&self, key: &JsValue) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.same_value_zero(key))
    }

    pub fn get(&self, key: &JsValue) -> Option<JsValue> {
        self.position(key).map(|i| self.entries[i].1.clone())
    }

    pub fn set(&mut self, key: JsValue, value: JsValue) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn delete(&mut self, key: &JsValue) -> bool {
        match self.position(key) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn has(&self, key: &JsValue) -> bool {
        self.position(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(JsValue, JsValue)] {
        &self.entries
    }
}

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().map_prototype.clone();

    install_method(context, &proto, "get", 1, |this, args, context| {
        let map = as_map(this, context)?;
        Ok(map.borrow().get(&arg(args, 0)).unwrap_or(JsValue::Undefined))
    });
    install_method(context, &proto, "set", 2, |this, args, context| {
        let map = as_map(this, context)?;
        with_map_mut(&map, |m| m.set(arg(args, 0), arg(args, 1)));
        Ok(this.clone())
    });
    install_method(context, &proto, "delete", 1, |this, args, context| {
        let map = as_map(this, context)?;
        Ok(JsValue::from(with_map_mut(&map, |m| m.delete(&arg(args, 0)))))
    });
    install_method(context, &proto, "has", 1, |this, args, context| {
        let map = as_map(this, context)?;
        Ok(JsValue::from(map.borrow().has(&arg(args, 0))))
    });
    install_method(context, &proto, "clear", 0, |this, _args, context| {
        let map = as_map(this, context)?;
        with_map_mut(&map, MapData::clear);
        Ok(JsValue::Undefined)
    });
    install_method(context, &proto, "forEach", 1, |this, args, context| {
        let map = as_map(this, context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Map.prototype.forEach callback is not callable"));
        };
        let this_arg = arg(args, 1);
        let entries = data(&map).entries().to_vec();
        for (k, v) in entries {
            cb.call(context, &this_arg, &[v, k, this.clone()])?;
        }
        Ok(JsValue::Undefined)
    });
    install_method(context, &proto, "keys", 0, |this, _args, context| {
        let map = as_map(this, context)?;
        Ok(JsValue::Object(map_iterator(map, MapIterKind::Keys, context)))
    });
    install_method(context, &proto, "values", 0, |this, _args, context| {
        let map = as_map(this, context)?;
        Ok(JsValue::Object(map_iterator(map, MapIterKind::Values, context)))
    });
    install_method(context, &proto, "entries", 0, |this, _args, context| {
        let map = as_map(this, context)?;
        Ok(JsValue::Object(map_iterator(map, MapIterKind::Entries, context)))
    });
    let size_getter = JsObject::native_function(context, "get size", 0, |this, _args, context| {
        let map = as_map(this, context)?;
        Ok(JsValue::from(data(&map).size() as f64))
    });
    proto
        .define_own_property(
            "size",
            crate::property::PropertyDescriptor::builder().get(size_getter).configurable(true).build(),
            context,
        )
        .expect("defining well-known prototype property should not fail");

    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let entries_fn = proto.get("entries", context).ok().and_then(|v| v.as_object().cloned());
    if let Some(entries_fn) = entries_fn {
        proto.create_data_property(iterator_symbol, JsValue::Object(entries_fn), method_attrs());
    }

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "Map", 0, move |_this, args, context| {
        let obj = JsObject::new(ObjectKind::Map(MapData::default()), Some(proto_for_ctor.clone()));
        if let Some(iterable) = args.first().filter(|v| !v.is_undefined() && !v.is_null()) {
            let setter = obj.get("set", context)?;
            let Some(setter) = setter.as_object().filter(|o| o.is_callable()).cloned() else {
                return Err(context.construct_type_error("Map.prototype.set is not callable"));
            };
            let this = JsValue::Object(obj.clone());
            let mut record = crate::iterator::get_iterator(iterable, context)?;
            while let Some(entry) = crate::iterator::iterator_step(&mut record, context)? {
                let entry_obj = entry.to_object(context)?;
                let k = entry_obj.get_element(0, context)?;
                let v = entry_obj.get_element(1, context)?;
                setter.call(context, &this, &[k, v])?;
            }
        }
        Ok(JsValue::Object(obj))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "Map", ctor);
}

fn as_map(this: &JsValue, context: &mut Context) -> crate::JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::Map(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a Map")),
    }
}

fn data(map: &JsObject) -> MapData {
    match &map.borrow().kind {
        ObjectKind::Map(m) => m.clone(),
        _ => unreachable!(),
    }
}

fn with_map_mut<T>(map: &JsObject, f: impl FnOnce(&mut MapData) -> T) -> T {
    match &mut map.borrow_mut().kind {
        ObjectKind::Map(m) => f(m),
        _ => unreachable!(),
    }
}

#[derive(Clone, Copy)]
enum MapIterKind {
    Keys,
    Values,
    Entries,
}

fn map_iterator(map: JsObject, kind: MapIterKind, context: &mut Context) -> JsObject {
    let index = Rc::new(Cell::new(0usize));
    let next = JsObject::native_function(context, "next", 0, move |_this, _args, context| {
        let entries = data(&map).entries().to_vec();
        let i = index.get();
        if i >= entries.len() {
            return Ok(JsValue::Object(make_iter_result(JsValue::Undefined, true, context)));
        }
        index.set(i + 1);
        let (k, v) = entries[i].clone();
        let value = match kind {
            MapIterKind::Keys => k,
            MapIterKind::Values => v,
            MapIterKind::Entries => JsValue::Object(JsObject::array_from_values(vec![k, v], context)),
        };
        Ok(JsValue::Object(make_iter_result(value, false, context)))
    });
    let iter_obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
    iter_obj.create_data_property("next", JsValue::Object(next), method_attrs());
    let self_ref = iter_obj.clone();
    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let self_fn = JsObject::native_function(context, "[Symbol.iterator]", 0, move |_this, _args, _context| Ok(JsValue::Object(self_ref.clone())));
    iter_obj.create_data_property(iterator_symbol, JsValue::Object(self_fn), method_attrs());
    iter_obj
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::forward;

    #[test]
    fn map_set_get_roundtrip() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let m = new Map(); m.set('a', 1); m.get('a')"), "1");
    }

    #[test]
    fn map_size_reflects_entry_count() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let m = new Map([['a',1],['b',2]]); m.size"), "2");
    }

    #[test]
    fn map_nan_key_is_one_key() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let m = new Map(); m.set(NaN, 1); m.set(NaN, 2); m.size"), "1");
    }

    #[test]
    fn map_plus_zero_and_minus_zero_are_one_key() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let m = new Map(); m.set(0, 'x'); m.set(-0, 'y'); m.size"), "1");
    }
}
