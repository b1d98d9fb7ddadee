//! The `Set` constructor/prototype and [`SetData`], the `ObjectKind::Set`
//! payload: an insertion-ordered `Vec<JsValue>` compared with
//! `SameValueZero`, mirroring [`crate::builtins::map::MapData`]'s tradeoff.

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::gc::{custom_trace, Finalize, Trace};
use crate::iterator::make_iter_result;
use crate::object::{JsObject, ObjectKind};
use crate::value::JsValue;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct SetData {
    values: Vec<JsValue>,
}

unsafe impl Trace for SetData {
    custom_trace!(this, {
        for v in &this.values {
            mark(v);
        }
    });
}
impl Finalize for SetData {}

impl SetData {
    pub fn add(&mut self, value: JsValue) {
        if !self.values.iter().any(|v| v.same_value_zero(&value)) {
            self.values.push(value);
        }
    }

    pub fn delete(&mut self, value: &JsValue) -> bool {
        match self.values.iter().position(|v| v.same_value_zero(value)) {
            Some(i) => {
                self.values.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn has(&self, value: &JsValue) -> bool {
        self.values.iter().any(|v| v.same_value_zero(value))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[JsValue] {
        &self.values
    }
}

pub(crate) fn init(context: &mut Context) {
    let proto = context.intrinsics().set_prototype.clone();

    install_method(context, &proto, "add", 1, |this, args, context| {
        let set = as_set(this, context)?;
        with_set_mut(&set, |s| s.add(arg(args, 0)));
        Ok(this.clone())
    });
    install_method(context, &proto, "delete", 1, |this, args, context| {
        let set = as_set(this, context)?;
        Ok(JsValue::from(with_set_mut(&set, |s| s.delete(&arg(args, 0)))))
    });
    install_method(context, &proto, "has", 1, |this, args, context| {
        let set = as_set(this, context)?;
        Ok(JsValue::from(data(&set).has(&arg(args, 0))))
    });
    install_method(context, &proto, "clear", 0, |this, _args, context| {
        let set = as_set(this, context)?;
        with_set_mut(&set, SetData::clear);
        Ok(JsValue::Undefined)
    });
    install_method(context, &proto, "forEach", 1, |this, args, context| {
        let set = as_set(this, context)?;
        let Some(cb) = arg(args, 0).as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("Set.prototype.forEach callback is not callable"));
        };
        let this_arg = arg(args, 1);
        let values = data(&set).values().to_vec();
        for v in values {
            cb.call(context, &this_arg, &[v.clone(), v, this.clone()])?;
        }
        Ok(JsValue::Undefined)
    });
    install_method(context, &proto, "values", 0, |this, _args, context| {
        let set = as_set(this, context)?;
        Ok(JsValue::Object(set_iterator(set, context)))
    });
    install_method(context, &proto, "keys", 0, |this, _args, context| {
        let set = as_set(this, context)?;
        Ok(JsValue::Object(set_iterator(set, context)))
    });
    let size_getter = JsObject::native_function(context, "get size", 0, |this, _args, context| {
        let set = as_set(this, context)?;
        Ok(JsValue::from(data(&set).size() as f64))
    });
    proto
        .define_own_property(
            "size",
            crate::property::PropertyDescriptor::builder().get(size_getter).configurable(true).build(),
            context,
        )
        .expect("defining well-known prototype property should not fail");

    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let values_fn = proto.get("values", context).ok().and_then(|v| v.as_object().cloned());
    if let Some(values_fn) = values_fn {
        proto.create_data_property(iterator_symbol, JsValue::Object(values_fn), method_attrs());
    }

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "Set", 0, move |_this, args, context| {
        let obj = JsObject::new(ObjectKind::Set(SetData::default()), Some(proto_for_ctor.clone()));
        if let Some(iterable) = args.first().filter(|v| !v.is_undefined() && !v.is_null()) {
            let adder = obj.get("add", context)?;
            let Some(adder) = adder.as_object().filter(|o| o.is_callable()).cloned() else {
                return Err(context.construct_type_error("Set.prototype.add is not callable"));
            };
            let this = JsValue::Object(obj.clone());
            let mut record = crate::iterator::get_iterator(iterable, context)?;
            while let Some(v) = crate::iterator::iterator_step(&mut record, context)? {
                adder.call(context, &this, &[v])?;
            }
        }
        Ok(JsValue::Object(obj))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "Set", ctor);
}

fn as_set(this: &JsValue, context: &mut Context) -> crate::JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::Set(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a Set")),
    }
}

fn data(set: &JsObject) -> SetData {
    match &set.borrow().kind {
        ObjectKind::Set(s) => s.clone(),
        _ => unreachable!(),
    }
}

fn with_set_mut<T>(set: &JsObject, f: impl FnOnce(&mut SetData) -> T) -> T {
    match &mut set.borrow_mut().kind {
        ObjectKind::Set(s) => f(s),
        _ => unreachable!(),
    }
}

fn set_iterator(set: JsObject, context: &mut Context) -> JsObject {
    let index = Rc::new(Cell::new(0usize));
    let next = JsObject::native_function(context, "next", 0, move |_this, _args, context| {
        let values = data(&set).values().to_vec();
        let i = index.get();
        if i >= values.len() {
            return Ok(JsValue::Object(make_iter_result(JsValue::Undefined, true, context)));
        }
        index.set(i + 1);
        Ok(JsValue::Object(make_iter_result(values[i].clone(), false, context)))
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
    fn set_dedupes_by_same_value_zero() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let s = new Set([1,1,2,NaN,NaN]); s.size"), "3");
    }

    #[test]
    fn set_has_and_delete() {
        let mut ctx = Context::new();
        assert_eq!(forward(&mut ctx, "let s = new Set(['a']); s.delete('a'); s.has('a')"), "false");
    }
}
