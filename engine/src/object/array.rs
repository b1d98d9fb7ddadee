//! Array exotic behavior: `push`/`pop`, holes, and the `forEach`/`map`
//! hole-skipping rule of §8's array testable properties.

use super::JsObject;
use crate::context::Context;
use crate::value::JsValue;
use crate::JsResult;

impl JsObject {
    /// `Array`-tagged constructor helper: a dense array with `values` as its
    /// initial elements, no holes.
    pub fn array_from_values(values: Vec<JsValue>, context: &mut Context) -> JsObject {
        let arr = JsObject::new(super::ObjectKind::Array, Some(context.intrinsics().array_prototype.clone()));
        {
            let mut data = arr.borrow_mut();
            *data.elements_mut() = values;
        }
        arr
    }

    /// `arr.push(v)`: appends, growing `length` by exactly one (§8).
    pub fn array_push(&self, value: JsValue) -> u32 {
        let mut data = self.borrow_mut();
        data.elements_mut().push(value);
        data.elements().len() as u32
    }

    pub fn array_pop(&self) -> Option<JsValue> {
        let mut data = self.borrow_mut();
        let popped = data.elements_mut().pop();
        if let Some(len) = data.elements().len().checked_sub(0) {
            data.deleted_elements_mut().retain(|i| (*i as usize) < len);
        }
        popped
    }

    /// `true` iff element `index` is a hole: beyond the dense length, or
    /// explicitly deleted, per §8's "a=[]; a[5]=1" scenario.
    pub fn array_is_hole(&self, index: u32) -> bool {
        let data = self.borrow();
        index as usize >= data.elements().len() || data.deleted_elements().contains(&index)
    }

    /// Iterates non-hole `(index, value)` pairs in ascending order — the
    /// iteration `forEach`/`map`/`for...of` over arrays must use so holes
    /// are skipped rather than visited as `undefined`.
    pub fn array_dense_entries(&self) -> Vec<(u32, JsValue)> {
        let data = self.borrow();
        data.elements()
            .iter()
            .enumerate()
            .filter(|(i, _)| !data.deleted_elements().contains(&(*i as u32)))
            .map(|(i, v)| (i as u32, v.clone()))
            .collect()
    }
}

/// Returns the indices of `arr` that are holes, used by `JSON.stringify`
/// (which must emit `null` for a hole rather than skip it) and by tests.
pub fn array_prototype_holes(arr: &JsObject) -> Vec<u32> {
    let data = arr.borrow();
    (0..data.elements().len() as u32).filter(|i| data.deleted_elements().contains(i)).collect()
}

/// `Array.prototype.map`: a fresh array of the same length, holes preserved
/// (the callback is not invoked for hole indices, matching §8 scenario 6).
pub fn array_map(arr: &JsObject, callback: &JsObject, this_arg: &JsValue, context: &mut Context) -> JsResult<JsObject> {
    let len = arr.array_length();
    let result = JsObject::new(super::ObjectKind::Array, Some(context.intrinsics().array_prototype.clone()));
    {
        let mut data = result.borrow_mut();
        data.elements_mut().resize(len as usize, JsValue::Undefined);
    }
    for (index, value) in arr.array_dense_entries() {
        let mapped = crate::function::call(
            callback,
            context,
            this_arg,
            &[value, JsValue::from(index), JsValue::Object(arr.clone())],
        )?;
        result.borrow_mut().elements_mut()[index as usize] = mapped;
    }
    {
        let mut data = result.borrow_mut();
        for i in 0..len {
            if arr.array_is_hole(i) {
                data.deleted_elements_mut().insert(i);
            }
        }
    }
    Ok(result)
}

/// `Array.prototype.forEach`: invokes `callback` once per non-hole element.
pub fn array_for_each(arr: &JsObject, callback: &JsObject, this_arg: &JsValue, context: &mut Context) -> JsResult<()> {
    for (index, value) in arr.array_dense_entries() {
        crate::function::call(callback, context, this_arg, &[value, JsValue::from(index), JsValue::Object(arr.clone())])?;
    }
    Ok(())
}
