//! `ArrayBuffer`, `DataView`, and the nine `TypedArray` views
//! (`Int8Array` .. `Float64Array`), per §4.10: a raw byte buffer plus
//! element-size-aware windows onto it.
//!
//! Indexed element access bypasses the ordinary property protocol entirely:
//! [`crate::object::internal_methods`] routes `Index` keys on a
//! `TypedArray`-kinded object straight to [`typed_array_get_index`]/
//! [`typed_array_set_index`] rather than through shape/overflow storage, the
//! same way `Array`'s `length` is special-cased there.

use super::{arg, install_method, link_constructor, method_attrs, native_constructor, register_global};
use crate::context::Context;
use crate::gc::{empty_trace, Finalize, Trace};
use crate::object::{JsObject, ObjectKind};
use crate::property::Attribute;
use crate::value::JsValue;
use crate::JsResult;

/// A resizable-or-fixed byte buffer. `is_detached` models the one-way
/// transition a host-level transfer/detach performs; once set, every view
/// over this buffer reads as empty and every write is silently dropped.
#[derive(Debug, Clone)]
pub struct ArrayBufferData {
    pub bytes: Vec<u8>,
    pub max_byte_length: Option<usize>,
    pub is_resizable: bool,
    pub is_detached: bool,
}

unsafe impl Trace for ArrayBufferData {
    empty_trace!();
}
impl Finalize for ArrayBufferData {}

impl ArrayBufferData {
    fn new(len: usize, max_byte_length: Option<usize>) -> Self {
        ArrayBufferData { bytes: vec![0; len], max_byte_length, is_resizable: max_byte_length.is_some(), is_detached: false }
    }
}

/// The nine typed-array element kinds, each with its own coercion and
/// storage width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl ElementKind {
    pub fn bytes_per_element(self) -> usize {
        match self {
            ElementKind::Int8 | ElementKind::Uint8 | ElementKind::Uint8Clamped => 1,
            ElementKind::Int16 | ElementKind::Uint16 => 2,
            ElementKind::Int32 | ElementKind::Uint32 | ElementKind::Float32 => 4,
            ElementKind::Float64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "Int8Array",
            ElementKind::Uint8 => "Uint8Array",
            ElementKind::Uint8Clamped => "Uint8ClampedArray",
            ElementKind::Int16 => "Int16Array",
            ElementKind::Uint16 => "Uint16Array",
            ElementKind::Int32 => "Int32Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::Float32 => "Float32Array",
            ElementKind::Float64 => "Float64Array",
        }
    }
}

/// A view onto a slice of an `ArrayBuffer`: `length` elements of `kind`
/// starting at `byte_offset` bytes into `buffer`.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct TypedArrayData {
    pub buffer: JsObject,
    pub byte_offset: usize,
    pub length: usize,
    #[unsafe_ignore_trace]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, Trace, Finalize)]
pub struct DataViewData {
    pub buffer: JsObject,
    pub byte_offset: usize,
    pub byte_length: usize,
}

fn to_usize(context: &mut Context, v: &JsValue) -> JsResult<usize> {
    Ok(v.to_integer_or_infinity(context)?.max(0.0) as usize)
}

fn normalize_index(n: f64, len: f64) -> usize {
    let idx = if n < 0.0 { (len + n).max(0.0) } else { n.min(len) };
    idx as usize
}

fn decode(kind: ElementKind, bytes: &[u8]) -> f64 {
    match kind {
        ElementKind::Int8 => bytes[0] as i8 as f64,
        ElementKind::Uint8 | ElementKind::Uint8Clamped => bytes[0] as f64,
        ElementKind::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        ElementKind::Uint16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        ElementKind::Int32 => i32::from_le_bytes(bytes.try_into().unwrap()) as f64,
        ElementKind::Uint32 => u32::from_le_bytes(bytes.try_into().unwrap()) as f64,
        ElementKind::Float32 => f32::from_le_bytes(bytes.try_into().unwrap()) as f64,
        ElementKind::Float64 => f64::from_le_bytes(bytes.try_into().unwrap()),
    }
}

/// Round-half-to-even clamp to `[0, 255]`, the `Uint8Clamped` coercion rule
/// (§4.10): `2.5` rounds to `2`, not `3`, because `2` is even.
fn clamp_u8(n: f64) -> u8 {
    if n.is_nan() || n <= 0.0 {
        return 0;
    }
    if n >= 255.0 {
        return 255;
    }
    let f = n.floor();
    let diff = n - f;
    if diff < 0.5 {
        f as u8
    } else if diff > 0.5 {
        f as u8 + 1
    } else if (f as u64) % 2 == 0 {
        f as u8
    } else {
        f as u8 + 1
    }
}

fn encode(kind: ElementKind, n: f64, out: &mut [u8]) {
    match kind {
        ElementKind::Int8 => out[0] = (n as i64 as i32 as i8) as u8,
        ElementKind::Uint8 => out[0] = (n as i64 as i32 as u8),
        ElementKind::Uint8Clamped => out[0] = clamp_u8(n),
        ElementKind::Int16 => out.copy_from_slice(&(wrap_i32(n) as i16).to_le_bytes()),
        ElementKind::Uint16 => out.copy_from_slice(&(wrap_i32(n) as u16).to_le_bytes()),
        ElementKind::Int32 => out.copy_from_slice(&wrap_i32(n).to_le_bytes()),
        ElementKind::Uint32 => out.copy_from_slice(&(wrap_i32(n) as u32).to_le_bytes()),
        ElementKind::Float32 => out.copy_from_slice(&(n as f32).to_le_bytes()),
        ElementKind::Float64 => out.copy_from_slice(&n.to_le_bytes()),
    }
}

/// `ToInt32` without a `Context` round-trip: `n` has already been through
/// `ToNumber`, so only the modular wrap remains.
fn wrap_i32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let modulo = n.trunc().rem_euclid(4294967296.0);
    if modulo >= 2147483648.0 {
        (modulo - 4294967296.0) as i32
    } else {
        modulo as i32
    }
}

/// Reads element `index` out of `ta`'s backing buffer, or `None` if the
/// index is out of bounds or the buffer has been detached — the caller maps
/// `None` to `undefined` (§4.10's out-of-bounds read rule).
pub(crate) fn typed_array_get_index(ta: &JsObject, index: u32) -> Option<JsValue> {
    let (buffer, byte_offset, length, kind) = typed_array_parts(ta);
    if index as usize >= length {
        return None;
    }
    let bpe = kind.bytes_per_element();
    let start = byte_offset + index as usize * bpe;
    let buf = buffer.borrow();
    let ObjectKind::ArrayBuffer(b) = &buf.kind else { unreachable!() };
    if b.is_detached {
        return None;
    }
    Some(JsValue::from(decode(kind, &b.bytes[start..start + bpe])))
}

/// Writes element `index`, coercing `value` with `ToNumber` first (so side
/// effects from a `valueOf`/`Symbol.toPrimitive` run even when the index
/// turns out to be out of bounds, per `IntegerIndexedElementSet`). An
/// out-of-bounds index or a detached buffer makes this a silent no-op.
pub(crate) fn typed_array_set_index(ta: &JsObject, index: u32, value: &JsValue, context: &mut Context) -> JsResult<()> {
    let n = value.to_number(context)?;
    let (buffer, byte_offset, length, kind) = typed_array_parts(ta);
    if index as usize >= length {
        return Ok(());
    }
    let bpe = kind.bytes_per_element();
    let start = byte_offset + index as usize * bpe;
    let mut buf = buffer.borrow_mut();
    let ObjectKind::ArrayBuffer(b) = &mut buf.kind else { unreachable!() };
    if b.is_detached {
        return Ok(());
    }
    encode(kind, n, &mut b.bytes[start..start + bpe]);
    Ok(())
}

fn typed_array_parts(ta: &JsObject) -> (JsObject, usize, usize, ElementKind) {
    match &ta.borrow().kind {
        ObjectKind::TypedArray(t) => (t.buffer.clone(), t.byte_offset, t.length, t.kind),
        _ => unreachable!("typed_array_parts called on a non-TypedArray object"),
    }
}

fn typed_array_length(ta: &JsObject) -> usize {
    match &ta.borrow().kind {
        ObjectKind::TypedArray(t) => t.length,
        _ => 0,
    }
}

fn new_array_buffer(bytes: Vec<u8>, max_byte_length: Option<usize>, context: &Context) -> JsObject {
    JsObject::new(
        ObjectKind::ArrayBuffer(ArrayBufferData { bytes, max_byte_length, is_resizable: max_byte_length.is_some(), is_detached: false }),
        Some(context.intrinsics().array_buffer_prototype.clone()),
    )
}

fn make_typed_array(buffer: JsObject, byte_offset: usize, length: usize, kind: ElementKind, context: &Context) -> JsValue {
    JsValue::Object(JsObject::new(
        ObjectKind::TypedArray(TypedArrayData { buffer, byte_offset, length, kind }),
        Some(context.intrinsics().typed_array_prototype.clone()),
    ))
}

fn as_array_buffer(this: &JsValue, context: &mut Context) -> JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::ArrayBuffer(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected an ArrayBuffer")),
    }
}

fn as_typed_array(this: &JsValue, context: &mut Context) -> JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::TypedArray(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a TypedArray")),
    }
}

fn as_data_view(this: &JsValue, context: &mut Context) -> JsResult<JsObject> {
    match this.as_object() {
        Some(o) if matches!(o.borrow().kind, ObjectKind::DataView(_)) => Ok(o.clone()),
        _ => Err(context.construct_type_error("method called on incompatible receiver, expected a DataView")),
    }
}

/// Reads `src`'s elements for `TypedArray.prototype.set`/a non-buffer,
/// non-numeric constructor argument: iterable first, array-like fallback.
fn collect_values(src: &JsValue, context: &mut Context) -> JsResult<Vec<JsValue>> {
    if let Ok(mut record) = crate::iterator::get_iterator(src, context) {
        let mut out = Vec::new();
        while let Some(item) = crate::iterator::iterator_step(&mut record, context)? {
            out.push(item);
        }
        return Ok(out);
    }
    let obj = src.to_object(context)?;
    let len = to_usize(context, &obj.get("length", context)?)?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len as u32 {
        out.push(obj.get_element(i, context)?);
    }
    Ok(out)
}

pub(crate) fn init(context: &mut Context) {
    init_array_buffer(context);
    init_typed_arrays(context);
    init_data_view(context);
}

fn init_array_buffer(context: &mut Context) {
    let proto = context.intrinsics().array_buffer_prototype.clone();

    install_method(context, &proto, "slice", 2, |this, args, context| {
        let buf = as_array_buffer(this, context)?;
        let len = { let d = buf.borrow(); let ObjectKind::ArrayBuffer(b) = &d.kind else { unreachable!() }; b.bytes.len() } as f64;
        let start = normalize_index(arg(args, 0).to_integer_or_infinity(context)?, len);
        let end = if arg(args, 1).is_undefined() {
            len as usize
        } else {
            normalize_index(arg(args, 1).to_integer_or_infinity(context)?, len)
        };
        let d = buf.borrow();
        let ObjectKind::ArrayBuffer(b) = &d.kind else { unreachable!() };
        let slice = if start < end { b.bytes[start..end].to_vec() } else { Vec::new() };
        drop(d);
        Ok(JsValue::Object(new_array_buffer(slice, None, context)))
    });

    install_method(context, &proto, "resize", 1, |this, args, context| {
        let buf = as_array_buffer(this, context)?;
        let new_len = to_usize(context, &arg(args, 0))?;
        let mut d = buf.borrow_mut();
        let ObjectKind::ArrayBuffer(b) = &mut d.kind else { unreachable!() };
        if !b.is_resizable {
            return Err(context.construct_type_error("ArrayBuffer is not resizable"));
        }
        if let Some(max) = b.max_byte_length {
            if new_len > max {
                return Err(context.construct_range_error("resize length exceeds maxByteLength"));
            }
        }
        b.bytes.resize(new_len, 0);
        Ok(JsValue::Undefined)
    });

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "ArrayBuffer", 1, move |_this, args, context| {
        let len = arg(args, 0).to_integer_or_infinity(context)?;
        if len < 0.0 {
            return Err(context.construct_range_error("invalid array buffer length"));
        }
        let max_byte_length = match arg(args, 1).as_object() {
            Some(opts) => {
                let m = opts.get("maxByteLength", context)?;
                if m.is_undefined() { None } else { Some(to_usize(context, &m)?) }
            }
            None => None,
        };
        Ok(JsValue::Object(JsObject::new(
            ObjectKind::ArrayBuffer(ArrayBufferData::new(len as usize, max_byte_length)),
            Some(proto_for_ctor.clone()),
        )))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "ArrayBuffer", ctor);
}

const TYPED_ARRAY_KINDS: [ElementKind; 9] = [
    ElementKind::Int8,
    ElementKind::Uint8,
    ElementKind::Uint8Clamped,
    ElementKind::Int16,
    ElementKind::Uint16,
    ElementKind::Int32,
    ElementKind::Uint32,
    ElementKind::Float32,
    ElementKind::Float64,
];

fn init_typed_arrays(context: &mut Context) {
    for kind in TYPED_ARRAY_KINDS {
        init_typed_array_kind(context, kind);
    }
    install_typed_array_prototype_methods(context);
}

fn init_typed_array_kind(context: &mut Context, kind: ElementKind) {
    let proto = context.intrinsics().typed_array_prototype.clone();
    let name = kind.name();
    let ctor = native_constructor(context, name, 1, move |_this, args, context| construct_typed_array(kind, args, context));
    ctor.create_data_property("BYTES_PER_ELEMENT", JsValue::from(kind.bytes_per_element() as f64), Attribute::empty());
    link_constructor(&ctor, &proto);
    register_global(context, name, ctor);
}

fn construct_typed_array(kind: ElementKind, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let bpe = kind.bytes_per_element();
    match args.first() {
        None => Ok(make_typed_array(new_array_buffer(Vec::new(), None, context), 0, 0, kind, context)),
        Some(JsValue::Object(o)) if matches!(o.borrow().kind, ObjectKind::ArrayBuffer(_)) => {
            let buffer = o.clone();
            let buf_len = {
                let d = buffer.borrow();
                let ObjectKind::ArrayBuffer(b) = &d.kind else { unreachable!() };
                b.bytes.len()
            };
            let byte_offset = if args.len() > 1 && !args[1].is_undefined() { to_usize(context, &args[1])? } else { 0 };
            let length = if args.len() > 2 && !args[2].is_undefined() {
                to_usize(context, &args[2])?
            } else {
                if (buf_len - byte_offset) % bpe != 0 {
                    return Err(context.construct_range_error("buffer length minus byte offset is not a multiple of the element size"));
                }
                (buf_len - byte_offset) / bpe
            };
            if byte_offset > buf_len || byte_offset + length * bpe > buf_len {
                return Err(context.construct_range_error("invalid typed array length"));
            }
            Ok(make_typed_array(buffer, byte_offset, length, kind, context))
        }
        Some(v) if v.as_number().is_some() => {
            let len = v.as_number().unwrap().max(0.0) as usize;
            Ok(make_typed_array(new_array_buffer(vec![0; len * bpe], None, context), 0, len, kind, context))
        }
        Some(other) => {
            let values = collect_values(other, context)?;
            let len = values.len();
            let buffer = new_array_buffer(vec![0; len * bpe], None, context);
            let arr_value = make_typed_array(buffer, 0, len, kind, context);
            let JsValue::Object(arr) = &arr_value else { unreachable!() };
            for (i, v) in values.into_iter().enumerate() {
                typed_array_set_index(arr, i as u32, &v, context)?;
            }
            Ok(arr_value)
        }
    }
}

fn typed_array_iterator(ta: JsObject, context: &mut Context) -> JsObject {
    let index = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let next = JsObject::native_function(context, "next", 0, move |_this, _args, context| {
        let len = typed_array_length(&ta) as u32;
        let i = index.get();
        if i >= len {
            return Ok(JsValue::Object(crate::iterator::make_iter_result(JsValue::Undefined, true, context)));
        }
        index.set(i + 1);
        let value = typed_array_get_index(&ta, i).unwrap_or(JsValue::Undefined);
        Ok(JsValue::Object(crate::iterator::make_iter_result(value, false, context)))
    });
    let iter_obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
    iter_obj.create_data_property("next", JsValue::Object(next), method_attrs());
    iter_obj
}

fn install_typed_array_prototype_methods(context: &mut Context) {
    let proto = context.intrinsics().typed_array_prototype.clone();

    install_method(context, &proto, "fill", 1, |this, args, context| {
        let ta = as_typed_array(this, context)?;
        let value = arg(args, 0);
        for i in 0..typed_array_length(&ta) as u32 {
            typed_array_set_index(&ta, i, &value, context)?;
        }
        Ok(this.clone())
    });

    install_method(context, &proto, "set", 2, |this, args, context| {
        let ta = as_typed_array(this, context)?;
        let src = arg(args, 0);
        let offset = if args.len() > 1 { to_usize(context, &args[1])? } else { 0 };
        let values = collect_values(&src, context)?;
        for (i, v) in values.into_iter().enumerate() {
            typed_array_set_index(&ta, (offset + i) as u32, &v, context)?;
        }
        Ok(JsValue::Undefined)
    });

    install_method(context, &proto, "subarray", 2, |this, args, context| {
        let ta = as_typed_array(this, context)?;
        let (buffer, byte_offset, length, kind) = typed_array_parts(&ta);
        let len = length as f64;
        let start = normalize_index(arg(args, 0).to_integer_or_infinity(context)?, len);
        let end = if arg(args, 1).is_undefined() { length } else { normalize_index(arg(args, 1).to_integer_or_infinity(context)?, len) };
        let bpe = kind.bytes_per_element();
        let new_len = end.saturating_sub(start);
        Ok(make_typed_array(buffer, byte_offset + start * bpe, new_len, kind, context))
    });

    let iterator_symbol = context.well_known_symbols().iterator.clone();
    let iter_fn = JsObject::native_function(context, "[Symbol.iterator]", 0, |this, _args, context| {
        let ta = as_typed_array(this, context)?;
        Ok(JsValue::Object(typed_array_iterator(ta, context)))
    });
    proto.create_data_property(iterator_symbol, JsValue::Object(iter_fn), method_attrs());
}

fn init_data_view(context: &mut Context) {
    let proto = context.intrinsics().data_view_prototype.clone();

    macro_rules! view_accessor {
        ($get_name:literal, $set_name:literal, $kind:expr) => {
            install_method(context, &proto, $get_name, 1, |this, args, context| {
                let dv = as_data_view(this, context)?;
                let offset = to_usize(context, &arg(args, 0))?;
                let little_endian = arg(args, 1).to_boolean();
                data_view_get(&dv, offset, $kind, little_endian, context)
            });
            install_method(context, &proto, $set_name, 2, |this, args, context| {
                let dv = as_data_view(this, context)?;
                let offset = to_usize(context, &arg(args, 0))?;
                let value = arg(args, 1).to_number(context)?;
                let little_endian = arg(args, 2).to_boolean();
                data_view_set(&dv, offset, $kind, value, little_endian, context)?;
                Ok(JsValue::Undefined)
            });
        };
    }
    view_accessor!("getInt8", "setInt8", ElementKind::Int8);
    view_accessor!("getUint8", "setUint8", ElementKind::Uint8);
    view_accessor!("getInt16", "setInt16", ElementKind::Int16);
    view_accessor!("getUint16", "setUint16", ElementKind::Uint16);
    view_accessor!("getInt32", "setInt32", ElementKind::Int32);
    view_accessor!("getUint32", "setUint32", ElementKind::Uint32);
    view_accessor!("getFloat32", "setFloat32", ElementKind::Float32);
    view_accessor!("getFloat64", "setFloat64", ElementKind::Float64);

    let proto_for_ctor = proto.clone();
    let ctor = native_constructor(context, "DataView", 1, move |_this, args, context| {
        let Some(buffer) = arg(args, 0).as_object().cloned().filter(|o| matches!(o.borrow().kind, ObjectKind::ArrayBuffer(_))) else {
            return Err(context.construct_type_error("DataView constructor requires an ArrayBuffer"));
        };
        let buf_len = {
            let d = buffer.borrow();
            let ObjectKind::ArrayBuffer(b) = &d.kind else { unreachable!() };
            b.bytes.len()
        };
        let byte_offset = if args.len() > 1 && !args[1].is_undefined() { to_usize(context, &args[1])? } else { 0 };
        if byte_offset > buf_len {
            return Err(context.construct_range_error("byteOffset exceeds buffer length"));
        }
        let byte_length = if args.len() > 2 && !args[2].is_undefined() { to_usize(context, &args[2])? } else { buf_len - byte_offset };
        if byte_offset + byte_length > buf_len {
            return Err(context.construct_range_error("invalid DataView length"));
        }
        Ok(JsValue::Object(JsObject::new(
            ObjectKind::DataView(DataViewData { buffer, byte_offset, byte_length }),
            Some(proto_for_ctor.clone()),
        )))
    });
    link_constructor(&ctor, &proto);
    register_global(context, "DataView", ctor);
}

fn data_view_parts(dv: &JsObject) -> (JsObject, usize, usize) {
    match &dv.borrow().kind {
        ObjectKind::DataView(d) => (d.buffer.clone(), d.byte_offset, d.byte_length),
        _ => unreachable!("data_view_parts called on a non-DataView object"),
    }
}

fn data_view_get(dv: &JsObject, offset: usize, kind: ElementKind, little_endian: bool, context: &mut Context) -> JsResult<JsValue> {
    let (buffer, byte_offset, byte_length) = data_view_parts(dv);
    let bpe = kind.bytes_per_element();
    if offset + bpe > byte_length {
        return Err(context.construct_range_error("offset is outside the bounds of the DataView"));
    }
    let data = buffer.borrow();
    let ObjectKind::ArrayBuffer(b) = &data.kind else { unreachable!() };
    if b.is_detached {
        return Err(context.construct_type_error("ArrayBuffer is detached"));
    }
    let start = byte_offset + offset;
    let mut bytes = b.bytes[start..start + bpe].to_vec();
    if !little_endian {
        bytes.reverse();
    }
    Ok(JsValue::from(decode(kind, &bytes)))
}

fn data_view_set(dv: &JsObject, offset: usize, kind: ElementKind, value: f64, little_endian: bool, context: &mut Context) -> JsResult<()> {
    let (buffer, byte_offset, byte_length) = data_view_parts(dv);
    let bpe = kind.bytes_per_element();
    if offset + bpe > byte_length {
        return Err(context.construct_range_error("offset is outside the bounds of the DataView"));
    }
    let mut encoded = vec![0u8; bpe];
    encode(kind, value, &mut encoded);
    if !little_endian {
        encoded.reverse();
    }
    let mut data = buffer.borrow_mut();
    let ObjectKind::ArrayBuffer(b) = &mut data.kind else { unreachable!() };
    if b.is_detached {
        return Err(context.construct_type_error("ArrayBuffer is detached"));
    }
    let start = byte_offset + offset;
    b.bytes[start..start + bpe].copy_from_slice(&encoded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{forward_val, Context};

    #[test]
    fn typed_array_roundtrips_through_buffer() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "let a = new Int32Array([1,2,3]); a[1] = 42; a[1]").unwrap();
        assert_eq!(v.as_number(), Some(42.0));
    }

    #[test]
    fn uint8_clamped_rounds_half_to_even_and_saturates() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "let a = new Uint8ClampedArray(3); a[0] = 300; a[1] = -5; a[2] = 2.5; [a[0], a[1], a[2]].join(',')").unwrap();
        assert_eq!(v.to_js_string(&mut ctx).unwrap().as_str(), "255,0,2");
    }

    #[test]
    fn out_of_bounds_read_is_undefined_and_write_is_dropped() {
        let mut ctx = Context::new();
        let v = forward_val(&mut ctx, "let a = new Uint8Array(2); a[5] = 9; a[5]").unwrap();
        assert!(v.is_undefined());
    }

    #[test]
    fn shared_buffer_views_see_each_others_writes() {
        let mut ctx = Context::new();
        let v = forward_val(
            &mut ctx,
            "let buf = new ArrayBuffer(4); let a = new Int32Array(buf); let b = new Uint8Array(buf); a[0] = 1; b[0]",
        )
        .unwrap();
        assert_eq!(v.as_number(), Some(1.0));
    }

    #[test]
    fn data_view_respects_endianness() {
        let mut ctx = Context::new();
        let v = forward_val(
            &mut ctx,
            "let buf = new ArrayBuffer(4); let dv = new DataView(buf); dv.setInt32(0, 1, true); dv.getInt32(0, true)",
        )
        .unwrap();
        assert_eq!(v.as_number(), Some(1.0));
    }
}
