//! Expression evaluation: §4's value-producing half of the evaluator.

use crate::context::Context;
use crate::environment::Environment;
use crate::function::{FunctionData, OrdinaryFunction, ThisMode};
use crate::object::{JsObject, ObjectKind};
use crate::property::{Attribute, PropertyDescriptor, PropertyKey};
use crate::syntax::ast::{BinOp, Expr, FunctionDef, LogicalOp, PropKey, UnaryOp, UpdateOp};
use crate::value::{JsString, JsValue, PreferredType};
use crate::JsResult;
use std::rc::Rc;

pub fn eval_expr(expr: &Expr, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match expr {
        Expr::NumberLit(n) => Ok(JsValue::from(*n)),
        Expr::StringLit(s) => Ok(JsValue::from(s.clone())),
        Expr::BoolLit(b) => Ok(JsValue::from(*b)),
        Expr::NullLit => Ok(JsValue::Null),
        Expr::UndefinedLit => Ok(JsValue::Undefined),
        Expr::This => Ok(env.this()),
        Expr::Ident(name) => env.get_binding(name, context),
        Expr::ArrayLit(elements) => eval_array_lit(elements, env, context),
        Expr::SpreadElement(inner) => eval_expr(inner, env, context),
        Expr::ObjectLit(props) => eval_object_lit(props, env, context),
        Expr::FunctionExpr(def) => Ok(JsValue::Object(make_function_object(def, env, context))),
        Expr::Unary { op, expr } => eval_unary(*op, expr, env, context),
        Expr::Update { op, prefix, target } => eval_update(*op, *prefix, target, env, context),
        Expr::Binary { op, left, right } => {
            let l = eval_expr(left, env, context)?;
            let r = eval_expr(right, env, context)?;
            eval_binary(*op, l, r, context)
        }
        Expr::Logical { op, left, right } => eval_logical(*op, left, right, env, context),
        Expr::Assign { op, target, value } => eval_assign(*op, target, value, env, context),
        Expr::Call { callee, args, optional } => eval_call(callee, args, *optional, env, context),
        Expr::New { callee, args } => {
            let ctor_val = eval_expr(callee, env, context)?;
            let Some(ctor) = ctor_val.as_object().filter(|o| o.is_constructor()).cloned() else {
                return Err(context.construct_type_error("value is not a constructor"));
            };
            let arg_values = eval_args(args, env, context)?;
            ctor.construct(context, &arg_values)
        }
        Expr::Member { object, property, computed, optional } => {
            eval_member(object, property, *computed, *optional, env, context)
        }
        Expr::Conditional { cond, then_expr, else_expr } => {
            if eval_expr(cond, env, context)?.to_boolean() {
                eval_expr(then_expr, env, context)
            } else {
                eval_expr(else_expr, env, context)
            }
        }
        Expr::Sequence(exprs) => {
            let mut last = JsValue::Undefined;
            for e in exprs {
                last = eval_expr(e, env, context)?;
            }
            Ok(last)
        }
        Expr::TemplateLiteral { quasis, exprs } => {
            let mut out = quasis.first().cloned().unwrap_or_default();
            for (i, e) in exprs.iter().enumerate() {
                let v = eval_expr(e, env, context)?;
                out.push_str(v.to_js_string(context)?.as_str());
                if let Some(q) = quasis.get(i + 1) {
                    out.push_str(q);
                }
            }
            Ok(JsValue::from(out))
        }
    }
}

/// Evaluates a call/array/spread argument list, expanding any
/// `Expr::SpreadElement` entries through the iterator protocol (§7).
fn eval_args(args: &[Expr], env: &Environment, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        if let Expr::SpreadElement(inner) = a {
            let val = eval_expr(inner, env, context)?;
            let mut record = crate::iterator::get_iterator(&val, context)?;
            while let Some(v) = crate::iterator::iterator_step(&mut record, context)? {
                out.push(v);
            }
        } else {
            out.push(eval_expr(a, env, context)?);
        }
    }
    Ok(out)
}

fn eval_array_lit(elements: &[Option<Expr>], env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let arr = JsObject::new(ObjectKind::Array, Some(context.intrinsics().array_prototype.clone()));
    for el in elements {
        match el {
            None => {
                let mut data = arr.borrow_mut();
                let idx = data.elements().len() as u32;
                data.elements_mut().push(JsValue::Undefined);
                data.deleted_elements_mut().insert(idx);
            }
            Some(Expr::SpreadElement(inner)) => {
                let val = eval_expr(inner, env, context)?;
                let mut record = crate::iterator::get_iterator(&val, context)?;
                while let Some(v) = crate::iterator::iterator_step(&mut record, context)? {
                    arr.borrow_mut().elements_mut().push(v);
                }
            }
            Some(e) => {
                let v = eval_expr(e, env, context)?;
                arr.borrow_mut().elements_mut().push(v);
            }
        }
    }
    Ok(JsValue::Object(arr))
}

fn eval_object_lit(props: &[crate::syntax::ast::PropertyDef], env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let obj = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
    for prop in props {
        if prop.is_spread {
            let val = eval_expr(&prop.value, env, context)?;
            if let JsValue::Object(src) = &val {
                for key in src.enumerable_own_string_keys(context)? {
                    let v = src.get(key.clone(), context)?;
                    obj.create_data_property(key, v, Attribute::default());
                }
            }
            continue;
        }
        let key = compute_prop_key(&prop.key, env, context)?;
        if prop.is_getter || prop.is_setter {
            let func_val = eval_expr(&prop.value, env, context)?;
            let Some(func) = func_val.as_object().cloned() else { continue };
            let existing = obj.get_own_property(key.clone(), context)?;
            let (mut getter, mut setter) = match existing {
                Some(PropertyDescriptor::Accessor(a)) => (a.get, a.set),
                _ => (None, None),
            };
            if prop.is_getter {
                getter = Some(func);
            } else {
                setter = Some(func);
            }
            let mut builder = PropertyDescriptor::builder().enumerable(true).configurable(true);
            if let Some(g) = getter {
                builder = builder.get(g);
            }
            if let Some(s) = setter {
                builder = builder.set(s);
            }
            obj.define_own_property(key, builder.build(), context)?;
            continue;
        }
        let value = eval_expr(&prop.value, env, context)?;
        obj.create_data_property(key, value, Attribute::default());
    }
    Ok(JsValue::Object(obj))
}

fn compute_prop_key(key: &PropKey, env: &Environment, context: &mut Context) -> JsResult<PropertyKey> {
    match key {
        PropKey::Ident(name) => Ok(PropertyKey::from(name.as_str())),
        PropKey::Computed(expr) => {
            let v = eval_expr(expr, env, context)?;
            v.to_property_key(context)
        }
    }
}

fn compute_member_key(property: &Expr, computed: bool, env: &Environment, context: &mut Context) -> JsResult<PropertyKey> {
    if computed {
        let v = eval_expr(property, env, context)?;
        return v.to_property_key(context);
    }
    match property {
        Expr::StringLit(s) => Ok(PropertyKey::from(s.as_str())),
        _ => unreachable!("non-computed member property is always a StringLit"),
    }
}

fn eval_member(object: &Expr, property: &Expr, computed: bool, optional: bool, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let obj_val = eval_expr(object, env, context)?;
    if optional && obj_val.is_null_or_undefined() {
        return Ok(JsValue::Undefined);
    }
    let key = compute_member_key(property, computed, env, context)?;
    get_property(&obj_val, key, context)
}

/// `GetValue` applied to a property reference, with the member-specific
/// primitive-receiver shortcuts (`"abc".length`, `"abc"[0]`) §4's string
/// object model calls for without boxing on every access.
pub fn get_property(obj_val: &JsValue, key: PropertyKey, context: &mut Context) -> JsResult<JsValue> {
    match obj_val {
        JsValue::Object(o) => o.get(key, context),
        JsValue::String(s) => match &key {
            PropertyKey::String(name) if name.as_ref() == "length" => Ok(JsValue::from(s.as_str().chars().count())),
            PropertyKey::Index(i) => Ok(s
                .as_str()
                .chars()
                .nth(*i as usize)
                .map(|c| JsValue::from(c.to_string()))
                .unwrap_or(JsValue::Undefined)),
            _ => {
                let boxed = context.box_primitive(obj_val.clone());
                boxed.get_with_receiver(key, obj_val, context)
            }
        },
        JsValue::Null | JsValue::Undefined => {
            let which = if obj_val.is_null() { "null" } else { "undefined" };
            Err(context.construct_type_error(format!("cannot read properties of {which} (reading '{key}')")))
        }
        JsValue::Number(_) | JsValue::Boolean(_) | JsValue::Symbol(_) => {
            let boxed = context.box_primitive(obj_val.clone());
            boxed.get_with_receiver(key, obj_val, context)
        }
    }
}

fn eval_member_set(object: &Expr, property: &Expr, computed: bool, value: JsValue, env: &Environment, context: &mut Context) -> JsResult<()> {
    let obj_val = eval_expr(object, env, context)?;
    let key = compute_member_key(property, computed, env, context)?;
    match &obj_val {
        JsValue::Object(o) => {
            o.set(key, value, context.is_strict(), context)?;
        }
        JsValue::Null | JsValue::Undefined => {
            let which = if obj_val.is_null() { "null" } else { "undefined" };
            return Err(context.construct_type_error(format!("cannot set properties of {which} (setting '{key}')")));
        }
        // Assigning onto a boxed primitive's temporary wrapper is a no-op,
        // per `PutValue`'s non-object base value case.
        _ => {}
    }
    Ok(())
}

fn assign_to_target(target: &Expr, value: JsValue, env: &Environment, context: &mut Context) -> JsResult<()> {
    match target {
        Expr::Ident(name) => env.set_binding(name, value, context),
        Expr::Member { object, property, computed, .. } => eval_member_set(object, property, *computed, value, env, context),
        _ => Err(context.construct_syntax_error("invalid assignment target")),
    }
}

fn eval_assign(op: Option<BinOp>, target: &Expr, value: &Expr, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match op {
        None => {
            let v = eval_expr(value, env, context)?;
            assign_to_target(target, v.clone(), env, context)?;
            Ok(v)
        }
        Some(binop) => {
            let old = eval_expr(target, env, context)?;
            let rhs = eval_expr(value, env, context)?;
            let new = eval_binary(binop, old, rhs, context)?;
            assign_to_target(target, new.clone(), env, context)?;
            Ok(new)
        }
    }
}

fn eval_update(op: UpdateOp, prefix: bool, target: &Expr, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let old_val = eval_expr(target, env, context)?;
    let old_num = old_val.to_number(context)?;
    let delta = match op {
        UpdateOp::Increment => 1.0,
        UpdateOp::Decrement => -1.0,
    };
    let new_num = old_num + delta;
    assign_to_target(target, JsValue::from(new_num), env, context)?;
    Ok(JsValue::from(if prefix { new_num } else { old_num }))
}

fn eval_unary(op: UnaryOp, expr: &Expr, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match op {
        UnaryOp::TypeOf => {
            if let Expr::Ident(name) = expr {
                return Ok(match env.get_binding(name, context) {
                    Ok(v) => JsValue::from(v.type_of()),
                    Err(_) => JsValue::from("undefined"),
                });
            }
            let v = eval_expr(expr, env, context)?;
            Ok(JsValue::from(v.type_of()))
        }
        UnaryOp::Void => {
            eval_expr(expr, env, context)?;
            Ok(JsValue::Undefined)
        }
        UnaryOp::Delete => match expr {
            Expr::Member { object, property, computed, .. } => {
                let obj_val = eval_expr(object, env, context)?;
                let key = compute_member_key(property, *computed, env, context)?;
                match obj_val.as_object() {
                    Some(o) => Ok(JsValue::from(o.delete_property(key, context)?)),
                    None => Ok(JsValue::from(true)),
                }
            }
            _ => {
                eval_expr(expr, env, context)?;
                Ok(JsValue::from(true))
            }
        },
        UnaryOp::Neg => {
            let n = eval_expr(expr, env, context)?.to_number(context)?;
            Ok(JsValue::from(-n))
        }
        UnaryOp::Plus => {
            let n = eval_expr(expr, env, context)?.to_number(context)?;
            Ok(JsValue::from(n))
        }
        UnaryOp::Not => {
            let b = eval_expr(expr, env, context)?.to_boolean();
            Ok(JsValue::from(!b))
        }
        UnaryOp::BitNot => {
            let i = eval_expr(expr, env, context)?.to_int32(context)?;
            Ok(JsValue::from(!i))
        }
    }
}

fn eval_logical(op: LogicalOp, left: &Expr, right: &Expr, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let l = eval_expr(left, env, context)?;
    match op {
        LogicalOp::And => {
            if l.to_boolean() {
                eval_expr(right, env, context)
            } else {
                Ok(l)
            }
        }
        LogicalOp::Or => {
            if l.to_boolean() {
                Ok(l)
            } else {
                eval_expr(right, env, context)
            }
        }
        LogicalOp::NullishCoalesce => {
            if l.is_null_or_undefined() {
                eval_expr(right, env, context)
            } else {
                Ok(l)
            }
        }
    }
}

pub fn eval_binary(op: BinOp, l: JsValue, r: JsValue, context: &mut Context) -> JsResult<JsValue> {
    match op {
        BinOp::Add => {
            let lp = l.to_primitive(context, PreferredType::Default)?;
            let rp = r.to_primitive(context, PreferredType::Default)?;
            if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                let ls = lp.to_js_string(context)?;
                let rs = rp.to_js_string(context)?;
                Ok(JsValue::from(format!("{ls}{rs}")))
            } else {
                Ok(JsValue::from(lp.to_number(context)? + rp.to_number(context)?))
            }
        }
        BinOp::Sub => Ok(JsValue::from(l.to_number(context)? - r.to_number(context)?)),
        BinOp::Mul => Ok(JsValue::from(l.to_number(context)? * r.to_number(context)?)),
        BinOp::Div => Ok(JsValue::from(l.to_number(context)? / r.to_number(context)?)),
        BinOp::Mod => Ok(JsValue::from(l.to_number(context)? % r.to_number(context)?)),
        BinOp::Exp => Ok(JsValue::from(l.to_number(context)?.powf(r.to_number(context)?))),
        BinOp::Eq => Ok(JsValue::from(loose_equals(&l, &r, context)?)),
        BinOp::NotEq => Ok(JsValue::from(!loose_equals(&l, &r, context)?)),
        BinOp::StrictEq => Ok(JsValue::from(l.strict_equals(&r))),
        BinOp::StrictNotEq => Ok(JsValue::from(!l.strict_equals(&r))),
        BinOp::Lt => Ok(JsValue::from(less_than(&l, &r, context)?.unwrap_or(false))),
        BinOp::Gt => Ok(JsValue::from(less_than(&r, &l, context)?.unwrap_or(false))),
        BinOp::LtEq => Ok(JsValue::from(!less_than(&r, &l, context)?.unwrap_or(true))),
        BinOp::GtEq => Ok(JsValue::from(!less_than(&l, &r, context)?.unwrap_or(true))),
        BinOp::BitAnd => Ok(JsValue::from(l.to_int32(context)? & r.to_int32(context)?)),
        BinOp::BitOr => Ok(JsValue::from(l.to_int32(context)? | r.to_int32(context)?)),
        BinOp::BitXor => Ok(JsValue::from(l.to_int32(context)? ^ r.to_int32(context)?)),
        BinOp::Shl => Ok(JsValue::from(l.to_int32(context)?.wrapping_shl(r.to_uint32(context)? & 31))),
        BinOp::Shr => Ok(JsValue::from(l.to_int32(context)?.wrapping_shr(r.to_uint32(context)? & 31))),
        BinOp::UShr => Ok(JsValue::from((l.to_uint32(context)?.wrapping_shr(r.to_uint32(context)? & 31)) as f64)),
        BinOp::In => {
            let Some(obj) = r.as_object() else {
                return Err(context.construct_type_error("cannot use 'in' operator on a non-object"));
            };
            let key = l.to_property_key(context)?;
            Ok(JsValue::from(obj.has_property(key, context)?))
        }
        BinOp::InstanceOf => Ok(JsValue::from(instance_of(&l, &r, context)?)),
    }
}

fn loose_equals(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<bool> {
    if a.is_null_or_undefined() && b.is_null_or_undefined() {
        return Ok(true);
    }
    if a.type_of() == b.type_of() {
        return Ok(a.strict_equals(b));
    }
    match (a, b) {
        (JsValue::Number(_), JsValue::String(_)) => {
            let bn = b.to_number(context)?;
            loose_equals(a, &JsValue::from(bn), context)
        }
        (JsValue::String(_), JsValue::Number(_)) => {
            let an = a.to_number(context)?;
            loose_equals(&JsValue::from(an), b, context)
        }
        (JsValue::Boolean(_), _) => {
            let an = a.to_number(context)?;
            loose_equals(&JsValue::from(an), b, context)
        }
        (_, JsValue::Boolean(_)) => {
            let bn = b.to_number(context)?;
            loose_equals(a, &JsValue::from(bn), context)
        }
        (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_)) => {
            let ap = a.to_primitive(context, PreferredType::Default)?;
            loose_equals(&ap, b, context)
        }
        (JsValue::Number(_) | JsValue::String(_), JsValue::Object(_)) => {
            let bp = b.to_primitive(context, PreferredType::Default)?;
            loose_equals(a, &bp, context)
        }
        _ => Ok(false),
    }
}

/// Abstract relational comparison (`<`): `None` means one side was `NaN`,
/// per §4 — every caller maps that to `false`.
fn less_than(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<Option<bool>> {
    let ap = a.to_primitive(context, PreferredType::Number)?;
    let bp = b.to_primitive(context, PreferredType::Number)?;
    if let (JsValue::String(sa), JsValue::String(sb)) = (&ap, &bp) {
        return Ok(Some(sa.as_str() < sb.as_str()));
    }
    let an = ap.to_number(context)?;
    let bn = bp.to_number(context)?;
    if an.is_nan() || bn.is_nan() {
        return Ok(None);
    }
    Ok(Some(an < bn))
}

fn instance_of(obj: &JsValue, ctor: &JsValue, context: &mut Context) -> JsResult<bool> {
    let Some(ctor_obj) = ctor.as_object().filter(|o| o.is_callable()) else {
        return Err(context.construct_type_error("right-hand side of 'instanceof' is not callable"));
    };
    let ctor_obj = ctor_obj.clone();
    let proto = ctor_obj.get("prototype", context)?;
    let Some(proto_obj) = proto.as_object().cloned() else {
        return Err(context.construct_type_error("function has non-object 'prototype' property"));
    };
    let Some(mut cur) = obj.as_object().and_then(|o| o.prototype()) else {
        return Ok(false);
    };
    loop {
        if JsObject::equals(&cur, &proto_obj) {
            return Ok(true);
        }
        match cur.prototype() {
            Some(p) => cur = p,
            None => return Ok(false),
        }
    }
}

fn eval_call(callee: &Expr, args: &[Expr], optional: bool, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    if let Expr::Member { object, property, computed, optional: member_optional } = callee {
        let obj_val = eval_expr(object, env, context)?;
        if (*member_optional || optional) && obj_val.is_null_or_undefined() {
            return Ok(JsValue::Undefined);
        }
        let key = compute_member_key(property, *computed, env, context)?;
        let func_val = get_property(&obj_val, key, context)?;
        if optional && func_val.is_null_or_undefined() {
            return Ok(JsValue::Undefined);
        }
        let Some(func) = func_val.as_object().filter(|o| o.is_callable()).cloned() else {
            return Err(context.construct_type_error("value is not a function"));
        };
        let arg_values = eval_args(args, env, context)?;
        return func.call(context, &obj_val, &arg_values);
    }
    let func_val = eval_expr(callee, env, context)?;
    if optional && func_val.is_null_or_undefined() {
        return Ok(JsValue::Undefined);
    }
    let Some(func) = func_val.as_object().filter(|o| o.is_callable()).cloned() else {
        return Err(context.construct_type_error("value is not a function"));
    };
    let arg_values = eval_args(args, env, context)?;
    func.call(context, &JsValue::Undefined, &arg_values)
}

/// Builds the `Function`-kinded object a `function`/arrow expression or
/// declaration evaluates to: an [`OrdinaryFunction`] body closing over the
/// defining environment, plus (for non-arrows) a fresh `.prototype` object
/// so `new` has somewhere to chain an instance's `[[Prototype]]`, per §4.3.
pub(crate) fn make_function_object(def: &Rc<FunctionDef>, env: &Environment, context: &mut Context) -> JsObject {
    let this_mode = if def.is_arrow { ThisMode::Lexical } else { ThisMode::Global };
    let ordinary = OrdinaryFunction {
        params: def.params.clone(),
        body: def.body.clone(),
        env: env.clone(),
        this_mode,
        is_generator: def.is_generator,
    };
    let length = def.params.iter().take_while(|p| p.default.is_none() && !p.rest).count();
    let name: JsString = JsString::from(def.name.clone().unwrap_or_default());
    let data = FunctionData {
        name,
        length,
        body: crate::function::FunctionBody::Ordinary(ordinary),
        is_constructor: !def.is_arrow,
        home_object: None,
    };
    let func_obj = JsObject::new(ObjectKind::Function(data), Some(context.intrinsics().function_prototype.clone()));
    if !def.is_arrow {
        let proto = JsObject::ordinary(Some(context.intrinsics().object_prototype.clone()));
        proto.create_data_property("constructor", JsValue::Object(func_obj.clone()), Attribute::from_bools(true, false, true));
        func_obj.create_data_property("prototype", JsValue::Object(proto), Attribute::from_bools(true, false, false));
    }
    func_obj
}
