//! Statement execution: hoisting already ran (see [`super::hoist_declarations`]);
//! this module walks the control-flow-bearing half of the AST.

use super::{expr, Completion};
use crate::context::Context;
use crate::environment::Environment;
use crate::iterator::{iterator_close, iterator_step, IteratorRecord};
use crate::syntax::ast::{DeclKind, Stmt};
use crate::value::JsValue;
use crate::JsResult;

/// Runs a statement list as a single unit: its completion value is the last
/// `Normal` completion's value, and any abrupt completion (`return`/`break`/
/// `continue`) from one of its statements short-circuits the rest, per §4.5.
pub fn execute_block(stmts: &[Stmt], env: &Environment, context: &mut Context) -> JsResult<Completion> {
    let mut last = JsValue::Undefined;
    for stmt in stmts {
        match exec_stmt(stmt, env, context)? {
            Completion::Normal(v) => last = v,
            other => return Ok(other),
        }
    }
    Ok(Completion::Normal(last))
}

pub fn exec_stmt(stmt: &Stmt, env: &Environment, context: &mut Context) -> JsResult<Completion> {
    exec_stmt_labeled(stmt, env, context, None)
}

fn exec_stmt_labeled(stmt: &Stmt, env: &Environment, context: &mut Context, label: Option<&str>) -> JsResult<Completion> {
    match stmt {
        Stmt::Labeled { label: l, body } => exec_stmt_labeled(body, env, context, Some(l.as_str())),
        Stmt::While { cond, body } => exec_while(cond, body, env, context, label),
        Stmt::DoWhile { cond, body } => exec_do_while(cond, body, env, context, label),
        Stmt::For { init, cond, update, body } => exec_for(init, cond, update, body, env, context, label),
        Stmt::ForOf { kind, binding, iterable, body } => exec_for_of(kind, binding, iterable, body, env, context, label),
        Stmt::ForIn { kind, binding, object, body } => exec_for_in(kind, binding, object, body, env, context, label),
        other => exec_simple_stmt(other, env, context),
    }
}

/// Interprets a loop body's completion against the enclosing loop's label:
/// `None` means "keep iterating" (and `result` has been updated with the
/// body's `Normal` value); `Some(outcome)` means the loop must stop and
/// return `outcome` to its caller (unwound further if the label doesn't
/// match, per §4.5's labeled break/continue).
fn handle_loop_completion(completion: Completion, label: Option<&str>, result: &mut JsValue) -> Option<JsResult<Completion>> {
    match completion {
        Completion::Normal(v) => {
            *result = v;
            None
        }
        Completion::Break(None) => Some(Ok(Completion::Normal(result.clone()))),
        Completion::Break(Some(l)) => {
            if Some(l.as_str()) == label {
                Some(Ok(Completion::Normal(result.clone())))
            } else {
                Some(Ok(Completion::Break(Some(l))))
            }
        }
        Completion::Continue(None) => None,
        Completion::Continue(Some(l)) => {
            if Some(l.as_str()) == label {
                None
            } else {
                Some(Ok(Completion::Continue(Some(l))))
            }
        }
        Completion::Return(v) => Some(Ok(Completion::Return(v))),
    }
}

fn exec_while(cond: &crate::syntax::ast::Expr, body: &Stmt, env: &Environment, context: &mut Context, label: Option<&str>) -> JsResult<Completion> {
    let mut result = JsValue::Undefined;
    loop {
        if !expr::eval_expr(cond, env, context)?.to_boolean() {
            break;
        }
        match exec_stmt(body, env, context) {
            Ok(c) => {
                if let Some(outcome) = handle_loop_completion(c, label, &mut result) {
                    return outcome;
                }
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Completion::Normal(result))
}

fn exec_do_while(cond: &crate::syntax::ast::Expr, body: &Stmt, env: &Environment, context: &mut Context, label: Option<&str>) -> JsResult<Completion> {
    let mut result = JsValue::Undefined;
    loop {
        match exec_stmt(body, env, context) {
            Ok(c) => {
                if let Some(outcome) = handle_loop_completion(c, label, &mut result) {
                    return outcome;
                }
            }
            Err(e) => return Err(e),
        }
        if !expr::eval_expr(cond, env, context)?.to_boolean() {
            break;
        }
    }
    Ok(Completion::Normal(result))
}

#[allow(clippy::too_many_arguments)]
fn exec_for(
    init: &Option<Box<Stmt>>,
    cond: &Option<crate::syntax::ast::Expr>,
    update: &Option<crate::syntax::ast::Expr>,
    body: &Stmt,
    env: &Environment,
    context: &mut Context,
    label: Option<&str>,
) -> JsResult<Completion> {
    let loop_env = Environment::new_block_scope(env);
    if let Some(init_stmt) = init {
        super::hoist_block_lexical(std::slice::from_ref(init_stmt.as_ref()), &loop_env);
        exec_stmt(init_stmt, &loop_env, context)?;
    }
    let mut result = JsValue::Undefined;
    loop {
        if let Some(c) = cond {
            if !expr::eval_expr(c, &loop_env, context)?.to_boolean() {
                break;
            }
        }
        match exec_stmt(body, &loop_env, context) {
            Ok(c) => {
                if let Some(outcome) = handle_loop_completion(c, label, &mut result) {
                    return outcome;
                }
            }
            Err(e) => return Err(e),
        }
        if let Some(u) = update {
            expr::eval_expr(u, &loop_env, context)?;
        }
    }
    Ok(Completion::Normal(result))
}

fn close_and_return(record: &IteratorRecord, context: &mut Context, outcome: JsResult<Completion>) -> JsResult<Completion> {
    match outcome {
        Ok(Completion::Normal(v)) => iterator_close(record, context, Ok(v)).map(Completion::Normal),
        Ok(Completion::Return(v)) => iterator_close(record, context, Ok(v)).map(Completion::Return),
        Ok(Completion::Break(l)) => iterator_close(record, context, Ok(JsValue::Undefined)).map(|_| Completion::Break(l)),
        Ok(Completion::Continue(l)) => iterator_close(record, context, Ok(JsValue::Undefined)).map(|_| Completion::Continue(l)),
        Err(e) => {
            let _ = iterator_close(record, context, Err(e.clone()));
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn exec_for_of(
    kind: &DeclKind,
    binding: &str,
    iterable: &crate::syntax::ast::Expr,
    body: &Stmt,
    env: &Environment,
    context: &mut Context,
    label: Option<&str>,
) -> JsResult<Completion> {
    let iterable_val = expr::eval_expr(iterable, env, context)?;
    let mut record = crate::iterator::get_iterator(&iterable_val, context)?;
    let mut result = JsValue::Undefined;
    loop {
        let next = match iterator_step(&mut record, context) {
            Ok(Some(v)) => v,
            Ok(None) => break,
            Err(e) => return Err(e),
        };
        let loop_env = Environment::new_block_scope(env);
        loop_env.create_binding(binding, next, !matches!(kind, DeclKind::Const), true);
        match exec_stmt(body, &loop_env, context) {
            Ok(c) => {
                if let Some(outcome) = handle_loop_completion(c, label, &mut result) {
                    return close_and_return(&record, context, outcome);
                }
            }
            Err(e) => return close_and_return(&record, context, Err(e)),
        }
    }
    Ok(Completion::Normal(result))
}

#[allow(clippy::too_many_arguments)]
fn exec_for_in(
    kind: &DeclKind,
    binding: &str,
    object: &crate::syntax::ast::Expr,
    body: &Stmt,
    env: &Environment,
    context: &mut Context,
    label: Option<&str>,
) -> JsResult<Completion> {
    let obj_val = expr::eval_expr(object, env, context)?;
    if obj_val.is_null_or_undefined() {
        return Ok(Completion::Normal(JsValue::Undefined));
    }
    let start_obj = obj_val.to_object(context)?;

    // Snapshots the full enumerable-key walk up front (own keys on every
    // prototype in the chain, first occurrence of a name wins) rather than
    // re-querying existence on each visit — a simplification of §4.5's
    // `for-in` enumerator, adequate for this crate's non-mutating-during-
    // iteration test scenarios.
    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::new();
    let mut cur = Some(start_obj);
    while let Some(o) = cur {
        for key in o.enumerable_own_string_keys(context)? {
            let name = key.to_string();
            if seen.insert(name.clone()) {
                keys.push(name);
            }
        }
        cur = o.prototype();
    }

    let mut result = JsValue::Undefined;
    for name in keys {
        let loop_env = Environment::new_block_scope(env);
        loop_env.create_binding(binding, JsValue::from(name), !matches!(kind, DeclKind::Const), true);
        match exec_stmt(body, &loop_env, context) {
            Ok(c) => {
                if let Some(outcome) = handle_loop_completion(c, label, &mut result) {
                    return outcome;
                }
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Completion::Normal(result))
}

fn exec_simple_stmt(stmt: &Stmt, env: &Environment, context: &mut Context) -> JsResult<Completion> {
    match stmt {
        Stmt::Expr(e) => Ok(Completion::Normal(expr::eval_expr(e, env, context)?)),
        Stmt::VarDecl { kind, declarations } => {
            for (name, init) in declarations {
                match kind {
                    DeclKind::Var => {
                        if let Some(e) = init {
                            let v = expr::eval_expr(e, env, context)?;
                            env.set_binding(name, v, context)?;
                        }
                    }
                    DeclKind::Let | DeclKind::Const => {
                        let v = match init {
                            Some(e) => expr::eval_expr(e, env, context)?,
                            None => JsValue::Undefined,
                        };
                        env.initialize_binding(name, v);
                    }
                }
            }
            Ok(Completion::Normal(JsValue::Undefined))
        }
        Stmt::FunctionDecl(def) => {
            let name = def.name.clone().unwrap_or_default();
            if !env.has_own_binding(&name) {
                let func = expr::make_function_object(def, env, context);
                env.create_binding(&name, JsValue::Object(func), true, true);
            }
            Ok(Completion::Normal(JsValue::Undefined))
        }
        Stmt::Block(body) => {
            let block_env = Environment::new_block_scope(env);
            super::hoist_block_lexical(body, &block_env);
            execute_block(body, &block_env, context)
        }
        Stmt::If { cond, then_branch, else_branch } => {
            if expr::eval_expr(cond, env, context)?.to_boolean() {
                exec_stmt(then_branch, env, context)
            } else if let Some(e) = else_branch {
                exec_stmt(e, env, context)
            } else {
                Ok(Completion::Normal(JsValue::Undefined))
            }
        }
        Stmt::Return(opt) => {
            let v = match opt {
                Some(e) => expr::eval_expr(e, env, context)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::Return(v))
        }
        Stmt::Break(label) => Ok(Completion::Break(label.clone())),
        Stmt::Continue(label) => Ok(Completion::Continue(label.clone())),
        Stmt::Throw(e) => Err(expr::eval_expr(e, env, context)?),
        Stmt::Try { block, catch_param, catch_block, finally_block } => {
            exec_try(block, catch_param, catch_block, finally_block, env, context)
        }
        Stmt::Empty => Ok(Completion::Normal(JsValue::Undefined)),
        // Loop/label forms are handled by `exec_stmt_labeled` before reaching here.
        Stmt::Labeled { .. } | Stmt::While { .. } | Stmt::DoWhile { .. } | Stmt::For { .. } | Stmt::ForOf { .. } | Stmt::ForIn { .. } => {
            exec_stmt_labeled(stmt, env, context, None)
        }
    }
}

/// `try`/`catch`/`finally`, per §4.5: a `finally` block's own `Normal`
/// completion never overrides the try/catch outcome, but any abrupt
/// completion or thrown error from `finally` does (it wins outright).
fn exec_try(
    block: &[Stmt],
    catch_param: &Option<String>,
    catch_block: &Option<Vec<Stmt>>,
    finally_block: &Option<Vec<Stmt>>,
    env: &Environment,
    context: &mut Context,
) -> JsResult<Completion> {
    let try_env = Environment::new_block_scope(env);
    super::hoist_block_lexical(block, &try_env);
    let mut outcome = execute_block(block, &try_env, context);

    if let Err(thrown) = outcome {
        outcome = if let Some(catch_stmts) = catch_block {
            let catch_env = Environment::new_block_scope(env);
            if let Some(param) = catch_param {
                catch_env.create_binding(param, thrown, true, true);
            }
            super::hoist_block_lexical(catch_stmts, &catch_env);
            execute_block(catch_stmts, &catch_env, context)
        } else {
            Err(thrown)
        };
    }

    if let Some(finally_stmts) = finally_block {
        let finally_env = Environment::new_block_scope(env);
        super::hoist_block_lexical(finally_stmts, &finally_env);
        match execute_block(finally_stmts, &finally_env, context) {
            Ok(Completion::Normal(_)) => {}
            Ok(other) => outcome = Ok(other),
            Err(e) => outcome = Err(e),
        }
    }

    outcome
}
