//! The tree-walking evaluator driving the core through the AST in
//! [`crate::syntax::ast`]. Per this crate's scoping note (§1), the grammar
//! it walks is intentionally thin — just enough to exercise every core
//! operation end-to-end — but every statement/expression form the parser
//! produces is evaluated here, not stubbed.

mod expr;
mod stmt;

pub use expr::eval_expr;
pub use stmt::{execute_block, exec_stmt};

use crate::environment::Environment;
use crate::syntax::ast::{DeclKind, FunctionDef, Program, Stmt};
use crate::value::JsValue;

/// The result of running a statement list: either it ran to completion
/// carrying a value (the last expression statement's value, mirroring a
/// script's completion value), or it unwound via `return`/`break`/
/// `continue`, per §4.5's out-of-band control signals — modeled here as an
/// explicit return value rather than mutable `Context` fields, since Rust's
/// `Result`/enum idiom expresses exactly the same unwind-and-check protocol
/// without a side channel (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Break(Option<String>),
    Continue(Option<String>),
}

impl Completion {
    fn value(&self) -> JsValue {
        match self {
            Completion::Normal(v) | Completion::Return(v) => v.clone(),
            Completion::Break(_) | Completion::Continue(_) => JsValue::Undefined,
        }
    }
}

/// Recursively hoists `var` declarations and function declarations found
/// anywhere in `stmts` (but not inside nested function bodies) into `env`,
/// then declares every *top-level* `let`/`const` in `stmts` as an
/// uninitialized (TDZ) binding directly in `env`. Called once per
/// function/global entry — the "hoisting is performed by the evaluator
/// before execution of a function body or program" step of §4.4.
pub fn hoist_declarations(stmts: &[Stmt], env: &Environment, context: &mut crate::Context) {
    hoist_vars_and_functions(stmts, env, context, true);
    hoist_lexical(stmts, env);
}

/// Declares the top-level `let`/`const` of a freshly entered block scope,
/// without touching `var` (already hoisted to the enclosing function/global
/// scope). Function declarations nested in a block are left to be bound the
/// ordinary way when `stmt::exec_stmt` reaches them (a deliberate
/// simplification of the block-scoped-function-hoisting rule a full
/// grammar would apply).
pub fn hoist_block_lexical(stmts: &[Stmt], env: &Environment) {
    hoist_lexical(stmts, env);
}

fn hoist_lexical(stmts: &[Stmt], env: &Environment) {
    for stmt in stmts {
        if let Stmt::VarDecl { kind: DeclKind::Let | DeclKind::Const, declarations } = stmt {
            let mutable = matches!(stmt, Stmt::VarDecl { kind: DeclKind::Let, .. });
            for (name, _) in declarations {
                env.create_uninitialized_binding(name, mutable);
            }
        }
    }
}

fn hoist_vars_and_functions(stmts: &[Stmt], env: &Environment, context: &mut crate::Context, declare_functions: bool) {
    for stmt in stmts {
        match stmt {
            Stmt::VarDecl { kind: DeclKind::Var, declarations } => {
                for (name, _) in declarations {
                    if !env.has_own_binding(name) {
                        env.create_binding(name, JsValue::Undefined, true, true);
                    }
                }
            }
            Stmt::FunctionDecl(def) => {
                if declare_functions {
                    bind_function_declaration(def, env, context);
                }
            }
            Stmt::Block(body) => hoist_vars_and_functions(body, env, context, false),
            Stmt::If { then_branch, else_branch, .. } => {
                hoist_vars_and_functions(std::slice::from_ref(then_branch.as_ref()), env, context, false);
                if let Some(e) = else_branch {
                    hoist_vars_and_functions(std::slice::from_ref(e.as_ref()), env, context, false);
                }
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::Labeled { body, .. } => {
                hoist_vars_and_functions(std::slice::from_ref(body.as_ref()), env, context, false);
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    hoist_vars_and_functions(std::slice::from_ref(init.as_ref()), env, context, false);
                }
                hoist_vars_and_functions(std::slice::from_ref(body.as_ref()), env, context, false);
            }
            Stmt::ForOf { kind, binding, body, .. } | Stmt::ForIn { kind, binding, body, .. } => {
                if matches!(kind, DeclKind::Var) && !env.has_own_binding(binding) {
                    env.create_binding(binding, JsValue::Undefined, true, true);
                }
                hoist_vars_and_functions(std::slice::from_ref(body.as_ref()), env, context, false);
            }
            Stmt::Try { block, catch_block, finally_block, .. } => {
                hoist_vars_and_functions(block, env, context, false);
                if let Some(b) = catch_block {
                    hoist_vars_and_functions(b, env, context, false);
                }
                if let Some(b) = finally_block {
                    hoist_vars_and_functions(b, env, context, false);
                }
            }
            _ => {}
        }
    }
}

fn bind_function_declaration(def: &std::rc::Rc<FunctionDef>, env: &Environment, context: &mut crate::Context) {
    let func = expr::make_function_object(def, env, context);
    let name = def.name.clone().unwrap_or_default();
    env.create_binding(&name, JsValue::Object(func), true, true);
}

/// `engine -c`/file evaluation entry point shared with the CLI: parses and
/// runs `program` as a standalone script in a brand-new [`crate::Context`].
pub fn run_script(program: &Program, context: &mut crate::Context) -> crate::JsResult<JsValue> {
    context.eval_program(program)
}
