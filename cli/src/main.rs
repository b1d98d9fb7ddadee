#![deny(
    unused_qualifications,
    clippy::all,
    unused_import_braces,
    unused_lifetimes,
    unreachable_pub,
    trivial_numeric_casts,
    missing_debug_implementations,
    deprecated_in_future,
    non_ascii_idents,
    rust_2018_compatibility,
    rust_2018_idioms,
    future_incompatible,
    nonstandard_style
)]
#![warn(clippy::perf, clippy::single_match_else, clippy::dbg_macro)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod helper;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use structopt::StructOpt;
use vela_engine::context::Context;
use vela_engine::syntax::{lexer, parser};

/// Developer debugging dump format for `--dump-tokens`/`--dump-ast`,
/// carried over from the reference CLI's own dump-format option (§10.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpFormat {
    Debug,
    Json,
    JsonPretty,
}

impl std::str::FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(DumpFormat::Debug),
            "json" => Ok(DumpFormat::Json),
            "json-pretty" => Ok(DumpFormat::JsonPretty),
            other => Err(format!("unknown dump format '{other}' (expected debug|json|json-pretty)")),
        }
    }
}

/// Command-line driver for the vela JavaScript engine: evaluate a source
/// string, run a script file, or drop into an interactive REPL, per §6's
/// CLI surface.
#[derive(Debug, StructOpt)]
#[structopt(name = "vela", about = "An embeddable JavaScript execution engine")]
struct Opt {
    /// Evaluate the given source string instead of reading a file.
    #[structopt(short = "c", long = "command", value_name = "SOURCE")]
    command: Option<String>,

    /// Print the lexed token stream instead of evaluating.
    #[structopt(long = "dump-tokens", value_name = "FORMAT")]
    dump_tokens: Option<DumpFormat>,

    /// Print the parsed AST instead of evaluating.
    #[structopt(long = "dump-ast", value_name = "FORMAT")]
    dump_ast: Option<DumpFormat>,

    /// Evaluate the source as strict-mode code.
    #[structopt(long = "strict")]
    strict: bool,

    /// The script file to evaluate.
    #[structopt(name = "FILE", parse(from_os_str))]
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let opt = Opt::from_args();

    let source = if let Some(source) = &opt.command {
        Some(source.clone())
    } else if let Some(path) = &opt.file {
        match fs::read_to_string(path) {
            Ok(s) => Some(s),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let Some(source) = source else {
        return helper::run_repl();
    };

    if let Some(format) = opt.dump_tokens {
        return dump_tokens(&source, format);
    }
    if let Some(format) = opt.dump_ast {
        return dump_ast(&source, format);
    }

    if let Some(path) = &opt.file {
        if looks_like_module(&source) {
            eprintln!("{}: ES modules (import/export) are not supported by this build", path.display());
            return ExitCode::FAILURE;
        }
    }

    let mut context = Context::new();
    context.set_strict(opt.strict);
    run_source(&mut context, &source)
}

/// Renders `tokens`/`program` per the requested [`DumpFormat`]. There is no
/// `Serialize` impl on the AST (§6's persisted-state rule keeps it
/// non-serializable), so `Json`/`JsonPretty` fall back to the same `{:#?}`
/// rendering as `Debug` — good enough for a developer-facing dump flag, not
/// a stable wire format.
fn render<T: std::fmt::Debug>(value: &T, format: DumpFormat) -> String {
    match format {
        DumpFormat::Debug => format!("{value:?}"),
        DumpFormat::Json | DumpFormat::JsonPretty => format!("{value:#?}"),
    }
}

fn dump_tokens(src: &str, format: DumpFormat) -> ExitCode {
    match lexer::lex(src) {
        Ok(tokens) => {
            println!("{}", render(&tokens, format));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("SyntaxError: {e}");
            ExitCode::FAILURE
        }
    }
}

fn dump_ast(src: &str, format: DumpFormat) -> ExitCode {
    match lexer::lex(src).and_then(|tokens| parser::Parser::new(tokens).parse_program().map_err(Into::into)) {
        Ok(program) => {
            println!("{}", render(&program, format));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("SyntaxError: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `true` iff the first statement-starting token of `src` is `import` or
/// `export` — the module-vs-script dispatch §6 names, without implementing
/// a module loader (out of scope — no `import`/`export` grammar exists).
fn looks_like_module(src: &str) -> bool {
    let Ok(tokens) = lexer::lex(src) else { return false };
    matches!(tokens.first(), Some(lexer::Token::Keyword("import" | "export")))
}

/// Evaluates `src` against `context`, printing the completion value (unless
/// `undefined`) or the thrown error, per §6's exit-code contract.
fn run_source(context: &mut Context, src: &str) -> ExitCode {
    match vela_engine::forward_val(context, src) {
        Ok(v) if v.is_undefined() => ExitCode::SUCCESS,
        Ok(v) => {
            println!("{}", v.to_js_string(context).map(|s| s.to_string()).unwrap_or_else(|_| "undefined".to_string()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Uncaught {}", context.stringify_thrown(&e));
            ExitCode::FAILURE
        }
    }
}
