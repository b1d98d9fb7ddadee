//! The interactive REPL: `>> ` prompts, evaluated with a single persistent
//! [`Context`] so `let`/`const` bindings accumulate across lines, plus the
//! `.help`/`.quit`/`.clear`/`.tokens`/`.ast` dot-commands named in §6.

use std::process::ExitCode;

use rustyline::error::ReadlineError;
use rustyline::Editor;
use vela_engine::context::Context;
use vela_engine::syntax::{lexer, parser};

const PROMPT: &str = ">> ";

pub(crate) fn run_repl() -> ExitCode {
    let mut editor = match Editor::<()>::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("failed to start line editor: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut context = Context::new();

    println!("vela REPL. Type .help for commands.");
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line);
                if let Some(command) = line.strip_prefix('.') {
                    if handle_command(command, &mut context) {
                        return ExitCode::SUCCESS;
                    }
                    continue;
                }
                match vela_engine::forward_val(&mut context, line) {
                    Ok(v) if v.is_undefined() => {}
                    Ok(v) => println!("{}", v.to_js_string(&mut context).map(|s| s.to_string()).unwrap_or_else(|_| "undefined".to_string())),
                    Err(e) => eprintln!("Uncaught {}", context.stringify_thrown(&e)),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("readline error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
}

/// Handles a `.command [rest]` line. Returns `true` if the REPL should exit.
fn handle_command(command: &str, context: &mut Context) -> bool {
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "help" => {
            println!(".help             show this message");
            println!(".quit             exit the REPL");
            println!(".clear            start a fresh context, discarding all bindings");
            println!(".tokens <expr>    print the lexed token stream for <expr>");
            println!(".ast <expr>       print the parsed AST for <expr>");
        }
        "quit" => return true,
        "clear" => {
            *context = Context::new();
            println!("context cleared");
        }
        "tokens" => match lexer::lex(rest) {
            Ok(tokens) => println!("{tokens:#?}"),
            Err(e) => eprintln!("SyntaxError: {e}"),
        },
        "ast" => match lexer::lex(rest) {
            Ok(tokens) => match parser::Parser::new(tokens).parse_program() {
                Ok(program) => println!("{program:#?}"),
                Err(e) => eprintln!("SyntaxError: {e}"),
            },
            Err(e) => eprintln!("SyntaxError: {e}"),
        },
        other => eprintln!("unknown command '.{other}' (try .help)"),
    }
    false
}
