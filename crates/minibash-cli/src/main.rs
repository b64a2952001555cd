//! minibash command-line front-end.
//!
//! Decides where the script text comes from (a `-c` string, a file,
//! interactive lines, or stdin) and hands it to the interpreter. The
//! process exit status is the last statement's exit status.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use minibash_interpreter::{signals, Interpreter};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "minibash> ";

#[derive(Parser)]
#[command(name = "minibash", about = "An interpreter for a practical subset of the POSIX shell")]
struct Cli {
    /// Execute this string instead of reading a script
    #[arg(short = 'c', long = "command", value_name = "STRING")]
    command: Option<String>,

    /// Script file to execute
    #[arg(value_name = "script")]
    script: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(status) => process::exit(status),
        Err(err) => {
            eprintln!("minibash: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    signals::install_sigchld_handler().context("could not install the SIGCHLD handler")?;
    let mut interpreter = Interpreter::new().context("could not initialize the interpreter")?;

    if let Some(command) = &cli.command {
        return Ok(interpreter.run_script(command)?);
    }
    if let Some(path) = &cli.script {
        let script = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        return Ok(interpreter.run_script(&script)?);
    }
    if nix::unistd::isatty(0).unwrap_or(false) {
        return repl(&mut interpreter);
    }

    let mut script = String::new();
    std::io::stdin()
        .read_to_string(&mut script)
        .context("could not read standard input")?;
    Ok(interpreter.run_script(&script)?)
}

/// Interactive loop: each line is evaluated as a complete script.
/// Script-level failures only update `$?`; the loop runs until EOF.
fn repl(interpreter: &mut Interpreter) -> anyhow::Result<i32> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if let Err(err) = interpreter.run_script(&line) {
                    eprintln!("minibash: {err}");
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(interpreter.last_status())
}
