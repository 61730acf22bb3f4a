use clap::Parser;
use gclisp::interp::{Interp, TestOutcome};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::PathBuf;

/// Garbage-collected Lisp interpreter
#[derive(Parser, Debug)]
#[command(name = "gclisp")]
#[command(version)]
#[command(about = "A small mark-and-sweep garbage-collected Lisp interpreter")]
struct CliArgs {
    /// Script files to evaluate in order; files ending in _test.lisp are
    /// run through the test runner. No files starts the REPL.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let mut interp = Interp::new();

    if args.files.is_empty() {
        repl(&mut interp)?;
        return Ok(());
    }

    let mut tests = TestOutcome::default();
    for path in &args.files {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

        let root = interp.root;
        if is_test_file(path) {
            let name = path.display().to_string();
            let outcome = interp.run_tests(root, &name, &source);
            tests.passed += outcome.passed;
            tests.failed += outcome.failed;
        } else {
            interp.exec(root, &source);
        }
    }

    if tests.passed + tests.failed > 0 {
        println!("{} passed, {} failed", tests.passed, tests.failed);
    }
    if tests.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn is_test_file(path: &PathBuf) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.lisp"))
}

/// Read a line, hand it to EXEC, repeat. The literal line (exit) leaves.
fn repl(interp: &mut Interp) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config)
        .map_err(|e| format!("failed to initialize REPL: {}", e))?;

    let history_file = ".gclisp_history";
    let _ = rl.load_history(history_file);

    println!("gclisp {} - type (exit) to leave", env!("CARGO_PKG_VERSION"));

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "(exit)" {
                    break;
                }
                let root = interp.root;
                interp.exec(root, &line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
