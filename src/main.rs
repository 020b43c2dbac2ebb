use std::{fs, io::Write, process::ExitCode};

use clap::Parser;
use ecru::{CompileOptions, compile_with};
use tracing_subscriber::EnvFilter;

/// ecru is a small statically typed language with exact arithmetic over
/// naturals, integers, fractions and residues.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells ecru to read the program from a file instead of the argument.
    #[arg(short, long)]
    file: bool,

    /// Prints the canonical parse tree before running the program.
    #[arg(short, long)]
    tree: bool,

    /// Deepest allowed nesting of user function calls.
    #[arg(long, default_value_t = CompileOptions::default().max_call_depth)]
    max_depth: usize,

    contents: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                                                  EnvFilter::new("warn")
                                              }))
                             .with_writer(std::io::stderr)
                             .init();

    let args = Args::parse();

    let script = if args.file {
        match fs::read_to_string(&args.contents) {
            Ok(script) => script,
            Err(_) => {
                eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                          &args.contents);
                return ExitCode::FAILURE;
            },
        }
    } else {
        args.contents
    };

    let options = CompileOptions { max_call_depth: args.max_depth,
                                   ..CompileOptions::default() };
    let output = compile_with(&script, &options);

    if args.tree {
        println!("{}", output.parse_tree);
    }
    print!("{}", output.buffer.stdout);
    let _ = std::io::stdout().flush();

    match (output.error_msg, output.error_stack) {
        (Some(message), stack) => {
            eprintln!("{message}");
            if let Some(stack) = stack {
                eprintln!("{stack}");
            }
            ExitCode::FAILURE
        },
        (None, _) => ExitCode::SUCCESS,
    }
}
