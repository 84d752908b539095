use clap::Parser;
use std::io::Read;

use just_awk::{parse, ParseResult};

#[derive(Parser)]
#[command(name = "just-awk")]
#[command(about = "Parse AWK programs into a syntax tree")]
#[command(version)]
struct Cli {
    /// Parse the program text given on the command line
    #[arg(short = 'c')]
    program: Option<String>,

    /// Output the tree and diagnostics as JSON
    #[arg(long = "json")]
    json: bool,

    /// Program file to parse
    #[arg()]
    program_file: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    // Determine program source: -c, file, or stdin
    let source = if let Some(text) = cli.program {
        text
    } else if let Some(ref file) = cli.program_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: cannot read program file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!(
                "Error: no program provided. Use -c 'prog', provide a file, or pipe via stdin."
            );
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let ParseResult {
        program,
        diagnostics,
    } = parse(&source);

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "tree": program, "diagnostics": diagnostics })
        );
    } else {
        println!("{}", program.to_sexp());
        for diagnostic in &diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    if !diagnostics.is_empty() {
        std::process::exit(1);
    }
}
