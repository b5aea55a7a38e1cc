//! Command-line adapter (§6 CLI surface). Thin wrapper over the public
//! API: argument parsing, file I/O, and exit codes live here, not in
//! the core pipeline.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::{repair_to_string, Options};

#[derive(Parser, Debug)]
#[command(name = "jsonrepair", about = "Repair malformed JSON from stdin, a file, or in place")]
pub struct Cli {
    /// Input file; reads stdin when omitted.
    pub input: Option<PathBuf>,

    /// Rewrite the input file in place. Requires a file argument.
    #[arg(short, long)]
    pub inline: bool,

    /// Write output to this path instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Indentation width for the repaired JSON.
    #[arg(long, default_value_t = 2)]
    pub indent: usize,
}

pub fn run(cli: Cli) -> ExitCode {
    if cli.inline && cli.input.is_none() {
        eprintln!("error: --inline requires a file argument");
        return ExitCode::from(1);
    }

    let input_text = match read_input(&cli) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let repaired = match repair_to_string(&input_text, &Options::default()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    let pretty = match pretty_print(&repaired, cli.indent) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    match write_output(&cli, &pretty) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn read_input(cli: &Cli) -> std::io::Result<String> {
    match &cli.input {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn pretty_print(json_text: &str, indent: usize) -> serde_json::Result<String> {
    let value: serde_json::Value = serde_json::from_str(json_text)?;
    let indent_bytes = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(&value, &mut ser)?;
    Ok(String::from_utf8(buf).expect("serde_json output is always valid UTF-8"))
}

fn write_output(cli: &Cli, text: &str) -> std::io::Result<()> {
    if cli.inline {
        let path = cli.input.as_ref().expect("checked by caller");
        std::fs::write(path, text)
    } else if let Some(path) = &cli.output {
        std::fs::write(path, text)
    } else {
        std::io::stdout().write_all(text.as_bytes())
    }
}
