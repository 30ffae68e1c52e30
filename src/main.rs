// ========================================================================================
//
//                            THE TRANSPORT SHELL: MENDEL
//
// ========================================================================================
//
// This binary is the thin JSON boundary around the inference library. It owns no
// probability logic of its own: it parses one structured risk request, hands it to the
// engine, and prints the structured result. All numeric work lives in the library so
// the same engine can sit behind any transport.
//
// Input is a JSON `RiskRequest`, read from a file when `--input` is given and from
// stdin otherwise. Output is the pretty-printed `RiskResult` on stdout; anything that
// goes wrong is reported on stderr with a non-zero exit.

use clap::{Parser, Subcommand};
use mendel::model::{self, RiskRequest};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[clap(
    name = "mendel",
    version,
    about = "A Bayesian engine for Mendelian inheritance risk estimation."
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one risk request and print the result as JSON.
    Evaluate {
        /// Path to a JSON request file; reads stdin when omitted.
        #[clap(long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Evaluate { input } => {
            let raw = match read_request(input.as_deref()) {
                Ok(raw) => raw,
                Err(e) => {
                    eprintln!("Error reading request: {}", e);
                    process::exit(1);
                }
            };

            let request: RiskRequest = match serde_json::from_str(&raw) {
                Ok(request) => request,
                Err(e) => {
                    eprintln!("Error parsing request: {}", e);
                    process::exit(1);
                }
            };

            let result = match model::evaluate(&request) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };

            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing result: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}

fn read_request(input: Option<&Path>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}
