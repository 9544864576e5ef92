//! CLI entrypoint for ffibind.

use clap::{Parser, Subcommand};
use ffibind_abi::{Binder, default_linker};

/// Dynamic native bindings from type-code signatures.
#[derive(Debug, Parser)]
#[command(name = "ffibind")]
#[command(about = "Bind and call native functions described by type codes")]
struct Cli {
    /// Symbol lookup order: auto, exports or loader (overrides FFIBIND_LINK_MODE).
    #[arg(long, global = true)]
    link_mode: Option<String>,
    /// Structured log destination: a file path or `stderr` (overrides FFIBIND_LOG).
    #[arg(long, global = true)]
    log: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current account name via a bound `Advapi32!GetUserName`.
    Whoami,
    /// Print the translated binding for a function as JSON.
    Describe {
        /// Library identifier (e.g. "Advapi32").
        #[arg(long)]
        library: String,
        /// Function name (e.g. "GetUserName").
        #[arg(long)]
        function: String,
        /// Parameter codes, one character each (e.g. "pp").
        #[arg(long, default_value = "")]
        params: String,
        /// Return code.
        #[arg(long, default_value = "v")]
        ret: String,
    },
    /// List in-process exports available to the linker as JSON.
    Exports,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    ffibind_harness::configure(cli.link_mode.as_deref(), cli.log.as_deref())?;

    let result = run(cli.command);
    ffibind_harness::finish();
    result
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Whoami => {
            if let Some(name) = ffibind_harness::whoami(&Binder::process())? {
                println!("{name}");
            }
        }
        Command::Describe {
            library,
            function,
            params,
            ret,
        } => {
            let report = ffibind_harness::describe(&library, &function, &params, &ret)
                .map_err(|e| format!("{e} (codes: {})", ffibind_harness::code_vocabulary()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Exports => {
            let report = ffibind_harness::exports_report(&default_linker());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
