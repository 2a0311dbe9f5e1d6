//! Command-line front end: list or export a disassembly without the
//! interactive UI.

use clap::{ArgAction, Parser};
use idis::{format_line, Architecture, DisassemblyEngine, EngineConfig};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "idis",
    about = "Disassemble CDP1802 or i8080 images using saved annotations."
)]
struct Args {
    /// Raw binary or Intel HEX (.hex) image.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// CPU architecture of the image.
    #[arg(long, value_enum, default_value_t = Architecture::Cdp1802)]
    arch: Architecture,

    /// Load address in hex (overridden by an `offset` in FILE.cfg).
    #[arg(long, value_parser = parse_hex)]
    origin: Option<u32>,

    /// Write FILE.asm instead of printing the listing.
    #[arg(long)]
    export: bool,

    /// Start address (hex) or label name for the listing.
    #[arg(long, value_name = "ADDR")]
    from: Option<String>,

    /// Maximum number of lines to print (default: to end of image).
    #[arg(long)]
    lines: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex address '{}': {}", s, e))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("logger: {}", err);
    }

    let mut engine = DisassemblyEngine::open(
        &args.file,
        EngineConfig {
            arch: args.arch,
            origin: args.origin,
        },
    );
    let mut ok = engine.size() > 0;

    if ok && args.export {
        match engine.source_export() {
            Ok(path) => println!("{}", path.display()),
            Err(_) => ok = false,
        }
    } else if ok {
        let start = match &args.from {
            Some(text) => engine.jump_target(text).ok(),
            None => Some(engine.origin()),
        };
        match start {
            Some(start) => {
                let limit = args.lines.unwrap_or(usize::MAX);
                for line in engine.lines(start).take(limit) {
                    println!("{}", format_line(&line));
                }
            }
            None => ok = false,
        }
    }

    eprintln!("{}", engine.status_line());
    if let Some(status) = engine.take_status() {
        eprintln!("{}", status);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
