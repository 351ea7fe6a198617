use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub puzzle: PathBuf,
    pub pieces: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
    /// `Some(0)` disables the per-piece timeout
    pub timeout_secs: Option<u64>,
    pub debug: bool,
}

#[derive(Debug, PartialEq)]
pub enum Parsed {
    Run(Args),
    Help,
    Version,
}

impl Args {
    /// Parse the process arguments. Returns `None` when the program should
    /// exit without doing any work (help, version or a usage error).
    pub fn parse() -> Option<Self> {
        match Self::parse_from(env::args().skip(1)) {
            Ok(Parsed::Run(args)) => Some(args),
            Ok(Parsed::Help) => {
                print_help();
                None
            }
            Ok(Parsed::Version) => {
                println!(
                    "Puzzle Locator v{} (built {})",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                None
            }
            Err(message) => {
                eprintln!("❌ {message}");
                print_help();
                None
            }
        }
    }

    pub fn parse_from<I>(args: I) -> Result<Parsed, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut puzzle: Option<PathBuf> = None;
        let mut pieces = Vec::new();
        let mut out_dir: Option<PathBuf> = None;
        let mut timeout_secs: Option<u64> = None;
        let mut debug = false;

        for arg in args {
            if arg == "--help" || arg == "-h" {
                return Ok(Parsed::Help);
            } else if arg == "--version" || arg == "-v" {
                return Ok(Parsed::Version);
            } else if arg == "--debug" {
                debug = true;
            } else if let Some(val) = arg.strip_prefix("--puzzle=") {
                puzzle = Some(non_empty_path("--puzzle", val)?);
            } else if let Some(val) = arg.strip_prefix("--piece=") {
                pieces.push(non_empty_path("--piece", val)?);
            } else if let Some(val) = arg.strip_prefix("--out=") {
                out_dir = Some(non_empty_path("--out", val)?);
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                match val.parse::<u64>() {
                    Ok(secs) => timeout_secs = Some(secs),
                    Err(_) => return Err(format!("Invalid timeout value: {val}")),
                }
            } else {
                return Err(format!("Unknown argument: {arg}"));
            }
        }

        let puzzle = puzzle.ok_or_else(|| "Missing required --puzzle=<file>".to_string())?;
        Ok(Parsed::Run(Args {
            puzzle,
            pieces,
            out_dir,
            timeout_secs,
            debug,
        }))
    }
}

fn non_empty_path(flag: &str, value: &str) -> Result<PathBuf, String> {
    if value.is_empty() {
        Err(format!("{flag} needs a file path"))
    } else {
        Ok(PathBuf::from(value))
    }
}

fn print_help() {
    println!("🧩 Puzzle Locator");
    println!();
    println!("USAGE:");
    println!("    puzzle-locator --puzzle=<file> [--piece=<file>]... [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --puzzle=<file>     Reference puzzle image (PNG or JPEG)");
    println!("    --piece=<file>      Piece photo to locate, may be repeated");
    println!("    --out=<dir>         Write the annotated puzzle for each located piece");
    println!("    --timeout=N         Give up on a piece after N seconds (0 = never, default 30)");
    println!("    --debug             Enable debug logging and correlation progress");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    puzzle-locator --puzzle=box.jpg --piece=piece.jpg");
    println!("    puzzle-locator --puzzle=box.jpg --piece=a.jpg --piece=b.jpg --out=found");
    println!("    puzzle-locator --puzzle=box.jpg --piece=a.jpg --debug --timeout=0");
}
