//! CLI entry point for kryptr

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};
use log::LevelFilter;

use kryptr::cipher::{DEFAULT_KEY, DEFAULT_ROUNDS};
use kryptr::tree::DEFAULT_MAX_PARALLEL_FILES;
use kryptr::{
    Job, Operation, RunSummary, TreeWalker, WalkerConfig, print_summary, print_summary_json,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Compression algorithms
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompAlg {
    /// Huffman coding
    Huff,
}

/// Encryption algorithms
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncAlg {
    /// Multi-round repeating-key XOR
    Xor,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            // Respect FORCE_COLOR environment variable
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            // Respect TERM=dumb
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kryptr")]
#[command(about = "Compress, decompress, encrypt and decrypt files or whole directory trees")]
#[command(version)]
struct Args {
    /// Input file or directory
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    input: PathBuf,

    /// Output file or directory (a trailing '/' creates the directory)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Compress with Huffman coding
    #[arg(short = 'c', long = "compress")]
    compress: bool,

    /// Decompress files produced by -c
    #[arg(short = 'd', long = "decompress")]
    decompress: bool,

    /// Encrypt with the XOR cipher
    #[arg(short = 'e', long = "encrypt")]
    encrypt: bool,

    /// Decrypt files produced by -e
    #[arg(short = 'u', long = "decrypt")]
    decrypt: bool,

    /// Compression algorithm (implies -c)
    #[arg(long = "comp-alg", value_name = "ALG")]
    comp_alg: Option<CompAlg>,

    /// Encryption algorithm (implies -e)
    #[arg(long = "enc-alg", value_name = "ALG")]
    enc_alg: Option<EncAlg>,

    /// Cipher key
    #[arg(long = "key", default_value = DEFAULT_KEY)]
    key: String,

    /// Cipher rounds
    #[arg(long = "rounds", default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Maximum number of files processed at once
    /// (0 = auto-detect, one per core)
    #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_MAX_PARALLEL_FILES)]
    jobs: usize,

    /// Skip entries matching pattern (can be used multiple times)
    #[arg(short = 'I', long = "ignore")]
    ignore: Vec<String>,

    /// Print the run summary as JSON
    #[arg(long = "json")]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

impl Args {
    /// Operations selected by flags, in no particular order.
    fn operations(&self) -> Vec<Operation> {
        let mut operations = Vec::new();
        if self.compress || self.comp_alg.is_some() {
            operations.push(Operation::Compress);
        }
        if self.decompress {
            operations.push(Operation::Decompress);
        }
        if self.encrypt || self.enc_alg.is_some() {
            operations.push(Operation::Encrypt);
        }
        if self.decrypt {
            operations.push(Operation::Decrypt);
        }
        operations
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn build_job(args: &Args) -> kryptr::Result<Job> {
    let mut job = Job::new(args.operations())?
        .with_key(args.key.as_bytes())?
        .with_rounds(args.rounds);
    if let Some(output) = &args.output {
        job = job.with_output(output);
    }
    Ok(job)
}

fn main() {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| {
        eprintln!("kryptr: argument parsing error: {}", e);
        process::exit(1);
    });

    init_logging(args.verbose, args.quiet);
    let use_color = should_use_color(args.color);

    let job = build_job(&args).unwrap_or_else(|e| {
        eprintln!("kryptr: {}", e);
        process::exit(1);
    });

    let metadata = fs::metadata(&args.input).unwrap_or_else(|e| {
        eprintln!("kryptr: cannot access {}: {}", args.input.display(), e);
        process::exit(1);
    });

    let start = Instant::now();
    let summary = if metadata.is_dir() {
        let config = WalkerConfig {
            max_parallel_files: args.jobs,
            ignore_patterns: args.ignore.clone(),
        };
        let walked = TreeWalker::new(config)
            .and_then(|walker| walker.process_tree(&args.input, |path| job.run(path)));
        match walked {
            Ok(walk) => RunSummary::from_walk(walk, start.elapsed()),
            Err(e) => {
                eprintln!("kryptr: {}", e);
                process::exit(1);
            }
        }
    } else {
        RunSummary::from_file(&args.input, job.run(&args.input), start.elapsed())
    };

    let printed = if args.json {
        print_summary_json(&summary)
    } else {
        print_summary(&summary, use_color)
    };
    if let Err(e) = printed {
        eprintln!("kryptr: error writing output: {}", e);
        process::exit(1);
    }

    if !summary.is_success() {
        process::exit(1);
    }
}
