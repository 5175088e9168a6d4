//! cellargen CLI
//!
//! Usage:
//!   cellargen [OPTIONS] <MODULE>
//!
//! Options:
//!   -I, --include <DIR>    Search directory for module and include files (repeatable)
//!   -c, --config <FILE>    Generator configuration (TOML format)
//!   -o, --out-dir <DIR>    Directory for the generated files
//!   -t, --templates <DIR>  Directory with <Name>.tpl template overrides
//!   --stdout               Print the generated text instead of writing files
//!   -v, --verbose          Debug logging
//!   -h, --help             Print help

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cellargen::{generate_module, GeneratorConfig, Reporter};

#[derive(Parser)]
#[command(name = "cellargen")]
#[command(about = "Generate SQL schema scripts and header constants from CellarModule XML")]
struct Cli {
    /// Module name (`Foo` reads `Foo.xml`) or path to a `.xml` file
    module: String,

    /// Search directory for module and include files; searched before the
    /// configured search path, in the order given
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Generator configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the generated files
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Directory with `<Name>.tpl` template overrides
    #[arg(short, long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Print the generated text instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => match GeneratorConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => GeneratorConfig::default(),
    };
    for dir in cli.include.iter().rev() {
        config = config.with_search_dir_first(dir);
    }
    if let Some(dir) = &cli.out_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(dir) = &cli.templates {
        config = config.with_template_dir(dir);
    }

    let mut reporter = Reporter::new();
    let generation = generate_module(&cli.module, &config, &mut reporter);
    eprint!("{}", reporter.render());

    let Some(generation) = generation else {
        return ExitCode::FAILURE;
    };

    if cli.stdout {
        for (name, text) in generation.files() {
            println!("-- {name}");
            print!("{text}");
        }
    } else {
        match generation.write_to(&config.output_dir) {
            Ok(written) => {
                for path in written {
                    tracing::info!(path = %path.display(), "wrote");
                }
            }
            Err(e) => {
                eprintln!(
                    "Error writing output to '{}': {}",
                    config.output_dir.display(),
                    e
                );
                return ExitCode::FAILURE;
            }
        }
    }

    if reporter.has_errors() {
        eprintln!("{} error(s)", reporter.error_count());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
