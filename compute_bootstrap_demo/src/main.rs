//! Compute bootstrap demo
//!
//! Selects an adapter, creates a device, compiles and signs a WGSL compute
//! shader, and builds a compute pipeline against a root signature blob. The
//! process exit code names the stage that failed.

use clap::{Parser, ValueEnum};
use compute_bootstrap::bootstrap::compiler::{CompileRequest, Define};
use compute_bootstrap::bootstrap::log::{self, DefaultLogger, LogEntry, LogSeverity, Logger};
use compute_bootstrap::bootstrap::{Config, DebugOutput, DebugSeverity, Error, RunReport, Session};
use compute_bootstrap::{boot_error, boot_info, boot_warn};
use compute_bootstrap_vulkan::{NagaRuntime, VulkanDriver};
use std::path::PathBuf;

const SOURCE: &str = "demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SeverityArg {
    Errors,
    Warnings,
    All,
}

impl From<SeverityArg> for DebugSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Errors => DebugSeverity::ErrorsOnly,
            SeverityArg::Warnings => DebugSeverity::ErrorsAndWarnings,
            SeverityArg::All => DebugSeverity::All,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "compute_bootstrap_demo")]
#[command(version, about = "Bootstrap a GPU compute pipeline from a WGSL shader", long_about = None)]
struct Cli {
    /// Bind this adapter index instead of probing for a capable one
    #[arg(short, long)]
    adapter: Option<u32>,

    /// Shader source to compile
    #[arg(long, default_value = "shaders/ComputeShader.wgsl")]
    source: PathBuf,

    /// Skip compiling from source (requires --precompiled)
    #[arg(long)]
    no_compile: bool,

    /// Entry-point symbol
    #[arg(short, long, default_value = "main")]
    entry: String,

    /// Target profile (cs_1_0 to cs_1_6)
    #[arg(short, long, default_value = "cs_1_3")]
    profile: String,

    /// Macro definition, NAME or NAME=VALUE (repeatable)
    #[arg(short = 'D', long = "define", value_parser = parse_define)]
    defines: Vec<Define>,

    /// Compiler flag replacing the defaults, e.g. --flag=-Zi (repeatable)
    #[arg(long = "flag", allow_hyphen_values = true)]
    flags: Vec<String>,

    /// Extra include search directory (repeatable)
    #[arg(short = 'I', long = "include")]
    include_paths: Vec<PathBuf>,

    /// Precompiled shader container to validate and sign
    #[arg(long)]
    precompiled: Option<PathBuf>,

    /// Root signature blob
    #[arg(short, long, default_value = "shaders/RootSignature.rsig")]
    root_signature: PathBuf,

    /// Force the validation layer on
    #[arg(long, conflicts_with = "no_validation")]
    validation: bool,

    /// Force the validation layer off
    #[arg(long)]
    no_validation: bool,

    /// Driver messages echoed while they are stored
    #[arg(long, value_enum, default_value_t = SeverityArg::Warnings)]
    debug_severity: SeverityArg,

    /// Also append driver messages to this file
    #[arg(long)]
    debug_log: Option<String>,

    /// Print the disassembly of the container the pipeline was built from
    #[arg(long)]
    disassemble: bool,

    /// Show debug and trace logs
    #[arg(short, long)]
    verbose: bool,
}

fn parse_define(text: &str) -> Result<Define, String> {
    Define::parse(text).ok_or_else(|| format!("invalid macro definition '{}'", text))
}

/// Default logger behind a severity threshold
struct ThresholdLogger {
    min_severity: LogSeverity,
}

impl Logger for ThresholdLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.severity >= self.min_severity {
            DefaultLogger.log(entry);
        }
    }
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config {
        app_name: "Compute Bootstrap Demo".to_string(),
        adapter_index: cli.adapter,
        debug_severity: cli.debug_severity.into(),
        precompiled_shader: cli.precompiled.clone(),
        root_signature: Some(cli.root_signature.clone()),
        ..Config::default()
    };

    if cli.validation {
        config.enable_validation = true;
    } else if cli.no_validation {
        config.enable_validation = false;
    }

    if let Some(path) = &cli.debug_log {
        config.debug_output = DebugOutput::Both(path.clone());
    }

    if !cli.no_compile {
        let mut request = CompileRequest::new(&cli.source, &cli.entry, &cli.profile);
        request.defines = cli.defines.clone();
        if !cli.flags.is_empty() {
            request.arguments = cli.flags.clone();
        }
        config.compile = Some(request);
    }

    config
}

fn print_report(report: &RunReport, print_disassembly: bool) {
    boot_info!(SOURCE, "Adapter: [{}] {}", report.adapter.index, report.adapter.name);
    match report.shader_model {
        Some(model) => boot_info!(SOURCE, "Highest shader model: {}", model),
        None => boot_warn!(SOURCE, "Highest shader model unknown"),
    }
    if let Some(blob) = &report.precompiled {
        boot_info!(SOURCE, "Precompiled container: {} bytes (signed)", blob.len());
    }
    if let Some(blob) = &report.compiled {
        boot_info!(SOURCE, "Compiled container: {} bytes (signed)", blob.len());
    }
    boot_info!(SOURCE, "Compute pipeline ready (entry point '{}')", report.pipeline.entry_point());

    for (index, message) in report.diagnostics.iter().enumerate() {
        boot_warn!(SOURCE, " [{}] -- {}", index, message);
    }

    if print_disassembly {
        if report.compiled.is_some() {
            if let Some(text) = &report.precompiled_disassembly {
                println!("{}", text);
            }
        }
        match &report.disassembly {
            Some(text) => println!("{}", text),
            None => boot_warn!(SOURCE, "No disassembly available"),
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = build_config(cli);
    config.validate()?;

    let mut driver = VulkanDriver::new(&config)?;
    let mut runtime = NagaRuntime::with_search_paths(cli.include_paths.clone());

    let session = Session::bootstrap(&mut driver, &mut runtime, &config)?;
    let report = session.run(&config)?;
    print_report(&report, cli.disassemble);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    log::set_logger(ThresholdLogger {
        min_severity: if cli.verbose { LogSeverity::Trace } else { LogSeverity::Info },
    });

    if let Err(error) = run(&cli) {
        boot_error!(SOURCE, "{}", error);
        std::process::exit(error.exit_code());
    }
}
