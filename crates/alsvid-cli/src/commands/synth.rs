//! Synth command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use alsvid_ir::{GateLibrary, MaintainerKind, qasm};
use alsvid_synth::{SynthConfig, SynthReport, synthesize};

use crate::gateset;
use crate::target;

#[derive(Args)]
pub struct SynthArgs {
    /// Target description file
    pub target: String,

    /// Folder of basic gate files (built-in h, t, tdg, cx if omitted)
    #[arg(short, long)]
    pub gates: Option<String>,

    /// Folder of composite gate files
    #[arg(long)]
    pub composite: Option<String>,

    /// Output directory for solution circuits
    #[arg(short, long, default_value = "solutions")]
    pub output: String,

    /// Worker threads
    #[arg(short, long, default_value = "1")]
    pub threads: usize,

    /// Time budget in seconds
    #[arg(long, default_value = "100")]
    pub time: u64,

    /// Stop after this many solutions
    #[arg(short, long, default_value = "10")]
    pub solutions: usize,

    /// Exact-equality tolerance
    #[arg(long, default_value = "1e-6")]
    pub tolerance: f64,

    /// Use the cheaper overlap-only search cost
    #[arg(long)]
    pub simple_cost: bool,

    /// Disable qubit-relabeling and inversion symmetry
    #[arg(long)]
    pub no_symmetry: bool,

    /// Matrix maintenance strategy (linear, chunked, binary)
    #[arg(long, default_value = "binary")]
    pub maintainer: String,

    /// Skip the peephole cleanup of found circuits
    #[arg(long)]
    pub no_resynth: bool,

    /// Expand composite gates before reporting
    #[arg(long)]
    pub expand: bool,

    /// Initial lower bound on start-circuit length
    #[arg(long, default_value = "30")]
    pub min_start: usize,

    /// Initial upper bound on start-circuit length
    #[arg(long, default_value = "120")]
    pub max_start: usize,

    /// Gate names counted for t-count and t-depth
    #[arg(long, default_value = "t,tdg", value_delimiter = ',')]
    pub depth_gates: Vec<String>,

    /// Keep only solutions with at most this many gates
    #[arg(long)]
    pub max_gates: Option<usize>,

    /// Keep only solutions with at most this t-count
    #[arg(long)]
    pub max_t_count: Option<usize>,

    /// Keep only solutions with at most this t-depth
    #[arg(long)]
    pub max_t_depth: Option<usize>,

    /// Write a JSON report to this file
    #[arg(short, long)]
    pub export: Option<String>,
}

/// Execute the synth command.
pub fn execute(args: SynthArgs) -> Result<()> {
    let spec = target::load_target(Path::new(&args.target))?;
    let num_qubits = spec.target.num_qubits();
    println!(
        "{} Synthesizing {} ({} qubits, {} covered entries)",
        style("→").cyan().bold(),
        style(&spec.name).green(),
        num_qubits,
        spec.target.covered_count()
    );

    let basic = match &args.gates {
        Some(dir) => gateset::load_basic_dir(Path::new(dir))?,
        None => gateset::default_gates(),
    };
    let composite = match &args.composite {
        Some(dir) => gateset::load_composite_dir(Path::new(dir))?,
        None => Vec::new(),
    };
    let lib = Arc::new(GateLibrary::build(num_qubits, &basic, &composite)?);
    println!(
        "  Library: {} gate instances ({} basic, {} composite)",
        lib.len(),
        lib.basic().len(),
        lib.composite().len()
    );

    let config = SynthConfig {
        threads: args.threads,
        time_limit: Duration::from_secs(args.time),
        max_solutions: args.solutions,
        tolerance: args.tolerance,
        simple_cost: args.simple_cost,
        use_symmetry: !args.no_symmetry,
        maintainer: parse_maintainer(&args.maintainer)?,
        resynthesize: !args.no_resynth,
        expand_composites: args.expand,
        min_start_len: args.min_start,
        max_start_len: args.max_start,
        depth_gates: args.depth_gates.clone(),
        max_gates: args.max_gates,
        max_t_count: args.max_t_count,
        max_t_depth: args.max_t_depth,
        ..SynthConfig::default()
    };

    info!(
        threads = config.threads,
        time_secs = args.time,
        maintainer = %args.maintainer,
        "search configured"
    );
    let report = synthesize(lib, spec.target, &config)?;
    if report.solutions.is_empty() {
        println!(
            "{} No solution found in {} attempts ({:.1}s)",
            style("✗").red().bold(),
            report.attempts,
            report.elapsed.as_secs_f64()
        );
        return Ok(());
    }

    let out_dir = PathBuf::from(&args.output);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut records = Vec::with_capacity(report.solutions.len());
    for (index, solution) in report.solutions.iter().enumerate() {
        let file = format!(
            "{}-{}-{}-{}-{}.qasm",
            solution.cost, solution.gate_count, solution.t_depth, solution.worker, index
        );
        fs::write(out_dir.join(&file), qasm::write_qasm(&solution.circuit))
            .with_context(|| format!("failed to write {}", file))?;
        println!(
            "  {} cost {}, {} gates, t-count {}, t-depth {}",
            style(&file).green(),
            solution.cost,
            solution.gate_count,
            solution.t_count,
            solution.t_depth
        );
        records.push(SolutionRecord {
            file,
            cost: solution.cost,
            gate_count: solution.gate_count,
            t_count: solution.t_count,
            t_depth: solution.t_depth,
            worker: solution.worker,
        });
    }
    println!(
        "{} {} solutions in {} attempts ({:.1}s)",
        style("✓").green().bold(),
        report.solutions.len(),
        report.attempts,
        report.elapsed.as_secs_f64()
    );

    if let Some(export) = &args.export {
        let record = ReportRecord::new(&spec.name, &report, records);
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(export, json).with_context(|| format!("failed to write {}", export))?;
        println!("  Report: {}", style(export).green());
    }

    Ok(())
}

fn parse_maintainer(name: &str) -> Result<MaintainerKind> {
    match name.to_lowercase().as_str() {
        "linear" => Ok(MaintainerKind::Linear),
        "chunked" => Ok(MaintainerKind::Chunked),
        "binary" => Ok(MaintainerKind::Binary),
        other => bail!("unknown maintainer: '{}'. Available: linear, chunked, binary", other),
    }
}

#[derive(Serialize)]
struct SolutionRecord {
    file: String,
    cost: f64,
    gate_count: usize,
    t_count: usize,
    t_depth: usize,
    worker: usize,
}

#[derive(Serialize)]
struct ReportRecord {
    target: String,
    attempts: u64,
    successes: u64,
    elapsed_secs: f64,
    solutions: Vec<SolutionRecord>,
}

impl ReportRecord {
    fn new(target: &str, report: &SynthReport, solutions: Vec<SolutionRecord>) -> Self {
        Self {
            target: target.to_string(),
            attempts: report.attempts,
            successes: report.successes,
            elapsed_secs: report.elapsed.as_secs_f64(),
            solutions,
        }
    }
}
