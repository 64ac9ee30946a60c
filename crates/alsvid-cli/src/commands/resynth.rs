//! Resynth command implementation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use alsvid_ir::{GateLibrary, MaintainerKind, qasm};
use alsvid_synth::Resynthesizer;

use crate::gateset;

#[derive(Args)]
pub struct ResynthArgs {
    /// Input circuit (OpenQASM 2)
    pub input: String,

    /// Folder of basic gate files (built-in h, t, tdg, cx if omitted)
    #[arg(short, long)]
    pub gates: Option<String>,

    /// Folder of composite gate files
    #[arg(long)]
    pub composite: Option<String>,

    /// Output file (input stem plus _opt.qasm if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Largest fusion window
    #[arg(long, default_value = "12")]
    pub max_window: usize,

    /// Ignore t-depth when ordering commuting gates
    #[arg(long)]
    pub no_depth: bool,

    /// Gate names whose depth is protected
    #[arg(long, default_value = "t,tdg", value_delimiter = ',')]
    pub depth_gates: Vec<String>,
}

/// Execute the resynth command.
pub fn execute(args: ResynthArgs) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input))?;
    // The register size must be known before the library is built, so the
    // qreg declaration is scanned ahead of the full parse.
    let num_qubits = qasm::declared_qubits(&source)
        .context("no qreg declaration found in input")?;

    let basic = match &args.gates {
        Some(dir) => gateset::load_basic_dir(Path::new(dir))?,
        None => gateset::default_gates(),
    };
    let composite = match &args.composite {
        Some(dir) => gateset::load_composite_dir(Path::new(dir))?,
        None => Vec::new(),
    };
    let lib = Arc::new(GateLibrary::build(num_qubits, &basic, &composite)?);

    let mut circuit = qasm::parse_qasm(&source, Arc::clone(&lib), MaintainerKind::Linear)?;
    println!(
        "{} Resynthesizing {} ({} qubits, {} gates, cost {})",
        style("→").cyan().bold(),
        style(&args.input).green(),
        num_qubits,
        circuit.non_identity_count(),
        circuit.cost()
    );

    let before_gates = circuit.non_identity_count();
    let before_cost = circuit.cost();
    let before_depth = circuit.depth_by_names(&args.depth_gates);

    let resynth = Resynthesizer {
        max_window: args.max_window,
        watch_depth: !args.no_depth,
        depth_gates: args.depth_gates.clone(),
    };
    resynth.run(&mut circuit)?;

    println!(
        "{} Gates {} → {}, cost {} → {}, depth {} → {}",
        style("✓").green().bold(),
        before_gates,
        circuit.non_identity_count(),
        before_cost,
        circuit.cost(),
        before_depth,
        circuit.depth_by_names(&args.depth_gates)
    );

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = Path::new(&args.input)
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        format!("{}_opt.qasm", stem)
    });
    fs::write(&output, qasm::write_qasm(&circuit))
        .with_context(|| format!("failed to write {}", output))?;
    println!("  Output: {}", style(&output).green());

    Ok(())
}
