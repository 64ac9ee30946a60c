//! Gate definition files and folders.
//!
//! A basic gate file holds, line by line: the gate name, its qubit count,
//! its cost, the default acting qubits, and then the matrix entries in row
//! order. A composite gate file replaces cost and matrix by one line per
//! gate of the decomposition, each `name q0 q1 ...`. Complex entries are
//! written `(re,im)` or as a bare real.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use ndarray::Array2;
use num_complex::Complex64;

use alsvid_ir::matrix::Unitary;
use alsvid_ir::stdgates;
use alsvid_ir::{CompositeDef, GateDef};

/// The built-in gate set used when no folder is given: h, t, tdg and cx at
/// unit cost.
pub fn default_gates() -> Vec<GateDef> {
    stdgates::default_set()
}

/// Reads every file of a basic-gate folder, in file name order.
pub fn load_basic_dir(dir: &Path) -> Result<Vec<GateDef>> {
    let mut defs = Vec::new();
    for path in sorted_files(dir)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read gate file {}", path.display()))?;
        defs.push(
            parse_basic(&text)
                .with_context(|| format!("invalid basic gate file {}", path.display()))?,
        );
    }
    ensure!(!defs.is_empty(), "gate folder {} is empty", dir.display());
    Ok(defs)
}

/// Reads every file of a composite-gate folder, in file name order.
pub fn load_composite_dir(dir: &Path) -> Result<Vec<CompositeDef>> {
    let mut defs = Vec::new();
    for path in sorted_files(dir)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read gate file {}", path.display()))?;
        defs.push(
            parse_composite(&text)
                .with_context(|| format!("invalid composite gate file {}", path.display()))?,
        );
    }
    Ok(defs)
}

fn sorted_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read gate folder {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_basic(text: &str) -> Result<GateDef> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let name = lines.next().context("missing gate name")?.trim().to_string();
    let num_qubits: u32 = lines
        .next()
        .context("missing qubit count")?
        .trim()
        .parse()
        .context("invalid qubit count")?;
    let cost: f64 = lines
        .next()
        .context("missing cost")?
        .trim()
        .parse()
        .context("invalid cost")?;
    let qubits = parse_qubit_line(lines.next().context("missing acting qubits")?)?;
    let matrix = parse_matrix(lines, num_qubits)?;
    Ok(GateDef {
        name,
        num_qubits,
        cost,
        qubits,
        matrix,
    })
}

fn parse_composite(text: &str) -> Result<CompositeDef> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let name = lines.next().context("missing gate name")?.trim().to_string();
    let num_qubits: u32 = lines
        .next()
        .context("missing qubit count")?
        .trim()
        .parse()
        .context("invalid qubit count")?;
    let qubits = parse_qubit_line(lines.next().context("missing acting qubits")?)?;

    let mut decomposition = Vec::new();
    for line in lines {
        let mut parts = line.split_whitespace();
        let gate = parts
            .next()
            .with_context(|| format!("empty decomposition line {line:?}"))?
            .to_string();
        let mut gate_qubits = Vec::new();
        for token in parts {
            let digits: String = token.chars().filter(char::is_ascii_digit).collect();
            gate_qubits.push(
                digits
                    .parse()
                    .with_context(|| format!("invalid qubit operand {token:?}"))?,
            );
        }
        decomposition.push((gate, gate_qubits));
    }
    ensure!(!decomposition.is_empty(), "composite gate {name} has no decomposition");

    Ok(CompositeDef {
        name,
        num_qubits,
        qubits,
        lines: decomposition,
    })
}

fn parse_qubit_line(line: &str) -> Result<Vec<u32>> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse()
                .with_context(|| format!("invalid acting qubit {token:?}"))
        })
        .collect()
}

fn parse_matrix<'a>(
    lines: impl Iterator<Item = &'a str>,
    num_qubits: u32,
) -> Result<Unitary> {
    let dim = 1usize << num_qubits;
    let tokens: Vec<&str> = lines.flat_map(str::split_whitespace).collect();
    ensure!(
        tokens.len() == dim * dim,
        "expected {} matrix entries, found {}",
        dim * dim,
        tokens.len()
    );
    let mut matrix = Array2::zeros((dim, dim));
    for (idx, token) in tokens.iter().enumerate() {
        matrix[[idx / dim, idx % dim]] = parse_complex(token)?;
    }
    Ok(matrix)
}

/// Parses `(re,im)`, `(re)` or a bare real.
pub fn parse_complex(token: &str) -> Result<Complex64> {
    let token = token.trim();
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return match inner.split_once(',') {
            Some((re, im)) => Ok(Complex64::new(
                re.trim().parse().context("invalid real part")?,
                im.trim().parse().context("invalid imaginary part")?,
            )),
            None => Ok(Complex64::new(
                inner.trim().parse().context("invalid real part")?,
                0.0,
            )),
        };
    }
    match token.parse() {
        Ok(re) => Ok(Complex64::new(re, 0.0)),
        Err(_) => bail!("invalid matrix entry {token:?}"),
    }
}
