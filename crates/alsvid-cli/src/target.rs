//! Target description files.
//!
//! A target file holds the target name, the qubit count, the matrix entries
//! in row order, and optionally one 0/1 flag per entry marking the cover.
//! Without cover flags every entry is constrained.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use ndarray::Array2;

use alsvid_synth::PartialMatrix;

use crate::gateset::parse_complex;

/// A parsed target file.
pub struct TargetSpec {
    /// Name given in the file, used for reporting.
    pub name: String,
    /// The constraint to synthesize against.
    pub target: PartialMatrix,
}

/// Loads and parses a target file.
pub fn load_target(path: &Path) -> Result<TargetSpec> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read target file {}", path.display()))?;
    parse_target(&text).with_context(|| format!("invalid target file {}", path.display()))
}

fn parse_target(text: &str) -> Result<TargetSpec> {
    let mut tokens = text.split_whitespace();
    let name = tokens.next().context("missing target name")?.to_string();
    let num_qubits: u32 = tokens
        .next()
        .context("missing qubit count")?
        .parse()
        .context("invalid qubit count")?;
    let dim = 1usize << num_qubits;

    let mut matrix = Array2::zeros((dim, dim));
    for idx in 0..dim * dim {
        let token = tokens
            .next()
            .with_context(|| format!("missing matrix entry {} of {}", idx + 1, dim * dim))?;
        matrix[[idx / dim, idx % dim]] = parse_complex(token)?;
    }

    let flags: Vec<&str> = tokens.collect();
    let cover = if flags.is_empty() {
        Array2::from_elem((dim, dim), true)
    } else {
        ensure!(
            flags.len() == dim * dim,
            "expected {} cover flags, found {}",
            dim * dim,
            flags.len()
        );
        let mut cover = Array2::from_elem((dim, dim), false);
        for (idx, flag) in flags.iter().enumerate() {
            cover[[idx / dim, idx % dim]] = match *flag {
                "1" => true,
                "0" => false,
                other => bail!("invalid cover flag {other:?}"),
            };
        }
        cover
    };

    let target = PartialMatrix::new(matrix, cover)?;
    Ok(TargetSpec { name, target })
}
