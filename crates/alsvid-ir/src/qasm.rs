//! OPENQASM 2.0 subset reader and writer.
//!
//! The emitted dialect is a flat gate list over one `qubits` register, which
//! is all the synthesizer produces and consumes. Parsing resolves every line
//! against a [`GateLibrary`], so a file can only mention gate instances the
//! library knows.

use std::sync::Arc;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::GateId;
use crate::library::GateLibrary;
use crate::maintainer::MaintainerKind;

/// Serializes a circuit, skipping identity slots.
pub fn write_qasm(circuit: &Circuit) -> String {
    let lib = circuit.library();
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");
    out.push_str(&format!("qreg qubits[{}];\n", circuit.num_qubits()));
    for &id in circuit.gates() {
        if lib.is_identity(id) {
            continue;
        }
        let gate = lib.gate(id);
        out.push_str(&gate.name);
        let operands: Vec<String> = gate
            .qubits
            .iter()
            .map(|q| format!("qubits[{q}]"))
            .collect();
        out.push(' ');
        out.push_str(&operands.join(","));
        out.push_str(";\n");
    }
    out
}

/// Parses a circuit, resolving each gate line against `lib`.
///
/// Unknown gate instances and a register size different from the library's
/// are fatal, naming the offending line.
pub fn parse_qasm(
    text: &str,
    lib: Arc<GateLibrary>,
    kind: MaintainerKind,
) -> IrResult<Circuit> {
    let gates = parse_gates(text, &lib)?;
    Ok(Circuit::from_gates(lib, gates, kind))
}

/// Parses just the gate handles of a QASM body.
pub fn parse_gates(text: &str, lib: &GateLibrary) -> IrResult<Vec<GateId>> {
    let mut gates = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty()
            || line.starts_with("//")
            || line.starts_with("OPENQASM")
            || line.starts_with("include")
        {
            continue;
        }
        if line.starts_with("qreg") {
            let declared = bracketed_number(line).ok_or_else(|| parse_error(line_no, raw))?;
            if declared != lib.num_qubits() {
                return Err(IrError::QubitCountMismatch {
                    expected: lib.num_qubits(),
                    got: declared,
                });
            }
            continue;
        }
        let (name, qubits) = split_gate_line(line).ok_or_else(|| parse_error(line_no, raw))?;
        let id = lib
            .find(&name, &qubits)
            .ok_or_else(|| parse_error(line_no, raw))?;
        gates.push(id);
    }
    Ok(gates)
}

fn parse_error(line_no: usize, line: &str) -> IrError {
    IrError::QasmParse {
        line_no,
        line: line.trim().to_string(),
    }
}

/// Register size of the first `qreg` declaration, if any.
pub fn declared_qubits(text: &str) -> Option<u32> {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with("qreg"))
        .and_then(bracketed_number)
}

// "q2[3]" -> 3; digits in the register name are not part of the index.
fn bracketed_number(text: &str) -> Option<u32> {
    let start = text.find('[')? + 1;
    let end = start + text[start..].find(']')?;
    text[start..end].trim().parse().ok()
}

// "name q[a],q[b];" -> ("name", [a, b])
fn split_gate_line(line: &str) -> Option<(String, Vec<u32>)> {
    let line = line.trim_end_matches(';');
    let mut parts = line.split_whitespace();
    let name = parts.next()?.to_string();
    let rest: String = parts.collect::<Vec<_>>().join(" ");
    let mut qubits = Vec::new();
    for operand in rest.split(',') {
        let operand = operand.trim();
        let qubit = if operand.contains('[') {
            bracketed_number(operand)?
        } else {
            operand.parse().ok()?
        };
        qubits.push(qubit);
    }
    if qubits.is_empty() {
        return None;
    }
    Some((name, qubits))
}
