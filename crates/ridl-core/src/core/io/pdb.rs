use crate::core::models::atom::{AtomIdentity, StructureAtom};
use nalgebra::Point3;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("No ATOM or HETATM records found")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for an ATOM/HETATM record (must be at least 66 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let raw = slice_and_trim(line, start, end);
    raw.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: raw.into(),
        },
    })
}

/// Reads the ATOM/HETATM records of a PDB coordinate file into a flat atom
/// list, preserving file order.
///
/// Alternate-location indicators other than blank or 'A' are skipped, so each
/// physical atom appears at most once. Header, TER and END records are
/// ignored. Two records resolving to the same identity key are rejected as an
/// inconsistency.
pub fn read_structure(reader: &mut impl BufRead) -> Result<Vec<StructureAtom>, PdbError> {
    let mut atoms = Vec::new();
    let mut seen_identities = HashSet::new();

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;

        let record_type = slice_and_trim(&line, 0, 6);
        if record_type != "ATOM" && record_type != "HETATM" {
            continue;
        }
        if line.len() < 66 {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::LineTooShort,
            });
        }

        let alt_loc = slice_and_trim(&line, 16, 17);
        if !alt_loc.is_empty() && alt_loc != "A" {
            continue;
        }

        let atom_name = slice_and_trim(&line, 12, 16);
        let residue_name = slice_and_trim(&line, 17, 20);
        let chain_str = slice_and_trim(&line, 21, 22);
        let residue_number_str = slice_and_trim(&line, 22, 26);

        if atom_name.is_empty() {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::MissingRequiredField {
                    columns: "13-16".into(),
                },
            });
        }
        if residue_name.is_empty() {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::MissingRequiredField {
                    columns: "18-20".into(),
                },
            });
        }
        let chain_id = chain_str.chars().next().unwrap_or('A');
        let residue_number: isize =
            residue_number_str.parse().map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidInt {
                    columns: "23-26".into(),
                    value: residue_number_str.into(),
                },
            })?;

        let x = parse_float(&line, line_num, 30, 38)?;
        let y = parse_float(&line, line_num, 38, 46)?;
        let z = parse_float(&line, line_num, 46, 54)?;
        let occupancy = parse_float(&line, line_num, 54, 60)?;
        let b_factor = parse_float(&line, line_num, 60, 66)?;

        let identity = AtomIdentity::new(chain_id, residue_number, residue_name, atom_name);
        if !seen_identities.insert(identity.clone()) {
            return Err(PdbError::Inconsistency(format!(
                "Duplicate atom identity: {}",
                identity
            )));
        }

        atoms.push(StructureAtom {
            identity,
            position: Point3::new(x, y, z),
            occupancy,
            b_factor,
        });
    }

    if atoms.is_empty() {
        return Err(PdbError::Empty);
    }
    Ok(atoms)
}

/// Opens and reads a PDB coordinate file from disk.
pub fn load_structure(path: &Path) -> Result<Vec<StructureAtom>, PdbError> {
    let file = File::open(path)?;
    read_structure(&mut BufReader::new(file))
}
