use crate::core::models::atom::{AtomIdentity, DatasetAtomRecord};
use crate::core::models::dataset::DatasetMetricTable;
use crate::core::models::metrics::DensityMetric;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("Table contains no usable metric columns")]
    NoMetricColumns,
}

const CHAIN_COLUMN: &str = "chain";
const RESIDUE_NUMBER_COLUMN: &str = "residue_number";
const RESIDUE_NAME_COLUMN: &str = "residue_name";
const ATOM_NAME_COLUMN: &str = "atom_name";

struct ColumnLayout {
    chain: usize,
    residue_number: usize,
    residue_name: usize,
    atom_name: usize,
    metrics: Vec<(usize, DensityMetric)>,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnLayout, TableError> {
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or(TableError::MissingColumn(name))
    };

    let chain = find(CHAIN_COLUMN)?;
    let residue_number = find(RESIDUE_NUMBER_COLUMN)?;
    let residue_name = find(RESIDUE_NAME_COLUMN)?;
    let atom_name = find(ATOM_NAME_COLUMN)?;

    let identity_columns = [chain, residue_number, residue_name, atom_name];
    let metrics: Vec<(usize, DensityMetric)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !identity_columns.contains(i))
        .filter_map(|(i, h)| h.parse::<DensityMetric>().ok().map(|m| (i, m)))
        .collect();

    if metrics.is_empty() {
        return Err(TableError::NoMetricColumns);
    }

    Ok(ColumnLayout {
        chain,
        residue_number,
        residue_name,
        atom_name,
        metrics,
    })
}

/// Reads one per-dataset metric table from CSV.
///
/// The table must carry the four identity columns (`chain`,
/// `residue_number`, `residue_name`, `atom_name`) plus at least one column
/// named after a metric from the fixed vocabulary. Unrecognized columns are
/// ignored. Rows with missing or unparseable identity fields are dropped
/// rather than failing the whole table; unparseable metric cells drop that
/// single value.
pub fn read_metric_table(reader: impl Read) -> Result<DatasetMetricTable, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let layout = resolve_columns(csv_reader.headers()?)?;
    let mut table = DatasetMetricTable::new();

    for (row_num, row_res) in csv_reader.records().enumerate() {
        let row = row_res?;
        let row_num = row_num + 2; // 1-based, after the header line

        let chain_field = row.get(layout.chain).unwrap_or("").trim();
        let residue_name = row.get(layout.residue_name).unwrap_or("").trim();
        let atom_name = row.get(layout.atom_name).unwrap_or("").trim();
        let residue_number_field = row.get(layout.residue_number).unwrap_or("").trim();

        let (Some(chain_id), false, false, Ok(residue_number)) = (
            chain_field.chars().next(),
            residue_name.is_empty(),
            atom_name.is_empty(),
            residue_number_field.parse::<isize>(),
        ) else {
            debug!(row = row_num, "Dropping row with incomplete atom identity");
            continue;
        };

        let identity = AtomIdentity::new(chain_id, residue_number, residue_name, atom_name);
        let mut record = DatasetAtomRecord::new(identity.clone());
        for (column, metric) in &layout.metrics {
            let cell = row.get(*column).unwrap_or("").trim();
            match cell.parse::<f64>() {
                Ok(value) => record.set_metric(*metric, value),
                Err(_) => {
                    debug!(
                        row = row_num,
                        atom = %identity,
                        metric = %metric,
                        "Dropping unparseable metric cell"
                    );
                }
            }
        }
        table.insert(record);
    }

    Ok(table)
}

/// Opens and reads a per-dataset metric table from disk.
pub fn load_metric_table(path: &Path) -> Result<DatasetMetricTable, TableError> {
    let file = File::open(path)?;
    read_metric_table(file)
}
