use crate::core::models::atom::StructureAtom;
use crate::core::models::dataset::DatasetMetricTable;
use crate::core::models::metrics::{
    CombinedAtom, DensityMetric, MetricKey, MetricSeries, MetricVariant,
};
use crate::core::utils::identifiers::is_calpha;
use crate::core::utils::proximity::classify_binding;
use crate::core::utils::stats::{linear_fit, mean};
use crate::engine::config::SeriesConfig;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum CombineError {
    #[error("No dataset tables supplied")]
    NoDatasets,
    #[error("Dose count ({doses}) does not match dataset count ({datasets})")]
    DoseCountMismatch { doses: usize, datasets: usize },
    #[error("Doses must be strictly increasing (violated at position {index})")]
    DosesNotIncreasing { index: usize },
}

/// A Calpha slope below this magnitude cannot meaningfully normalise other
/// atoms in the residue; such residues are left without normalised variants.
const MIN_NORMALISING_SLOPE: f64 = 1e-10;

/// The combined damage series: every atom resolved in the initial structure
/// and in all higher-dose datasets, with dose-indexed metric series and
/// fitted trends.
///
/// Built once by [`DoseSeries::combine`]; derived metrics are added in place
/// afterwards and atoms are never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseSeries {
    doses: Vec<f64>,
    abscissa: Vec<f64>,
    atoms: Vec<CombinedAtom>,
    dataset_count: usize,
    has_calpha: bool,
}

impl DoseSeries {
    /// Merges per-dataset metric tables into a combined series.
    ///
    /// An atom survives the merge only if its identity key appears in the
    /// initial structure and in every dataset table; per-atom metric series
    /// keep one value per dataset in dataset order, and a metric is kept
    /// only when every dataset record carries it. Zero surviving atoms is a
    /// valid outcome, left to the caller to interpret.
    ///
    /// # Errors
    ///
    /// Fails when no dataset tables are supplied, or when a non-empty dose
    /// list does not match the dataset count or is not strictly increasing.
    pub fn combine(
        initial_atoms: &[StructureAtom],
        tables: &[DatasetMetricTable],
        config: &SeriesConfig,
    ) -> Result<Self, CombineError> {
        if tables.is_empty() {
            return Err(CombineError::NoDatasets);
        }
        if !config.doses.is_empty() {
            if config.doses.len() != tables.len() {
                return Err(CombineError::DoseCountMismatch {
                    doses: config.doses.len(),
                    datasets: tables.len(),
                });
            }
            if let Some(index) = config
                .doses
                .windows(2)
                .position(|pair| pair[1] <= pair[0])
            {
                return Err(CombineError::DosesNotIncreasing { index: index + 1 });
            }
        }

        let abscissa: Vec<f64> = if config.doses.is_empty() {
            (1..=tables.len()).map(|i| i as f64).collect()
        } else {
            config.doses.clone()
        };

        let binding = classify_binding(initial_atoms, config.ligand_radius_angstroms);
        let has_calpha = initial_atoms
            .iter()
            .any(|a| is_calpha(&a.identity.atom_name, &a.identity.residue_name));

        let mut atoms = Vec::new();
        let mut dropped = 0usize;
        for structure_atom in initial_atoms {
            let identity = &structure_atom.identity;
            let records: Option<Vec<_>> = tables.iter().map(|t| t.get(identity)).collect();
            let Some(records) = records else {
                debug!(atom = %identity, "Atom absent from at least one dataset; dropped");
                dropped += 1;
                continue;
            };

            let binding_state = binding.get(identity).copied().unwrap_or_default();
            let mut atom = CombinedAtom::new(identity.clone(), binding_state);

            for metric in records[0].metric_names() {
                if metric.requires_calculated_maps() && !config.include_density_weighted {
                    continue;
                }
                let values: Option<Vec<f64>> =
                    records.iter().map(|r| r.metric(metric)).collect();
                let Some(values) = values else {
                    debug!(atom = %identity, metric = %metric,
                           "Metric absent from at least one dataset; dropped for this atom");
                    continue;
                };
                let fit = linear_fit(&abscissa, &values);
                atom.insert_series(MetricKey::standard(metric), MetricSeries::new(values, fit));
            }

            atoms.push(atom);
        }

        if atoms.is_empty() {
            warn!("No atoms survived the cross-dataset identity match");
        }
        info!(
            merged = atoms.len(),
            dropped,
            datasets = tables.len(),
            "Combined damage series assembled"
        );

        Ok(Self {
            doses: config.doses.clone(),
            abscissa,
            atoms,
            dataset_count: tables.len(),
            has_calpha,
        })
    }

    pub fn doses(&self) -> &[f64] {
        &self.doses
    }

    pub fn atoms(&self) -> &[CombinedAtom] {
        &self.atoms
    }

    pub fn dataset_count(&self) -> usize {
        self.dataset_count
    }

    /// Whether the initial structure contains protein backbone Calpha atoms.
    /// Calpha-normalised metrics can only be derived when this holds.
    pub fn has_calpha(&self) -> bool {
        self.has_calpha
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Atoms belonging to residues/bases of the given name.
    pub fn atoms_of_residue<'a>(
        &'a self,
        residue_name: &'a str,
    ) -> impl Iterator<Item = &'a CombinedAtom> {
        self.atoms
            .iter()
            .filter(move |a| a.identity().residue_name == residue_name)
    }

    /// Derives the per-atom "average" value for `metric`: the arithmetic
    /// mean of its Standard dose-series values. Returns the number of atoms
    /// the value was computed for.
    pub fn derive_average(&mut self, metric: DensityMetric) -> usize {
        let mut touched = 0;
        for atom in &mut self.atoms {
            let Some(series) = atom.series(metric, MetricVariant::Standard) else {
                continue;
            };
            if series.is_empty() {
                continue;
            }
            let value = mean(series.values());
            atom.insert_average(metric, value);
            touched += 1;
        }
        info!(metric = %metric, atoms = touched, "Derived average metric values");
        touched
    }

    /// Derives Calpha-normalised series for the given metrics.
    ///
    /// Each atom's Standard values are divided by the fitted Standard slope
    /// of the Calpha atom in the same residue instance, and the normalised
    /// series is refitted. Atoms in residues without a Calpha, or whose
    /// Calpha slope is too small to divide by, are left without the
    /// normalised variant. Does nothing on structures without Calpha atoms.
    ///
    /// Returns the number of atoms that received at least one normalised
    /// series.
    pub fn derive_calpha_normalised(&mut self, metrics: &[DensityMetric]) -> usize {
        if !self.has_calpha {
            warn!("Structure has no Calpha atoms; skipping Calpha normalisation");
            return 0;
        }

        // Fitted Calpha slope per residue instance per metric.
        let mut calpha_slopes: HashMap<(char, isize), HashMap<DensityMetric, f64>> =
            HashMap::new();
        for atom in &self.atoms {
            let identity = atom.identity();
            if !is_calpha(&identity.atom_name, &identity.residue_name) {
                continue;
            }
            let per_metric = calpha_slopes.entry(identity.residue_key()).or_default();
            for metric in metrics {
                if let Some(slope) = atom.slope(*metric, MetricVariant::Standard) {
                    if slope.is_finite() && slope.abs() >= MIN_NORMALISING_SLOPE {
                        per_metric.insert(*metric, slope);
                    }
                }
            }
        }

        let mut touched = 0;
        for atom in &mut self.atoms {
            let residue_key = atom.identity().residue_key();
            let Some(per_metric) = calpha_slopes.get(&residue_key) else {
                continue;
            };

            let mut any_inserted = false;
            for metric in metrics {
                let Some(ca_slope) = per_metric.get(metric).copied() else {
                    continue;
                };
                let Some(series) = atom.series(*metric, MetricVariant::Standard) else {
                    continue;
                };
                let normalised: Vec<f64> =
                    series.values().iter().map(|v| v / ca_slope).collect();
                let fit = linear_fit(&self.abscissa, &normalised);
                atom.insert_series(
                    MetricKey::normalised(*metric),
                    MetricSeries::new(normalised, fit),
                );
                any_inserted = true;
            }
            if any_inserted {
                touched += 1;
            }
        }

        info!(atoms = touched, "Derived Calpha-normalised metric series");
        touched
    }
}
