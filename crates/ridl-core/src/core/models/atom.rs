use super::metrics::DensityMetric;
use nalgebra::Point3;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Structural-context category of an atom, used as a grouping dimension when
/// ranking damage susceptibility.
///
/// Atoms close to a bound ligand often show different damage behaviour from
/// the same atom type elsewhere in the structure, so the two populations are
/// ranked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BindingState {
    /// Atom lies within the ligand-proximity radius of at least one ligand atom.
    Bound,
    /// Atom is outside every ligand-proximity region (or the structure has no ligand).
    #[default]
    Unbound,
}

/// Identity of one atom within the crystal structure.
///
/// This tuple of identifiers is the key used to match the same physical atom
/// across the initial structure and every higher-dose dataset. Two records
/// refer to the same atom exactly when their identities compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomIdentity {
    /// Chain identifier (e.g. 'A').
    pub chain_id: char,
    /// Residue sequence number within the chain.
    pub residue_number: isize,
    /// Residue or nucleotide base name (e.g. "GLU", "U").
    pub residue_name: String,
    /// Atom name within the residue (e.g. "CA", "OE1").
    pub atom_name: String,
}

impl AtomIdentity {
    pub fn new(chain_id: char, residue_number: isize, residue_name: &str, atom_name: &str) -> Self {
        Self {
            chain_id,
            residue_number,
            residue_name: residue_name.to_string(),
            atom_name: atom_name.to_string(),
        }
    }

    /// Key identifying the residue instance this atom belongs to.
    pub fn residue_key(&self) -> (char, isize) {
        (self.chain_id, self.residue_number)
    }
}

/// An atom read from the initial-structure coordinate file.
///
/// Carries the refined position used for ligand-proximity classification and
/// the refinement B-factor reported alongside the density metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureAtom {
    /// The atom's identity key.
    pub identity: AtomIdentity,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Crystallographic occupancy.
    pub occupancy: f64,
    /// Isotropic B-factor in square Angstroms.
    pub b_factor: f64,
}

/// Per-atom density metrics for a single higher-dose dataset.
///
/// Produced by the external map-processing stage; one record per refined atom
/// per dataset. Values are keyed by metric name from the fixed vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetAtomRecord {
    pub identity: AtomIdentity,
    metrics: HashMap<DensityMetric, f64>,
}

impl DatasetAtomRecord {
    pub fn new(identity: AtomIdentity) -> Self {
        Self {
            identity,
            metrics: HashMap::new(),
        }
    }

    pub fn set_metric(&mut self, metric: DensityMetric, value: f64) {
        self.metrics.insert(metric, value);
    }

    pub fn metric(&self, metric: DensityMetric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    /// Metric names present on this record.
    pub fn metric_names(&self) -> impl Iterator<Item = DensityMetric> + '_ {
        self.metrics.keys().copied()
    }
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingState::Bound => write!(f, "bound"),
            BindingState::Unbound => write!(f, "unbound"),
        }
    }
}

impl FromStr for BindingState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bound" => Ok(BindingState::Bound),
            "unbound" => Ok(BindingState::Unbound),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AtomIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.chain_id, self.residue_name, self.residue_number, self.atom_name
        )
    }
}
