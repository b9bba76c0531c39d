use phf::{Set, phf_set};

static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "MSE", "SEC", "PYL",
};

static NUCLEOTIDE_NAMES: Set<&'static str> = phf_set! {
    "A", "C", "G", "U", "I",
    "DA", "DC", "DG", "DT", "DI",
};

static WATER_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "DOD",
};

pub fn is_amino_acid(residue_name: &str) -> bool {
    AMINO_ACID_NAMES.contains(residue_name.trim())
}

pub fn is_nucleotide(residue_name: &str) -> bool {
    NUCLEOTIDE_NAMES.contains(residue_name.trim())
}

pub fn is_water(residue_name: &str) -> bool {
    WATER_NAMES.contains(residue_name.trim())
}

/// A residue that is neither polymer (protein/nucleic) nor solvent is treated
/// as a ligand for binding-state classification.
pub fn is_ligand_residue(residue_name: &str) -> bool {
    let name = residue_name.trim();
    !name.is_empty() && !is_amino_acid(name) && !is_nucleotide(name) && !is_water(name)
}

/// Whether this atom is the backbone Calpha of a protein residue.
pub fn is_calpha(atom_name: &str, residue_name: &str) -> bool {
    atom_name.trim() == "CA" && is_amino_acid(residue_name)
}
