use crate::core::models::atom::{AtomIdentity, BindingState, StructureAtom};
use crate::core::utils::identifiers::is_ligand_residue;
use std::collections::HashMap;
use tracing::debug;

/// Classifies every atom of the initial structure as ligand-bound or unbound.
///
/// An atom is `Bound` when it lies within `radius_angstroms` of any ligand
/// atom (ligand atoms themselves included). A structure without ligand atoms
/// classifies everything `Unbound`.
pub fn classify_binding(
    atoms: &[StructureAtom],
    radius_angstroms: f64,
) -> HashMap<AtomIdentity, BindingState> {
    let ligand_positions: Vec<_> = atoms
        .iter()
        .filter(|a| is_ligand_residue(&a.identity.residue_name))
        .map(|a| a.position)
        .collect();

    if ligand_positions.is_empty() {
        debug!("No ligand atoms in structure; all atoms classified unbound.");
        return atoms
            .iter()
            .map(|a| (a.identity.clone(), BindingState::Unbound))
            .collect();
    }

    let radius_sq = radius_angstroms * radius_angstroms;
    atoms
        .iter()
        .map(|atom| {
            let near_ligand = ligand_positions
                .iter()
                .any(|lig| (atom.position - lig).norm_squared() <= radius_sq);
            let state = if near_ligand {
                BindingState::Bound
            } else {
                BindingState::Unbound
            };
            (atom.identity.clone(), state)
        })
        .collect()
}
