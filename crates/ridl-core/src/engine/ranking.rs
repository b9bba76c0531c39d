use crate::core::models::atom::BindingState;
use crate::core::models::metrics::{DensityMetric, MetricVariant};
use crate::core::utils::stats::{mean, std_dev};
use crate::engine::combine::DoseSeries;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankingError {
    #[error("Damage ranks have not been calculated yet")]
    RanksNotCalculated,
    #[error("Calpha-normalised ranking unavailable: structure contains no Calpha atoms")]
    NormalisationUnavailable,
}

/// Grouping key for damage ranking: atoms of the same residue/base type,
/// atom type and binding category are scored together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub residue_name: String,
    pub atom_name: String,
    pub binding: BindingState,
}

/// One ranked atom-type group.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRankEntry {
    pub key: GroupKey,
    /// 0-based position after sorting; 0 is the most damaged group.
    pub rank: usize,
    /// Mean fitted slope over the group's member atoms.
    pub mean_slope: f64,
    /// Population standard deviation of the member slopes.
    pub slope_std_dev: f64,
    /// Number of atoms contributing a fitted slope.
    pub atom_count: usize,
}

/// A metric/variant pair selecting one ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSelection {
    pub metric: DensityMetric,
    pub variant: MetricVariant,
}

impl RankSelection {
    pub fn label(&self) -> String {
        format!("{} D{}", self.variant, self.metric)
    }
}

/// An ordered damage ranking for one metric/variant selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRanking {
    selection: RankSelection,
    entries: Vec<DamageRankEntry>,
}

#[derive(Serialize)]
struct RankRow<'a> {
    rank: usize,
    residue_name: &'a str,
    atom_name: &'a str,
    binding: String,
    mean_slope: f64,
    slope_std_dev: f64,
    atom_count: usize,
}

impl DamageRanking {
    pub fn selection(&self) -> RankSelection {
        self.selection
    }

    pub fn entries(&self) -> &[DamageRankEntry] {
        &self.entries
    }

    /// The top `limit` entries; 0 means all entries.
    pub fn top(&self, limit: usize) -> &[DamageRankEntry] {
        if limit == 0 || limit >= self.entries.len() {
            &self.entries
        } else {
            &self.entries[..limit]
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the ranking as CSV.
    pub fn write_csv(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            csv_writer.serialize(RankRow {
                rank: entry.rank,
                residue_name: &entry.key.residue_name,
                atom_name: &entry.key.atom_name,
                binding: entry.key.binding.to_string(),
                mean_slope: entry.mean_slope,
                slope_std_dev: entry.slope_std_dev,
                atom_count: entry.atom_count,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering rule placing the most-damaged group first.
///
/// Raw "loss"-family slopes are signed oppositely to "gain"-family slopes,
/// and dividing by the (negative-trending) Calpha slope flips the sign
/// again, so the direction depends on both the metric and the variant.
/// Metrics outside the four difference-map families follow the loss/mean
/// rule for their variant.
fn sort_direction(metric: DensityMetric, variant: MetricVariant) -> SortDirection {
    use DensityMetric::{Gain, Loss, Mean, Net};
    match (variant, metric) {
        (MetricVariant::Standard, Loss | Mean) => SortDirection::Ascending,
        (MetricVariant::Standard, Gain | Net) => SortDirection::Descending,
        (MetricVariant::CalphaNormalised, Loss | Mean | Net) => SortDirection::Descending,
        (MetricVariant::CalphaNormalised, Gain) => SortDirection::Ascending,
        (MetricVariant::Standard, _) => SortDirection::Ascending,
        (MetricVariant::CalphaNormalised, _) => SortDirection::Descending,
    }
}

/// Groups the series' atoms by (residue type, atom type, binding state) and
/// ranks the groups by their mean fitted slope for the selected metric and
/// variant.
///
/// Atoms without a fitted slope for the selection contribute nothing; groups
/// with no contributing atoms are omitted. An empty ranking is a valid
/// result when nothing in the series carries the selection.
///
/// Equal mean slopes order by group key (residue name, atom name, binding
/// state), so identical inputs always produce identical rankings.
///
/// # Errors
///
/// Requesting the Calpha-normalised variant on a series whose structure has
/// no Calpha atoms returns [`RankingError::NormalisationUnavailable`].
pub fn calculate_ranks(
    series: &DoseSeries,
    metric: DensityMetric,
    variant: MetricVariant,
) -> Result<DamageRanking, RankingError> {
    if variant == MetricVariant::CalphaNormalised && !series.has_calpha() {
        return Err(RankingError::NormalisationUnavailable);
    }

    let mut groups: BTreeMap<GroupKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for atom in series.atoms() {
        let (Some(slope), Some(std_err)) = (
            atom.slope(metric, variant),
            atom.slope_std_err(metric, variant),
        ) else {
            continue;
        };
        let key = GroupKey {
            residue_name: atom.identity().residue_name.clone(),
            atom_name: atom.identity().atom_name.clone(),
            binding: atom.binding(),
        };
        let (slopes, errs) = groups.entry(key).or_default();
        slopes.push(slope);
        errs.push(std_err);
    }

    if groups.is_empty() {
        debug!(metric = %metric, variant = %variant, "No grouped data for ranking selection");
    }

    let mut entries: Vec<DamageRankEntry> = groups
        .into_iter()
        .map(|(key, (slopes, _errs))| DamageRankEntry {
            key,
            rank: 0,
            mean_slope: mean(&slopes),
            slope_std_dev: std_dev(&slopes),
            atom_count: slopes.len(),
        })
        .collect();

    let direction = sort_direction(metric, variant);
    entries.sort_by(|a, b| {
        let by_slope = match direction {
            SortDirection::Ascending => a.mean_slope.total_cmp(&b.mean_slope),
            SortDirection::Descending => b.mean_slope.total_cmp(&a.mean_slope),
        };
        by_slope.then_with(|| a.key.cmp(&b.key))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index;
    }

    info!(
        metric = %metric,
        variant = %variant,
        groups = entries.len(),
        "Damage ranking calculated"
    );
    Ok(DamageRanking {
        selection: RankSelection { metric, variant },
        entries,
    })
}

/// Calculates and retains damage rankings for one series, enforcing that a
/// ranking is computed before it is read back.
pub struct DamageRanker<'a> {
    series: &'a DoseSeries,
    ranking: Option<DamageRanking>,
}

impl<'a> DamageRanker<'a> {
    pub fn new(series: &'a DoseSeries) -> Self {
        Self {
            series,
            ranking: None,
        }
    }

    pub fn calculate_ranks(
        &mut self,
        metric: DensityMetric,
        variant: MetricVariant,
    ) -> Result<&DamageRanking, RankingError> {
        let ranking = calculate_ranks(self.series, metric, variant)?;
        Ok(self.ranking.insert(ranking))
    }

    /// The top `limit` entries of the last calculated ranking (0 = all).
    ///
    /// # Errors
    ///
    /// [`RankingError::RanksNotCalculated`] when no ranking has been
    /// calculated on this ranker yet.
    pub fn damage_ranks(&self, limit: usize) -> Result<&[DamageRankEntry], RankingError> {
        let ranking = self
            .ranking
            .as_ref()
            .ok_or(RankingError::RanksNotCalculated)?;
        Ok(ranking.top(limit))
    }

    pub fn ranking(&self) -> Option<&DamageRanking> {
        self.ranking.as_ref()
    }
}

/// One atom-type group's position in two independently computed rankings.
#[derive(Debug, Clone, PartialEq)]
pub struct RankPair {
    pub key: GroupKey,
    pub first_rank: usize,
    pub second_rank: usize,
}

/// The joined artifact of a two-selection rank comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRanks {
    pub first: RankSelection,
    pub second: RankSelection,
    pairs: Vec<RankPair>,
}

#[derive(Serialize)]
struct PairRow<'a> {
    residue_name: &'a str,
    atom_name: &'a str,
    binding: String,
    first_rank: usize,
    second_rank: usize,
}

impl PairedRanks {
    pub fn pairs(&self) -> &[RankPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Writes the paired ranks as CSV.
    pub fn write_csv(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for pair in &self.pairs {
            csv_writer.serialize(PairRow {
                residue_name: &pair.key.residue_name,
                atom_name: &pair.key.atom_name,
                binding: pair.key.binding.to_string(),
                first_rank: pair.first_rank,
                second_rank: pair.second_rank,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Computes two rankings independently and joins them by group key,
/// producing paired ranks for every group present in both. Groups present in
/// only one ranking are dropped from the comparison.
pub fn compare_rankings(
    series: &DoseSeries,
    first: RankSelection,
    second: RankSelection,
) -> Result<PairedRanks, RankingError> {
    let first_ranking = calculate_ranks(series, first.metric, first.variant)?;
    let second_ranking = calculate_ranks(series, second.metric, second.variant)?;

    let second_by_key: HashMap<&GroupKey, usize> = second_ranking
        .entries()
        .iter()
        .map(|e| (&e.key, e.rank))
        .collect();

    let pairs: Vec<RankPair> = first_ranking
        .entries()
        .iter()
        .filter_map(|entry| {
            second_by_key.get(&entry.key).map(|second_rank| RankPair {
                key: entry.key.clone(),
                first_rank: entry.rank,
                second_rank: *second_rank,
            })
        })
        .collect();

    info!(
        first = %first.label(),
        second = %second.label(),
        pairs = pairs.len(),
        "Paired rank comparison computed"
    );
    Ok(PairedRanks {
        first,
        second,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{AtomIdentity, DatasetAtomRecord, StructureAtom};
    use crate::core::models::dataset::DatasetMetricTable;
    use crate::engine::config::SeriesConfigBuilder;
    use nalgebra::Point3;

    /// Builds a three-dataset series over doses [1,2,3] from per-atom value
    /// triples for one metric.
    fn series_for(
        metric: DensityMetric,
        atoms: &[(isize, &str, &str, [f64; 3])],
    ) -> DoseSeries {
        let initial: Vec<StructureAtom> = atoms
            .iter()
            .enumerate()
            .map(|(i, (num, res, name, _))| StructureAtom {
                identity: AtomIdentity::new('A', *num, res, name),
                position: Point3::new(i as f64 * 100.0, 0.0, 0.0),
                occupancy: 1.0,
                b_factor: 20.0,
            })
            .collect();

        let tables: Vec<DatasetMetricTable> = (0..3)
            .map(|d| {
                let mut table = DatasetMetricTable::new();
                for (num, res, name, values) in atoms {
                    let mut record =
                        DatasetAtomRecord::new(AtomIdentity::new('A', *num, res, name));
                    record.set_metric(metric, values[d]);
                    table.insert(record);
                }
                table
            })
            .collect();

        let config = SeriesConfigBuilder::new()
            .doses(vec![1.0, 2.0, 3.0])
            .include_density_weighted(false)
            .build()
            .unwrap();
        DoseSeries::combine(&initial, &tables, &config).unwrap()
    }

    #[test]
    fn standard_loss_ranks_most_negative_slope_first() {
        // GLU OE1 slope -2.0, GLY CA slope -0.5, SER OG slope +0.1.
        let series = series_for(
            DensityMetric::Loss,
            &[
                (1, "GLY", "CA", [0.0, -0.5, -1.0]),
                (2, "GLU", "OE1", [0.0, -2.0, -4.0]),
                (3, "SER", "OG", [0.0, 0.1, 0.2]),
            ],
        );
        let ranking =
            calculate_ranks(&series, DensityMetric::Loss, MetricVariant::Standard).unwrap();

        let order: Vec<&str> = ranking
            .entries()
            .iter()
            .map(|e| e.key.residue_name.as_str())
            .collect();
        assert_eq!(order, vec!["GLU", "GLY", "SER"]);
        assert_eq!(ranking.entries()[0].rank, 0);
        assert_eq!(ranking.entries()[2].rank, 2);
    }

    #[test]
    fn standard_gain_ranks_largest_slope_first() {
        let series = series_for(
            DensityMetric::Gain,
            &[
                (1, "GLY", "CA", [0.0, 0.5, 1.0]),
                (2, "GLU", "OE1", [0.0, 2.0, 4.0]),
            ],
        );
        let ranking =
            calculate_ranks(&series, DensityMetric::Gain, MetricVariant::Standard).unwrap();

        assert_eq!(ranking.entries()[0].key.residue_name, "GLU");
        assert_eq!(ranking.entries()[0].rank, 0);
    }

    #[test]
    fn normalised_loss_sorts_inverse_of_standard_loss() {
        // Calpha slopes are negative, so normalised damage slopes are
        // positive and the most damaged group has the LARGEST value.
        let series_atoms: &[(isize, &str, &str, [f64; 3])] = &[
            (1, "GLU", "CA", [0.0, -1.0, -2.0]),
            (1, "GLU", "OE1", [0.0, -3.0, -6.0]),
            (2, "GLY", "CA", [0.0, -1.0, -2.0]),
        ];
        let mut series = series_for(DensityMetric::Loss, series_atoms);
        series.derive_calpha_normalised(&[DensityMetric::Loss]);

        let ranking = calculate_ranks(
            &series,
            DensityMetric::Loss,
            MetricVariant::CalphaNormalised,
        )
        .unwrap();

        // GLU OE1 normalised slope = 3.0; Calphas normalise to 1.0.
        assert_eq!(ranking.entries()[0].key.atom_name, "OE1");
    }

    #[test]
    fn group_score_is_mean_and_population_std_dev_of_member_slopes() {
        // Two GLU OE1 atoms with slopes -1.0 and -3.0.
        let series = series_for(
            DensityMetric::Loss,
            &[
                (1, "GLU", "OE1", [0.0, -1.0, -2.0]),
                (2, "GLU", "OE1", [0.0, -3.0, -6.0]),
            ],
        );
        let ranking =
            calculate_ranks(&series, DensityMetric::Loss, MetricVariant::Standard).unwrap();

        assert_eq!(ranking.entries().len(), 1);
        let entry = &ranking.entries()[0];
        assert_eq!(entry.atom_count, 2);
        assert!((entry.mean_slope - (-2.0)).abs() < 1e-9);
        assert!((entry.slope_std_dev - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ranking_is_deterministic_across_repeated_runs() {
        let series = series_for(
            DensityMetric::Loss,
            &[
                (1, "GLY", "CA", [0.0, -0.5, -1.0]),
                (2, "GLU", "OE1", [0.0, -2.0, -4.0]),
                (3, "SER", "OG", [0.0, 0.1, 0.2]),
                (4, "TYR", "OH", [0.0, -2.0, -4.0]),
            ],
        );
        let first =
            calculate_ranks(&series, DensityMetric::Loss, MetricVariant::Standard).unwrap();
        let second =
            calculate_ranks(&series, DensityMetric::Loss, MetricVariant::Standard).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn equal_slopes_tie_break_by_group_key() {
        // TYR OH and GLU OE1 share slope -2.0; GLU sorts first lexically.
        let series = series_for(
            DensityMetric::Loss,
            &[
                (1, "TYR", "OH", [0.0, -2.0, -4.0]),
                (2, "GLU", "OE1", [0.0, -2.0, -4.0]),
            ],
        );
        let ranking =
            calculate_ranks(&series, DensityMetric::Loss, MetricVariant::Standard).unwrap();

        assert_eq!(ranking.entries()[0].key.residue_name, "GLU");
        assert_eq!(ranking.entries()[1].key.residue_name, "TYR");
    }

    #[test]
    fn metric_not_present_in_series_gives_empty_ranking() {
        let series = series_for(
            DensityMetric::Loss,
            &[(1, "GLY", "CA", [0.0, -0.5, -1.0])],
        );
        let ranking =
            calculate_ranks(&series, DensityMetric::Gain, MetricVariant::Standard).unwrap();
        assert!(ranking.is_empty());
    }

    #[test]
    fn normalised_ranking_without_calphas_is_flagged_unavailable() {
        let series = series_for(DensityMetric::Loss, &[(1, "U", "P", [0.0, -0.5, -1.0])]);
        let err = calculate_ranks(
            &series,
            DensityMetric::Loss,
            MetricVariant::CalphaNormalised,
        )
        .unwrap_err();
        assert_eq!(err, RankingError::NormalisationUnavailable);
    }

    #[test]
    fn damage_ranks_before_calculation_is_a_usage_error() {
        let series = series_for(
            DensityMetric::Loss,
            &[(1, "GLY", "CA", [0.0, -0.5, -1.0])],
        );
        let ranker = DamageRanker::new(&series);
        assert_eq!(
            ranker.damage_ranks(0).unwrap_err(),
            RankingError::RanksNotCalculated
        );
    }

    #[test]
    fn damage_ranks_after_calculation_honours_limit() {
        let series = series_for(
            DensityMetric::Loss,
            &[
                (1, "GLY", "CA", [0.0, -0.5, -1.0]),
                (2, "GLU", "OE1", [0.0, -2.0, -4.0]),
                (3, "SER", "OG", [0.0, 0.1, 0.2]),
            ],
        );
        let mut ranker = DamageRanker::new(&series);
        ranker
            .calculate_ranks(DensityMetric::Loss, MetricVariant::Standard)
            .unwrap();

        assert_eq!(ranker.damage_ranks(2).unwrap().len(), 2);
        assert_eq!(ranker.damage_ranks(0).unwrap().len(), 3);
        assert_eq!(ranker.damage_ranks(99).unwrap().len(), 3);
    }

    #[test]
    fn comparison_joins_groups_present_in_both_rankings() {
        let series_atoms: &[(isize, &str, &str, [f64; 3])] = &[
            (1, "GLU", "CA", [0.0, -1.0, -2.0]),
            (1, "GLU", "OE1", [0.0, -3.0, -6.0]),
        ];
        let mut series = series_for(DensityMetric::Loss, series_atoms);
        series.derive_calpha_normalised(&[DensityMetric::Loss]);

        let paired = compare_rankings(
            &series,
            RankSelection {
                metric: DensityMetric::Loss,
                variant: MetricVariant::Standard,
            },
            RankSelection {
                metric: DensityMetric::Loss,
                variant: MetricVariant::CalphaNormalised,
            },
        )
        .unwrap();

        assert_eq!(paired.pairs().len(), 2);
        let oe1 = paired
            .pairs()
            .iter()
            .find(|p| p.key.atom_name == "OE1")
            .unwrap();
        // Most damaged in both orderings.
        assert_eq!(oe1.first_rank, 0);
        assert_eq!(oe1.second_rank, 0);
    }

    #[test]
    fn comparison_drops_groups_missing_from_one_ranking() {
        // OE1 has loss data only; CA has both loss and gain.
        let initial = vec![
            StructureAtom {
                identity: AtomIdentity::new('A', 1, "GLY", "CA"),
                position: Point3::origin(),
                occupancy: 1.0,
                b_factor: 20.0,
            },
            StructureAtom {
                identity: AtomIdentity::new('A', 2, "GLU", "OE1"),
                position: Point3::new(100.0, 0.0, 0.0),
                occupancy: 1.0,
                b_factor: 20.0,
            },
        ];
        let tables: Vec<DatasetMetricTable> = (0..2)
            .map(|d| {
                let mut table = DatasetMetricTable::new();
                let mut ca = DatasetAtomRecord::new(AtomIdentity::new('A', 1, "GLY", "CA"));
                ca.set_metric(DensityMetric::Loss, -(d as f64));
                ca.set_metric(DensityMetric::Gain, d as f64);
                table.insert(ca);
                let mut oe1 = DatasetAtomRecord::new(AtomIdentity::new('A', 2, "GLU", "OE1"));
                oe1.set_metric(DensityMetric::Loss, -2.0 * d as f64);
                table.insert(oe1);
                table
            })
            .collect();
        let config = SeriesConfigBuilder::new()
            .doses(vec![1.0, 2.0])
            .include_density_weighted(false)
            .build()
            .unwrap();
        let series = DoseSeries::combine(&initial, &tables, &config).unwrap();

        let paired = compare_rankings(
            &series,
            RankSelection {
                metric: DensityMetric::Loss,
                variant: MetricVariant::Standard,
            },
            RankSelection {
                metric: DensityMetric::Gain,
                variant: MetricVariant::Standard,
            },
        )
        .unwrap();

        assert_eq!(paired.pairs().len(), 1);
        assert_eq!(paired.pairs()[0].key.atom_name, "CA");
    }

    #[test]
    fn csv_output_contains_one_row_per_entry() {
        let series = series_for(
            DensityMetric::Loss,
            &[
                (1, "GLY", "CA", [0.0, -0.5, -1.0]),
                (2, "GLU", "OE1", [0.0, -2.0, -4.0]),
            ],
        );
        let ranking =
            calculate_ranks(&series, DensityMetric::Loss, MetricVariant::Standard).unwrap();

        let mut buffer = Vec::new();
        ranking.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "rank,residue_name,atom_name,binding,mean_slope,slope_std_dev,atom_count"
        );
        assert_eq!(lines.count(), 2);
        assert!(text.contains("GLU,OE1,unbound"));
    }

    #[test]
    fn selection_label_matches_reporting_format() {
        let selection = RankSelection {
            metric: DensityMetric::Loss,
            variant: MetricVariant::CalphaNormalised,
        };
        assert_eq!(selection.label(), "Calpha normalised Dloss");
    }
}
