use super::atom::{AtomIdentity, BindingState};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Per-atom density-change metrics derived from difference maps.
///
/// The vocabulary is fixed by the external map-processing stage; names parse
/// case-insensitively from the forms that stage writes into its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DensityMetric {
    /// Maximum electron-density loss at the atom's site (Dloss).
    Loss,
    /// Mean density change over the atom's local region (Dmean).
    Mean,
    /// Maximum density gain at the atom's site (Dgain).
    Gain,
    /// Net density change at the atom's site (Dnet).
    Net,
    /// Refinement B-factor carried through from the coordinate model.
    Bfactor,
    /// Density-weighted loss; requires calculated (FC) maps.
    DensityWeightedLoss,
    /// Density-weighted mean change; requires calculated (FC) maps.
    DensityWeightedMean,
    /// Density-weighted mean over negative-density voxels only; requires calculated (FC) maps.
    DensityWeightedMeanNegOnly,
}

impl DensityMetric {
    /// Whether deriving this metric needs calculated (FC) maps in addition to
    /// the experimental difference maps. These metrics are only present when
    /// the map-processing stage was run with FC map generation enabled.
    pub fn requires_calculated_maps(&self) -> bool {
        matches!(
            self,
            DensityMetric::DensityWeightedLoss
                | DensityMetric::DensityWeightedMean
                | DensityMetric::DensityWeightedMeanNegOnly
        )
    }
}

impl fmt::Display for DensityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DensityMetric::Loss => "loss",
            DensityMetric::Mean => "mean",
            DensityMetric::Gain => "gain",
            DensityMetric::Net => "net",
            DensityMetric::Bfactor => "Bfactor",
            DensityMetric::DensityWeightedLoss => "density_weighted_loss",
            DensityMetric::DensityWeightedMean => "density_weighted_mean",
            DensityMetric::DensityWeightedMeanNegOnly => "density_weighted_mean_negOnly",
        };
        write!(f, "{}", name)
    }
}

/// Error produced when a metric name is not part of the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown density metric name: '{0}'")]
pub struct ParseMetricError(pub String);

impl FromStr for DensityMetric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loss" | "dloss" => Ok(DensityMetric::Loss),
            "mean" | "dmean" => Ok(DensityMetric::Mean),
            "gain" | "dgain" => Ok(DensityMetric::Gain),
            "net" | "dnet" => Ok(DensityMetric::Net),
            "bfactor" => Ok(DensityMetric::Bfactor),
            "density_weighted_loss" => Ok(DensityMetric::DensityWeightedLoss),
            "density_weighted_mean" => Ok(DensityMetric::DensityWeightedMean),
            "density_weighted_mean_negonly" => Ok(DensityMetric::DensityWeightedMeanNegOnly),
            _ => Err(ParseMetricError(s.to_string())),
        }
    }
}

/// Normalisation variant under which a metric series is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MetricVariant {
    /// Raw per-dataset values as produced by map processing.
    #[default]
    Standard,
    /// Values expressed relative to the residue's backbone Calpha trend.
    CalphaNormalised,
}

impl MetricVariant {
    pub fn from_normalised(normalised: bool) -> Self {
        if normalised {
            MetricVariant::CalphaNormalised
        } else {
            MetricVariant::Standard
        }
    }
}

impl fmt::Display for MetricVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricVariant::Standard => write!(f, "Standard"),
            MetricVariant::CalphaNormalised => write!(f, "Calpha normalised"),
        }
    }
}

/// Key addressing one stored series on a combined atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub metric: DensityMetric,
    pub variant: MetricVariant,
}

impl MetricKey {
    pub fn standard(metric: DensityMetric) -> Self {
        Self {
            metric,
            variant: MetricVariant::Standard,
        }
    }

    pub fn normalised(metric: DensityMetric) -> Self {
        Self {
            metric,
            variant: MetricVariant::CalphaNormalised,
        }
    }
}

/// A fitted linear trend of metric value against dose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Gradient of the least-squares line.
    pub slope: f64,
    /// Intercept of the least-squares line.
    pub intercept: f64,
    /// Standard error of the slope estimate.
    pub std_err: f64,
}

/// A dose-indexed sequence of metric values with its fitted trend.
///
/// The value vector always has one entry per dataset in the series, in
/// dataset (increasing-dose) order. The fit is absent when the series was too
/// short to regress.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    values: Vec<f64>,
    fit: Option<LinearFit>,
}

impl MetricSeries {
    pub fn new(values: Vec<f64>, fit: Option<LinearFit>) -> Self {
        Self { values, fit }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn fit(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One atom's full damage record across the dose series.
///
/// Built by the combine stage from the per-dataset records; series data is
/// read-only from outside the engine so that derived-metric computations can
/// rely on previously stored values staying stable.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedAtom {
    identity: AtomIdentity,
    binding: BindingState,
    series: HashMap<MetricKey, MetricSeries>,
    averages: HashMap<DensityMetric, f64>,
}

impl CombinedAtom {
    pub(crate) fn new(identity: AtomIdentity, binding: BindingState) -> Self {
        Self {
            identity,
            binding,
            series: HashMap::new(),
            averages: HashMap::new(),
        }
    }

    pub fn identity(&self) -> &AtomIdentity {
        &self.identity
    }

    pub fn binding(&self) -> BindingState {
        self.binding
    }

    pub fn series(&self, metric: DensityMetric, variant: MetricVariant) -> Option<&MetricSeries> {
        self.series.get(&MetricKey { metric, variant })
    }

    /// Fitted slope for the selected metric and variant, if a fit exists.
    pub fn slope(&self, metric: DensityMetric, variant: MetricVariant) -> Option<f64> {
        self.series(metric, variant)?.fit().map(|f| f.slope)
    }

    /// Standard error of the fitted slope for the selected metric and variant.
    pub fn slope_std_err(&self, metric: DensityMetric, variant: MetricVariant) -> Option<f64> {
        self.series(metric, variant)?.fit().map(|f| f.std_err)
    }

    /// The derived "average" value for a metric: the arithmetic mean of the
    /// Standard dose-series values, present once `derive_average` has run.
    pub fn average(&self, metric: DensityMetric) -> Option<f64> {
        self.averages.get(&metric).copied()
    }

    /// Metric/variant keys stored on this atom.
    pub fn metric_keys(&self) -> impl Iterator<Item = MetricKey> + '_ {
        self.series.keys().copied()
    }

    pub(crate) fn insert_series(&mut self, key: MetricKey, series: MetricSeries) {
        self.series.insert(key, series);
    }

    pub(crate) fn insert_average(&mut self, metric: DensityMetric, value: f64) {
        self.averages.insert(metric, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_parse_case_insensitively() {
        assert_eq!("loss".parse(), Ok(DensityMetric::Loss));
        assert_eq!("Loss".parse(), Ok(DensityMetric::Loss));
        assert_eq!("DLOSS".parse(), Ok(DensityMetric::Loss));
        assert_eq!("Bfactor".parse(), Ok(DensityMetric::Bfactor));
        assert_eq!("bfactor".parse(), Ok(DensityMetric::Bfactor));
        assert_eq!(
            "density_weighted_mean_negOnly".parse(),
            Ok(DensityMetric::DensityWeightedMeanNegOnly)
        );
    }

    #[test]
    fn unknown_metric_name_is_a_parse_error() {
        let err = "wibble".parse::<DensityMetric>().unwrap_err();
        assert_eq!(err, ParseMetricError("wibble".to_string()));
    }

    #[test]
    fn display_round_trips_every_metric() {
        let all = [
            DensityMetric::Loss,
            DensityMetric::Mean,
            DensityMetric::Gain,
            DensityMetric::Net,
            DensityMetric::Bfactor,
            DensityMetric::DensityWeightedLoss,
            DensityMetric::DensityWeightedMean,
            DensityMetric::DensityWeightedMeanNegOnly,
        ];
        for metric in all {
            assert_eq!(metric.to_string().parse(), Ok(metric));
        }
    }

    #[test]
    fn only_density_weighted_metrics_require_calculated_maps() {
        assert!(!DensityMetric::Loss.requires_calculated_maps());
        assert!(!DensityMetric::Bfactor.requires_calculated_maps());
        assert!(DensityMetric::DensityWeightedLoss.requires_calculated_maps());
        assert!(DensityMetric::DensityWeightedMean.requires_calculated_maps());
        assert!(DensityMetric::DensityWeightedMeanNegOnly.requires_calculated_maps());
    }

    #[test]
    fn variant_from_bool_and_display() {
        assert_eq!(MetricVariant::from_normalised(false), MetricVariant::Standard);
        assert_eq!(
            MetricVariant::from_normalised(true),
            MetricVariant::CalphaNormalised
        );
        assert_eq!(MetricVariant::Standard.to_string(), "Standard");
        assert_eq!(
            MetricVariant::CalphaNormalised.to_string(),
            "Calpha normalised"
        );
    }

    #[test]
    fn combined_atom_exposes_inserted_series_read_only() {
        let identity = AtomIdentity::new('A', 5, "TYR", "OH");
        let mut atom = CombinedAtom::new(identity, BindingState::Unbound);
        let fit = LinearFit {
            slope: 2.0,
            intercept: -2.0,
            std_err: 0.0,
        };
        atom.insert_series(
            MetricKey::standard(DensityMetric::Loss),
            MetricSeries::new(vec![0.0, 2.0, 4.0], Some(fit)),
        );

        let series = atom
            .series(DensityMetric::Loss, MetricVariant::Standard)
            .unwrap();
        assert_eq!(series.values(), &[0.0, 2.0, 4.0]);
        assert_eq!(atom.slope(DensityMetric::Loss, MetricVariant::Standard), Some(2.0));
        assert_eq!(
            atom.slope(DensityMetric::Loss, MetricVariant::CalphaNormalised),
            None
        );
    }

    #[test]
    fn average_is_absent_until_derived() {
        let atom = CombinedAtom::new(
            AtomIdentity::new('A', 5, "TYR", "OH"),
            BindingState::Unbound,
        );
        assert_eq!(atom.average(DensityMetric::Loss), None);
    }
}
