//! Layers: named 2D data grids attached to a World, optionally carrying
//! classification metadata (ordered thresholds, or a quantile table).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::biome::Biome;
use crate::error::{Result, WorldError};
use crate::grid::Grid;

/// The cell payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerData {
    Float(Grid<f64>),
    Bool(Grid<bool>),
    Int(Grid<u16>),
    Biome(Grid<Biome>),
}

impl LayerData {
    pub fn width(&self) -> usize {
        match self {
            LayerData::Float(g) => g.width(),
            LayerData::Bool(g) => g.width(),
            LayerData::Int(g) => g.width(),
            LayerData::Biome(g) => g.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            LayerData::Float(g) => g.height(),
            LayerData::Bool(g) => g.height(),
            LayerData::Int(g) => g.height(),
            LayerData::Biome(g) => g.height(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            LayerData::Float(_) => "float data",
            LayerData::Bool(_) => "bool data",
            LayerData::Int(_) => "int data",
            LayerData::Biome(_) => "biome data",
        }
    }
}

/// One labelled band: cells below `upper` (or all remaining cells when
/// `upper` is `None`, the trailing open band) belong to it.
pub type ThresholdBand = (String, Option<f64>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub data: LayerData,
    /// Ordered `(label, upper bound)` pairs; bounds strictly increasing,
    /// last entry open (`None`). Present on banded layers only.
    pub thresholds: Option<Vec<ThresholdBand>>,
    /// Percentile-label → value map. Present on quantile layers only.
    pub quantiles: Option<BTreeMap<String, f64>>,
}

impl Layer {
    pub fn plain(data: LayerData) -> Self {
        Self {
            data,
            thresholds: None,
            quantiles: None,
        }
    }

    /// A layer with ordered classification bands. Monotonicity is checked
    /// here so a malformed stage output fails at install time.
    pub fn with_thresholds(
        name: &str,
        data: LayerData,
        thresholds: Vec<ThresholdBand>,
    ) -> Result<Self> {
        let mut prev: Option<f64> = None;
        for (i, (_, bound)) in thresholds.iter().enumerate() {
            match bound {
                Some(b) => {
                    if let Some(p) = prev {
                        if *b <= p {
                            return Err(WorldError::InvalidThresholds {
                                layer: name.to_string(),
                                prev: p,
                                next: *b,
                            });
                        }
                    }
                    prev = Some(*b);
                }
                None => {
                    if i + 1 != thresholds.len() {
                        return Err(WorldError::InvalidParameter(format!(
                            "layer '{name}': open threshold bound before the last band"
                        )));
                    }
                }
            }
        }
        Ok(Self {
            data,
            thresholds: Some(thresholds),
            quantiles: None,
        })
    }

    pub fn with_quantiles(data: LayerData, quantiles: BTreeMap<String, f64>) -> Self {
        Self {
            data,
            thresholds: None,
            quantiles: Some(quantiles),
        }
    }

    pub fn as_float(&self, name: &str) -> Result<&Grid<f64>> {
        match &self.data {
            LayerData::Float(g) => Ok(g),
            other => Err(WorldError::LayerKind {
                layer: name.to_string(),
                expected: "float data",
                got: other.kind(),
            }),
        }
    }

    pub fn as_bool(&self, name: &str) -> Result<&Grid<bool>> {
        match &self.data {
            LayerData::Bool(g) => Ok(g),
            other => Err(WorldError::LayerKind {
                layer: name.to_string(),
                expected: "bool data",
                got: other.kind(),
            }),
        }
    }

    pub fn as_biome(&self, name: &str) -> Result<&Grid<Biome>> {
        match &self.data {
            LayerData::Biome(g) => Ok(g),
            other => Err(WorldError::LayerKind {
                layer: name.to_string(),
                expected: "biome data",
                got: other.kind(),
            }),
        }
    }

    /// Index of the band a value falls into: the first band whose upper
    /// bound exceeds the value, else the trailing open band.
    pub fn band_index(&self, value: f64) -> Option<usize> {
        let th = self.thresholds.as_ref()?;
        for (i, (_, bound)) in th.iter().enumerate() {
            match bound {
                Some(b) if value < *b => return Some(i),
                Some(_) => {}
                None => return Some(i),
            }
        }
        Some(th.len().saturating_sub(1))
    }

    /// Quantile value by percentile label.
    pub fn quantile(&self, label: &str) -> Option<f64> {
        self.quantiles.as_ref()?.get(label).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_grid() -> LayerData {
        LayerData::Float(Grid::filled(4, 4, 0.0))
    }

    #[test]
    fn threshold_monotonicity_enforced() {
        let bands = vec![
            ("sea".to_string(), Some(1.0)),
            ("plain".to_string(), Some(0.5)),
            ("hill".to_string(), None),
        ];
        assert!(Layer::with_thresholds("elevation", float_grid(), bands).is_err());
    }

    #[test]
    fn open_bound_only_allowed_last() {
        let bands = vec![
            ("sea".to_string(), None),
            ("plain".to_string(), Some(0.5)),
        ];
        assert!(Layer::with_thresholds("elevation", float_grid(), bands).is_err());
    }

    #[test]
    fn band_index_walks_ordered_bounds() {
        let bands = vec![
            ("low".to_string(), Some(1.0)),
            ("mid".to_string(), Some(2.0)),
            ("high".to_string(), None),
        ];
        let layer = Layer::with_thresholds("t", float_grid(), bands).unwrap();
        assert_eq!(layer.band_index(0.5), Some(0));
        assert_eq!(layer.band_index(1.5), Some(1));
        assert_eq!(layer.band_index(99.0), Some(2));
    }

    #[test]
    fn kind_mismatch_reports_both_kinds() {
        let layer = Layer::plain(float_grid());
        let err = layer.as_bool("ocean").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bool") && msg.contains("float"), "got: {msg}");
    }
}
