//! Chart overlays computed from a closing-price series.
//!
//! Every function here is pure: the output depends only on the input slice
//! and parameters, and sums are accumulated left to right so that
//! recomputing the same series yields bit-identical values. Outputs are
//! parallel to the input; positions where the rolling window is still short
//! hold `None`.

use crate::error::{DashboardError, Result};
use ta::Close;

/// Overlay parameters. Defaults match the web dashboard: EMA 9/21 and
/// Bollinger 20 x 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorConfig {
    pub ema_short: usize,
    pub ema_long: usize,
    pub bb_period: usize,
    pub bb_multiplier: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_short: 9,
            ema_long: 21,
            bb_period: 20,
            bb_multiplier: 2.0,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, period) in [
            ("ema_short", self.ema_short),
            ("ema_long", self.ema_long),
            ("bb_period", self.bb_period),
        ] {
            if period == 0 {
                return Err(DashboardError::InvalidParameter(format!(
                    "{} must be positive",
                    name
                )));
            }
        }
        if !self.bb_multiplier.is_finite() {
            return Err(DashboardError::InvalidParameter(
                "bb_multiplier must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_input(closes: &[f64], period: usize) -> Result<()> {
    if period == 0 {
        return Err(DashboardError::InvalidParameter(
            "period must be positive".to_string(),
        ));
    }
    if closes.is_empty() {
        return Err(DashboardError::InvalidParameter(
            "price series is empty".to_string(),
        ));
    }
    Ok(())
}

/// Exponential moving average seeded with the simple average of the first
/// `period` closes. `k = 2 / (period + 1)`.
pub fn compute_ema(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    check_input(closes, period)?;

    let mut result = vec![None; closes.len()];
    if closes.len() < period {
        return Ok(result);
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = closes[..period].iter().fold(0.0, |acc, c| acc + c) / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..closes.len() {
        prev = closes[i] * k + prev * (1.0 - k);
        result[i] = Some(prev);
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger bands over a rolling window using the population standard
/// deviation (divide by `period`).
pub fn compute_bollinger_bands(
    closes: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<BollingerBands> {
    check_input(closes, period)?;
    if !multiplier.is_finite() {
        return Err(DashboardError::InvalidParameter(
            "multiplier must be finite".to_string(),
        ));
    }

    let n = closes.len();
    let mut bands = BollingerBands {
        upper: vec![None; n],
        middle: vec![None; n],
        lower: vec![None; n],
    };

    if n < period {
        return Ok(bands);
    }

    for i in (period - 1)..n {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().fold(0.0, |acc, c| acc + c) / period as f64;
        let variance = window
            .iter()
            .fold(0.0, |acc, c| acc + (c - mean) * (c - mean))
            / period as f64;
        let std = variance.sqrt();

        bands.upper[i] = Some(mean + std * multiplier);
        bands.middle[i] = Some(mean);
        bands.lower[i] = Some(mean - std * multiplier);
    }
    Ok(bands)
}

/// Bars that carry their own bucket time, in unix seconds.
pub trait Timestamped {
    fn timestamp(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    EmaShort,
    EmaLong,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
}

/// All overlays for one bar series, parallel to the bars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSeries {
    pub time: Vec<i64>,
    pub ema_short: Vec<Option<f64>>,
    pub ema_long: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn from_bars<T: Close + Timestamped>(bars: &[T], config: &IndicatorConfig) -> Result<Self> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        let time: Vec<i64> = bars.iter().map(|b| b.timestamp()).collect();
        let bands = compute_bollinger_bands(&closes, config.bb_period, config.bb_multiplier)?;
        Ok(Self {
            time,
            ema_short: compute_ema(&closes, config.ema_short)?,
            ema_long: compute_ema(&closes, config.ema_long)?,
            bb_upper: bands.upper,
            bb_middle: bands.middle,
            bb_lower: bands.lower,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn line(&self, overlay: Overlay) -> &[Option<f64>] {
        match overlay {
            Overlay::EmaShort => &self.ema_short,
            Overlay::EmaLong => &self.ema_long,
            Overlay::BollingerUpper => &self.bb_upper,
            Overlay::BollingerMiddle => &self.bb_middle,
            Overlay::BollingerLower => &self.bb_lower,
        }
    }

    /// Defined `(time, value)` pairs of one overlay, ready for plotting.
    pub fn points(&self, overlay: Overlay) -> Vec<(i64, f64)> {
        self.time
            .iter()
            .zip(self.line(overlay))
            .filter_map(|(t, v)| v.map(|v| (*t, v)))
            .collect()
    }

    /// Most recent defined value of an overlay.
    pub fn latest(&self, overlay: Overlay) -> Option<f64> {
        self.line(overlay).iter().rev().find_map(|v| *v)
    }
}
