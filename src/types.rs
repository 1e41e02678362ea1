use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::MokuError;

/// Values carried over the Moku command protocol.
#[derive(Debug, Clone)]
pub enum MokuValue {
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
    String(String),
    ArrayF32(Vec<f32>),
}

impl From<i32> for MokuValue {
    fn from(value: i32) -> Self {
        MokuValue::I32(value)
    }
}

impl From<u32> for MokuValue {
    fn from(value: u32) -> Self {
        MokuValue::U32(value)
    }
}

impl From<f32> for MokuValue {
    fn from(value: f32) -> Self {
        MokuValue::F32(value)
    }
}

impl From<f64> for MokuValue {
    fn from(value: f64) -> Self {
        MokuValue::F64(value)
    }
}

impl From<&str> for MokuValue {
    fn from(value: &str) -> Self {
        MokuValue::String(value.to_string())
    }
}

impl MokuValue {
    /// Extract i32 value with type checking
    pub fn as_i32(&self) -> Result<i32, MokuError> {
        match self {
            MokuValue::I32(v) => Ok(*v),
            _ => Err(MokuError::Type(format!("Expected i32, got {self:?}"))),
        }
    }

    /// Extract f64 value with type checking
    pub fn as_f64(&self) -> Result<f64, MokuError> {
        match self {
            MokuValue::F64(v) => Ok(*v),
            _ => Err(MokuError::Type(format!("Expected f64, got {self:?}"))),
        }
    }

    /// Extract f32 array with type checking
    pub fn as_f32_array(&self) -> Result<&[f32], MokuError> {
        match self {
            MokuValue::ArrayF32(arr) => Ok(arr),
            _ => Err(MokuError::Type(format!(
                "Expected f32 array, got {self:?}"
            ))),
        }
    }
}

/// Frequency in Hz
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(f64);

impl Frequency {
    pub fn hz(value: f64) -> Self {
        Frequency(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Frequency {
    fn from(value: f64) -> Self {
        Frequency(value)
    }
}

impl From<Frequency> for f64 {
    fn from(freq: Frequency) -> Self {
        freq.0
    }
}

/// Amplitude in volts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amplitude(f64);

impl Amplitude {
    pub fn volts(value: f64) -> Self {
        Amplitude(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Amplitude {
    fn from(value: f64) -> Self {
        Amplitude(value)
    }
}

impl From<Amplitude> for f64 {
    fn from(amp: Amplitude) -> Self {
        amp.0
    }
}

/// Lock-in configuration profile for the drum setup.
///
/// Applied as an ordered sequence of instrument calls by
/// [`DrumController::configure`](crate::DrumController::configure).
/// `lowpass_slope` is given in dB per octave; only 6, 12, 18 and 24 map to an
/// instrument slope setting. Any other value leaves the filter unconfigured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockinProfile {
    /// Reference/output sinewave frequency [Hz]
    pub frequency: Frequency,
    /// Output sinewave amplitude [V]
    pub amplitude: Amplitude,
    /// Lowpass filter corner frequency [Hz]
    pub lowpass_corner: f64,
    /// Lowpass filter slope [dB/octave], one of 6, 12, 18, 24
    pub lowpass_slope: u32,
    /// Post-detection gain [dB]
    pub gain_db: f64,
}

impl Default for LockinProfile {
    fn default() -> Self {
        Self {
            frequency: Frequency::hz(320.0),
            amplitude: Amplitude::volts(0.100),
            lowpass_corner: 10.0,
            lowpass_slope: 12,
            gain_db: 40.0,
        }
    }
}

/// A single sample taken during a scan.
///
/// Distinguishes a measured value from a read that returned no data, so the
/// caller decides the substitution policy instead of the scan loop conflating
/// "no data" with "measured zero".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleReading {
    Value(f64),
    Unavailable,
}

impl SampleReading {
    /// Measured value, or 0.0 when the read failed.
    pub fn or_zero(&self) -> f64 {
        match self {
            SampleReading::Value(v) => *v,
            SampleReading::Unavailable => 0.0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SampleReading::Value(_))
    }
}

/// Ordered result of a frequency sweep.
#[derive(Debug, Clone)]
pub struct ScanResult {
    started_at: DateTime<Utc>,
    points: Vec<(f64, SampleReading)>,
}

impl ScanResult {
    pub fn new(points: Vec<(f64, SampleReading)>) -> Self {
        Self {
            started_at: Utc::now(),
            points,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn points(&self) -> &[(f64, SampleReading)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|(f, _)| *f).collect()
    }

    /// Amplitudes with failed reads substituted by 0.0
    pub fn amplitudes_or_zero(&self) -> Vec<f64> {
        self.points.iter().map(|(_, r)| r.or_zero()).collect()
    }

    /// Number of samples where the instrument returned no data
    pub fn unavailable_count(&self) -> usize {
        self.points
            .iter()
            .filter(|(_, r)| !r.is_available())
            .count()
    }
}

/// Grid of readings from a polar spatial scan, indexed by
/// (angular index, radial index). Radial index 0 is the baseline reading
/// taken before the first radial move of each pass.
#[derive(Debug, Clone)]
pub struct SpatialScanResult {
    started_at: DateTime<Utc>,
    grid: Array2<f64>,
}

impl SpatialScanResult {
    pub fn new(grid: Array2<f64>) -> Self {
        Self {
            started_at: Utc::now(),
            grid,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn grid(&self) -> &Array2<f64> {
        &self.grid
    }

    /// Number of angular positions in the grid
    pub fn angular_positions(&self) -> usize {
        self.grid.nrows()
    }

    /// Number of readings per angular pass (baseline + radial steps)
    pub fn radial_positions(&self) -> usize {
        self.grid.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_drum_setup() {
        let profile = LockinProfile::default();
        assert_eq!(profile.frequency.value(), 320.0);
        assert_eq!(profile.amplitude.value(), 0.100);
        assert_eq!(profile.lowpass_corner, 10.0);
        assert_eq!(profile.lowpass_slope, 12);
        assert_eq!(profile.gain_db, 40.0);
    }

    #[test]
    fn test_sample_reading_or_zero() {
        assert_eq!(SampleReading::Value(1.5).or_zero(), 1.5);
        assert_eq!(SampleReading::Unavailable.or_zero(), 0.0);
    }

    #[test]
    fn test_scan_result_substitution() {
        let result = ScanResult::new(vec![
            (100.0, SampleReading::Value(0.2)),
            (110.0, SampleReading::Unavailable),
            (120.0, SampleReading::Value(0.4)),
        ]);
        assert_eq!(result.frequencies(), vec![100.0, 110.0, 120.0]);
        assert_eq!(result.amplitudes_or_zero(), vec![0.2, 0.0, 0.4]);
        assert_eq!(result.unavailable_count(), 1);
    }

    #[test]
    fn test_moku_value_type_check() {
        assert!(MokuValue::F64(1.0).as_f64().is_ok());
        assert!(MokuValue::I32(1).as_f64().is_err());
        assert!(MokuValue::ArrayF32(vec![1.0]).as_f32_array().is_ok());
    }
}
