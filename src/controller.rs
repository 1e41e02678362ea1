use log::{info, warn};
use ndarray::Array2;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::actuator::ScanActuator;
use crate::config::ScanTiming;
use crate::error::MokuError;
use crate::moku::interface::{LockInInterface, AUX_FREQUENCY_UNCHANGED};
use crate::moku::MokuClient;
use crate::plotting;
use crate::types::{Amplitude, Frequency, LockinProfile, SampleReading, ScanResult, SpatialScanResult};

/// Output channel monitoring the lock-in main output
const MONITOR_CHANNEL: i32 = 2;

/// Spatial scan extents and step sizes, fixed to the drum bench geometry.
/// The `r`/`theta` arguments of [`DrumController::spatial_scan`] do not
/// change these; they only shape the rendered map.
const ANGULAR_POSITIONS: usize = 18;
const RADIAL_STEPS: usize = 10;
const RADIAL_STEP: i32 = 700;
const RADIAL_RETURN: i32 = -7250;
const RADIAL_BACKLASH_TAKEUP: i32 = 250;
const ANGULAR_STEP: i32 = 40;

const PROGRESS_BAR_WIDTH: usize = 25;

/// Controller for drumhead resonance measurements with a Moku:Go lock-in
/// amplifier.
///
/// Owns one instrument session and drives it strictly sequentially: every
/// scan blocks the calling thread for the full settle delay before each
/// sample. There is no cancellation mid-scan; interrupts are the calling
/// environment's responsibility.
pub struct DrumController {
    lia: Box<dyn LockInInterface>,
    timing: ScanTiming,
}

impl DrumController {
    /// Wrap an already-connected instrument (or a test double)
    pub fn new(lia: Box<dyn LockInInterface>, timing: ScanTiming) -> Self {
        Self { lia, timing }
    }

    /// Connect to the device at `address` and claim ownership.
    ///
    /// Fails if the device is unreachable or already owned and
    /// `force_connect` is false. With `apply_defaults`, immediately applies
    /// [`LockinProfile::default`] for the drum setup.
    pub fn connect(
        address: &str,
        force_connect: bool,
        apply_defaults: bool,
    ) -> Result<Self, MokuError> {
        let client = MokuClient::new(address, force_connect)?;
        let mut controller = Self::new(Box::new(client), ScanTiming::default());
        if apply_defaults {
            controller.configure(&LockinProfile::default())?;
        }
        Ok(controller)
    }

    /// Replace the scan settle timings
    pub fn set_timing(&mut self, timing: ScanTiming) {
        self.timing = timing;
    }

    /// Apply a lock-in configuration profile as one ordered sequence of
    /// instrument calls.
    ///
    /// Input channel 1 is the reflective sensor (AC coupled, 1 MOhm);
    /// output channel 1 carries the lock-in R output and channel 2 the
    /// reference sinewave for the shaker amplifier. A slope outside
    /// {6, 12, 18, 24} dB/octave issues no filter call and leaves the
    /// filter unconfigured. No rollback on failure: the first failing step
    /// aborts the sequence and the device keeps whatever partial state the
    /// preceding calls produced.
    pub fn configure(&mut self, profile: &LockinProfile) -> Result<(), MokuError> {
        self.lia.set_frontend(1, "AC", "1MOhm", "0dB")?;

        self.lia
            .set_demodulation("Internal", profile.frequency.value(), 0.0)?;

        self.lia
            .set_aux_output(profile.frequency.value(), profile.amplitude.value())?;

        match profile.lowpass_slope {
            6 => self.lia.set_filter(profile.lowpass_corner, "Slope6dB")?,
            12 => self.lia.set_filter(profile.lowpass_corner, "Slope12dB")?,
            18 => self.lia.set_filter(profile.lowpass_corner, "Slope18dB")?,
            24 => self.lia.set_filter(profile.lowpass_corner, "Slope24dB")?,
            other => warn!(
                "Lowpass slope {} dB/octave is not one of 6/12/18/24, filter left unconfigured",
                other
            ),
        }

        self.lia.set_gain(profile.gain_db, 1.0)?;

        self.lia.set_monitor(MONITOR_CHANNEL, "MainOutput")?;

        self.lia.set_outputs("R", "Demod")?;

        self.lia.set_polar_mode("7.5mVpp")?;

        info!(
            "Lock-in configured: {:.2} Hz, {:.3} V, lowpass {:.1} Hz @ {} dB/oct, gain {} dB",
            profile.frequency.value(),
            profile.amplitude.value(),
            profile.lowpass_corner,
            profile.lowpass_slope,
            profile.gain_db
        );

        Ok(())
    }

    /// Update only the output sinewave amplitude, frequency unchanged
    pub fn set_amplitude(&mut self, amplitude: Amplitude) -> Result<(), MokuError> {
        self.lia
            .set_aux_output(AUX_FREQUENCY_UNCHANGED, amplitude.value())
    }

    /// Update the lock-in reference frequency
    pub fn set_frequency(&mut self, frequency: Frequency, phase: f64) -> Result<(), MokuError> {
        self.lia
            .set_demodulation("Internal", frequency.value(), phase)
    }

    /// Read the mean of the monitored channel's buffered samples.
    ///
    /// An empty buffer is reported as a protocol error rather than a
    /// measured zero.
    pub fn read_output(&mut self) -> Result<f64, MokuError> {
        let data = self.lia.get_channel_data()?;
        let samples = &data.ch2;
        if samples.is_empty() {
            return Err(MokuError::Protocol(
                "No buffered samples on monitor channel".to_string(),
            ));
        }
        Ok(samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64)
    }

    /// Sweep the reference frequency and record the amplitude response at
    /// the current sensor position.
    ///
    /// Frequencies are visited in the given order; this is a physical sweep
    /// and reordering changes the settling behavior. After each frequency
    /// change the thread sleeps `settle_delay` before sampling. A failed
    /// read is recorded as [`SampleReading::Unavailable`] and the sweep
    /// continues; a failed frequency set aborts the sweep. One progress
    /// line is overwritten per step.
    pub fn scan(
        &mut self,
        frequencies: &[f64],
        settle_delay: Duration,
        plot: bool,
    ) -> Result<ScanResult, MokuError> {
        let n = frequencies.len();
        let mut points = Vec::with_capacity(n);

        for (i, &freq) in frequencies.iter().enumerate() {
            self.set_frequency(Frequency::hz(freq), 0.0)?;

            // Let the plate/drum settle
            thread::sleep(settle_delay);

            let reading = match self.read_output() {
                Ok(value) => SampleReading::Value(value),
                Err(e) => {
                    warn!("Read failed at {:.2} Hz: {}", freq, e);
                    SampleReading::Unavailable
                }
            };
            points.push((freq, reading));

            let filled = PROGRESS_BAR_WIDTH * i / n;
            print!(
                "\r[{:<width$}] {}%   Frequency = {:.2} Hz, LIA: {:.6}",
                "=".repeat(filled),
                100 * i / n,
                freq,
                reading.or_zero(),
                width = PROGRESS_BAR_WIDTH
            );
            let _ = std::io::stdout().flush();
        }
        println!();

        let result = ScanResult::new(points);
        if result.unavailable_count() > 0 {
            warn!(
                "{} of {} readings unavailable during sweep",
                result.unavailable_count(),
                result.len()
            );
        }

        if plot {
            if let Err(e) = plotting::plot_sweep(
                &result.frequencies(),
                &result.amplitudes_or_zero(),
                Some("Drumhead amplitude response"),
            ) {
                warn!("Sweep plot failed: {}", e);
            }
        }

        Ok(result)
    }

    /// Perform a polar spatial scan of the drumhead surface.
    ///
    /// For each of the fixed angular positions: read a baseline, then step
    /// the radial actuator outward ten times, settling and reading after
    /// each move; finally return the radial actuator to the
    /// origin (with backlash take-up) and advance the angular actuator.
    /// `r` and `theta` do not drive the sweep; they only shape the
    /// coordinate frame of the rendered map at `map_path`.
    pub fn spatial_scan(
        &mut self,
        actuator: &mut dyn ScanActuator,
        r: &[f64],
        theta: &[f64],
        map_path: Option<&Path>,
    ) -> Result<SpatialScanResult, MokuError> {
        let mut grid = Array2::zeros((ANGULAR_POSITIONS, RADIAL_STEPS + 1));

        for i in 0..ANGULAR_POSITIONS {
            grid[(i, 0)] = self.read_output()?;

            for j in 0..RADIAL_STEPS {
                actuator.radial_go(RADIAL_STEP)?;
                thread::sleep(self.timing.radial_settle());

                let value = self.read_output()?;
                grid[(i, j + 1)] = value;
                info!(
                    "theta: {}, radius: {}, LIA: {:.6}",
                    i * 10,
                    (j as i32 + 1) * RADIAL_STEP,
                    value
                );
            }

            actuator.radial_go(RADIAL_RETURN)?;
            actuator.radial_go(RADIAL_BACKLASH_TAKEUP)?;
            actuator.angular_go(ANGULAR_STEP)?;
            thread::sleep(self.timing.angular_settle());
        }

        let result = SpatialScanResult::new(grid);

        if let Some(path) = map_path {
            if let Err(e) = plotting::render_polar_map(result.grid(), r, theta, path) {
                warn!("Polar map rendering failed: {}", e);
            }
        }

        Ok(result)
    }

    /// Relinquish ownership of the device.
    ///
    /// Consumes the controller; the session cannot be used afterwards.
    pub fn close(mut self) -> Result<(), MokuError> {
        self.lia.relinquish_ownership()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moku::ChannelData;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockState {
        calls: Vec<&'static str>,
        demod: Vec<(String, f64, f64)>,
        aux: Vec<(f64, f64)>,
        filters: Vec<(f64, String)>,
        reads: usize,
        fail_reads_at: Vec<usize>,
        read_value: f32,
        relinquishes: usize,
    }

    struct MockLockIn(Arc<Mutex<MockState>>);

    impl MockLockIn {
        fn with_state() -> (Self, Arc<Mutex<MockState>>) {
            let state = Arc::new(Mutex::new(MockState {
                read_value: 0.25,
                ..MockState::default()
            }));
            (MockLockIn(state.clone()), state)
        }
    }

    impl LockInInterface for MockLockIn {
        fn set_frontend(
            &mut self,
            _channel: i32,
            _coupling: &str,
            _impedance: &str,
            _attenuation: &str,
        ) -> Result<(), MokuError> {
            self.0.lock().unwrap().calls.push("set_frontend");
            Ok(())
        }

        fn set_demodulation(
            &mut self,
            source: &str,
            frequency: f64,
            phase: f64,
        ) -> Result<(), MokuError> {
            let mut state = self.0.lock().unwrap();
            state.calls.push("set_demodulation");
            state.demod.push((source.to_string(), frequency, phase));
            Ok(())
        }

        fn set_aux_output(&mut self, frequency: f64, amplitude: f64) -> Result<(), MokuError> {
            let mut state = self.0.lock().unwrap();
            state.calls.push("set_aux_output");
            state.aux.push((frequency, amplitude));
            Ok(())
        }

        fn set_filter(&mut self, corner: f64, slope: &str) -> Result<(), MokuError> {
            let mut state = self.0.lock().unwrap();
            state.calls.push("set_filter");
            state.filters.push((corner, slope.to_string()));
            Ok(())
        }

        fn set_gain(&mut self, _main: f64, _aux: f64) -> Result<(), MokuError> {
            self.0.lock().unwrap().calls.push("set_gain");
            Ok(())
        }

        fn set_monitor(&mut self, _channel: i32, _source: &str) -> Result<(), MokuError> {
            self.0.lock().unwrap().calls.push("set_monitor");
            Ok(())
        }

        fn set_outputs(&mut self, _main: &str, _aux: &str) -> Result<(), MokuError> {
            self.0.lock().unwrap().calls.push("set_outputs");
            Ok(())
        }

        fn set_polar_mode(&mut self, _range: &str) -> Result<(), MokuError> {
            self.0.lock().unwrap().calls.push("set_polar_mode");
            Ok(())
        }

        fn get_channel_data(&mut self) -> Result<ChannelData, MokuError> {
            let mut state = self.0.lock().unwrap();
            let index = state.reads;
            state.reads += 1;
            if state.fail_reads_at.contains(&index) {
                return Err(MokuError::Protocol("no data".to_string()));
            }
            Ok(ChannelData {
                ch1: vec![],
                ch2: vec![state.read_value; 4],
            })
        }

        fn relinquish_ownership(&mut self) -> Result<(), MokuError> {
            self.0.lock().unwrap().relinquishes += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockActuator {
        radial: Vec<i32>,
        angular: Vec<i32>,
    }

    impl ScanActuator for MockActuator {
        fn radial_go(&mut self, steps: i32) -> Result<(), MokuError> {
            self.radial.push(steps);
            Ok(())
        }

        fn angular_go(&mut self, steps: i32) -> Result<(), MokuError> {
            self.angular.push(steps);
            Ok(())
        }
    }

    fn zero_timing() -> ScanTiming {
        ScanTiming {
            settle_secs: 0.0,
            radial_settle_secs: 0.0,
            angular_settle_secs: 0.0,
        }
    }

    #[test]
    fn test_scan_sets_each_frequency_in_order() {
        let (mock, state) = MockLockIn::with_state();
        let mut controller = DrumController::new(Box::new(mock), zero_timing());

        let freqs = vec![300.0, 310.0, 320.0];
        let result = controller.scan(&freqs, Duration::ZERO, false).unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.demod.len(), 3);
        let set: Vec<f64> = state.demod.iter().map(|(_, f, _)| *f).collect();
        assert_eq!(set, freqs);
        assert_eq!(result.len(), 3);
        assert_eq!(result.frequencies(), freqs);
    }

    #[test]
    fn test_scan_read_failure_is_non_fatal() {
        let (mock, state) = MockLockIn::with_state();
        state.lock().unwrap().fail_reads_at = vec![1];
        let mut controller = DrumController::new(Box::new(mock), zero_timing());

        let result = controller
            .scan(&[100.0, 110.0, 120.0], Duration::ZERO, false)
            .unwrap();

        assert_eq!(result.amplitudes_or_zero(), vec![0.25, 0.0, 0.25]);
        assert_eq!(result.unavailable_count(), 1);
        // The failed read did not stop the sweep
        assert_eq!(state.lock().unwrap().reads, 3);
    }

    #[test]
    fn test_configure_applies_steps_in_order() {
        let (mock, state) = MockLockIn::with_state();
        let mut controller = DrumController::new(Box::new(mock), zero_timing());

        controller.configure(&LockinProfile::default()).unwrap();

        let state = state.lock().unwrap();
        assert_eq!(
            state.calls,
            vec![
                "set_frontend",
                "set_demodulation",
                "set_aux_output",
                "set_filter",
                "set_gain",
                "set_monitor",
                "set_outputs",
                "set_polar_mode",
            ]
        );
        assert_eq!(state.filters, vec![(10.0, "Slope12dB".to_string())]);
    }

    #[test]
    fn test_configure_invalid_slope_skips_filter() {
        let (mock, state) = MockLockIn::with_state();
        let mut controller = DrumController::new(Box::new(mock), zero_timing());

        let profile = LockinProfile {
            lowpass_slope: 7,
            ..LockinProfile::default()
        };
        controller.configure(&profile).unwrap();

        let state = state.lock().unwrap();
        assert!(state.filters.is_empty());
        assert!(!state.calls.contains(&"set_filter"));
        // Remaining steps still applied
        assert!(state.calls.contains(&"set_gain"));
        assert!(state.calls.contains(&"set_polar_mode"));
    }

    #[test]
    fn test_set_amplitude_uses_frequency_unchanged_sentinel() {
        let (mock, state) = MockLockIn::with_state();
        let mut controller = DrumController::new(Box::new(mock), zero_timing());

        controller.configure(&LockinProfile::default()).unwrap();
        let aux_before = state.lock().unwrap().aux.len();

        controller.set_amplitude(Amplitude::volts(2.5)).unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.aux.len(), aux_before + 1);
        assert_eq!(*state.aux.last().unwrap(), (AUX_FREQUENCY_UNCHANGED, 2.5));
        // Demodulation frequency from configure is untouched
        assert_eq!(state.demod.len(), 1);
        assert_eq!(state.demod[0].1, 320.0);
    }

    #[test]
    fn test_spatial_scan_fixed_extents_ignore_axis_lengths() {
        let (mock, state) = MockLockIn::with_state();
        let mut controller = DrumController::new(Box::new(mock), zero_timing());
        let mut actuator = MockActuator::default();

        // Axis lengths deliberately unrelated to the sweep extents
        let r = vec![0.0, 700.0, 1400.0];
        let theta = vec![0.0, 0.5, 1.0, 1.5, 2.0];
        let result = controller
            .spatial_scan(&mut actuator, &r, &theta, None)
            .unwrap();

        assert_eq!(state.lock().unwrap().reads, 18 * (1 + 10));
        assert_eq!(result.angular_positions(), 18);
        assert_eq!(result.radial_positions(), 11);
        // Per pass: 10 outward steps, return, backlash take-up
        assert_eq!(actuator.radial.len(), 18 * 12);
        assert_eq!(actuator.angular, vec![40; 18]);
        assert_eq!(actuator.radial[10], -7250);
        assert_eq!(actuator.radial[11], 250);
    }

    #[test]
    fn test_close_relinquishes_exactly_once() {
        let (mock, state) = MockLockIn::with_state();
        let controller = DrumController::new(Box::new(mock), zero_timing());

        controller.close().unwrap();

        assert_eq!(state.lock().unwrap().relinquishes, 1);
    }
}
