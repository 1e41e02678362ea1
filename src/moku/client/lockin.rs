use super::MokuClient;
use crate::error::MokuError;
use crate::types::MokuValue;

impl MokuClient {
    /// Set input channel coupling, impedance and attenuation
    pub fn set_frontend(
        &mut self,
        channel: i32,
        coupling: &str,
        impedance: &str,
        attenuation: &str,
    ) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetFrontend",
            vec![
                MokuValue::I32(channel),
                MokuValue::from(coupling),
                MokuValue::from(impedance),
                MokuValue::from(attenuation),
            ],
            vec!["i", "+*c", "+*c", "+*c"],
            vec![],
        )?;
        Ok(())
    }

    /// Set the demodulation source, reference frequency and phase
    pub fn set_demodulation(
        &mut self,
        source: &str,
        frequency: f64,
        phase: f64,
    ) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetDemodulation",
            vec![
                MokuValue::from(source),
                MokuValue::F64(frequency),
                MokuValue::F64(phase),
            ],
            vec!["+*c", "d", "d"],
            vec![],
        )?;
        Ok(())
    }

    /// Set the auxiliary sinewave output.
    ///
    /// A frequency of 0.0 leaves the output frequency unchanged and updates
    /// only the amplitude.
    pub fn set_aux_output(&mut self, frequency: f64, amplitude: f64) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetAuxOutput",
            vec![MokuValue::F64(frequency), MokuValue::F64(amplitude)],
            vec!["d", "d"],
            vec![],
        )?;
        Ok(())
    }

    /// Set the lowpass filter corner frequency and slope identifier
    pub fn set_filter(&mut self, corner: f64, slope: &str) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetFilter",
            vec![MokuValue::F64(corner), MokuValue::from(slope)],
            vec!["d", "+*c"],
            vec![],
        )?;
        Ok(())
    }

    /// Set post-detection gain [dB] for the main and aux outputs
    pub fn set_gain(&mut self, main: f64, aux: f64) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetGain",
            vec![MokuValue::F64(main), MokuValue::F64(aux)],
            vec!["d", "d"],
            vec![],
        )?;
        Ok(())
    }

    /// Assign a monitor source to an output channel
    pub fn set_monitor(&mut self, channel: i32, source: &str) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetMonitor",
            vec![MokuValue::I32(channel), MokuValue::from(source)],
            vec!["i", "+*c"],
            vec![],
        )?;
        Ok(())
    }

    /// Route the main and aux output signals
    pub fn set_outputs(&mut self, main: &str, aux: &str) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetOutputs",
            vec![MokuValue::from(main), MokuValue::from(aux)],
            vec!["+*c", "+*c"],
            vec![],
        )?;
        Ok(())
    }

    /// Set the polar mode output range
    pub fn set_polar_mode(&mut self, range: &str) -> Result<(), MokuError> {
        self.quick_send(
            "LIA.SetPolarMode",
            vec![MokuValue::from(range)],
            vec!["+*c"],
            vec![],
        )?;
        Ok(())
    }
}
