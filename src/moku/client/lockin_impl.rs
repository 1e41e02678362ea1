use super::data::ChannelData;
use super::MokuClient;
use crate::error::MokuError;
use crate::moku::interface::LockInInterface;

/// Implementation of LockInInterface for MokuClient.
///
/// Forwards universal lock-in operations to the inherent TCP command
/// wrappers; explicit calls where trait and inherent method names collide.
impl LockInInterface for MokuClient {
    fn set_frontend(
        &mut self,
        channel: i32,
        coupling: &str,
        impedance: &str,
        attenuation: &str,
    ) -> Result<(), MokuError> {
        MokuClient::set_frontend(self, channel, coupling, impedance, attenuation)
    }

    fn set_demodulation(
        &mut self,
        source: &str,
        frequency: f64,
        phase: f64,
    ) -> Result<(), MokuError> {
        MokuClient::set_demodulation(self, source, frequency, phase)
    }

    fn set_aux_output(&mut self, frequency: f64, amplitude: f64) -> Result<(), MokuError> {
        MokuClient::set_aux_output(self, frequency, amplitude)
    }

    fn set_filter(&mut self, corner: f64, slope: &str) -> Result<(), MokuError> {
        MokuClient::set_filter(self, corner, slope)
    }

    fn set_gain(&mut self, main: f64, aux: f64) -> Result<(), MokuError> {
        MokuClient::set_gain(self, main, aux)
    }

    fn set_monitor(&mut self, channel: i32, source: &str) -> Result<(), MokuError> {
        MokuClient::set_monitor(self, channel, source)
    }

    fn set_outputs(&mut self, main: &str, aux: &str) -> Result<(), MokuError> {
        MokuClient::set_outputs(self, main, aux)
    }

    fn set_polar_mode(&mut self, range: &str) -> Result<(), MokuError> {
        MokuClient::set_polar_mode(self, range)
    }

    fn get_channel_data(&mut self) -> Result<ChannelData, MokuError> {
        self.get_data()
    }

    fn relinquish_ownership(&mut self) -> Result<(), MokuError> {
        MokuClient::relinquish_ownership(self)
    }
}
