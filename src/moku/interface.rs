use crate::error::MokuError;
use crate::moku::client::data::ChannelData;

/// Sentinel frequency for [`LockInInterface::set_aux_output`]: leaves the
/// aux output frequency unchanged and updates only the amplitude.
pub const AUX_FREQUENCY_UNCHANGED: f64 = 0.0;

/// Remote lock-in amplifier operations used by the drum controller.
///
/// Abstracts the instrument command set behind universal lock-in concepts so
/// scan logic can run against a test double instead of hardware. The TCP
/// client implements this trait; richer instrument state stays on the device
/// and is opaque here.
pub trait LockInInterface: Send {
    /// Configure input channel coupling, impedance and attenuation
    fn set_frontend(
        &mut self,
        channel: i32,
        coupling: &str,
        impedance: &str,
        attenuation: &str,
    ) -> Result<(), MokuError>;

    /// Set demodulation source, reference frequency [Hz] and phase [deg]
    fn set_demodulation(
        &mut self,
        source: &str,
        frequency: f64,
        phase: f64,
    ) -> Result<(), MokuError>;

    /// Set the auxiliary sinewave output; frequency
    /// [`AUX_FREQUENCY_UNCHANGED`] updates only the amplitude
    fn set_aux_output(&mut self, frequency: f64, amplitude: f64) -> Result<(), MokuError>;

    /// Set the lowpass filter corner frequency [Hz] and slope identifier
    fn set_filter(&mut self, corner: f64, slope: &str) -> Result<(), MokuError>;

    /// Set post-detection gain [dB] for main and aux outputs
    fn set_gain(&mut self, main: f64, aux: f64) -> Result<(), MokuError>;

    /// Assign a monitor source to an output channel
    fn set_monitor(&mut self, channel: i32, source: &str) -> Result<(), MokuError>;

    /// Route the main and aux output signals
    fn set_outputs(&mut self, main: &str, aux: &str) -> Result<(), MokuError>;

    /// Set the polar mode output range
    fn set_polar_mode(&mut self, range: &str) -> Result<(), MokuError>;

    /// Fetch the currently buffered monitor channel data
    fn get_channel_data(&mut self) -> Result<ChannelData, MokuError>;

    /// Release the ownership claim on the device
    fn relinquish_ownership(&mut self) -> Result<(), MokuError>;
}
