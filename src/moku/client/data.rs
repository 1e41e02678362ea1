use super::MokuClient;
use crate::error::MokuError;

/// Buffered samples from the two monitor channels.
#[derive(Debug, Clone)]
pub struct ChannelData {
    pub ch1: Vec<f32>,
    pub ch2: Vec<f32>,
}

impl MokuClient {
    /// Fetch the currently buffered monitor channel data.
    ///
    /// Returns whatever block the instrument has buffered; no block size
    /// control is exposed.
    pub fn get_data(&mut self) -> Result<ChannelData, MokuError> {
        let result = self.quick_send("LIA.GetData", vec![], vec![], vec!["i", "*f", "i", "*f"])?;

        if result.len() >= 4 {
            let ch1 = result[1].as_f32_array()?.to_vec();
            let ch2 = result[3].as_f32_array()?.to_vec();
            Ok(ChannelData { ch1, ch2 })
        } else {
            Err(MokuError::Protocol(
                "Incomplete channel data response".to_string(),
            ))
        }
    }
}
