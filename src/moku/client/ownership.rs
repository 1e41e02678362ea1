use super::MokuClient;
use crate::error::MokuError;
use crate::types::MokuValue;

impl MokuClient {
    /// Claim ownership of the device.
    ///
    /// Fails with [`MokuError::InstrumentError`] if the device is already
    /// owned by another client and `force` is false.
    pub fn claim_ownership(&mut self, force: bool) -> Result<(), MokuError> {
        let force_flag = if force { 1u32 } else { 0u32 };
        self.quick_send(
            "Moku.ClaimOwnership",
            vec![MokuValue::U32(force_flag)],
            vec!["I"],
            vec![],
        )?;
        Ok(())
    }

    /// Relinquish ownership so another client can claim the device
    pub fn relinquish_ownership(&mut self) -> Result<(), MokuError> {
        self.quick_send("Moku.RelinquishOwnership", vec![], vec![], vec![])?;
        Ok(())
    }
}
