use crate::error::MokuError;

/// Stepper actuators positioning the sensor over the drumhead.
///
/// The spatial scan takes this as an injected dependency; the motor hardware
/// itself (serial stepper driver) is an external collaborator not owned by
/// this crate. Positive step counts move outward/counter-clockwise, negative
/// counts reverse. Implementors map their own driver errors into
/// [`MokuError::Actuator`].
pub trait ScanActuator: Send {
    /// Move the radial actuator by a relative step count
    fn radial_go(&mut self, steps: i32) -> Result<(), MokuError>;

    /// Move the angular actuator by a relative step count
    fn angular_go(&mut self, steps: i32) -> Result<(), MokuError>;
}
