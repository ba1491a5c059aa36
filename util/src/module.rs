//! Cyclic module interface
//!
//! A cyclic module is initialised once and then processed once per control cycle. Line control is
//! the main example: it is initialised from its parameters, and each cycle turns a sensor
//! snapshot into motor demands plus a status report which can be archived.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The state of a cyclic module.
pub trait State {
    /// Data needed to initialise the module, usually its parameters.
    type InitData;
    type InitError;

    /// Data consumed by one cycle.
    type InputData;
    /// Data produced by one cycle.
    type OutputData;
    /// What happened during the cycle, for logging and archiving.
    type StatusReport;
    type ProcError;

    /// Initialise, or reinitialise, the module.
    ///
    /// Any state from previous cycles is discarded.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Run one cycle.
    ///
    /// Returns the cycle's output together with its status report. Modules which have not been
    /// initialised shall return an error rather than produce output.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
