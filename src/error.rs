use thiserror::Error;

/// Result type used throughout the simulation engine
pub type Result<T> = std::result::Result<T, SimError>;

/// Every failure the engine can report. The `Display` text is the message
/// surfaced to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    // Malformed input
    #[error("The string \"{0}\" could not be interpreted as an integer, a floating-point number or a number using engineering notation. Expressions are not allowed in this context.")]
    BadNumber(String),

    #[error("Invalid source specification \"{spec}\": {reason}")]
    BadSource { spec: String, reason: String },

    #[error("Invalid netlist: {0}")]
    Netlist(String),

    #[error("Unknown device type '{0}' in netlist")]
    UnknownDevice(String),

    #[error("Device '{device}' has no '{terminal}' connection")]
    MissingConnection { device: String, terminal: String },

    #[error("Device '{device}' is missing property '{property}'")]
    MissingProperty { device: String, property: String },

    // Topology
    #[error("Please make at least one connection to ground")]
    NoGround,

    #[error("Circuit has a voltage source loop or a source or current probe shorted by a wire, please remove the source or the wire causing the short.")]
    VoltageSourceLoop,

    // Numerical non-convergence
    #[error("Newton method failed, it may be your circuit or it may be the simulator (worst unknown: {node})")]
    DcNoConvergence { node: String },

    #[error("Newton method failed, do your current sources have a conductive path to ground? (worst unknown: {node})")]
    DcFloatingCurrentSource { node: String },

    #[error("Transient analysis failed to converge at t={time:e}s: time step fell below the minimum step {min_step:e}s")]
    TimestepTooSmall { time: f64, min_step: f64 },

    // Analysis requests
    #[error("AC analysis refers to unknown source {0}")]
    UnknownAcSource(String),

    #[error("Invalid analysis parameters: {0}")]
    InvalidAnalysis(String),

    #[error("Circuit must be finalized before {0}")]
    NotFinalized(&'static str),

    #[error("Circuit is already finalized, {0} cannot be added")]
    AlreadyFinalized(String),
}

impl SimError {
    /// True for the Newton failures DC analysis reports. Transient start-up
    /// recovers from these by starting at the zero state.
    pub fn is_dc_nonconvergence(&self) -> bool {
        matches!(
            self,
            SimError::DcNoConvergence { .. } | SimError::DcFloatingCurrentSource { .. }
        )
    }
}
