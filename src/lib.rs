pub mod analysis;
pub mod circuit;
pub mod cli;
pub mod devices;
pub mod error;
pub mod mna;
pub mod netlist;
pub mod newton;
pub mod options;
pub mod output;
pub mod parser;
pub mod simulator;
pub mod solver;
pub mod source;

// Re-export commonly used types
pub use analysis::{AcResult, OperatingPoint, StepBudget, StepStatus, TransientParams, TransientResult, TransientRun};
pub use circuit::Circuit;
pub use devices::{Device, DiodeType, FetType};
pub use error::{Result, SimError};
pub use mna::{Node, NodeType, GROUND};
pub use netlist::{Netlist, NetlistEntry, PropertyValue};
pub use options::SimOptions;
pub use parser::parse_number;
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
pub use source::Source;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
