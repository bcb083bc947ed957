//! Device models and their MNA stamps.
//!
//! - Passive: Resistor, Capacitor, Inductor
//! - Sources: VSource, ISource
//! - Nonlinear: Diode, Fet
//! - Opamp (ideal VCVS with finite gain)
//!
//! Every device implements [`Stamp`]. Stamps only ever accumulate into the
//! system matrices and the rhs vector they are handed.

mod diode;
mod fet;
mod opamp;
mod passive;
mod sources;

pub use diode::{Diode, DiodeType};
pub use fet::{Fet, FetType};
pub use opamp::Opamp;
pub use passive::{Capacitor, Inductor, Resistor};
pub use sources::{ISource, VSource};

use nalgebra::DVector;

use crate::mna::MnaSystem;
use crate::source::Source;

/// The device contract used by the analyses
pub trait Stamp {
    /// Linear, time-invariant contributions to `gl` and `c`. Called once,
    /// right after the system is allocated.
    fn load_linear(&self, _sys: &mut MnaSystem) {}

    /// Nonlinear and source contributions at a DC Newton iterate: `-f(x)`
    /// into `rhs`, `df/dx` into `g`.
    fn load_dc(&self, _sys: &mut MnaSystem, _soln: &DVector<f64>, _rhs: &mut DVector<f64>) {}

    /// Same as [`Stamp::load_dc`] at time `time`
    fn load_tran(&self, sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>, _time: f64) {
        self.load_dc(sys, soln, rhs);
    }

    /// Unit small-signal excitation, only called on the selected source
    fn load_ac(&self, _sys: &mut MnaSystem, _rhs: &mut DVector<f64>) {}

    /// Next time after `time` at which this device's behavior changes
    fn breakpoint(&self, _time: f64) -> Option<f64> {
        None
    }
}

/// A circuit device
#[derive(Debug, Clone)]
pub enum Device {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    Diode(Diode),
    Fet(Fet),
    Opamp(Opamp),
    VSource(VSource),
    ISource(ISource),
}

macro_rules! each_device {
    ($self:expr, $dev:ident => $body:expr) => {
        match $self {
            Device::Resistor($dev) => $body,
            Device::Capacitor($dev) => $body,
            Device::Inductor($dev) => $body,
            Device::Diode($dev) => $body,
            Device::Fet($dev) => $body,
            Device::Opamp($dev) => $body,
            Device::VSource($dev) => $body,
            Device::ISource($dev) => $body,
        }
    };
}

impl Device {
    pub fn name(&self) -> &str {
        each_device!(self, d => d.name.as_str())
    }

    /// The waveform driving an independent source
    pub fn source(&self) -> Option<&Source> {
        match self {
            Device::VSource(v) => Some(&v.src),
            Device::ISource(i) => Some(&i.src),
            _ => None,
        }
    }
}

impl Stamp for Device {
    fn load_linear(&self, sys: &mut MnaSystem) {
        each_device!(self, d => d.load_linear(sys))
    }

    fn load_dc(&self, sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>) {
        each_device!(self, d => d.load_dc(sys, soln, rhs))
    }

    fn load_tran(&self, sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>, time: f64) {
        each_device!(self, d => d.load_tran(sys, soln, rhs, time))
    }

    fn load_ac(&self, sys: &mut MnaSystem, rhs: &mut DVector<f64>) {
        each_device!(self, d => d.load_ac(sys, rhs))
    }

    fn breakpoint(&self, time: f64) -> Option<f64> {
        each_device!(self, d => d.breakpoint(time))
    }
}
