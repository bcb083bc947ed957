use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

use crate::devices::{
    Capacitor, Device, Diode, DiodeType, Fet, FetType, ISource, Inductor, Opamp, Resistor, Stamp, VSource,
};
use crate::error::{Result, SimError};
use crate::mna::{node_value, MnaSystem, Node, NodeType, GROUND};
use crate::netlist::{Netlist, NetlistEntry};
use crate::options::SimOptions;
use crate::solver;
use crate::source::Source;

/// Netlist entries that annotate the schematic but are not devices
const IGNORED_TYPES: &[&str] = &[
    "g",
    "ground",
    "vdd",
    "port-in",
    "port-out",
    "port-inout",
    "s",
    "vprobe",
];

/// Complete circuit representation.
///
/// Devices are added through the builder methods or [`Circuit::load_netlist`];
/// [`Circuit::finalize`] then fixes the number of unknowns, allocates the MNA
/// system and stamps the linear devices. No device can be added afterwards.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub(crate) node_map: BTreeMap<String, Node>,
    node_types: Vec<NodeType>,
    initial_conditions: Vec<f64>,
    pub(crate) devices: Vec<Device>,
    pub(crate) device_map: HashMap<String, usize>,
    /// Indices into `devices`
    voltage_sources: Vec<usize>,
    current_sources: Vec<usize>,
    pub options: SimOptions,
    pub(crate) mna: Option<MnaSystem>,
    pub(crate) diddc: bool,
}

impl Default for Circuit {
    fn default() -> Self {
        Circuit::new()
    }
}

impl Circuit {
    pub fn new() -> Self {
        Circuit::with_options(SimOptions::default())
    }

    pub fn with_options(options: SimOptions) -> Self {
        Circuit {
            node_map: BTreeMap::new(),
            node_types: Vec::new(),
            initial_conditions: Vec::new(),
            devices: Vec::new(),
            device_map: HashMap::new(),
            voltage_sources: Vec::new(),
            current_sources: Vec::new(),
            options,
            mna: None,
            diddc: false,
        }
    }

    /// Allocate the next unknown. Named unknowns appear in analysis results;
    /// `ic` seeds the starting solution.
    pub fn node(&mut self, name: Option<&str>, node_type: NodeType, ic: f64) -> Result<Node> {
        self.check_not_finalized(name.unwrap_or("an unknown"))?;
        let index = self.node_types.len();
        if let Some(name) = name {
            self.node_map.insert(name.to_string(), Some(index));
        }
        self.node_types.push(node_type);
        self.initial_conditions.push(ic);
        Ok(Some(index))
    }

    /// Look up a named net, creating a voltage node for it if needed
    pub fn net(&mut self, name: &str) -> Result<Node> {
        match self.node_map.get(name) {
            Some(&node) => Ok(node),
            None => self.node(Some(name), NodeType::Voltage, 0.0),
        }
    }

    /// Declare a net name as ground
    pub fn ground(&mut self, name: &str) {
        self.node_map.insert(name.to_string(), GROUND);
    }

    /// Number of unknowns
    pub fn size(&self) -> usize {
        self.node_types.len()
    }

    pub fn node_map(&self) -> &BTreeMap<String, Node> {
        &self.node_map
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.device_map.get(name).map(|&i| &self.devices[i])
    }

    pub fn voltage_sources(&self) -> impl Iterator<Item = &VSource> {
        self.voltage_sources.iter().filter_map(|&i| match &self.devices[i] {
            Device::VSource(v) => Some(v),
            _ => None,
        })
    }

    pub fn has_current_sources(&self) -> bool {
        !self.current_sources.is_empty()
    }

    /// Waveforms of the independent voltage and current sources
    pub(crate) fn sources(&self) -> impl Iterator<Item = &Source> {
        self.voltage_sources
            .iter()
            .chain(self.current_sources.iter())
            .filter_map(|&i| self.devices[i].source())
    }

    pub fn is_finalized(&self) -> bool {
        self.mna.is_some()
    }

    /// The assembled system
    pub fn system(&self) -> Result<&MnaSystem> {
        self.mna
            .as_ref()
            .ok_or(SimError::NotFinalized("the system matrices can be read"))
    }

    fn check_not_finalized(&self, what: &str) -> Result<()> {
        if self.is_finalized() {
            Err(SimError::AlreadyFinalized(what.to_string()))
        } else {
            Ok(())
        }
    }

    fn add_device(&mut self, device: Device) -> Result<()> {
        let index = self.devices.len();
        let name = device.name().to_string();
        if self.device_map.insert(name.clone(), index).is_some() {
            warn!("Duplicate device name {}, lookups will find the last one", name);
        }
        match device {
            Device::VSource(_) => self.voltage_sources.push(index),
            Device::ISource(_) => self.current_sources.push(index),
            _ => {}
        }
        self.devices.push(device);
        Ok(())
    }

    /// The given name, or a fresh one like `_R3`
    fn device_name(&self, name: Option<&str>, prefix: &str) -> String {
        if let Some(name) = name {
            return name.to_string();
        }
        let mut n = self.devices.len() + 1;
        loop {
            let candidate = format!("_{}{}", prefix, n);
            if !self.device_map.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// A zero resistance becomes a 0 V source
    pub fn resistor(&mut self, n1: Node, n2: Node, r: f64, name: Option<&str>) -> Result<()> {
        if r == 0.0 {
            return self.voltage_source(n1, n2, Source::dc(0.0), name);
        }
        self.check_not_finalized("a resistor")?;
        let name = self.device_name(name, "R");
        self.add_device(Device::Resistor(Resistor::new(name, n1, n2, r)))
    }

    pub fn capacitor(&mut self, n1: Node, n2: Node, c: f64, name: Option<&str>) -> Result<()> {
        self.check_not_finalized("a capacitor")?;
        let name = self.device_name(name, "C");
        self.add_device(Device::Capacitor(Capacitor::new(name, n1, n2, c)))
    }

    pub fn inductor(&mut self, n1: Node, n2: Node, l: f64, name: Option<&str>) -> Result<()> {
        let branch = self.branch("an inductor")?;
        let name = self.device_name(name, "L");
        self.add_device(Device::Inductor(Inductor::new(name, n1, n2, branch, l)))
    }

    /// Zero-area diodes are dropped
    pub fn diode(&mut self, anode: Node, cathode: Node, area: f64, diode_type: DiodeType, name: Option<&str>) -> Result<()> {
        self.check_not_finalized("a diode")?;
        if area == 0.0 {
            debug!("Discarding zero-area diode {}", name.unwrap_or("(unnamed)"));
            return Ok(());
        }
        let name = self.device_name(name, "D");
        self.add_device(Device::Diode(Diode::new(name, anode, cathode, area, diode_type)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fet(&mut self, d: Node, g: Node, s: Node, width: f64, length: f64, fet_type: FetType, name: Option<&str>) -> Result<()> {
        self.check_not_finalized("a fet")?;
        let name = self.device_name(name, "M");
        self.add_device(Device::Fet(Fet::new(name, d, g, s, width, length, fet_type)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn opamp(&mut self, np: Node, nn: Node, no: Node, ng: Node, gain: f64, name: Option<&str>) -> Result<()> {
        let branch = self.branch("an opamp")?;
        let name = self.device_name(name, "U");
        self.add_device(Device::Opamp(Opamp::new(name, np, nn, no, ng, branch, gain)))
    }

    pub fn voltage_source(&mut self, npos: Node, nneg: Node, src: Source, name: Option<&str>) -> Result<()> {
        let branch = self.branch("a voltage source")?;
        let name = self.device_name(name, "V");
        self.add_device(Device::VSource(VSource::new(name, npos, nneg, branch, src)))
    }

    pub fn current_source(&mut self, npos: Node, nneg: Node, src: Source, name: Option<&str>) -> Result<()> {
        self.check_not_finalized("a current source")?;
        let name = self.device_name(name, "I");
        self.add_device(Device::ISource(ISource::new(name, npos, nneg, src)))
    }

    /// Ammeter: a 0 V source whose branch current shows up as `I(name)`
    pub fn current_probe(&mut self, npos: Node, nneg: Node, name: Option<&str>) -> Result<()> {
        let name = self.device_name(name, "A");
        self.voltage_source(npos, nneg, Source::dc(0.0), Some(&name))
    }

    fn branch(&mut self, what: &str) -> Result<usize> {
        self.check_not_finalized(what)?;
        let index = self.node_types.len();
        self.node_types.push(NodeType::Current);
        self.initial_conditions.push(0.0);
        Ok(index)
    }

    /// Build devices from a flat netlist. Ground markers are resolved first;
    /// at least one device has to touch ground. On error the circuit is left
    /// as it was.
    pub fn load_netlist(&mut self, netlist: &Netlist) -> Result<()> {
        let mut staged = self.clone();
        staged.load_entries(netlist)?;
        *self = staged;
        Ok(())
    }

    fn load_entries(&mut self, netlist: &Netlist) -> Result<()> {
        for entry in &netlist.entries {
            if matches!(entry.kind(), "g" | "ground") {
                let net = entry.connection("gnd")?.to_string();
                self.ground(&net);
            }
        }

        let mut found_ground = false;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &netlist.entries {
            let kind = entry.kind();
            if IGNORED_TYPES.contains(&kind) {
                continue;
            }
            *counts.entry(kind.to_string()).or_insert(0) += 1;

            let mut nodes = BTreeMap::new();
            for (terminal, net) in &entry.connections {
                let node = match self.node_map.get(net.as_str()) {
                    Some(&node) => node,
                    None => self.net(net)?,
                };
                if node == GROUND {
                    found_ground = true;
                }
                nodes.insert(terminal.as_str(), node);
            }

            self.load_entry(entry, &nodes)?;
        }

        if !found_ground {
            return Err(SimError::NoGround);
        }

        let summary: Vec<String> = counts.iter().map(|(kind, n)| format!("{} {}", n, kind)).collect();
        info!("{} nodes, {}", self.size(), summary.join(", "));
        Ok(())
    }

    fn load_entry(&mut self, entry: &NetlistEntry, nodes: &BTreeMap<&str, Node>) -> Result<()> {
        let terminal = |name: &str| -> Result<Node> {
            entry.connection(name)?;
            Ok(nodes[name])
        };
        let name = entry.name();
        let name = name.as_deref();

        match entry.kind() {
            "r" | "resistor" => {
                let r = entry.require("r")?.as_number()?;
                self.resistor(terminal("n1")?, terminal("n2")?, r, name)
            }
            "c" | "capacitor" => {
                let c = entry.require("c")?.as_number()?;
                self.capacitor(terminal("n1")?, terminal("n2")?, c, name)
            }
            "l" | "inductor" => {
                let l = entry.require("l")?.as_number()?;
                self.inductor(terminal("n1")?, terminal("n2")?, l, name)
            }
            "d" | "diode" => {
                let area = match entry.properties.get("area") {
                    Some(value) => value.as_number()?,
                    None => 1.0,
                };
                let diode_type = entry
                    .properties
                    .get("type")
                    .map(|t| DiodeType::from_name(&t.as_text()))
                    .unwrap_or(DiodeType::Normal);
                self.diode(terminal("anode")?, terminal("cathode")?, area, diode_type, name)
            }
            "nfet" | "pfet" => {
                let fet_type = if entry.kind() == "nfet" { FetType::N } else { FetType::P };
                let width = entry.require("W")?.as_number()?;
                let length = entry.require("L")?.as_number()?;
                self.fet(terminal("D")?, terminal("G")?, terminal("S")?, width, length, fet_type, name)
            }
            "o" | "opamp" => {
                let gain = entry.require("A")?.as_number()?;
                self.opamp(
                    terminal("nplus")?,
                    terminal("nminus")?,
                    terminal("output")?,
                    terminal("gnd")?,
                    gain,
                    name,
                )
            }
            "v" | "vsource" => {
                let src = entry.require("value")?.as_source()?;
                self.voltage_source(terminal("nplus")?, terminal("nminus")?, src, name)
            }
            "i" | "isource" => {
                let src = entry.require("value")?.as_source()?;
                self.current_source(terminal("nplus")?, terminal("nminus")?, src, name)
            }
            "a" | "iprobe" => self.current_probe(terminal("nplus")?, terminal("nminus")?, name),
            other => Err(SimError::UnknownDevice(other.to_string())),
        }
    }

    /// Allocate the MNA system and stamp the linear devices. Idempotent.
    ///
    /// Fails if the voltage sources are not independent, i.e. a loop of
    /// sources or a source shorted by a wire.
    pub fn finalize(&mut self) -> Result<()> {
        if self.mna.is_some() {
            return Ok(());
        }

        let abstol = self
            .node_types
            .iter()
            .map(|t| match t {
                NodeType::Voltage => self.options.v_abstol,
                NodeType::Current => self.options.i_abstol,
            })
            .collect();
        let mut sys = MnaSystem::new(self.node_types.clone(), abstol, self.initial_conditions.clone());

        for device in &self.devices {
            device.load_linear(&mut sys);
        }

        let branches: Vec<usize> = self.voltage_sources().map(|v| v.branch).collect();
        if !branches.is_empty() {
            let mut gv = DMatrix::zeros(branches.len(), sys.size);
            for (row, &branch) in branches.iter().enumerate() {
                gv.set_row(row, &sys.gl.row(branch));
            }
            if solver::rank(&gv) < branches.len() {
                return Err(SimError::VoltageSourceLoop);
            }
        }

        debug!("Finalized circuit: {} unknowns, {} devices", sys.size, self.devices.len());
        self.mna = Some(sys);
        Ok(())
    }

    /// Drop the assembled system and any operating point, then assemble again
    pub fn reset(&mut self) -> Result<()> {
        self.mna = None;
        self.diddc = false;
        self.finalize()
    }

    /// Display name of an unknown
    pub fn unknown_name(&self, index: usize) -> String {
        if let Some((name, _)) = self.node_map.iter().find(|(_, &node)| node == Some(index)) {
            return name.clone();
        }
        for device in &self.devices {
            let branch = match device {
                Device::VSource(v) => Some(v.branch),
                Device::Inductor(l) => Some(l.branch),
                Device::Opamp(o) => Some(o.branch),
                _ => None,
            };
            if branch == Some(index) {
                return format!("I({})", device.name());
            }
        }
        format!("#{}", index)
    }

    /// Named node values plus `I(name)` for every voltage source branch
    pub(crate) fn named_values(&self, x: &DVector<f64>) -> BTreeMap<String, f64> {
        let mut result: BTreeMap<String, f64> = self
            .node_map
            .iter()
            .map(|(name, &node)| (name.clone(), node_value(x, node)))
            .collect();
        for v in self.voltage_sources() {
            result.insert(format!("I({})", v.name), x[v.branch]);
        }
        result
    }
}
