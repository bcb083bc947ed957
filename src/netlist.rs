//! JSON netlist format.
//!
//! A netlist is an array of `[type, {terminal: net}, {property: value}]`
//! entries, e.g.
//!
//! ```json
//! [["analog:v", {"nplus": "in", "nminus": "gnd"}, {"value": "step(0,1)", "name": "V1"}],
//!  ["analog:r", {"n1": "in", "n2": "out"}, {"r": "1k"}],
//!  ["analog:g", {"gnd": "gnd"}, {}]]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::parser::parse_number_alert;
use crate::source::Source;

/// Property values may be JSON numbers or strings in engineering notation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Result<f64> {
        match self {
            PropertyValue::Number(v) => Ok(*v),
            PropertyValue::Text(s) => parse_number_alert(s),
        }
    }

    pub fn as_source(&self) -> Result<Source> {
        match self {
            PropertyValue::Number(v) => Ok(Source::dc(*v)),
            PropertyValue::Text(s) => Source::parse(s),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Number(v) => v.to_string(),
            PropertyValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

#[derive(Serialize, Deserialize)]
struct RawEntry(
    String,
    BTreeMap<String, String>,
    #[serde(default)] BTreeMap<String, PropertyValue>,
);

/// One netlist line: a device type, its terminal connections and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct NetlistEntry {
    pub device_type: String,
    pub connections: BTreeMap<String, String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl From<RawEntry> for NetlistEntry {
    fn from(raw: RawEntry) -> Self {
        NetlistEntry {
            device_type: raw.0,
            connections: raw.1,
            properties: raw.2,
        }
    }
}

impl From<NetlistEntry> for RawEntry {
    fn from(entry: NetlistEntry) -> Self {
        RawEntry(entry.device_type, entry.connections, entry.properties)
    }
}

impl NetlistEntry {
    pub fn new(device_type: &str) -> Self {
        NetlistEntry {
            device_type: device_type.to_string(),
            connections: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn connect(mut self, terminal: &str, net: &str) -> Self {
        self.connections.insert(terminal.to_string(), net.to_string());
        self
    }

    pub fn property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Device type without the optional `analog:` prefix
    pub fn kind(&self) -> &str {
        self.device_type
            .strip_prefix("analog:")
            .unwrap_or(&self.device_type)
    }

    pub fn name(&self) -> Option<String> {
        self.properties.get("name").map(PropertyValue::as_text)
    }

    pub fn connection(&self, terminal: &str) -> Result<&str> {
        self.connections
            .get(terminal)
            .map(String::as_str)
            .ok_or_else(|| SimError::MissingConnection {
                device: self.describe(),
                terminal: terminal.to_string(),
            })
    }

    pub fn require(&self, property: &str) -> Result<&PropertyValue> {
        self.properties
            .get(property)
            .ok_or_else(|| SimError::MissingProperty {
                device: self.describe(),
                property: property.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.name().unwrap_or_else(|| self.device_type.clone())
    }
}

/// A flat device list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Netlist {
    pub entries: Vec<NetlistEntry>,
}

impl Netlist {
    pub fn new(entries: Vec<NetlistEntry>) -> Self {
        Netlist { entries }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SimError::Netlist(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .map_err(|e| SimError::Netlist(format!("{}: {}", path.as_ref().display(), e)))?;
        Netlist::from_json(&text)
    }
}
