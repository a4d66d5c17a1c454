//! Identity, tagging and scheduling data shared by every network element.

use crate::{
    constants::{NC_WINDOW_REQUIRED, NC_WINDOW_START},
    error::ConfigError,
};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identity of a neuron, synapse or module.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out strictly increasing [ElementId]s. Owned by a run context, so independent runs
/// don't share a counter.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    head: u64,
}

impl IdGen {
    pub fn new(head: u64) -> Self {
        Self { head }
    }

    /// The most recently issued id value
    pub fn head(&self) -> u64 {
        self.head
    }

    pub fn next(&mut self) -> ElementId {
        self.head += 1;
        ElementId(self.head)
    }

    pub fn reset(&mut self, head: u64) {
        self.head = head;
    }

    /// Make sure no id up to and including `id` is issued again.
    pub fn skip_past(&mut self, id: ElementId) {
        self.head = self.head.max(id.0);
    }
}

/// Boolean flags an element may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Marker {
    Input,
    Output,
    Protected,
    ProtectExistence,
    ProtectBias,
    ProtectBiasExistence,
    ProtectStrength,
    ProtectNeurons,
    NoSynapseSource,
    NoSynapseTarget,
    FlipActivity,
    ReinitBias,
    Modified,
    NewElement,
}

impl Marker {
    pub const ALL: [Marker; 14] = [
        Marker::Input,
        Marker::Output,
        Marker::Protected,
        Marker::ProtectExistence,
        Marker::ProtectBias,
        Marker::ProtectBiasExistence,
        Marker::ProtectStrength,
        Marker::ProtectNeurons,
        Marker::NoSynapseSource,
        Marker::NoSynapseTarget,
        Marker::FlipActivity,
        Marker::ReinitBias,
        Marker::Modified,
        Marker::NewElement,
    ];

    const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Markers that only live for the duration of one manipulation chain
    pub const fn is_transient(self) -> bool {
        matches!(self, Marker::Modified | Marker::NewElement)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Markers(u32);

impl Markers {
    pub fn contains(&self, marker: Marker) -> bool {
        self.0 & marker.bit() != 0
    }

    pub fn insert(&mut self, marker: Marker) {
        self.0 |= marker.bit();
    }

    pub fn remove(&mut self, marker: Marker) {
        self.0 &= !marker.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Marker> + '_ {
        Marker::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Marker> for Markers {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        let mut markers = Markers::default();
        for m in iter {
            markers.insert(m);
        }
        markers
    }
}

/// Operator parameters an element may override locally with an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Param {
    ChangeProbability,
    ChangeDeviation,
    MinBias,
    MaxBias,
    MinStrength,
    MaxStrength,
    MaxNeurons,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Values an operator parks on an element between applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stash {
    PreviousBias,
    PreviousStrength,
}

/// Markers, local overrides, stashed values and free-form properties of one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    markers: Markers,
    overrides: BTreeMap<Param, String>,
    stash: BTreeMap<Stash, f64>,
    properties: BTreeMap<String, String>,
}

impl Tags {
    pub fn has(&self, marker: Marker) -> bool {
        self.markers.contains(marker)
    }

    pub fn has_any(&self, markers: &[Marker]) -> bool {
        markers.iter().any(|m| self.has(*m))
    }

    pub fn mark(&mut self, marker: Marker) {
        self.markers.insert(marker);
    }

    pub fn unmark(&mut self, marker: Marker) {
        self.markers.remove(marker);
    }

    pub fn markers(&self) -> Markers {
        self.markers
    }

    /// Drop `Modified`, `NewElement` and any other chain-scoped marker.
    pub fn clear_transient(&mut self) {
        for m in Marker::ALL.into_iter().filter(|m| m.is_transient()) {
            self.markers.remove(m);
        }
    }

    pub fn override_of(&self, param: Param) -> Option<&str> {
        self.overrides.get(&param).map(String::as_str)
    }

    pub fn set_override(&mut self, param: Param, expr: impl Into<String>) {
        self.overrides.insert(param, expr.into());
    }

    pub fn clear_override(&mut self, param: Param) {
        self.overrides.remove(&param);
    }

    pub fn stashed(&self, key: Stash) -> Option<f64> {
        self.stash.get(&key).copied()
    }

    pub fn stash(&mut self, key: Stash, value: f64) {
        self.stash.insert(key, value);
    }

    pub fn take_stash(&mut self, key: Stash) -> Option<f64> {
        self.stash.remove(&key)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The iterations of one outer step during which an element computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    start: i32,
    required: u32,
}

impl Window {
    /// `required` is raised to at least 1.
    pub fn new(start: i32, required: u32) -> Self {
        Self {
            start,
            required: required.max(1),
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    /// First iteration after the window
    pub fn end(&self) -> i64 {
        i64::from(self.start) + i64::from(self.required)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_open(&self, iteration: i32) -> bool {
        self.start <= iteration && i64::from(iteration) < self.end()
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(NC_WINDOW_START, NC_WINDOW_REQUIRED)
    }
}

impl FromStr for Window {
    type Err = ConfigError;

    /// Parses `"start,required"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidWindow(s.to_string());
        let (start, required) = s.split_once(',').ok_or_else(invalid)?;
        let start = start.trim().parse::<i32>().map_err(|_| invalid())?;
        let required = required.trim().parse::<i64>().map_err(|_| invalid())?;
        Ok(Self::new(start, required.clamp(1, i64::from(u32::MAX)) as u32))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.required)
    }
}

/// Layout coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// What a synapse feeds into: a neuron, or another synapse whose weight it modulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynapseTarget {
    Neuron(ElementId),
    Synapse(ElementId),
}

impl SynapseTarget {
    pub fn id(&self) -> ElementId {
        match self {
            SynapseTarget::Neuron(id) | SynapseTarget::Synapse(id) => *id,
        }
    }
}
