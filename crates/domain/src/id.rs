//! Device identity — numeric component ids scoped by component category.
//!
//! Platforms number their components per category (`switch:0`, `input:0`,
//! `bthomesensor:200`, …), so the same integer may name two unrelated
//! components. [`DeviceRef`] pairs the category with the id and is the unit
//! every identity comparison is made on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a platform component within its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wrap a raw component number.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Access the raw component number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for DeviceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Component category a [`DeviceId`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Relay output.
    Switch,
    /// Physical input terminal (button or switch mode).
    Input,
    /// Wireless sensor object (motion, illuminance, …).
    BinarySensor,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => f.write_str("switch"),
            Self::Input => f.write_str("input"),
            Self::BinarySensor => f.write_str("binary_sensor"),
        }
    }
}

/// A fully qualified component reference: category plus id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRef {
    pub kind: DeviceKind,
    pub id: DeviceId,
}

impl DeviceRef {
    #[must_use]
    pub const fn switch(id: u32) -> Self {
        Self {
            kind: DeviceKind::Switch,
            id: DeviceId::new(id),
        }
    }

    #[must_use]
    pub const fn input(id: u32) -> Self {
        Self {
            kind: DeviceKind::Input,
            id: DeviceId::new(id),
        }
    }

    #[must_use]
    pub const fn binary_sensor(id: u32) -> Self {
        Self {
            kind: DeviceKind::BinarySensor,
            id: DeviceId::new(id),
        }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_distinguish_same_id_in_different_categories() {
        assert_ne!(DeviceRef::switch(0), DeviceRef::input(0));
    }

    #[test]
    fn should_display_as_category_colon_id() {
        assert_eq!(DeviceRef::binary_sensor(201).to_string(), "binary_sensor:201");
        assert_eq!(DeviceRef::switch(0).to_string(), "switch:0");
    }

    #[test]
    fn should_serialize_device_id_as_plain_integer() {
        let json = serde_json::to_string(&DeviceId::new(200)).unwrap();
        assert_eq!(json, "200");
        let parsed: DeviceId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.get(), 7);
    }
}
