//! Owner and visibility switches of an entity

use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};
use crate::tree::Effect;

pub const OWNER_KEY: &str = "ownerId";
pub const VISIBILITY_KEYS: [&str; 2] = ["visibleToPublicUsers", "visibleToAuthenticatedUsers"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilitySwitch {
    pub key: &'static str,
    pub enabled: bool,
}

impl VisibilitySwitch {
    pub fn label(&self) -> &'static str {
        match self.key {
            "visibleToPublicUsers" => "Visible to public users",
            "visibleToAuthenticatedUsers" => "Visible to authenticated users",
            other => other,
        }
    }

    /// Set the switch from a fetched property. Only a literal `true` (or the
    /// string `"true"`) turns it on.
    pub fn change_boolean_attribute(&mut self, value: &Value) {
        self.enabled = match value {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true",
            _ => false,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessControlPanel {
    pub entity_id: String,
    pub owner: Option<String>,
    pub switches: Vec<VisibilitySwitch>,
}

impl AccessControlPanel {
    /// Panel with every switch off until properties arrive
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            owner: None,
            switches: VISIBILITY_KEYS
                .into_iter()
                .map(|key| VisibilitySwitch { key, enabled: false })
                .collect(),
        }
    }

    /// Properties to load for the panel
    pub fn property_keys() -> impl Iterator<Item = &'static str> {
        std::iter::once(OWNER_KEY).chain(VISIBILITY_KEYS)
    }

    pub fn apply_property(&mut self, key: &str, value: &Value) {
        if key == OWNER_KEY {
            self.owner = match value {
                Value::Null => None,
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            return;
        }
        if let Some(switch) = self.switches.iter_mut().find(|s| s.key == key) {
            switch.change_boolean_attribute(value);
        }
    }

    pub fn switch(&self, key: &str) -> Option<&VisibilitySwitch> {
        self.switches.iter().find(|s| s.key == key)
    }

    /// Flip a switch. The new state is sent as `!enabled` of the old one.
    pub fn click(&mut self, key: &str) -> ConsoleResult<Effect> {
        let switch = self
            .switches
            .iter_mut()
            .find(|s| s.key == key)
            .ok_or_else(|| ConsoleError::NotFound(format!("access switch {}", key)))?;
        switch.enabled = !switch.enabled;
        Ok(Effect::SetProperty {
            entity_id: self.entity_id.clone(),
            key: key.to_string(),
            value: Value::Bool(switch.enabled),
        })
    }
}
