use ethrelay_frame::{Command, ModuleIdentity, RelayIndex};
use ethrelay_transport::Transport;
use serde::Serialize;
use tracing::info;

use crate::error::{RelayError, Result};
use crate::session::Session;

/// Static hardware capabilities of one module model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleProfile {
    pub model_id: u8,
    pub name: &'static str,
    pub relay_count: usize,
    pub digital_io_count: usize,
    pub analog_input_count: usize,
}

/// Every model the client knows how to drive.
pub const MODULE_PROFILES: &[ModuleProfile] = &[
    ModuleProfile {
        model_id: 18,
        name: "ETH002",
        relay_count: 2,
        digital_io_count: 0,
        analog_input_count: 0,
    },
    ModuleProfile {
        model_id: 19,
        name: "ETH008",
        relay_count: 8,
        digital_io_count: 0,
        analog_input_count: 0,
    },
    ModuleProfile {
        model_id: 20,
        name: "ETH484",
        relay_count: 4,
        digital_io_count: 8,
        analog_input_count: 4,
    },
    ModuleProfile {
        model_id: 21,
        name: "ETH8020",
        relay_count: 20,
        digital_io_count: 0,
        analog_input_count: 8,
    },
    ModuleProfile {
        model_id: 29,
        name: "ETH044",
        relay_count: 4,
        digital_io_count: 4,
        analog_input_count: 0,
    },
];

impl ModuleProfile {
    pub fn lookup(model_id: u8) -> Option<&'static ModuleProfile> {
        MODULE_PROFILES.iter().find(|p| p.model_id == model_id)
    }

    /// Validate a relay number against this model.
    pub fn relay(&self, index: impl Into<i64>) -> Result<RelayIndex> {
        Ok(RelayIndex::new(index, self.relay_count)?)
    }
}

/// Identity and capabilities reported by a connected module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub profile: ModuleProfile,
    pub hardware_version: u8,
    pub firmware_version: u8,
}

/// Query module identity and resolve its hardware profile.
pub fn resolve_module<T: Transport>(session: &mut Session<T>) -> Result<ModuleInfo> {
    let reply = session.exchange(&Command::get_module_info())?;
    let identity = ModuleIdentity::decode(&reply)?;

    let profile = ModuleProfile::lookup(identity.model_id)
        .ok_or(RelayError::UnknownModel(identity.model_id))?;

    info!(
        model = profile.name,
        model_id = profile.model_id,
        hardware_version = identity.hardware_version,
        firmware_version = identity.firmware_version,
        "resolved module"
    );

    Ok(ModuleInfo {
        profile: *profile,
        hardware_version: identity.hardware_version,
        firmware_version: identity.firmware_version,
    })
}
