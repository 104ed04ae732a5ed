//! World persistence: binary save/load via bincode, JSON export via
//! serde_json. Both round-trip every layer with its thresholds and
//! quantiles, plus the generation metadata, losslessly.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};
use crate::world::World;

const SAVE_VERSION: u32 = 1;

/// Versioned wrapper for the binary save format, so a newer writer is
/// detected before the payload is misread.
#[derive(Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    world: World,
}

/// Encode a world to the binary save format.
pub fn to_bytes(world: &World) -> Result<Vec<u8>> {
    let save = SaveFile {
        version: SAVE_VERSION,
        world: world.clone(),
    };
    bincode::serialize(&save).map_err(|e| WorldError::Serialization(e.to_string()))
}

/// Decode a world from the binary save format.
pub fn from_bytes(bytes: &[u8]) -> Result<World> {
    let save: SaveFile =
        bincode::deserialize(bytes).map_err(|e| WorldError::Serialization(e.to_string()))?;
    if save.version > SAVE_VERSION {
        return Err(WorldError::Serialization(format!(
            "save file version {} is newer than supported version {SAVE_VERSION}",
            save.version
        )));
    }
    Ok(save.world)
}

pub fn save_world(world: &World, path: &Path) -> Result<()> {
    let bytes = to_bytes(world)?;
    fs::write(path, bytes).map_err(|e| WorldError::Serialization(e.to_string()))
}

pub fn load_world(path: &Path) -> Result<World> {
    let bytes = fs::read(path).map_err(|e| WorldError::Serialization(e.to_string()))?;
    from_bytes(&bytes)
}

/// Human-readable export of the full world, layers included.
pub fn to_json(world: &World) -> Result<String> {
    serde_json::to_string_pretty(world).map_err(|e| WorldError::Serialization(e.to_string()))
}
