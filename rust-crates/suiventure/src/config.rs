//! Where the SuiVenture package lives and the names it publishes.

use crate::chain::ObjectId;

pub const MODULE_GAME_STATE: &str = "game_state";
pub const MODULE_RUN_LOGIC: &str = "run_logic";
pub const MODULE_GACHA_GEAR: &str = "gacha_gear";
pub const MODULE_GACHA_PET: &str = "gacha_pet";
pub const MODULE_NFT_COLLECTION: &str = "nft_collection";
pub const MODULE_UPGRADE: &str = "upgrade";

pub const MIST_PER_SUI: u64 = 1_000_000_000;
/// Price of a single gacha pull.
pub const GACHA_PRICE_MIST: u64 = 100_000_000;

/// The shared `0x2::random::Random` object.
pub const SUI_RANDOM_ID: ObjectId = {
    let mut bytes = [0u8; 32];
    bytes[31] = 8;
    ObjectId::new(bytes)
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractConfig {
    pub package_id: Option<ObjectId>,
    pub nft_mint_authority_id: Option<ObjectId>,
    /// Falls back to [`SUI_RANDOM_ID`].
    pub random_id: Option<ObjectId>,
    pub transfer_policy_gear_id: Option<ObjectId>,
    pub transfer_policy_pet_id: Option<ObjectId>,
}

impl ContractConfig {
    pub fn package(&self) -> Result<ObjectId, ConfigError> {
        self.package_id.ok_or(ConfigError::Missing("package id"))
    }

    pub fn mint_authority(&self) -> Result<ObjectId, ConfigError> {
        self.nft_mint_authority_id
            .ok_or(ConfigError::Missing("NFT mint authority id"))
    }

    pub fn random(&self) -> ObjectId {
        self.random_id.unwrap_or(SUI_RANDOM_ID)
    }

    pub fn player_type(&self) -> Result<String, ConfigError> {
        self.struct_type(MODULE_GAME_STATE, "Player")
    }

    pub fn run_type(&self) -> Result<String, ConfigError> {
        self.struct_type(MODULE_GAME_STATE, "Run")
    }

    pub fn equipment_type(&self) -> Result<String, ConfigError> {
        self.struct_type(MODULE_NFT_COLLECTION, "EquipmentNFT")
    }

    pub fn pet_type(&self) -> Result<String, ConfigError> {
        self.struct_type(MODULE_NFT_COLLECTION, "PetNFT")
    }

    fn struct_type(&self, module: &str, name: &str) -> Result<String, ConfigError> {
        Ok(format!("{}::{module}::{name}", self.package()?))
    }
}

/// Renders a MIST amount as SUI with four decimals, e.g. `0.0100`.
pub fn format_sui(mist: u64) -> String {
    let whole = mist / MIST_PER_SUI;
    let frac = (mist % MIST_PER_SUI) / 100_000;
    format!("{whole}.{frac:04}")
}
