//! Point-in-time copies of the on-chain `Player` and `Run` objects.
//!
//! The full node renders Move structs as JSON where `u64` fields are strings,
//! small integers are numbers and `Option<ID>` may show up as a plain string,
//! `null`, or `{ "vec": [...] }`. Everything is normalized here so the rest
//! of the crate only sees plain integers and `Option<ObjectId>`.

use crate::{
    chain::ObjectId,
    items::{
        EquippedGear,
        GearSlot,
    },
};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed {kind} fields: {source}")]
    Fields {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("run reports {current} hp above its maximum of {max}")]
    HpAboveMax { current: u64, max: u64 },
}

/// Every counter of a run that the client compares across an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSnapshot {
    pub current_hp: u64,
    pub max_hp: u64,
    pub temp_atk: u64,
    pub temp_def: u64,
    pub temp_acc: u64,
    pub floor: u64,
    pub position_on_board: u64,
    pub roll_count: u64,
    pub gems: u64,
    pub potion_count: u64,
    pub potion_max_carry: u64,
    pub potion_heal_amount: u64,
    pub board_tile_count: u64,
}

impl RunSnapshot {
    pub fn validate(self) -> Result<Self, SnapshotError> {
        if self.current_hp > self.max_hp {
            return Err(SnapshotError::HpAboveMax {
                current: self.current_hp,
                max: self.max_hp,
            });
        }
        Ok(self)
    }

    pub fn is_dead(&self) -> bool {
        self.current_hp == 0
    }
}

/// A run as read from chain: its identity plus the numeric snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunObject {
    pub id: ObjectId,
    pub player_id: ObjectId,
    pub snapshot: RunSnapshot,
}

impl RunObject {
    pub fn from_move_fields(
        id: ObjectId,
        fields: &serde_json::Value,
    ) -> Result<Self, SnapshotError> {
        let raw = RunFields::deserialize(fields).map_err(|source| {
            SnapshotError::Fields {
                kind: "Run",
                source,
            }
        })?;
        let snapshot = RunSnapshot {
            current_hp: raw.current_hp,
            max_hp: raw.max_hp,
            temp_atk: raw.temp_atk,
            temp_def: raw.temp_def,
            temp_acc: raw.temp_acc,
            floor: raw.floor,
            position_on_board: raw.position_on_board,
            roll_count: raw.roll_count,
            gems: raw.blue_gems,
            potion_count: raw.potion_count,
            potion_max_carry: raw.potion_max_carry,
            potion_heal_amount: raw.potion_heal_amount,
            board_tile_count: raw.board_tile_count,
        }
        .validate()?;
        Ok(Self {
            id,
            player_id: raw.player_id,
            snapshot,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerSnapshot {
    pub id: ObjectId,
    pub base_atk: u64,
    pub base_hp: u64,
    pub base_acc: u64,
    pub base_def: u64,
    pub gems: u64,
    pub equipped: EquippedGear,
    pub equipped_pet: Option<ObjectId>,
}

impl PlayerSnapshot {
    pub fn from_move_fields(
        id: ObjectId,
        fields: &serde_json::Value,
    ) -> Result<Self, SnapshotError> {
        let raw = PlayerFields::deserialize(fields).map_err(|source| {
            SnapshotError::Fields {
                kind: "Player",
                source,
            }
        })?;
        let mut equipped = EquippedGear::default();
        equipped.set(GearSlot::Helmet, raw.equipped_helmet);
        equipped.set(GearSlot::Weapon, raw.equipped_weapon);
        equipped.set(GearSlot::Shield, raw.equipped_shield);
        equipped.set(GearSlot::Boots, raw.equipped_boots);
        Ok(Self {
            id,
            base_atk: raw.base_atk,
            base_hp: raw.base_hp,
            base_acc: raw.base_acc,
            base_def: raw.base_def,
            gems: raw.blue_gems,
            equipped,
            equipped_pet: raw.equipped_pet,
        })
    }
}

#[derive(Deserialize)]
struct RunFields {
    player_id: ObjectId,
    #[serde(deserialize_with = "move_json::u64")]
    current_hp: u64,
    #[serde(deserialize_with = "move_json::u64")]
    max_hp: u64,
    #[serde(deserialize_with = "move_json::u64")]
    temp_atk: u64,
    #[serde(deserialize_with = "move_json::u64")]
    temp_acc: u64,
    #[serde(deserialize_with = "move_json::u64")]
    temp_def: u64,
    #[serde(deserialize_with = "move_json::u64")]
    floor: u64,
    #[serde(deserialize_with = "move_json::u64")]
    position_on_board: u64,
    #[serde(deserialize_with = "move_json::u64")]
    roll_count: u64,
    #[serde(deserialize_with = "move_json::u64")]
    blue_gems: u64,
    #[serde(deserialize_with = "move_json::u64")]
    potion_count: u64,
    #[serde(deserialize_with = "move_json::u64")]
    potion_heal_amount: u64,
    #[serde(deserialize_with = "move_json::u64")]
    potion_max_carry: u64,
    #[serde(deserialize_with = "move_json::u64")]
    board_tile_count: u64,
}

#[derive(Deserialize)]
struct PlayerFields {
    #[serde(deserialize_with = "move_json::u64")]
    base_atk: u64,
    #[serde(deserialize_with = "move_json::u64")]
    base_hp: u64,
    #[serde(deserialize_with = "move_json::u64")]
    base_acc: u64,
    #[serde(deserialize_with = "move_json::u64")]
    base_def: u64,
    #[serde(deserialize_with = "move_json::u64")]
    blue_gems: u64,
    #[serde(default, deserialize_with = "move_json::option_id")]
    equipped_helmet: Option<ObjectId>,
    #[serde(default, deserialize_with = "move_json::option_id")]
    equipped_weapon: Option<ObjectId>,
    #[serde(default, deserialize_with = "move_json::option_id")]
    equipped_shield: Option<ObjectId>,
    #[serde(default, deserialize_with = "move_json::option_id")]
    equipped_boots: Option<ObjectId>,
    #[serde(default, deserialize_with = "move_json::option_id")]
    equipped_pet: Option<ObjectId>,
}

pub(crate) mod move_json {
    use crate::chain::ObjectId;
    use serde::{
        Deserialize,
        Deserializer,
        de::Error,
    };

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawInt {
        Number(u64),
        Text(String),
    }

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match RawInt::deserialize(deserializer)? {
            RawInt::Number(n) => Ok(n),
            RawInt::Text(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }

    pub fn u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let wide = u64(deserializer)?;
        u8::try_from(wide).map_err(D::Error::custom)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawOptionId {
        Id(String),
        Vec { vec: Vec<String> },
    }

    pub fn option_id<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ObjectId>, D::Error> {
        let raw = Option::<RawOptionId>::deserialize(deserializer)?;
        let text = match raw {
            None => return Ok(None),
            Some(RawOptionId::Id(id)) => id,
            Some(RawOptionId::Vec { vec }) => match vec.into_iter().next() {
                Some(id) => id,
                None => return Ok(None),
            },
        };
        if text.is_empty() {
            return Ok(None);
        }
        text.parse().map(Some).map_err(D::Error::custom)
    }
}
