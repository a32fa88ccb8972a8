use crate::{
    chain::ObjectId,
    snapshot::move_json,
};
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("malformed {kind} fields: {source}")]
    Fields {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown rarity tier {0}")]
    UnknownRarity(u8),
    #[error("unknown gear slot {0}")]
    UnknownSlot(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    Normal,
    Rare,
    Epic,
    Legend,
    Mystic,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Normal,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legend,
        Rarity::Mystic,
    ];

    /// The tier three of these fuse into; `None` at the top tier.
    pub fn next(self) -> Option<Rarity> {
        match self {
            Rarity::Normal => Some(Rarity::Rare),
            Rarity::Rare => Some(Rarity::Epic),
            Rarity::Epic => Some(Rarity::Legend),
            Rarity::Legend => Some(Rarity::Mystic),
            Rarity::Mystic => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Normal => "Normal",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legend => "Legend",
            Rarity::Mystic => "Mystic",
        }
    }
}

impl TryFrom<u8> for Rarity {
    type Error = ItemError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rarity::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(ItemError::UnknownRarity(value))
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GearSlot {
    Helmet,
    Weapon,
    Shield,
    Boots,
}

impl GearSlot {
    pub const ALL: [GearSlot; 4] = [
        GearSlot::Helmet,
        GearSlot::Weapon,
        GearSlot::Shield,
        GearSlot::Boots,
    ];

    pub fn index(self) -> usize {
        match self {
            GearSlot::Helmet => 0,
            GearSlot::Weapon => 1,
            GearSlot::Shield => 2,
            GearSlot::Boots => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GearSlot::Helmet => "Helmet",
            GearSlot::Weapon => "Weapon",
            GearSlot::Shield => "Shield",
            GearSlot::Boots => "Boots",
        }
    }
}

impl TryFrom<u8> for GearSlot {
    type Error = ItemError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GearSlot::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(ItemError::UnknownSlot(value))
    }
}

/// Gear object ids the player has equipped, one per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EquippedGear {
    slots: [Option<ObjectId>; 4],
}

impl EquippedGear {
    pub fn get(&self, slot: GearSlot) -> Option<ObjectId> {
        self.slots[slot.index()]
    }

    pub fn set(&mut self, slot: GearSlot, id: Option<ObjectId>) {
        self.slots[slot.index()] = id;
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.slots.iter().flatten().any(|equipped| equipped == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GearSlot, ObjectId)> + '_ {
        GearSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|id| (slot, id)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gear {
    pub id: ObjectId,
    pub slot: GearSlot,
    pub set_id: u8,
    pub rarity: Rarity,
    pub atk: u64,
    pub hp: u64,
    pub acc: u64,
    pub def: u64,
}

impl Gear {
    pub fn from_move_fields(
        id: ObjectId,
        fields: &serde_json::Value,
    ) -> Result<Self, ItemError> {
        let raw = GearFields::deserialize(fields).map_err(|source| ItemError::Fields {
            kind: "EquipmentNFT",
            source,
        })?;
        Ok(Self {
            id,
            slot: GearSlot::try_from(raw.slot)?,
            set_id: raw.set_id,
            rarity: Rarity::try_from(raw.rarity)?,
            atk: raw.atk,
            hp: raw.hp,
            acc: raw.acc,
            def: raw.def,
        })
    }
}

pub struct PetKind {
    pub name: &'static str,
    pub bonus: &'static str,
}

pub static PET_CATALOG: [PetKind; 5] = [
    PetKind {
        name: "Ember",
        bonus: "+ATK %",
    },
    PetKind {
        name: "Shell",
        bonus: "+DEF flat",
    },
    PetKind {
        name: "Whisper",
        bonus: "+ACC %",
    },
    PetKind {
        name: "Bloom",
        bonus: "+HP regen",
    },
    PetKind {
        name: "Spark",
        bonus: "+Crit chance",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub id: ObjectId,
    pub pet_id: u8,
    pub rarity: Rarity,
    pub bonus_type: u8,
    pub bonus_value: u64,
}

impl Pet {
    pub fn from_move_fields(
        id: ObjectId,
        fields: &serde_json::Value,
    ) -> Result<Self, ItemError> {
        let raw = PetFields::deserialize(fields).map_err(|source| ItemError::Fields {
            kind: "PetNFT",
            source,
        })?;
        Ok(Self {
            id,
            pet_id: raw.pet_id,
            rarity: Rarity::try_from(raw.rarity)?,
            bonus_type: raw.bonus_type,
            bonus_value: raw.bonus_value,
        })
    }

    pub fn kind(&self) -> Option<&'static PetKind> {
        PET_CATALOG.get(usize::from(self.pet_id))
    }

    pub fn name(&self) -> String {
        self.kind()
            .map(|kind| kind.name.to_string())
            .unwrap_or_else(|| format!("Pet #{}", self.pet_id))
    }
}

/// An NFT in the player's wallet. Which variant it is comes from the struct
/// type the item was fetched under, never from the shape of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedItem {
    Gear(Gear),
    Pet(Pet),
}

impl OwnedItem {
    pub fn id(&self) -> ObjectId {
        match self {
            OwnedItem::Gear(gear) => gear.id,
            OwnedItem::Pet(pet) => pet.id,
        }
    }

    pub fn rarity(&self) -> Rarity {
        match self {
            OwnedItem::Gear(gear) => gear.rarity,
            OwnedItem::Pet(pet) => pet.rarity,
        }
    }

    pub fn label(&self) -> String {
        match self {
            OwnedItem::Gear(gear) => format!(
                "{} {} (set {})",
                gear.rarity,
                gear.slot.name(),
                gear.set_id
            ),
            OwnedItem::Pet(pet) => format!("{} {}", pet.rarity, pet.name()),
        }
    }
}

/// Three interchangeable gear items that can be fused into one of the next
/// rarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeGroup {
    pub slot: GearSlot,
    pub set_id: u8,
    pub rarity: Rarity,
    pub items: [ObjectId; 3],
}

impl UpgradeGroup {
    pub fn result_rarity(&self) -> Rarity {
        // groups are never built from the top tier
        self.rarity.next().unwrap_or(self.rarity)
    }
}

/// Partitions unequipped gear into fusable triples of identical slot, set
/// and rarity. Leftovers that do not fill a triple are ignored.
pub fn upgrade_groups(gear: &[Gear], equipped: &EquippedGear) -> Vec<UpgradeGroup> {
    gear.iter()
        .filter(|g| g.rarity.next().is_some() && !equipped.contains(&g.id))
        .into_group_map_by(|g| (g.slot, g.set_id, g.rarity))
        .into_iter()
        .sorted_by_key(|(key, _)| *key)
        .flat_map(|((slot, set_id, rarity), mut members)| {
            members.sort_by_key(|g| g.id);
            members
                .chunks_exact(3)
                .map(|chunk| UpgradeGroup {
                    slot,
                    set_id,
                    rarity,
                    items: [chunk[0].id, chunk[1].id, chunk[2].id],
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatTotals {
    pub atk: u64,
    pub hp: u64,
    pub acc: u64,
    pub def: u64,
}

/// Sum of the stats of every equipped item found in `gear`.
pub fn equipped_totals(equipped: &EquippedGear, gear: &[Gear]) -> StatTotals {
    equipped
        .iter()
        .filter_map(|(_, id)| gear.iter().find(|g| g.id == id))
        .fold(StatTotals::default(), |acc, g| StatTotals {
            atk: acc.atk + g.atk,
            hp: acc.hp + g.hp,
            acc: acc.acc + g.acc,
            def: acc.def + g.def,
        })
}

#[derive(Deserialize)]
struct GearFields {
    #[serde(deserialize_with = "move_json::u8")]
    slot: u8,
    #[serde(deserialize_with = "move_json::u8")]
    set_id: u8,
    #[serde(deserialize_with = "move_json::u8")]
    rarity: u8,
    #[serde(deserialize_with = "move_json::u64")]
    atk: u64,
    #[serde(deserialize_with = "move_json::u64")]
    hp: u64,
    #[serde(deserialize_with = "move_json::u64")]
    acc: u64,
    #[serde(deserialize_with = "move_json::u64")]
    def: u64,
}

#[derive(Deserialize)]
struct PetFields {
    #[serde(deserialize_with = "move_json::u8")]
    pet_id: u8,
    #[serde(deserialize_with = "move_json::u8")]
    rarity: u8,
    #[serde(deserialize_with = "move_json::u8")]
    bonus_type: u8,
    #[serde(deserialize_with = "move_json::u64")]
    bonus_value: u64,
}
