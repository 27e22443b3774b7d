//! Cosmetic items the pet can own and wear.
//!
//! Items are purely visual. Some unlock with evolution, the rest require a
//! connected wallet that the holder check reported as eligible.

use super::state::PetState;
use crate::error::{Error, Result};

/// What it takes to unlock an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Evolution stage at or above the given index
    Stage(u8),
    /// Holder-gated; needs an eligible wallet
    Holder,
}

/// Catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: &'static str,
    pub name: &'static str,
    pub requirement: Requirement,
}

pub const CATALOG: [Item; 5] = [
    Item {
        id: "halo",
        name: "Soft Halo",
        requirement: Requirement::Stage(1),
    },
    Item {
        id: "flower_crown",
        name: "Flower Crown",
        requirement: Requirement::Stage(2),
    },
    Item {
        id: "star_cape",
        name: "Star Cape",
        requirement: Requirement::Stage(3),
    },
    Item {
        id: "crystal_aura",
        name: "Crystal Aura",
        requirement: Requirement::Holder,
    },
    Item {
        id: "cosmic_crown",
        name: "Cosmic Crown",
        requirement: Requirement::Holder,
    },
];

pub fn find_item(id: &str) -> Option<&'static Item> {
    CATALOG.iter().find(|item| item.id == id)
}

fn lookup(id: &str) -> Result<&'static Item> {
    find_item(id).ok_or_else(|| Error::NotFound {
        entity: "item",
        key: id.to_string(),
    })
}

impl Item {
    pub fn is_unlocked(&self, state: &PetState, holder_eligible: bool) -> bool {
        match self.requirement {
            Requirement::Stage(stage) => state.evolution_stage >= stage,
            Requirement::Holder => holder_eligible,
        }
    }
}

/// Items whose requirement is met but that are not owned yet.
pub fn claimable(state: &PetState, holder_eligible: bool) -> Vec<&'static Item> {
    CATALOG
        .iter()
        .filter(|item| item.is_unlocked(state, holder_eligible))
        .filter(|item| !state.owned_items.contains(item.id))
        .collect()
}

/// Add an item to the collection. Returns false if it was already owned.
pub fn grant_item(state: &mut PetState, id: &str, holder_eligible: bool) -> Result<bool> {
    let item = lookup(id)?;
    if !item.is_unlocked(state, holder_eligible) {
        let needs = match item.requirement {
            Requirement::Stage(stage) => {
                format!("reach the {} stage", super::evolution::stage_name(stage))
            }
            Requirement::Holder => "connect an eligible wallet".to_string(),
        };
        return Err(Error::InvalidInput(format!(
            "{} is locked: {}",
            item.name, needs
        )));
    }
    Ok(state.owned_items.insert(item.id.to_string()))
}

pub fn equip_item(state: &mut PetState, id: &str) -> Result<()> {
    let item = lookup(id)?;
    if !state.owned_items.contains(item.id) {
        return Err(Error::InvalidInput(format!("{} is not owned", item.name)));
    }
    state.equipped_item = Some(item.id.to_string());
    Ok(())
}

pub fn unequip_item(state: &mut PetState) -> Option<String> {
    state.equipped_item.take()
}
