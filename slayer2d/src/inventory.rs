//! Ordered item slots and the active selection.

use anyhow::{Context, Result};

use crate::assets::AssetProvider;
use crate::config::ItemSpec;
use crate::engine::TickContext;
use crate::food::Food;
use crate::math::Vec2;
use crate::weapon::{Holder, Weapon};

#[derive(Clone, Debug)]
pub enum Item {
    Weapon(Weapon),
    Food(Food),
}

impl Item {
    pub fn load(spec: &ItemSpec, assets: &mut dyn AssetProvider) -> Result<Self> {
        Ok(match spec {
            ItemSpec::Weapon(name) => Item::Weapon(Weapon::new(name, assets)?),
            ItemSpec::Food(name) => Item::Food(Food::new(name, assets)?),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Weapon(weapon) => weapon.name(),
            Item::Food(food) => food.name(),
        }
    }

    pub fn as_weapon(&self) -> Option<&Weapon> {
        match self {
            Item::Weapon(weapon) => Some(weapon),
            Item::Food(_) => None,
        }
    }

    pub fn as_food(&self) -> Option<&Food> {
        match self {
            Item::Food(food) => Some(food),
            Item::Weapon(_) => None,
        }
    }

    /// Reloading or eating.
    pub fn is_busy(&self) -> bool {
        match self {
            Item::Weapon(weapon) => weapon.is_reloading(),
            Item::Food(food) => food.is_eating(),
        }
    }

    fn disable(&mut self) {
        match self {
            Item::Weapon(weapon) => weapon.disable(),
            Item::Food(food) => food.disable(),
        }
    }
}

/// Where the weapon should appear when it is drawn.
#[derive(Clone, Copy, Debug)]
pub struct Grip {
    pub holder: Holder,
    /// Initial weapon anchor (the holder's hitbox centre).
    pub anchor: Vec2,
    pub aim: Vec2,
}

/// The player's items. The selected slot may point past the end of the
/// list, in which case nothing is active.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    items: Vec<Item>,
    selected: Option<usize>,
}

impl Inventory {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            selected: None,
        }
    }

    pub fn from_loadout(loadout: &[ItemSpec], assets: &mut dyn AssetProvider) -> Result<Self> {
        let items = loadout
            .iter()
            .enumerate()
            .map(|(slot, spec)| {
                Item::load(spec, assets).with_context(|| format!("loading inventory slot {slot}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn active(&self) -> Option<&Item> {
        self.selected.and_then(|slot| self.items.get(slot))
    }

    pub fn active_mut(&mut self) -> Option<&mut Item> {
        self.selected.and_then(|slot| self.items.get_mut(slot))
    }

    pub fn active_weapon(&self) -> Option<&Weapon> {
        self.active().and_then(Item::as_weapon)
    }

    pub fn active_weapon_mut(&mut self) -> Option<&mut Weapon> {
        match self.active_mut() {
            Some(Item::Weapon(weapon)) => Some(weapon),
            _ => None,
        }
    }

    pub fn active_food(&self) -> Option<&Food> {
        self.active().and_then(Item::as_food)
    }

    pub fn active_food_mut(&mut self) -> Option<&mut Food> {
        match self.active_mut() {
            Some(Item::Food(food)) => Some(food),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active().is_some_and(Item::is_busy)
    }

    /// Put the active item away. Refused while busy unless `force`.
    pub fn holster(&mut self, force: bool) -> bool {
        if self.is_busy() && !force {
            return false;
        }
        let Some(slot) = self.selected.take() else {
            return false;
        };
        if let Some(item) = self.items.get_mut(slot) {
            item.disable();
        }
        true
    }

    /// Switch to `slot`. Refused while busy unless `force`. An index past
    /// the end is remembered but selects nothing.
    pub fn select(&mut self, slot: usize, force: bool, grip: &Grip) -> bool {
        if self.is_busy() && !force {
            return false;
        }
        self.holster(force);
        self.selected = Some(slot);
        match self.items.get_mut(slot) {
            Some(Item::Weapon(weapon)) => weapon.activate(&grip.holder, grip.anchor, grip.aim),
            Some(Item::Food(food)) => food.activate(),
            None => {}
        }
        log::debug!("selected slot {slot}");
        true
    }

    /// Drop a used-up food from the active slot and select whatever slides
    /// into its place.
    pub fn remove_depleted(&mut self, grip: &Grip) -> bool {
        let Some(slot) = self.selected else {
            return false;
        };
        if !self.active_food().is_some_and(Food::is_depleted) {
            return false;
        }
        let removed = self.items.remove(slot);
        log::debug!("{} used up", removed.name());
        self.selected = None;
        self.select(slot, true, grip);
        true
    }

    /// Tick the active item. Returns health restored by finished food.
    pub fn update_active(&mut self, holder: &Holder, ctx: &mut TickContext) -> Option<f32> {
        match self.active_mut()? {
            Item::Weapon(weapon) => {
                weapon.update(holder, ctx);
                None
            }
            Item::Food(food) => food.update(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::SoundId;
    use crate::engine::testing::Harness;
    use crate::food::FoodInfo;
    use crate::player::Facing;
    use crate::weapon::tests::gun_info;

    fn grip() -> Grip {
        Grip {
            holder: Holder {
                center: Vec2::new(50.0, 50.0),
                facing: Facing::East,
                sprinting: false,
                velocity: Vec2::ZERO,
            },
            anchor: Vec2::new(50.0, 50.0),
            aim: Vec2::new(200.0, 50.0),
        }
    }

    fn food(quantity: u32) -> Food {
        let info = FoodInfo {
            name: "bread".into(),
            hp_recover: 10.0,
            eating_time: 1.0,
            quantity,
        };
        Food::from_info(info, SoundId::new("e"), SoundId::new("h"))
    }

    fn inventory() -> Inventory {
        Inventory::new(vec![
            Item::Weapon(Weapon::from_info(Arc::new(gun_info(10.0, 5, 5)))),
            Item::Food(food(1)),
            Item::Weapon(Weapon::from_info(Arc::new(gun_info(20.0, 5, 5)))),
        ])
    }

    #[test]
    fn selecting_disables_previous_slot() {
        let mut inv = inventory();
        assert!(inv.select(0, false, &grip()));
        assert!(inv.active_weapon().is_some_and(Weapon::is_enabled));
        assert!(inv.select(2, false, &grip()));
        assert!(!inv.items()[0].as_weapon().is_some_and(Weapon::is_enabled));
        assert!(inv.items()[2].as_weapon().is_some_and(Weapon::is_enabled));
    }

    #[test]
    fn selection_is_locked_while_reloading() {
        let mut harness = Harness::new(1);
        let mut inv = inventory();
        inv.select(0, false, &grip());
        if let Some(weapon) = inv.active_weapon_mut() {
            assert!(weapon.reload(&mut harness.ctx(0.0)));
        }
        assert!(inv.is_busy());
        assert!(!inv.select(2, false, &grip()));
        assert_eq!(inv.selected(), Some(0));
        assert!(!inv.holster(false));
        assert!(inv.select(2, true, &grip()));
    }

    #[test]
    fn out_of_range_slot_is_inert() {
        let mut inv = inventory();
        assert!(inv.select(7, false, &grip()));
        assert_eq!(inv.selected(), Some(7));
        assert!(inv.active().is_none());
    }

    #[test]
    fn depleted_food_is_removed_and_next_slot_selected() {
        let mut harness = Harness::new(1);
        let mut inv = inventory();
        inv.select(1, false, &grip());
        if let Some(food) = inv.active_food_mut() {
            assert!(food.eat(&mut harness.ctx(0.0)));
        }
        assert!(!inv.remove_depleted(&grip()));
        let healed = inv.update_active(&grip().holder, &mut harness.ctx(2.0));
        assert_eq!(healed, Some(10.0));
        assert!(inv.remove_depleted(&grip()));
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.selected(), Some(1));
        assert!(inv.active_weapon().is_some_and(Weapon::is_enabled));
    }
}
