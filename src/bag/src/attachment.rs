// src/bag/src/attachment.rs
//! 弹匣/弹药挂载：武器 <-> 弹匣 <-> 弹药
use items::{AmmoType, ItemId, ItemRole, LoadedAmmo};
use thiserror::Error;
use tracing::debug;

use crate::events::BagEvent;
use crate::{Bag, BagError, InventoryError, Owner};

#[derive(Debug, Error, PartialEq)]
pub enum AttachError {
    #[error("不是武器: {0}")]
    NotAWeapon(ItemId),
    #[error("不是弹匣: {0}")]
    NotAMagazine(ItemId),
    #[error("不是弹药: {0}")]
    NotAmmo(ItemId),
    #[error("弹匣已插在其他武器上: {0}")]
    MagazineInUse(ItemId),
    #[error("弹匣与武器不兼容")]
    IncompatibleMagazine,
    #[error("武器已装有弹匣: {0}")]
    WeaponLoaded(ItemId),
    #[error("武器未装弹匣")]
    NoMagazine,
    #[error("弹匣已满")]
    MagazineFull,
    #[error("弹药与弹匣不兼容: {0}")]
    IncompatibleAmmo(AmmoType),
    #[error("弹匣内已有其他弹药: {0}")]
    MixedAmmo(AmmoType),
    #[error("弹匣为空")]
    MagazineEmpty,
    #[error("不支持的物品组合")]
    UnsupportedPair,
}

impl Bag {
    /// 把弹匣插入武器
    ///
    /// 武器上已有其他弹匣时，`allow_swap` 为真且旧弹匣能放回背包才会替换。
    /// 插入的正是当前弹匣时直接成功。
    pub fn attach_magazine(
        &mut self,
        weapon: ItemId,
        magazine: ItemId,
        allow_swap: bool,
    ) -> Result<(), BagError> {
        if self.role_of(weapon)? != ItemRole::Weapon {
            return Err(AttachError::NotAWeapon(weapon).into());
        }
        let ItemRole::Magazine(magazine_type) = self.role_of(magazine)? else {
            return Err(AttachError::NotAMagazine(magazine).into());
        };
        let weapon_item = self.store.get(weapon).ok_or(BagError::UnknownItem(weapon))?;
        let magazine_item = self
            .store
            .get(magazine)
            .ok_or(BagError::UnknownItem(magazine))?;

        let current = weapon_item.inserted_magazine();
        if current == Some(magazine) {
            return Ok(());
        }
        if magazine_item.owner_weapon().is_some() {
            return Err(AttachError::MagazineInUse(magazine).into());
        }
        if !weapon_item
            .definition()
            .weapon
            .accepts_magazine(magazine_type, &magazine_item.definition().magazine)
        {
            debug!(%weapon, %magazine, ?magazine_type, "incompatible magazine");
            return Err(AttachError::IncompatibleMagazine.into());
        }
        let magazine_owner = self.owner_of(magazine);
        if let Some(Owner::Slot(_)) = magazine_owner {
            return Err(BagError::AlreadyOwned(magazine));
        }
        if current.is_some() && !allow_swap {
            return Err(AttachError::WeaponLoaded(weapon).into());
        }

        let weapon_carried = self.is_carried(weapon);
        let mut delta = 0.0;
        if weapon_carried && magazine_owner.is_none() {
            delta += self.item_weight(magazine);
        }
        if let Some(old) = current {
            if !weapon_carried {
                delta += self.item_weight(old);
            }
            let mut simulated = self.inventory.clone();
            simulated.remove(magazine);
            if !simulated.can_fit_all(&self.store, &[old]) {
                debug!(%weapon, %old, "swap rejected, no room for the old magazine");
                return Err(InventoryError::NoRoom.into());
            }
        }
        self.ensure_weight(delta)?;

        if magazine_owner == Some(Owner::Grid) {
            self.inventory.remove(magazine);
        }
        if let Some(old) = current {
            self.unlink(weapon, old);
            self.insert_into_grid(old)?;
            self.events.cue(BagEvent::MagazineDetached {
                weapon,
                magazine: old,
            });
        }
        self.link(weapon, magazine);
        self.events.cue(BagEvent::MagazineAttached { weapon, magazine });
        self.mark_item_changed(weapon);
        Ok(())
    }

    /// 取下弹匣；`return_to_inventory` 为真时放回背包，放不下则保持不变
    pub fn detach_magazine(
        &mut self,
        weapon: ItemId,
        return_to_inventory: bool,
    ) -> Result<ItemId, BagError> {
        if self.role_of(weapon)? != ItemRole::Weapon {
            return Err(AttachError::NotAWeapon(weapon).into());
        }
        let magazine = self
            .store
            .get(weapon)
            .and_then(|w| w.inserted_magazine())
            .ok_or(AttachError::NoMagazine)?;

        if return_to_inventory {
            if !self.is_carried(weapon) {
                self.ensure_weight(self.item_weight(magazine))?;
            }
            self.unlink(weapon, magazine);
            if let Err(err) = self.insert_into_grid(magazine) {
                self.link(weapon, magazine);
                debug!(%weapon, %magazine, "detach rolled back, no room");
                return Err(err);
            }
        } else {
            self.unlink(weapon, magazine);
        }

        self.events
            .cue(BagEvent::MagazineDetached { weapon, magazine });
        self.mark_item_changed(weapon);
        Ok(magazine)
    }

    /// 向弹匣装填弹药，返回装填数量
    ///
    /// `requested` 为 `None`（或 0）时尽量装满。弹药堆叠用尽后被销毁。
    pub fn load_ammo(
        &mut self,
        magazine: ItemId,
        ammo: ItemId,
        requested: Option<u32>,
    ) -> Result<u32, BagError> {
        if !matches!(self.role_of(magazine)?, ItemRole::Magazine(_)) {
            return Err(AttachError::NotAMagazine(magazine).into());
        }
        let ItemRole::Ammo(ammo_type) = self.role_of(ammo)? else {
            return Err(AttachError::NotAmmo(ammo).into());
        };
        let magazine_item = self
            .store
            .get(magazine)
            .ok_or(BagError::UnknownItem(magazine))?;
        let ammo_item = self.store.get(ammo).ok_or(BagError::UnknownItem(ammo))?;

        let state = magazine_item.magazine_state();
        let free = magazine_item
            .magazine_capacity()
            .saturating_sub(state.ammo_count);
        if free == 0 {
            return Err(AttachError::MagazineFull.into());
        }
        if !magazine_item.definition().magazine.accepts_ammo(ammo_type) {
            return Err(AttachError::IncompatibleAmmo(ammo_type).into());
        }
        let loaded_type = state.loaded_ammo_type();
        if state.ammo_count > 0 && loaded_type != AmmoType::None && loaded_type != ammo_type {
            return Err(AttachError::MixedAmmo(loaded_type).into());
        }
        if let Some(Owner::Slot(_)) = self.owner_of(ammo) {
            return Err(BagError::AlreadyOwned(ammo));
        }

        let want = match requested {
            Some(n) if n > 0 => n.min(free),
            _ => free,
        };
        let count = want.min(ammo_item.stack_count());
        let ammo_definition = ammo_item.definition().clone();
        let available = ammo_item.stack_count();
        if self.is_carried(magazine) && !self.is_carried(ammo) {
            self.ensure_weight(ammo_definition.unit_weight() * count as f32)?;
        }

        if let Some(magazine_item) = self.store.get_mut(magazine) {
            let state = magazine_item.magazine_state_mut();
            if state.ammo_count == 0 || state.loaded.is_none() {
                state.loaded = Some(LoadedAmmo {
                    definition: ammo_definition,
                });
            }
            state.ammo_count += count;
        }

        if count >= available {
            self.inventory.remove(ammo);
            self.store.release(ammo);
        } else if let Some(ammo_item) = self.store.get_mut(ammo) {
            ammo_item.set_stack_count(available - count);
        }

        self.events.cue(BagEvent::AmmoLoaded {
            magazine,
            ammo_type,
            count,
        });
        self.mark_item_changed(magazine);
        Ok(count)
    }

    /// 向武器当前的弹匣装填弹药
    pub fn load_ammo_into_weapon(
        &mut self,
        weapon: ItemId,
        ammo: ItemId,
        requested: Option<u32>,
    ) -> Result<u32, BagError> {
        if self.role_of(weapon)? != ItemRole::Weapon {
            return Err(AttachError::NotAWeapon(weapon).into());
        }
        let magazine = self
            .store
            .get(weapon)
            .and_then(|w| w.inserted_magazine())
            .ok_or(AttachError::NoMagazine)?;
        self.load_ammo(magazine, ammo, requested)
    }

    /// 退出弹匣内所有弹药，作为新的弹药堆叠放回背包；放不下则保持不变
    pub fn unload_magazine(&mut self, magazine: ItemId) -> Result<u32, BagError> {
        if !matches!(self.role_of(magazine)?, ItemRole::Magazine(_)) {
            return Err(AttachError::NotAMagazine(magazine).into());
        }
        let (definition, total) = {
            let state = self
                .store
                .get(magazine)
                .ok_or(BagError::UnknownItem(magazine))?
                .magazine_state();
            match &state.loaded {
                Some(loaded) if state.ammo_count > 0 => {
                    (loaded.definition.clone(), state.ammo_count)
                }
                _ => return Err(AttachError::MagazineEmpty.into()),
            }
        };
        if !self.is_carried(magazine) {
            self.ensure_weight(definition.unit_weight() * total as f32)?;
        }

        let mut stacks = Vec::new();
        let mut left = total;
        while left > 0 {
            let chunk = left.min(definition.stack_limit());
            stacks.push(self.store.spawn(definition.clone(), chunk));
            left -= chunk;
        }
        if !self.inventory.can_fit_all(&self.store, &stacks) {
            for id in stacks {
                self.store.release(id);
            }
            debug!(%magazine, total, "unload rejected, no room");
            return Err(InventoryError::NoRoom.into());
        }

        for id in stacks {
            self.insert_into_grid(id)?;
        }
        if let Some(item) = self.store.get_mut(magazine) {
            let state = item.magazine_state_mut();
            state.ammo_count = 0;
            state.loaded = None;
        }
        self.mark_item_changed(magazine);
        Ok(total)
    }

    /// 通用入口：按载荷与目标的类别组合分派
    ///
    /// 弹匣->武器（允许替换，返回 0）、弹药->弹匣、弹药->武器；其他组合失败。
    pub fn apply_payload_to_target(
        &mut self,
        payload: ItemId,
        target: ItemId,
        requested: Option<u32>,
    ) -> Result<u32, BagError> {
        match (self.role_of(payload)?, self.role_of(target)?) {
            (ItemRole::Magazine(_), ItemRole::Weapon) => {
                self.attach_magazine(target, payload, true).map(|()| 0)
            }
            (ItemRole::Ammo(_), ItemRole::Magazine(_)) => self.load_ammo(target, payload, requested),
            (ItemRole::Ammo(_), ItemRole::Weapon) => {
                self.load_ammo_into_weapon(target, payload, requested)
            }
            _ => Err(AttachError::UnsupportedPair.into()),
        }
    }

    /// 武器->弹匣与弹匣->武器的引用是否全部成对出现
    pub fn check_magazine_links(&self) -> bool {
        self.store.ids().into_iter().all(|id| {
            let Some(item) = self.store.get(id) else {
                return false;
            };
            let forward = item.inserted_magazine().is_none_or(|m| {
                self.store
                    .get(m)
                    .is_some_and(|mag| mag.owner_weapon() == Some(id))
            });
            let back = item.owner_weapon().is_none_or(|w| {
                self.store
                    .get(w)
                    .is_some_and(|weapon| weapon.inserted_magazine() == Some(id))
            });
            forward && back
        })
    }

    fn link(&mut self, weapon: ItemId, magazine: ItemId) {
        if let Some(item) = self.store.get_mut(weapon) {
            item.set_inserted_magazine(Some(magazine));
        }
        if let Some(item) = self.store.get_mut(magazine) {
            item.magazine_state_mut().owner_weapon = Some(weapon);
        }
    }

    fn unlink(&mut self, weapon: ItemId, magazine: ItemId) {
        if let Some(item) = self.store.get_mut(weapon) {
            item.set_inserted_magazine(None);
        }
        if let Some(item) = self.store.get_mut(magazine) {
            item.magazine_state_mut().owner_weapon = None;
        }
    }
}
