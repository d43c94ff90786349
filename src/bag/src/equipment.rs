// src/bag/src/equipment.rs
use std::collections::HashMap;

use items::{ItemCategory, ItemId, ItemInstance, ItemStore, ItemSubCategory};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};
use thiserror::Error;
use tracing::debug;

use crate::events::BagEvent;
use crate::{Bag, BagError, Owner};

#[derive(Debug, Error, PartialEq)]
pub enum EquipError {
    #[error("装备槽已锁定: {0}")]
    SlotLocked(EquipmentSlot),
    #[error("装备槽不可用: {0}")]
    SlotBlocked(EquipmentSlot),
    #[error("装备槽已被占用: {0}")]
    SlotOccupied(EquipmentSlot),
    #[error("装备槽为空: {0}")]
    SlotEmpty(EquipmentSlot),
    #[error("不兼容的装备类型: {0}")]
    Incompatible(EquipmentSlot),
    #[error("背包空间不足，无法卸下: {0}")]
    NoRoomToReturn(EquipmentSlot),
}

/// 装备位枚举（支持完整迭代）
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    EnumIter,
    EnumCount,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum EquipmentSlot {
    #[strum(serialize = "头盔")]
    Helmet,
    #[strum(serialize = "护甲")]
    Armor,
    #[strum(serialize = "背包")]
    Backpack,
    #[strum(serialize = "主武器")]
    PrimaryWeapon,
    #[strum(serialize = "副武器")]
    SecondaryWeapon,
    #[strum(serialize = "手枪")]
    Pistol,
    #[strum(serialize = "刀")]
    Knife,
    #[strum(serialize = "设备1")]
    Device1,
    #[strum(serialize = "设备2")]
    Device2,
    #[strum(serialize = "设备3")]
    Device3,
    #[strum(serialize = "主手雷")]
    GrenadePrimary,
    #[strum(serialize = "副手雷")]
    GrenadeSecondary,
    #[strum(serialize = "模块1")]
    ItemSlot1,
    #[strum(serialize = "模块2")]
    ItemSlot2,
    #[strum(serialize = "模块3")]
    ItemSlot3,
    #[strum(serialize = "模块4")]
    ItemSlot4,
    #[strum(serialize = "模块5")]
    ItemSlot5,
    #[strum(serialize = "快捷栏1")]
    QuickSlot1,
    #[strum(serialize = "快捷栏2")]
    QuickSlot2,
    #[strum(serialize = "快捷栏3")]
    QuickSlot3,
    #[strum(serialize = "快捷栏4")]
    QuickSlot4,
}

impl EquipmentSlot {
    pub const MODULE_SLOTS: [EquipmentSlot; 5] = [
        EquipmentSlot::ItemSlot1,
        EquipmentSlot::ItemSlot2,
        EquipmentSlot::ItemSlot3,
        EquipmentSlot::ItemSlot4,
        EquipmentSlot::ItemSlot5,
    ];

    /// 护甲/头盔/背包，变化时需要重建槽位禁用状态
    pub fn is_outfit(self) -> bool {
        matches!(
            self,
            EquipmentSlot::Helmet | EquipmentSlot::Armor | EquipmentSlot::Backpack
        )
    }

    /// 模块槽序号（0..5）
    pub fn module_index(self) -> Option<usize> {
        Self::MODULE_SLOTS.iter().position(|s| *s == self)
    }

    pub fn is_quick_slot(self) -> bool {
        matches!(
            self,
            EquipmentSlot::QuickSlot1
                | EquipmentSlot::QuickSlot2
                | EquipmentSlot::QuickSlot3
                | EquipmentSlot::QuickSlot4
        )
    }

    /// 槽位本身的类别规则（不含护甲限制）
    fn accepts_kind(self, category: ItemCategory, sub: ItemSubCategory) -> bool {
        use EquipmentSlot::*;
        match self {
            Armor => category == ItemCategory::Armor,
            Helmet => category == ItemCategory::Helmet,
            Backpack => category == ItemCategory::Backpack,
            PrimaryWeapon | SecondaryWeapon => {
                category == ItemCategory::Weapons && sub.is_long_gun()
            }
            Pistol => sub == ItemSubCategory::Handgun,
            Knife => sub == ItemSubCategory::Knife,
            Device1 | Device2 | Device3 => category == ItemCategory::UsableItems,
            GrenadePrimary | GrenadeSecondary => sub == ItemSubCategory::Grenade,
            ItemSlot1 | ItemSlot2 | ItemSlot3 | ItemSlot4 | ItemSlot5 => sub.is_module(),
            QuickSlot1 | QuickSlot2 | QuickSlot3 | QuickSlot4 => sub.is_consumable(),
        }
    }
}

/// 单个装备槽状态
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlotState {
    pub item: Option<ItemId>,
    pub locked: bool,
    /// 由其他槽位状态推导
    pub blocked: bool,
}

/// 装备栏
#[derive(Clone, Debug)]
pub struct EquipmentPanel {
    slots: [SlotState; EquipmentSlot::COUNT],
    module_slots_unlocked: u8,
    module_slots_max: u8,
}

impl Default for EquipmentPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl EquipmentPanel {
    /// 空装备栏（没有护甲时模块槽全部不可用）
    pub fn new() -> Self {
        let mut panel = Self {
            slots: [SlotState::default(); EquipmentSlot::COUNT],
            module_slots_unlocked: 0,
            module_slots_max: 0,
        };
        for slot in EquipmentSlot::MODULE_SLOTS {
            panel.slots[slot as usize].blocked = true;
        }
        panel
    }

    pub fn slot_state(&self, slot: EquipmentSlot) -> &SlotState {
        &self.slots[slot as usize]
    }

    pub fn item_in(&self, slot: EquipmentSlot) -> Option<ItemId> {
        self.slots[slot as usize].item
    }

    pub fn slot_of(&self, id: ItemId) -> Option<EquipmentSlot> {
        EquipmentSlot::iter().find(|slot| self.item_in(*slot) == Some(id))
    }

    /// 已装备物品（按槽位顺序）
    pub fn equipped_items(&self) -> Vec<ItemId> {
        self.slots.iter().filter_map(|s| s.item).collect()
    }

    pub fn is_slot_locked(&self, slot: EquipmentSlot) -> bool {
        self.slots[slot as usize].locked
    }

    pub fn is_slot_blocked(&self, slot: EquipmentSlot) -> bool {
        self.slots[slot as usize].blocked
    }

    pub fn is_slot_occupied(&self, slot: EquipmentSlot) -> bool {
        self.item_in(slot).is_some()
    }

    pub fn set_slot_locked(&mut self, slot: EquipmentSlot, locked: bool) {
        self.slots[slot as usize].locked = locked;
    }

    pub(crate) fn set_item(&mut self, slot: EquipmentSlot, item: Option<ItemId>) {
        self.slots[slot as usize].item = item;
    }

    /// 当前可用的模块槽数量
    pub fn usable_module_slots(&self) -> usize {
        EquipmentSlot::MODULE_SLOTS
            .iter()
            .filter(|s| !self.is_slot_blocked(**s))
            .count()
    }

    /// 手动设置模块槽（钳制到 0..=5），随后全量重建
    pub fn set_armor_module_slots(
        &mut self,
        store: &ItemStore,
        unlocked: u8,
        max: u8,
    ) -> Vec<EquipmentSlot> {
        self.module_slots_unlocked = unlocked.min(items::outfit::MAX_MODULE_SLOTS);
        self.module_slots_max = max.min(items::outfit::MAX_MODULE_SLOTS);
        self.rebuild_blocked_slots(store)
    }

    /// 从当前护甲读取模块槽配置（无护甲为 0/0）
    pub fn apply_armor_module_slots(&mut self, store: &ItemStore) -> Vec<EquipmentSlot> {
        let (unlocked, max) = self
            .equipped(store, EquipmentSlot::Armor)
            .map(|armor| armor.definition().outfit.module_slots())
            .unwrap_or((0, 0));
        self.set_armor_module_slots(store, unlocked, max)
    }

    /// 全量重建禁用状态，返回禁用状态发生变化的槽位
    pub fn rebuild_blocked_slots(&mut self, store: &ItemStore) -> Vec<EquipmentSlot> {
        let before: Vec<bool> = self.slots.iter().map(|s| s.blocked).collect();
        for state in self.slots.iter_mut() {
            state.blocked = false;
        }

        let armor = self.equipped(store, EquipmentSlot::Armor);
        let unlocked = if armor.is_some() {
            self.module_slots_unlocked.min(self.module_slots_max) as usize
        } else {
            0
        };
        for (i, slot) in EquipmentSlot::MODULE_SLOTS.iter().enumerate() {
            self.slots[*slot as usize].blocked = i >= unlocked;
        }

        if let Some(armor) = armor {
            let outfit = &armor.definition().outfit;
            if !outfit.allow_external_helmet {
                self.slots[EquipmentSlot::Helmet as usize].blocked = true;
            }
            if !outfit.allow_external_backpack {
                self.slots[EquipmentSlot::Backpack as usize].blocked = true;
            }
        }

        EquipmentSlot::iter()
            .filter(|slot| before[*slot as usize] != self.slots[*slot as usize].blocked)
            .collect()
    }

    fn equipped<'a>(&self, store: &'a ItemStore, slot: EquipmentSlot) -> Option<&'a ItemInstance> {
        self.item_in(slot).and_then(|id| store.get(id))
    }

    /// 槽位状态与类别规则检查（不检查占用）
    pub fn accepts(
        &self,
        store: &ItemStore,
        item: &ItemInstance,
        slot: EquipmentSlot,
    ) -> Result<(), EquipError> {
        if self.is_slot_locked(slot) {
            return Err(EquipError::SlotLocked(slot));
        }
        if self.is_slot_blocked(slot) {
            return Err(EquipError::SlotBlocked(slot));
        }

        let def = item.definition();
        if !slot.accepts_kind(def.category, def.sub_category) {
            return Err(EquipError::Incompatible(slot));
        }

        let armor = self.equipped(store, EquipmentSlot::Armor);
        let gated = match (slot, armor) {
            (EquipmentSlot::Helmet, Some(armor)) => armor.definition().outfit.accepts_helmet(def),
            (EquipmentSlot::Backpack, Some(armor)) => {
                armor.definition().outfit.accepts_backpack(def)
            }
            _ => true,
        };
        if !gated {
            return Err(EquipError::Incompatible(slot));
        }
        Ok(())
    }

    pub fn can_equip(&self, store: &ItemStore, id: ItemId, slot: EquipmentSlot) -> bool {
        match store.get(id) {
            Some(item) => !self.is_slot_occupied(slot) && self.accepts(store, item, slot).is_ok(),
            None => false,
        }
    }

    /// 与候选护甲冲突、需要先卸下的头盔/背包槽
    pub fn armor_conflicts(&self, store: &ItemStore, armor: &ItemInstance) -> Vec<EquipmentSlot> {
        let outfit = &armor.definition().outfit;
        let mut out = Vec::new();
        if let Some(helmet) = self.equipped(store, EquipmentSlot::Helmet) {
            if !outfit.accepts_helmet(helmet.definition()) {
                out.push(EquipmentSlot::Helmet);
            }
        }
        if let Some(backpack) = self.equipped(store, EquipmentSlot::Backpack) {
            if !outfit.accepts_backpack(backpack.definition()) {
                out.push(EquipmentSlot::Backpack);
            }
        }
        out
    }
}

impl Bag {
    /// 装备物品
    ///
    /// 物品若已在其他槽位会先从原槽位移出；`remove_from_source` 为真时从背包网格中取出。
    /// 装备护甲时，与之冲突的头盔/背包会先放回背包，放不下则整个操作失败。
    pub fn equip(
        &mut self,
        slot: EquipmentSlot,
        id: ItemId,
        remove_from_source: bool,
    ) -> Result<(), BagError> {
        let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
        self.equipment.accepts(&self.store, item, slot)?;
        if self.equipment.is_slot_occupied(slot) {
            return Err(EquipError::SlotOccupied(slot).into());
        }

        let owner = self.owner_of(id);
        match owner {
            Some(Owner::Grid) if !remove_from_source => return Err(BagError::AlreadyOwned(id)),
            Some(Owner::Weapon(_)) => return Err(BagError::AlreadyOwned(id)),
            None => self.ensure_weight_for(id)?,
            _ => {}
        }

        let evictions = if slot == EquipmentSlot::Armor {
            self.equipment.armor_conflicts(&self.store, item)
        } else {
            Vec::new()
        };
        if !evictions.is_empty() {
            let mut simulated = self.inventory.clone();
            if owner == Some(Owner::Grid) {
                simulated.remove(id);
            }
            let evicted: Vec<ItemId> = evictions
                .iter()
                .filter_map(|s| self.equipment.item_in(*s))
                .collect();
            if !simulated.can_fit_all(&self.store, &evicted) {
                debug!(item = %id, ?evictions, "armor equip rejected, no room for conflicting gear");
                return Err(EquipError::NoRoomToReturn(evictions[0]).into());
            }
        }

        match owner {
            Some(Owner::Slot(from)) => {
                self.take_from_slot(from);
            }
            Some(Owner::Grid) => {
                self.inventory.remove(id);
                self.mark_inventory_changed();
            }
            _ => {}
        }

        for evicted_slot in evictions {
            if let Some(evicted) = self.take_from_slot(evicted_slot) {
                self.insert_into_grid(evicted)?;
                self.events.cue(BagEvent::ItemUnequipped {
                    item: evicted,
                    slot: evicted_slot,
                });
            }
        }

        self.equipment.set_item(slot, Some(id));
        self.events.slot_changed(slot);
        self.events.cue(BagEvent::ItemEquipped { item: id, slot });
        if owner.is_none() {
            self.mark_inventory_changed();
        } else {
            self.invalidate_weight();
        }
        if slot.is_outfit() {
            self.refresh_outfit();
        }
        Ok(())
    }

    /// 卸下装备；`return_to_inventory` 为真时放回背包，放不下则保持不变
    ///
    /// 可堆叠物品放回时可能与已有堆叠合并，返回的ID届时不再有效。
    pub fn unequip(
        &mut self,
        slot: EquipmentSlot,
        return_to_inventory: bool,
    ) -> Result<ItemId, BagError> {
        let id = self
            .equipment
            .item_in(slot)
            .ok_or(EquipError::SlotEmpty(slot))?;

        if return_to_inventory {
            let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
            let plan = self
                .inventory
                .plan_insert(&self.store, id, item, &HashMap::new())
                .ok_or(EquipError::NoRoomToReturn(slot))?;
            self.take_from_slot(slot);
            self.commit_insert(id, plan);
        } else {
            self.take_from_slot(slot);
            self.mark_inventory_changed();
        }

        self.events.cue(BagEvent::ItemUnequipped { item: id, slot });
        Ok(id)
    }

    pub fn set_slot_locked(&mut self, slot: EquipmentSlot, locked: bool) {
        self.equipment.set_slot_locked(slot, locked);
        self.events.slot_changed(slot);
    }

    /// 宿主覆盖模块槽数量（如护甲升级后）
    pub fn set_armor_module_slots(&mut self, unlocked: u8, max: u8) {
        let changed = self
            .equipment
            .set_armor_module_slots(&self.store, unlocked, max);
        for slot in changed {
            self.events.slot_changed(slot);
        }
    }

    pub fn can_equip(&self, id: ItemId, slot: EquipmentSlot) -> bool {
        self.equipment.can_equip(&self.store, id, slot)
    }

    /// 清空槽位并返回原物品
    pub(crate) fn take_from_slot(&mut self, slot: EquipmentSlot) -> Option<ItemId> {
        let id = self.equipment.item_in(slot)?;
        self.equipment.set_item(slot, None);
        self.events.slot_changed(slot);
        self.invalidate_weight();
        if slot.is_outfit() {
            self.refresh_outfit();
        }
        Some(id)
    }

    /// 护甲/头盔/背包变化后重新推导模块槽与禁用状态
    fn refresh_outfit(&mut self) {
        let changed = self.equipment.apply_armor_module_slots(&self.store);
        for slot in changed {
            self.events.slot_changed(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use items::{DefinitionId, ItemDefinition, OutfitConfig};
    use std::sync::Arc;

    fn spawn(store: &mut ItemStore, category: ItemCategory, sub: ItemSubCategory) -> ItemId {
        store.spawn(
            Arc::new(ItemDefinition {
                id: DefinitionId(store.len() as u32 + 1),
                category,
                sub_category: sub,
                ..ItemDefinition::default()
            }),
            1,
        )
    }

    fn armor(store: &mut ItemStore, outfit: OutfitConfig) -> ItemId {
        store.spawn(
            Arc::new(ItemDefinition {
                id: DefinitionId(100),
                category: ItemCategory::Armor,
                outfit,
                ..ItemDefinition::default()
            }),
            1,
        )
    }

    #[test]
    fn test_slot_table() {
        assert_eq!(EquipmentSlot::COUNT, 21);
        assert_eq!(EquipmentSlot::ItemSlot3.module_index(), Some(2));
        assert_eq!(EquipmentSlot::Pistol.module_index(), None);
        assert_eq!(EquipmentSlot::Armor.to_string(), "护甲");
    }

    #[test]
    fn test_weapon_slot_rules() {
        let mut store = ItemStore::new();
        let rifle = spawn(&mut store, ItemCategory::Weapons, ItemSubCategory::Asr);
        let pistol = spawn(&mut store, ItemCategory::Weapons, ItemSubCategory::Handgun);
        let grenade = spawn(&mut store, ItemCategory::Weapons, ItemSubCategory::Grenade);
        let panel = EquipmentPanel::new();

        assert!(panel.can_equip(&store, rifle, EquipmentSlot::PrimaryWeapon));
        assert!(panel.can_equip(&store, rifle, EquipmentSlot::SecondaryWeapon));
        assert!(!panel.can_equip(&store, pistol, EquipmentSlot::PrimaryWeapon));
        assert!(panel.can_equip(&store, pistol, EquipmentSlot::Pistol));
        assert!(!panel.can_equip(&store, grenade, EquipmentSlot::SecondaryWeapon));
        assert!(panel.can_equip(&store, grenade, EquipmentSlot::GrenadeSecondary));
    }

    #[test]
    fn test_consumables_and_devices() {
        let mut store = ItemStore::new();
        let medkit = spawn(&mut store, ItemCategory::Items, ItemSubCategory::Medicine);
        let pda = spawn(&mut store, ItemCategory::UsableItems, ItemSubCategory::Pda);
        let panel = EquipmentPanel::new();

        assert!(panel.can_equip(&store, medkit, EquipmentSlot::QuickSlot4));
        assert!(!panel.can_equip(&store, medkit, EquipmentSlot::Device1));
        assert!(panel.can_equip(&store, pda, EquipmentSlot::Device3));
    }

    #[test]
    fn test_module_slots_blocked_without_armor() {
        let mut store = ItemStore::new();
        let artefact = spawn(&mut store, ItemCategory::Items, ItemSubCategory::Artefact);
        let mut panel = EquipmentPanel::new();
        assert_eq!(panel.usable_module_slots(), 0);
        assert_eq!(
            panel
                .accepts(&store, store.get(artefact).unwrap(), EquipmentSlot::ItemSlot1)
                .unwrap_err(),
            EquipError::SlotBlocked(EquipmentSlot::ItemSlot1)
        );

        let vest = armor(
            &mut store,
            OutfitConfig {
                max_module_slots: 4,
                unlocked_module_slots: 2,
                ..OutfitConfig::default()
            },
        );
        panel.set_item(EquipmentSlot::Armor, Some(vest));
        let changed = panel.apply_armor_module_slots(&store);
        assert_eq!(changed, vec![EquipmentSlot::ItemSlot1, EquipmentSlot::ItemSlot2]);
        assert_eq!(panel.usable_module_slots(), 2);
        assert!(panel.can_equip(&store, artefact, EquipmentSlot::ItemSlot2));
        assert!(!panel.can_equip(&store, artefact, EquipmentSlot::ItemSlot3));

        panel.set_armor_module_slots(&store, 9, 9);
        assert_eq!(panel.usable_module_slots(), 5);

        panel.set_item(EquipmentSlot::Armor, None);
        panel.apply_armor_module_slots(&store);
        assert_eq!(panel.usable_module_slots(), 0);
    }

    #[test]
    fn test_sealed_suit_blocks_helmet_slot() {
        let mut store = ItemStore::new();
        let helmet = spawn(&mut store, ItemCategory::Helmet, ItemSubCategory::None);
        let suit = armor(
            &mut store,
            OutfitConfig {
                allow_external_helmet: false,
                ..OutfitConfig::default()
            },
        );
        let mut panel = EquipmentPanel::new();
        assert!(panel.can_equip(&store, helmet, EquipmentSlot::Helmet));

        panel.set_item(EquipmentSlot::Armor, Some(suit));
        panel.rebuild_blocked_slots(&store);
        assert!(panel.is_slot_blocked(EquipmentSlot::Helmet));
        assert!(!panel.is_slot_blocked(EquipmentSlot::Backpack));
        assert!(!panel.can_equip(&store, helmet, EquipmentSlot::Helmet));
    }

    #[test]
    fn test_locked_slot_rejects() {
        let mut store = ItemStore::new();
        let knife = spawn(&mut store, ItemCategory::Weapons, ItemSubCategory::Knife);
        let mut panel = EquipmentPanel::new();
        panel.set_slot_locked(EquipmentSlot::Knife, true);
        assert_eq!(
            panel
                .accepts(&store, store.get(knife).unwrap(), EquipmentSlot::Knife)
                .unwrap_err(),
            EquipError::SlotLocked(EquipmentSlot::Knife)
        );
    }

    #[test]
    fn test_armor_conflicts_by_tag() {
        let mut store = ItemStore::new();
        let pack = store.spawn(
            Arc::new(ItemDefinition {
                id: DefinitionId(50),
                category: ItemCategory::Backpack,
                tags: vec!["frame".into()],
                ..ItemDefinition::default()
            }),
            1,
        );
        let mut outfit = OutfitConfig::default();
        outfit.backpack_rules.blocked_tags = vec!["frame".into()];
        let exo = armor(&mut store, outfit);

        let mut panel = EquipmentPanel::new();
        panel.set_item(EquipmentSlot::Backpack, Some(pack));
        assert_eq!(
            panel.armor_conflicts(&store, store.get(exo).unwrap()),
            vec![EquipmentSlot::Backpack]
        );
    }
}
