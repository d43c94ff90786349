// src/bag/src/lib.rs
//! 背包系统：网格背包、装备栏、弹匣/弹药挂载与负重
//!
//! 所有物品实例都存放在 `ItemStore` 中，网格格子、装备槽与武器上的弹匣只保存 `ItemId`。
//! 任意时刻一个实例只属于一个容器。所有失败的操作都不会修改任何状态。

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use items::{Catalog, DefinitionId, ItemId, ItemInstance, ItemRole, ItemStore};
use thiserror::Error;
use tracing::{debug, warn};

pub mod attachment;
pub mod config;
pub mod equipment;
pub mod events;
pub mod inventory;
pub mod weight;
pub mod world;

pub use attachment::AttachError;
pub use config::BagConfig;
pub use equipment::{EquipError, EquipmentPanel, EquipmentSlot, SlotState};
pub use events::BagEvent;
pub use inventory::{GridInventory, InsertPlan, InventoryError, MAX_GRID_SIDE, Tile};
pub use world::{WorldSpawner, WorldStack};

use events::EventQueue;

/// 背包特定的错误类型
#[derive(Debug, Error, PartialEq)]
pub enum BagError {
    #[error(transparent)]
    Inventory(#[from] InventoryError), // 网格/负重错误
    #[error(transparent)]
    Equipment(#[from] EquipError), // 装备错误
    #[error(transparent)]
    Attachment(#[from] AttachError), // 挂载错误
    #[error("未知物品: {0}")]
    UnknownItem(ItemId),
    #[error("未知物品定义: {0}")]
    UnknownDefinition(DefinitionId),
    #[error("物品已属于其他容器: {0}")]
    AlreadyOwned(ItemId),
    #[error("物品无法使用: {0}")]
    CannotUseItem(ItemId),
    #[error("丢弃失败: {0}")]
    DropRejected(String),
}

/// 物品当前的所属容器
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Owner {
    Grid,
    Slot(EquipmentSlot),
    /// 插在该武器上的弹匣
    Weapon(ItemId),
}

/// 完整的背包系统
#[derive(Debug)]
pub struct Bag {
    catalog: Arc<Catalog>,
    pub(crate) store: ItemStore,
    pub(crate) inventory: GridInventory,
    pub(crate) equipment: EquipmentPanel,
    pub(crate) max_carry_weight: f32,
    pub(crate) weight_cache: Cell<Option<f32>>,
    pub(crate) events: EventQueue,
}

impl Bag {
    pub fn new(catalog: Arc<Catalog>, config: BagConfig) -> Self {
        let config = config.normalized();
        Self {
            catalog,
            store: ItemStore::new(),
            inventory: GridInventory::new(config.columns, config.rows),
            equipment: EquipmentPanel::new(),
            max_carry_weight: config.max_carry_weight,
            weight_cache: Cell::new(None),
            events: EventQueue::default(),
        }
    }

    /* ================== 查询 ================== */
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn inventory(&self) -> &GridInventory {
        &self.inventory
    }

    pub fn equipment(&self) -> &EquipmentPanel {
        &self.equipment
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemInstance> {
        self.store.get(id)
    }

    pub fn item_at(&self, index: usize) -> Option<ItemId> {
        self.inventory.item_at(index)
    }

    pub fn room_available(&self, id: ItemId, top_left: usize) -> bool {
        match self.store.get(id) {
            Some(item) => self.inventory.room_available(item, top_left),
            None => false,
        }
    }

    pub fn room_available_for_move(&self, id: ItemId, top_left: usize) -> bool {
        match self.store.get(id) {
            Some(item) => self.inventory.room_available_for_move(id, item, top_left),
            None => false,
        }
    }

    pub fn owner_of(&self, id: ItemId) -> Option<Owner> {
        if self.inventory.contains(id) {
            return Some(Owner::Grid);
        }
        if let Some(slot) = self.equipment.slot_of(id) {
            return Some(Owner::Slot(slot));
        }
        let weapon = self.store.get(id)?.owner_weapon()?;
        let linked = self
            .store
            .get(weapon)
            .is_some_and(|w| w.inserted_magazine() == Some(id));
        linked.then_some(Owner::Weapon(weapon))
    }

    /// 物品在网格、装备栏中，或插在被携带的武器上
    pub fn is_carried(&self, id: ItemId) -> bool {
        match self.owner_of(id) {
            Some(Owner::Grid) | Some(Owner::Slot(_)) => true,
            Some(Owner::Weapon(weapon)) => {
                matches!(self.owner_of(weapon), Some(Owner::Grid) | Some(Owner::Slot(_)))
            }
            None => false,
        }
    }

    /* ================== 实例创建与销毁 ================== */

    /// 按目录定义创建一个不属于任何容器的实例
    pub fn create_item(&mut self, definition: DefinitionId, count: u32) -> Result<ItemId, BagError> {
        let def = self
            .catalog
            .get(definition)
            .ok_or(BagError::UnknownDefinition(definition))?;
        Ok(self.store.spawn(def, count))
    }

    /// 销毁一个不属于任何容器的实例（连同插在上面的弹匣）
    pub fn discard(&mut self, id: ItemId) -> bool {
        if !self.store.contains(id) || self.owner_of(id).is_some() {
            return false;
        }
        self.release_tree(id);
        true
    }

    /// 释放实例；武器上的弹匣一并释放
    pub(crate) fn release_tree(&mut self, id: ItemId) {
        if let Some(item) = self.store.release(id) {
            if let Some(magazine) = item.inserted_magazine() {
                self.store.release(magazine);
            }
        }
    }

    /* ================== 网格操作 ================== */

    /// 放入背包：先检查负重，再合并到已有堆叠，剩余部分放到第一个空位
    ///
    /// 返回放入网格的实例；完全合并进已有堆叠时返回 `None`（原实例被销毁）。
    /// 剩余部分没有空位时，已合并的数量保留，原实例缩减为剩余数量并返回
    /// `PartiallyAdded`；连一个都合并不了时返回 `NoRoom`，背包与物品均不变。
    pub fn try_add(&mut self, id: ItemId) -> Result<Option<ItemId>, BagError> {
        if !self.store.contains(id) {
            return Err(BagError::UnknownItem(id));
        }
        if self.owner_of(id).is_some() {
            return Err(BagError::AlreadyOwned(id));
        }
        self.ensure_weight_for(id)?;

        let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
        let pending = HashMap::new();
        if let Some(plan) = self.inventory.plan_insert(&self.store, id, item, &pending) {
            return Ok(self.commit_insert(id, plan));
        }
        let partial = self.inventory.plan_merges(&self.store, id, item, &pending);
        if partial.merges.is_empty() {
            debug!(item = %id, "no room in grid");
            return Err(InventoryError::NoRoom.into());
        }
        let remaining = partial.remainder;
        self.apply_merges(&partial);
        if let Some(item) = self.store.get_mut(id) {
            item.set_stack_count(remaining);
        }
        debug!(item = %id, merged = partial.merged(), remaining, "partially added");
        Err(InventoryError::PartiallyAdded { remaining }.into())
    }

    /// 创建并放入背包；放不下的新实例（或合并后的剩余部分）被销毁
    pub fn add_new(
        &mut self,
        definition: DefinitionId,
        count: u32,
    ) -> Result<Option<ItemId>, BagError> {
        let id = self.create_item(definition, count)?;
        self.try_add(id).inspect_err(|_| {
            self.store.release(id);
        })
    }

    /// 规划并提交插入（不检查负重）
    pub(crate) fn insert_into_grid(&mut self, id: ItemId) -> Result<Option<ItemId>, BagError> {
        let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
        match self
            .inventory
            .plan_insert(&self.store, id, item, &HashMap::new())
        {
            Some(plan) => Ok(self.commit_insert(id, plan)),
            None => {
                debug!(item = %id, "no room in grid");
                Err(InventoryError::NoRoom.into())
            }
        }
    }

    pub(crate) fn commit_insert(&mut self, id: ItemId, plan: InsertPlan) -> Option<ItemId> {
        self.apply_merges(&plan);

        let Some(top_left) = plan.placement else {
            self.release_tree(id);
            return None;
        };
        let size = match self.store.get_mut(id) {
            Some(item) => {
                item.set_stack_count(plan.remainder);
                item.size()
            }
            None => return None,
        };
        self.inventory.write_cells(id, size, top_left);
        Some(id)
    }

    fn apply_merges(&mut self, plan: &InsertPlan) {
        for (target, n) in &plan.merges {
            if let Some(existing) = self.store.get_mut(*target) {
                let count = existing.stack_count() + n;
                existing.set_stack_count(count);
            }
        }
        self.mark_inventory_changed();
    }

    /// 从网格移除（物品变为无归属）；物品不在网格中时无副作用
    pub fn remove(&mut self, id: ItemId) -> bool {
        let removed = self.inventory.remove(id);
        if removed {
            self.mark_inventory_changed();
        }
        removed
    }

    /// 放到指定位置；已在网格中的物品会被移动
    pub fn place_at(&mut self, id: ItemId, top_left: usize) -> Result<(), BagError> {
        let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
        if self.inventory.contains(id) {
            self.inventory.place_at(id, item, top_left)?;
        } else {
            if self.owner_of(id).is_some() {
                return Err(BagError::AlreadyOwned(id));
            }
            if top_left >= self.inventory.capacity() {
                return Err(InventoryError::OutOfBounds(top_left).into());
            }
            if !self.inventory.room_available(item, top_left) {
                return Err(InventoryError::NoRoom.into());
            }
            self.ensure_weight_for(id)?;
            let size = item.size();
            self.inventory.write_cells(id, size, top_left);
        }
        self.mark_inventory_changed();
        Ok(())
    }

    /// 旋转物品；在网格中时必须能在原左上角放下旋转后的尺寸
    pub fn rotate(&mut self, id: ItemId) -> Result<(), BagError> {
        let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
        if !item.definition().can_rotate {
            return Err(InventoryError::CannotRotate.into());
        }
        let rotated = !item.is_rotated();
        let size = item.definition().size.oriented(rotated);

        if let Some(top_left) = self.inventory.top_left_of(id) {
            if !self.inventory.fits(size, top_left, Some(id)) {
                return Err(InventoryError::NoRoom.into());
            }
            self.inventory.remove(id);
            self.inventory.write_cells(id, size, top_left);
        }
        if let Some(item) = self.store.get_mut(id) {
            item.set_rotated(rotated);
        }
        self.mark_inventory_changed();
        Ok(())
    }

    /// 使用物品：数量减一，用尽时移除并销毁；返回剩余数量
    ///
    /// 网格中的物品与快捷栏中的物品都可使用。
    pub fn use_item(&mut self, id: ItemId) -> Result<u32, BagError> {
        let slot = match self.owner_of(id) {
            Some(Owner::Grid) => None,
            Some(Owner::Slot(slot)) if slot.is_quick_slot() => Some(slot),
            _ => return Err(BagError::CannotUseItem(id)),
        };
        let item = self.store.get_mut(id).ok_or(BagError::UnknownItem(id))?;
        let definition = item.definition_id();
        let remaining = item.stack_count().saturating_sub(1);

        if remaining > 0 {
            item.set_stack_count(remaining);
        } else {
            match slot {
                Some(slot) => {
                    self.take_from_slot(slot);
                }
                None => {
                    self.inventory.remove(id);
                }
            }
            self.release_tree(id);
        }

        self.events.item_used(id, definition, remaining);
        self.mark_inventory_changed();
        Ok(remaining)
    }

    /// 拾取地面物品：先补满已有堆叠，再按堆叠上限分批放入；受负重限制
    ///
    /// 返回拾取数量，`pile` 保留未拾取的部分。一个都拾取不了时返回错误。
    pub fn pickup(&mut self, pile: &mut WorldStack) -> Result<u32, BagError> {
        let def = self
            .catalog
            .get(pile.definition)
            .ok_or(BagError::UnknownDefinition(pile.definition))?;
        let unit_weight = def.unit_weight();
        let mut remaining = pile.count;
        let mut picked = 0;
        let mut failure = InventoryError::NoRoom;

        if def.stackable {
            for existing_id in self.inventory.unique_items() {
                let space = match self.store.get(existing_id) {
                    Some(existing)
                        if existing.definition_id() == def.id && existing.is_stackable() =>
                    {
                        existing.stack_space()
                    }
                    _ => continue,
                };
                if space == 0 {
                    continue;
                }
                let add = self.allowed_by_weight(unit_weight, space.min(remaining));
                if add == 0 {
                    failure = InventoryError::TooHeavy;
                    break;
                }
                if let Some(existing) = self.store.get_mut(existing_id) {
                    let count = existing.stack_count() + add;
                    existing.set_stack_count(count);
                }
                self.mark_inventory_changed();
                picked += add;
                remaining -= add;
                if remaining == 0 {
                    break;
                }
            }
        }

        while remaining > 0 && failure == InventoryError::NoRoom {
            let chunk = self.allowed_by_weight(unit_weight, remaining.min(def.stack_limit()));
            if chunk == 0 {
                failure = InventoryError::TooHeavy;
                break;
            }
            let id = self.store.spawn(def.clone(), chunk);
            if self.insert_into_grid(id).is_err() {
                self.store.release(id);
                break;
            }
            picked += chunk;
            remaining -= chunk;
        }

        pile.count = remaining;
        if picked == 0 {
            debug!(definition = %def.id, reason = %failure, "pickup rejected");
            return Err(failure.into());
        }
        self.events.cue(BagEvent::ItemPickedUp {
            definition: def.id,
            count: picked,
        });
        Ok(picked)
    }

    /// 丢弃物品：先交给世界生成接口，成功后才从容器移除并销毁
    ///
    /// 插在武器上的弹匣需要先取下。
    pub fn drop_item(&mut self, id: ItemId, spawner: &mut dyn WorldSpawner) -> Result<(), BagError> {
        let owner = self.owner_of(id);
        if let Some(Owner::Weapon(_)) = owner {
            return Err(BagError::AlreadyOwned(id));
        }
        let item = self.store.get(id).ok_or(BagError::UnknownItem(id))?;
        let magazine = item.inserted_magazine().and_then(|m| self.store.get(m));
        if let Err(err) = spawner.spawn_pickup(item, magazine) {
            warn!(item = %id, error = %err, "world spawner refused dropped item");
            return Err(BagError::DropRejected(format!("{err:#}")));
        }
        let definition = item.definition_id();
        let count = item.stack_count();

        match owner {
            Some(Owner::Grid) => {
                self.inventory.remove(id);
            }
            Some(Owner::Slot(slot)) => {
                self.take_from_slot(slot);
            }
            _ => {}
        }
        self.release_tree(id);
        self.events.cue(BagEvent::ItemDropped {
            item: id,
            definition,
            count,
        });
        self.mark_inventory_changed();
        Ok(())
    }

    pub fn set_durability(&mut self, id: ItemId, value: f32) -> Result<(), BagError> {
        let item = self.store.get_mut(id).ok_or(BagError::UnknownItem(id))?;
        item.set_durability(value);
        self.mark_item_changed(id);
        Ok(())
    }

    pub fn set_charge(&mut self, id: ItemId, value: f32) -> Result<(), BagError> {
        let item = self.store.get_mut(id).ok_or(BagError::UnknownItem(id))?;
        item.set_charge(value);
        self.mark_item_changed(id);
        Ok(())
    }

    /* ================== 通知 ================== */

    /// 取出本次更新累积的事件
    pub fn flush_events(&mut self) -> Vec<BagEvent> {
        self.events.drain()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub(crate) fn mark_inventory_changed(&mut self) {
        self.events.inventory_changed();
        self.invalidate_weight();
    }

    /// 物品自身状态变化：通知其所在容器
    pub(crate) fn mark_item_changed(&mut self, id: ItemId) {
        let mut current = id;
        loop {
            match self.owner_of(current) {
                Some(Owner::Slot(slot)) => {
                    self.events.slot_changed(slot);
                    break;
                }
                Some(Owner::Weapon(weapon)) => current = weapon,
                _ => break,
            }
        }
        self.mark_inventory_changed();
    }

    pub(crate) fn role_of(&self, id: ItemId) -> Result<ItemRole, BagError> {
        self.store
            .get(id)
            .map(ItemInstance::role)
            .ok_or(BagError::UnknownItem(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use items::{ItemCategory, ItemDefinition, ItemSize, ItemSubCategory};
    use pretty_assertions::assert_eq;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_definitions([
                ItemDefinition {
                    id: DefinitionId(1),
                    name: "Crate".into(),
                    size: ItemSize::new(2, 2),
                    weight: 5.0,
                    ..ItemDefinition::default()
                },
                ItemDefinition {
                    id: DefinitionId(2),
                    name: "Bandage".into(),
                    category: ItemCategory::Items,
                    sub_category: ItemSubCategory::Medicine,
                    stackable: true,
                    max_stack: 30,
                    weight: 0.1,
                    ..ItemDefinition::default()
                },
                ItemDefinition {
                    id: DefinitionId(3),
                    name: "Rail".into(),
                    size: ItemSize::new(3, 1),
                    weight: 1.0,
                    ..ItemDefinition::default()
                },
            ])
            .unwrap(),
        )
    }

    fn bag(columns: u32, rows: u32, limit: f32) -> Bag {
        Bag::new(
            catalog(),
            BagConfig {
                columns,
                rows,
                max_carry_weight: limit,
            },
        )
    }

    #[test]
    fn test_try_add_merges_then_places() {
        let mut bag = bag(8, 11, 0.0);
        let first = bag.add_new(DefinitionId(2), 20).unwrap().unwrap();
        let second = bag.add_new(DefinitionId(2), 15).unwrap().unwrap();

        assert_eq!(bag.item(first).unwrap().stack_count(), 30);
        assert_eq!(bag.item(second).unwrap().stack_count(), 5);
        assert_eq!(bag.inventory().unique_items(), vec![first, second]);

        // 完全合并时实例被销毁
        let third = bag.create_item(DefinitionId(2), 5).unwrap();
        assert_eq!(bag.try_add(third).unwrap(), None);
        assert!(bag.item(third).is_none());
        assert_eq!(bag.item(second).unwrap().stack_count(), 10);
    }

    #[test]
    fn test_try_add_rejects_owned_item() {
        let mut bag = bag(4, 4, 0.0);
        let id = bag.add_new(DefinitionId(1), 1).unwrap().unwrap();
        assert_eq!(bag.try_add(id), Err(BagError::AlreadyOwned(id)));
    }

    #[test]
    fn test_weight_limit_blocks_add() {
        let mut bag = bag(8, 11, 8.0);
        bag.add_new(DefinitionId(1), 1).unwrap();
        let err = bag.add_new(DefinitionId(1), 1).unwrap_err();
        assert_eq!(err, BagError::Inventory(InventoryError::TooHeavy));
        assert_eq!(bag.inventory().unique_items().len(), 1);
        // 失败的新实例不留在仓库中
        assert_eq!(bag.store().len(), 1);
    }

    #[test]
    fn test_add_without_room_keeps_merged_units() {
        let mut bag = bag(1, 1, 0.0);
        let stack = bag.add_new(DefinitionId(2), 25).unwrap().unwrap();
        bag.flush_events();

        let incoming = bag.create_item(DefinitionId(2), 10).unwrap();
        assert_eq!(
            bag.try_add(incoming),
            Err(BagError::Inventory(InventoryError::PartiallyAdded { remaining: 5 }))
        );
        assert_eq!(bag.item(stack).unwrap().stack_count(), 30);
        assert_eq!(bag.item(incoming).unwrap().stack_count(), 5);
        assert_eq!(bag.owner_of(incoming), None);
        assert_eq!(bag.flush_events(), vec![BagEvent::InventoryChanged]);

        // 已满的堆叠不再接收，背包保持不变
        assert_eq!(
            bag.try_add(incoming),
            Err(BagError::Inventory(InventoryError::NoRoom))
        );
        assert_eq!(bag.item(incoming).unwrap().stack_count(), 5);
        assert!(!bag.has_pending_events());
    }

    #[test]
    fn test_place_at_moves_existing_item() {
        let mut bag = bag(4, 4, 0.0);
        let id = bag.add_new(DefinitionId(1), 1).unwrap().unwrap();
        assert_eq!(bag.inventory().top_left_of(id), Some(0));
        bag.place_at(id, 1).unwrap();
        assert_eq!(bag.inventory().cells_of(id), vec![1, 2, 5, 6]);
        assert_eq!(
            bag.place_at(id, 3),
            Err(BagError::Inventory(InventoryError::NoRoom))
        );
        assert_eq!(bag.inventory().top_left_of(id), Some(1));
    }

    #[test]
    fn test_place_loose_item() {
        let mut bag = bag(4, 4, 0.0);
        let id = bag.create_item(DefinitionId(3), 1).unwrap();
        assert!(bag.room_available(id, 4));
        bag.place_at(id, 4).unwrap();
        assert_eq!(bag.owner_of(id), Some(Owner::Grid));
        let second = bag.create_item(DefinitionId(3), 1).unwrap();
        assert_eq!(
            bag.place_at(second, 99),
            Err(BagError::Inventory(InventoryError::OutOfBounds(99)))
        );
    }

    #[test]
    fn test_rotate_in_place() {
        let mut bag = bag(3, 3, 0.0);
        let rail = bag.add_new(DefinitionId(3), 1).unwrap().unwrap();
        bag.rotate(rail).unwrap();
        assert!(bag.item(rail).unwrap().is_rotated());
        assert_eq!(bag.inventory().cells_of(rail), vec![0, 3, 6]);

        // 旋转回去时右侧被占用则失败
        let blocker = bag.create_item(DefinitionId(2), 1).unwrap();
        bag.place_at(blocker, 1).unwrap();
        assert_eq!(
            bag.rotate(rail),
            Err(BagError::Inventory(InventoryError::NoRoom))
        );
        assert!(bag.item(rail).unwrap().is_rotated());
    }

    #[test]
    fn test_use_decrements_then_removes() {
        let mut bag = bag(4, 4, 0.0);
        let id = bag.add_new(DefinitionId(2), 2).unwrap().unwrap();
        bag.flush_events();

        assert_eq!(bag.use_item(id).unwrap(), 1);
        assert_eq!(bag.use_item(id).unwrap(), 0);
        assert!(!bag.inventory().contains(id));
        assert!(bag.item(id).is_none());
        assert_eq!(
            bag.flush_events(),
            vec![
                BagEvent::ItemUsed {
                    item: id,
                    definition: DefinitionId(2),
                    remaining: 1,
                },
                BagEvent::ItemUsed {
                    item: id,
                    definition: DefinitionId(2),
                    remaining: 0,
                },
                BagEvent::InventoryChanged,
            ]
        );
        assert_eq!(bag.use_item(id), Err(BagError::CannotUseItem(id)));
    }

    #[test]
    fn test_remove_is_noop_for_absent_item() {
        let mut bag = bag(4, 4, 0.0);
        let loose = bag.create_item(DefinitionId(1), 1).unwrap();
        assert!(!bag.remove(loose));
        assert!(!bag.has_pending_events());
        assert!(bag.discard(loose));
        assert!(bag.store().is_empty());
    }

    #[test]
    fn test_unknown_definition() {
        let mut bag = bag(4, 4, 0.0);
        assert_eq!(
            bag.create_item(DefinitionId(77), 1),
            Err(BagError::UnknownDefinition(DefinitionId(77)))
        );
    }
}
