// src/bag/src/events.rs
use items::{AmmoType, DefinitionId, ItemId};
use strum::{EnumCount, IntoEnumIterator};

use crate::equipment::EquipmentSlot;

/// 背包事件
/// 在一次更新内累积，由 `Bag::flush_events` 统一发出
#[derive(Debug, Clone, PartialEq)]
pub enum BagEvent {
    /// 物品装备事件
    ItemEquipped { item: ItemId, slot: EquipmentSlot },

    /// 物品卸下事件
    ItemUnequipped { item: ItemId, slot: EquipmentSlot },

    /// 物品拾取事件
    ItemPickedUp {
        definition: DefinitionId,
        count: u32,
    },

    /// 物品丢弃事件
    ItemDropped {
        item: ItemId,
        definition: DefinitionId,
        count: u32,
    },

    /// 弹匣插入武器
    MagazineAttached { weapon: ItemId, magazine: ItemId },

    /// 弹匣从武器取下
    MagazineDetached { weapon: ItemId, magazine: ItemId },

    /// 弹药装入弹匣
    AmmoLoaded {
        magazine: ItemId,
        ammo_type: AmmoType,
        count: u32,
    },

    /// 物品使用事件（`remaining` 为 0 表示已用尽）
    ItemUsed {
        item: ItemId,
        definition: DefinitionId,
        remaining: u32,
    },

    /// 装备栏变化（按槽位顺序，去重）
    EquipmentChanged { slots: Vec<EquipmentSlot> },

    /// 背包网格或负重变化
    InventoryChanged,
}

impl BagEvent {
    /// 获取事件类型的字符串表示
    pub fn event_type(&self) -> &'static str {
        match self {
            BagEvent::ItemEquipped { .. } => "ItemEquipped",
            BagEvent::ItemUnequipped { .. } => "ItemUnequipped",
            BagEvent::ItemPickedUp { .. } => "ItemPickedUp",
            BagEvent::ItemDropped { .. } => "ItemDropped",
            BagEvent::MagazineAttached { .. } => "MagazineAttached",
            BagEvent::MagazineDetached { .. } => "MagazineDetached",
            BagEvent::AmmoLoaded { .. } => "AmmoLoaded",
            BagEvent::ItemUsed { .. } => "ItemUsed",
            BagEvent::EquipmentChanged { .. } => "EquipmentChanged",
            BagEvent::InventoryChanged => "InventoryChanged",
        }
    }

    /// 提示类事件（供表现层播放音效/动画）
    pub fn is_cue(&self) -> bool {
        !matches!(
            self,
            BagEvent::ItemUsed { .. }
                | BagEvent::EquipmentChanged { .. }
                | BagEvent::InventoryChanged
        )
    }
}

/// 事件队列
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    cues: Vec<BagEvent>,
    used: Vec<BagEvent>,
    changed_slots: [bool; EquipmentSlot::COUNT],
    inventory_changed: bool,
}

impl EventQueue {
    pub fn cue(&mut self, event: BagEvent) {
        self.cues.push(event);
    }

    pub fn item_used(&mut self, item: ItemId, definition: DefinitionId, remaining: u32) {
        self.used.push(BagEvent::ItemUsed {
            item,
            definition,
            remaining,
        });
    }

    pub fn slot_changed(&mut self, slot: EquipmentSlot) {
        self.changed_slots[slot as usize] = true;
    }

    pub fn inventory_changed(&mut self) {
        self.inventory_changed = true;
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
            && self.used.is_empty()
            && !self.inventory_changed
            && !self.changed_slots.iter().any(|c| *c)
    }

    /// 提示事件 -> 使用事件 -> 装备栏变化 -> 背包变化
    pub fn drain(&mut self) -> Vec<BagEvent> {
        let mut out = std::mem::take(&mut self.cues);
        out.append(&mut self.used);

        let slots: Vec<EquipmentSlot> = EquipmentSlot::iter()
            .filter(|slot| self.changed_slots[*slot as usize])
            .collect();
        if !slots.is_empty() {
            out.push(BagEvent::EquipmentChanged { slots });
        }
        self.changed_slots = [false; EquipmentSlot::COUNT];

        if std::mem::take(&mut self.inventory_changed) {
            out.push(BagEvent::InventoryChanged);
        }
        out
    }
}
