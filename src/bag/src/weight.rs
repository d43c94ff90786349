// src/bag/src/weight.rs
//! 负重计算
use std::collections::HashSet;

use items::ItemId;
use tracing::trace;

use crate::{Bag, BagError, InventoryError};

/// 负重比较的容差
pub const WEIGHT_EPSILON: f32 = 1e-4;

impl Bag {
    pub fn max_carry_weight(&self) -> f32 {
        self.max_carry_weight
    }

    /// 小于等于 0 表示不限重
    pub fn set_max_carry_weight(&mut self, limit: f32) {
        self.max_carry_weight = if limit.is_finite() { limit } else { 0.0 };
        self.mark_inventory_changed();
    }

    /// 网格与装备栏中所有物品的总重量（含插入的弹匣及其弹药），每个实例只计一次
    pub fn total_weight(&self) -> f32 {
        if let Some(cached) = self.weight_cache.get() {
            return cached;
        }
        let mut seen = HashSet::new();
        let mut total = 0.0;
        let carried = self
            .inventory
            .unique_items()
            .into_iter()
            .chain(self.equipment.equipped_items());
        for id in carried {
            total += self.tree_weight(id, &mut seen);
        }
        trace!(total, "carry weight recomputed");
        self.weight_cache.set(Some(total));
        total
    }

    /// 单个物品（含插入的弹匣）的重量
    pub fn item_weight(&self, id: ItemId) -> f32 {
        self.tree_weight(id, &mut HashSet::new())
    }

    /// 物品加入后增加的重量；已被携带的物品为 0
    pub fn additional_weight(&self, id: ItemId) -> f32 {
        if self.is_carried(id) {
            0.0
        } else {
            self.item_weight(id)
        }
    }

    pub fn can_take_additional_weight(&self, weight: f32) -> bool {
        if self.max_carry_weight <= 0.0 || weight <= 0.0 {
            return true;
        }
        self.total_weight() + weight <= self.max_carry_weight + WEIGHT_EPSILON
    }

    /// 剩余可承重；不限重时为 `None`
    pub fn free_weight(&self) -> Option<f32> {
        (self.max_carry_weight > 0.0).then(|| (self.max_carry_weight - self.total_weight()).max(0.0))
    }

    pub(crate) fn ensure_weight_for(&self, id: ItemId) -> Result<(), BagError> {
        self.ensure_weight(self.additional_weight(id))
    }

    pub(crate) fn ensure_weight(&self, weight: f32) -> Result<(), BagError> {
        if self.can_take_additional_weight(weight) {
            Ok(())
        } else {
            trace!(weight, limit = self.max_carry_weight, "over carry limit");
            Err(InventoryError::TooHeavy.into())
        }
    }

    /// 在负重限制内最多还能放入多少个单位重量为 `unit` 的物品
    pub(crate) fn allowed_by_weight(&self, unit: f32, wanted: u32) -> u32 {
        if unit <= 0.0 {
            return wanted;
        }
        match self.free_weight() {
            None => wanted,
            Some(free) => {
                let fit = ((free + WEIGHT_EPSILON) / unit).floor();
                if fit >= wanted as f32 { wanted } else { fit as u32 }
            }
        }
    }

    pub(crate) fn invalidate_weight(&self) {
        self.weight_cache.set(None);
    }

    fn tree_weight(&self, id: ItemId, seen: &mut HashSet<ItemId>) -> f32 {
        if !seen.insert(id) {
            return 0.0;
        }
        let Some(item) = self.store.get(id) else {
            return 0.0;
        };
        let mut weight = item.own_weight();
        if let Some(magazine) = item.inserted_magazine() {
            weight += self.tree_weight(magazine, seen);
        }
        weight
    }
}
