//src/items/src/store.rs
use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::ItemDefinition;
use crate::instance::{ItemId, ItemInstance};

/// 物品实例仓库：所有实例按ID存放，容器只保存ID
#[derive(Clone, Debug, Default)]
pub struct ItemStore {
    next_id: u32,
    items: HashMap<ItemId, ItemInstance>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由定义创建新实例
    pub fn spawn(&mut self, definition: Arc<ItemDefinition>, stack_count: u32) -> ItemId {
        self.next_id += 1;
        let id = ItemId(self.next_id);
        self.items.insert(id, ItemInstance::new(definition, stack_count));
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemInstance> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut ItemInstance> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// 销毁实例并返回其最后状态
    pub fn release(&mut self, id: ItemId) -> Option<ItemInstance> {
        self.items.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }
}
