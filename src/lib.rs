//! 物品/背包/装备引擎
//!
//! 子系统位于各自的 crate 中，这里统一导出并提供事件总线。

pub mod event_bus;

pub use bag::{
    AttachError, Bag, BagConfig, BagError, BagEvent, EquipError, EquipmentPanel, EquipmentSlot,
    GridInventory, InventoryError, MAX_GRID_SIDE, Owner, WorldSpawner, WorldStack,
};
pub use error::{GameError, handle_error};
pub use event_bus::{EventBus, EventHandler, EventMiddleware, Priority};
pub use items::{
    AmmoType, Catalog, DefinitionId, ItemCategory, ItemDefinition, ItemId, ItemInstance,
    ItemRole, ItemStore, ItemSubCategory, MagazineType,
};
