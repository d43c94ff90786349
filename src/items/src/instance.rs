//src/items/src/instance.rs
use std::fmt;
use std::sync::Arc;

use crate::ammo::AmmoType;
use crate::definition::{DefinitionId, ItemDefinition, ItemSize};
use crate::ItemRole;

/// 运行时物品实例ID（由 `ItemStore` 分配，不复用）
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 弹匣内已装填的弹药
#[derive(Clone, Debug)]
pub struct LoadedAmmo {
    pub definition: Arc<ItemDefinition>,
}

impl LoadedAmmo {
    pub fn ammo_type(&self) -> AmmoType {
        self.definition.ammo_type
    }

    pub fn unit_weight(&self) -> f32 {
        self.definition.unit_weight()
    }
}

/// 弹匣运行时状态
#[derive(Clone, Debug, Default)]
pub struct MagazineState {
    pub ammo_count: u32,
    /// 首次装填时记录，清空后重置
    pub loaded: Option<LoadedAmmo>,
    /// 所在武器（非拥有引用）
    pub owner_weapon: Option<ItemId>,
}

impl MagazineState {
    pub fn loaded_ammo_type(&self) -> AmmoType {
        self.loaded
            .as_ref()
            .map(LoadedAmmo::ammo_type)
            .unwrap_or(AmmoType::None)
    }

    pub fn ammo_weight(&self) -> f32 {
        match &self.loaded {
            Some(ammo) => ammo.unit_weight() * self.ammo_count as f32,
            None => 0.0,
        }
    }
}

/// 磨损程度分档
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WearBand {
    Base,
    Good,
    Average,
    Poor,
}

/// 物品实例：引用一个定义并携带自身的运行时状态
#[derive(Clone, Debug)]
pub struct ItemInstance {
    definition: Arc<ItemDefinition>,
    stack_count: u32,
    durability: f32,
    charge: f32,
    rotated: bool,
    inserted_magazine: Option<ItemId>,
    magazine: MagazineState,
}

impl ItemInstance {
    pub fn new(definition: Arc<ItemDefinition>, stack_count: u32) -> Self {
        let durability = if definition.durability.has_durability {
            definition.durability.max_durability.max(0.0)
        } else {
            0.0
        };
        let charge = if definition.charge.has_charge {
            definition.charge.max_charge.max(0.0)
        } else {
            0.0
        };

        let mut item = Self {
            definition,
            stack_count: 1,
            durability,
            charge,
            rotated: false,
            inserted_magazine: None,
            magazine: MagazineState::default(),
        };
        item.set_stack_count(stack_count);
        item
    }

    pub fn definition(&self) -> &Arc<ItemDefinition> {
        &self.definition
    }

    pub fn definition_id(&self) -> DefinitionId {
        self.definition.id
    }

    pub fn role(&self) -> ItemRole {
        self.definition.role()
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn stack_count(&self) -> u32 {
        self.stack_count
    }

    /// 钳制到 1..=上限，返回实际写入的数量
    pub fn set_stack_count(&mut self, count: u32) -> u32 {
        self.stack_count = count.clamp(1, self.definition.stack_limit());
        self.stack_count
    }

    pub fn is_stackable(&self) -> bool {
        self.definition.stackable
    }

    pub fn stack_space(&self) -> u32 {
        self.definition.stack_limit().saturating_sub(self.stack_count)
    }

    /// 同一定义的可堆叠物品才能合并
    pub fn can_stack_with(&self, other: &ItemInstance) -> bool {
        self.is_stackable() && other.is_stackable() && self.definition.id == other.definition.id
    }

    pub fn durability(&self) -> f32 {
        self.durability
    }

    pub fn set_durability(&mut self, value: f32) {
        let cfg = &self.definition.durability;
        if cfg.has_durability {
            self.durability = value.clamp(0.0, cfg.max_durability.max(0.0));
        }
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    pub fn set_charge(&mut self, value: f32) {
        let cfg = &self.definition.charge;
        if cfg.has_charge {
            self.charge = value.clamp(0.0, cfg.max_charge.max(0.0));
        }
    }

    pub fn wear_band(&self) -> WearBand {
        let cfg = &self.definition.durability;
        if !cfg.has_durability || cfg.max_durability <= 0.0 {
            return WearBand::Base;
        }
        let wear = 1.0 - (self.durability / cfg.max_durability).clamp(0.0, 1.0);
        if wear < 0.15 {
            WearBand::Base
        } else if wear < 0.5 {
            WearBand::Good
        } else if wear < 0.8 {
            WearBand::Average
        } else {
            WearBand::Poor
        }
    }

    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    pub fn set_rotated(&mut self, rotated: bool) {
        self.rotated = rotated && self.definition.can_rotate;
    }

    /// 考虑旋转后的占用尺寸
    pub fn size(&self) -> ItemSize {
        self.definition.size.oriented(self.rotated)
    }

    pub fn inserted_magazine(&self) -> Option<ItemId> {
        self.inserted_magazine
    }

    pub fn set_inserted_magazine(&mut self, magazine: Option<ItemId>) {
        self.inserted_magazine = magazine;
    }

    pub fn magazine_state(&self) -> &MagazineState {
        &self.magazine
    }

    pub fn magazine_state_mut(&mut self) -> &mut MagazineState {
        &mut self.magazine
    }

    pub fn owner_weapon(&self) -> Option<ItemId> {
        self.magazine.owner_weapon
    }

    pub fn magazine_capacity(&self) -> u32 {
        self.definition.magazine.capacity
    }

    /// 自身重量：单件重量 x 数量，弹匣再加上已装填弹药
    pub fn own_weight(&self) -> f32 {
        let mut weight = self.definition.unit_weight() * self.stack_count as f32;
        if matches!(self.role(), ItemRole::Magazine(_)) {
            weight += self.magazine.ammo_weight();
        }
        weight
    }
}
