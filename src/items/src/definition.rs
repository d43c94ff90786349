//src/items/src/definition.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ammo::{AmmoType, MagazineConfig, MagazineType, WeaponConfig};
use crate::outfit::OutfitConfig;
use crate::{ItemCategory, ItemRole, ItemSubCategory};

/// 目录中的物品定义ID
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(pub u32);

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def#{}", self.0)
    }
}

/// 占用格数（宽 x 高）
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSize {
    pub x: u32,
    pub y: u32,
}

impl Default for ItemSize {
    fn default() -> Self {
        Self { x: 1, y: 1 }
    }
}

impl ItemSize {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// 按旋转状态交换宽高，至少 1x1
    pub fn oriented(self, rotated: bool) -> Self {
        let (x, y) = if rotated { (self.y, self.x) } else { (self.x, self.y) };
        Self {
            x: x.max(1),
            y: y.max(1),
        }
    }
}

/// 耐久度参数
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurabilityConfig {
    pub has_durability: bool,
    pub max_durability: f32,
    pub can_repair: bool,
}

/// 电量参数
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    pub has_charge: bool,
    pub max_charge: f32,
}

/// 物品定义（加载后只读，由多个实例共享）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefinition {
    pub id: DefinitionId,
    pub name: String,
    pub category: ItemCategory,
    pub sub_category: ItemSubCategory,
    pub tags: Vec<String>,
    pub size: ItemSize,
    pub can_rotate: bool,
    pub stackable: bool,
    pub max_stack: u32,
    /// 单件重量
    pub weight: f32,
    pub ammo_type: AmmoType,
    pub magazine_type: MagazineType,
    pub durability: DurabilityConfig,
    pub charge: ChargeConfig,
    pub outfit: OutfitConfig,
    pub weapon: WeaponConfig,
    pub magazine: MagazineConfig,
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self {
            id: DefinitionId::default(),
            name: String::new(),
            category: ItemCategory::None,
            sub_category: ItemSubCategory::None,
            tags: Vec::new(),
            size: ItemSize::default(),
            can_rotate: true,
            stackable: false,
            max_stack: 1,
            weight: 0.0,
            ammo_type: AmmoType::None,
            magazine_type: MagazineType::None,
            durability: DurabilityConfig::default(),
            charge: ChargeConfig::default(),
            outfit: OutfitConfig::default(),
            weapon: WeaponConfig::default(),
            magazine: MagazineConfig::default(),
        }
    }
}

impl ItemDefinition {
    pub fn role(&self) -> ItemRole {
        ItemRole::of(self)
    }

    /// 实际堆叠上限（不可堆叠时为 1）
    pub fn stack_limit(&self) -> u32 {
        if self.stackable { self.max_stack.max(1) } else { 1 }
    }

    pub fn unit_weight(&self) -> f32 {
        self.weight.max(0.0)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
