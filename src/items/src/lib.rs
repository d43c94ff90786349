//src/items/src/lib.rs
//! 物品数据模型：目录定义、运行时实例与实例仓库

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub use crate::ammo::{AmmoType, MagazineConfig, MagazineType, WeaponConfig};
pub use crate::catalog::Catalog;
pub use crate::definition::{
    ChargeConfig, DefinitionId, DurabilityConfig, ItemDefinition, ItemSize,
};
pub use crate::instance::{ItemId, ItemInstance, LoadedAmmo, MagazineState, WearBand};
pub use crate::outfit::{AccessList, OutfitConfig};
pub use crate::store::ItemStore;

pub mod ammo;
pub mod catalog;
pub mod definition;
pub mod instance;
pub mod outfit;
pub mod store;

/// 物品大类
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ItemCategory {
    #[default]
    None,
    Weapons,
    Attachments,
    HeroParts,
    Armor,
    Helmet,
    HelmetAttachments,
    Backpack,
    UsableItems,
    Ammo,
    Items,
    Placeable,
}

/// 物品子类（决定装备槽位兼容性）
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ItemSubCategory {
    #[default]
    None,
    // 武器
    Asr,
    Snp,
    Smg,
    Shotgun,
    MachineGun,
    Handgun,
    Knife,
    Rpg,
    Grenade,
    // 配件
    Scope,
    Silencer,
    Muzzle,
    Magazine,
    Grip,
    Laser,
    WeaponLight,
    // 角色部件
    Head,
    Body,
    Hands,
    FpsHands,
    // 头盔配件
    HelmetVisual1,
    HelmetVisual2,
    // 可用设备
    Binocular,
    Pda,
    Detector,
    Flashlight,
    // 杂项
    Artefact,
    Module,
    Trophy,
    Tools,
    Components,
    Repair,
    Recipe,
    Food,
    Water,
    Medicine,
    Upgrade,
}

impl ItemSubCategory {
    /// 长枪类（可放入主/副武器槽）
    pub fn is_long_gun(self) -> bool {
        matches!(
            self,
            ItemSubCategory::Asr
                | ItemSubCategory::Snp
                | ItemSubCategory::Smg
                | ItemSubCategory::Shotgun
                | ItemSubCategory::MachineGun
                | ItemSubCategory::Rpg
        )
    }

    /// 可放入模块/神器槽
    pub fn is_module(self) -> bool {
        matches!(self, ItemSubCategory::Artefact | ItemSubCategory::Module)
    }

    /// 可放入快捷栏的消耗品
    pub fn is_consumable(self) -> bool {
        matches!(
            self,
            ItemSubCategory::Food | ItemSubCategory::Water | ItemSubCategory::Medicine
        )
    }
}

/// 物品在挂载系统中的角色
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemRole {
    Weapon,
    Magazine(MagazineType),
    Ammo(AmmoType),
    Other,
}

impl ItemRole {
    pub fn of(definition: &ItemDefinition) -> Self {
        match (definition.category, definition.sub_category) {
            (ItemCategory::Weapons, _) => ItemRole::Weapon,
            (ItemCategory::Attachments, ItemSubCategory::Magazine)
                if definition.magazine_type != MagazineType::None =>
            {
                ItemRole::Magazine(definition.magazine_type)
            }
            (ItemCategory::Ammo, _) if definition.ammo_type != AmmoType::None => {
                ItemRole::Ammo(definition.ammo_type)
            }
            _ => ItemRole::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_gun_excludes_sidearms() {
        assert!(ItemSubCategory::Asr.is_long_gun());
        assert!(ItemSubCategory::Rpg.is_long_gun());
        assert!(!ItemSubCategory::Handgun.is_long_gun());
        assert!(!ItemSubCategory::Knife.is_long_gun());
        assert!(!ItemSubCategory::Grenade.is_long_gun());
    }

    #[test]
    fn test_role_requires_typed_magazine() {
        let mut def = ItemDefinition {
            category: ItemCategory::Attachments,
            sub_category: ItemSubCategory::Magazine,
            ..ItemDefinition::default()
        };
        assert_eq!(ItemRole::of(&def), ItemRole::Other);

        def.magazine_type = MagazineType::Ak545;
        assert_eq!(ItemRole::of(&def), ItemRole::Magazine(MagazineType::Ak545));
    }

    #[test]
    fn test_role_requires_typed_ammo() {
        let mut def = ItemDefinition {
            category: ItemCategory::Ammo,
            ..ItemDefinition::default()
        };
        assert_eq!(ItemRole::of(&def), ItemRole::Other);

        def.ammo_type = AmmoType::R545x39;
        assert_eq!(ItemRole::of(&def), ItemRole::Ammo(AmmoType::R545x39));
    }
}
