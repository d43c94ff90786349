//src/items/src/ammo.rs
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// 弹药类型（显示名即游戏内口径标注）
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum AmmoType {
    #[default]
    #[strum(serialize = "None")]
    None,
    #[strum(serialize = ".45 ACP")]
    Acp45,
    #[strum(serialize = ".223")]
    Rem223,
    #[strum(serialize = ".45 ACP Hydroshock")]
    Acp45Hydroshock,
    #[strum(serialize = "12x70 Shot")]
    Gauge12x70Shot,
    #[strum(serialize = "12x70 Dart")]
    Gauge12x70Dart,
    #[strum(serialize = "12x76 Slug")]
    Gauge12x76Slug,
    #[strum(serialize = "5.45x39")]
    R545x39,
    #[strum(serialize = "5.45x39 BP")]
    R545x39Bp,
    #[strum(serialize = "5.56x45")]
    R556x45,
    #[strum(serialize = "5.56x45 AP")]
    R556x45Ap,
    #[strum(serialize = "5.7x28")]
    R57x28,
    #[strum(serialize = "5.7x28 AP")]
    R57x28Ap,
    #[strum(serialize = "7.62x54 R 7N14")]
    R762x54R7n14,
    #[strum(serialize = "7.62x54 7N1")]
    R762x54R7n1,
    #[strum(serialize = "7.62x54 BP")]
    R762x54Bp,
    #[strum(serialize = "7.62x54 PP")]
    R762x54Pp,
    #[strum(serialize = "9x18 +P+")]
    R9x18PlusPPlus,
    #[strum(serialize = "9x18 PBP")]
    R9x18Pbp,
    #[strum(serialize = "9x19 FMJ")]
    R9x19Fmj,
    #[strum(serialize = "9x19 JHP")]
    R9x19Jhp,
    #[strum(serialize = "9x39 PAB-9")]
    R9x39Pab9,
    #[strum(serialize = "9x39 SP-5")]
    R9x39Sp5,
    #[strum(serialize = "9x39 SP-6")]
    R9x39Sp6,
}

/// 弹匣规格（武器据此判断能否插入）
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum MagazineType {
    #[default]
    None,
    Ak545,
    Stanag556,
    Fn57,
    Svd762,
    Pm9x18,
    Glock9x19,
    Vss9x39,
    Colt45,
    Shotgun12,
}

/// 武器参数
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub ammo_type: AmmoType,
    /// 为空时按弹药类型回退判断
    pub compatible_magazines: Vec<MagazineType>,
}

/// 弹匣参数
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagazineConfig {
    /// 为空时接受任意弹药
    pub compatible_ammo_types: Vec<AmmoType>,
    pub capacity: u32,
}

impl WeaponConfig {
    /// 武器是否接受该弹匣
    pub fn accepts_magazine(&self, magazine_type: MagazineType, magazine: &MagazineConfig) -> bool {
        if magazine_type == MagazineType::None {
            return false;
        }
        if !self.compatible_magazines.is_empty() {
            return self.compatible_magazines.contains(&magazine_type);
        }
        if self.ammo_type == AmmoType::None {
            return false;
        }
        magazine.compatible_ammo_types.contains(&self.ammo_type)
    }
}

impl MagazineConfig {
    pub fn accepts_ammo(&self, ammo_type: AmmoType) -> bool {
        if ammo_type == AmmoType::None {
            return false;
        }
        self.compatible_ammo_types.is_empty() || self.compatible_ammo_types.contains(&ammo_type)
    }
}
