#![allow(dead_code)]

//! 集成测试共用的物品目录与背包构造工具

use std::sync::Arc;

use zone_inventory::{Bag, BagConfig, Catalog, DefinitionId, ItemInstance, WorldSpawner};

pub const MEDKIT: DefinitionId = DefinitionId(1);
pub const BANDAGE: DefinitionId = DefinitionId(2);
pub const TOOLBOX: DefinitionId = DefinitionId(3);
pub const DETECTOR: DefinitionId = DefinitionId(4);
pub const AK74: DefinitionId = DefinitionId(10);
pub const PM: DefinitionId = DefinitionId(11);
pub const KNIFE: DefinitionId = DefinitionId(12);
pub const GRENADE: DefinitionId = DefinitionId(13);
pub const AK_MAG: DefinitionId = DefinitionId(20);
pub const STANAG_MAG: DefinitionId = DefinitionId(21);
pub const AMMO_545: DefinitionId = DefinitionId(30);
pub const AMMO_545_BP: DefinitionId = DefinitionId(31);
pub const AMMO_9MM: DefinitionId = DefinitionId(32);
pub const SUNRISE: DefinitionId = DefinitionId(40);
pub const SEVA: DefinitionId = DefinitionId(41);
pub const EXOSKELETON: DefinitionId = DefinitionId(42);
pub const SPHERE_HELMET: DefinitionId = DefinitionId(50);
pub const TOURIST_PACK: DefinitionId = DefinitionId(60);
pub const MILITARY_PACK: DefinitionId = DefinitionId(61);
pub const JELLYFISH: DefinitionId = DefinitionId(70);
pub const BATTERY: DefinitionId = DefinitionId(71);

/// 代表性物品目录
pub const CATALOG_JSON: &str = r#"{
  "items": [
    { "id": 1, "name": "Medkit", "category": "Items", "sub_category": "Medicine",
      "stackable": true, "max_stack": 5, "weight": 0.5, "tags": ["medical"] },
    { "id": 2, "name": "Bandage", "category": "Items", "sub_category": "Medicine",
      "stackable": true, "max_stack": 30, "weight": 0.1 },
    { "id": 3, "name": "Toolbox", "category": "Items", "sub_category": "Tools",
      "size": { "x": 2, "y": 2 }, "weight": 4.0 },
    { "id": 4, "name": "Detector", "category": "UsableItems", "sub_category": "Detector",
      "size": { "x": 1, "y": 2 }, "weight": 0.8,
      "charge": { "has_charge": true, "max_charge": 100.0 } },

    { "id": 10, "name": "AK-74", "category": "Weapons", "sub_category": "Asr",
      "size": { "x": 5, "y": 2 }, "weight": 3.3,
      "durability": { "has_durability": true, "max_durability": 100.0, "can_repair": true },
      "weapon": { "ammo_type": "R545x39", "compatible_magazines": ["Ak545"] } },
    { "id": 11, "name": "PM", "category": "Weapons", "sub_category": "Handgun",
      "size": { "x": 2, "y": 1 }, "weight": 0.7,
      "weapon": { "ammo_type": "R9x18PlusPPlus" } },
    { "id": 12, "name": "Knife", "category": "Weapons", "sub_category": "Knife",
      "size": { "x": 1, "y": 2 }, "weight": 0.3 },
    { "id": 13, "name": "RGD-5", "category": "Weapons", "sub_category": "Grenade",
      "stackable": true, "max_stack": 5, "weight": 0.3 },

    { "id": 20, "name": "AK 5.45 magazine", "category": "Attachments", "sub_category": "Magazine",
      "magazine_type": "Ak545", "weight": 0.3,
      "magazine": { "compatible_ammo_types": ["R545x39", "R545x39Bp"], "capacity": 30 } },
    { "id": 21, "name": "STANAG magazine", "category": "Attachments", "sub_category": "Magazine",
      "magazine_type": "Stanag556", "weight": 0.2,
      "magazine": { "compatible_ammo_types": ["R556x45", "R556x45Ap"], "capacity": 30 } },

    { "id": 30, "name": "5.45x39", "category": "Ammo", "ammo_type": "R545x39",
      "stackable": true, "max_stack": 60, "weight": 0.01 },
    { "id": 31, "name": "5.45x39 BP", "category": "Ammo", "ammo_type": "R545x39Bp",
      "stackable": true, "max_stack": 60, "weight": 0.012 },
    { "id": 32, "name": "9x19 FMJ", "category": "Ammo", "ammo_type": "R9x19Fmj",
      "stackable": true, "max_stack": 50, "weight": 0.01 },

    { "id": 40, "name": "Sunrise suit", "category": "Armor",
      "size": { "x": 2, "y": 3 }, "weight": 6.0,
      "outfit": { "max_module_slots": 4, "unlocked_module_slots": 2,
                  "backpack_rules": { "blocked_tags": ["heavy"] } } },
    { "id": 41, "name": "SEVA suit", "category": "Armor",
      "size": { "x": 2, "y": 3 }, "weight": 8.0,
      "outfit": { "max_module_slots": 5, "unlocked_module_slots": 3,
                  "allow_external_helmet": false } },
    { "id": 42, "name": "Exoskeleton", "category": "Armor",
      "size": { "x": 2, "y": 3 }, "weight": 15.0,
      "outfit": { "max_module_slots": 5, "unlocked_module_slots": 5,
                  "allow_external_backpack": false } },

    { "id": 50, "name": "Sphere helmet", "category": "Helmet",
      "size": { "x": 2, "y": 2 }, "weight": 1.5 },
    { "id": 60, "name": "Tourist backpack", "category": "Backpack",
      "size": { "x": 3, "y": 3 }, "weight": 1.2, "tags": ["light"] },
    { "id": 61, "name": "Military backpack", "category": "Backpack",
      "size": { "x": 3, "y": 3 }, "weight": 2.0, "tags": ["heavy"] },

    { "id": 70, "name": "Jellyfish", "category": "Items", "sub_category": "Artefact",
      "weight": 0.5 },
    { "id": 71, "name": "Battery module", "category": "Items", "sub_category": "Module",
      "weight": 0.4 }
  ]
}"#;

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json_str(CATALOG_JSON).expect("fixture catalog must parse"))
}

/// 默认尺寸与负重的背包
pub fn default_bag() -> Bag {
    Bag::new(catalog(), BagConfig::default())
}

pub fn bag(columns: u32, rows: u32, max_carry_weight: f32) -> Bag {
    Bag::new(
        catalog(),
        BagConfig {
            columns,
            rows,
            max_carry_weight,
        },
    )
}

/// 安装测试日志（`RUST_LOG=debug cargo test` 可查看）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 记录丢到世界中的物品
#[derive(Default)]
pub struct RecordingSpawner {
    pub spawned: Vec<Spawned>,
    pub refuse: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spawned {
    pub definition: DefinitionId,
    pub count: u32,
    pub magazine_rounds: Option<u32>,
}

impl WorldSpawner for RecordingSpawner {
    fn spawn_pickup(
        &mut self,
        item: &ItemInstance,
        magazine: Option<&ItemInstance>,
    ) -> anyhow::Result<()> {
        if self.refuse {
            anyhow::bail!("no valid drop location for {}", item.name());
        }
        self.spawned.push(Spawned {
            definition: item.definition_id(),
            count: item.stack_count(),
            magazine_rounds: magazine.map(|m| m.magazine_state().ammo_count),
        });
        Ok(())
    }
}
