//src/items/src/outfit.rs
use serde::{Deserialize, Serialize};

use crate::definition::{DefinitionId, ItemDefinition};

/// 模块/神器槽上限
pub const MAX_MODULE_SLOTS: u8 = 5;

/// 允许/禁止名单（按定义ID与标签）
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessList {
    pub allowed_ids: Vec<DefinitionId>,
    pub blocked_ids: Vec<DefinitionId>,
    pub allowed_tags: Vec<String>,
    pub blocked_tags: Vec<String>,
}

impl AccessList {
    /// 禁止名单优先；允许名单为空表示不限制
    pub fn permits(&self, candidate: &ItemDefinition) -> bool {
        if self.blocked_ids.contains(&candidate.id) {
            return false;
        }
        if has_any_tag(&candidate.tags, &self.blocked_tags) {
            return false;
        }
        if !self.allowed_ids.is_empty() && !self.allowed_ids.contains(&candidate.id) {
            return false;
        }
        if !self.allowed_tags.is_empty() && !has_any_tag(&candidate.tags, &self.allowed_tags) {
            return false;
        }
        true
    }
}

fn has_any_tag(tags: &[String], query: &[String]) -> bool {
    query.iter().any(|q| tags.contains(q))
}

/// 护甲/服装参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutfitConfig {
    pub max_module_slots: u8,
    pub unlocked_module_slots: u8,
    pub allow_external_helmet: bool,
    pub allow_external_backpack: bool,
    pub helmet_rules: AccessList,
    pub backpack_rules: AccessList,
}

impl Default for OutfitConfig {
    fn default() -> Self {
        Self {
            max_module_slots: 0,
            unlocked_module_slots: 0,
            allow_external_helmet: true,
            allow_external_backpack: true,
            helmet_rules: AccessList::default(),
            backpack_rules: AccessList::default(),
        }
    }
}

impl OutfitConfig {
    pub fn accepts_helmet(&self, helmet: &ItemDefinition) -> bool {
        self.allow_external_helmet && self.helmet_rules.permits(helmet)
    }

    pub fn accepts_backpack(&self, backpack: &ItemDefinition) -> bool {
        self.allow_external_backpack && self.backpack_rules.permits(backpack)
    }

    /// (已解锁, 上限)，均已钳制
    pub fn module_slots(&self) -> (u8, u8) {
        let max = self.max_module_slots.min(MAX_MODULE_SLOTS);
        (self.unlocked_module_slots.min(max), max)
    }
}
