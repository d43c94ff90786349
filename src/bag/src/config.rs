// src/bag/src/config.rs
use error::GameError;
use serde::{Deserialize, Serialize};

use crate::inventory::MAX_GRID_SIDE;

/// 背包配置（网格尺寸与负重上限）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BagConfig {
    pub columns: u32,
    pub rows: u32,
    /// <= 0 表示不限重
    pub max_carry_weight: f32,
}

impl Default for BagConfig {
    fn default() -> Self {
        Self {
            columns: 8,
            rows: 11,
            max_carry_weight: 50.0,
        }
    }
}

impl BagConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: BagConfig = serde_json::from_str(json)?;
        if !config.max_carry_weight.is_finite() {
            return Err(GameError::InvalidConfig("负重上限必须是有限数值".to_string()));
        }
        Ok(config.normalized())
    }

    /// 行列限制在 1..=MAX_GRID_SIDE
    pub fn normalized(mut self) -> Self {
        self.columns = self.columns.clamp(1, MAX_GRID_SIDE);
        self.rows = self.rows.clamp(1, MAX_GRID_SIDE);
        self
    }

    pub fn unlimited(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            max_carry_weight: 0.0,
        }
        .normalized()
    }
}
