//src/items/src/catalog.rs
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use error::GameError;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::definition::{DefinitionId, ItemDefinition};

/// 物品目录：启动时加载一次的全部物品定义
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    definitions: HashMap<DefinitionId, Arc<ItemDefinition>>,
}

#[derive(Deserialize)]
struct CatalogFile {
    items: Vec<ItemDefinition>,
}

impl Catalog {
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ItemDefinition>,
    ) -> Result<Self, GameError> {
        let mut map = HashMap::new();
        for def in definitions {
            validate(&def)?;
            let id = def.id;
            if map.insert(id, Arc::new(def)).is_some() {
                return Err(GameError::DuplicateDefinition(id.0));
            }
        }
        Ok(Self { definitions: map })
    }

    /// 从 JSON 文本加载（`{"items": [...]}`）
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_definitions(file.items)
    }

    /// 从磁盘文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to read item catalog");
            GameError::IoError(err)
        })?;
        let catalog = Self::from_json_str(&json)?;
        debug!(path = %path.display(), count = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, id: DefinitionId) -> Option<Arc<ItemDefinition>> {
        self.definitions.get(&id).cloned()
    }

    pub fn contains(&self, id: DefinitionId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemDefinition>> {
        self.definitions.values()
    }
}

fn validate(def: &ItemDefinition) -> Result<(), GameError> {
    if def.size.x == 0 || def.size.y == 0 {
        return Err(GameError::InvalidItemData(format!(
            "{} ({}) 尺寸为零",
            def.id, def.name
        )));
    }
    if def.stackable && def.max_stack == 0 {
        return Err(GameError::InvalidItemData(format!(
            "{} ({}) 可堆叠但堆叠上限为零",
            def.id, def.name
        )));
    }
    if !def.weight.is_finite() || def.weight < 0.0 {
        return Err(GameError::InvalidItemData(format!(
            "{} ({}) 重量无效",
            def.id, def.name
        )));
    }
    Ok(())
}
