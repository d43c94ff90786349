// src/bag/src/world.rs
use items::{DefinitionId, ItemInstance};

/// 世界生成接口：由宿主实现，把丢弃的物品放到地面上
pub trait WorldSpawner {
    /// 成功返回后背包才会移除该物品
    ///
    /// 丢弃武器时 `magazine` 为插在上面的弹匣，弹药状态随之一起进入世界。
    fn spawn_pickup(
        &mut self,
        item: &ItemInstance,
        magazine: Option<&ItemInstance>,
    ) -> anyhow::Result<()>;
}

/// 地面上的一堆物品（定义 + 数量）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldStack {
    pub definition: DefinitionId,
    pub count: u32,
}

impl WorldStack {
    pub fn new(definition: DefinitionId, count: u32) -> Self {
        Self {
            definition,
            count: count.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
