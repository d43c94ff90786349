// src/bag/src/inventory.rs
use std::collections::HashMap;

use items::{ItemId, ItemInstance, ItemSize, ItemStore};
use thiserror::Error;

/// 网格背包错误类型
#[derive(Debug, Error, PartialEq)]
pub enum InventoryError {
    #[error("背包空间不足")]
    NoRoom,
    #[error("超出负重上限")]
    TooHeavy,
    #[error("位置越界: {0}")]
    OutOfBounds(usize),
    #[error("物品不在背包中: {0}")]
    NotInInventory(ItemId),
    #[error("该物品无法旋转")]
    CannotRotate,
    #[error("背包空间不足，已合并部分数量，剩余 {remaining} 个未放入")]
    PartiallyAdded { remaining: u32 },
}

/// 网格单边的最大格数
pub const MAX_GRID_SIDE: u32 = 1024;

/// 网格坐标（x 为列，y 为行）
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

/// 一次插入的执行计划：先合并到已有堆叠，剩余部分放到新位置
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InsertPlan {
    /// (目标堆叠, 合并数量)，按格子扫描顺序
    pub merges: Vec<(ItemId, u32)>,
    /// 合并后剩余数量
    pub remainder: u32,
    /// 剩余部分的左上角位置
    pub placement: Option<usize>,
}

impl InsertPlan {
    pub fn merged(&self) -> u32 {
        self.merges.iter().map(|(_, n)| n).sum()
    }
}

/// 网格背包：固定行列的格子，每格保存占用它的物品ID
#[derive(Clone, Debug, PartialEq)]
pub struct GridInventory {
    columns: u32,
    rows: u32,
    cells: Vec<Option<ItemId>>,
}

impl GridInventory {
    pub fn new(columns: u32, rows: u32) -> Self {
        let columns = columns.clamp(1, MAX_GRID_SIDE);
        let rows = rows.clamp(1, MAX_GRID_SIDE);
        Self {
            columns,
            rows,
            cells: vec![None; columns as usize * rows as usize],
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn index_to_tile(&self, index: usize) -> Option<Tile> {
        if index >= self.capacity() {
            return None;
        }
        let index = index as u32;
        Some(Tile {
            x: index % self.columns,
            y: index / self.columns,
        })
    }

    pub fn tile_to_index(&self, tile: Tile) -> Option<usize> {
        if tile.x >= self.columns || tile.y >= self.rows {
            return None;
        }
        Some((tile.x + tile.y * self.columns) as usize)
    }

    /// 指定格子上的物品
    pub fn item_at(&self, index: usize) -> Option<ItemId> {
        self.cells.get(index).copied().flatten()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.cells.iter().any(|c| *c == Some(id))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// 所有物品（按格子顺序去重）
    pub fn unique_items(&self) -> Vec<ItemId> {
        let mut out: Vec<ItemId> = Vec::new();
        for id in self.cells.iter().flatten() {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    /// 物品左上角（行优先扫描遇到的第一个格子）
    pub fn top_left_of(&self, id: ItemId) -> Option<usize> {
        self.cells.iter().position(|c| *c == Some(id))
    }

    /// 物品占用的全部格子
    pub fn cells_of(&self, id: ItemId) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Some(id))
            .map(|(i, _)| i)
            .collect()
    }

    /// 以 top_left 为左上角、尺寸为 size 的矩形覆盖的格子；越界返回 None
    pub fn footprint(&self, size: ItemSize, top_left: usize) -> Option<Vec<usize>> {
        let origin = self.index_to_tile(top_left)?;
        let right = origin.x.checked_add(size.x)?;
        let bottom = origin.y.checked_add(size.y)?;
        if right > self.columns || bottom > self.rows {
            return None;
        }
        let mut out = Vec::with_capacity((size.x * size.y) as usize);
        for y in origin.y..bottom {
            for x in origin.x..right {
                out.push((x + y * self.columns) as usize);
            }
        }
        Some(out)
    }

    pub(crate) fn fits(&self, size: ItemSize, top_left: usize, ignore: Option<ItemId>) -> bool {
        match self.footprint(size, top_left) {
            Some(cells) => cells.into_iter().all(|i| match self.cells[i] {
                None => true,
                Some(occupant) => Some(occupant) == ignore,
            }),
            None => false,
        }
    }

    /// 所有覆盖的格子都在界内且为空
    pub fn room_available(&self, item: &ItemInstance, top_left: usize) -> bool {
        self.fits(item.size(), top_left, None)
    }

    /// 同上，但忽略该物品自身已占用的格子（原地移动）
    pub fn room_available_for_move(&self, id: ItemId, item: &ItemInstance, top_left: usize) -> bool {
        self.fits(item.size(), top_left, Some(id))
    }

    /// 行优先扫描第一个可放置的位置
    pub fn first_fit(&self, size: ItemSize) -> Option<usize> {
        (0..self.capacity()).find(|&i| self.fits(size, i, None))
    }

    /// 把物品写入覆盖的格子（调用方需先确认空间）
    pub(crate) fn write_cells(&mut self, id: ItemId, size: ItemSize, top_left: usize) -> bool {
        match self.footprint(size, top_left) {
            Some(cells) => {
                for i in cells {
                    self.cells[i] = Some(id);
                }
                true
            }
            None => false,
        }
    }

    /// 在指定位置放置物品；已在网格中的物品会被移动
    pub fn place_at(
        &mut self,
        id: ItemId,
        item: &ItemInstance,
        top_left: usize,
    ) -> Result<(), InventoryError> {
        if top_left >= self.capacity() {
            return Err(InventoryError::OutOfBounds(top_left));
        }
        if !self.room_available_for_move(id, item, top_left) {
            return Err(InventoryError::NoRoom);
        }
        self.remove(id);
        self.write_cells(id, item.size(), top_left);
        Ok(())
    }

    /// 清除物品占用的所有格子；物品不存在时无副作用
    pub fn remove(&mut self, id: ItemId) -> bool {
        let mut removed = false;
        for cell in self.cells.iter_mut().filter(|c| **c == Some(id)) {
            *cell = None;
            removed = true;
        }
        removed
    }

    /// 计算插入方案；无法完整放下时返回 None
    ///
    /// `pending` 记录同一批次中已计划合并到各堆叠的数量。
    pub fn plan_insert(
        &self,
        store: &ItemStore,
        id: ItemId,
        item: &ItemInstance,
        pending: &HashMap<ItemId, u32>,
    ) -> Option<InsertPlan> {
        let mut plan = self.plan_merges(store, id, item, pending);
        if plan.remainder > 0 {
            plan.placement = Some(self.first_fit(item.size())?);
        }
        Some(plan)
    }

    /// 只计算合并到已有堆叠的部分，不寻找新位置
    pub fn plan_merges(
        &self,
        store: &ItemStore,
        id: ItemId,
        item: &ItemInstance,
        pending: &HashMap<ItemId, u32>,
    ) -> InsertPlan {
        let mut plan = InsertPlan {
            remainder: item.stack_count(),
            ..InsertPlan::default()
        };
        if !item.is_stackable() || item.definition().stack_limit() <= 1 {
            return plan;
        }
        for existing_id in self.unique_items() {
            if existing_id == id {
                continue;
            }
            let Some(existing) = store.get(existing_id) else {
                continue;
            };
            if !existing.can_stack_with(item) {
                continue;
            }
            let already = pending.get(&existing_id).copied().unwrap_or(0);
            let space = existing.stack_space().saturating_sub(already);
            let add = space.min(plan.remainder);
            if add > 0 {
                plan.merges.push((existing_id, add));
                plan.remainder -= add;
            }
            if plan.remainder == 0 {
                break;
            }
        }
        plan
    }

    /// 模拟依次插入多个物品，判断能否全部放下
    pub fn can_fit_all(&self, store: &ItemStore, incoming: &[ItemId]) -> bool {
        let mut grid = self.clone();
        let mut pending: HashMap<ItemId, u32> = HashMap::new();
        for &id in incoming {
            let Some(item) = store.get(id) else {
                return false;
            };
            let Some(plan) = grid.plan_insert(store, id, item, &pending) else {
                return false;
            };
            for (target, n) in &plan.merges {
                *pending.entry(*target).or_insert(0) += n;
            }
            if let Some(top_left) = plan.placement {
                grid.write_cells(id, item.size(), top_left);
            }
        }
        true
    }

    /// 检查格子不变式：每个物品恰好占据一个完整矩形
    pub fn check_layout(&self, store: &ItemStore) -> bool {
        self.unique_items().into_iter().all(|id| {
            let Some(item) = store.get(id) else {
                return false;
            };
            let Some(top_left) = self.top_left_of(id) else {
                return false;
            };
            match self.footprint(item.size(), top_left) {
                Some(expected) => expected == self.cells_of(id),
                None => false,
            }
        })
    }
}
