//! 事件总线系统，把背包事件分发给表现层
//!
//! 背包在一次更新内累积事件，宿主每帧调用一次 `EventBus::pump`：
//! - 取出背包的全部事件并按顺序发布
//! - 按优先级调用订阅者
//! - 中间件可以在处理前后拦截事件
//! - 保留有限长度的历史记录用于调试
//!
//! 处理器只能读取事件，不能修改背包。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bag::{Bag, BagEvent};
use tracing::debug;

/// 事件处理器优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// 最高优先级 - 用于关键系统事件
    Critical = 0,
    /// 高优先级 - 用于游戏核心逻辑
    High = 1,
    /// 普通优先级 - 默认优先级
    Normal = 2,
    /// 低优先级 - 用于 UI 更新等
    Low = 3,
    /// 最低优先级 - 用于日志等
    Lowest = 4,
}

/// 事件中间件 trait - 用于在事件处理前/后插入逻辑
pub trait EventMiddleware: Send + Sync {
    /// 返回 false 表示阻止处理
    fn before_handle(&mut self, _event: &BagEvent) -> bool {
        true
    }

    fn after_handle(&mut self, _event: &BagEvent) {}

    /// 中间件名称（用于调试）
    fn name(&self) -> &str;

    fn priority(&self) -> Priority {
        Priority::Normal
    }
}

/// 事件处理器 trait
pub trait EventHandler: Send + Sync {
    /// 处理事件
    fn handle(&mut self, event: &BagEvent);

    /// 事件处理器的名称（用于调试）
    fn name(&self) -> &str;

    /// 优先级（数字越小优先级越高）
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    /// 是否应该处理此事件（事件过滤）
    fn should_handle(&self, _event: &BagEvent) -> bool {
        true
    }
}

/// 事件处理器包装器，包含优先级信息
struct HandlerEntry {
    handler: Box<dyn EventHandler>,
    priority: Priority,
}

struct MiddlewareEntry {
    middleware: Box<dyn EventMiddleware>,
    priority: Priority,
}

/// 背包事件总线
///
/// 同时支持队列模式（`drain`）与订阅者模式（`subscribe`）。
pub struct EventBus {
    /// 当前帧已发布、尚未被取走的事件
    events: Vec<BagEvent>,
    /// 注册的事件处理器（按事件类型分组）
    handlers: HashMap<&'static str, Vec<HandlerEntry>>,
    /// 全局事件处理器（处理所有事件）
    global_handlers: Vec<HandlerEntry>,
    middlewares: Vec<MiddlewareEntry>,
    /// 事件历史（用于调试和回放）
    history: Vec<BagEvent>,
    max_history: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_history_size(100)
    }

    /// 创建一个指定历史记录大小的事件总线
    pub fn with_history_size(max_history: usize) -> Self {
        Self {
            events: Vec::new(),
            handlers: HashMap::new(),
            global_handlers: Vec::new(),
            middlewares: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    /// 开始新的一帧：丢弃上一帧未被取走的事件，
    /// 再取出背包本帧累积的事件并逐个发布，返回发布数量
    pub fn pump(&mut self, bag: &mut Bag) -> usize {
        self.events.clear();
        let events = bag.flush_events();
        let count = events.len();
        for event in events {
            self.publish(event);
        }
        if count > 0 {
            debug!(count, "bag events dispatched");
        }
        count
    }

    /// 发布事件：记录历史、立即触发订阅者、加入当前帧队列
    pub fn publish(&mut self, event: BagEvent) {
        self.add_to_history(event.clone());
        self.dispatch_to_handlers(&event);
        self.events.push(event);
    }

    /// 获取所有待处理事件并清空队列
    pub fn drain(&mut self) -> impl Iterator<Item = BagEvent> + '_ {
        self.events.drain(..)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// 注册事件中间件
    pub fn register_middleware(&mut self, middleware: Box<dyn EventMiddleware>) {
        let priority = middleware.priority();
        self.middlewares.push(MiddlewareEntry {
            middleware,
            priority,
        });
        self.middlewares.sort_by(|a, b| a.priority.cmp(&b.priority));
    }

    /// 注册事件处理器（处理特定类型的事件）
    pub fn subscribe(&mut self, event_type: &'static str, handler: Box<dyn EventHandler>) {
        let priority = handler.priority();
        let handlers = self.handlers.entry(event_type).or_default();
        handlers.push(HandlerEntry { handler, priority });
        // 稳定排序，同优先级按注册顺序
        handlers.sort_by(|a, b| a.priority.cmp(&b.priority));
    }

    /// 注册全局事件处理器（处理所有事件）
    pub fn subscribe_all(&mut self, handler: Box<dyn EventHandler>) {
        let priority = handler.priority();
        self.global_handlers.push(HandlerEntry { handler, priority });
        self.global_handlers
            .sort_by(|a, b| a.priority.cmp(&b.priority));
    }

    fn dispatch_to_handlers(&mut self, event: &BagEvent) {
        if !self.run_middleware_before(event) {
            return;
        }

        for entry in &mut self.global_handlers {
            if entry.handler.should_handle(event) {
                entry.handler.handle(event);
            }
        }

        if let Some(handlers) = self.handlers.get_mut(event.event_type()) {
            for entry in handlers {
                if entry.handler.should_handle(event) {
                    entry.handler.handle(event);
                }
            }
        }

        self.run_middleware_after(event);
    }

    fn run_middleware_before(&mut self, event: &BagEvent) -> bool {
        for entry in &mut self.middlewares {
            if !entry.middleware.before_handle(event) {
                debug!(
                    middleware = entry.middleware.name(),
                    event = event.event_type(),
                    "event blocked"
                );
                return false;
            }
        }
        true
    }

    fn run_middleware_after(&mut self, event: &BagEvent) {
        for entry in &mut self.middlewares {
            entry.middleware.after_handle(event);
        }
    }

    fn add_to_history(&mut self, event: BagEvent) {
        if self.max_history == 0 {
            return;
        }
        if self.history.len() >= self.max_history {
            self.history.remove(0);
        }
        self.history.push(event);
    }

    /// 获取事件历史（最近的 n 个事件）
    pub fn get_history(&self, count: usize) -> &[BagEvent] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn full_history(&self) -> &[BagEvent] {
        &self.history
    }

    /// 获取订阅者数量（用于调试）
    pub fn subscriber_count(&self) -> usize {
        self.global_handlers.len() + self.handlers.values().map(Vec::len).sum::<usize>()
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// 事件日志中间件 - 在事件处理前后记录日志
pub struct LoggingMiddleware {
    messages: Arc<Mutex<Vec<String>>>,
}

impl LoggingMiddleware {
    pub fn new(messages: Arc<Mutex<Vec<String>>>) -> Self {
        Self { messages }
    }
}

impl EventMiddleware for LoggingMiddleware {
    fn before_handle(&mut self, event: &BagEvent) -> bool {
        if let Ok(mut logs) = self.messages.lock() {
            logs.push(format!("即将处理事件: {}", event.event_type()));
        }
        true
    }

    fn after_handle(&mut self, event: &BagEvent) {
        if let Ok(mut logs) = self.messages.lock() {
            logs.push(format!("已处理事件: {}", event.event_type()));
        }
    }

    fn name(&self) -> &str {
        "LoggingMiddleware"
    }

    fn priority(&self) -> Priority {
        Priority::Lowest
    }
}

/// 只放行提示类事件的过滤中间件（用于音效等只关心提示的表现层）
pub struct CueOnlyFilter;

impl EventMiddleware for CueOnlyFilter {
    fn before_handle(&mut self, event: &BagEvent) -> bool {
        event.is_cue()
    }

    fn name(&self) -> &str {
        "CueOnlyFilter"
    }

    fn priority(&self) -> Priority {
        Priority::Critical
    }
}
