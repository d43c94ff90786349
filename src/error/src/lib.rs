//! 物品引擎错误处理模块
//!
//! 处理物品目录与背包配置加载过程中可能出现的错误，包括IO、反序列化以及数据校验错误。
//! 背包运行期的失败（空间不足、不兼容等）属于预期结果，由 `bag` crate 各自的错误类型表达。

use thiserror::Error;

/// 加载目录或配置时可能出现的错误类型
#[derive(Debug, Error)]
pub enum GameError {
    /// IO操作错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// 反序列化错误
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// 物品定义ID重复
    #[error("Duplicate item definition: {0}")]
    DuplicateDefinition(u32),

    /// 物品数据无效
    #[error("Invalid item data: {0}")]
    InvalidItemData(String),

    /// 配置数据无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::DeserializationError(err.to_string())
    }
}

/// 处理错误并转换为用户友好的消息
pub fn handle_error(error: &GameError) -> String {
    match error {
        GameError::DuplicateDefinition(id) => format!("物品定义重复: #{}", id),
        GameError::InvalidItemData(reason) => format!("物品数据无效: {}", reason),
        GameError::InvalidConfig(reason) => format!("背包配置无效: {}", reason),
        GameError::IoError(e) => match e.kind() {
            std::io::ErrorKind::NotFound => "物品目录文件不存在".to_string(),
            std::io::ErrorKind::PermissionDenied => "没有权限访问物品目录文件".to_string(),
            _ => format!("IO错误: {}", e),
        },
        _ => error.to_string(),
    }
}
