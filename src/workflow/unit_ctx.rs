//! 单元处理上下文
//!
//! 封装"我正在处理第几个单元、它叫什么"这一信息

use std::fmt::Display;

/// 单元处理上下文
#[derive(Debug, Clone)]
pub struct UnitCtx {
    /// 单元名（文件夹名）
    pub unit_name: String,

    /// 单元在批次中的序号（从 1 开始，仅用于日志显示）
    pub unit_index: usize,
}

impl UnitCtx {
    /// 创建新的单元上下文
    pub fn new(unit_name: String, unit_index: usize) -> Self {
        Self {
            unit_name,
            unit_index,
        }
    }
}

impl Display for UnitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[单元 {}#{}]", self.unit_index, self.unit_name)
    }
}
