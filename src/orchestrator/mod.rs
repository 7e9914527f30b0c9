//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `grouping` - 原始上传分组
//! - 按显式声明（大小写不敏感的文件名配对）或按约定（路径首分隔符）分组
//! - 声明落空时产出零图片单元，走"图片数量不足"失败路径
//!
//! ### `batch_processor` - 批量单元处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 控制并发数量（Semaphore + 分批）
//! - 结果按输入顺序写回固定槽位，汇总顺序可复现
//! - 单元失败/超时只记录结局，绝不中止批次
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<LogicalUnit>)
//!     ↓
//! workflow::UnitFlow (处理单个 LogicalUnit)
//!     ↓
//! services (能力层：classify / match / validate / report)
//!     ↓
//! clients (外部能力：识别 / 合成)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：grouping 管分组，batch_processor 管批量调度
//! 2. **向下依赖**：编排层 → workflow → services → clients
//! 3. **无业务逻辑**：只做调度和统计，不做具体打分判断

pub mod batch_processor;
pub mod grouping;

// 重新导出主要类型
pub use batch_processor::App;
pub use grouping::group_units;
