//! # Idcard Batch Merge
//!
//! 批量证件照片分面、配对与合并的核心引擎
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 外部能力层（Clients）
//! - `clients/` - 外部协作方的接口与 HTTP 实现
//! - `RecognitionProvider` - 识别能力（图片 → 结构化字段）
//! - `Compositor` - 合成能力（两图 + 字段 → 可打印产物）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，各管一个能力
//! - `RecognitionGateway` - 带重试/退避/超时的识别调用能力
//! - `FieldValidator` - 识别结果打分能力（纯函数）
//! - `SideClassifier` - 单图正背分类能力
//! - `BatchMatcher` - 单元内正背配对能力
//! - `FailureWriter` - 失败报告写入能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个单元"的完整处理流程
//! - `UnitCtx` - 上下文封装（单元名 + 序号）
//! - `UnitFlow` - 流程编排（数量检查 → 分类 → 配对 → 合成）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/grouping` - 原始上传分组
//! - `orchestrator/batch_processor` - 批量处理器，管理并发、顺序和统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ComposeClient, Compositor, OcrClient, RecognitionProvider};
pub use config::Config;
pub use error::{AppError, AppResult, RecognitionError, RecognitionErrorKind, UnitError};
pub use models::{
    BackFields, BatchReport, BatchSummary, ExtractionResult, FrontFields, ImageCandidate,
    LogicalUnit, RawUpload, RecommendedSide, SideHint, UnitImage, UnitOutcome, UnitSpec,
    ValidationVerdict,
};
pub use orchestrator::{group_units, App};
pub use services::{
    BackRuleTable, BatchMatcher, FailureWriter, FieldValidator, MatchSelection,
    RecognitionGateway, SideClassifier,
};
pub use workflow::{UnitCtx, UnitFlow};
