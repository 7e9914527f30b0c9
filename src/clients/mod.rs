//! 外部能力客户端
//!
//! 识别与合成都是外部协作方，这里只定义能力接口和 HTTP 实现。
//! 接口以 trait 显式注入，不持有模块级可变状态，
//! 测试用进程内桩实现替换真实服务。

pub mod compose_client;
pub mod ocr_client;

use std::future::Future;

use crate::error::{AppError, RecognitionError};
use crate::models::extraction::{ExtractionResult, FrontFields, SideHint};

/// 识别能力
///
/// 错误必须区分 Transient / Auth / Invalid，重试策略据此分支
pub trait RecognitionProvider: Send + Sync {
    fn recognize(
        &self,
        image: &[u8],
        hint: SideHint,
    ) -> impl Future<Output = Result<ExtractionResult, RecognitionError>> + Send;
}

/// 合成能力：两张图片 + 提取字段 → 可打印产物字节
pub trait Compositor: Send + Sync {
    fn compose(
        &self,
        front: &[u8],
        back: &[u8],
        fields: Option<&FrontFields>,
    ) -> impl Future<Output = Result<Vec<u8>, AppError>> + Send;
}

pub use compose_client::ComposeClient;
pub use ocr_client::OcrClient;
