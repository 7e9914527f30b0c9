//! 单元处理流程 - 流程层
//!
//! 核心职责：定义"一个单元"的完整处理流程
//!
//! 流程顺序：
//! 1. 图片数量检查（<2 张直接失败）
//! 2. 并发分类单元内全部图片（必须全部完成后才挑选）
//! 3. 配对挑选正背两面
//! 4. 调用合成服务，落盘产物
//!
//! 任何一步失败都只影响本单元，失败前已有的分类结论写入失败报告

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::clients::{Compositor, RecognitionProvider};
use crate::error::UnitError;
use crate::models::unit::{LogicalUnit, UnitOutcome};
use crate::models::verdict::ImageCandidate;
use crate::services::{BatchMatcher, FailureWriter, SideClassifier};
use crate::workflow::unit_ctx::UnitCtx;

/// 单元处理流程
///
/// - 编排完整的单元处理流程
/// - 不持有批次级资源（Semaphore、统计）
/// - 只依赖业务能力（services）
pub struct UnitFlow<P, C> {
    classifier: SideClassifier<P>,
    compositor: Arc<C>,
    failure_writer: Arc<FailureWriter>,
    output_dir: PathBuf,
}

impl<P: RecognitionProvider, C: Compositor> UnitFlow<P, C> {
    /// 创建新的单元处理流程
    pub fn new(
        classifier: SideClassifier<P>,
        compositor: Arc<C>,
        failure_writer: Arc<FailureWriter>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            classifier,
            compositor,
            failure_writer,
            output_dir: output_dir.into(),
        }
    }

    pub async fn run(&self, unit: &LogicalUnit, ctx: &UnitCtx) -> Result<UnitOutcome, UnitError> {
        // ========== 步骤 1: 图片数量检查 ==========
        if unit.images.len() < 2 {
            let err = UnitError::InsufficientImages {
                unit_name: unit.name.clone(),
                count: unit.images.len(),
            };
            self.report_failure(&unit.name, &err.to_string(), &[]);
            return Err(err);
        }

        info!("{} 开始分类 {} 张图片", ctx, unit.images.len());

        // ========== 步骤 2: 并发分类（先全部完成，再挑选） ==========
        let candidates = join_all(
            unit.images
                .iter()
                .map(|image| self.classifier.classify(&image.name, &image.bytes)),
        )
        .await;

        // ========== 步骤 3: 配对挑选 ==========
        let selection = match BatchMatcher::select(unit, &candidates) {
            Ok(selection) => selection,
            Err(err) => {
                self.report_failure(&unit.name, &err.to_string(), &candidates);
                return Err(err);
            }
        };

        if let Some(note) = &selection.back_note {
            info!("{} {}", ctx, note);
        }

        // ========== 步骤 4: 合成并落盘 ==========
        let front_image = &unit.images[selection.front_index];
        let back_image = &unit.images[selection.back_index];

        info!("{} 📤 正在请求合成...", ctx);

        let artifact = self
            .compositor
            .compose(
                &front_image.bytes,
                &back_image.bytes,
                selection.front_fields.as_ref(),
            )
            .await
            .map_err(|e| {
                let err = UnitError::CompositionFailed {
                    unit_name: unit.name.clone(),
                    message: e.to_string(),
                };
                self.report_failure(&unit.name, &err.to_string(), &candidates);
                err
            })?;

        let artifact_path = self.output_dir.join(format!("{}.pdf", unit.name));
        if let Err(e) = tokio::fs::write(&artifact_path, &artifact).await {
            let err = UnitError::CompositionFailed {
                unit_name: unit.name.clone(),
                message: format!("产物保存失败 ({}): {}", artifact_path.display(), e),
            };
            self.report_failure(&unit.name, &err.to_string(), &candidates);
            return Err(err);
        }

        info!("{} ✓ 合成完成: {}", ctx, artifact_path.display());

        let mut notes = Vec::new();
        if let Some(note) = selection.back_note {
            notes.push(note);
        }

        Ok(UnitOutcome {
            unit_name: unit.name.clone(),
            success: true,
            extracted_name: Some(selection.extracted_name),
            extracted_fields: selection.front_fields,
            front_image: Some(front_image.name.clone()),
            back_image: Some(back_image.name.clone()),
            artifact_ref: Some(artifact_path.to_string_lossy().to_string()),
            error_message: None,
            notes,
        })
    }

    /// 写失败报告；报告写不进去只告警，不改变单元结局
    fn report_failure(&self, unit_name: &str, reason: &str, candidates: &[ImageCandidate]) {
        if let Err(e) = self.failure_writer.write(unit_name, reason, candidates) {
            warn!("[单元 {}] ⚠️ 失败报告写入失败: {}", unit_name, e);
        }
    }
}
