//! 单图分类服务 - 业务能力层
//!
//! 只负责"判断一张图片是正面还是背面"能力，不关心单元和流程
//!
//! 分类永不整体失败：任何一侧的识别失败只把该侧结论降级为 0 分，
//! 因为一张图片本来就可能是任意一面，单侧识别失败是常态

use std::sync::Arc;

use tracing::debug;

use crate::clients::RecognitionProvider;
use crate::models::extraction::{BackFields, ExtractionResult, SideHint};
use crate::models::verdict::{ImageCandidate, RecommendedSide, ValidationVerdict};
use crate::services::field_validator::{FieldValidator, BACK_PASS_WITHOUT_KEYWORD, FRONT_PASS_SCORE};
use crate::services::recognition_gateway::RecognitionGateway;

/// 单图分类服务
pub struct SideClassifier<P> {
    gateway: Arc<RecognitionGateway<P>>,
    validator: FieldValidator,
}

impl<P: RecognitionProvider> SideClassifier<P> {
    /// 创建新的分类服务
    pub fn new(gateway: Arc<RecognitionGateway<P>>, validator: FieldValidator) -> Self {
        Self { gateway, validator }
    }

    /// 对一张图片做双面假设分类
    ///
    /// 1. 先做整页关键词扫描；命中标志词时背面路径短路到 80+，
    ///    扫描结果不完整时仍补一次背面提取以便展示机关/期限
    /// 2. 独立尝试正面提取，失败即正面 0 分
    /// 3. 独立尝试背面提取（不再重复扫描），合并扫描命中
    /// 4. 按固定优先级给出推荐面，平分时偏向正面
    ///    （正面承载身份关键字段，该偏向决定了相近得分时谁胜出）
    pub async fn classify(&self, image_name: &str, image: &[u8]) -> ImageCandidate {
        // ========== 步骤 1: 关键词扫描 ==========
        let scan = match self.gateway.recognize(image, SideHint::Combined).await {
            Ok(ExtractionResult::Back(fields)) => Some(fields),
            Ok(_) => None,
            Err(e) => {
                debug!("[{}] 关键词扫描失败: {}", image_name, e);
                None
            }
        };
        let scan_hit = scan.as_ref().map(|s| s.has_keyword_hit()).unwrap_or(false);

        // ========== 步骤 2: 正面假设 ==========
        let (front_fields, front_verdict) =
            match self.gateway.recognize(image, SideHint::Front).await {
                Ok(ExtractionResult::Front(fields)) => {
                    let verdict = self.validator.score_front(&fields);
                    (Some(fields), verdict)
                }
                Ok(_) => (
                    None,
                    ValidationVerdict::failed("正面假设返回了意外的结果类型"),
                ),
                Err(e) => (
                    None,
                    ValidationVerdict::failed(format!("正面识别失败: {}", e)),
                ),
            };

        // ========== 步骤 3: 背面假设 ==========
        let (back_fields, back_verdict) = self.classify_back(image_name, image, scan, scan_hit).await;

        // ========== 步骤 4: 推荐面 ==========
        let front_score = front_verdict.score;
        let back_score = back_verdict.score;
        let recommended_side = if front_score > back_score && front_score >= FRONT_PASS_SCORE {
            RecommendedSide::Front
        } else if back_score > front_score && back_score >= BACK_PASS_WITHOUT_KEYWORD {
            RecommendedSide::Back
        } else if front_score == back_score && front_score > 0 {
            RecommendedSide::Front
        } else {
            RecommendedSide::Unknown
        };

        debug!(
            "[{}] 分类完成: 正面 {} 分, 背面 {} 分, 推荐 {:?}",
            image_name, front_score, back_score, recommended_side
        );

        ImageCandidate {
            image_name: image_name.to_string(),
            front_verdict: Some(front_verdict),
            back_verdict: Some(back_verdict),
            front_fields,
            back_fields,
            recommended_side,
        }
    }

    /// 背面假设：扫描结果完整时直接复用，否则补一次背面提取
    async fn classify_back(
        &self,
        image_name: &str,
        image: &[u8],
        scan: Option<BackFields>,
        scan_hit: bool,
    ) -> (Option<BackFields>, ValidationVerdict) {
        // 短路：扫描已命中且机关/期限齐全，无需再调背面提取
        if scan_hit {
            if let Some(fields) = scan.as_ref() {
                if fields.issue_authority.is_some() && fields.valid_period.is_some() {
                    let fields = fields.clone();
                    let verdict = self.validator.score_back(&fields);
                    return (Some(fields), verdict);
                }
            }
        }

        match self.gateway.recognize(image, SideHint::Back).await {
            Ok(ExtractionResult::Back(mut fields)) => {
                // 合并扫描命中与扫描提取到的展示字段
                if let Some(scan_fields) = scan {
                    fields.keyword_hits.extend(scan_fields.keyword_hits);
                    if fields.issue_authority.is_none() {
                        fields.issue_authority = scan_fields.issue_authority;
                    }
                    if fields.valid_period.is_none() {
                        fields.valid_period = scan_fields.valid_period;
                    }
                }
                let verdict = self.validator.score_back(&fields);
                (Some(fields), verdict)
            }
            Ok(_) => (
                None,
                ValidationVerdict::failed("背面假设返回了意外的结果类型"),
            ),
            Err(e) => {
                // 背面提取失败但扫描已命中标志词：用扫描结果打分（短路路径）
                if scan_hit {
                    if let Some(fields) = scan {
                        let verdict = self.validator.score_back(&fields);
                        return (Some(fields), verdict);
                    }
                }
                debug!("[{}] 背面识别失败: {}", image_name, e);
                (
                    None,
                    ValidationVerdict::failed(format!("背面识别失败: {}", e)),
                )
            }
        }
    }
}
