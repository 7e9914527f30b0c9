//! 校验结论与单图候选

use serde::{Deserialize, Serialize};

use crate::models::extraction::{BackFields, FrontFields};

/// 校验结论
///
/// 由 FieldValidator 对单个识别结果纯函数推导，
/// 相同输入必须产生逐字节相同的结论（含 reasons 顺序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// 是否通过校验
    pub is_valid: bool,
    /// 置信分（0-100）
    pub score: u32,
    /// 逐字段检查记录，固定字段顺序，供运维排查误分类
    pub reasons: Vec<String>,
}

impl ValidationVerdict {
    /// 失败结论（识别调用失败时某一侧降级为 0 分）
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            score: 0,
            reasons: vec![reason.into()],
        }
    }
}

/// 推荐面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedSide {
    Front,
    Back,
    Unknown,
}

/// 单图候选
///
/// 分类阶段一次性构建，之后不再修改（需要变更时整体替换）
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    /// 图片标识（单元内文件名）
    pub image_name: String,
    /// 正面假设的校验结论
    pub front_verdict: Option<ValidationVerdict>,
    /// 背面假设的校验结论
    pub back_verdict: Option<ValidationVerdict>,
    /// 正面假设提取的字段
    pub front_fields: Option<FrontFields>,
    /// 背面假设提取的字段
    pub back_fields: Option<BackFields>,
    /// 推荐面
    pub recommended_side: RecommendedSide,
}

impl ImageCandidate {
    /// 正面得分（无结论时为 0）
    pub fn front_score(&self) -> u32 {
        self.front_verdict.as_ref().map(|v| v.score).unwrap_or(0)
    }

    /// 背面得分（无结论时为 0）
    pub fn back_score(&self) -> u32 {
        self.back_verdict.as_ref().map(|v| v.score).unwrap_or(0)
    }
}
