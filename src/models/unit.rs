//! 逻辑单元与批次结果模型

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::extraction::FrontFields;

/// 单元内的一张图片
#[derive(Debug, Clone)]
pub struct UnitImage {
    /// 图片名（单元内唯一）
    pub name: String,
    /// 图片字节
    pub bytes: Vec<u8>,
}

/// 逻辑单元：一个证件持有人的候选图片集合（正面 + 背面）
///
/// 单元在一次批次运行内独占自己的图片和临时目录
#[derive(Debug, Clone)]
pub struct LogicalUnit {
    /// 单元名（通常是文件夹名）
    pub name: String,
    /// 候选图片，保持上传顺序
    pub images: Vec<UnitImage>,
    /// 上传字节的临时落盘目录，结果定稿后由编排层删除
    pub temp_dir: Option<PathBuf>,
}

impl LogicalUnit {
    pub fn new(name: impl Into<String>, images: Vec<UnitImage>) -> Self {
        Self {
            name: name.into(),
            images,
            temp_dir: None,
        }
    }
}

/// 单元终态记录，每个单元恰好写一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutcome {
    /// 单元名
    pub unit_name: String,
    /// 是否成功
    pub success: bool,
    /// 提取的姓名（失败时为 None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_name: Option<String>,
    /// 提取的正面字段
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_fields: Option<FrontFields>,
    /// 被选为正面的图片名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_image: Option<String>,
    /// 被选为背面的图片名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_image: Option<String>,
    /// 合成产物引用（输出文件路径）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_ref: Option<String>,
    /// 失败原因（成功时为 None），面向人类可读，不是堆栈
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 附加说明（如背面兜底选择的降级标记）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl UnitOutcome {
    /// 失败终态
    pub fn failure(unit_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            success: false,
            extracted_name: None,
            extracted_fields: None,
            front_image: None,
            back_image: None,
            artifact_ref: None,
            error_message: Some(error_message.into()),
            notes: Vec::new(),
        }
    }
}

/// 批次汇总，对全部 UnitOutcome 按输入顺序折叠得到
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_unit_names: Vec<String>,
}

impl BatchSummary {
    /// 从按输入顺序排列的结果折叠出汇总
    pub fn from_outcomes(outcomes: &[UnitOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            if outcome.success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
                summary.failed_unit_names.push(outcome.unit_name.clone());
            }
        }
        summary
    }
}

/// 批次响应：完整结果列表 + 汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<UnitOutcome>,
    pub summary: BatchSummary,
}

/// 原始上传项（由传输层提供）
#[derive(Debug, Clone)]
pub struct RawUpload {
    /// 声明路径（如 "alice/front.jpg"）
    pub declared_path: String,
    /// 文件字节
    pub bytes: Vec<u8>,
}

/// 显式单元声明（由传输层提供，可选）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpec {
    /// 单元名
    pub unit_name: String,
    /// 期望的文件名列表（与上传文件名大小写不敏感匹配）
    pub expected_file_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str) -> UnitOutcome {
        UnitOutcome {
            unit_name: name.to_string(),
            success: true,
            extracted_name: Some(name.to_string()),
            extracted_fields: None,
            front_image: None,
            back_image: None,
            artifact_ref: None,
            error_message: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counters_balance() {
        let outcomes = vec![
            ok("a"),
            UnitOutcome::failure("b", "原因"),
            ok("c"),
            UnitOutcome::failure("d", "原因"),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded + summary.failed, summary.total);
        assert_eq!(summary.failed_unit_names, vec!["b", "d"]);
    }

    #[test]
    fn test_summary_preserves_input_order() {
        let outcomes = vec![
            UnitOutcome::failure("z", "x"),
            UnitOutcome::failure("a", "x"),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.failed_unit_names, vec!["z", "a"]);
    }
}
