//! 识别结果数据模型
//!
//! 识别边界（RecognitionGateway / OcrClient）的输出类型。
//! 一旦返回即不可变，后续打分只读不写。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 识别假设：把同一张图片分别当作正面、背面或整页文本来识别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideHint {
    /// 正面假设（人像面，含姓名、公民身份号码等）
    Front,
    /// 背面假设（国徽面，含签发机关、有效期限）
    Back,
    /// 整页通用文本假设（用于关键词扫描）
    Combined,
}

/// 识别结果（标签联合）
///
/// 提供方返回的松散字段在客户端边界映射为该类型，
/// 缺少预期结构时直接以 Invalid 失败，不把空字符串带进打分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionResult {
    /// 正面字段
    Front(FrontFields),
    /// 背面字段
    Back(BackFields),
}

/// 正面识别字段
///
/// 字段允许为空字符串，打分阶段按缺失处理
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontFields {
    /// 姓名
    pub name: String,
    /// 公民身份号码
    pub id_number: String,
    /// 性别（识别原文，如 "男"）
    pub gender: String,
    /// 民族
    pub nation: String,
    /// 出生
    pub birthday: String,
    /// 住址
    pub address: String,
}

/// 背面识别字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackFields {
    /// 签发机关
    pub issue_authority: Option<String>,
    /// 有效期限（如 "20100101-20300101" 或 "20100101-长期"）
    pub valid_period: Option<String>,
    /// 原始识别文本中命中的国家证件标志词（有序集合，保证 reasons 可复现）
    pub keyword_hits: BTreeSet<String>,
}

impl BackFields {
    /// 是否命中任一标志词
    pub fn has_keyword_hit(&self) -> bool {
        !self.keyword_hits.is_empty()
    }
}

/// 性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// 本地化性别标签 → 性别
///
/// 识别服务返回的是证件原文标签，这里做合法性查表
pub static GENDER_LABELS: phf::Map<&'static str, Gender> = phf::phf_map! {
    "男" => Gender::Male,
    "女" => Gender::Female,
    "male" => Gender::Male,
    "female" => Gender::Female,
};

impl Gender {
    /// 从识别原文解析性别标签
    pub fn from_label(label: &str) -> Option<Self> {
        GENDER_LABELS.get(label.trim()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_labels() {
        assert_eq!(Gender::from_label("男"), Some(Gender::Male));
        assert_eq!(Gender::from_label("女"), Some(Gender::Female));
        assert_eq!(Gender::from_label(" 男 "), Some(Gender::Male));
        assert_eq!(Gender::from_label("未知"), None);
        assert_eq!(Gender::from_label(""), None);
    }
}
