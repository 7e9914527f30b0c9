//! 字段校验服务 - 业务能力层
//!
//! 只负责"给识别结果打分"能力，纯函数，无 I/O
//!
//! 打分规则见各方法注释；reasons 逐字段输出且字段顺序固定，
//! 相同输入必须产生逐字节相同的结论，供运维排查误分类

use std::sync::Arc;

use regex::Regex;

use crate::models::extraction::{BackFields, FrontFields, Gender};
use crate::models::verdict::ValidationVerdict;
use crate::services::rules::BackRuleTable;

/// 正面通过线
pub const FRONT_PASS_SCORE: u32 = 60;
/// 背面通过线（命中标志词时）
pub const BACK_PASS_WITH_KEYWORD: u32 = 80;
/// 背面通过线（未命中标志词时，需更依赖补充项）
pub const BACK_PASS_WITHOUT_KEYWORD: u32 = 70;

/// 字段校验服务
///
/// 职责：
/// - 对单个识别结果推导校验结论
/// - 不出现 Vec<ImageCandidate>
/// - 不关心图片来自哪个单元
pub struct FieldValidator {
    rules: Arc<BackRuleTable>,
    id_number_regex: Regex,
}

impl FieldValidator {
    /// 创建新的校验服务
    pub fn new(rules: Arc<BackRuleTable>) -> Self {
        Self {
            rules,
            // 17 位数字 + 校验位（数字或 X/x）
            id_number_regex: Regex::new(r"^\d{17}[0-9Xx]$").expect("号码正则必须合法"),
        }
    }

    /// 正面打分（满分 100，≥60 通过）
    ///
    /// | 字段 | 条件 | 分值 |
    /// |---|---|---|
    /// | 姓名 | 非空且长度 ≥2 | 30 |
    /// | 公民身份号码 | 去空白后匹配 17 位数字 + 校验位 | 30 |
    /// | 性别 | 合法标签（男/女） | 15 |
    /// | 民族 | 非空 | 10 |
    /// | 出生 | 非空 | 10 |
    /// | 住址 | 非空 | 5 |
    pub fn score_front(&self, fields: &FrontFields) -> ValidationVerdict {
        let mut score = 0u32;
        let mut reasons = Vec::with_capacity(6);

        let name = fields.name.trim();
        if name.chars().count() >= 2 {
            score += 30;
            reasons.push("姓名 ✓ +30".to_string());
        } else {
            reasons.push("姓名 ✗ +0 (缺失或过短)".to_string());
        }

        let id_number: String = fields
            .id_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if self.id_number_regex.is_match(&id_number) {
            score += 30;
            reasons.push("公民身份号码 ✓ +30".to_string());
        } else {
            reasons.push("公民身份号码 ✗ +0 (格式不符)".to_string());
        }

        if Gender::from_label(&fields.gender).is_some() {
            score += 15;
            reasons.push("性别 ✓ +15".to_string());
        } else {
            reasons.push("性别 ✗ +0 (标签不合法)".to_string());
        }

        if !fields.nation.trim().is_empty() {
            score += 10;
            reasons.push("民族 ✓ +10".to_string());
        } else {
            reasons.push("民族 ✗ +0 (缺失)".to_string());
        }

        if !fields.birthday.trim().is_empty() {
            score += 10;
            reasons.push("出生 ✓ +10".to_string());
        } else {
            reasons.push("出生 ✗ +0 (缺失)".to_string());
        }

        if !fields.address.trim().is_empty() {
            score += 5;
            reasons.push("住址 ✓ +5".to_string());
        } else {
            reasons.push("住址 ✗ +0 (缺失)".to_string());
        }

        ValidationVerdict {
            is_valid: score >= FRONT_PASS_SCORE,
            score,
            reasons,
        }
    }

    /// 背面打分（两级规则，上限 100）
    ///
    /// 1. 标志词级：识别文本命中任一标志词直接 +80，单独即可满足通过线
    /// 2. 补充级（总是参与）：签发机关命中机关关键字 +30、仅存在 +10；
    ///    有效期限符合格式 +20、仅存在 +10
    ///
    /// 通过线：命中标志词 ≥80，否则 ≥70
    pub fn score_back(&self, fields: &BackFields) -> ValidationVerdict {
        let mut score = 0u32;
        let mut reasons = Vec::with_capacity(3);

        let keyword_hit = fields.has_keyword_hit();
        if keyword_hit {
            score += 80;
            let hits: Vec<&str> = fields.keyword_hits.iter().map(|s| s.as_str()).collect();
            reasons.push(format!("标志词 ✓ +80 (命中: {})", hits.join("、")));
        } else {
            reasons.push("标志词 ✗ +0 (未命中)".to_string());
        }

        match fields.issue_authority.as_deref().map(str::trim) {
            Some(authority) if !authority.is_empty() => {
                if self.rules.matches_authority(authority) {
                    score += 30;
                    reasons.push("签发机关 ✓ +30".to_string());
                } else {
                    score += 10;
                    reasons.push("签发机关 ~ +10 (未命中机关关键字)".to_string());
                }
            }
            _ => reasons.push("签发机关 ✗ +0 (缺失)".to_string()),
        }

        match fields.valid_period.as_deref().map(str::trim) {
            Some(period) if !period.is_empty() => {
                if self.rules.matches_period(period) {
                    score += 20;
                    reasons.push("有效期限 ✓ +20".to_string());
                } else {
                    score += 10;
                    reasons.push("有效期限 ~ +10 (格式不符)".to_string());
                }
            }
            _ => reasons.push("有效期限 ✗ +0 (缺失)".to_string()),
        }

        let score = score.min(100);
        let threshold = if keyword_hit {
            BACK_PASS_WITH_KEYWORD
        } else {
            BACK_PASS_WITHOUT_KEYWORD
        };

        ValidationVerdict {
            is_valid: score >= threshold,
            score,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn validator() -> FieldValidator {
        FieldValidator::new(Arc::new(BackRuleTable::default()))
    }

    fn full_front() -> FrontFields {
        FrontFields {
            name: "李雷".to_string(),
            id_number: "11010119900101001X".to_string(),
            gender: "男".to_string(),
            nation: "汉".to_string(),
            birthday: "1990年1月1日".to_string(),
            address: "北京市海淀区".to_string(),
        }
    }

    #[test]
    fn test_full_front_scores_100() {
        let verdict = validator().score_front(&full_front());
        assert_eq!(verdict.score, 100);
        assert!(verdict.is_valid);
        assert_eq!(verdict.reasons.len(), 6);
    }

    /// 姓名 + 号码 + 性别三项核心字段已经越过 60 的通过线
    #[test]
    fn test_core_fields_alone_pass() {
        let fields = FrontFields {
            name: "韩梅梅".to_string(),
            id_number: "110101199001010010".to_string(),
            gender: "女".to_string(),
            nation: String::new(),
            birthday: String::new(),
            address: String::new(),
        };
        let verdict = validator().score_front(&fields);
        assert_eq!(verdict.score, 75);
        assert!(verdict.is_valid);
    }

    /// 核心三项加上民族、出生即 ≥85
    #[test]
    fn test_core_with_nation_birthday_at_least_85() {
        let fields = FrontFields {
            name: "韩梅梅".to_string(),
            id_number: "110101199001010010".to_string(),
            gender: "女".to_string(),
            nation: "汉".to_string(),
            birthday: "1990年1月1日".to_string(),
            address: String::new(),
        };
        let verdict = validator().score_front(&fields);
        assert!(verdict.score >= 85);
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_id_number_whitespace_stripped() {
        let mut fields = full_front();
        fields.id_number = "110101 19900101 001X".to_string();
        let verdict = validator().score_front(&fields);
        assert_eq!(verdict.score, 100);
    }

    #[test]
    fn test_bad_id_number_loses_30() {
        let mut fields = full_front();
        fields.id_number = "12345".to_string();
        let verdict = validator().score_front(&fields);
        assert_eq!(verdict.score, 70);
        assert!(verdict.reasons.iter().any(|r| r.contains("格式不符")));
    }

    #[test]
    fn test_single_char_name_fails_name_check() {
        let mut fields = full_front();
        fields.name = "王".to_string();
        let verdict = validator().score_front(&fields);
        assert_eq!(verdict.score, 70);
    }

    #[test]
    fn test_empty_front_invalid() {
        let verdict = validator().score_front(&FrontFields::default());
        assert_eq!(verdict.score, 0);
        assert!(!verdict.is_valid);
    }

    #[test]
    fn test_keyword_hit_alone_passes_back() {
        let fields = BackFields {
            issue_authority: None,
            valid_period: None,
            keyword_hits: BTreeSet::from(["居民身份证".to_string()]),
        };
        let verdict = validator().score_back(&fields);
        assert_eq!(verdict.score, 80);
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_keyword_plus_supplementary_clamped_to_100() {
        let fields = BackFields {
            issue_authority: Some("北京市公安局海淀分局".to_string()),
            valid_period: Some("20100101-20300101".to_string()),
            keyword_hits: BTreeSet::from([
                "中华人民共和国".to_string(),
                "居民身份证".to_string(),
            ]),
        };
        let verdict = validator().score_back(&fields);
        assert_eq!(verdict.score, 100);
        assert!(verdict.is_valid);
    }

    /// 无标志词时补充级最多 50 分，到不了 70 的通过线
    #[test]
    fn test_supplementary_alone_cannot_pass() {
        let fields = BackFields {
            issue_authority: Some("北京市公安局".to_string()),
            valid_period: Some("2010.01.01-长期".to_string()),
            keyword_hits: BTreeSet::new(),
        };
        let verdict = validator().score_back(&fields);
        assert_eq!(verdict.score, 50);
        assert!(!verdict.is_valid);
    }

    #[test]
    fn test_partial_tiers_tagged() {
        let fields = BackFields {
            issue_authority: Some("某某街道办事处".to_string()),
            valid_period: Some("2010年-2030年".to_string()),
            keyword_hits: BTreeSet::new(),
        };
        let verdict = validator().score_back(&fields);
        assert_eq!(verdict.score, 20);
        assert!(!verdict.is_valid);
        assert!(verdict.reasons.iter().any(|r| r.contains('~')));
    }

    /// 纯函数：同一输入两次打分结论逐字节一致
    #[test]
    fn test_verdict_idempotent() {
        let v = validator();
        let front = full_front();
        assert_eq!(v.score_front(&front), v.score_front(&front));

        let back = BackFields {
            issue_authority: Some("上海市公安局".to_string()),
            valid_period: Some("长期".to_string()),
            keyword_hits: BTreeSet::from(["居民身份证".to_string()]),
        };
        assert_eq!(v.score_back(&back), v.score_back(&back));
    }

    /// reasons 金样：字段顺序与文案固定
    #[test]
    fn test_front_reasons_golden() {
        let verdict = validator().score_front(&full_front());
        assert_eq!(
            verdict.reasons,
            vec![
                "姓名 ✓ +30",
                "公民身份号码 ✓ +30",
                "性别 ✓ +15",
                "民族 ✓ +10",
                "出生 ✓ +10",
                "住址 ✓ +5",
            ]
        );
    }

    #[test]
    fn test_back_reasons_golden() {
        let fields = BackFields {
            issue_authority: Some("北京市公安局海淀分局".to_string()),
            valid_period: Some("20100101-长期".to_string()),
            keyword_hits: BTreeSet::from([
                "中华人民共和国".to_string(),
                "居民身份证".to_string(),
            ]),
        };
        let verdict = validator().score_back(&fields);
        assert_eq!(
            verdict.reasons,
            vec![
                "标志词 ✓ +80 (命中: 中华人民共和国、居民身份证)",
                "签发机关 ✓ +30",
                "有效期限 ✓ +20",
            ]
        );
    }
}
