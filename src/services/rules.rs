//! 背面校验规则表
//!
//! 标志词、签发机关关键字和有效期限格式都是按地区调出来的启发式，
//! 属于产品配置而不是结构性常量，所以做成可注入的规则表：
//! 内置一份默认规则，也可以从 TOML 文件加载覆盖。

use std::collections::BTreeSet;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

/// 内置标志词：出现在背面扫描文本中即强烈指示国徽面
const DEFAULT_MARKER_PHRASES: &[&str] = &["中华人民共和国", "居民身份证"];

/// 内置签发机关关键字
const DEFAULT_AUTHORITY_KEYWORDS: &[&str] = &["公安局", "公安分局", "派出所"];

/// 内置有效期限格式
const DEFAULT_PERIOD_PATTERNS: &[&str] = &[
    r"^\d{4}\.\d{2}\.\d{2}-\d{4}\.\d{2}\.\d{2}$",
    r"^\d{4}\.\d{2}\.\d{2}-长期$",
    r"^\d{8}-\d{8}$",
    r"^\d{8}-长期$",
    r"^长期$",
];

/// 背面校验规则表
#[derive(Debug)]
pub struct BackRuleTable {
    marker_phrases: Vec<String>,
    authority_keywords: Vec<String>,
    period_patterns: Vec<Regex>,
}

/// 规则表文件格式（TOML），缺省的段落回退到内置规则
#[derive(Debug, Default, Deserialize)]
struct RuleTableFile {
    #[serde(default)]
    marker_phrases: Vec<String>,
    #[serde(default)]
    authority_keywords: Vec<String>,
    #[serde(default)]
    period_patterns: Vec<String>,
}

impl BackRuleTable {
    /// 从 TOML 文件加载规则表
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFileReadFailed {
                path: path.to_string(),
                source: Box::new(e),
            })?;

        let file: RuleTableFile =
            toml::from_str(&content).map_err(|e| ConfigError::RulesParseFailed {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Self::from_parts(
            if file.marker_phrases.is_empty() {
                DEFAULT_MARKER_PHRASES.iter().map(|s| s.to_string()).collect()
            } else {
                file.marker_phrases
            },
            if file.authority_keywords.is_empty() {
                DEFAULT_AUTHORITY_KEYWORDS.iter().map(|s| s.to_string()).collect()
            } else {
                file.authority_keywords
            },
            if file.period_patterns.is_empty() {
                DEFAULT_PERIOD_PATTERNS.iter().map(|s| s.to_string()).collect()
            } else {
                file.period_patterns
            },
            path,
        )
    }

    fn from_parts(
        marker_phrases: Vec<String>,
        authority_keywords: Vec<String>,
        period_patterns: Vec<String>,
        path: &str,
    ) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(period_patterns.len());
        for pattern in &period_patterns {
            let re = Regex::new(pattern).map_err(|e| ConfigError::RulesParseFailed {
                path: path.to_string(),
                message: format!("有效期限格式 '{}' 不是合法正则: {}", pattern, e),
            })?;
            compiled.push(re);
        }

        Ok(Self {
            marker_phrases,
            authority_keywords,
            period_patterns: compiled,
        })
    }

    /// 在识别文本中查找命中的标志词
    pub fn find_marker_hits(&self, text: &str) -> BTreeSet<String> {
        self.marker_phrases
            .iter()
            .filter(|phrase| text.contains(phrase.as_str()))
            .cloned()
            .collect()
    }

    /// 签发机关是否包含任一机关关键字
    pub fn matches_authority(&self, authority: &str) -> bool {
        self.authority_keywords
            .iter()
            .any(|kw| authority.contains(kw.as_str()))
    }

    /// 有效期限是否符合任一格式
    pub fn matches_period(&self, period: &str) -> bool {
        let period = period.trim();
        self.period_patterns.iter().any(|re| re.is_match(period))
    }
}

impl Default for BackRuleTable {
    fn default() -> Self {
        // 内置规则在编译期给定，正则必然合法
        Self::from_parts(
            DEFAULT_MARKER_PHRASES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_AUTHORITY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_PERIOD_PATTERNS.iter().map(|s| s.to_string()).collect(),
            "<builtin>",
        )
        .expect("内置规则表必须合法")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_hits() {
        let rules = BackRuleTable::default();
        let hits = rules.find_marker_hits("中华人民共和国居民身份证");
        assert_eq!(hits.len(), 2);
        assert!(hits.contains("中华人民共和国"));
        assert!(hits.contains("居民身份证"));

        assert!(rules.find_marker_hits("随便一段文本").is_empty());
    }

    #[test]
    fn test_authority_keywords() {
        let rules = BackRuleTable::default();
        assert!(rules.matches_authority("北京市公安局海淀分局"));
        assert!(rules.matches_authority("某某派出所"));
        assert!(!rules.matches_authority("某某街道办事处"));
    }

    #[test]
    fn test_period_patterns() {
        let rules = BackRuleTable::default();
        assert!(rules.matches_period("2010.01.01-2030.01.01"));
        assert!(rules.matches_period("2010.01.01-长期"));
        assert!(rules.matches_period("20100101-20300101"));
        assert!(rules.matches_period("20100101-长期"));
        assert!(rules.matches_period("长期"));
        assert!(rules.matches_period(" 长期 "));

        assert!(!rules.matches_period("2010/01/01-2030/01/01"));
        assert!(!rules.matches_period("2010.1.1-2030.1.1"));
        assert!(!rules.matches_period(""));
    }

    #[test]
    fn test_rule_file_partial_sections_fall_back() {
        let file: RuleTableFile = toml::from_str(r#"authority_keywords = ["出入境管理局"]"#).unwrap();
        let rules = BackRuleTable::from_parts(
            if file.marker_phrases.is_empty() {
                DEFAULT_MARKER_PHRASES.iter().map(|s| s.to_string()).collect()
            } else {
                file.marker_phrases
            },
            file.authority_keywords,
            DEFAULT_PERIOD_PATTERNS.iter().map(|s| s.to_string()).collect(),
            "<test>",
        )
        .unwrap();

        assert!(rules.matches_authority("某市出入境管理局"));
        assert!(!rules.matches_authority("北京市公安局"));
        assert!(!rules.find_marker_hits("居民身份证").is_empty());
    }
}
