//! 识别服务 HTTP 客户端
//!
//! 封装所有与识别服务相关的调用逻辑：
//! - 图片 base64 上送，按假设选择证件/通用文本端点
//! - 把松散的 JSON 响应映射为显式的 ExtractionResult，
//!   预期结构缺失时直接以 Invalid 失败
//! - 把传输错误和服务端错误码翻译成 RecognitionError 的三种类别
//!
//! 客户端本身无状态，可在并发单元间只读共享；重试由上层网关负责

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::clients::RecognitionProvider;
use crate::config::Config;
use crate::error::RecognitionError;
use crate::models::extraction::{BackFields, ExtractionResult, FrontFields, SideHint};
use crate::services::rules::BackRuleTable;

/// 证件识别端点
const IDCARD_ENDPOINT: &str = "/rest/2.0/ocr/v1/idcard";
/// 通用文本识别端点（关键词扫描用）
const GENERAL_ENDPOINT: &str = "/rest/2.0/ocr/v1/general_basic";

/// 识别服务客户端
pub struct OcrClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    rules: Arc<BackRuleTable>,
}

impl OcrClient {
    /// 创建新的识别客户端
    pub fn new(config: &Config, rules: Arc<BackRuleTable>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.ocr_api_base_url.trim_end_matches('/').to_string(),
            access_token: config.ocr_access_token.clone(),
            rules,
        }
    }

    /// 发起识别调用并完成错误码翻译
    async fn call(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Value, RecognitionError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::transient(format!("请求超时 ({})", endpoint))
                } else {
                    RecognitionError::transient(format!("网络请求失败 ({}): {}", endpoint, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => RecognitionError::auth(format!("HTTP {} ({})", status, endpoint)),
                s if s >= 500 => {
                    RecognitionError::transient(format!("HTTP {} ({})", status, endpoint))
                }
                _ => RecognitionError::invalid(format!("HTTP {} ({})", status, endpoint)),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            RecognitionError::transient(format!("响应解析失败 ({}): {}", endpoint, e))
        })?;

        if let Some(code) = body.get("error_code").and_then(|v| v.as_u64()) {
            let msg = body
                .get("error_msg")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            return Err(map_error_code(code, &msg));
        }

        Ok(body)
    }

    /// 解析正面响应
    fn parse_front(&self, body: &Value) -> Result<FrontFields, RecognitionError> {
        let words_result = body
            .get("words_result")
            .and_then(|v| v.as_object())
            .ok_or_else(|| RecognitionError::invalid("识别结果缺少 words_result"))?;

        let word_of = |key: &str| -> String {
            words_result
                .get(key)
                .and_then(|v| v.get("words"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        Ok(FrontFields {
            name: word_of("姓名"),
            id_number: word_of("公民身份号码"),
            gender: word_of("性别"),
            nation: word_of("民族"),
            birthday: word_of("出生"),
            address: word_of("住址"),
        })
    }

    /// 解析背面响应
    fn parse_back(&self, body: &Value) -> Result<BackFields, RecognitionError> {
        let words_result = body
            .get("words_result")
            .and_then(|v| v.as_object())
            .ok_or_else(|| RecognitionError::invalid("识别结果缺少 words_result"))?;

        let word_of = |key: &str| -> String {
            words_result
                .get(key)
                .and_then(|v| v.get("words"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        let authority = word_of("签发机关");
        let issue_date = word_of("签发日期");
        let expiry_date = word_of("失效日期");

        let valid_period = match (issue_date.is_empty(), expiry_date.is_empty()) {
            (false, false) => Some(format!("{}-{}", issue_date, expiry_date)),
            (true, false) => Some(expiry_date),
            _ => None,
        };

        // 背面原文（国徽面标题等）也参与标志词扫描
        let all_text: String = words_result
            .values()
            .filter_map(|v| v.get("words").and_then(|w| w.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(BackFields {
            issue_authority: if authority.is_empty() {
                None
            } else {
                Some(authority)
            },
            valid_period,
            keyword_hits: self.rules.find_marker_hits(&all_text),
        })
    }

    /// 解析通用文本响应（关键词扫描），尽量顺带提取机关/期限供展示
    fn parse_combined(&self, body: &Value) -> Result<BackFields, RecognitionError> {
        let words_result = body
            .get("words_result")
            .and_then(|v| v.as_array())
            .ok_or_else(|| RecognitionError::invalid("识别结果缺少 words_result"))?;

        let lines: Vec<String> = words_result
            .iter()
            .filter_map(|item| item.get("words").and_then(|w| w.as_str()))
            .map(|s| s.to_string())
            .collect();

        let full_text = lines.join("\n");

        Ok(BackFields {
            issue_authority: self.extract_authority(&lines),
            valid_period: self.extract_period(&lines),
            keyword_hits: self.rules.find_marker_hits(&full_text),
        })
    }

    /// 在整页文本行中查找签发机关
    fn extract_authority(&self, lines: &[String]) -> Option<String> {
        for line in lines {
            let stripped = strip_label(line, "签发机关");
            if !stripped.is_empty() && self.rules.matches_authority(stripped) {
                return Some(stripped.to_string());
            }
        }
        None
    }

    /// 在整页文本行中查找有效期限
    fn extract_period(&self, lines: &[String]) -> Option<String> {
        for line in lines {
            let stripped = strip_label(line, "有效期限");
            for token in stripped.split_whitespace() {
                if self.rules.matches_period(token) {
                    return Some(token.to_string());
                }
            }
        }
        None
    }
}

/// 去掉行首的字段标签和分隔符
fn strip_label<'a>(line: &'a str, label: &str) -> &'a str {
    line.trim()
        .trim_start_matches(label)
        .trim_start_matches([':', '：'])
        .trim()
}

/// 服务端错误码 → 识别错误类别
///
/// 110/111 是 access token 失效/过期，批次运行中途可能发生，允许重试；
/// 216xxx 是图片本身的问题，重试无意义；
/// 限流和服务端内部错误按临时故障处理，由上层网关的次数预算兜底
fn map_error_code(code: u64, msg: &str) -> RecognitionError {
    match code {
        110 | 111 => RecognitionError::auth(format!("error_code={}: {}", code, msg)),
        216200 | 216201 | 216202 | 216630 | 216633 => {
            RecognitionError::invalid(format!("error_code={}: {}", code, msg))
        }
        _ => RecognitionError::transient(format!("error_code={}: {}", code, msg)),
    }
}

impl RecognitionProvider for OcrClient {
    async fn recognize(
        &self,
        image: &[u8],
        hint: SideHint,
    ) -> Result<ExtractionResult, RecognitionError> {
        let encoded = BASE64.encode(image);
        debug!("识别调用: hint={:?}, 图片 {} 字节", hint, image.len());

        match hint {
            SideHint::Front => {
                let body = self
                    .call(
                        IDCARD_ENDPOINT,
                        vec![("image", encoded), ("id_card_side", "front".to_string())],
                    )
                    .await?;
                Ok(ExtractionResult::Front(self.parse_front(&body)?))
            }
            SideHint::Back => {
                let body = self
                    .call(
                        IDCARD_ENDPOINT,
                        vec![("image", encoded), ("id_card_side", "back".to_string())],
                    )
                    .await?;
                Ok(ExtractionResult::Back(self.parse_back(&body)?))
            }
            SideHint::Combined => {
                let body = self
                    .call(GENERAL_ENDPOINT, vec![("image", encoded)])
                    .await?;
                Ok(ExtractionResult::Back(self.parse_combined(&body)?))
            }
        }
    }
}
