//! 合成服务 HTTP 客户端
//!
//! 合成（把正反两面图片和提取字段排版成一页可打印文档）是外部协作方，
//! 这里只负责送入与取回，不关心排版细节

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use tracing::debug;

use crate::clients::Compositor;
use crate::config::Config;
use crate::error::{ApiError, AppError};
use crate::models::extraction::FrontFields;

/// 合成端点
const COMPOSE_ENDPOINT: &str = "/api/v1/compose";

/// 合成服务客户端
pub struct ComposeClient {
    http: reqwest::Client,
    base_url: String,
}

impl ComposeClient {
    /// 创建新的合成客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.compose_api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Compositor for ComposeClient {
    async fn compose(
        &self,
        front: &[u8],
        back: &[u8],
        fields: Option<&FrontFields>,
    ) -> Result<Vec<u8>, AppError> {
        let url = format!("{}{}", self.base_url, COMPOSE_ENDPOINT);

        let payload = json!({
            "front_image": BASE64.encode(front),
            "back_image": BASE64.encode(back),
            "fields": fields,
        });

        debug!(
            "合成调用: 正面 {} 字节, 背面 {} 字节",
            front.len(),
            back.len()
        );

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(COMPOSE_ENDPOINT, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.ok();
            return Err(ApiError::BadResponse {
                endpoint: COMPOSE_ENDPOINT.to_string(),
                code: Some(status.as_u16() as u64),
                message,
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(COMPOSE_ENDPOINT, e))?;

        if bytes.is_empty() {
            return Err(ApiError::EmptyResponse {
                endpoint: COMPOSE_ENDPOINT.to_string(),
            }
            .into());
        }

        Ok(bytes.to_vec())
    }
}
