//! 识别网关 - 业务能力层
//!
//! 只负责"带重试的识别调用"能力，不关心图片属于哪一面、哪个单元
//!
//! ## 重试策略
//!
//! - 最多 3 次尝试（含首次），只对临时故障和鉴权失败重试
//!   （外部服务的会话 token 可能在批次运行中途过期）
//! - 线性退避：第 n 次尝试失败后等待 n × 2 秒（n 从 1 计）
//! - 无效输入立即失败，不重试
//! - 每次尝试共享同一个 60 秒超时，超时按临时故障计
//!
//! 策略参数由构造函数注入，重试算法不依赖日志输出即可单测

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::clients::RecognitionProvider;
use crate::config::Config;
use crate::error::{RecognitionError, RecognitionErrorKind};
use crate::models::extraction::{ExtractionResult, SideHint};

/// 识别网关
///
/// 无状态，可在并发单元间只读共享
pub struct RecognitionGateway<P> {
    provider: P,
    max_attempts: usize,
    call_timeout: Duration,
    backoff_unit: Duration,
}

impl<P: RecognitionProvider> RecognitionGateway<P> {
    /// 按配置创建网关
    pub fn new(provider: P, config: &Config) -> Self {
        Self::with_policy(
            provider,
            config.recognition_max_attempts,
            Duration::from_secs(config.recognition_timeout_secs),
            Duration::from_secs(config.recognition_backoff_secs),
        )
    }

    /// 自定义重试策略创建网关
    pub fn with_policy(
        provider: P,
        max_attempts: usize,
        call_timeout: Duration,
        backoff_unit: Duration,
    ) -> Self {
        Self {
            provider,
            max_attempts: max_attempts.max(1),
            call_timeout,
            backoff_unit,
        }
    }

    /// 带重试的识别调用
    pub async fn recognize(
        &self,
        image: &[u8],
        hint: SideHint,
    ) -> Result<ExtractionResult, RecognitionError> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let result = match timeout(self.call_timeout, self.provider.recognize(image, hint)).await
            {
                Ok(result) => result,
                Err(_) => Err(RecognitionError::transient(format!(
                    "识别调用超时 ({}秒)",
                    self.call_timeout.as_secs()
                ))),
            };

            match result {
                Ok(extraction) => return Ok(extraction),
                Err(e) if e.kind == RecognitionErrorKind::Invalid => return Err(e),
                Err(e) => {
                    if attempt == self.max_attempts {
                        return Err(e);
                    }
                    let wait = self.backoff_unit * attempt as u32;
                    warn!(
                        "识别调用失败 (尝试 {}/{}): {}，等待 {:?} 后重试",
                        attempt, self.max_attempts, e, wait
                    );
                    last_error = Some(e);
                    sleep(wait).await;
                }
            }
        }

        // max_attempts ≥ 1，循环要么返回要么在最后一次尝试时返回错误
        Err(last_error
            .unwrap_or_else(|| RecognitionError::transient("识别调用未执行任何尝试")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 按脚本逐次返回结果的桩提供方
    struct ScriptedProvider {
        calls: AtomicUsize,
        script: Vec<Result<(), RecognitionErrorKind>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<(), RecognitionErrorKind>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RecognitionProvider for ScriptedProvider {
        async fn recognize(
            &self,
            _image: &[u8],
            _hint: SideHint,
        ) -> Result<ExtractionResult, RecognitionError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(index).copied().unwrap_or(Ok(())) {
                Ok(()) => Ok(ExtractionResult::Front(Default::default())),
                Err(RecognitionErrorKind::Transient) => {
                    Err(RecognitionError::transient("网络抖动"))
                }
                Err(RecognitionErrorKind::Auth) => Err(RecognitionError::auth("token 过期")),
                Err(RecognitionErrorKind::Invalid) => Err(RecognitionError::invalid("坏图")),
            }
        }
    }

    fn gateway(provider: ScriptedProvider) -> RecognitionGateway<ScriptedProvider> {
        RecognitionGateway::with_policy(
            provider,
            3,
            Duration::from_secs(60),
            Duration::from_secs(2),
        )
    }

    /// 前两次 Auth 失败、第三次成功：共 3 次调用，退避 2s + 4s
    #[tokio::test(start_paused = true)]
    async fn test_auth_failures_retried_with_linear_backoff() {
        let gw = gateway(ScriptedProvider::new(vec![
            Err(RecognitionErrorKind::Auth),
            Err(RecognitionErrorKind::Auth),
            Ok(()),
        ]));

        let started = tokio::time::Instant::now();
        let result = gw.recognize(b"img", SideHint::Front).await;

        assert!(result.is_ok());
        assert_eq!(gw.provider.call_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhausts_attempts() {
        let gw = gateway(ScriptedProvider::new(vec![
            Err(RecognitionErrorKind::Transient),
            Err(RecognitionErrorKind::Transient),
            Err(RecognitionErrorKind::Transient),
        ]));

        let result = gw.recognize(b"img", SideHint::Back).await;

        assert_eq!(result.unwrap_err().kind, RecognitionErrorKind::Transient);
        assert_eq!(gw.provider.call_count(), 3);
    }

    /// 无效输入不重试，只调用一次
    #[tokio::test]
    async fn test_invalid_fails_fast() {
        let gw = gateway(ScriptedProvider::new(vec![Err(
            RecognitionErrorKind::Invalid,
        )]));

        let result = gw.recognize(b"img", SideHint::Front).await;

        assert_eq!(result.unwrap_err().kind, RecognitionErrorKind::Invalid);
        assert_eq!(gw.provider.call_count(), 1);
    }

    /// 超出单次调用超时按临时故障重试
    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_counts_as_transient() {
        struct HangingProvider;

        impl RecognitionProvider for HangingProvider {
            async fn recognize(
                &self,
                _image: &[u8],
                _hint: SideHint,
            ) -> Result<ExtractionResult, RecognitionError> {
                std::future::pending().await
            }
        }

        let gw = RecognitionGateway::with_policy(
            HangingProvider,
            2,
            Duration::from_secs(60),
            Duration::from_secs(2),
        );

        let started = tokio::time::Instant::now();
        let result = gw.recognize(b"img", SideHint::Front).await;

        assert_eq!(result.unwrap_err().kind, RecognitionErrorKind::Transient);
        // 两次 60 秒超时 + 第一次失败后 2 秒退避
        assert_eq!(started.elapsed(), Duration::from_secs(122));
    }
}
