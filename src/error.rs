use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 识别服务错误
    Recognition(RecognitionError),
    /// 单元处理错误
    Unit(UnitError),
    /// 批次级错误（处理循环开始前即中止）
    Batch(BatchError),
    /// API 调用错误
    Api(ApiError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Recognition(e) => write!(f, "识别错误: {}", e),
            AppError::Unit(e) => write!(f, "单元错误: {}", e),
            AppError::Batch(e) => write!(f, "批次错误: {}", e),
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Recognition(e) => Some(e),
            AppError::Unit(e) => Some(e),
            AppError::Batch(e) => Some(e),
            AppError::Api(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 识别错误类别
///
/// 重试策略依赖这里的区分：Transient 和 Auth 可重试，Invalid 立即失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// 网络抖动、限流、服务端临时故障
    Transient,
    /// access token 失效或过期（会话可能在批次运行中途过期）
    Auth,
    /// 图片本身无法识别（格式错误、内容为空等），重试无意义
    Invalid,
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionErrorKind::Transient => write!(f, "临时故障"),
            RecognitionErrorKind::Auth => write!(f, "鉴权失败"),
            RecognitionErrorKind::Invalid => write!(f, "无效输入"),
        }
    }
}

/// 识别服务错误
#[derive(Debug, Clone)]
pub struct RecognitionError {
    pub kind: RecognitionErrorKind,
    pub message: String,
}

impl RecognitionError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: RecognitionErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: RecognitionErrorKind::Auth,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: RecognitionErrorKind::Invalid,
            message: message.into(),
        }
    }

    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            RecognitionErrorKind::Transient | RecognitionErrorKind::Auth
        )
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RecognitionError {}

/// 单元处理错误
///
/// 只会传播到编排层为止，由编排层转换为失败的 UnitOutcome
#[derive(Debug)]
pub enum UnitError {
    /// 图片数量不足
    InsufficientImages {
        unit_name: String,
        count: usize,
    },
    /// 证件不完整（选定正面后没有可用的背面图片）
    DocumentIncomplete {
        unit_name: String,
    },
    /// 分类失败
    ClassificationFailed {
        unit_name: String,
        message: String,
    },
    /// 合成失败
    CompositionFailed {
        unit_name: String,
        message: String,
    },
    /// 单元处理超时
    Timeout {
        unit_name: String,
        seconds: u64,
    },
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitError::InsufficientImages { unit_name, count } => {
                if *count == 0 {
                    write!(
                        f,
                        "单元 {} 图片数量不足: 实际 0 张，至少需要 2 张（声明的文件名可能未匹配到任何上传文件）",
                        unit_name
                    )
                } else {
                    write!(
                        f,
                        "单元 {} 图片数量不足: 实际 {} 张，至少需要 2 张",
                        unit_name, count
                    )
                }
            }
            UnitError::DocumentIncomplete { unit_name } => {
                write!(f, "单元 {} 证件不完整: 没有可用作背面的图片", unit_name)
            }
            UnitError::ClassificationFailed { unit_name, message } => {
                write!(f, "单元 {} 分类失败: {}", unit_name, message)
            }
            UnitError::CompositionFailed { unit_name, message } => {
                write!(f, "单元 {} 合成失败: {}", unit_name, message)
            }
            UnitError::Timeout { unit_name, seconds } => {
                write!(f, "单元 {} 处理超时 ({}秒)", unit_name, seconds)
            }
        }
    }
}

impl std::error::Error for UnitError {}

impl UnitError {
    /// 错误所属的单元名
    pub fn unit_name(&self) -> &str {
        match self {
            UnitError::InsufficientImages { unit_name, .. }
            | UnitError::DocumentIncomplete { unit_name }
            | UnitError::ClassificationFailed { unit_name, .. }
            | UnitError::CompositionFailed { unit_name, .. }
            | UnitError::Timeout { unit_name, .. } => unit_name,
        }
    }
}

/// 批次级错误
#[derive(Debug)]
pub enum BatchError {
    /// 缺少识别服务凭证
    MissingCredentials {
        field: String,
    },
    /// 输出目录不可用
    OutputDirUnavailable {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::MissingCredentials { field } => {
                write!(f, "缺少识别服务凭证: {} 未配置", field)
            }
            BatchError::OutputDirUnavailable { path, source } => {
                write!(f, "输出目录不可用 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::OutputDirUnavailable { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// API 调用错误
#[derive(Debug)]
pub enum ApiError {
    /// 网络请求失败
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回错误响应
    BadResponse {
        endpoint: String,
        code: Option<u64>,
        message: Option<String>,
    },
    /// API 返回空结果
    EmptyResponse {
        endpoint: String,
    },
    /// JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RequestFailed { endpoint, source } => {
                write!(f, "API请求失败 ({}): {}", endpoint, source)
            }
            ApiError::BadResponse {
                endpoint,
                code,
                message,
            } => {
                write!(
                    f,
                    "API返回错误响应 ({}): code={:?}, message={:?}",
                    endpoint, code, message
                )
            }
            ApiError::EmptyResponse { endpoint } => {
                write!(f, "API返回空结果: {}", endpoint)
            }
            ApiError::JsonParseFailed { source } => {
                write!(f, "JSON解析失败: {}", source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source, .. } | ApiError::JsonParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 规则表文件读取失败
    RulesFileReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 规则表解析失败
    RulesParseFailed {
        path: String,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::RulesFileReadFailed { path, source } => {
                write!(f, "规则表文件读取失败 ({}): {}", path, source)
            }
            ConfigError::RulesParseFailed { path, message } => {
                write!(f, "规则表解析失败 ({}): {}", path, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::RulesFileReadFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<RecognitionError> for AppError {
    fn from(err: RecognitionError) -> Self {
        AppError::Recognition(err)
    }
}

impl From<UnitError> for AppError {
    fn from(err: UnitError) -> Self {
        AppError::Unit(err)
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::Batch(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(format!("IO错误: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建缺少凭证错误
    pub fn missing_credentials(field: impl Into<String>) -> Self {
        AppError::Batch(BatchError::MissingCredentials {
            field: field.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_error_messages_name_the_unit() {
        let err = UnitError::InsufficientImages {
            unit_name: "bob".to_string(),
            count: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("bob"));
        assert!(msg.contains("1"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_zero_image_message_mentions_matching() {
        let err = UnitError::InsufficientImages {
            unit_name: "空单元".to_string(),
            count: 0,
        };
        assert!(err.to_string().contains("未匹配"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(RecognitionError::transient("x").is_retryable());
        assert!(RecognitionError::auth("x").is_retryable());
        assert!(!RecognitionError::invalid("x").is_retryable());
    }
}
