/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的单元数量
    pub max_concurrent_units: usize,
    /// 识别服务地址
    pub ocr_api_base_url: String,
    /// 识别服务 access token（必填，缺失时批次直接中止）
    pub ocr_access_token: String,
    /// 合成服务地址
    pub compose_api_base_url: String,
    /// 单次识别调用超时（秒）
    pub recognition_timeout_secs: u64,
    /// 识别调用最大尝试次数（含首次）
    pub recognition_max_attempts: usize,
    /// 线性退避基数（秒），第 n 次失败后等待 n × 基数
    pub recognition_backoff_secs: u64,
    /// 单元整体处理超时（秒）
    pub unit_timeout_secs: u64,
    /// 待处理图片目录（每个子目录一个单元）
    pub input_folder: String,
    /// 合成产物输出目录
    pub output_folder: String,
    /// 失败单元报告文件
    pub failed_report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 背面校验规则表文件（可选，缺省使用内置规则）
    pub rules_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_units: 4,
            ocr_api_base_url: "https://aip.baidubce.com".to_string(),
            ocr_access_token: String::new(),
            compose_api_base_url: "http://127.0.0.1:8320".to_string(),
            recognition_timeout_secs: 60,
            recognition_max_attempts: 3,
            recognition_backoff_secs: 2,
            // 3 次识别尝试 × 60 秒 + 退避 6 秒，再留余量
            unit_timeout_secs: 240,
            input_folder: "input_units".to_string(),
            output_folder: "output_merged".to_string(),
            failed_report_file: "failed_units.txt".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            rules_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_units: std::env::var("MAX_CONCURRENT_UNITS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_units),
            ocr_api_base_url: std::env::var("OCR_API_BASE_URL").unwrap_or(default.ocr_api_base_url),
            ocr_access_token: std::env::var("OCR_ACCESS_TOKEN").unwrap_or(default.ocr_access_token),
            compose_api_base_url: std::env::var("COMPOSE_API_BASE_URL").unwrap_or(default.compose_api_base_url),
            recognition_timeout_secs: std::env::var("RECOGNITION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recognition_timeout_secs),
            recognition_max_attempts: std::env::var("RECOGNITION_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recognition_max_attempts),
            recognition_backoff_secs: std::env::var("RECOGNITION_BACKOFF_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recognition_backoff_secs),
            unit_timeout_secs: std::env::var("UNIT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.unit_timeout_secs),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            failed_report_file: std::env::var("FAILED_REPORT_FILE").unwrap_or(default.failed_report_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            rules_file: std::env::var("RULES_FILE").ok().filter(|v| !v.is_empty()).or(default.rules_file),
        }
    }
}
