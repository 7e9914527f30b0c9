use anyhow::Result;
use idcard_batch_merge::utils::logging;
use idcard_batch_merge::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let app = App::initialize(config)?;
    app.run_from_input_folder().await?;

    Ok(())
}
