use std::path::PathBuf;

use anyhow::{Context, Result};
use grade_eval::utils::logging;
use grade_eval::{App, Config};

const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（参数 > 当前目录下的 config.toml > 默认值）
    let config_path = std::env::args_os().nth(1).map(PathBuf::from).or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG);
        default.exists().then_some(default)
    });
    let config = Config::load(config_path.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logging::init(&config.logging)?;

    // 初始化并运行应用
    let summary = App::initialize(config)?.run().await?;
    tracing::info!("运行 {} 完成", summary.run_id);

    Ok(())
}
