//! 日志初始化

use crate::error::{LectioError, Result};

/// 没有设置 `RUST_LOG` 时使用的过滤规则
pub const DEFAULT_FILTER: &str = "warn";

/// 初始化全局日志订阅者，输出到stderr
pub fn init() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|err| LectioError::Logging(format!("无法构建日志过滤规则: {}", err)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| LectioError::Logging(err.to_string()))?;

    Ok(())
}
