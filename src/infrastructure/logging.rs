use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::constants::{env::LOG_FILTER, log::DEFAULT_LOG_LEVEL};

/// 初始化日志：过滤器来自 NVU_LOG，默认 warn；只写标准错误流，
/// 标准输出留给被分发的程序
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(io::stderr),
        )
        .try_init();
}
