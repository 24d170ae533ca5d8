use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EnvConfig;

/// 日志配置
pub struct LoggingConfig;

impl LoggingConfig {
    /// 初始化日志系统
    ///
    /// - RUST_LOG: 日志过滤器，优先级最高
    /// - AGENTROUTE_DEBUG: 打开节点级调试输出，附带文件与行号
    ///
    /// ```no_run
    /// use agentroute::utils::LoggingConfig;
    ///
    /// LoggingConfig::init();
    /// tracing::info!("routing ready");
    /// ```
    pub fn init() {
        let is_debug = Self::is_debug();
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if is_debug {
                EnvFilter::new("agentroute=debug,info")
            } else {
                EnvFilter::new("agentroute=info,warn")
            }
        });

        let fmt_layer = fmt::layer()
            .with_target(is_debug)
            .with_file(is_debug)
            .with_line_number(is_debug);

        // a second init (tests, embedding hosts) keeps the first subscriber
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        if is_debug {
            tracing::debug!("debug logging enabled");
        }
    }

    pub fn is_debug() -> bool {
        EnvConfig::is_debug_mode()
    }
}
