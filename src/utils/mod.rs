/// 工具模块 - 通用辅助函数
pub mod logging;

pub use logging::LoggingConfig;
