use crate::error::{Result, RouteFlowError};
use std::env;

use super::agent_config::EndpointConfig;

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 获取 API Key，支持从环境变量或配置中获取
    ///
    /// 优先级：
    /// 1. 直接传入的 api_key 参数（如果不以 ${} 包裹）
    /// 2. 环境变量（如果 api_key 以 ${VAR_NAME} 格式）
    /// 3. 空值时读取 default_env_var
    pub fn get_api_key(api_key: &str, default_env_var: &str) -> Result<String> {
        if api_key.starts_with("${") && api_key.ends_with('}') {
            let env_var_name = &api_key[2..api_key.len() - 1];
            Self::get_env(env_var_name)
        } else if api_key.is_empty() {
            Self::get_env(default_env_var)
        } else {
            Ok(api_key.to_string())
        }
    }

    pub fn endpoint_api_key(endpoint: &EndpointConfig) -> Result<String> {
        Self::get_api_key(&endpoint.api_key, &endpoint.api_key_env)
    }

    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            RouteFlowError::Config(format!(
                "environment variable '{}' is not set",
                key
            ))
        })
    }

    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok()
    }

    pub fn is_debug_mode() -> bool {
        env::var("AGENTROUTE_DEBUG").is_ok()
    }
}
