use crate::engine::{RespinPolicy, SpinPolicy};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub wheel: WheelConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// 奖品表为空时写入默认奖品
    #[serde(default = "default_true")]
    pub seed_default_prizes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub admin_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// 明文密码 (仅在未配置 password_hash 时使用)
    #[serde(default)]
    pub password: Option<String>,
    /// bcrypt 哈希，优先使用
    #[serde(default)]
    pub password_hash: Option<String>,
    pub login_max_attempts: usize,
    pub login_window_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            password_hash: None,
            login_max_attempts: 5,
            login_window_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelConfig {
    pub cooldown_secs: i64,
    pub code_ttl_secs: i64,
    #[serde(default)]
    pub immediate_respin_after_expiry: bool,
    pub code_length: usize,
    pub code_max_attempts: u32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 3600,
            code_ttl_secs: 900,
            immediate_respin_after_expiry: false,
            code_length: 8,
            code_max_attempts: 6,
        }
    }
}

impl WheelConfig {
    pub fn spin_policy(&self) -> SpinPolicy {
        let respin = if self.immediate_respin_after_expiry {
            RespinPolicy::ImmediateOnExpiry
        } else {
            RespinPolicy::AfterCooldown
        };
        SpinPolicy::new(
            Duration::seconds(self.cooldown_secs),
            Duration::seconds(self.code_ttl_secs),
            respin,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// 为空时允许任意来源 (本地开发)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwilioConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_phone: String,
}

fn default_true() -> bool {
    true
}

fn parse_bool(v: &str) -> bool {
    v != "0" && !v.eq_ignore_ascii_case("false")
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                        seed_default_prizes: true,
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        admin_token_expires_in: get_env_parse("ADMIN_TOKEN_EXPIRES_IN", 86_400i64),
                    },
                    admin: AdminConfig::default(),
                    wheel: WheelConfig::default(),
                    cors: CorsConfig::default(),
                    twilio: TwilioConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DB_SEED_DEFAULT_PRIZES") {
            config.database.seed_default_prizes = parse_bool(&v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("ADMIN_TOKEN_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.admin_token_expires_in = n;
        }

        // Admin
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            config.admin.password = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            config.admin.password_hash = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("ADMIN_LOGIN_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.admin.login_max_attempts = n;
        }
        if let Ok(v) = env::var("ADMIN_LOGIN_WINDOW_SECS")
            && let Ok(n) = v.parse()
        {
            config.admin.login_window_secs = n;
        }

        // Wheel
        if let Ok(v) = env::var("SPIN_COOLDOWN_SECS")
            && let Ok(n) = v.parse()
        {
            config.wheel.cooldown_secs = n;
        }
        if let Ok(v) = env::var("CODE_TTL_SECS")
            && let Ok(n) = v.parse()
        {
            config.wheel.code_ttl_secs = n;
        }
        if let Ok(v) = env::var("IMMEDIATE_RESPIN_AFTER_EXPIRY") {
            config.wheel.immediate_respin_after_expiry = parse_bool(&v);
        }
        if let Ok(v) = env::var("CODE_LENGTH")
            && let Ok(n) = v.parse()
        {
            config.wheel.code_length = n;
        }
        if let Ok(v) = env::var("CODE_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.wheel.code_max_attempts = n;
        }

        // CORS: 逗号分隔
        if let Ok(v) = env::var("ALLOWED_ORIGINS") {
            config.cors.allowed_origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        // Twilio
        if let Ok(v) = env::var("TWILIO_ENABLED") {
            config.twilio.enabled = parse_bool(&v);
        }
        if let Ok(v) = env::var("TWILIO_ACCOUNT_SID") {
            config.twilio.account_sid = v;
        }
        if let Ok(v) = env::var("TWILIO_AUTH_TOKEN") {
            config.twilio.auth_token = v;
        }
        if let Ok(v) = env::var("TWILIO_FROM_PHONE") {
            config.twilio.from_phone = v;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.wheel.cooldown_secs < 0 || self.wheel.code_ttl_secs <= 0 {
            return Err("wheel.cooldown_secs 不能为负且 wheel.code_ttl_secs 必须为正".into());
        }
        if self.wheel.code_length < 4 {
            return Err("wheel.code_length 至少为 4".into());
        }
        if self.wheel.code_max_attempts == 0 {
            return Err("wheel.code_max_attempts 必须大于 0".into());
        }
        Ok(())
    }
}
