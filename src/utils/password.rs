use crate::config::AdminConfig;
use bcrypt::verify;

/// 管理员密码校验
///
/// 优先使用 bcrypt 哈希；未配置哈希时回退到常量时间的明文比较；都未配置则拒绝。
#[derive(Clone)]
pub struct AdminCredentials {
    password: Option<String>,
    password_hash: Option<String>,
}

impl AdminCredentials {
    pub fn new(password: Option<String>, password_hash: Option<String>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
            password_hash: password_hash.filter(|h| !h.is_empty()),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.password.clone(), config.password_hash.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.password.is_some() || self.password_hash.is_some()
    }

    pub fn verify(&self, plaintext: &str) -> bool {
        if let Some(hash) = &self.password_hash {
            return match verify(plaintext, hash) {
                Ok(ok) => ok,
                Err(e) => {
                    log::error!("Admin password hash check failed: {e}");
                    false
                }
            };
        }
        match &self.password {
            Some(expected) => constant_time_eq(expected.as_bytes(), plaintext.as_bytes()),
            None => false,
        }
    }
}

/// 常量时间比较，防止计时攻击
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_fallback() {
        let creds = AdminCredentials::new(Some("hunter22".into()), None);
        assert!(creds.verify("hunter22"));
        assert!(!creds.verify("hunter2"));
        assert!(!creds.verify(""));
    }

    #[test]
    fn test_hash_takes_precedence() {
        let hash = bcrypt::hash("Password123", 4).unwrap();
        let creds = AdminCredentials::new(Some("plain".into()), Some(hash));
        assert!(creds.verify("Password123"));
        assert!(!creds.verify("plain"));
    }

    #[test]
    fn test_malformed_hash_rejects() {
        let creds = AdminCredentials::new(None, Some("not-a-bcrypt-hash".into()));
        assert!(!creds.verify("anything"));
    }

    #[test]
    fn test_unconfigured_rejects_everything() {
        let creds = AdminCredentials::new(Some(String::new()), None);
        assert!(!creds.is_configured());
        assert!(!creds.verify(""));
    }
}
