use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use reqwest::Client;

/// 中奖短信内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardNotice {
    pub phone: String,
    pub code: String,
    pub prize_name: String,
    pub expires_at: DateTime<Utc>,
}

impl RewardNotice {
    pub fn body(&self) -> String {
        format!(
            "You won {}! Show code {} at the counter before {} UTC.",
            self.prize_name,
            self.code,
            self.expires_at.format("%H:%M")
        )
    }
}

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
            && !self.config.account_sid.is_empty()
            && !self.config.auth_token.is_empty()
            && !self.config.from_phone.is_empty()
    }

    /// 异步发送，不阻塞也不影响抽奖结果；失败只记录日志
    pub fn notify_reward(&self, notice: RewardNotice) {
        if !self.is_enabled() {
            log::debug!("SMS disabled, skip reward notice for code {}", notice.code);
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send_reward_sms(&notice).await {
                log::warn!("Reward SMS for code {} not delivered: {e}", notice.code);
            }
        });
    }

    pub async fn send_reward_sms(&self, notice: &RewardNotice) -> AppResult<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        // 库内手机号只保留数字，Twilio 需要 E.164
        let to = format!("+{}", notice.phone);
        let body = notice.body();
        let params = [
            ("To", to.as_str()),
            ("From", self.config.from_phone.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Reward SMS sent for code {}", notice.code);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Reward SMS failed for code {}: {error_text}", notice.code);
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> RewardNotice {
        RewardNotice {
            phone: "15551234567".into(),
            code: "K7F9X2BD".into(),
            prize_name: "Free Cookie".into(),
            expires_at: DateTime::parse_from_rfc3339("2025-09-01T12:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_body_mentions_code_and_deadline() {
        let body = notice().body();
        assert!(body.contains("Free Cookie"));
        assert!(body.contains("K7F9X2BD"));
        assert!(body.contains("12:15"));
    }

    #[test]
    fn test_disabled_without_credentials() {
        let service = TwilioService::new(TwilioConfig {
            enabled: true,
            ..Default::default()
        });
        assert!(!service.is_enabled());
        // 未启用时直接返回，不需要运行时
        service.notify_reward(notice());
    }
}
