use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{code_entity as codes, prize_entity as prizes};

/// 抽奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SpinRequest {
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "+1 (555) 123-4567")]
    pub phone: String,
    /// 前端生成的设备指纹 (不透明字符串)
    pub device_fingerprint: String,
}

/// 状态查询请求，phone 与 device_fingerprint 至少提供一个
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct StatusRequest {
    pub phone: Option<String>,
    pub device_fingerprint: Option<String>,
}

/// 抽奖 / 状态查询结果分类
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpinOutcome {
    New,
    ExistingActive,
    AlreadyRedeemed,
    Expired,
    Cooldown,
    /// 仅状态查询：无记录或当前可抽奖
    #[default]
    None,
}

/// 抽奖 / 状态查询响应，按结果填充相应字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpinResult {
    pub status: SpinOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_spin_at: Option<DateTime<Utc>>,
    /// 奖品在当前启用奖品中的位置 (转盘动画用，响应时计算)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wedge_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wedges_count: Option<usize>,
}

impl SpinResult {
    pub fn new(status: SpinOutcome, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            ..Default::default()
        }
    }

    /// 填充兑换码与奖品信息
    pub fn with_code(mut self, code: &codes::Model, prize: Option<&prizes::Model>) -> Self {
        self.code = Some(code.code.clone());
        self.expires_at = Some(code.expires_at);
        self.prize_id = Some(code.prize_id);
        if let Some(p) = prize {
            self.prize_name = Some(p.name.clone());
            self.prize_type = Some(p.prize_type.clone());
            self.prize_value = p.value.clone();
        }
        self
    }

    /// 计算转盘扇区：奖品在启用列表 (按 id 升序) 中的下标
    pub fn with_wedge(mut self, active_prizes: &[prizes::Model]) -> Self {
        if let Some(prize_id) = self.prize_id {
            self.wedge_index = active_prizes.iter().position(|p| p.id == prize_id);
            if self.wedge_index.is_some() {
                self.wedges_count = Some(active_prizes.len());
            }
        }
        self
    }
}
