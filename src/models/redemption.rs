use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginatedResponse;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RedeemRequest {
    #[schema(example = "K7F9X2BD")]
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionOutcome {
    Redeemed,
    AlreadyRedeemed,
    Expired,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RedeemResponse {
    pub status: RedemptionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl RedeemResponse {
    pub fn bare(status: RedemptionOutcome) -> Self {
        Self {
            status,
            prize_name: None,
            prize_type: None,
            prize_value: None,
            redeemed_at: None,
        }
    }
}

/// 兑换历史记录
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedemptionRecord {
    pub id: i32,
    pub code: String,
    pub prize_name: Option<String>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub redeemed_by: Option<String>,
    pub participant_name: Option<String>,
    pub participant_phone: Option<String>,
}

/// 兑换历史查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RedemptionQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

pub type RedemptionPageResponse = PaginatedResponse<RedemptionRecord>;
