use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
    /// 秒
    pub expires_in: i64,
}

/// 汇总统计；expired / active 按惰性过期规则实时计算
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnalyticsTotals {
    pub participants: u64,
    pub spins: u64,
    pub codes: u64,
    pub redeemed: u64,
    pub expired: u64,
    pub active: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PrizeStats {
    pub prize_id: i32,
    pub prize_name: String,
    pub issued: u64,
    pub redeemed: u64,
    pub expired: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentRedemption {
    pub code: String,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub prize: Option<String>,
    pub participant_name: Option<String>,
    pub participant_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub totals: AnalyticsTotals,
    pub prizes: Vec<PrizeStats>,
    pub recent: Vec<RecentRedemption>,
}
