use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::prize_entity;

/// 公开奖品信息（转盘渲染用，仅启用奖品）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeResponse {
    pub id: i32,
    pub name: String,
    pub prize_type: String,
    pub value: Option<String>,
    pub weight: i32,
    pub icon_type: Option<String>,
}

impl From<prize_entity::Model> for PrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        PrizeResponse {
            id: m.id,
            name: m.name,
            prize_type: m.prize_type,
            value: m.value,
            weight: m.weight,
            icon_type: m.icon_type,
        }
    }
}

/// 管理端奖品信息（包含停用奖品）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminPrizeResponse {
    pub id: i32,
    pub name: String,
    pub prize_type: String,
    pub value: Option<String>,
    pub weight: i32,
    pub active: bool,
    pub icon_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<prize_entity::Model> for AdminPrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        AdminPrizeResponse {
            id: m.id,
            name: m.name,
            prize_type: m.prize_type,
            value: m.value,
            weight: m.weight,
            active: m.active,
            icon_type: m.icon_type,
            updated_at: m.updated_at,
        }
    }
}

/// 目录整体替换中的一项：带 id 为更新，不带 id 为新建
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PrizeInput {
    pub id: Option<i32>,
    pub name: String,
    pub prize_type: String,
    pub value: Option<String>,
    pub weight: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    pub icon_type: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ReplacePrizesRequest {
    pub prizes: Vec<PrizeInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReplacePrizesResponse {
    pub created: u32,
    pub updated: u32,
    pub deactivated: u32,
}
