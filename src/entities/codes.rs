use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 兑换码状态，只能单向流转: issued -> redeemed | expired
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    #[sea_orm(string_value = "issued")]
    Issued,
    #[sea_orm(string_value = "redeemed")]
    Redeemed,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl std::fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeStatus::Issued => write!(f, "issued"),
            CodeStatus::Redeemed => write!(f, "redeemed"),
            CodeStatus::Expired => write!(f, "expired"),
        }
    }
}

/// 兑换码实体
/// 过期是派生事实 (expires_at <= now)，读取或兑换时才惰性写回 status = expired
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub participant_id: i32,
    pub prize_id: i32,
    /// 全局唯一
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
    /// 执行兑换的管理员 (token subject)
    pub redeemed_by: Option<String>,
    pub status: CodeStatus,
}

impl Model {
    /// 已发放且未到期
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CodeStatus::Issued && self.expires_at > now
    }

    /// 已过期：状态已写回 expired，或仍是 issued 但已到期
    pub fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            CodeStatus::Expired => true,
            CodeStatus::Issued => self.expires_at <= now,
            CodeStatus::Redeemed => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::participants::Entity",
        from = "Column::ParticipantId",
        to = "super::participants::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Participant,
    #[sea_orm(
        belongs_to = "super::prizes::Entity",
        from = "Column::PrizeId",
        to = "super::prizes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Prize,
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
    }
}

impl Related<super::prizes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prize.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
