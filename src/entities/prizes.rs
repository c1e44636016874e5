use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 奖品配置实体
/// 概念说明:
/// - weight: 非负整数权重，抽中概率 = weight / Σweight (仅统计启用且 weight > 0 的奖品)
/// - active: 软删除标记，目录整体替换时未提交的奖品会被置为 false
/// - value: 展示用面值 (例如 "$5")，可为空
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub prize_type: String,
    pub value: Option<String>,
    pub weight: i32,
    pub active: bool,
    pub icon_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 是否参与抽奖
    pub fn is_drawable(&self) -> bool {
        self.active && self.weight > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::spins::Entity")]
    Spins,
    #[sea_orm(has_many = "super::codes::Entity")]
    Codes,
}

impl Related<super::spins::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spins.def()
    }
}

impl Related<super::codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Codes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
