use crate::entities::{
    CodeStatus, code_entity as codes, participant_entity as participants,
    prize_entity as prizes, spin_entity as spins,
};
use crate::error::AppResult;
use crate::models::{
    AnalyticsResponse, AnalyticsTotals, PaginatedResponse, PaginationParams, PrizeStats,
    RecentRedemption, RedemptionPageResponse, RedemptionQuery, RedemptionRecord,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::HashMap;

const RECENT_REDEMPTIONS: u64 = 10;

/// 过期判定与惰性写回规则一致：已标记 expired，或仍为 issued 但已到期
fn expired_condition(now: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(codes::Column::Status.eq(CodeStatus::Expired))
        .add(
            Condition::all()
                .add(codes::Column::Status.eq(CodeStatus::Issued))
                .add(codes::Column::ExpiresAt.lte(now)),
        )
}

fn active_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(codes::Column::Status.eq(CodeStatus::Issued))
        .add(codes::Column::ExpiresAt.gt(now))
}

#[derive(Clone)]
pub struct AnalyticsService {
    pool: DatabaseConnection,
}

impl AnalyticsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn analytics(&self) -> AppResult<AnalyticsResponse> {
        self.analytics_at(Utc::now()).await
    }

    /// 汇总统计 + 按奖品统计 + 最近兑换
    pub async fn analytics_at(&self, now: DateTime<Utc>) -> AppResult<AnalyticsResponse> {
        let totals = AnalyticsTotals {
            participants: participants::Entity::find().count(&self.pool).await?,
            spins: spins::Entity::find().count(&self.pool).await?,
            codes: codes::Entity::find().count(&self.pool).await?,
            redeemed: codes::Entity::find()
                .filter(codes::Column::Status.eq(CodeStatus::Redeemed))
                .count(&self.pool)
                .await?,
            expired: codes::Entity::find()
                .filter(expired_condition(now))
                .count(&self.pool)
                .await?,
            active: codes::Entity::find()
                .filter(active_condition(now))
                .count(&self.pool)
                .await?,
        };

        let prize_list = prizes::Entity::find()
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        let mut prize_stats = Vec::with_capacity(prize_list.len());
        for prize in prize_list {
            let by_prize = codes::Entity::find().filter(codes::Column::PrizeId.eq(prize.id));
            prize_stats.push(PrizeStats {
                prize_id: prize.id,
                prize_name: prize.name,
                issued: by_prize.clone().count(&self.pool).await?,
                redeemed: by_prize
                    .clone()
                    .filter(codes::Column::Status.eq(CodeStatus::Redeemed))
                    .count(&self.pool)
                    .await?,
                expired: by_prize
                    .filter(expired_condition(now))
                    .count(&self.pool)
                    .await?,
            });
        }

        let recent = self
            .redemption_records(0, RECENT_REDEMPTIONS)
            .await?
            .into_iter()
            .map(|r| RecentRedemption {
                code: r.code,
                redeemed_at: r.redeemed_at,
                prize: r.prize_name,
                participant_name: r.participant_name,
                participant_phone: r.participant_phone,
            })
            .collect();

        Ok(AnalyticsResponse {
            totals,
            prizes: prize_stats,
            recent,
        })
    }

    /// 兑换历史（分页，按兑换时间倒序）
    pub async fn redemptions(&self, query: &RedemptionQuery) -> AppResult<RedemptionPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let total = codes::Entity::find()
            .filter(codes::Column::Status.eq(CodeStatus::Redeemed))
            .count(&self.pool)
            .await?;
        let items = self
            .redemption_records(params.get_offset(), params.get_limit())
            .await?;

        Ok(PaginatedResponse::new(items, &params, total))
    }

    async fn redemption_records(&self, offset: u64, limit: u64) -> AppResult<Vec<RedemptionRecord>> {
        let redeemed = codes::Entity::find()
            .filter(codes::Column::Status.eq(CodeStatus::Redeemed))
            .order_by_desc(codes::Column::RedeemedAt)
            .order_by_desc(codes::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.pool)
            .await?;
        if redeemed.is_empty() {
            return Ok(Vec::new());
        }

        // 批量加载关联，避免逐行查询
        let participant_ids: Vec<i32> = redeemed.iter().map(|c| c.participant_id).collect();
        let prize_ids: Vec<i32> = redeemed.iter().map(|c| c.prize_id).collect();
        let participant_map: HashMap<i32, participants::Model> = participants::Entity::find()
            .filter(participants::Column::Id.is_in(participant_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let prize_map: HashMap<i32, prizes::Model> = prizes::Entity::find()
            .filter(prizes::Column::Id.is_in(prize_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(redeemed
            .into_iter()
            .map(|c| {
                let participant = participant_map.get(&c.participant_id);
                RedemptionRecord {
                    id: c.id,
                    prize_name: prize_map.get(&c.prize_id).map(|p| p.name.clone()),
                    participant_name: participant.map(|p| p.full_name.clone()),
                    participant_phone: participant.and_then(|p| p.phone.clone()),
                    code: c.code,
                    redeemed_at: c.redeemed_at,
                    redeemed_by: c.redeemed_by,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{ActiveModelTrait, Set};
    use crate::database::connect_test_db;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    struct Fixture {
        participant_id: i32,
        prize_id: i32,
    }

    async fn fixture(db: &DatabaseConnection) -> Fixture {
        let participant = participants::ActiveModel {
            full_name: Set("Jane".into()),
            phone: Set(Some("5551234567".into())),
            device_fingerprint: Set(Some("dev".into())),
            created_at: Set(t0()),
            updated_at: Set(t0()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        let prize = prizes::ActiveModel {
            name: Set("Cookie".into()),
            prize_type: Set("item".into()),
            value: Set(None),
            weight: Set(1),
            active: Set(true),
            icon_type: Set(None),
            created_at: Set(t0()),
            updated_at: Set(t0()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        Fixture {
            participant_id: participant.id,
            prize_id: prize.id,
        }
    }

    async fn add_code(
        db: &DatabaseConnection,
        f: &Fixture,
        code: &str,
        expires_at: DateTime<Utc>,
        status: CodeStatus,
        redeemed_at: Option<DateTime<Utc>>,
    ) {
        codes::ActiveModel {
            participant_id: Set(f.participant_id),
            prize_id: Set(f.prize_id),
            code: Set(code.into()),
            issued_at: Set(t0()),
            expires_at: Set(expires_at),
            redeemed_at: Set(redeemed_at),
            redeemed_by: Set(redeemed_at.map(|_| "admin".to_string())),
            status: Set(status),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_expired_counts_lapsed_issued_codes() {
        let db = connect_test_db().await;
        let f = fixture(&db).await;
        let now = t0() + Duration::hours(1);

        add_code(&db, &f, "ACTIVE22", now + Duration::minutes(5), CodeStatus::Issued, None).await;
        add_code(&db, &f, "LAPSED22", t0(), CodeStatus::Issued, None).await;
        add_code(&db, &f, "STORED22", t0(), CodeStatus::Expired, None).await;
        add_code(
            &db,
            &f,
            "REDEEM22",
            t0() + Duration::minutes(15),
            CodeStatus::Redeemed,
            Some(t0() + Duration::minutes(1)),
        )
        .await;

        let report = AnalyticsService::new(db).analytics_at(now).await.unwrap();
        assert_eq!(
            report.totals,
            AnalyticsTotals {
                participants: 1,
                spins: 0,
                codes: 4,
                redeemed: 1,
                expired: 2,
                active: 1,
            }
        );
        assert_eq!(
            report.prizes,
            vec![PrizeStats {
                prize_id: f.prize_id,
                prize_name: "Cookie".into(),
                issued: 4,
                redeemed: 1,
                expired: 2,
            }]
        );
        assert_eq!(report.recent.len(), 1);
        assert_eq!(report.recent[0].code, "REDEEM22");
        assert_eq!(report.recent[0].participant_name.as_deref(), Some("Jane"));
    }

    #[tokio::test]
    async fn test_redemptions_paginated_newest_first() {
        let db = connect_test_db().await;
        let f = fixture(&db).await;
        for i in 0..5 {
            add_code(
                &db,
                &f,
                &format!("CODE{i:04}"),
                t0() + Duration::hours(1),
                CodeStatus::Redeemed,
                Some(t0() + Duration::minutes(i)),
            )
            .await;
        }
        add_code(&db, &f, "OPENCODE", t0() + Duration::hours(1), CodeStatus::Issued, None).await;

        let svc = AnalyticsService::new(db);
        let page = svc
            .redemptions(&RedemptionQuery {
                page: Some(2),
                per_page: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let codes: Vec<_> = page.data.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["CODE0002", "CODE0001"]);
        assert_eq!(page.data[0].prize_name.as_deref(), Some("Cookie"));
        assert_eq!(page.data[0].redeemed_by.as_deref(), Some("admin"));
    }
}
