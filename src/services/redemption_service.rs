use crate::entities::{CodeStatus, code_entity as codes, prize_entity as prizes};
use crate::error::{AppError, AppResult};
use crate::models::{RedeemResponse, RedemptionOutcome};
use crate::services::spin_service::mark_code_expired;
use crate::utils::normalize_code;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

#[derive(Clone)]
pub struct RedemptionService {
    pool: DatabaseConnection,
}

impl RedemptionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn redeem(&self, raw_code: &str, redeemed_by: &str) -> AppResult<RedeemResponse> {
        self.redeem_at(raw_code, redeemed_by, Utc::now()).await
    }

    /// 核销兑换码
    ///
    /// 判定顺序: 不存在 -> invalid；已兑换 -> already_redeemed；
    /// 已过期 -> 写回 expired 并返回 expired；否则条件更新为 redeemed。
    /// 条件更新 (status = issued AND redeemed_at IS NULL) 保证并发时只有一个请求成功。
    pub async fn redeem_at(
        &self,
        raw_code: &str,
        redeemed_by: &str,
        now: DateTime<Utc>,
    ) -> AppResult<RedeemResponse> {
        let code_str = normalize_code(raw_code);
        if code_str.is_empty() {
            return Err(AppError::ValidationError("Code is required".into()));
        }

        let Some(code) = codes::Entity::find()
            .filter(codes::Column::Code.eq(code_str.as_str()))
            .one(&self.pool)
            .await?
        else {
            log::info!("Redemption attempt with unknown code {code_str}");
            return Ok(RedeemResponse::bare(RedemptionOutcome::Invalid));
        };

        if code.status == CodeStatus::Redeemed || code.redeemed_at.is_some() {
            return Ok(already_redeemed(code.redeemed_at));
        }

        if code.status == CodeStatus::Expired || now > code.expires_at {
            mark_code_expired(&self.pool, code.id).await?;
            return Ok(RedeemResponse::bare(RedemptionOutcome::Expired));
        }

        let res = codes::Entity::update_many()
            .set(codes::ActiveModel {
                status: Set(CodeStatus::Redeemed),
                redeemed_at: Set(Some(now)),
                redeemed_by: Set(Some(redeemed_by.to_string())),
                ..Default::default()
            })
            .filter(codes::Column::Id.eq(code.id))
            .filter(codes::Column::Status.eq(CodeStatus::Issued))
            .filter(codes::Column::RedeemedAt.is_null())
            .exec(&self.pool)
            .await?;

        if res.rows_affected == 0 {
            // 被并发请求抢先，按当前状态返回
            let current = codes::Entity::find_by_id(code.id).one(&self.pool).await?;
            return Ok(match current {
                Some(c) if c.redeemed_at.is_some() => already_redeemed(c.redeemed_at),
                _ => RedeemResponse::bare(RedemptionOutcome::Expired),
            });
        }

        log::info!("Code {} redeemed by {redeemed_by}", code.code);

        let prize = prizes::Entity::find_by_id(code.prize_id)
            .one(&self.pool)
            .await?;
        Ok(RedeemResponse {
            status: RedemptionOutcome::Redeemed,
            prize_name: prize.as_ref().map(|p| p.name.clone()),
            prize_type: prize.as_ref().map(|p| p.prize_type.clone()),
            prize_value: prize.and_then(|p| p.value),
            redeemed_at: Some(now),
        })
    }
}

fn already_redeemed(redeemed_at: Option<DateTime<Utc>>) -> RedeemResponse {
    RedeemResponse {
        redeemed_at,
        ..RedeemResponse::bare(RedemptionOutcome::AlreadyRedeemed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_test_db;
    use crate::entities::participant_entity as participants;
    use chrono::Duration;
    use sea_orm::ActiveModelTrait;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn issue_code(db: &DatabaseConnection, code: &str) -> codes::Model {
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
            name: Set("Free Coffee".into()),
            prize_type: Set("item".into()),
            value: Set(Some("$4".into())),
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
        codes::ActiveModel {
            participant_id: Set(participant.id),
            prize_id: Set(prize.id),
            code: Set(code.into()),
            issued_at: Set(t0()),
            expires_at: Set(t0() + Duration::minutes(15)),
            redeemed_at: Set(None),
            redeemed_by: Set(None),
            status: Set(CodeStatus::Issued),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_redeem_twice() {
        let db = connect_test_db().await;
        issue_code(&db, "K7F9X2BD").await;
        let svc = RedemptionService::new(db.clone());
        let at = t0() + Duration::minutes(5);

        let first = svc.redeem_at(" k7f9x2bd ", "admin", at).await.unwrap();
        assert_eq!(first.status, RedemptionOutcome::Redeemed);
        assert_eq!(first.prize_name.as_deref(), Some("Free Coffee"));
        assert_eq!(first.prize_value.as_deref(), Some("$4"));
        assert_eq!(first.redeemed_at, Some(at));

        let second = svc
            .redeem_at("K7F9X2BD", "admin", at + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(second.status, RedemptionOutcome::AlreadyRedeemed);
        assert_eq!(second.redeemed_at, Some(at));

        let stored = codes::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(stored.status, CodeStatus::Redeemed);
        assert_eq!(stored.redeemed_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_unknown_and_blank_codes() {
        let db = connect_test_db().await;
        let svc = RedemptionService::new(db);
        let unknown = svc.redeem_at("NOPE1234", "admin", t0()).await.unwrap();
        assert_eq!(unknown.status, RedemptionOutcome::Invalid);

        let err = svc.redeem_at("   ", "admin", t0()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_expired_code_flips_once() {
        let db = connect_test_db().await;
        let code = issue_code(&db, "K7F9X2BD").await;
        let svc = RedemptionService::new(db.clone());
        let late = code.expires_at + Duration::seconds(1);

        for _ in 0..3 {
            let res = svc.redeem_at("K7F9X2BD", "admin", late).await.unwrap();
            assert_eq!(res.status, RedemptionOutcome::Expired);
            assert_eq!(res.redeemed_at, None);
        }
        assert!(!mark_code_expired(&db, code.id).await.unwrap());

        let stored = codes::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(stored.status, CodeStatus::Expired);
        assert_eq!(stored.redeemed_at, None);
    }

    #[tokio::test]
    async fn test_concurrent_redemption_single_winner() {
        let db = connect_test_db().await;
        issue_code(&db, "K7F9X2BD").await;
        let svc = RedemptionService::new(db);
        let at = t0() + Duration::minutes(1);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.redeem_at("K7F9X2BD", &format!("staff-{i}"), at).await
                })
            })
            .collect();

        let mut redeemed = 0;
        for handle in handles {
            let res = handle.await.unwrap().unwrap();
            match res.status {
                RedemptionOutcome::Redeemed => redeemed += 1,
                RedemptionOutcome::AlreadyRedeemed => assert_eq!(res.redeemed_at, Some(at)),
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(redeemed, 1);
    }
}
