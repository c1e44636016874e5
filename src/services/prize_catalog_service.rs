use crate::entities::{code_entity as codes, prize_entity as prizes, spin_entity as spins};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminPrizeResponse, PrizeInput, PrizeResponse, ReplacePrizesRequest, ReplacePrizesResponse,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct PrizeCatalogService {
    pool: DatabaseConnection,
}

impl PrizeCatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 公开奖品列表（仅启用）
    pub async fn list_active(&self) -> AppResult<Vec<PrizeResponse>> {
        let list = prizes::Entity::find()
            .filter(prizes::Column::Active.eq(true))
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 管理端奖品列表（包含停用）
    pub async fn list_all(&self) -> AppResult<Vec<AdminPrizeResponse>> {
        let list = prizes::Entity::find()
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn replace_catalog(
        &self,
        req: ReplacePrizesRequest,
    ) -> AppResult<ReplacePrizesResponse> {
        self.replace_catalog_at(req, Utc::now()).await
    }

    /// 整体替换奖品目录
    ///
    /// - 带 id 的项更新对应奖品，id 不存在则整批失败
    /// - 不带 id 的项新建
    /// - 未出现在提交中的启用奖品改为停用，不删除
    /// - 提交后至少要有一个启用且 weight > 0 的奖品，否则整批拒绝
    pub async fn replace_catalog_at(
        &self,
        req: ReplacePrizesRequest,
        now: DateTime<Utc>,
    ) -> AppResult<ReplacePrizesResponse> {
        validate_catalog(&req.prizes)?;

        let txn = self.pool.begin().await?;

        let mut existing: HashMap<i32, prizes::Model> = prizes::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut summary = ReplacePrizesResponse {
            created: 0,
            updated: 0,
            deactivated: 0,
        };

        for input in req.prizes {
            match input.id {
                Some(id) => {
                    let current = existing
                        .remove(&id)
                        .ok_or_else(|| AppError::NotFound(format!("Prize {id} not found")))?;

                    let mut am = current.into_active_model();
                    am.name = Set(input.name.trim().to_string());
                    am.prize_type = Set(input.prize_type.trim().to_string());
                    am.value = Set(input.value);
                    am.weight = Set(input.weight);
                    am.active = Set(input.active);
                    am.icon_type = Set(input.icon_type);
                    am.updated_at = Set(now);
                    am.update(&txn).await?;
                    summary.updated += 1;
                }
                None => {
                    prizes::ActiveModel {
                        name: Set(input.name.trim().to_string()),
                        prize_type: Set(input.prize_type.trim().to_string()),
                        value: Set(input.value),
                        weight: Set(input.weight),
                        active: Set(input.active),
                        icon_type: Set(input.icon_type),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    summary.created += 1;
                }
            }
        }

        // 剩下的就是本次提交中缺失的奖品
        for omitted in existing.into_values() {
            if !omitted.active {
                continue;
            }
            let mut am = omitted.into_active_model();
            am.active = Set(false);
            am.updated_at = Set(now);
            am.update(&txn).await?;
            summary.deactivated += 1;
        }

        txn.commit().await?;

        log::info!(
            "Prize catalog replaced: created={}, updated={}, deactivated={}",
            summary.created,
            summary.updated,
            summary.deactivated
        );
        Ok(summary)
    }

    /// 硬删除；被抽奖记录或兑换码引用的奖品不能删除 (只能停用)
    pub async fn delete_prize(&self, id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let prize = prizes::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prize {id} not found")))?;

        let spin_refs = spins::Entity::find()
            .filter(spins::Column::PrizeId.eq(id))
            .count(&txn)
            .await?;
        let code_refs = codes::Entity::find()
            .filter(codes::Column::PrizeId.eq(id))
            .count(&txn)
            .await?;
        if spin_refs > 0 || code_refs > 0 {
            return Err(AppError::Conflict(format!(
                "Prize {id} has spin or code history; deactivate it instead"
            )));
        }

        prize.delete(&txn).await?;
        txn.commit().await?;
        log::info!("Prize {id} deleted");
        Ok(())
    }
}

fn validate_catalog(items: &[PrizeInput]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for item in items {
        if item.name.trim().is_empty() {
            return Err(AppError::ValidationError("Prize name is required".into()));
        }
        if item.prize_type.trim().is_empty() {
            return Err(AppError::ValidationError("Prize type is required".into()));
        }
        if item.weight < 0 {
            return Err(AppError::ValidationError(format!(
                "Prize weight must not be negative: {}",
                item.name
            )));
        }
        if let Some(id) = item.id
            && !seen.insert(id)
        {
            return Err(AppError::ValidationError(format!(
                "Prize {id} appears more than once"
            )));
        }
    }

    if !items.iter().any(|p| p.active && p.weight > 0) {
        return Err(AppError::ValidationError(
            "At least one active prize with weight > 0 is required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_test_db;
    use crate::entities::{CodeStatus, participant_entity as participants};
    use chrono::Duration;

    fn input(id: Option<i32>, name: &str, weight: i32, active: bool) -> PrizeInput {
        PrizeInput {
            id,
            name: name.into(),
            prize_type: "item".into(),
            value: None,
            weight,
            active,
            icon_type: Some("gift".into()),
        }
    }

    async fn seeded(svc: &PrizeCatalogService) -> Vec<AdminPrizeResponse> {
        svc.replace_catalog(ReplacePrizesRequest {
            prizes: vec![
                input(None, "Cookie", 5, true),
                input(None, "Coffee", 3, true),
                input(None, "Cake", 1, true),
            ],
        })
        .await
        .unwrap();
        svc.list_all().await.unwrap()
    }

    #[tokio::test]
    async fn test_replace_creates_updates_and_deactivates() {
        let db = connect_test_db().await;
        let svc = PrizeCatalogService::new(db);
        let before = seeded(&svc).await;
        assert_eq!(before.len(), 3);

        let summary = svc
            .replace_catalog(ReplacePrizesRequest {
                prizes: vec![
                    input(Some(before[0].id), "Big Cookie", 7, true),
                    input(None, "Sticker", 2, true),
                ],
            })
            .await
            .unwrap();
        assert_eq!(
            summary,
            ReplacePrizesResponse {
                created: 1,
                updated: 1,
                deactivated: 2,
            }
        );

        let all = svc.list_all().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].name, "Big Cookie");
        assert_eq!(all[0].weight, 7);
        assert!(!all[1].active);
        assert!(!all[2].active);

        let public = svc.list_active().await.unwrap();
        let names: Vec<_> = public.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Big Cookie", "Sticker"]);
    }

    #[tokio::test]
    async fn test_replace_requires_drawable_prize() {
        let db = connect_test_db().await;
        let svc = PrizeCatalogService::new(db);
        let before = seeded(&svc).await;

        let err = svc
            .replace_catalog(ReplacePrizesRequest {
                prizes: vec![
                    input(Some(before[0].id), "Cookie", 0, true),
                    input(None, "Ghost", 10, false),
                ],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // 未部分生效
        let after = svc.list_all().await.unwrap();
        assert_eq!(after.len(), 3);
        assert!(after.iter().all(|p| p.active));
        assert_eq!(after[0].weight, 5);
    }

    #[tokio::test]
    async fn test_unknown_id_rolls_back_batch() {
        let db = connect_test_db().await;
        let svc = PrizeCatalogService::new(db);
        seeded(&svc).await;

        let err = svc
            .replace_catalog(ReplacePrizesRequest {
                prizes: vec![input(None, "New", 1, true), input(Some(999), "Missing", 1, true)],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(svc.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_items_rejected() {
        let db = connect_test_db().await;
        let svc = PrizeCatalogService::new(db);

        for bad in [
            vec![input(None, " ", 1, true)],
            vec![input(None, "Negative", -1, true), input(None, "Ok", 1, true)],
            vec![input(Some(1), "A", 1, true), input(Some(1), "B", 1, true)],
        ] {
            let err = svc
                .replace_catalog(ReplacePrizesRequest { prizes: bad })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn test_delete_referenced_prize_conflicts() {
        let db = connect_test_db().await;
        let svc = PrizeCatalogService::new(db.clone());
        let list = seeded(&svc).await;
        let now = Utc::now();

        let participant = participants::ActiveModel {
            full_name: Set("Jane".into()),
            phone: Set(Some("5551234567".into())),
            device_fingerprint: Set(Some("dev".into())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        codes::ActiveModel {
            participant_id: Set(participant.id),
            prize_id: Set(list[0].id),
            code: Set("K7F9X2BD".into()),
            issued_at: Set(now),
            expires_at: Set(now + Duration::minutes(15)),
            redeemed_at: Set(None),
            redeemed_by: Set(None),
            status: Set(CodeStatus::Issued),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let err = svc.delete_prize(list[0].id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        svc.delete_prize(list[1].id).await.unwrap();
        assert_eq!(svc.list_all().await.unwrap().len(), 2);

        let missing = svc.delete_prize(999).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
