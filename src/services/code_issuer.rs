use crate::entities::{CodeStatus, code_entity as codes};
use crate::error::{AppError, AppResult};
use crate::utils::generate_redemption_code;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set, SqlErr, TransactionTrait};

/// 待写入的兑换码
#[derive(Debug, Clone, Copy)]
pub struct CodeDraft {
    pub participant_id: i32,
    pub prize_id: i32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// 生成并写入唯一兑换码
///
/// 唯一性由数据库唯一索引保证；冲突时在 savepoint 内回滚并重新生成，
/// 超过 max_attempts 返回 IssuanceExhausted。
#[derive(Debug, Clone, Copy)]
pub struct CodeIssuer {
    length: usize,
    max_attempts: u32,
}

impl CodeIssuer {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length,
            max_attempts,
        }
    }

    pub async fn issue<C: TransactionTrait>(
        &self,
        db: &C,
        draft: CodeDraft,
    ) -> AppResult<codes::Model> {
        let length = self.length;
        self.issue_with(db, draft, || generate_redemption_code(length))
            .await
    }

    pub async fn issue_with<C, G>(
        &self,
        db: &C,
        draft: CodeDraft,
        mut generate: G,
    ) -> AppResult<codes::Model>
    where
        C: TransactionTrait,
        G: FnMut() -> String,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = generate();
            let savepoint = db.begin().await?;

            let inserted = codes::ActiveModel {
                participant_id: Set(draft.participant_id),
                prize_id: Set(draft.prize_id),
                code: Set(candidate),
                issued_at: Set(draft.issued_at),
                expires_at: Set(draft.expires_at),
                redeemed_at: Set(None),
                redeemed_by: Set(None),
                status: Set(CodeStatus::Issued),
                ..Default::default()
            }
            .insert(&savepoint)
            .await;

            match inserted {
                Ok(model) => {
                    savepoint.commit().await?;
                    return Ok(model);
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    savepoint.rollback().await?;
                    log::warn!(
                        "Code collision on attempt {attempt}/{}, regenerating",
                        self.max_attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::IssuanceExhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_test_db;
    use crate::entities::{participant_entity as participants, prize_entity as prizes};
    use chrono::Duration;
    use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

    async fn fixtures(db: &DatabaseConnection) -> CodeDraft {
        let now = Utc::now();
        let participant = participants::ActiveModel {
            full_name: Set("Jane".into()),
            phone: Set(Some("5551234567".into())),
            device_fingerprint: Set(Some("dev".into())),
            created_at: Set(now),
            updated_at: Set(now),
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
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        CodeDraft {
            participant_id: participant.id,
            prize_id: prize.id,
            issued_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    #[tokio::test]
    async fn test_issue_generates_code() {
        let db = connect_test_db().await;
        let draft = fixtures(&db).await;
        let issuer = CodeIssuer::new(8, 6);
        let code = issuer.issue(&db, draft).await.unwrap();
        assert_eq!(code.code.len(), 8);
        assert_eq!(code.status, CodeStatus::Issued);
        assert_eq!(code.redeemed_at, None);
    }

    #[tokio::test]
    async fn test_retries_after_collision() {
        let db = connect_test_db().await;
        let draft = fixtures(&db).await;
        let issuer = CodeIssuer::new(8, 6);
        issuer
            .issue_with(&db, draft, || "TAKENAAA".to_string())
            .await
            .unwrap();

        let mut script = vec!["FRESHBBB", "TAKENAAA", "TAKENAAA"];
        let txn = db.begin().await.unwrap();
        let code = issuer
            .issue_with(&txn, draft, || script.pop().unwrap().to_string())
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(code.code, "FRESHBBB");
        assert_eq!(codes::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_is_surfaced() {
        let db = connect_test_db().await;
        let draft = fixtures(&db).await;
        let issuer = CodeIssuer::new(8, 6);
        issuer
            .issue_with(&db, draft, || "TAKENAAA".to_string())
            .await
            .unwrap();

        let mut calls = 0;
        let err = issuer
            .issue_with(&db, draft, || {
                calls += 1;
                "TAKENAAA".to_string()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IssuanceExhausted(6)));
        assert_eq!(calls, 6);
        assert_eq!(codes::Entity::find().count(&db).await.unwrap(), 1);
    }
}
