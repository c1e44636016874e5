use crate::engine::{SpinDecision, SpinPolicy, draw_prize};
use crate::entities::{
    CodeStatus, code_entity as codes, participant_entity as participants,
    prize_entity as prizes, spin_entity as spins,
};
use crate::error::{AppError, AppResult};
use crate::external::{RewardNotice, TwilioService};
use crate::models::{SpinOutcome, SpinRequest, SpinResult, StatusRequest};
use crate::services::code_issuer::{CodeDraft, CodeIssuer};
use crate::services::identity_service::{find_participant, resolve_participant};
use crate::utils::normalize_phone;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct SpinService {
    pool: DatabaseConnection,
    policy: SpinPolicy,
    issuer: CodeIssuer,
    notifier: TwilioService,
}

impl SpinService {
    pub fn new(
        pool: DatabaseConnection,
        policy: SpinPolicy,
        issuer: CodeIssuer,
        notifier: TwilioService,
    ) -> Self {
        Self {
            pool,
            policy,
            issuer,
            notifier,
        }
    }

    pub fn policy(&self) -> &SpinPolicy {
        &self.policy
    }

    /// 抽奖 (Spin)
    pub async fn spin(&self, req: SpinRequest) -> AppResult<SpinResult> {
        self.spin_at(req, Utc::now()).await
    }

    /// 抽奖，整个流程在一个事务内完成:
    /// 1. 解析 / 创建参与者
    /// 2. 读取最近的兑换码与抽奖记录，交给策略引擎判定
    /// 3. 刚过期的码写回 expired (条件更新，只生效一次)
    /// 4. 允许抽奖时：按权重抽取 -> 写抽奖记录 -> 发码
    /// 5. 提交后异步发送中奖短信
    pub async fn spin_at(&self, req: SpinRequest, now: DateTime<Utc>) -> AppResult<SpinResult> {
        let txn = self.pool.begin().await?;

        let participant = resolve_participant(
            &txn,
            &req.full_name,
            &req.phone,
            &req.device_fingerprint,
            now,
        )
        .await?;

        let latest_code = latest_code(&txn, participant.id).await?;
        let latest_spin = latest_spin(&txn, participant.id).await?;
        let evaluation = self
            .policy
            .evaluate(now, latest_code.as_ref(), latest_spin.as_ref());

        if let Some(code_id) = evaluation.lapsed_code_id {
            mark_code_expired(&txn, code_id).await?;
        }

        let result = match evaluation.decision {
            SpinDecision::Draw => {
                let (code, prize, active) = self
                    .draw_and_issue(&txn, &participant, req.device_fingerprint.trim(), now)
                    .await?;
                SpinResult::new(SpinOutcome::New, "Congratulations!")
                    .with_code(&code, Some(&prize))
                    .with_wedge(&active)
            }
            decision => describe_decision(&txn, decision).await?,
        };

        txn.commit().await?;

        if result.status == SpinOutcome::New {
            self.notify(&participant, &result);
        }
        Ok(result)
    }

    /// 状态查询 (只读)
    pub async fn status(&self, req: StatusRequest) -> AppResult<SpinResult> {
        self.status_at(req, Utc::now()).await
    }

    /// 与 spin 相同的判定顺序，但不抽奖、不写库；
    /// 过期码只在响应中体现为 expired，写回由下一次 spin / 兑换完成
    pub async fn status_at(&self, req: StatusRequest, now: DateTime<Utc>) -> AppResult<SpinResult> {
        let phone = req
            .phone
            .as_deref()
            .map(normalize_phone)
            .filter(|p| !p.is_empty());
        let device = req
            .device_fingerprint
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        if phone.is_none() && device.is_none() {
            return Err(AppError::ValidationError(
                "Phone or device fingerprint is required".into(),
            ));
        }

        let Some(participant) = find_participant(&self.pool, phone.as_deref(), device).await?
        else {
            return Ok(no_history());
        };

        let latest_code = latest_code(&self.pool, participant.id).await?;
        let latest_spin = latest_spin(&self.pool, participant.id).await?;
        if latest_code.is_none() && latest_spin.is_none() {
            return Ok(no_history());
        }

        let evaluation = self
            .policy
            .evaluate(now, latest_code.as_ref(), latest_spin.as_ref());

        match evaluation.decision {
            SpinDecision::Draw => match latest_code {
                // 立即重抽策略下过期码不再阻塞，但仍告知用户上一个码已过期
                Some(code) if code.is_lapsed_at(now) => {
                    let mut result = SpinResult::new(
                        SpinOutcome::Expired,
                        "Your last code expired. You can spin again.",
                    );
                    result.expires_at = Some(code.expires_at);
                    Ok(result)
                }
                _ => Ok(SpinResult::new(SpinOutcome::None, "You can spin now.")),
            },
            decision => describe_decision(&self.pool, decision).await,
        }
    }

    /// 启用奖品 (按 id 升序，与转盘扇区顺序一致)
    pub async fn active_prizes(&self) -> AppResult<Vec<prizes::Model>> {
        Ok(active_prizes(&self.pool).await?)
    }

    async fn draw_and_issue(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        participant: &participants::Model,
        device_fingerprint: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(codes::Model, prizes::Model, Vec<prizes::Model>)> {
        let active = active_prizes(txn).await?;
        let prize = draw_prize(&active)?.clone();

        spins::ActiveModel {
            participant_id: Set(participant.id),
            prize_id: Set(prize.id),
            device_fingerprint: Set(Some(device_fingerprint.to_string())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let code = self
            .issuer
            .issue(
                txn,
                CodeDraft {
                    participant_id: participant.id,
                    prize_id: prize.id,
                    issued_at: now,
                    expires_at: self.policy.code_expiry(now),
                },
            )
            .await?;

        log::info!(
            "Participant {} won prize {} with code {}",
            participant.id,
            prize.id,
            code.code
        );
        Ok((code, prize, active))
    }

    fn notify(&self, participant: &participants::Model, result: &SpinResult) {
        let (Some(phone), Some(code), Some(expires_at)) = (
            participant.phone.clone(),
            result.code.clone(),
            result.expires_at,
        ) else {
            return;
        };
        self.notifier.notify_reward(RewardNotice {
            phone,
            code,
            prize_name: result.prize_name.clone().unwrap_or_default(),
            expires_at,
        });
    }
}

fn no_history() -> SpinResult {
    SpinResult::new(SpinOutcome::None, "No spins or codes found.")
}

/// 把非抽奖判定转换为响应，spin 与 status 共用
async fn describe_decision<C: ConnectionTrait>(
    db: &C,
    decision: SpinDecision,
) -> AppResult<SpinResult> {
    let result = match decision {
        SpinDecision::ExistingActive(code) => {
            let prize = prizes::Entity::find_by_id(code.prize_id).one(db).await?;
            let active = active_prizes(db).await?;
            SpinResult::new(
                SpinOutcome::ExistingActive,
                "You already have an active code.",
            )
            .with_code(&code, prize.as_ref())
            .with_wedge(&active)
        }
        SpinDecision::AlreadyRedeemed {
            redeemed_at,
            next_spin_at,
        } => {
            let mut result = SpinResult::new(
                SpinOutcome::AlreadyRedeemed,
                "Your code was already redeemed.",
            );
            result.redeemed_at = redeemed_at;
            result.next_spin_at = Some(next_spin_at);
            result
        }
        SpinDecision::Expired {
            expires_at,
            next_spin_at,
        } => {
            let mut result = SpinResult::new(SpinOutcome::Expired, "Your code has expired.");
            result.expires_at = Some(expires_at);
            result.next_spin_at = Some(next_spin_at);
            result
        }
        SpinDecision::Cooldown { next_spin_at } => {
            let mut result =
                SpinResult::new(SpinOutcome::Cooldown, "Please wait before spinning again.");
            result.next_spin_at = Some(next_spin_at);
            result
        }
        SpinDecision::Draw => SpinResult::new(SpinOutcome::None, "You can spin now."),
    };
    Ok(result)
}

async fn latest_code<C: ConnectionTrait>(
    db: &C,
    participant_id: i32,
) -> Result<Option<codes::Model>, DbErr> {
    codes::Entity::find()
        .filter(codes::Column::ParticipantId.eq(participant_id))
        .order_by_desc(codes::Column::IssuedAt)
        .order_by_desc(codes::Column::Id)
        .one(db)
        .await
}

async fn latest_spin<C: ConnectionTrait>(
    db: &C,
    participant_id: i32,
) -> Result<Option<spins::Model>, DbErr> {
    spins::Entity::find()
        .filter(spins::Column::ParticipantId.eq(participant_id))
        .order_by_desc(spins::Column::CreatedAt)
        .order_by_desc(spins::Column::Id)
        .one(db)
        .await
}

async fn active_prizes<C: ConnectionTrait>(db: &C) -> Result<Vec<prizes::Model>, DbErr> {
    prizes::Entity::find()
        .filter(prizes::Column::Active.eq(true))
        .order_by_asc(prizes::Column::Id)
        .all(db)
        .await
}

/// 惰性过期写回：只有仍为 issued 的行会被更新
pub(crate) async fn mark_code_expired<C: ConnectionTrait>(
    db: &C,
    code_id: i32,
) -> Result<bool, DbErr> {
    let res = codes::Entity::update_many()
        .set(codes::ActiveModel {
            status: Set(CodeStatus::Expired),
            ..Default::default()
        })
        .filter(codes::Column::Id.eq(code_id))
        .filter(codes::Column::Status.eq(CodeStatus::Issued))
        .exec(db)
        .await?;
    if res.rows_affected > 0 {
        log::info!("Code {code_id} marked expired");
    }
    Ok(res.rows_affected > 0)
}
