use crate::entities::{CodeStatus, code_entity as codes, spin_entity as spins};
use chrono::{DateTime, Duration, Utc};

/// 过期未兑换后是否允许立即重新抽奖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespinPolicy {
    /// 过期后仍需等待冷却结束
    AfterCooldown,
    /// 过期后立即允许重新抽奖，跳过冷却
    ImmediateOnExpiry,
}

/// 一次抽奖 / 状态查询的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinDecision {
    /// 已有未过期的兑换码，原样返回，不再抽奖
    ExistingActive(codes::Model),
    /// 上一个码已兑换且仍在冷却期
    AlreadyRedeemed {
        redeemed_at: Option<DateTime<Utc>>,
        next_spin_at: DateTime<Utc>,
    },
    /// 上一个码已过期且仍在冷却期
    Expired {
        expires_at: DateTime<Utc>,
        next_spin_at: DateTime<Utc>,
    },
    /// 无有效码，但距上次抽奖未满冷却时间
    Cooldown { next_spin_at: DateTime<Utc> },
    /// 允许抽奖
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: SpinDecision,
    /// 刚跨过过期边界、仍是 issued 状态的码，调用方负责写回一次 expired
    pub lapsed_code_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinPolicy {
    cooldown: Duration,
    code_ttl: Duration,
    respin: RespinPolicy,
}

impl SpinPolicy {
    pub fn new(cooldown: Duration, code_ttl: Duration, respin: RespinPolicy) -> Self {
        Self {
            cooldown,
            code_ttl,
            respin,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn code_ttl(&self) -> Duration {
        self.code_ttl
    }

    pub fn respin(&self) -> RespinPolicy {
        self.respin
    }

    /// 新发兑换码的过期时间
    pub fn code_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.code_ttl
    }

    /// 最近一次抽奖 + 冷却时间
    pub fn next_spin_at(&self, latest_spin: Option<&spins::Model>) -> Option<DateTime<Utc>> {
        latest_spin.map(|s| s.created_at + self.cooldown)
    }

    /// 按优先级依次判定，命中第一条即返回:
    /// 1. 有效码 -> ExistingActive
    /// 2. 已兑换且在冷却期 -> AlreadyRedeemed (冷却已过则继续往下)
    /// 3. 已过期 -> 标记需写回 expired；ImmediateOnExpiry 直接允许抽奖，否则在冷却期返回 Expired
    /// 4. 冷却期内 -> Cooldown
    /// 5. 其它 -> Draw
    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        latest_code: Option<&codes::Model>,
        latest_spin: Option<&spins::Model>,
    ) -> Evaluation {
        let next_spin_at = self.next_spin_at(latest_spin);
        let cooling_until = next_spin_at.filter(|next| now < *next);

        let mut lapsed_code_id = None;

        if let Some(code) = latest_code {
            if code.is_active_at(now) {
                return Evaluation {
                    decision: SpinDecision::ExistingActive(code.clone()),
                    lapsed_code_id: None,
                };
            }

            if code.status == CodeStatus::Redeemed
                && let Some(next) = cooling_until
            {
                return Evaluation {
                    decision: SpinDecision::AlreadyRedeemed {
                        redeemed_at: code.redeemed_at,
                        next_spin_at: next,
                    },
                    lapsed_code_id: None,
                };
            }

            if code.is_lapsed_at(now) {
                if code.status == CodeStatus::Issued {
                    lapsed_code_id = Some(code.id);
                }
                match self.respin {
                    RespinPolicy::ImmediateOnExpiry => {
                        return Evaluation {
                            decision: SpinDecision::Draw,
                            lapsed_code_id,
                        };
                    }
                    RespinPolicy::AfterCooldown => {
                        if let Some(next) = cooling_until {
                            return Evaluation {
                                decision: SpinDecision::Expired {
                                    expires_at: code.expires_at,
                                    next_spin_at: next,
                                },
                                lapsed_code_id,
                            };
                        }
                    }
                }
            }
        }

        let decision = match cooling_until {
            Some(next) => SpinDecision::Cooldown { next_spin_at: next },
            None => SpinDecision::Draw,
        };
        Evaluation {
            decision,
            lapsed_code_id,
        }
    }
}
