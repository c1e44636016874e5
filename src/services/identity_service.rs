use crate::entities::participant_entity as participants;
use crate::error::{AppError, AppResult};
use crate::utils::{normalize_and_validate_phone, normalize_phone};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, SqlErr,
};

/// 由 (姓名, 手机号, 设备指纹) 解析参与者，不存在则创建
///
/// - 手机号与设备指纹分别命中不同参与者 -> Conflict
/// - 命中一个 -> 复用并回填空字段；设备指纹总是刷新为最新值
/// - 都未命中 -> 新建
///
/// 相同请求重放返回同一参与者且不产生写入。
pub async fn resolve_participant<C: ConnectionTrait>(
    db: &C,
    full_name: &str,
    phone: &str,
    device_fingerprint: &str,
    now: DateTime<Utc>,
) -> AppResult<participants::Model> {
    let full_name = full_name.trim();
    let device = device_fingerprint.trim();
    if full_name.is_empty() {
        return Err(AppError::ValidationError("Full name is required".into()));
    }
    if device.is_empty() {
        return Err(AppError::ValidationError(
            "Device fingerprint is required".into(),
        ));
    }
    let phone = normalize_and_validate_phone(phone)?;

    let by_phone = find_by_phone(db, &phone).await?;
    let by_device = find_by_device(db, device).await?;

    let existing = match (by_phone, by_device) {
        (Some(a), Some(b)) if a.id != b.id => {
            return Err(AppError::Conflict(
                "Phone belongs to a different participant".into(),
            ));
        }
        (Some(a), _) => Some(a),
        (None, b) => b,
    };

    let result = match existing {
        Some(participant) => backfill(db, participant, full_name, &phone, device, now).await,
        None => {
            participants::ActiveModel {
                full_name: Set(full_name.to_string()),
                phone: Set(Some(phone)),
                device_fingerprint: Set(Some(device.to_string())),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await
        }
    };

    result.map_err(|e| match e.sql_err() {
        // 并发请求抢先写入了同一手机号 / 设备
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Participant identity changed concurrently, please retry".into())
        }
        _ => AppError::DatabaseError(e),
    })
}

/// 状态查询用：优先按手机号，其次按设备指纹，不创建
pub async fn find_participant<C: ConnectionTrait>(
    db: &C,
    phone: Option<&str>,
    device_fingerprint: Option<&str>,
) -> AppResult<Option<participants::Model>> {
    let phone = phone.map(normalize_phone).filter(|p| !p.is_empty());
    if let Some(phone) = phone
        && let Some(found) = find_by_phone(db, &phone).await?
    {
        return Ok(Some(found));
    }

    match device_fingerprint.map(str::trim).filter(|d| !d.is_empty()) {
        Some(device) => Ok(find_by_device(db, device).await?),
        None => Ok(None),
    }
}

async fn find_by_phone<C: ConnectionTrait>(
    db: &C,
    phone: &str,
) -> Result<Option<participants::Model>, DbErr> {
    participants::Entity::find()
        .filter(participants::Column::Phone.eq(phone))
        .one(db)
        .await
}

async fn find_by_device<C: ConnectionTrait>(
    db: &C,
    device: &str,
) -> Result<Option<participants::Model>, DbErr> {
    participants::Entity::find()
        .filter(participants::Column::DeviceFingerprint.eq(device))
        .one(db)
        .await
}

async fn backfill<C: ConnectionTrait>(
    db: &C,
    participant: participants::Model,
    full_name: &str,
    phone: &str,
    device: &str,
    now: DateTime<Utc>,
) -> Result<participants::Model, DbErr> {
    let mut changed = false;
    let mut am = participant.clone().into_active_model();

    if participant.full_name.trim().is_empty() {
        am.full_name = Set(full_name.to_string());
        changed = true;
    }
    if participant.phone.as_deref().is_none_or(str::is_empty) {
        am.phone = Set(Some(phone.to_string()));
        changed = true;
    }
    if participant.device_fingerprint.as_deref() != Some(device) {
        am.device_fingerprint = Set(Some(device.to_string()));
        changed = true;
    }

    if !changed {
        return Ok(participant);
    }
    am.updated_at = Set(now);
    am.update(db).await
}
