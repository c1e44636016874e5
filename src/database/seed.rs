use crate::entities::prize_entity as prizes;
use crate::error::AppResult;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

/// 默认奖品目录: (名称, 类型, 面值, 权重)
const DEFAULT_PRIZES: &[(&str, &str, Option<&str>, i32)] = &[
    ("Free Cookie", "item", None, 40),
    ("10% Off", "discount", Some("10%"), 30),
    ("Free Coffee", "item", Some("$4"), 20),
    ("Half-Price Cake", "discount", Some("50%"), 9),
    ("Birthday Cake", "item", Some("$35"), 1),
];

/// 奖品表为空时写入默认奖品，返回写入数量
pub async fn seed_default_prizes(pool: &DatabaseConnection) -> AppResult<usize> {
    if prizes::Entity::find().count(pool).await? > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    for (name, prize_type, value, weight) in DEFAULT_PRIZES {
        prizes::ActiveModel {
            name: Set(name.to_string()),
            prize_type: Set(prize_type.to_string()),
            value: Set(value.map(str::to_string)),
            weight: Set(*weight),
            active: Set(true),
            icon_type: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(pool)
        .await?;
    }
    log::info!("Seeded {} default prizes", DEFAULT_PRIZES.len());
    Ok(DEFAULT_PRIZES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_test_db;

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let db = connect_test_db().await;
        assert_eq!(seed_default_prizes(&db).await.unwrap(), DEFAULT_PRIZES.len());
        assert_eq!(seed_default_prizes(&db).await.unwrap(), 0);
        assert_eq!(
            prizes::Entity::find().count(&db).await.unwrap() as usize,
            DEFAULT_PRIZES.len()
        );
    }
}
