use sea_orm_migration::prelude::*;

/// Participants (参与者，按手机号 / 设备指纹识别)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    FullName,
    Phone,
    DeviceFingerprint,
    CreatedAt,
    UpdatedAt,
}

/// Prizes (奖品配置表)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    Name,
    PrizeType,
    Value,
    Weight,
    Active,
    IconType,
    CreatedAt,
    UpdatedAt,
}

/// Spins (抽奖审计记录，只增不改)
#[derive(DeriveIden)]
enum Spins {
    Table,
    Id,
    ParticipantId,
    PrizeId,
    DeviceFingerprint,
    CreatedAt,
}

/// Codes (兑换码)
#[derive(DeriveIden)]
enum Codes {
    Table,
    Id,
    ParticipantId,
    PrizeId,
    Code,
    IssuedAt,
    ExpiresAt,
    RedeemedAt,
    RedeemedBy,
    Status,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::FullName)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Participants::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(Participants::DeviceFingerprint)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 手机号与设备指纹都是备用键
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_phone_unique")
                    .table(Participants::Table)
                    .col(Participants::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_device_unique")
                    .table(Participants::Table)
                    .col(Participants::DeviceFingerprint)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Prizes::PrizeType).string_len(64).not_null())
                    .col(ColumnDef::new(Prizes::Value).string_len(255).null())
                    .col(
                        ColumnDef::new(Prizes::Weight)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Prizes::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Prizes::IconType).string_len(64).null())
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 外键不加 ON DELETE CASCADE，保证历史记录仍然存在
        manager
            .create_table(
                Table::create()
                    .table(Spins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Spins::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Spins::ParticipantId).integer().not_null())
                    .col(ColumnDef::new(Spins::PrizeId).integer().not_null())
                    .col(
                        ColumnDef::new(Spins::DeviceFingerprint)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Spins::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_spins_participant")
                            .from(Spins::Table, Spins::ParticipantId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_spins_prize")
                            .from(Spins::Table, Spins::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spins_participant_created")
                    .table(Spins::Table)
                    .col(Spins::ParticipantId)
                    .col(Spins::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Codes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Codes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Codes::ParticipantId).integer().not_null())
                    .col(ColumnDef::new(Codes::PrizeId).integer().not_null())
                    .col(ColumnDef::new(Codes::Code).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Codes::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Codes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Codes::RedeemedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Codes::RedeemedBy).string_len(64).null())
                    .col(
                        ColumnDef::new(Codes::Status)
                            .string_len(16)
                            .not_null()
                            .default("issued"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_codes_participant")
                            .from(Codes::Table, Codes::ParticipantId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_codes_prize")
                            .from(Codes::Table, Codes::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 兑换码全局唯一：并发冲突由该约束转为可检测的错误
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_codes_code_unique")
                    .table(Codes::Table)
                    .col(Codes::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_codes_participant_issued")
                    .table(Codes::Table)
                    .col(Codes::ParticipantId)
                    .col(Codes::IssuedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：兑换码 -> 抽奖记录 -> 奖品 -> 参与者
        manager
            .drop_table(Table::drop().if_exists().table(Codes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Spins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
