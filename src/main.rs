use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use spin_wheel_backend::{
    AppState,
    config::Config,
    database::{create_pool, run_migrations, seed_default_prizes},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 奖品表为空时写入默认奖品
    if config.database.seed_default_prizes {
        seed_default_prizes(&pool)
            .await
            .expect("Failed to seed default prizes");
    }

    let state = AppState::new(pool, &config);
    let cors_config = config.cors.clone();

    log::info!(
        "Starting HTTP server at {}:{} (cooldown {}s, code ttl {}s, immediate respin {})",
        config.server.host,
        config.server.port,
        config.wheel.cooldown_secs,
        config.wheel.code_ttl_secs,
        config.wheel.immediate_respin_after_expiry,
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(state.jwt_service.clone()))
            .wrap(create_cors(&cors_config))
            .configure(|cfg| state.configure(cfg))
            .configure(swagger_config)
            .service(web::scope("/api").configure(handlers::api_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
