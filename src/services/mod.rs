pub mod admin_auth_service;
pub mod analytics_service;
pub mod code_issuer;
pub mod identity_service;
pub mod prize_catalog_service;
pub mod redemption_service;
pub mod spin_service;

pub use admin_auth_service::AdminAuthService;
pub use analytics_service::AnalyticsService;
pub use code_issuer::{CodeDraft, CodeIssuer};
pub use identity_service::{find_participant, resolve_participant};
pub use prize_catalog_service::PrizeCatalogService;
pub use redemption_service::RedemptionService;
pub use spin_service::SpinService;
