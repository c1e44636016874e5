pub mod code_generator;
pub mod jwt;
pub mod login_throttle;
pub mod password;
pub mod phone;

pub use code_generator::{CODE_ALPHABET, generate_redemption_code, normalize_code};
pub use jwt::*;
pub use login_throttle::LoginThrottle;
pub use password::AdminCredentials;
pub use phone::*;
