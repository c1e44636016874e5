pub mod twilio;

pub use twilio::{RewardNotice, TwilioService};
