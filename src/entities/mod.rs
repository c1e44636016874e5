pub mod codes;
pub mod participants;
pub mod prizes;
pub mod spins;

pub use codes::CodeStatus;

pub use codes as code_entity;
pub use participants as participant_entity;
pub use prizes as prize_entity;
pub use spins as spin_entity;
