pub mod application;
pub mod config;
pub mod session;

pub use application::{ApplicationProfile, Criticality, TicketRecord};
pub use config::{AssessmentSettings, Config, DataConfig};
pub use session::{
    AssessmentSession, ManagerViewRow, ScoreResult, SelfRating, SessionId, SessionState,
    SessionStatus, Transition,
};
