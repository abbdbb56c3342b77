//! Contracts for the collaborators around the cart engine. Only the seams
//! live here; network clients for them are out of this crate.

pub mod chat;
pub mod diagnosis;
pub mod orders;

pub use chat::{ask_assistant, ChatError, ChatService};
pub use diagnosis::{Diagnosis, DiagnosisError, DiagnosisRequest, DiagnosisService};
pub use orders::{LoggingOrderDesk, OrderPlacement, OrderPlacementError};
