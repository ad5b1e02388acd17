pub mod approval;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod grant;
pub mod lifecycle;
pub mod listing;
pub mod logging;
pub mod notification;
pub mod payment;
pub mod permission;
pub mod prefinancing;
pub mod service;
pub mod store;
pub mod types;
pub mod user;
pub mod utils;

pub use approval::{ApprovalSlot, ApprovalWorkflow, Approvals, SignError, Signable, SlotId, StagedApprovals};
pub use error::{LedgerError, LedgerResult};
pub use lifecycle::Status;
pub use service::{AdminService, LedgerService, Listing};
pub use store::{Repository, Versioned};
pub use user::{Actor, Profession, Role, User, UserProfile};
