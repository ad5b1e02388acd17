//! Error taxonomy. Every operation boundary returns [`LedgerError`], which callers turn into a
//! user facing notification.
use crate::approval::SignError;
use crate::lifecycle::Status;
use crate::types::{Amount, Balance};
use crate::user::Profession;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} is not a valid number: {raw}")]
    MalformedNumber { field: &'static str, raw: String },
    #[error("Amount must be greater than zero")]
    ZeroAmount,
    #[error("{field} of {amount} is above the largest supported amount")]
    AmountTooLarge { field: &'static str, amount: Amount },
    #[error("Amount {amount} exceeds the engagement amount {limit}")]
    ExceedsEngagement { amount: Amount, limit: Amount },
    #[error("Insufficient treasury, the balance after this payment would be {balance_after}")]
    InsufficientTreasury { balance_after: Balance },
    #[error("Repayment of {amount} exceeds the remaining balance of {remaining}")]
    RepaymentExceedsBalance { amount: Amount, remaining: Amount },
    #[error("{remaining} is still outstanding on this prefinancing")]
    OutstandingBalance { remaining: Amount },
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("Role is still assigned to {users} user(s)")]
    RoleInUse { users: usize },
    #[error("Engagement {engagement_id} does not belong to grant {grant_id}")]
    ForeignEngagement {
        engagement_id: String,
        grant_id: String,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error(transparent)]
    Sign(#[from] SignError),
    #[error("Missing permission '{action}' on module '{module}'")]
    MissingAction { module: String, action: String },
    #[error("Only the {required} may perform this action")]
    ProfessionRequired { required: Profession },
    #[error("Approval is granted by the final signature, not by a status change")]
    ApprovalRequiresSignature,
    #[error("This record has been signed or paid and can no longer be deleted")]
    Immutable,
    #[error("Users cannot delete their own account")]
    SelfDelete,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("Someone else just modified {entity} {id}, reload it before retrying")]
    StaleRecord { entity: &'static str, id: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{message}")]
    Duplicate {
        constraint: &'static str,
        message: &'static str,
    },
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Corrupt record: {0}")]
    Codec(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub const USERS_EMAIL_KEY: &str = "users_email_key";
pub const ROLES_CODE_KEY: &str = "roles_code_key";
pub const BANK_ACCOUNTS_NUMBER_KEY: &str = "bank_accounts_account_number_key";
pub const PAYMENTS_NUMBER_KEY: &str = "payments_number_key";
pub const PREFINANCINGS_NUMBER_KEY: &str = "prefinancings_number_key";

impl BackendError {
    /// Maps a violated unique constraint to a readable message. Unknown constraints keep the raw
    /// message.
    pub fn from_constraint(constraint: &str, raw: &str) -> Self {
        let known = match constraint {
            USERS_EMAIL_KEY => Some((USERS_EMAIL_KEY, "An account with this email already exists")),
            ROLES_CODE_KEY => Some((ROLES_CODE_KEY, "A role with this code already exists")),
            BANK_ACCOUNTS_NUMBER_KEY => Some((
                BANK_ACCOUNTS_NUMBER_KEY,
                "A bank account with this account number already exists",
            )),
            PAYMENTS_NUMBER_KEY => Some((PAYMENTS_NUMBER_KEY, "A payment with this number already exists")),
            PREFINANCINGS_NUMBER_KEY => Some((
                PREFINANCINGS_NUMBER_KEY,
                "A prefinancing with this number already exists",
            )),
            _ => None,
        };

        match known {
            Some((constraint, message)) => BackendError::Duplicate { constraint, message },
            None => BackendError::Storage(raw.to_string()),
        }
    }
}

impl From<sled::Error> for BackendError {
    fn from(err: sled::Error) -> Self {
        BackendError::Storage(err.to_string())
    }
}

impl From<minicbor::decode::Error> for BackendError {
    fn from(err: minicbor::decode::Error) -> Self {
        BackendError::Codec(err.to_string())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid recovery link: {0}")]
    InvalidRecoveryToken(String),
    #[error("The recovery link has expired")]
    ExpiredRecoveryToken,
    #[error("No active session")]
    NoSession,
    #[error("Authentication service error: {0}")]
    Backend(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<SignError> for LedgerError {
    fn from(err: SignError) -> Self {
        LedgerError::Permission(PermissionError::Sign(err))
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Backend(err.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
