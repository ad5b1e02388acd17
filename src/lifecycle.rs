//! Status lifecycle of signable records.
//!
//! `approved` is reached only through the final signature, see [`crate::approval`]. The manual
//! transitions are:
//!
//! | from       | to         | who                      | extra condition            |
//! |------------|------------|--------------------------|----------------------------|
//! | `pending`  | `rejected` | national coordinator     |                            |
//! | `approved` | `paid`     | accountant               |                            |
//! | `paid`     | `repaid`   | accountant               | repayable, fully repaid    |
//!
//! Every manual transition also needs the `approve` action on the record's module.
use tracing::{info, warn};

use crate::approval::Signable;
use crate::error::{LedgerError, PermissionError, ValidationError};
use crate::permission::actions;
use crate::user::{Actor, Profession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, minicbor::Encode, minicbor::Decode)]
pub enum Status {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Paid,
    #[n(3)]
    Repaid,
    #[n(4)]
    Rejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Paid => "paid",
            Status::Repaid => "repaid",
            Status::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "approved" => Some(Status::Approved),
            "paid" => Some(Status::Paid),
            "repaid" => Some(Status::Repaid),
            "rejected" => Some(Status::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn require_profession(actor: &Actor, required: Profession) -> Result<(), PermissionError> {
    if actor.profession() != required {
        return Err(PermissionError::ProfessionRequired { required });
    }
    Ok(())
}

/// Checks a manual status change without applying it.
pub fn check_transition<T: Signable>(record: &T, to: Status, actor: &Actor) -> Result<(), LedgerError> {
    let from = record.status();

    if to == Status::Approved {
        return Err(PermissionError::ApprovalRequiresSignature.into());
    }
    if !actor.can(T::MODULE, actions::APPROVE) {
        return Err(PermissionError::MissingAction {
            module: T::MODULE.to_string(),
            action: actions::APPROVE.to_string(),
        }
        .into());
    }

    match (from, to) {
        (Status::Pending, Status::Rejected) => {
            require_profession(actor, Profession::NationalCoordinator)?;
        }
        (Status::Approved, Status::Paid) => {
            require_profession(actor, Profession::Accountant)?;
        }
        (Status::Paid, Status::Repaid) if T::REPAYABLE => {
            require_profession(actor, Profession::Accountant)?;
            let remaining = record.outstanding_balance();
            if remaining > 0 {
                return Err(ValidationError::OutstandingBalance { remaining }.into());
            }
        }
        _ => return Err(ValidationError::InvalidTransition { from, to }.into()),
    }

    Ok(())
}

/// Applies a manual status change after [`check_transition`] passes.
pub fn transition<T: Signable>(record: &mut T, to: Status, actor: &Actor) -> Result<(), LedgerError> {
    let from = record.status();
    if let Err(err) = check_transition(record, to, actor) {
        warn!(kind = T::KIND, id = record.id(), %from, %to, error = %err, "status change refused");
        return Err(err);
    }

    record.set_status(to);
    info!(kind = T::KIND, id = record.id(), %from, %to, actor = actor.id(), "status changed");
    Ok(())
}

/// Statuses the actor could move the record to right now, for driving the available actions.
pub fn available_transitions<T: Signable>(record: &T, actor: &Actor) -> Vec<Status> {
    [Status::Rejected, Status::Paid, Status::Repaid]
        .into_iter()
        .filter(|to| check_transition(record, *to, actor).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::Approvals;
    use crate::permission::Permission;
    use crate::types::Amount;
    use crate::user::{ACCOUNTANT, GRANT_COORDINATOR, NATIONAL_COORDINATOR, Role, User, UserProfile};

    struct Advance {
        status: Status,
        outstanding: Amount,
        approvals: Approvals,
    }

    impl Signable for Advance {
        const MODULE: &'static str = "prefinancings";
        const KIND: &'static str = "advance";
        const REPAYABLE: bool = true;

        fn id(&self) -> &str {
            "a1"
        }
        fn grant_id(&self) -> &str {
            "g1"
        }
        fn amount(&self) -> Amount {
            1_000
        }
        fn approvals(&self) -> &Approvals {
            &self.approvals
        }
        fn approvals_mut(&mut self) -> &mut Approvals {
            &mut self.approvals
        }
        fn status(&self) -> Status {
            self.status
        }
        fn set_status(&mut self, status: Status) {
            self.status = status;
        }
        fn outstanding_balance(&self) -> Amount {
            self.outstanding
        }
    }

    fn advance(status: Status) -> Advance {
        Advance {
            status,
            outstanding: 0,
            approvals: Approvals::default(),
        }
    }

    fn actor(profession: &str, grant: &[&str]) -> Actor {
        let mut role = Role::new("r", "R", vec![Permission::new("prefinancings", grant.iter().copied())]);
        role.id = "role_1".into();
        let profile = UserProfile {
            profession: profession.into(),
            ..UserProfile::default()
        };
        Actor::new(User::new("x@example.org", profile, "role_1"), &role)
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!(Status::parse(" PAID "), Some(Status::Paid));
        assert_eq!(Status::parse("cashed"), None);
    }

    #[test]
    fn manual_approval_is_refused() {
        let record = advance(Status::Pending);
        let err = check_transition(&record, Status::Approved, &actor(NATIONAL_COORDINATOR, &["approve"])).unwrap_err();
        assert_eq!(err, LedgerError::from(PermissionError::ApprovalRequiresSignature));
    }

    #[test]
    fn only_national_coordinator_rejects() {
        let mut record = advance(Status::Pending);
        assert!(transition(&mut record, Status::Rejected, &actor(ACCOUNTANT, &["approve"])).is_err());
        assert_eq!(record.status, Status::Pending);

        transition(&mut record, Status::Rejected, &actor(NATIONAL_COORDINATOR, &["approve"])).unwrap();
        assert_eq!(record.status, Status::Rejected);
    }

    #[test]
    fn role_gate_applies_to_status_changes() {
        let record = advance(Status::Approved);
        let err = check_transition(&record, Status::Paid, &actor(ACCOUNTANT, &["view"])).unwrap_err();
        assert!(matches!(err, LedgerError::Permission(PermissionError::MissingAction { .. })));
    }

    #[test]
    fn only_accountant_pays() {
        let mut record = advance(Status::Approved);
        assert!(transition(&mut record, Status::Paid, &actor(GRANT_COORDINATOR, &["approve"])).is_err());
        transition(&mut record, Status::Paid, &actor(ACCOUNTANT, &["approve"])).unwrap();
        assert_eq!(record.status, Status::Paid);
    }

    #[test]
    fn repaid_needs_a_settled_ledger() {
        let mut record = advance(Status::Paid);
        record.outstanding = 250;
        let err = check_transition(&record, Status::Repaid, &actor(ACCOUNTANT, &["approve"])).unwrap_err();
        assert_eq!(err, LedgerError::from(ValidationError::OutstandingBalance { remaining: 250 }));

        record.outstanding = 0;
        transition(&mut record, Status::Repaid, &actor(ACCOUNTANT, &["approve"])).unwrap();
        assert_eq!(record.status, Status::Repaid);
    }

    #[test]
    fn rejecting_after_approval_is_invalid() {
        let record = advance(Status::Approved);
        let err = check_transition(&record, Status::Rejected, &actor(NATIONAL_COORDINATOR, &["approve"])).unwrap_err();
        assert_eq!(
            err,
            LedgerError::from(ValidationError::InvalidTransition {
                from: Status::Approved,
                to: Status::Rejected
            })
        );
    }

    #[test]
    fn available_transitions_follow_the_table() {
        let accountant = actor(ACCOUNTANT, &["approve"]);
        assert_eq!(available_transitions(&advance(Status::Approved), &accountant), vec![Status::Paid]);
        assert_eq!(available_transitions(&advance(Status::Paid), &accountant), vec![Status::Repaid]);
        assert!(available_transitions(&advance(Status::Pending), &accountant).is_empty());
    }
}
