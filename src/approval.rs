//! Sequential three party signature workflow shared by payments and prefinancings.
//!
//! Each signable record carries three slots filled in order: the grant coordinator
//! (`supervisor1`), the accountant (`supervisor2`) and the national coordinator
//! (`finalApproval`). A slot goes from unsigned to signed exactly once. The final slot can
//! only be signed on a persisted record whose two supervisor slots are already signed, and
//! signing it approves the record.
//!
//! Signing requires both the role level `sign` action on the record's module and the
//! profession bound to the slot.
use std::marker::PhantomData;

use chrono::Utc;
use tracing::{debug, info};

use crate::lifecycle::Status;
use crate::permission::actions;
use crate::types::{Amount, TimeStamp};
use crate::user::{Actor, Profession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    Supervisor1,
    Supervisor2,
    FinalApproval,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [
        SlotId::Supervisor1,
        SlotId::Supervisor2,
        SlotId::FinalApproval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotId::Supervisor1 => "supervisor1",
            SlotId::Supervisor2 => "supervisor2",
            SlotId::FinalApproval => "finalApproval",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        SlotId::ALL.into_iter().find(|slot| slot.as_str() == raw)
    }

    pub fn required_profession(&self) -> Profession {
        match self {
            SlotId::Supervisor1 => Profession::GrantCoordinator,
            SlotId::Supervisor2 => Profession::Accountant,
            SlotId::FinalApproval => Profession::NationalCoordinator,
        }
    }

    /// The slot a profession may fill, if any.
    pub fn for_profession(profession: &Profession) -> Option<Self> {
        SlotId::ALL
            .into_iter()
            .find(|slot| slot.required_profession() == *profession)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct ApprovalSlot {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub signature: bool,
    #[n(2)]
    pub date: Option<TimeStamp<Utc>>,
    #[n(3)]
    pub observation: Option<String>,
}

impl ApprovalSlot {
    pub fn signed(name: &str, date: TimeStamp<Utc>, observation: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            signature: true,
            date: Some(date),
            observation: observation.filter(|o| !o.trim().is_empty()),
        }
    }

    /// A slot counts only once it is signed by someone with a name.
    pub fn is_complete(&self) -> bool {
        self.signature && !self.name.trim().is_empty()
    }
}

/// The fixed shape approvals record. Absent slots are unsigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Approvals {
    #[n(0)]
    supervisor1: Option<ApprovalSlot>,
    #[n(1)]
    supervisor2: Option<ApprovalSlot>,
    #[n(2)]
    final_approval: Option<ApprovalSlot>,
}

impl Approvals {
    pub fn get(&self, slot: SlotId) -> Option<&ApprovalSlot> {
        match slot {
            SlotId::Supervisor1 => self.supervisor1.as_ref(),
            SlotId::Supervisor2 => self.supervisor2.as_ref(),
            SlotId::FinalApproval => self.final_approval.as_ref(),
        }
    }

    pub fn is_signed(&self, slot: SlotId) -> bool {
        self.get(slot).is_some_and(|s| s.signature)
    }

    pub fn is_empty(&self) -> bool {
        SlotId::ALL.iter().all(|slot| self.get(*slot).is_none())
    }

    pub fn any_signed(&self) -> bool {
        SlotId::ALL.iter().any(|slot| self.is_signed(*slot))
    }

    /// Slots present in the record, in signing order.
    pub fn present(&self) -> Vec<(SlotId, &ApprovalSlot)> {
        SlotId::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|s| (slot, s)))
            .collect()
    }

    fn slot_mut(&mut self, slot: SlotId) -> &mut Option<ApprovalSlot> {
        match slot {
            SlotId::Supervisor1 => &mut self.supervisor1,
            SlotId::Supervisor2 => &mut self.supervisor2,
            SlotId::FinalApproval => &mut self.final_approval,
        }
    }
}

/// A record governed by the signature workflow.
pub trait Signable {
    /// Permission module that gates signing and status changes.
    const MODULE: &'static str;
    /// Human readable record kind for messages and logs.
    const KIND: &'static str;
    /// Whether the record moves on to `repaid` once paid.
    const REPAYABLE: bool;

    fn id(&self) -> &str;
    fn grant_id(&self) -> &str;
    fn amount(&self) -> Amount;
    fn approvals(&self) -> &Approvals;
    fn approvals_mut(&mut self) -> &mut Approvals;
    fn status(&self) -> Status;
    fn set_status(&mut self, status: Status);

    /// Amount still owed back. Only repayable records ever report a balance.
    fn outstanding_balance(&self) -> Amount {
        0
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("Not authorized: your role lacks the sign permission")]
    MissingSignPermission,
    #[error("Not authorized: only the {required} can sign {slot}")]
    ProfessionMismatch { slot: SlotId, required: Profession },
    #[error("Not authorized: {slot} is already signed")]
    AlreadySigned { slot: SlotId },
    #[error("Prior signatures missing: the record must be saved before the final approval")]
    NotPersisted,
    #[error("Prior signatures missing: both supervisors must sign before the final approval")]
    PriorSignaturesMissing,
}

impl SignError {
    /// True for signing order violations, false for plain authority failures.
    pub fn is_order_violation(&self) -> bool {
        matches!(self, SignError::NotPersisted | SignError::PriorSignaturesMissing)
    }
}

/// Signature rules for one kind of record.
#[derive(Debug)]
pub struct ApprovalWorkflow<T: Signable> {
    _record: PhantomData<fn(&T)>,
}

impl<T: Signable> Default for ApprovalWorkflow<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Signable> ApprovalWorkflow<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }

    /// Checks whether `actor` may sign `slot`. `record` is `None` for a draft that has not been
    /// created yet.
    pub fn can_sign(&self, record: Option<&T>, slot: SlotId, actor: &Actor) -> Result<(), SignError> {
        if !actor.can(T::MODULE, actions::SIGN) {
            return Err(SignError::MissingSignPermission);
        }

        let required = slot.required_profession();
        if actor.profession() != required {
            return Err(SignError::ProfessionMismatch { slot, required });
        }

        if record.is_some_and(|r| r.approvals().is_signed(slot)) {
            return Err(SignError::AlreadySigned { slot });
        }

        if slot == SlotId::FinalApproval {
            let Some(record) = record else {
                return Err(SignError::NotPersisted);
            };
            let approvals = record.approvals();
            if !approvals.is_signed(SlotId::Supervisor1) || !approvals.is_signed(SlotId::Supervisor2) {
                return Err(SignError::PriorSignaturesMissing);
            }
        }

        Ok(())
    }

    /// Signs `slot` on a persisted record. The final signature also approves the record.
    pub fn sign(
        &self,
        record: &mut T,
        slot: SlotId,
        actor: &Actor,
        observation: Option<String>,
        today: TimeStamp<Utc>,
    ) -> Result<(), SignError> {
        self.can_sign(Some(&*record), slot, actor)?;

        let signer = actor.user.full_name();
        *record.approvals_mut().slot_mut(slot) =
            Some(ApprovalSlot::signed(&signer, today, observation));

        if slot == SlotId::FinalApproval {
            record.set_status(Status::Approved);
        }

        info!(kind = T::KIND, id = record.id(), slot = %slot, signer = %signer, "signature recorded");
        Ok(())
    }

    /// Signs `slot` on a draft that has not been created yet.
    pub fn stage(
        &self,
        draft: &mut StagedApprovals,
        slot: SlotId,
        actor: &Actor,
        observation: Option<String>,
        today: TimeStamp<Utc>,
    ) -> Result<(), SignError> {
        self.can_sign(None, slot, actor)?;
        if draft.approvals.is_signed(slot) {
            return Err(SignError::AlreadySigned { slot });
        }

        let signer = actor.user.full_name();
        *draft.approvals.slot_mut(slot) = Some(ApprovalSlot::signed(&signer, today, observation));

        debug!(kind = T::KIND, slot = %slot, signer = %signer, "signature staged on draft");
        Ok(())
    }

    /// Re-stamps the slots a new record arrives with as signed by `actor` on `today`. Each slot
    /// must be one the actor could sign themselves. Submitted names and dates are not kept.
    pub fn attest_staged(&self, record: &mut T, actor: &Actor, today: TimeStamp<Utc>) -> Result<(), SignError> {
        let present: Vec<SlotId> = record.approvals().present().into_iter().map(|(slot, _)| slot).collect();
        for slot in &present {
            self.can_sign(None, *slot, actor)?;
        }

        let signer = actor.user.full_name();
        for slot in present {
            let entry = record.approvals_mut().slot_mut(slot);
            let observation = entry.take().and_then(|s| s.observation);
            *entry = Some(ApprovalSlot::signed(&signer, today.clone(), observation));
        }
        Ok(())
    }
}

/// Signatures collected on a draft before it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedApprovals {
    approvals: Approvals,
}

impl StagedApprovals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a raw slot as submitted by a form. Nothing is trusted here, the slot is filtered
    /// again by [`StagedApprovals::into_persisted`].
    pub fn with_raw_slot(mut self, slot: SlotId, value: ApprovalSlot) -> Self {
        *self.approvals.slot_mut(slot) = Some(value);
        self
    }

    pub fn get(&self, slot: SlotId) -> Option<&ApprovalSlot> {
        self.approvals.get(slot)
    }

    /// The approvals written at creation. Only signed slots with a signer name survive, and the
    /// final slot never does.
    pub fn into_persisted(self) -> Approvals {
        let keep = |slot: Option<ApprovalSlot>| slot.filter(ApprovalSlot::is_complete);

        Approvals {
            supervisor1: keep(self.approvals.supervisor1),
            supervisor2: keep(self.approvals.supervisor2),
            final_approval: None,
        }
    }
}
