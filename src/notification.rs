//! Pending work per profession: the records waiting on the current user's signature.
use crate::approval::{Signable, SlotId};
use crate::user::Profession;

/// Records awaiting a signature from `profession`, optionally restricted to one grant.
///
/// The grant coordinator and the accountant see every record whose own slot is still unsigned.
/// The national coordinator only sees records where both supervisors have signed and the final
/// slot is open. Any other profession has nothing pending.
pub fn pending_for_profession<'a, T: Signable>(
    records: &'a [T],
    profession: &Profession,
    grant_id: Option<&str>,
) -> Vec<&'a T> {
    let Some(slot) = SlotId::for_profession(profession) else {
        return Vec::new();
    };

    records
        .iter()
        .filter(|record| grant_id.is_none_or(|grant| record.grant_id() == grant))
        .filter(|record| awaits(*record, slot))
        .collect()
}

fn awaits<T: Signable>(record: &T, slot: SlotId) -> bool {
    let approvals = record.approvals();
    match slot {
        SlotId::Supervisor1 | SlotId::Supervisor2 => !approvals.is_signed(slot),
        SlotId::FinalApproval => {
            approvals.is_signed(SlotId::Supervisor1)
                && approvals.is_signed(SlotId::Supervisor2)
                && !approvals.is_signed(SlotId::FinalApproval)
        }
    }
}

pub fn pending_count<T: Signable>(records: &[T], profession: &Profession, grant_id: Option<&str>) -> usize {
    pending_for_profession(records, profession, grant_id).len()
}
