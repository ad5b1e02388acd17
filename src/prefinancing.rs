//! Prefinancing advances and their repayment ledger
use chrono::Utc;

use crate::approval::{Approvals, Signable, StagedApprovals};
use crate::error::{LedgerError, PREFINANCINGS_NUMBER_KEY, ValidationError};
use crate::lifecycle::Status;
use crate::listing::{Listable, SortKey};
use crate::permission::modules;
use crate::store::Record;
use crate::types::{Amount, TimeStamp, parse_amount};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Repayment {
    #[n(0)]
    pub date: TimeStamp<Utc>,
    #[n(1)]
    pub amount: Amount,
    #[n(2)]
    pub reference: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Prefinancing {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub number: String,
    #[n(2)]
    pub grant_id: String,
    #[n(3)]
    pub beneficiary: String,
    #[n(4)]
    pub purpose: String,
    #[n(5)]
    pub amount: Amount,
    #[n(6)]
    pub issue_date: TimeStamp<Utc>,
    #[n(7)]
    pub expected_repayment_date: Option<TimeStamp<Utc>>,
    #[n(8)]
    status: Status,
    #[n(9)]
    approvals: Approvals,
    #[n(10)]
    repayments: Vec<Repayment>,
}

impl Prefinancing {
    pub fn repayments(&self) -> &[Repayment] {
        &self.repayments
    }

    pub fn repaid_total(&self) -> Amount {
        self.repayments.iter().map(|r| r.amount).sum()
    }

    pub fn remaining(&self) -> Amount {
        self.amount.saturating_sub(self.repaid_total())
    }

    pub fn is_fully_repaid(&self) -> bool {
        self.remaining() == 0
    }

    /// Appends a repayment, keeping the total repaid within the principal. Returns what is still
    /// owed afterwards.
    pub fn add_repayment(&mut self, repayment: Repayment) -> Result<Amount, LedgerError> {
        if self.status != Status::Paid {
            return Err(ValidationError::InvalidTransition {
                from: self.status,
                to: Status::Repaid,
            }
            .into());
        }
        if repayment.amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }

        let remaining = self.remaining();
        if repayment.amount > remaining {
            return Err(ValidationError::RepaymentExceedsBalance {
                amount: repayment.amount,
                remaining,
            }
            .into());
        }

        self.repayments.push(repayment);
        Ok(self.remaining())
    }
}

// used for constructing drafts from form input
#[derive(Debug, Clone, Default)]
pub struct PrefinancingDraft {
    number: Option<String>,
    grant_id: Option<String>,
    beneficiary: Option<String>,
    purpose: String,
    amount: Option<String>,
    issue_date: Option<TimeStamp<Utc>>,
    expected_repayment_date: Option<TimeStamp<Utc>>,
    approvals: StagedApprovals,
}

impl PrefinancingDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_number(mut self, number: &str) -> Self {
        self.number = Some(number.to_string());
        self
    }
    pub fn set_grant(mut self, grant_id: &str) -> Self {
        self.grant_id = Some(grant_id.to_string());
        self
    }
    pub fn set_beneficiary(mut self, beneficiary: &str) -> Self {
        self.beneficiary = Some(beneficiary.to_string());
        self
    }
    pub fn set_purpose(mut self, purpose: &str) -> Self {
        self.purpose = purpose.to_string();
        self
    }
    pub fn set_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount.to_string());
        self
    }
    pub fn set_amount_text(mut self, raw: &str) -> Self {
        self.amount = Some(raw.to_string());
        self
    }
    pub fn set_issue_date(mut self, date: TimeStamp<Utc>) -> Self {
        self.issue_date = Some(date);
        self
    }
    pub fn set_expected_repayment_date(mut self, date: TimeStamp<Utc>) -> Self {
        self.expected_repayment_date = Some(date);
        self
    }
    pub fn set_approvals(mut self, approvals: StagedApprovals) -> Self {
        self.approvals = approvals;
        self
    }
    pub fn approvals_mut(&mut self) -> &mut StagedApprovals {
        &mut self.approvals
    }

    pub fn validate_and_finalise(self) -> Result<Prefinancing, ValidationError> {
        let field = |value: Option<String>, name: &'static str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ValidationError::MissingField { field: name })
        };

        let number = field(self.number, "prefinancing number")?;
        let grant_id = field(self.grant_id, "grant")?;
        let beneficiary = field(self.beneficiary, "beneficiary")?;
        let raw_amount = field(self.amount, "amount")?;
        let amount = parse_amount("amount", &raw_amount)?;
        if amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }

        Ok(Prefinancing {
            id: String::new(),
            number,
            grant_id,
            beneficiary,
            purpose: self.purpose.trim().to_string(),
            amount,
            issue_date: self.issue_date.unwrap_or_default(),
            expected_repayment_date: self.expected_repayment_date,
            status: Status::Pending,
            approvals: self.approvals.into_persisted(),
            repayments: Vec::new(),
        })
    }
}

impl Signable for Prefinancing {
    const MODULE: &'static str = modules::PREFINANCINGS;
    const KIND: &'static str = "prefinancing";
    const REPAYABLE: bool = true;

    fn id(&self) -> &str {
        &self.id
    }
    fn grant_id(&self) -> &str {
        &self.grant_id
    }
    fn amount(&self) -> Amount {
        self.amount
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
        self.remaining()
    }
}

impl Record for Prefinancing {
    const TREE: &'static str = "prefinancings";
    const ID_PREFIX: &'static str = "pref_";
    const ENTITY: &'static str = "prefinancing";

    fn key(&self) -> &str {
        &self.id
    }
    fn assign_key(&mut self, id: String) {
        self.id = id;
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some((PREFINANCINGS_NUMBER_KEY, format!("{}/{}", self.grant_id, self.number)))
    }
}

impl Listable for Prefinancing {
    fn search_text(&self) -> Vec<&str> {
        vec![self.number.as_str(), self.beneficiary.as_str(), self.purpose.as_str()]
    }
    fn status_label(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
    fn primary_date(&self) -> Option<&TimeStamp<Utc>> {
        Some(&self.issue_date)
    }
    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "amount" => Some(SortKey::Number(self.amount as f64)),
            "remaining" => Some(SortKey::Number(self.remaining() as f64)),
            "issue_date" | "date" => Some(SortKey::Date(self.issue_date.timestamp_millis())),
            "expected_repayment_date" => self
                .expected_repayment_date
                .as_ref()
                .map(|d| SortKey::Date(d.timestamp_millis())),
            "number" => Some(SortKey::Text(self.number.clone())),
            "beneficiary" => Some(SortKey::Text(self.beneficiary.clone())),
            "status" => Some(SortKey::Text(self.status.as_str().to_string())),
            _ => None,
        }
    }
    fn extra_field(&self, field: &str) -> Option<String> {
        match field {
            "grant_id" => Some(self.grant_id.clone()),
            "beneficiary" => Some(self.beneficiary.clone()),
            _ => None,
        }
    }
}
