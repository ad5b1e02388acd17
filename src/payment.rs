//! Payments drawn on engagements
use chrono::Utc;

use crate::approval::{Approvals, Signable, StagedApprovals};
use crate::error::{LedgerError, PAYMENTS_NUMBER_KEY, PermissionError, ValidationError};
use crate::grant::{BankAccount, Engagement};
use crate::lifecycle::Status;
use crate::listing::{Listable, SortKey};
use crate::permission::modules;
use crate::store::Record;
use crate::types::{Amount, Balance, TimeStamp, as_balance, parse_amount};
use crate::user::{Actor, Profession};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum PaymentMethod {
    #[n(0)]
    #[default]
    Transfer,
    #[n(1)]
    Check,
    #[n(2)]
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Check => "check",
            PaymentMethod::Cash => "cash",
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub number: String,
    #[n(2)]
    pub grant_id: String,
    #[n(3)]
    pub engagement_id: String,
    #[n(4)]
    pub bank_account_id: Option<String>,
    #[n(5)]
    pub amount: Amount,
    #[n(6)]
    pub payment_date: TimeStamp<Utc>,
    #[n(7)]
    pub cashed_date: Option<TimeStamp<Utc>>,
    #[n(8)]
    pub beneficiary: String,
    #[n(9)]
    pub description: String,
    #[n(10)]
    pub method: PaymentMethod,
    #[n(11)]
    pub check_number: Option<String>,
    #[n(12)]
    status: Status,
    #[n(13)]
    approvals: Approvals,
}

impl Payment {
    /// Paid but not yet cashed, so still committed against the treasury.
    pub fn is_uncashed(&self) -> bool {
        self.status == Status::Paid && self.cashed_date.is_none()
    }

    /// Records the date the payment cleared the bank. Only the accountant does this, and only
    /// once the payment is paid.
    pub fn mark_cashed(&mut self, date: TimeStamp<Utc>, actor: &Actor) -> Result<(), LedgerError> {
        if actor.profession() != Profession::Accountant {
            return Err(PermissionError::ProfessionRequired {
                required: Profession::Accountant,
            }
            .into());
        }
        if self.status != Status::Paid {
            return Err(ValidationError::InvalidTransition {
                from: self.status,
                to: Status::Paid,
            }
            .into());
        }
        self.cashed_date = Some(date);
        Ok(())
    }
}

/// Bank balances of the accounts minus every paid but uncashed payment.
pub fn treasury_balance(accounts: &[BankAccount], payments: &[Payment]) -> Balance {
    let banked = accounts.iter().map(|a| a.balance).fold(0, Balance::saturating_add);
    let committed = payments
        .iter()
        .filter(|p| p.is_uncashed())
        .map(|p| as_balance(p.amount))
        .fold(0, Balance::saturating_add);
    banked.saturating_sub(committed)
}

/// What a new payment is checked against.
#[derive(Debug, Clone, Copy)]
pub struct PaymentContext<'a> {
    pub engagement: &'a Engagement,
    pub accounts: &'a [BankAccount],
    pub payments: &'a [Payment],
}

// used for constructing drafts from form input
#[derive(Debug, Clone, Default)]
pub struct PaymentDraft {
    number: Option<String>,
    grant_id: Option<String>,
    engagement_id: Option<String>,
    bank_account_id: Option<String>,
    amount: Option<String>,
    payment_date: Option<TimeStamp<Utc>>,
    beneficiary: Option<String>,
    description: String,
    method: PaymentMethod,
    check_number: Option<String>,
    approvals: StagedApprovals,
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingField { field })
}

impl PaymentDraft {
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
    pub fn set_engagement(mut self, engagement_id: &str) -> Self {
        self.engagement_id = Some(engagement_id.to_string());
        self
    }
    pub fn set_bank_account(mut self, bank_account_id: &str) -> Self {
        self.bank_account_id = Some(bank_account_id.to_string());
        self
    }
    pub fn set_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount.to_string());
        self
    }
    /// Raw amount as typed, parsed when the draft is finalised.
    pub fn set_amount_text(mut self, raw: &str) -> Self {
        self.amount = Some(raw.to_string());
        self
    }
    pub fn set_payment_date(mut self, date: TimeStamp<Utc>) -> Self {
        self.payment_date = Some(date);
        self
    }
    pub fn set_beneficiary(mut self, beneficiary: &str) -> Self {
        self.beneficiary = Some(beneficiary.to_string());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
    pub fn set_method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }
    pub fn set_check_number(mut self, check_number: &str) -> Self {
        self.check_number = Some(check_number.to_string());
        self
    }
    pub fn set_approvals(mut self, approvals: StagedApprovals) -> Self {
        self.approvals = approvals;
        self
    }
    pub fn approvals_mut(&mut self) -> &mut StagedApprovals {
        &mut self.approvals
    }
    pub fn engagement_id(&self) -> Option<&str> {
        self.engagement_id.as_deref()
    }
    pub fn grant_id(&self) -> Option<&str> {
        self.grant_id.as_deref()
    }

    /// Checks the draft and builds the payment to create, along with the treasury balance that
    /// will remain once it is paid.
    pub fn validate_and_finalise(self, ctx: PaymentContext<'_>) -> Result<(Payment, Balance), ValidationError> {
        let number = required(&self.number, "payment number")?;
        let grant_id = required(&self.grant_id, "grant")?;
        let engagement_id = required(&self.engagement_id, "engagement")?;
        let beneficiary = required(&self.beneficiary, "beneficiary")?;
        let raw_amount = self.amount.ok_or(ValidationError::MissingField { field: "amount" })?;
        let amount = parse_amount("amount", &raw_amount)?;
        let check_number = match self.method {
            PaymentMethod::Check => Some(required(&self.check_number, "check number")?),
            _ => self.check_number.filter(|c| !c.trim().is_empty()),
        };

        if engagement_id != ctx.engagement.id || grant_id != ctx.engagement.grant_id {
            return Err(ValidationError::ForeignEngagement {
                engagement_id,
                grant_id,
            });
        }
        if amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }
        if amount > ctx.engagement.amount {
            return Err(ValidationError::ExceedsEngagement {
                amount,
                limit: ctx.engagement.amount,
            });
        }

        let balance_after = treasury_balance(ctx.accounts, ctx.payments).saturating_sub(as_balance(amount));
        if balance_after < 0 {
            return Err(ValidationError::InsufficientTreasury { balance_after });
        }

        let payment = Payment {
            id: String::new(),
            number,
            grant_id,
            engagement_id,
            bank_account_id: self.bank_account_id.filter(|b| !b.trim().is_empty()),
            amount,
            payment_date: self.payment_date.unwrap_or_default(),
            cashed_date: None,
            beneficiary,
            description: self.description.trim().to_string(),
            method: self.method,
            check_number,
            status: Status::Pending,
            approvals: self.approvals.into_persisted(),
        };

        Ok((payment, balance_after))
    }
}

impl Signable for Payment {
    const MODULE: &'static str = modules::PAYMENTS;
    const KIND: &'static str = "payment";
    const REPAYABLE: bool = false;

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
}

impl Record for Payment {
    const TREE: &'static str = "payments";
    const ID_PREFIX: &'static str = "pay_";
    const ENTITY: &'static str = "payment";

    fn key(&self) -> &str {
        &self.id
    }
    fn assign_key(&mut self, id: String) {
        self.id = id;
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some((PAYMENTS_NUMBER_KEY, format!("{}/{}", self.grant_id, self.number)))
    }
}

impl Listable for Payment {
    fn search_text(&self) -> Vec<&str> {
        vec![self.number.as_str(), self.beneficiary.as_str(), self.description.as_str()]
    }
    fn status_label(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
    fn primary_date(&self) -> Option<&TimeStamp<Utc>> {
        Some(&self.payment_date)
    }
    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "amount" => Some(SortKey::Number(self.amount as f64)),
            "payment_date" | "date" => Some(SortKey::Date(self.payment_date.timestamp_millis())),
            "cashed_date" => self
                .cashed_date
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
            "engagement_id" => Some(self.engagement_id.clone()),
            "method" => Some(self.method.as_str().to_string()),
            _ => None,
        }
    }
}
