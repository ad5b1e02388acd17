//! Grants and the budget records signable entities are attached to
use chrono::Utc;

use crate::error::BANK_ACCOUNTS_NUMBER_KEY;
use crate::store::Record;
use crate::types::{Amount, Balance, TimeStamp};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Currency {
    #[n(0)]
    XOF,
    #[n(1)]
    EUR,
    #[n(2)]
    USD,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::XOF => "XOF",
            Currency::EUR => "EUR",
            Currency::USD => "USD",
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub code: String,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub currency: Currency,
    #[n(4)]
    pub amount: Amount,
    #[n(5)]
    pub start_date: TimeStamp<Utc>,
    #[n(6)]
    pub end_date: TimeStamp<Utc>,
}

impl Grant {
    pub fn format(&self, amount: Amount) -> String {
        format_amount(amount, self.currency)
    }

    pub fn is_open_on(&self, day: &TimeStamp<Utc>) -> bool {
        self.start_date.date() <= day.date() && day.date() <= self.end_date.date()
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct BudgetLine {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub grant_id: String,
    #[n(2)]
    pub code: String,
    #[n(3)]
    pub name: String,
    #[n(4)]
    pub notified_amount: Amount,
    #[n(5)]
    pub engaged_amount: Amount,
    #[n(6)]
    pub available_amount: Amount,
}

impl BudgetLine {
    /// Share of the notified amount already paid out, in percent.
    pub fn disbursement_rate(&self, paid: Amount) -> f64 {
        disbursement_rate(paid, self.notified_amount)
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct SubBudgetLine {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub budget_line_id: String,
    #[n(2)]
    pub code: String,
    #[n(3)]
    pub name: String,
    #[n(4)]
    pub notified_amount: Amount,
}

/// A committed spend against a budget line. Payments draw on it.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Engagement {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub grant_id: String,
    #[n(2)]
    pub budget_line_id: String,
    #[n(3)]
    pub number: String,
    #[n(4)]
    pub amount: Amount,
    #[n(5)]
    pub description: String,
    #[n(6)]
    pub date: TimeStamp<Utc>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct BankAccount {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub grant_id: String,
    #[n(2)]
    pub bank_name: String,
    #[n(3)]
    pub account_number: String,
    #[n(4)]
    pub balance: Balance,
}

/// `paid / notified` as a percentage, zero when nothing was notified.
pub fn disbursement_rate(paid: Amount, notified: Amount) -> f64 {
    if notified == 0 {
        return 0.0;
    }
    paid as f64 / notified as f64 * 100.0
}

/// Groups digits by thousands with spaces and appends the currency code, `1 500 000 XOF`.
pub fn format_amount(amount: Amount, currency: Currency) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    format!("{grouped} {}", currency.code())
}

macro_rules! impl_record {
    ($ty:ty, $tree:literal, $prefix:literal, $entity:literal) => {
        impl Record for $ty {
            const TREE: &'static str = $tree;
            const ID_PREFIX: &'static str = $prefix;
            const ENTITY: &'static str = $entity;

            fn key(&self) -> &str {
                &self.id
            }
            fn assign_key(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

impl_record!(Grant, "grants", "grant_", "grant");
impl_record!(BudgetLine, "budget_lines", "bl_", "budget line");
impl_record!(SubBudgetLine, "sub_budget_lines", "sbl_", "sub budget line");
impl_record!(Engagement, "engagements", "eng_", "engagement");

impl Record for BankAccount {
    const TREE: &'static str = "bank_accounts";
    const ID_PREFIX: &'static str = "bank_";
    const ENTITY: &'static str = "bank account";

    fn key(&self) -> &str {
        &self.id
    }
    fn assign_key(&mut self, id: String) {
        self.id = id;
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some((BANK_ACCOUNTS_NUMBER_KEY, self.account_number.clone()))
    }
}
