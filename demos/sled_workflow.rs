//! Walks one payment and one prefinancing through the signature workflow on a scratch database.
//!
//! Set `GRANT_LEDGER_DB_PATH` to keep the database, otherwise a temp dir is used.
use std::sync::Arc;

use grant_ledger::approval::SlotId;
use grant_ledger::config::{Config, DB_PATH_VAR, EnvironmentProvider, LOG_LEVEL_VAR, MapEnvironment, SystemEnvironment};
use grant_ledger::export::HtmlRenderer;
use grant_ledger::grant::{BankAccount, Currency, Engagement, Grant};
use grant_ledger::lifecycle::Status;
use grant_ledger::logging::init_logging;
use grant_ledger::payment::PaymentDraft;
use grant_ledger::permission::{Permission, actions, modules};
use grant_ledger::prefinancing::{PrefinancingDraft, Repayment};
use grant_ledger::service::{AdminService, LedgerService};
use grant_ledger::types::TimeStamp;
use grant_ledger::user::{ACCOUNTANT, Actor, GRANT_COORDINATOR, NATIONAL_COORDINATOR, Role, UserProfile};
use grant_ledger::Signable;

fn profile(first_name: &str, profession: &str) -> UserProfile {
    UserProfile {
        first_name: first_name.into(),
        last_name: "Demo".into(),
        profession: profession.into(),
        employee_id: None,
    }
}

fn main() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let config = match SystemEnvironment.get_var(DB_PATH_VAR) {
        Some(_) => Config::from_env(&SystemEnvironment)?,
        None => {
            let path = scratch.path().join("ledger.db");
            let level = SystemEnvironment
                .get_var(LOG_LEVEL_VAR)
                .unwrap_or_else(|| "grant_ledger=info".into());
            let env = MapEnvironment::empty()
                .with_var(DB_PATH_VAR, &path.to_string_lossy())
                .with_var(LOG_LEVEL_VAR, &level);
            Config::from_env(&env)?
        }
    };
    init_logging(&config.logging())?;

    let ledger = LedgerService::open(&config)?;
    let db: Arc<sled::Db> = ledger.db();
    let admin = AdminService::new(&db)?;

    let root_id = admin.sign_up("admin@demo.org", profile("Root", "Administrateur"))?.record.id;
    let root = admin.actor_for(&root_id)?;

    let signer_role = admin
        .create_role(
            &root,
            Role::new(
                "Signataire",
                "SIGNER",
                vec![
                    Permission::new(modules::PAYMENTS, actions::ALL),
                    Permission::new(modules::PREFINANCINGS, actions::ALL),
                ],
            ),
        )?
        .record;

    let signer = |email: &str, name: &str, profession: &str| -> anyhow::Result<Actor> {
        let user = admin.create_user(&root, email, profile(name, profession), &signer_role.id)?;
        Ok(admin.actor_for(&user.record.id)?)
    };
    let coordinator = signer("gc@demo.org", "Awa", GRANT_COORDINATOR)?;
    let accountant = signer("acc@demo.org", "Ibrahim", ACCOUNTANT)?;
    let national = signer("nc@demo.org", "Moussa", NATIONAL_COORDINATOR)?;

    let grant = ledger
        .create_grant(
            &root,
            Grant {
                id: String::new(),
                code: "GF-2025".into(),
                name: "Fonds Mondial".into(),
                currency: Currency::XOF,
                amount: 50_000_000,
                start_date: TimeStamp::on_day(2025, 1, 1),
                end_date: TimeStamp::on_day(2027, 12, 31),
            },
        )?
        .record;
    let engagement = ledger
        .create_engagement(
            &root,
            Engagement {
                id: String::new(),
                grant_id: grant.id.clone(),
                budget_line_id: String::new(),
                number: "ENG-001".into(),
                amount: 2_000_000,
                description: "Community health workshop".into(),
                date: TimeStamp::on_day(2025, 2, 1),
            },
        )?
        .record;
    ledger.create_bank_account(
        &root,
        BankAccount {
            id: String::new(),
            grant_id: grant.id.clone(),
            bank_name: "Ecobank".into(),
            account_number: "SN012-0001".into(),
            balance: 5_000_000,
        },
    )?;

    // payment: three signatures, then paid and cashed by the accountant
    let payment = ledger.create_payment(
        &coordinator,
        PaymentDraft::new()
            .set_number("PAY-001")
            .set_grant(&grant.id)
            .set_engagement(&engagement.id)
            .set_beneficiary("Hotel Teranga")
            .set_amount(1_500_000)
            .set_payment_date(TimeStamp::on_day(2025, 3, 10)),
    )?;
    let id = payment.record.id.clone();
    let v = ledger.sign_payment(&coordinator, &id, SlotId::Supervisor1, None, &payment.etag)?;
    let v = ledger.sign_payment(&accountant, &id, SlotId::Supervisor2, Some("Invoice attached".into()), &v.etag)?;
    println!("waiting on the national coordinator: {}", ledger.pending_count(&national, None)?);
    let v = ledger.sign_payment(&national, &id, SlotId::FinalApproval, None, &v.etag)?;
    let v = ledger.change_payment_status(&accountant, &id, Status::Paid, &v.etag)?;
    let v = ledger.mark_payment_cashed(&accountant, &id, TimeStamp::on_day(2025, 3, 20), &v.etag)?;
    println!("{} is {}", v.record.number, v.record.status());

    let voucher = ledger.export_payment(&accountant, &id, &HtmlRenderer)?;
    println!("{} ({} bytes, sha256 {})", voucher.file_name, voucher.bytes.len(), voucher.digest);

    // prefinancing: approved, paid out, then repaid in two instalments
    let advance = ledger.create_prefinancing(
        &coordinator,
        PrefinancingDraft::new()
            .set_number("PF-001")
            .set_grant(&grant.id)
            .set_beneficiary("District team")
            .set_purpose("Field mission")
            .set_amount(10_000)
            .set_issue_date(TimeStamp::on_day(2025, 4, 1)),
    )?;
    let id = advance.record.id.clone();
    let v = ledger.sign_prefinancing(&coordinator, &id, SlotId::Supervisor1, None, &advance.etag)?;
    let v = ledger.sign_prefinancing(&accountant, &id, SlotId::Supervisor2, None, &v.etag)?;
    let v = ledger.sign_prefinancing(&national, &id, SlotId::FinalApproval, None, &v.etag)?;
    let mut v = ledger.change_prefinancing_status(&accountant, &id, Status::Paid, &v.etag)?;

    for (day, amount) in [(15, 4_000), (30, 6_000)] {
        let repayment = Repayment {
            date: TimeStamp::on_day(2025, 4, day),
            amount,
            reference: format!("REC-{day}"),
        };
        v = ledger.add_repayment(&accountant, &id, repayment, &v.etag)?;
        println!("{} remaining on {}", grant.format(v.record.remaining()), v.record.number);
    }
    let v = ledger.change_prefinancing_status(&accountant, &id, Status::Repaid, &v.etag)?;
    println!("{} is {}", v.record.number, v.record.status());

    Ok(())
}
