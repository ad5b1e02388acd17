//! Service layer API for ledger operations.
//!
//! Every public operation runs on behalf of an [`Actor`], checks the actor's authority before
//! anything is written and logs the outcome. Mutations of signable records go through
//! [`Repository::update`] with the etag the caller read, so a signature or status change made
//! on a stale copy is refused instead of overwriting someone else's work.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::approval::{ApprovalWorkflow, Signable, SlotId};
use crate::config::Config;
use crate::error::{BackendError, LedgerResult, PermissionError, ValidationError};
use crate::export::{DocumentRenderer, RenderedDocument, Voucher, voucher_html};
use crate::grant::{BankAccount, BudgetLine, Engagement, Grant, SubBudgetLine};
use crate::lifecycle::{self, Status};
use crate::listing::{self, ListQuery, Listable, SortDirection};
use crate::notification::pending_for_profession;
use crate::payment::{Payment, PaymentContext, PaymentDraft};
use crate::permission::{actions, modules};
use crate::prefinancing::{Prefinancing, PrefinancingDraft, Repayment};
use crate::store::{Record, Repository, SledStore, Versioned};
use crate::types::TimeStamp;
use crate::user::{ADMIN_ROLE_CODE, Actor, MEMBER_ROLE_CODE, Profession, Role, User, UserProfile};

const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a filtered, sorted listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Sort field and direction for a listing.
pub type SortBy<'a> = Option<(&'a str, SortDirection)>;

fn refused(operation: &'static str, actor: &Actor, err: &impl std::fmt::Display) {
    warn!(operation, actor = actor.id(), error = %err, "operation refused");
}

fn list_records<T: Record + Listable>(
    store: &SledStore<T>,
    query: &ListQuery,
    sort_by: SortBy<'_>,
    page: usize,
    page_size: usize,
) -> Result<Listing<Versioned<T>>, BackendError> {
    let records = store.get_all()?;
    let filtered = listing::list(&records, query);
    let ordered = match sort_by {
        Some((field, direction)) => listing::sort(filtered, field, direction),
        None => filtered,
    };

    let page = listing::paginate(&ordered, page, page_size);
    Ok(Listing {
        items: page.items.iter().map(|v| (*v).clone()).collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_items: page.total_items,
    })
}

pub struct LedgerService {
    instance: Arc<sled::Db>,
    grants: SledStore<Grant>,
    budget_lines: SledStore<BudgetLine>,
    sub_budget_lines: SledStore<SubBudgetLine>,
    engagements: SledStore<Engagement>,
    bank_accounts: SledStore<BankAccount>,
    payments: SledStore<Payment>,
    prefinancings: SledStore<Prefinancing>,
    page_size: usize,
}

impl LedgerService {
    pub fn new(instance: Arc<sled::Db>) -> LedgerResult<Self> {
        Ok(Self {
            grants: SledStore::open(&instance)?,
            budget_lines: SledStore::open(&instance)?,
            sub_budget_lines: SledStore::open(&instance)?,
            engagements: SledStore::open(&instance)?,
            bank_accounts: SledStore::open(&instance)?,
            payments: SledStore::open(&instance)?,
            prefinancings: SledStore::open(&instance)?,
            page_size: DEFAULT_PAGE_SIZE,
            instance,
        })
    }

    /// Opens the database named by the configuration.
    pub fn open(config: &Config) -> LedgerResult<Self> {
        let instance = Arc::new(sled::open(&config.db_path)?);
        let mut service = Self::new(instance)?;
        service.page_size = config.page_size;
        info!(path = %config.db_path.display(), "ledger opened");
        Ok(service)
    }

    pub fn db(&self) -> Arc<sled::Db> {
        self.instance.clone()
    }

    pub fn grants(&self) -> &SledStore<Grant> {
        &self.grants
    }
    pub fn budget_lines(&self) -> &SledStore<BudgetLine> {
        &self.budget_lines
    }
    pub fn sub_budget_lines(&self) -> &SledStore<SubBudgetLine> {
        &self.sub_budget_lines
    }
    pub fn engagements(&self) -> &SledStore<Engagement> {
        &self.engagements
    }
    pub fn bank_accounts(&self) -> &SledStore<BankAccount> {
        &self.bank_accounts
    }
    pub fn payments(&self) -> &SledStore<Payment> {
        &self.payments
    }
    pub fn prefinancings(&self) -> &SledStore<Prefinancing> {
        &self.prefinancings
    }

    fn guarded_create<T: Record>(
        actor: &Actor,
        module: &'static str,
        store: &SledStore<T>,
        record: T,
    ) -> LedgerResult<Versioned<T>> {
        actor.require(module, actions::CREATE).inspect_err(|err| refused("create", actor, err))?;
        let created = store.create(record).inspect_err(|err| refused("create", actor, err))?;

        info!(entity = T::ENTITY, id = created.record.key(), actor = actor.id(), "record created");
        Ok(created)
    }

    pub fn create_grant(&self, actor: &Actor, grant: Grant) -> LedgerResult<Versioned<Grant>> {
        Self::guarded_create(actor, modules::GRANTS, &self.grants, grant)
    }

    pub fn create_budget_line(&self, actor: &Actor, line: BudgetLine) -> LedgerResult<Versioned<BudgetLine>> {
        self.grants.get(&line.grant_id)?;
        Self::guarded_create(actor, modules::BUDGET_LINES, &self.budget_lines, line)
    }

    pub fn create_sub_budget_line(
        &self,
        actor: &Actor,
        line: SubBudgetLine,
    ) -> LedgerResult<Versioned<SubBudgetLine>> {
        self.budget_lines.get(&line.budget_line_id)?;
        Self::guarded_create(actor, modules::BUDGET_LINES, &self.sub_budget_lines, line)
    }

    pub fn create_engagement(&self, actor: &Actor, engagement: Engagement) -> LedgerResult<Versioned<Engagement>> {
        self.grants.get(&engagement.grant_id)?;
        Self::guarded_create(actor, modules::ENGAGEMENTS, &self.engagements, engagement)
    }

    pub fn create_bank_account(&self, actor: &Actor, account: BankAccount) -> LedgerResult<Versioned<BankAccount>> {
        self.grants.get(&account.grant_id)?;
        Self::guarded_create(actor, modules::BANK_ACCOUNTS, &self.bank_accounts, account)
    }

    /// Pre-filled signatures on a new record must be ones the creator could have signed.
    fn check_staged<T: Signable>(record: &mut T, actor: &Actor) -> LedgerResult<()> {
        ApprovalWorkflow::<T>::new().attest_staged(record, actor, TimeStamp::new())?;
        Ok(())
    }

    pub fn create_payment(&self, actor: &Actor, draft: PaymentDraft) -> LedgerResult<Versioned<Payment>> {
        self.try_create_payment(actor, draft)
            .inspect_err(|err| refused("create_payment", actor, err))
    }

    fn try_create_payment(&self, actor: &Actor, draft: PaymentDraft) -> LedgerResult<Versioned<Payment>> {
        actor.require(modules::PAYMENTS, actions::CREATE)?;

        let engagement_id = draft
            .engagement_id()
            .ok_or(ValidationError::MissingField { field: "engagement" })?;
        let engagement = self.engagements.get(engagement_id)?.record;
        let accounts: Vec<BankAccount> = self
            .bank_accounts
            .find(|a| a.grant_id == engagement.grant_id)?
            .into_iter()
            .map(|v| v.record)
            .collect();
        let payments: Vec<Payment> = self
            .payments
            .find(|p| p.grant_id == engagement.grant_id)?
            .into_iter()
            .map(|v| v.record)
            .collect();

        let ctx = PaymentContext {
            engagement: &engagement,
            accounts: &accounts,
            payments: &payments,
        };
        let (mut payment, balance_after) = draft.validate_and_finalise(ctx)?;
        Self::check_staged(&mut payment, actor)?;

        let created = self.payments.create(payment)?;
        info!(
            id = %created.record.id,
            number = %created.record.number,
            amount = created.record.amount,
            balance_after,
            actor = actor.id(),
            "payment created"
        );
        Ok(created)
    }

    pub fn create_prefinancing(
        &self,
        actor: &Actor,
        draft: PrefinancingDraft,
    ) -> LedgerResult<Versioned<Prefinancing>> {
        let created = self
            .try_create_prefinancing(actor, draft)
            .inspect_err(|err| refused("create_prefinancing", actor, err))?;
        info!(id = %created.record.id, number = %created.record.number, actor = actor.id(), "prefinancing created");
        Ok(created)
    }

    fn try_create_prefinancing(
        &self,
        actor: &Actor,
        draft: PrefinancingDraft,
    ) -> LedgerResult<Versioned<Prefinancing>> {
        actor.require(modules::PREFINANCINGS, actions::CREATE)?;
        let mut prefinancing = draft.validate_and_finalise()?;
        self.grants.get(&prefinancing.grant_id)?;
        Self::check_staged(&mut prefinancing, actor)?;
        Ok(self.prefinancings.create(prefinancing)?)
    }

    fn sign<T: Signable + Record>(
        store: &SledStore<T>,
        actor: &Actor,
        id: &str,
        slot: SlotId,
        observation: Option<String>,
        etag: &str,
    ) -> LedgerResult<Versioned<T>> {
        let workflow = ApprovalWorkflow::<T>::new();
        store
            .update(id, etag, |record| {
                workflow.can_sign(Some(&*record), slot, actor)?;
                // signatures freeze once the record leaves pending
                if record.status() != Status::Pending {
                    return Err(ValidationError::InvalidTransition {
                        from: record.status(),
                        to: Status::Approved,
                    }
                    .into());
                }
                workflow.sign(record, slot, actor, observation, TimeStamp::new())?;
                Ok(())
            })
            .inspect_err(|err| refused("sign", actor, err))
    }

    pub fn sign_payment(
        &self,
        actor: &Actor,
        id: &str,
        slot: SlotId,
        observation: Option<String>,
        etag: &str,
    ) -> LedgerResult<Versioned<Payment>> {
        Self::sign(&self.payments, actor, id, slot, observation, etag)
    }

    pub fn sign_prefinancing(
        &self,
        actor: &Actor,
        id: &str,
        slot: SlotId,
        observation: Option<String>,
        etag: &str,
    ) -> LedgerResult<Versioned<Prefinancing>> {
        Self::sign(&self.prefinancings, actor, id, slot, observation, etag)
    }

    fn change_status<T: Signable + Record>(
        store: &SledStore<T>,
        actor: &Actor,
        id: &str,
        to: Status,
        etag: &str,
    ) -> LedgerResult<Versioned<T>> {
        store
            .update(id, etag, |record| lifecycle::transition(record, to, actor))
            .inspect_err(|err| refused("change_status", actor, err))
    }

    pub fn change_payment_status(
        &self,
        actor: &Actor,
        id: &str,
        to: Status,
        etag: &str,
    ) -> LedgerResult<Versioned<Payment>> {
        Self::change_status(&self.payments, actor, id, to, etag)
    }

    pub fn change_prefinancing_status(
        &self,
        actor: &Actor,
        id: &str,
        to: Status,
        etag: &str,
    ) -> LedgerResult<Versioned<Prefinancing>> {
        Self::change_status(&self.prefinancings, actor, id, to, etag)
    }

    pub fn mark_payment_cashed(
        &self,
        actor: &Actor,
        id: &str,
        date: TimeStamp<Utc>,
        etag: &str,
    ) -> LedgerResult<Versioned<Payment>> {
        actor
            .require(modules::PAYMENTS, actions::EDIT)
            .inspect_err(|err| refused("mark_payment_cashed", actor, err))?;
        let updated = self
            .payments
            .update(id, etag, |payment| payment.mark_cashed(date, actor))
            .inspect_err(|err| refused("mark_payment_cashed", actor, err))?;

        info!(id, actor = actor.id(), "payment cashed");
        Ok(updated)
    }

    pub fn add_repayment(
        &self,
        actor: &Actor,
        id: &str,
        repayment: Repayment,
        etag: &str,
    ) -> LedgerResult<Versioned<Prefinancing>> {
        let updated = self
            .try_add_repayment(actor, id, repayment, etag)
            .inspect_err(|err| refused("add_repayment", actor, err))?;
        info!(id, remaining = updated.record.remaining(), actor = actor.id(), "repayment recorded");
        Ok(updated)
    }

    fn try_add_repayment(
        &self,
        actor: &Actor,
        id: &str,
        repayment: Repayment,
        etag: &str,
    ) -> LedgerResult<Versioned<Prefinancing>> {
        actor.require(modules::PREFINANCINGS, actions::EDIT)?;
        if actor.profession() != Profession::Accountant {
            return Err(PermissionError::ProfessionRequired {
                required: Profession::Accountant,
            }
            .into());
        }
        self.prefinancings
            .update(id, etag, |prefinancing| prefinancing.add_repayment(repayment).map(|_| ()))
    }

    fn delete<T: Signable + Record>(store: &SledStore<T>, actor: &Actor, id: &str) -> LedgerResult<()> {
        actor.require(T::MODULE, actions::DELETE).inspect_err(|err| refused("delete", actor, err))?;
        store
            .delete(id, |record| {
                if record.status() != Status::Pending || record.approvals().any_signed() {
                    return Err(PermissionError::Immutable.into());
                }
                Ok(())
            })
            .inspect_err(|err| refused("delete", actor, err))?;

        info!(kind = T::KIND, id, actor = actor.id(), "record deleted");
        Ok(())
    }

    pub fn delete_payment(&self, actor: &Actor, id: &str) -> LedgerResult<()> {
        Self::delete(&self.payments, actor, id)
    }

    pub fn delete_prefinancing(&self, actor: &Actor, id: &str) -> LedgerResult<()> {
        Self::delete(&self.prefinancings, actor, id)
    }

    fn pending<T: Signable + Record>(
        store: &SledStore<T>,
        actor: &Actor,
        grant_id: Option<&str>,
    ) -> Result<Vec<Versioned<T>>, BackendError> {
        if !actor.permissions().has_module_access(T::MODULE) {
            return Ok(Vec::new());
        }
        let versions = store.get_all()?;
        let records: Vec<T> = versions.iter().map(|v| v.record.clone()).collect();
        let pending: HashSet<&str> = pending_for_profession(&records, &actor.profession(), grant_id)
            .into_iter()
            .map(|r| r.id())
            .collect();

        Ok(versions
            .into_iter()
            .filter(|v| pending.contains(v.record.id()))
            .collect())
    }

    /// Payments waiting on the actor's signature.
    pub fn pending_payments(&self, actor: &Actor, grant_id: Option<&str>) -> LedgerResult<Vec<Versioned<Payment>>> {
        Ok(Self::pending(&self.payments, actor, grant_id)?)
    }

    pub fn pending_prefinancings(
        &self,
        actor: &Actor,
        grant_id: Option<&str>,
    ) -> LedgerResult<Vec<Versioned<Prefinancing>>> {
        Ok(Self::pending(&self.prefinancings, actor, grant_id)?)
    }

    /// Badge count across both signable kinds.
    pub fn pending_count(&self, actor: &Actor, grant_id: Option<&str>) -> LedgerResult<usize> {
        Ok(self.pending_payments(actor, grant_id)?.len() + self.pending_prefinancings(actor, grant_id)?.len())
    }

    pub fn list_payments(
        &self,
        actor: &Actor,
        query: &ListQuery,
        sort_by: SortBy<'_>,
        page: usize,
        page_size: Option<usize>,
    ) -> LedgerResult<Listing<Versioned<Payment>>> {
        actor
            .require(modules::PAYMENTS, actions::VIEW)
            .inspect_err(|err| refused("list_payments", actor, err))?;
        Ok(list_records(
            &self.payments,
            query,
            sort_by,
            page,
            page_size.unwrap_or(self.page_size),
        )?)
    }

    pub fn list_prefinancings(
        &self,
        actor: &Actor,
        query: &ListQuery,
        sort_by: SortBy<'_>,
        page: usize,
        page_size: Option<usize>,
    ) -> LedgerResult<Listing<Versioned<Prefinancing>>> {
        actor
            .require(modules::PREFINANCINGS, actions::VIEW)
            .inspect_err(|err| refused("list_prefinancings", actor, err))?;
        Ok(list_records(
            &self.prefinancings,
            query,
            sort_by,
            page,
            page_size.unwrap_or(self.page_size),
        )?)
    }

    fn export<T: Voucher + Record>(
        &self,
        store: &SledStore<T>,
        actor: &Actor,
        id: &str,
        renderer: &impl DocumentRenderer,
    ) -> LedgerResult<RenderedDocument> {
        let document = self
            .try_export(store, actor, id, renderer)
            .inspect_err(|err| refused("export", actor, err))?;
        info!(kind = T::KIND, id, digest = %document.digest, "voucher exported");
        Ok(document)
    }

    fn try_export<T: Voucher + Record>(
        &self,
        store: &SledStore<T>,
        actor: &Actor,
        id: &str,
        renderer: &impl DocumentRenderer,
    ) -> LedgerResult<RenderedDocument> {
        actor.require(T::MODULE, actions::EXPORT)?;
        let record = store.get(id)?.record;
        let grant = self.grants.get(record.grant_id())?.record;
        let html = voucher_html(&record, &grant);
        Ok(renderer
            .render_to_file(record.number(), &html)
            .map_err(|e| BackendError::Unavailable(e.to_string()))?)
    }

    pub fn export_payment(
        &self,
        actor: &Actor,
        id: &str,
        renderer: &impl DocumentRenderer,
    ) -> LedgerResult<RenderedDocument> {
        self.export(&self.payments, actor, id, renderer)
    }

    pub fn export_prefinancing(
        &self,
        actor: &Actor,
        id: &str,
        renderer: &impl DocumentRenderer,
    ) -> LedgerResult<RenderedDocument> {
        self.export(&self.prefinancings, actor, id, renderer)
    }
}

/// User and role administration.
pub struct AdminService {
    users: SledStore<User>,
    roles: SledStore<Role>,
}

impl AdminService {
    pub fn new(instance: &sled::Db) -> LedgerResult<Self> {
        Ok(Self {
            users: SledStore::open(instance)?,
            roles: SledStore::open(instance)?,
        })
    }

    pub fn users(&self) -> &SledStore<User> {
        &self.users
    }
    pub fn roles(&self) -> &SledStore<Role> {
        &self.roles
    }

    fn role_by_code(&self, code: &str) -> Result<Option<Versioned<Role>>, BackendError> {
        Ok(self.roles.find(|r| r.code == code)?.into_iter().next())
    }

    fn ensure_role(&self, template: Role) -> Result<Role, BackendError> {
        if let Some(existing) = self.role_by_code(&template.code)? {
            return Ok(existing.record);
        }
        Ok(self.roles.create(template)?.record)
    }

    /// Self registration. The very first account becomes the administrator, later ones get the
    /// member role, which grants nothing until an administrator assigns a real role.
    pub fn sign_up(&self, email: &str, profile: UserProfile) -> LedgerResult<Versioned<User>> {
        if email.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "email" }.into());
        }

        let first = self.users.is_empty();
        let role = if first {
            self.ensure_role(Role::administrator())?
        } else {
            self.ensure_role(Role::member())?
        };

        let created = self.users.create(User::new(email, profile, &role.id))?;
        info!(id = %created.record.id, role = %role.code, first, "user signed up");
        Ok(created)
    }

    /// Resolves a stored user and their role into an actor.
    pub fn actor_for(&self, user_id: &str) -> LedgerResult<Actor> {
        let user = self.users.get(user_id)?.record;
        match self.roles.get(&user.role_id) {
            Ok(role) => Ok(Actor::new(user, &role.record)),
            Err(BackendError::NotFound { .. }) => Ok(Actor::without_permissions(user)),
            Err(err) => Err(err.into()),
        }
    }

    pub fn create_user(
        &self,
        actor: &Actor,
        email: &str,
        profile: UserProfile,
        role_id: &str,
    ) -> LedgerResult<Versioned<User>> {
        let created = self
            .try_create_user(actor, email, profile, role_id)
            .inspect_err(|err| refused("create_user", actor, err))?;
        info!(id = %created.record.id, actor = actor.id(), "user created");
        Ok(created)
    }

    fn try_create_user(
        &self,
        actor: &Actor,
        email: &str,
        profile: UserProfile,
        role_id: &str,
    ) -> LedgerResult<Versioned<User>> {
        actor.require(modules::USERS, actions::CREATE)?;
        if email.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "email" }.into());
        }
        self.roles.get(role_id)?;
        Ok(self.users.create(User::new(email, profile, role_id))?)
    }

    /// Users may edit their own profile. Changing anyone's role or active flag, or editing someone
    /// else, needs `users:edit`.
    pub fn update_user<F>(&self, actor: &Actor, id: &str, etag: &str, edit: F) -> LedgerResult<Versioned<User>>
    where
        F: FnOnce(&mut User),
    {
        let updated = self
            .try_update_user(actor, id, etag, edit)
            .inspect_err(|err| refused("update_user", actor, err))?;
        info!(id, actor = actor.id(), "user updated");
        Ok(updated)
    }

    fn try_update_user<F>(&self, actor: &Actor, id: &str, etag: &str, edit: F) -> LedgerResult<Versioned<User>>
    where
        F: FnOnce(&mut User),
    {
        if actor.id() != id {
            actor.require(modules::USERS, actions::EDIT)?;
        }
        let administers = actor.can(modules::USERS, actions::EDIT);

        self.users.update(id, etag, |user| {
            let (role_id, is_active) = (user.role_id.clone(), user.is_active);
            let profession = user.profession.clone();
            edit(user);
            let escalates =
                user.role_id != role_id || user.is_active != is_active || user.profession != profession;
            if !administers && escalates {
                actor.require(modules::USERS, actions::EDIT)?;
            }
            if user.email.trim().is_empty() {
                return Err(ValidationError::MissingField { field: "email" }.into());
            }
            Ok(())
        })
    }

    pub fn delete_user(&self, actor: &Actor, id: &str) -> LedgerResult<()> {
        self.try_delete_user(actor, id)
            .inspect_err(|err| refused("delete_user", actor, err))?;
        info!(id, actor = actor.id(), "user deleted");
        Ok(())
    }

    fn try_delete_user(&self, actor: &Actor, id: &str) -> LedgerResult<()> {
        actor.require(modules::USERS, actions::DELETE)?;
        if actor.id() == id {
            return Err(PermissionError::SelfDelete.into());
        }
        self.users.delete(id, |_| Ok(()))
    }

    pub fn create_role(&self, actor: &Actor, role: Role) -> LedgerResult<Versioned<Role>> {
        let created = self
            .try_create_role(actor, role)
            .inspect_err(|err| refused("create_role", actor, err))?;
        info!(id = %created.record.id, code = %created.record.code, actor = actor.id(), "role created");
        Ok(created)
    }

    fn try_create_role(&self, actor: &Actor, mut role: Role) -> LedgerResult<Versioned<Role>> {
        actor.require(modules::ROLES, actions::CREATE)?;
        role.code = role.code.trim().to_uppercase();
        if role.code.is_empty() {
            return Err(ValidationError::MissingField { field: "role code" }.into());
        }
        Ok(self.roles.create(role)?)
    }

    pub fn update_role<F>(&self, actor: &Actor, id: &str, etag: &str, edit: F) -> LedgerResult<Versioned<Role>>
    where
        F: FnOnce(&mut Role),
    {
        actor
            .require(modules::ROLES, actions::EDIT)
            .inspect_err(|err| refused("update_role", actor, err))?;
        let updated = self
            .roles
            .update(id, etag, |role| {
                edit(role);
                role.code = role.code.trim().to_uppercase();
                if role.code.is_empty() {
                    return Err(ValidationError::MissingField { field: "role code" }.into());
                }
                Ok(())
            })
            .inspect_err(|err| refused("update_role", actor, err))?;

        info!(id, actor = actor.id(), "role updated");
        Ok(updated)
    }

    pub fn delete_role(&self, actor: &Actor, id: &str) -> LedgerResult<()> {
        self.try_delete_role(actor, id)
            .inspect_err(|err| refused("delete_role", actor, err))?;
        info!(id, actor = actor.id(), "role deleted");
        Ok(())
    }

    fn try_delete_role(&self, actor: &Actor, id: &str) -> LedgerResult<()> {
        actor.require(modules::ROLES, actions::DELETE)?;
        let users = self.users.find(|u| u.role_id == id)?.len();
        if users > 0 {
            return Err(ValidationError::RoleInUse { users }.into());
        }
        self.roles.delete(id, |_| Ok(()))
    }

    /// The built in role held by the first account.
    pub fn admin_role(&self) -> LedgerResult<Option<Versioned<Role>>> {
        Ok(self.role_by_code(ADMIN_ROLE_CODE)?)
    }

    pub fn member_role(&self) -> LedgerResult<Option<Versioned<Role>>> {
        Ok(self.role_by_code(MEMBER_ROLE_CODE)?)
    }
}
