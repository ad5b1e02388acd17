//! Role permission evaluation.
//!
//! A role declares a list of `module -> actions` grants. [`PermissionMap::normalize`] folds them
//! into a lookup table that answers every access question in the crate. The `all` module is a
//! wildcard: actions granted on it apply to every module, for every query.
use std::collections::{BTreeMap, BTreeSet};

use crate::utils::normalise_key;

pub const WILDCARD_MODULE: &str = "all";

pub mod modules {
    pub const PAYMENTS: &str = "payments";
    pub const PREFINANCINGS: &str = "prefinancings";
    pub const GRANTS: &str = "grants";
    pub const BUDGET_LINES: &str = "budget_lines";
    pub const ENGAGEMENTS: &str = "engagements";
    pub const BANK_ACCOUNTS: &str = "bank_accounts";
    pub const LOANS: &str = "loans";
    pub const USERS: &str = "users";
    pub const ROLES: &str = "roles";
    pub const REPORTS: &str = "reports";
}

pub mod actions {
    pub const VIEW: &str = "view";
    pub const CREATE: &str = "create";
    pub const EDIT: &str = "edit";
    pub const DELETE: &str = "delete";
    pub const SIGN: &str = "sign";
    pub const APPROVE: &str = "approve";
    pub const EXPORT: &str = "export";

    pub const ALL: [&str; 7] = [VIEW, CREATE, EDIT, DELETE, SIGN, APPROVE, EXPORT];
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Permission {
    #[n(0)]
    pub module: String,
    #[n(1)]
    pub actions: BTreeSet<String>,
}

impl Permission {
    pub fn new<'a>(module: &str, actions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            module: module.to_string(),
            actions: actions.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMap {
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl PermissionMap {
    /// An empty map. Every check against it fails.
    pub fn none() -> Self {
        Self::default()
    }

    /// Folds declared permissions into a lookup. Repeated modules merge, keys are lower cased and
    /// blank actions are dropped.
    pub fn normalize(permissions: &[Permission]) -> Self {
        let mut modules: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for permission in permissions {
            let module = normalise_key(&permission.module);
            if module.is_empty() {
                continue;
            }
            let entry = modules.entry(module).or_default();
            entry.extend(
                permission
                    .actions
                    .iter()
                    .map(|a| normalise_key(a))
                    .filter(|a| !a.is_empty()),
            );
        }

        Self { modules }
    }

    fn actions_for(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.modules.get(&normalise_key(module))
    }

    fn wildcard(&self) -> Option<&BTreeSet<String>> {
        self.modules.get(WILDCARD_MODULE)
    }

    pub fn has_permission(&self, module: &str, action: &str) -> bool {
        let action = normalise_key(action);
        let direct = self
            .actions_for(module)
            .is_some_and(|set| set.contains(&action));

        direct || self.wildcard().is_some_and(|set| set.contains(&action))
    }

    pub fn has_module_access(&self, module: &str) -> bool {
        self.actions_for(module).is_some_and(|set| !set.is_empty())
            || self.wildcard().is_some_and(|set| !set.is_empty())
    }

    pub fn has_any_permission(&self, module: &str, actions: &[&str]) -> bool {
        actions.iter().any(|a| self.has_permission(module, a))
    }

    /// Vacuously true for an empty action list, matching set inclusion.
    pub fn has_all_permissions(&self, module: &str, actions: &[&str]) -> bool {
        actions.iter().all(|a| self.has_permission(module, a))
    }

    pub fn accessible_modules(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(module, _)| module.as_str())
            .collect()
    }
}
