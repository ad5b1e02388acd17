//! Users, roles and the authenticated actor that every operation runs as
use crate::error::{PermissionError, ROLES_CODE_KEY, USERS_EMAIL_KEY};
use crate::permission::{Permission, PermissionMap, WILDCARD_MODULE, actions};
use crate::store::Record;
use crate::types::TimeStamp;
use chrono::Utc;

pub const GRANT_COORDINATOR: &str = "Coordinateur de la Subvention";
pub const ACCOUNTANT: &str = "Comptable";
pub const NATIONAL_COORDINATOR: &str = "Coordonnateur National";

/// Free text job title. Three exact values carry signing authority for one approval slot each.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Profession {
    GrantCoordinator,
    Accountant,
    NationalCoordinator,
    Other(String),
}

impl Profession {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            GRANT_COORDINATOR => Profession::GrantCoordinator,
            ACCOUNTANT => Profession::Accountant,
            NATIONAL_COORDINATOR => Profession::NationalCoordinator,
            other => Profession::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Profession::GrantCoordinator => GRANT_COORDINATOR,
            Profession::Accountant => ACCOUNTANT,
            Profession::NationalCoordinator => NATIONAL_COORDINATOR,
            Profession::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Profession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Role {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub code: String, // upper case, unique
    #[n(3)]
    pub permissions: Vec<Permission>,
    #[n(4)]
    pub is_active: bool,
    #[n(5)]
    pub description: String,
}

pub const ADMIN_ROLE_CODE: &str = "ADMIN";
pub const MEMBER_ROLE_CODE: &str = "MEMBER";

impl Role {
    pub fn new(name: &str, code: &str, permissions: Vec<Permission>) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            code: code.trim().to_uppercase(),
            permissions,
            is_active: true,
            description: String::new(),
        }
    }

    /// Built in role granted to the first account. Holds every action on the wildcard module.
    pub fn administrator() -> Self {
        Self::new(
            "Administrator",
            ADMIN_ROLE_CODE,
            vec![Permission::new(WILDCARD_MODULE, actions::ALL)],
        )
    }

    /// Role given to later self sign ups until an administrator assigns a real one.
    pub fn member() -> Self {
        Self::new("Member", MEMBER_ROLE_CODE, vec![])
    }

    pub fn permission_map(&self) -> PermissionMap {
        if !self.is_active {
            return PermissionMap::none();
        }
        PermissionMap::normalize(&self.permissions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct User {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub email: String,
    #[n(2)]
    pub first_name: String,
    #[n(3)]
    pub last_name: String,
    #[n(4)]
    pub profession: String,
    #[n(5)]
    pub employee_id: Option<String>,
    #[n(6)]
    pub role_id: String,
    #[n(7)]
    pub is_active: bool,
    #[n(8)]
    pub last_login: Option<TimeStamp<Utc>>,
}

/// Profile fields supplied at sign up or by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub employee_id: Option<String>,
}

impl User {
    pub fn new(email: &str, profile: UserProfile, role_id: &str) -> Self {
        Self {
            id: String::new(),
            email: email.trim().to_string(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            profession: profile.profession,
            employee_id: profile.employee_id,
            role_id: role_id.to_string(),
            is_active: true,
            last_login: None,
        }
    }

    /// Stand-in profile used when the real one cannot be loaded in time. It has no profession
    /// and no role, so it can neither sign nor act.
    pub fn fallback(id: &str, email: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            profession: String::new(),
            employee_id: None,
            role_id: String::new(),
            is_active: true,
            last_login: None,
        }
    }

    pub fn profession(&self) -> Profession {
        Profession::parse(&self.profession)
    }

    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// An authenticated user together with the permissions resolved from their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: User,
    permissions: PermissionMap,
}

impl Actor {
    pub fn new(user: User, role: &Role) -> Self {
        let permissions = if user.is_active && role.id == user.role_id {
            role.permission_map()
        } else {
            PermissionMap::none()
        };
        Self { user, permissions }
    }

    pub fn without_permissions(user: User) -> Self {
        Self {
            user,
            permissions: PermissionMap::none(),
        }
    }

    pub fn permissions(&self) -> &PermissionMap {
        &self.permissions
    }

    pub fn can(&self, module: &str, action: &str) -> bool {
        self.permissions.has_permission(module, action)
    }

    pub fn require(&self, module: &str, action: &str) -> Result<(), PermissionError> {
        if self.can(module, action) {
            return Ok(());
        }
        Err(PermissionError::MissingAction {
            module: module.to_string(),
            action: action.to_string(),
        })
    }

    pub fn profession(&self) -> Profession {
        self.user.profession()
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }
}

impl Record for Role {
    const TREE: &'static str = "roles";
    const ID_PREFIX: &'static str = "role_";
    const ENTITY: &'static str = "role";

    fn key(&self) -> &str {
        &self.id
    }
    fn assign_key(&mut self, id: String) {
        self.id = id;
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some((ROLES_CODE_KEY, self.code.clone()))
    }
}

impl Record for User {
    const TREE: &'static str = "users";
    const ID_PREFIX: &'static str = "user_";
    const ENTITY: &'static str = "user";

    fn key(&self) -> &str {
        &self.id
    }
    fn assign_key(&mut self, id: String) {
        self.id = id;
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some((USERS_EMAIL_KEY, self.email.clone()))
    }
}
