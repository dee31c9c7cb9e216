//! User accounts, permission levels and per-step access scoping.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, Department, StepNumber};
use crate::error::{Result, TrackerError};

/// Three-tier permission model: view, edit, full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    View,
    Edit,
    Full,
}

impl PermissionLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            PermissionLevel::View => 1,
            PermissionLevel::Edit => 2,
            PermissionLevel::Full => 3,
        }
    }

    pub fn from_u8(level: u8) -> Result<Self> {
        match level {
            1 => Ok(PermissionLevel::View),
            2 => Ok(PermissionLevel::Edit),
            3 => Ok(PermissionLevel::Full),
            other => Err(TrackerError::invalid_input(
                "permission_level",
                format!("must be 1, 2 or 3, got {other}"),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::View => "view",
            PermissionLevel::Edit => "edit",
            PermissionLevel::Full => "full",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the workbook a user can open. Derived from the
/// permission level, never stored separately, so the two can not
/// drift apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkbookAccess {
    Restricted,
    Shared,
    Full,
}

impl From<PermissionLevel> for WorkbookAccess {
    fn from(level: PermissionLevel) -> Self {
        match level {
            PermissionLevel::View => WorkbookAccess::Restricted,
            PermissionLevel::Edit => WorkbookAccess::Shared,
            PermissionLevel::Full => WorkbookAccess::Full,
        }
    }
}

/// Role a user plays in the process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Primary person responsible
    Ppr,
    /// Alternate person responsible
    Apr,
    Manager,
    Admin,
    ReadOnly,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Ppr => "ppr",
            UserRole::Apr => "apr",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
            UserRole::ReadOnly => "read_only",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ppr" => Ok(UserRole::Ppr),
            "apr" => Ok(UserRole::Apr),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            "read_only" | "readonly" => Ok(UserRole::ReadOnly),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}

/// Which steps a user may touch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessScope {
    /// Every step in the catalog
    All,
    /// Exactly the listed steps
    Explicit(BTreeSet<StepNumber>),
    /// Read-only over the workbook, no step access at all
    None,
}

/// A user of the tracking system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub username: String,
    pub display_name: String,
    pub department: Department,
    pub role: UserRole,
    pub level: PermissionLevel,
    pub scope: AccessScope,
}

impl UserAccount {
    pub fn workbook_access(&self) -> WorkbookAccess {
        WorkbookAccess::from(self.level)
    }

    pub fn can_edit(&self) -> bool {
        self.level >= PermissionLevel::Edit
    }

    pub fn can_delete(&self) -> bool {
        self.level == PermissionLevel::Full
    }

    /// Management and admins see every step regardless of scope.
    pub fn can_access_step(&self, step: StepNumber) -> bool {
        if self.department == Department::Management || self.role == UserRole::Admin {
            return true;
        }
        match &self.scope {
            AccessScope::All => true,
            AccessScope::Explicit(steps) => steps.contains(&step),
            AccessScope::None => false,
        }
    }

    /// Steps this user may touch, in catalog order.
    pub fn accessible_steps(&self) -> Vec<StepNumber> {
        catalog::all_steps()
            .iter()
            .map(|def| def.number)
            .filter(|n| self.can_access_step(*n))
            .collect()
    }

    /// Permission check for completing or skipping a step.
    pub fn authorize_step_edit(&self, step: StepNumber) -> Result<()> {
        if !self.can_edit() {
            return Err(TrackerError::permission_denied(format!(
                "user `{}` has {} access only",
                self.username, self.level
            )));
        }
        if !self.can_access_step(step) {
            return Err(TrackerError::permission_denied(format!(
                "step {step} is outside the scope of user `{}`",
                self.username
            )));
        }
        Ok(())
    }
}

fn department_scope(department: Department) -> AccessScope {
    let steps: BTreeSet<StepNumber> = catalog::all_steps()
        .iter()
        .filter(|def| def.department == department)
        .map(|def| def.number)
        .collect();
    AccessScope::Explicit(steps)
}

fn account(
    username: &str,
    display_name: &str,
    department: Department,
    role: UserRole,
    level: PermissionLevel,
    scope: AccessScope,
) -> UserAccount {
    UserAccount {
        username: username.to_string(),
        display_name: display_name.to_string(),
        department,
        role,
        level,
        scope,
    }
}

/// The stock accounts the tracker ships with, one PPR and APR pair per
/// operating department plus management and admin.
pub fn seed_accounts() -> Vec<UserAccount> {
    vec![
        account(
            "bu.ppr", "Salim Al-Harthy",
            Department::BusinessUnit, UserRole::Ppr, PermissionLevel::Edit,
            department_scope(Department::BusinessUnit),
        ),
        account(
            "bu.apr", "Fatma Al-Balushi",
            Department::BusinessUnit, UserRole::Apr, PermissionLevel::Edit,
            department_scope(Department::BusinessUnit),
        ),
        account(
            "fin.ppr", "Ahmed Al-Lawati",
            Department::Finance, UserRole::Ppr, PermissionLevel::Edit,
            department_scope(Department::Finance),
        ),
        account(
            "fin.apr", "Mariam Al-Zadjali",
            Department::Finance, UserRole::Apr, PermissionLevel::Edit,
            department_scope(Department::Finance),
        ),
        account(
            "cc.ppr", "Khalid Al-Raisi",
            Department::CustomsClearance, UserRole::Ppr, PermissionLevel::Edit,
            department_scope(Department::CustomsClearance),
        ),
        account(
            "cc.apr", "Said Al-Maskari",
            Department::CustomsClearance, UserRole::Apr, PermissionLevel::Edit,
            department_scope(Department::CustomsClearance),
        ),
        account(
            "stores.ppr", "Nasser Al-Habsi",
            Department::Stores, UserRole::Ppr, PermissionLevel::Edit,
            department_scope(Department::Stores),
        ),
        account(
            "gm", "Laila Al-Kindi",
            Department::Management, UserRole::Manager, PermissionLevel::View,
            AccessScope::None,
        ),
        account(
            "admin", "System Administrator",
            Department::Management, UserRole::Admin, PermissionLevel::Full,
            AccessScope::All,
        ),
    ]
}

/// Looks up a seed account by username.
pub fn seed_account(username: &str) -> Option<UserAccount> {
    seed_accounts().into_iter().find(|u| u.username == username)
}

/// Seam for resolving credentials to an account. The in-memory
/// implementation backs tests and single-user setups; a real identity
/// provider would supply its own.
pub trait CredentialStore {
    fn authenticate(&self, username: &str, secret: &str) -> Result<UserAccount>;
}

/// Credential store holding accounts and secrets in memory.
pub struct InMemoryCredentialStore {
    entries: Vec<(UserAccount, String)>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// All seed accounts, each with the given shared secret.
    pub fn seeded(secret: &str) -> Self {
        Self {
            entries: seed_accounts()
                .into_iter()
                .map(|account| (account, secret.to_string()))
                .collect(),
        }
    }

    pub fn add(&mut self, account: UserAccount, secret: impl Into<String>) {
        self.entries.push((account, secret.into()));
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn authenticate(&self, username: &str, secret: &str) -> Result<UserAccount> {
        self.entries
            .iter()
            .find(|(account, stored)| account.username == username && stored == secret)
            .map(|(account, _)| account.clone())
            .ok_or_else(|| {
                TrackerError::permission_denied(format!("invalid credentials for `{username}`"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_levels_round_trip_through_numbers() {
        for level in [PermissionLevel::View, PermissionLevel::Edit, PermissionLevel::Full] {
            assert_eq!(PermissionLevel::from_u8(level.as_u8()).unwrap(), level);
        }
        assert!(PermissionLevel::from_u8(0).is_err());
        assert!(PermissionLevel::from_u8(4).is_err());
    }

    #[test]
    fn workbook_access_follows_level() {
        assert_eq!(
            WorkbookAccess::from(PermissionLevel::View),
            WorkbookAccess::Restricted
        );
        assert_eq!(
            WorkbookAccess::from(PermissionLevel::Edit),
            WorkbookAccess::Shared
        );
        assert_eq!(
            WorkbookAccess::from(PermissionLevel::Full),
            WorkbookAccess::Full
        );
    }

    #[test]
    fn department_users_stay_inside_their_steps() {
        let finance = seed_account("fin.ppr").unwrap();
        assert!(finance.can_access_step(StepNumber::new(3, 1)));
        assert!(finance.can_access_step(StepNumber::new(10, 1)));
        assert!(!finance.can_access_step(StepNumber::new(9, 0)));
        assert!(finance.authorize_step_edit(StepNumber::new(9, 0)).is_err());
        assert!(finance.authorize_step_edit(StepNumber::new(3, 1)).is_ok());
    }

    #[test]
    fn management_sees_everything_but_edits_nothing() {
        let gm = seed_account("gm").unwrap();
        assert!(gm.can_access_step(StepNumber::new(9, 0)));
        assert_eq!(gm.accessible_steps().len(), 34);
        assert!(!gm.can_edit());
        assert!(gm.authorize_step_edit(StepNumber::new(9, 0)).is_err());
    }

    #[test]
    fn empty_scope_outside_management_blocks_every_step() {
        let viewer = UserAccount {
            username: "fin.viewer".to_string(),
            display_name: "Finance Viewer".to_string(),
            department: Department::Finance,
            role: UserRole::ReadOnly,
            level: PermissionLevel::View,
            scope: AccessScope::None,
        };
        assert!(catalog::all_steps()
            .iter()
            .all(|def| !viewer.can_access_step(def.number)));
        assert!(viewer.accessible_steps().is_empty());
        assert!(viewer.authorize_step_edit(StepNumber::new(3, 1)).is_err());
    }

    #[test]
    fn admin_holds_full_access() {
        let admin = seed_account("admin").unwrap();
        assert!(admin.can_edit());
        assert!(admin.can_delete());
        assert_eq!(admin.accessible_steps().len(), 34);
    }

    #[test]
    fn credential_store_matches_username_and_secret() {
        let store = InMemoryCredentialStore::seeded("hunter2");
        let account = store.authenticate("fin.ppr", "hunter2").unwrap();
        assert_eq!(account.username, "fin.ppr");

        assert!(store.authenticate("fin.ppr", "wrong").is_err());
        assert!(store.authenticate("nobody", "hunter2").is_err());
    }

    #[test]
    fn accessible_steps_preserve_catalog_order() {
        let bu = seed_account("bu.ppr").unwrap();
        let steps = bu.accessible_steps();
        assert_eq!(steps.first(), Some(&StepNumber::new(1, 1)));
        assert!(steps.windows(2).all(|w| {
            let a = catalog::definition(w[0]).unwrap().sequence;
            let b = catalog::definition(w[1]).unwrap().sequence;
            a < b
        }));
    }
}
