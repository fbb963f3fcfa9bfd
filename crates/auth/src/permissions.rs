//! Role → capability model.
//!
//! A capability is an `(action, scope)` pair, written `"<action>:<scope>"`
//! (e.g. `"read:own"`). The table is built once at startup and read-only
//! afterwards.

use std::collections::{BTreeSet, HashMap};

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tollgate_core::{AuthError, PrincipalId};

use crate::Role;

/// Operation a principal wants to perform on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(AuthError::validation(format!("unknown action '{other}'"))),
        }
    }
}

/// Reach of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every resource, including collections and other principals' resources.
    Any,
    /// Only resources owned by the requester.
    Own,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Any => "any",
            Scope::Own => "own",
        }
    }

    /// Scope of a request by `requester` against a resource owned by `owner`.
    ///
    /// `None` means the target is a collection (no single owner). Ownership
    /// is exact identifier equality.
    pub fn for_target(requester: &PrincipalId, owner: Option<&PrincipalId>) -> Scope {
        match owner {
            Some(owner) if owner == requester => Scope::Own,
            _ => Scope::Any,
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Scope::Any),
            "own" => Ok(Scope::Own),
            other => Err(AuthError::validation(format!("unknown scope '{other}'"))),
        }
    }
}

/// A capability granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability {
    pub action: Action,
    pub scope: Scope,
}

impl Capability {
    pub const fn new(action: Action, scope: Scope) -> Self {
        Self { action, scope }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.action, self.scope)
    }
}

impl FromStr for Capability {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, scope) = s
            .split_once(':')
            .ok_or_else(|| AuthError::validation(format!("capability '{s}' is not '<action>:<scope>'")))?;
        Ok(Self::new(action.parse()?, scope.parse()?))
    }
}

/// Outcome of a permission check, with the capability that granted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub role: Role,
    pub action: Action,
    pub scope: Scope,
    pub granted: bool,
    /// Capability that satisfied the check, rendered as `"<action>:<scope>"`.
    pub matched: Option<String>,
}

/// Static role → capability mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    entries: HashMap<Role, BTreeSet<Capability>>,
}

impl PermissionTable {
    /// Build a table, requiring an entry for every [`Role`].
    ///
    /// A role that should hold nothing must be listed with an empty set; a
    /// missing role is a configuration gap.
    pub fn new<I, C>(entries: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (Role, C)>,
        C: IntoIterator<Item = Capability>,
    {
        let mut map: HashMap<Role, BTreeSet<Capability>> = HashMap::new();
        for (role, caps) in entries {
            if map.insert(role, caps.into_iter().collect()).is_some() {
                return Err(AuthError::configuration(format!(
                    "permission table lists role '{role}' more than once"
                )));
            }
        }

        let missing: Vec<&str> = Role::ALL
            .iter()
            .filter(|r| !map.contains_key(r))
            .map(|r| r.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::configuration(format!(
                "permission table has no entry for role(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self { entries: map })
    }

    /// Admin: every action on any resource. User: read/update/delete own.
    pub fn canonical() -> Self {
        let mut entries = HashMap::new();
        for role in Role::ALL {
            entries.insert(role, Self::canonical_capabilities(role).iter().copied().collect());
        }
        Self { entries }
    }

    const ADMIN_CAPABILITIES: &'static [Capability] = &[
        Capability::new(Action::Create, Scope::Any),
        Capability::new(Action::Read, Scope::Any),
        Capability::new(Action::Update, Scope::Any),
        Capability::new(Action::Delete, Scope::Any),
    ];

    const USER_CAPABILITIES: &'static [Capability] = &[
        Capability::new(Action::Read, Scope::Own),
        Capability::new(Action::Update, Scope::Own),
        Capability::new(Action::Delete, Scope::Own),
    ];

    fn canonical_capabilities(role: Role) -> &'static [Capability] {
        match role {
            Role::Admin => Self::ADMIN_CAPABILITIES,
            Role::User => Self::USER_CAPABILITIES,
        }
    }

    /// Capabilities granted to `role`, in stable order.
    pub fn capabilities_for(&self, role: Role) -> Vec<Capability> {
        self.entries
            .get(&role)
            .map(|caps| caps.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Capabilities for a role given by name; unknown names hold nothing.
    pub fn capabilities_for_name(&self, role: &str) -> Vec<Capability> {
        match role.parse::<Role>() {
            Ok(role) => self.capabilities_for(role),
            Err(_) => Vec::new(),
        }
    }

    /// Authorized iff the role holds `(action, any)`, or the request is
    /// own-scoped and the role holds `(action, own)`.
    pub fn is_authorized(&self, role: Role, action: Action, scope: Scope) -> bool {
        self.matching(role, action, scope).is_some()
    }

    pub fn explain(&self, role: Role, action: Action, scope: Scope) -> Decision {
        let matched = self.matching(role, action, scope);
        Decision {
            role,
            action,
            scope,
            granted: matched.is_some(),
            matched: matched.map(|c| c.to_string()),
        }
    }

    fn matching(&self, role: Role, action: Action, scope: Scope) -> Option<Capability> {
        let caps = self.entries.get(&role)?;

        let any = Capability::new(action, Scope::Any);
        if caps.contains(&any) {
            return Some(any);
        }

        let own = Capability::new(action, Scope::Own);
        if scope == Scope::Own && caps.contains(&own) {
            return Some(own);
        }

        None
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::canonical()
    }
}
