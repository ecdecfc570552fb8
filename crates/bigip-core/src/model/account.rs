// ── Account domain types ──

use serde::Serialize;
use strum::Display;

/// Roles allowed to switch to an elevated shell and remove a license.
const PRIVILEGED_ROLES: [&str; 2] = ["admin", "resource-admin"];

/// An account's login shell.
///
/// The REST record reports bare names (`bash`, `tmsh`, `none`) and may omit
/// the field; the management API reports paths (`/bin/bash`,
/// `/usr/bin/tmsh`, `/sbin/nologin`). Both parse into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountShell {
    Bash,
    Tmsh,
    None,
    /// No shell recorded; the device treats this as `tmsh`.
    Unset,
}

impl AccountShell {
    /// Parse the REST record's `shell` field.
    pub fn from_record(shell: Option<&str>) -> Self {
        match shell.map(str::trim) {
            Some("bash") => Self::Bash,
            Some("tmsh") => Self::Tmsh,
            Some("none") => Self::None,
            _ => Self::Unset,
        }
    }

    /// Parse a login shell path from the management API.
    pub fn from_login_shell(path: &str) -> Self {
        let name = path.trim().rsplit('/').next().unwrap_or_default();
        match name {
            "bash" => Self::Bash,
            "tmsh" => Self::Tmsh,
            "nologin" | "false" => Self::None,
            _ => Self::Unset,
        }
    }

    /// Value written back through the REST endpoint.
    pub fn as_rest_value(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Tmsh | Self::Unset => "tmsh",
            Self::None => "none",
        }
    }

    /// Whether an observed shell satisfies this one as a restore target.
    pub fn is_restored_by(self, observed: Self) -> bool {
        match self {
            Self::Unset => matches!(observed, Self::Tmsh | Self::Unset),
            other => other == observed,
        }
    }
}

/// The fields of an account the removal path depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub name: String,
    pub shell: AccountShell,
    pub roles: Vec<String>,
}

impl AccountRecord {
    /// Whether any partition role allows license removal.
    pub fn is_privileged(&self) -> bool {
        self.roles
            .iter()
            .any(|role| PRIVILEGED_ROLES.contains(&role.as_str()))
    }

    /// Roles joined for error messages.
    pub fn role_summary(&self) -> String {
        if self.roles.is_empty() {
            "none".into()
        } else {
            self.roles.join(", ")
        }
    }
}

impl From<bigip_api::UserRecord> for AccountRecord {
    fn from(user: bigip_api::UserRecord) -> Self {
        Self {
            shell: AccountShell::from_record(user.shell.as_deref()),
            roles: user.roles(),
            name: user.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_shell_paths() {
        assert_eq!(AccountShell::from_login_shell("/bin/bash"), AccountShell::Bash);
        assert_eq!(AccountShell::from_login_shell("/usr/bin/tmsh"), AccountShell::Tmsh);
        assert_eq!(AccountShell::from_login_shell("/sbin/nologin"), AccountShell::None);
        assert_eq!(AccountShell::from_login_shell("/bin/false"), AccountShell::None);
        assert_eq!(AccountShell::from_login_shell(""), AccountShell::Unset);
    }

    #[test]
    fn unset_restores_as_tmsh() {
        assert_eq!(AccountShell::Unset.as_rest_value(), "tmsh");
        assert!(AccountShell::Unset.is_restored_by(AccountShell::Tmsh));
        assert!(!AccountShell::Unset.is_restored_by(AccountShell::Bash));
        assert!(!AccountShell::None.is_restored_by(AccountShell::Tmsh));
    }

    #[test]
    fn privilege_requires_admin_role() {
        let mut record = AccountRecord {
            name: "ops".into(),
            shell: AccountShell::Tmsh,
            roles: vec!["operator".into()],
        };
        assert!(!record.is_privileged());
        record.roles.push("resource-admin".into());
        assert!(record.is_privileged());
    }
}
