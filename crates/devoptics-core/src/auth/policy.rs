//! Role policy: which capabilities each role grants.
//!
//! Call sites gate on capabilities, never on role names, so adding a role or
//! regrouping permissions only touches the tables below.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Permission tag gating a single action or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ManageUsers,
    ManageTeams,
    ApproveWorkflow,
    ViewAdminOverview,
    ViewBilling,
    ViewAnalytics,
    ViewReports,
    ViewClusterHealth,
    ViewDashboards,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::ManageUsers,
        Capability::ManageTeams,
        Capability::ApproveWorkflow,
        Capability::ViewAdminOverview,
        Capability::ViewBilling,
        Capability::ViewAnalytics,
        Capability::ViewReports,
        Capability::ViewClusterHealth,
        Capability::ViewDashboards,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageUsers => "manage-users",
            Capability::ManageTeams => "manage-teams",
            Capability::ApproveWorkflow => "approve-workflow",
            Capability::ViewAdminOverview => "view-admin-overview",
            Capability::ViewBilling => "view-billing",
            Capability::ViewAnalytics => "view-analytics",
            Capability::ViewReports => "view-reports",
            Capability::ViewClusterHealth => "view-cluster-health",
            Capability::ViewDashboards => "view-dashboards",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MANAGER: &[Capability] = &[
    Capability::ManageTeams,
    Capability::ApproveWorkflow,
    Capability::ViewBilling,
    Capability::ViewAnalytics,
    Capability::ViewReports,
    Capability::ViewClusterHealth,
    Capability::ViewDashboards,
];

const ANALYST: &[Capability] = &[
    Capability::ViewAnalytics,
    Capability::ViewReports,
    Capability::ViewClusterHealth,
    Capability::ViewDashboards,
];

const VIEWER: &[Capability] = &[Capability::ViewDashboards];

/// Capabilities granted to `role`. Unrecognized roles get none.
pub fn capabilities_of(role: &Role) -> BTreeSet<Capability> {
    let granted: &[Capability] = match role {
        Role::Admin => &Capability::ALL,
        Role::Manager => MANAGER,
        Role::Analyst => ANALYST,
        Role::Viewer => VIEWER,
        Role::Unrecognized(_) => &[],
    };
    granted.iter().copied().collect()
}
