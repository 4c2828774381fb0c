//! Static plan, pricing and credit-pack catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::reports::types::ReportType;

/// Reports a FREE workspace may generate per month regardless of its
/// credit balance.
pub const FREE_MONTHLY_REPORT_CAP: i32 = 3;

/// Days between monthly credit resets.
pub const CREDIT_RESET_INTERVAL_DAYS: i64 = 30;

/// Subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Pro => "PRO",
            Plan::Enterprise => "ENTERPRISE",
        }
    }

    /// Credits granted at each monthly reset.
    pub fn monthly_credits(&self) -> i32 {
        match self {
            Plan::Free => 3,
            Plan::Pro => 20,
            Plan::Enterprise => 100,
        }
    }

    pub fn can_publish(&self) -> bool {
        !matches!(self, Plan::Free)
    }

    pub fn price_cents(&self) -> i64 {
        match self {
            Plan::Free => 0,
            Plan::Pro => 4_900,
            Plan::Enterprise => 14_900,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free Plan",
            Plan::Pro => "Pro Plan",
            Plan::Enterprise => "Enterprise Plan",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Plan::Free),
            "PRO" => Ok(Plan::Pro),
            "ENTERPRISE" => Ok(Plan::Enterprise),
            other => Err(format!("unknown plan: {other}")),
        }
    }
}

/// Credit cost for generating one report of the given type.
pub fn report_cost(report_type: ReportType) -> i32 {
    match report_type {
        ReportType::TrackingReadiness => 1,
        ReportType::SpendBaseline => 2,
        ReportType::CompetitorSnapshot => 3,
    }
}

/// A purchasable one-off credit bundle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreditPack {
    pub id: &'static str,
    pub name: &'static str,
    pub credits: i32,
    pub price_cents: i64,
    pub description: &'static str,
    pub is_popular: bool,
    pub discount_percent: i32,
}

pub const CREDIT_PACKS: &[CreditPack] = &[
    CreditPack {
        id: "pack_10",
        name: "Starter Pack",
        credits: 10,
        price_cents: 1_900,
        description: "Perfect for small businesses getting started",
        is_popular: false,
        discount_percent: 0,
    },
    CreditPack {
        id: "pack_25",
        name: "Growth Pack",
        credits: 25,
        price_cents: 3_900,
        description: "Great for growing businesses",
        is_popular: true,
        discount_percent: 18,
    },
    CreditPack {
        id: "pack_50",
        name: "Scale Pack",
        credits: 50,
        price_cents: 6_900,
        description: "For businesses at scale",
        is_popular: false,
        discount_percent: 27,
    },
];

pub fn credit_pack(id: &str) -> Option<&'static CreditPack> {
    CREDIT_PACKS.iter().find(|pack| pack.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_costs() {
        assert_eq!(report_cost(ReportType::TrackingReadiness), 1);
        assert_eq!(report_cost(ReportType::SpendBaseline), 2);
        assert_eq!(report_cost(ReportType::CompetitorSnapshot), 3);
    }

    #[test]
    fn test_plan_roundtrip_and_entitlements() {
        for plan in [Plan::Free, Plan::Pro, Plan::Enterprise] {
            assert_eq!(plan.as_str().parse::<Plan>().unwrap(), plan);
        }
        assert_eq!(Plan::Free.monthly_credits(), 3);
        assert_eq!(Plan::Pro.monthly_credits(), 20);
        assert_eq!(Plan::Enterprise.monthly_credits(), 100);
        assert!(!Plan::Free.can_publish());
        assert!(Plan::Pro.can_publish());
    }

    #[test]
    fn test_credit_pack_lookup() {
        assert_eq!(credit_pack("pack_25").unwrap().credits, 25);
        assert!(credit_pack("pack_999").is_none());
    }
}
