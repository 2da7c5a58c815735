use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Fixed taxonomy of activist-proposal categories.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GovernanceReform,
    TreasuryActivism,
    ProtocolActivism,
    CommunityActivism,
    EconomicActivism,
    SocialActivism,
    StrategicActivism,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GovernanceReform => "governance_reform",
            Category::TreasuryActivism => "treasury_activism",
            Category::ProtocolActivism => "protocol_activism",
            Category::CommunityActivism => "community_activism",
            Category::EconomicActivism => "economic_activism",
            Category::SocialActivism => "social_activism",
            Category::StrategicActivism => "strategic_activism",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived classification attached to a proposal after scoring.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivistScore {
    #[serde(rename = "activist_score")]
    pub score: f64,
    pub matched_categories: BTreeSet<Category>,
    pub detection_methods: BTreeSet<String>,
}

impl ActivistScore {
    pub fn is_activist(&self, threshold: f64) -> bool {
        self.score >= threshold
    }

    pub fn categories_joined(&self) -> String {
        self.matched_categories
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join("+")
    }

    pub fn methods_joined(&self) -> String {
        self.detection_methods
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("+")
    }
}
