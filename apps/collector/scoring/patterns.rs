use crate::models::score::Category;
use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern families over the lowercased text. Each match contributes a fixed
/// increment toward the pattern detector's score.
pub static PATTERNS: Lazy<Vec<(Regex, Category)>> = Lazy::new(|| {
    [
        (
            r"\b(propose|proposal)\s+to\s+(change|modify|update|improve|reform)",
            Category::GovernanceReform,
        ),
        (
            r"\b(treasury|fund|grant)\s+(allocation|distribution|management)",
            Category::TreasuryActivism,
        ),
        (
            r"\b(protocol|parameter)\s+(upgrade|change|adjustment)",
            Category::ProtocolActivism,
        ),
        (
            r"\b(community|governance)\s+(improvement|enhancement|reform)",
            Category::CommunityActivism,
        ),
        (
            r"\b(token|economic|monetary)\s+(model|policy|mechanism)",
            Category::EconomicActivism,
        ),
        (
            r"\b(constitution|framework|structure)\s+(amendment|change|update)",
            Category::GovernanceReform,
        ),
        (
            r"\b(voting|election|delegate)\s+(process|system|mechanism)",
            Category::GovernanceReform,
        ),
        (
            r"\b(transparency|accountability|oversight)\s+(measure|initiative)",
            Category::GovernanceReform,
        ),
        (
            r"\b(incentive|reward|compensation)\s+(program|system|structure)",
            Category::TreasuryActivism,
        ),
        (
            r"\b(security|safety|risk)\s+(improvement|mitigation|enhancement)",
            Category::ProtocolActivism,
        ),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).expect("invalid pattern"), category))
    .collect()
});

/// Numeric parameters (percentages, dollar amounts, threshold language) hint
/// at concrete parameter-change proposals.
pub static NUMERIC_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+%|\$\d+|parameter|threshold|limit").expect("invalid pattern"));
