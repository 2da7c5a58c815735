use crate::models::score::Category;

/// Keyword taxonomy. Matching is plain substring containment over the
/// lowercased text; per-category contribution is normalized by list length,
/// so each list carries only its strongest terms.
pub const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::GovernanceReform,
        &[
            "constitution",
            "governance",
            "reform",
            "change",
            "amendment",
            "framework",
            "voting",
            "election",
            "delegate",
            "representation",
            "decentralization",
            "democracy",
        ],
    ),
    (
        Category::TreasuryActivism,
        &[
            "treasury",
            "funding",
            "grant",
            "budget",
            "allocation",
            "diversification",
            "transparency",
            "accountability",
            "audit",
            "retroactive",
        ],
    ),
    (
        Category::ProtocolActivism,
        &[
            "protocol",
            "upgrade",
            "parameter",
            "configuration",
            "adjustment",
            "implementation",
            "deployment",
            "migration",
            "security",
            "mitigation",
        ],
    ),
    (
        Category::CommunityActivism,
        &[
            "community",
            "contributor",
            "ecosystem",
            "adoption",
            "engagement",
            "onboarding",
            "diversity",
            "inclusion",
            "collaboration",
            "partnership",
        ],
    ),
    (
        Category::EconomicActivism,
        &[
            "tokenomics",
            "monetary",
            "inflation",
            "supply",
            "demand",
            "market",
            "fee",
            "revenue",
            "sustainability",
            "valuation",
        ],
    ),
    (
        Category::SocialActivism,
        &[
            "mission",
            "ethics",
            "responsibility",
            "environment",
            "climate",
            "carbon",
            "renewable",
            "equality",
            "justice",
            "privacy",
        ],
    ),
    (
        Category::StrategicActivism,
        &[
            "strategy",
            "strategic",
            "vision",
            "roadmap",
            "expansion",
            "scaling",
            "integration",
            "interoperability",
            "cross-chain",
            "acquisition",
        ],
    ),
];

/// Phrases that signal activist framing in the body text.
pub const CONTEXT_PHRASES: &[&str] = &[
    "we propose",
    "this proposal",
    "community should",
    "dao needs",
    "governance improvement",
    "protocol enhancement",
    "treasury management",
    "voting mechanism",
    "delegate system",
    "community governance",
    "decentralized decision",
    "collective action",
];

/// Strong indicator words checked against the title alone.
pub const TITLE_INDICATORS: &[&str] = &[
    "proposal",
    "improvement",
    "enhancement",
    "reform",
    "change",
    "update",
    "upgrade",
    "amendment",
    "governance",
    "treasury",
    "community",
    "protocol",
    "framework",
    "constitution",
];

/// Proposal-ID-like prefixes ("AIP-12", "SIP 4", ...) earn a title bonus.
pub const TITLE_PREFIXES: &[&str] = &["aip", "sip", "pip", "rfc", "gip", "proposal"];
