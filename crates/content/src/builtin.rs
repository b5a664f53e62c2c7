//! Built-in content tables.

use crate::{EnhancedWildcard, WildcardTrigger};
use rust_decimal::Decimal;
use sim_core::{
    BigBetOption, ContextSensitivity, ImpactVector, QuarterKey, Tactic, TacticCategory,
    TalentCandidate, WildcardChoice, WildcardEvent, WildcardType,
};

fn usd(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn impact(revenue: i64, share: f64, satisfaction: f64, awareness: f64) -> ImpactVector {
    ImpactVector::new(usd(revenue), share, satisfaction, awareness)
}

fn tactic(
    id: &str,
    name: &str,
    category: TacticCategory,
    cost: i64,
    time_required: u32,
    expected_impact: ImpactVector,
) -> Tactic {
    Tactic {
        id: id.to_string(),
        name: name.to_string(),
        category,
        cost: usd(cost),
        time_required,
        expected_impact,
    }
}

fn choice(id: &str, label: &str, cost: i64, time_required: u32, impact: ImpactVector) -> WildcardChoice {
    WildcardChoice {
        id: id.to_string(),
        label: label.to_string(),
        cost: usd(cost),
        time_required,
        impact,
    }
}

fn talent(id: &str, name: &str, specialty: TacticCategory, cost: i64, skill_multiplier: f64) -> TalentCandidate {
    TalentCandidate {
        id: id.to_string(),
        name: name.to_string(),
        specialty,
        cost: usd(cost),
        skill_multiplier,
    }
}

pub(crate) fn tactics() -> Vec<Tactic> {
    use TacticCategory::*;
    vec![
        tactic("search-ads", "Paid search campaign", Digital, 50_000, 20, impact(80_000, 1.0, 0.5, 3.0)),
        tactic("social-push", "Social media push", Digital, 30_000, 15, impact(40_000, 0.5, 1.0, 4.0)),
        tactic("email-nurture", "Email nurture flow", Digital, 15_000, 10, impact(25_000, 0.3, 1.5, 0.5)),
        tactic("tv-spot", "Prime-time TV spot", Traditional, 90_000, 30, impact(120_000, 1.5, 0.0, 8.0)),
        tactic("print-ads", "Trade magazine print ads", Traditional, 25_000, 10, impact(20_000, 0.3, 0.0, 2.0)),
        tactic("radio", "Regional radio", Traditional, 20_000, 10, impact(22_000, 0.4, 0.0, 2.5)),
        tactic("blog-series", "Expert blog series", Content, 12_000, 25, impact(18_000, 0.3, 2.0, 2.0)),
        tactic("video-series", "Customer story videos", Content, 40_000, 30, impact(45_000, 0.6, 2.5, 5.0)),
        tactic("whitepaper", "Industry whitepaper", Content, 10_000, 20, impact(15_000, 0.2, 1.0, 1.0)),
        tactic("trade-show", "Trade show booth", Events, 60_000, 25, impact(70_000, 1.0, 1.5, 3.5)),
        tactic("webinar", "Product webinar", Events, 8_000, 10, impact(12_000, 0.2, 1.5, 1.0)),
        tactic("launch-event", "Launch event", Events, 70_000, 35, impact(95_000, 1.2, 2.0, 6.0)),
        tactic("co-marketing", "Co-marketing with a partner brand", Partnerships, 35_000, 20, impact(50_000, 0.8, 1.0, 3.0)),
        tactic("influencers", "Influencer program", Partnerships, 45_000, 15, impact(55_000, 0.7, 0.5, 5.0)),
        tactic("affiliates", "Affiliate network", Partnerships, 20_000, 10, impact(30_000, 0.5, 0.0, 1.0)),
    ]
}

pub(crate) fn wildcards() -> Vec<WildcardEvent> {
    vec![
        WildcardEvent {
            id: "supply-delay".into(),
            kind: WildcardType::Crisis,
            title: "Supply chain delay".into(),
            description: "A key supplier misses its delivery window.".into(),
            choices: vec![
                choice("absorb", "Absorb the delay", 0, 0, impact(-20_000, -1.0, -3.0, 0.0)),
                choice("expedite", "Pay to expedite", 15_000, 5, impact(0, 0.0, 1.0, 0.0)),
                choice("communicate", "Be upfront with customers", 2_000, 5, impact(-10_000, 0.0, 2.0, 0.0)),
            ],
            sensitivity: None,
        },
        WildcardEvent {
            id: "viral-moment".into(),
            kind: WildcardType::Opportunity,
            title: "Unexpected viral post".into(),
            description: "A customer's post about the product is spreading fast.".into(),
            choices: vec![
                choice("amplify", "Amplify with paid reach", 10_000, 10, impact(30_000, 0.5, 0.0, 5.0)),
                choice("ignore", "Let it run its course", 0, 0, impact(5_000, 0.0, 0.0, 1.0)),
            ],
            sensitivity: None,
        },
        WildcardEvent {
            id: "channel-shift".into(),
            kind: WildcardType::MarketShift,
            title: "Audience moves to a new platform".into(),
            description: "Engagement is migrating away from your main channel.".into(),
            choices: vec![
                choice("pivot", "Pivot spend to the new platform", 20_000, 15, impact(25_000, 1.5, 0.0, 2.0)),
                choice("hold", "Hold course", 0, 0, impact(-15_000, -1.0, 0.0, -1.0)),
            ],
            sensitivity: None,
        },
        WildcardEvent {
            id: "price-cut".into(),
            kind: WildcardType::CompetitorAction,
            title: "Competitor cuts prices".into(),
            description: "Your main competitor drops prices by 15%.".into(),
            choices: vec![
                choice("match", "Match the price cut", 0, 0, impact(-25_000, 0.5, 1.0, 0.0)),
                choice("differentiate", "Double down on differentiation", 15_000, 10, impact(5_000, 0.0, 2.0, 2.0)),
                choice("ignore", "Ignore it", 0, 0, impact(-10_000, -1.5, 0.0, 0.0)),
            ],
            sensitivity: None,
        },
    ]
}

pub(crate) fn enhanced_wildcards() -> Vec<EnhancedWildcard> {
    use TacticCategory::*;
    vec![
        EnhancedWildcard {
            quarter: QuarterKey::Q1,
            trigger: WildcardTrigger::Always,
            event: WildcardEvent {
                id: "early-adopters".into(),
                kind: WildcardType::Opportunity,
                title: "Early adopter community forms".into(),
                description: "A small but vocal group wants early access.".into(),
                choices: vec![
                    choice("beta-program", "Run a beta program", 8_000, 10, impact(10_000, 0.3, 3.0, 2.0)),
                    choice("decline", "Stay focused on the plan", 0, 0, impact(0, 0.0, -1.0, 0.0)),
                ],
                sensitivity: Some(ContextSensitivity {
                    momentum_sensitive: false,
                    relevant_talent: vec![Content],
                    talent_factor: 1.2,
                }),
            },
        },
        EnhancedWildcard {
            quarter: QuarterKey::Q2,
            trigger: WildcardTrigger::MarketShareAbove(3.0),
            event: WildcardEvent {
                id: "competitor-launch".into(),
                kind: WildcardType::CompetitorAction,
                title: "Competitor launches a rival product".into(),
                description: "Your growing share drew a direct response.".into(),
                choices: vec![
                    choice("counter-campaign", "Launch a counter campaign", 25_000, 15, impact(20_000, 1.0, 0.0, 3.0)),
                    choice("loyalty-offer", "Reward existing customers", 15_000, 10, impact(-5_000, 0.5, 3.0, 0.0)),
                    choice("wait", "Wait and watch", 0, 0, impact(-30_000, -2.0, 0.0, -1.0)),
                ],
                sensitivity: Some(ContextSensitivity {
                    momentum_sensitive: true,
                    relevant_talent: vec![Digital, Partnerships],
                    talent_factor: 1.2,
                }),
            },
        },
        EnhancedWildcard {
            quarter: QuarterKey::Q3,
            trigger: WildcardTrigger::Always,
            event: WildcardEvent {
                id: "pr-crisis".into(),
                kind: WildcardType::Crisis,
                title: "Product defect goes public".into(),
                description: "A defect report is trending on social media.".into(),
                choices: vec![
                    choice("recall", "Voluntary recall", 30_000, 20, impact(-40_000, 0.0, 5.0, 1.0)),
                    choice("statement", "Issue a public statement", 5_000, 5, impact(-20_000, -0.5, -2.0, 0.0)),
                    choice("deny", "Deny the reports", 0, 0, impact(-35_000, -1.5, -8.0, -2.0)),
                ],
                sensitivity: Some(ContextSensitivity {
                    momentum_sensitive: true,
                    relevant_talent: vec![Content, Traditional],
                    talent_factor: 1.25,
                }),
            },
        },
        EnhancedWildcard {
            quarter: QuarterKey::Q4,
            trigger: WildcardTrigger::RevenueAbove(usd(200_000)),
            event: WildcardEvent {
                id: "holiday-surge".into(),
                kind: WildcardType::Opportunity,
                title: "Holiday demand surge".into(),
                description: "Seasonal demand is outpacing forecasts.".into(),
                choices: vec![
                    choice("scale-up", "Scale up campaigns", 20_000, 10, impact(60_000, 1.0, 0.0, 3.0)),
                    choice("premium", "Launch a premium bundle", 10_000, 10, impact(35_000, 0.5, 2.0, 1.0)),
                ],
                sensitivity: Some(ContextSensitivity {
                    momentum_sensitive: true,
                    relevant_talent: vec![Events, Digital],
                    talent_factor: 1.15,
                }),
            },
        },
    ]
}

pub(crate) fn talent_pool() -> Vec<TalentCandidate> {
    use TacticCategory::*;
    vec![
        talent("growth-marketer", "Ana Ruiz, growth marketer", Digital, 20_000, 1.2),
        talent("content-strategist", "Ben Okafor, content strategist", Content, 15_000, 1.25),
        talent("event-producer", "Cara Lind, event producer", Events, 18_000, 1.2),
        talent("partnership-lead", "Dev Patel, partnership lead", Partnerships, 22_000, 1.3),
        talent("brand-manager", "Eli Novak, brand manager", Traditional, 25_000, 1.2),
        talent("performance-analyst", "Fay Chen, performance analyst", Digital, 12_000, 1.1),
        talent("community-manager", "Gus Moreau, community manager", Content, 10_000, 1.1),
        talent("media-buyer", "Hana Sato, media buyer", Traditional, 16_000, 1.15),
    ]
}

pub(crate) fn big_bets() -> Vec<BigBetOption> {
    vec![
        BigBetOption {
            id: "global-expansion".into(),
            name: "Expand into two new countries".into(),
            strategy: "Localized launch backed by a regional media blitz.".into(),
            cost: usd(60_000),
            risk: 0.7,
            potential_impact: impact(300_000, 5.0, 0.0, 10.0),
        },
        BigBetOption {
            id: "product-line".into(),
            name: "Launch a companion product line".into(),
            strategy: "Cross-sell into the existing customer base.".into(),
            cost: usd(50_000),
            risk: 0.5,
            potential_impact: impact(200_000, 3.0, 3.0, 5.0),
        },
        BigBetOption {
            id: "rebrand".into(),
            name: "Full rebrand".into(),
            strategy: "New identity, new positioning, one big reveal.".into(),
            cost: usd(40_000),
            risk: 0.4,
            potential_impact: impact(100_000, 1.0, 5.0, 12.0),
        },
    ]
}
