//! Quarter processor: folds a quarter's tactics into KPIs and a result record.

use rust_decimal::Decimal;
use sim_core::{ImpactVector, Kpis, QuarterData, QuarterResult, Tactic, TacticCategory, TalentCandidate};

/// Output of [`process_quarter`].
#[derive(Clone, Debug, PartialEq)]
pub struct QuarterOutcome {
    pub result: QuarterResult,
    /// Cumulative KPIs after the quarter.
    pub kpis: Kpis,
}

/// Product of the skill multipliers of hires specialised in `category`.
pub fn category_multiplier(team: &[TalentCandidate], category: TacticCategory) -> f64 {
    team.iter()
        .filter(|t| t.specialty == category)
        .map(|t| t.skill_multiplier)
        .product()
}

/// Sum of the tactics' expected impacts, each scaled by the team's multiplier
/// for its category.
pub fn tactic_impact(tactics: &[Tactic], team: &[TalentCandidate]) -> ImpactVector {
    tactics.iter().fold(ImpactVector::default(), |acc, t| {
        let m = category_multiplier(team, t.category);
        if m == 1.0 {
            acc + t.expected_impact.clone()
        } else {
            acc + t.expected_impact.scaled(m)
        }
    })
}

/// Finalize a quarter.
///
/// `kpis_before` already contains the wildcard and big-bet impacts resolved
/// during the quarter; only the tactic contribution and the quarter's spend
/// are rolled in here. The result's revenue covers tactics and events alike.
pub fn process_quarter(quarter: &QuarterData, team: &[TalentCandidate], kpis_before: &Kpis) -> QuarterOutcome {
    let tactics = tactic_impact(&quarter.tactics, team);

    let mut event_revenue: Decimal = quarter.wildcard_impacts.iter().map(|w| w.impact.revenue).sum();
    if let Some(o) = &quarter.big_bet_outcome {
        event_revenue += o.actual_impact.revenue;
    }

    let mut kpis = kpis_before.clone();
    kpis.apply(&tactics);
    kpis.profit -= quarter.budget_spent;

    let revenue = tactics.revenue + event_revenue;
    let result = QuarterResult {
        revenue,
        profit: revenue - quarter.budget_spent,
        market_share: kpis.market_share,
        customer_satisfaction: kpis.customer_satisfaction,
        brand_awareness: kpis.brand_awareness,
        budget_spent: quarter.budget_spent,
        time_spent: quarter.time_spent,
    };
    QuarterOutcome { result, kpis }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{BigBetOutcome, ResolvedWildcard};

    fn tactic(id: &str, category: TacticCategory, cost: i64, revenue: i64, share: f64) -> Tactic {
        Tactic {
            id: id.into(),
            name: id.into(),
            category,
            cost: Decimal::new(cost, 0),
            time_required: 10,
            expected_impact: ImpactVector::new(Decimal::new(revenue, 0), share, 1.0, 2.0),
        }
    }

    fn quarter(tactics: Vec<Tactic>) -> QuarterData {
        let mut q = QuarterData {
            tactics,
            ..QuarterData::default()
        };
        q.recompute_ledger();
        q
    }

    #[test]
    fn two_tactics_roll_into_kpis() {
        let q = quarter(vec![
            tactic("a", TacticCategory::Digital, 50_000, 80_000, 1.0),
            tactic("b", TacticCategory::Content, 30_000, 40_000, 0.5),
        ]);
        let out = process_quarter(&q, &[], &Kpis::default());
        assert_eq!(out.result.revenue, Decimal::new(120_000, 0));
        assert_eq!(out.result.budget_spent, Decimal::new(80_000, 0));
        assert_eq!(out.result.profit, Decimal::new(40_000, 0));
        assert_eq!(out.result.time_spent, 20);
        assert_eq!(out.kpis.revenue, Decimal::new(120_000, 0));
        assert_eq!(out.kpis.profit, Decimal::new(40_000, 0));
        assert!((out.kpis.market_share - 1.5).abs() < 1e-9);
    }

    #[test]
    fn talent_scales_only_its_category() {
        let q = quarter(vec![
            tactic("a", TacticCategory::Digital, 10_000, 100_000, 1.0),
            tactic("b", TacticCategory::Events, 10_000, 100_000, 1.0),
        ]);
        let team = [TalentCandidate {
            id: "t".into(),
            name: "T".into(),
            specialty: TacticCategory::Digital,
            cost: Decimal::ZERO,
            skill_multiplier: 1.5,
        }];
        let out = process_quarter(&q, &team, &Kpis::default());
        assert_eq!(out.result.revenue, Decimal::new(250_000, 0));
        assert_eq!(category_multiplier(&team, TacticCategory::Events), 1.0);
    }

    #[test]
    fn event_revenue_counts_in_result_not_twice_in_kpis() {
        let mut q = quarter(vec![tactic("a", TacticCategory::Digital, 10_000, 50_000, 0.0)]);
        let wildcard = ImpactVector::new(Decimal::new(-20_000, 0), -1.0, 0.0, 0.0);
        q.wildcard_impacts.push(ResolvedWildcard {
            wildcard_id: "w".into(),
            choice_id: "c".into(),
            cost: Decimal::ZERO,
            time_required: 0,
            impact: wildcard.clone(),
        });
        q.big_bet_outcome = Some(BigBetOutcome {
            option_id: "b".into(),
            success: true,
            success_probability: 0.5,
            roll: 0.1,
            actual_impact: ImpactVector::new(Decimal::new(5_000, 0), 0.0, 0.0, 0.0),
        });
        let mut before = Kpis::default();
        before.apply(&wildcard);
        let out = process_quarter(&q, &[], &before);
        assert_eq!(out.result.revenue, Decimal::new(35_000, 0));
        assert_eq!(out.kpis.revenue, Decimal::new(30_000, 0));
        assert_eq!(out.result.profit, Decimal::new(25_000, 0));
    }

    #[test]
    fn percentages_are_clamped_levels() {
        let q = quarter(vec![tactic("a", TacticCategory::Digital, 0, 0, 80.0)]);
        let before = Kpis {
            market_share: 50.0,
            ..Kpis::default()
        };
        let out = process_quarter(&q, &[], &before);
        assert_eq!(out.result.market_share, 100.0);
        assert_eq!(out.kpis.market_share, 100.0);
    }

    #[test]
    fn processing_is_idempotent() {
        let q = quarter(vec![tactic("a", TacticCategory::Digital, 1, 2, 0.1)]);
        let k = Kpis::default();
        assert_eq!(process_quarter(&q, &[], &k), process_quarter(&q, &[], &k));
    }
}
