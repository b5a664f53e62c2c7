//! Scoring engine: ROI, overall score and grade from the four quarter results.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sim_core::{FinalResults, Grade, Kpis, QuarterResult};
use tracing::info;

/// Return on investment in percent; 0 when nothing was spent.
pub fn roi(total_revenue: Decimal, total_spent: Decimal) -> f64 {
    if total_spent <= Decimal::ZERO {
        return 0.0;
    }
    (total_revenue - total_spent)
        .checked_div(total_spent)
        .and_then(|r| r.checked_mul(Decimal::from(100)))
        .and_then(|r| r.to_f64())
        .unwrap_or(0.0)
}

/// `round((roi*0.4 + share*2 + satisfaction*0.8 + awareness*0.6) / 4)`,
/// rounding half away from zero.
pub fn overall_score(roi: f64, market_share: f64, satisfaction: f64, awareness: f64) -> i64 {
    let raw = (roi * 0.4 + market_share * 2.0 + satisfaction * 0.8 + awareness * 0.6) / 4.0;
    if raw.is_finite() {
        raw.round() as i64
    } else {
        0
    }
}

pub fn grade_for(score: i64) -> Grade {
    match score {
        s if s >= 90 => Grade::APlus,
        s if s >= 80 => Grade::A,
        s if s >= 70 => Grade::B,
        s if s >= 60 => Grade::C,
        _ => Grade::D,
    }
}

/// Compute the final results. The "final" percentages are Q4's ending levels.
pub fn score(results: &[QuarterResult; 4], kpis: &Kpis) -> FinalResults {
    let total_revenue: Decimal = results.iter().map(|r| r.revenue).sum();
    let total_budget_spent: Decimal = results.iter().map(|r| r.budget_spent).sum();
    let roi = roi(total_revenue, total_budget_spent);
    let last = &results[3];
    let overall_score = overall_score(
        roi,
        last.market_share,
        last.customer_satisfaction,
        last.brand_awareness,
    );
    let grade = grade_for(overall_score);
    info!(%total_revenue, %total_budget_spent, roi, overall_score, %grade, "scored simulation");
    FinalResults {
        final_kpis: kpis.clone(),
        total_revenue,
        total_budget_spent,
        roi,
        overall_score,
        grade,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(revenue: i64, spent: i64) -> QuarterResult {
        QuarterResult {
            revenue: Decimal::new(revenue, 0),
            profit: Decimal::new(revenue - spent, 0),
            market_share: 20.0,
            customer_satisfaction: 70.0,
            brand_awareness: 50.0,
            budget_spent: Decimal::new(spent, 0),
            time_spent: 0,
        }
    }

    #[test]
    fn reference_run_scores_42_d() {
        let rs = [
            result(100_000, 50_000),
            result(100_000, 50_000),
            result(100_000, 50_000),
            result(100_000, 50_000),
        ];
        let f = score(&rs, &Kpis::default());
        assert_eq!(f.total_revenue, Decimal::new(400_000, 0));
        assert_eq!(f.total_budget_spent, Decimal::new(200_000, 0));
        assert!((f.roi - 100.0).abs() < 1e-9);
        assert_eq!(f.overall_score, 42);
        assert_eq!(f.grade, Grade::D);
    }

    #[test]
    fn zero_spend_has_zero_roi() {
        assert_eq!(roi(Decimal::new(1_000, 0), Decimal::ZERO), 0.0);
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(grade_for(90), Grade::APlus);
        assert_eq!(grade_for(89), Grade::A);
        assert_eq!(grade_for(80), Grade::A);
        assert_eq!(grade_for(70), Grade::B);
        assert_eq!(grade_for(60), Grade::C);
        assert_eq!(grade_for(59), Grade::D);
        assert_eq!(grade_for(-10), Grade::D);
    }

    #[test]
    fn scoring_is_reproducible() {
        let rs = [
            result(10_000, 50_000),
            result(90_000, 40_000),
            result(300_000, 60_000),
            result(0, 0),
        ];
        assert_eq!(score(&rs, &Kpis::default()), score(&rs, &Kpis::default()));
    }

    proptest! {
        #[test]
        fn score_monotone_in_revenue(
            base in proptest::array::uniform4(0i64..500_000),
            bump in proptest::array::uniform4(1i64..100_000),
            spent in 1i64..200_000,
        ) {
            let lo = [
                result(base[0], spent), result(base[1], spent),
                result(base[2], spent), result(base[3], spent),
            ];
            let hi = [
                result(base[0] + bump[0], spent), result(base[1] + bump[1], spent),
                result(base[2] + bump[2], spent), result(base[3] + bump[3], spent),
            ];
            let k = Kpis::default();
            prop_assert!(score(&hi, &k).overall_score >= score(&lo, &k).overall_score);
        }
    }
}
