//! Property tests for the invariants the compliance workflow leans on:
//! the completeness gate, score aggregation bounds, threshold monotonicity,
//! and forward-only alert transitions.

use proptest::prelude::*;

use sarlaft_core::{ActorRef, AlertId, DossierId, Role, RulesError};
use sarlaft_engine::{
    Alert, AlertClassification, AlertLevel, AlertStatus, AlertType, Dossier, EvaluationType,
    RiskEngine, RiskFactor, RiskPolicy, SubjectType, MAX_FACTOR_WEIGHT,
    REVIEW_COMPLETENESS_THRESHOLD, SCORE_CEILING,
};

fn commercial() -> ActorRef {
    ActorRef::new("jperez", Role::Commercial)
}

fn analyst() -> ActorRef {
    ActorRef::new("lrojas", Role::ComplianceAnalyst)
}

fn officer() -> ActorRef {
    ActorRef::new("mgarcia", Role::ComplianceOfficer)
}

fn subject_type() -> impl Strategy<Value = SubjectType> {
    prop_oneof![
        Just(SubjectType::Client),
        Just(SubjectType::Intermediary),
        Just(SubjectType::Employee),
        Just(SubjectType::Provider),
        Just(SubjectType::Reinsurer),
        Just(SubjectType::Retrocessionaire),
    ]
}

fn factors() -> impl Strategy<Value = Vec<RiskFactor>> {
    prop::collection::vec(
        (0.0f64..=MAX_FACTOR_WEIGHT).prop_map(|weight| RiskFactor {
            factor_id: "factor".to_string(),
            weight,
            observation: None,
        }),
        0..8,
    )
}

proptest! {
    /// Below the threshold, submission fails for every subject type and
    /// completeness value; at or above it, submission succeeds.
    #[test]
    fn completeness_gate_holds(pct in 0u8..=100, subject in subject_type()) {
        let mut dossier = Dossier::create(DossierId::new(), subject, &commercial()).unwrap();
        dossier.update_completeness(&commercial(), pct).unwrap();
        let result = dossier.submit_for_review(&commercial());
        if pct < REVIEW_COMPLETENESS_THRESHOLD {
            let is_incomplete = matches!(result, Err(RulesError::IncompleteDossier { .. }));
            prop_assert!(is_incomplete);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// The aggregated score is always within the 0–5 scale.
    #[test]
    fn score_stays_on_scale(factors in factors()) {
        let dossier = Dossier::create(DossierId::new(), SubjectType::Client, &commercial()).unwrap();
        let engine = RiskEngine::new(RiskPolicy::default()).unwrap();
        let eval = engine
            .evaluate(&dossier, None, EvaluationType::Inicial, factors, 1, &analyst())
            .unwrap();
        prop_assert!(eval.total_score >= 0.0);
        prop_assert!(eval.total_score <= SCORE_CEILING);
    }

    /// Adding one more factor never lowers the aggregated score.
    #[test]
    fn extra_factor_never_lowers_score(
        factors in factors(),
        extra in 0.0f64..=MAX_FACTOR_WEIGHT,
    ) {
        let dossier = Dossier::create(DossierId::new(), SubjectType::Client, &commercial()).unwrap();
        let engine = RiskEngine::new(RiskPolicy::default()).unwrap();
        let base = engine
            .evaluate(&dossier, None, EvaluationType::Inicial, factors.clone(), 1, &analyst())
            .unwrap();

        let mut more = factors;
        more.push(RiskFactor {
            factor_id: "extra".to_string(),
            weight: extra,
            observation: None,
        });
        let with_extra = engine
            .evaluate(&dossier, None, EvaluationType::Inicial, more, 2, &analyst())
            .unwrap();
        prop_assert!(with_extra.total_score >= base.total_score);
    }

    /// The score-to-level mapping is monotone: a higher score never maps to
    /// a lower level.
    #[test]
    fn level_mapping_is_monotone(a in 0.0f64..=SCORE_CEILING, b in 0.0f64..=SCORE_CEILING) {
        let policy = RiskPolicy::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(policy.level_for(lo) <= policy.level_for(hi));
    }

    /// Under any sequence of lifecycle calls, alert transitions only move
    /// forward and nothing ever leaves CERRADA.
    #[test]
    fn alert_never_regresses(ops in prop::collection::vec(0u8..4, 0..12)) {
        let mut alert = Alert::manual(
            AlertId::new(),
            DossierId::new(),
            AlertType::ManualReview,
            AlertLevel::Media,
            &analyst(),
        )
        .unwrap();

        for op in ops {
            // Results are intentionally ignored; illegal calls must reject
            // without mutating.
            let _ = match op {
                0 => alert.mark_follow_up(&analyst(), "tracking"),
                1 => alert.mark_attended(&analyst(), "attended"),
                2 => alert.close(&officer(), "closing", AlertClassification::Mitigado),
                _ => alert.mark_follow_up(&analyst(), ""),
            };
        }

        prop_assert!(alert.transitions.iter().all(|t| t.from < t.to));
        prop_assert!(alert
            .transitions
            .iter()
            .all(|t| t.from != AlertStatus::Cerrada));
        if alert.status == AlertStatus::Cerrada {
            prop_assert!(alert.closure.is_some());
        }
    }
}
