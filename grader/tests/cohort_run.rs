use async_trait::async_trait;
use grader::cohort_run::run_cohort;
use grader::discovery::{IdentityRule, discover_submissions, selection};
use marker::cohort::CohortAggregator;
use marker::error::MarkerError;
use marker::inventory::TestInventory;
use marker::traits::collector::VerdictCollector;
use marker::types::{SubgroupKey, Submission, Verdict};
use std::fs;
use util::grading_config::PolicyOptions;
use util::test_helpers::{make_submission, setup_test_submissions_root};

/// Every test passes, except that `bob` fails one test in each subgroup and `dave`'s
/// runner breaks.
struct ScriptedCollector;

#[async_trait]
impl VerdictCollector for ScriptedCollector {
    async fn collect(
        &self,
        submission: &Submission,
        key: SubgroupKey,
    ) -> Result<Vec<Verdict>, MarkerError> {
        match submission.identity.as_str() {
            "dave" => Err(MarkerError::MalformedResult("no report".to_string())),
            "bob" => Ok(vec![
                Verdict::passed(format!("{key}::a")),
                Verdict::failed(format!("{key}::b")),
            ]),
            _ => Ok(vec![
                Verdict::passed(format!("{key}::a")),
                Verdict::passed(format!("{key}::b")),
            ]),
        }
    }
}

fn inventory() -> TestInventory {
    let counts = SubgroupKey::all().map(|k| (k, 2)).collect();
    TestInventory::from_counts(&PolicyOptions::default(), counts).unwrap()
}

const WASM: &[u8] = b"\0asm";

#[tokio::test]
async fn test_failed_submission_does_not_stop_the_cohort() {
    let root = setup_test_submissions_root();
    let alice = make_submission(root.path(), "final-less-alice", Some(("runtime.wasm", WASM)));
    let bob = make_submission(root.path(), "final-less-bob", Some(("runtime.wasm", WASM)));
    let carol = make_submission(root.path(), "final-less-carol", None);
    let dave = make_submission(root.path(), "final-less-dave", Some(("runtime.wasm", WASM)));
    fs::write(dave.join("result.md"), "stale").unwrap();

    let subs = discover_submissions(root.path(), &IdentityRule::new("final-less"), "runtime.wasm")
        .unwrap();
    let inventory = inventory();
    let mut aggregator = CohortAggregator::new();

    let summary = run_cohort(&subs, selection(None), &inventory, &ScriptedCollector, &mut aggregator)
        .await;

    assert_eq!(summary.graded, vec!["alice", "bob"]);
    let failed: Vec<&str> = summary.failed.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(failed, vec!["carol", "dave"]);
    assert!(summary.failed[0].1.contains("does not exist"));

    assert!(alice.join("result.md").is_file());
    assert!(bob.join("result.md").is_file());
    assert!(!carol.join("result.md").exists());
    assert!(!dave.join("result.md").exists());

    let report = aggregator.finalize();
    assert_eq!(report.scores.len(), 2);
    assert_eq!(report.scores[0].auto_grade, 4);
    // bob: one failure per subgroup fails every fundamentals subgroup and the distinction.
    assert_eq!(report.scores[1].auto_grade, 0);
    assert_eq!(report.scores[1].sum_failures, 15);
    assert_eq!(report.failures.len(), 15);
    assert!(report.failures.iter().all(|(_, count)| *count == 1));

    let md = fs::read_to_string(bob.join("result.md")).unwrap();
    assert!(md.contains("❌ failed basics::fundamentals with 1/2 successes."));
    assert!(md.contains("🤷 failed staking::optional with 1/2 successes."));
}

#[tokio::test]
async fn test_selection_predicate_limits_the_run() {
    let root = setup_test_submissions_root();
    make_submission(root.path(), "final-less-alice", Some(("runtime.wasm", WASM)));
    let bob = make_submission(root.path(), "final-less-bob", Some(("runtime.wasm", WASM)));

    let subs = discover_submissions(root.path(), &IdentityRule::new("final-less"), "runtime.wasm")
        .unwrap();
    let inventory = inventory();
    let mut aggregator = CohortAggregator::new();

    let summary = run_cohort(
        &subs,
        selection(Some("alice".to_string())),
        &inventory,
        &ScriptedCollector,
        &mut aggregator,
    )
    .await;

    assert_eq!(summary.graded, vec!["alice"]);
    assert_eq!(summary.skipped, 1);
    assert!(!bob.join("result.md").exists());
    assert_eq!(aggregator.graded(), 1);
}
