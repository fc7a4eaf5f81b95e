//! End-to-end tests for `run_daily_cycle` against an in-memory store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use uuid::Uuid;
use vdna_core::{Candidate, CandidateQuerySettings, Organization, PipelineSettings, RawScoreSet};
use vdna_pipeline::pipeline::ALL_CANDIDATES_PROCESSED;
use vdna_pipeline::report::NO_QUALIFYING_CANDIDATES;
use vdna_pipeline::{
    run_daily_cycle, CandidateSource, CreativeIdentity, CycleCollaborators, DedupStore, JobSink,
    NotifyError, OrganizationStore, PipelineError, ProductionOrder, ProductionOutcome,
    RunNotifier, RunReport, StoreError,
};

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryStore {
    candidates: Vec<Candidate>,
    organizations: Vec<Organization>,
    identities: HashMap<i64, CreativeIdentity>,
    balances: Mutex<HashMap<i64, i64>>,
    processed: Mutex<HashSet<(i64, String)>>,
    jobs: Mutex<Vec<ProductionOrder>>,
    fail_candidates: bool,
    fail_organizations: bool,
    fail_dedup: bool,
    fail_job_for_url: Option<String>,
}

impl MemoryStore {
    fn with_org(mut self, id: i64, name: &str, balance: i64) -> Self {
        self.organizations.push(Organization {
            id,
            public_id: Uuid::new_v4(),
            name: name.to_string(),
            autopilot_enabled: true,
            credit_balance: balance,
        });
        self.balances
            .get_mut()
            .expect("balances lock")
            .insert(id, balance);
        self
    }

    fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    fn balance(&self, org_id: i64) -> i64 {
        self.balances.lock().expect("balances lock")[&org_id]
    }

    fn jobs(&self) -> Vec<ProductionOrder> {
        self.jobs.lock().expect("jobs lock").clone()
    }

    fn jobs_for(&self, org_id: i64) -> Vec<ProductionOrder> {
        self.jobs()
            .into_iter()
            .filter(|j| j.organization_id == org_id)
            .collect()
    }

    fn collaborators<'a>(&'a self, notifier: &'a dyn RunNotifier) -> CycleCollaborators<'a> {
        CycleCollaborators {
            candidates: self,
            dedup: self,
            organizations: self,
            jobs: self,
            notifier,
        }
    }
}

#[async_trait]
impl CandidateSource for MemoryStore {
    async fn fetch_candidates(
        &self,
        query: &CandidateQuerySettings,
    ) -> Result<Vec<Candidate>, StoreError> {
        if self.fail_candidates {
            return Err(StoreError::Backend("candidate source offline".to_string()));
        }
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn find_processed_urls(&self, urls: &[String]) -> Result<HashSet<String>, StoreError> {
        if self.fail_dedup {
            return Err(StoreError::Backend("dedup store offline".to_string()));
        }
        let processed = self.processed.lock().expect("processed lock");
        Ok(urls
            .iter()
            .filter(|u| processed.iter().any(|(_, p)| p == *u))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn list_autopilot_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        if self.fail_organizations {
            return Err(StoreError::Backend("organization store offline".to_string()));
        }
        Ok(self.organizations.clone())
    }

    async fn default_creative_identity(
        &self,
        organization_id: i64,
    ) -> Result<Option<CreativeIdentity>, StoreError> {
        Ok(self.identities.get(&organization_id).cloned())
    }

    async fn credit_balance(&self, organization_id: i64) -> Result<i64, StoreError> {
        self.balances
            .lock()
            .expect("balances lock")
            .get(&organization_id)
            .copied()
            .ok_or_else(|| StoreError::Backend("unknown organization".to_string()))
    }
}

#[async_trait]
impl JobSink for MemoryStore {
    async fn create_production(
        &self,
        order: &ProductionOrder,
    ) -> Result<ProductionOutcome, StoreError> {
        if self.fail_job_for_url.as_deref() == Some(order.source_url.as_str()) {
            return Err(StoreError::Backend("insert failed".to_string()));
        }

        let mut processed = self.processed.lock().expect("processed lock");
        let key = (order.organization_id, order.source_url.clone());
        if processed.contains(&key) {
            return Ok(ProductionOutcome::AlreadyProcessed);
        }

        let mut balances = self.balances.lock().expect("balances lock");
        let balance = balances.entry(order.organization_id).or_insert(0);
        if *balance < order.credits {
            return Ok(ProductionOutcome::InsufficientCredits);
        }
        *balance -= order.credits;
        let balance_after = *balance;

        processed.insert(key);
        let mut jobs = self.jobs.lock().expect("jobs lock");
        jobs.push(order.clone());

        Ok(ProductionOutcome::Created {
            job_id: i64::try_from(jobs.len()).expect("job count fits"),
            public_id: Uuid::new_v4(),
            balance_after,
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    reports: Mutex<Vec<RunReport>>,
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.reports.lock().expect("reports lock").len()
    }

    fn last(&self) -> RunReport {
        self.reports
            .lock()
            .expect("reports lock")
            .last()
            .cloned()
            .expect("a report was delivered")
    }
}

#[async_trait]
impl RunNotifier for RecordingNotifier {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError> {
        self.reports.lock().expect("reports lock").push(report.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl RunNotifier for FailingNotifier {
    async fn notify(&self, _report: &RunReport) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected {
            status: 503,
            body: "mail relay down".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Candidate builders
// ---------------------------------------------------------------------------

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-10T06:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn candidate(id: i64, url: &str, duration: f64, raw: &RawScoreSet) -> Candidate {
    Candidate {
        id,
        url: url.to_string(),
        platform: "tiktok".to_string(),
        title: format!("Clip {id}"),
        transcript: None,
        view_count: 2_000_000,
        like_count: 50_000,
        comment_count: 1_000,
        duration_seconds: duration,
        captured_at: now() - Duration::hours(6),
        scores: raw.validate(duration),
    }
}

fn short_form(id: i64, url: &str, duration: f64, virality: f64) -> Candidate {
    let raw = RawScoreSet {
        commercial_fit_score: Some(80.0),
        virality_score: Some(virality),
        clone_feasibility_score: Some(75.0),
        content_type: Some("short_form".to_string()),
        ad_type: Some("ugc".to_string()),
        ..RawScoreSet::default()
    };
    candidate(id, url, duration, &raw)
}

fn long_form(id: i64, url: &str, duration: f64, informational: f64) -> Candidate {
    let raw = RawScoreSet {
        informational_value_score: Some(informational),
        transformation_score: Some(40.0),
        emotional_depth_score: Some(30.0),
        content_type: Some("long_form".to_string()),
        ad_type: Some("educational".to_string()),
        ..RawScoreSet::default()
    };
    candidate(id, url, duration, &raw)
}

fn settings() -> PipelineSettings {
    PipelineSettings::default()
}

// ---------------------------------------------------------------------------
// Selection end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ten_candidates_yield_four_short_and_two_long_jobs() {
    let mut candidates = Vec::new();
    for i in 0..6_u8 {
        candidates.push(short_form(
            i64::from(i),
            &format!("https://v/short-{i}"),
            30.0 + f64::from(i) * 5.0,
            50.0 + f64::from(i) * 5.0,
        ));
    }
    for (i, duration) in [(0_u8, 400.0), (1, 600.0), (2, 800.0)] {
        candidates.push(long_form(
            10 + i64::from(i),
            &format!("https://v/long-{i}"),
            duration,
            60.0 + f64::from(i) * 10.0,
        ));
    }
    candidates.push(short_form(99, "https://v/too-long", 120.0, 100.0));

    let store = MemoryStore::default()
        .with_candidates(candidates)
        .with_org(1, "Acme", 10_000);
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    assert_eq!(report.candidates_evaluated, 10);
    assert_eq!(report.short_form_selected, 4);
    assert_eq!(report.long_form_selected, 2);
    assert_eq!(report.new_candidates, 6);
    assert_eq!(report.duplicates_skipped, 0);
    assert_eq!(report.jobs_created.total, 6);
    assert_eq!(report.jobs_created.short_form, 4);
    assert_eq!(report.jobs_created.long_form, 2);
    assert!(report.early_exit_reason.is_none());

    let selected: Vec<&str> = report.selected.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        selected,
        vec![
            "https://v/short-5",
            "https://v/short-4",
            "https://v/short-3",
            "https://v/short-2",
            "https://v/long-2",
            "https://v/long-1",
        ]
    );
    assert!(!selected.contains(&"https://v/too-long"));

    assert_eq!(store.balance(1), 10_000 - 6 * 160);
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn jobs_carry_reason_cost_and_rotating_schedules() {
    let store = MemoryStore::default()
        .with_candidates(vec![
            short_form(1, "https://v/a", 30.0, 90.0),
            short_form(2, "https://v/b", 30.0, 80.0),
            long_form(3, "https://v/c", 500.0, 90.0),
        ])
        .with_org(1, "Acme", 10_000);
    let notifier = RecordingNotifier::default();

    run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    let jobs = store.jobs();
    assert_eq!(jobs.len(), 3);

    let first = &jobs[0];
    assert_eq!(first.source_url, "https://v/a");
    assert_eq!(first.credits, 160);
    assert_eq!(first.reason, "viral_cycle:short_form tiktok video: Clip 1");
    let hours: Vec<u32> = first.schedules.iter().map(|s| s.scheduled_for.hour()).collect();
    assert_eq!(hours, vec![9, 12, 15, 18]);
    assert!(first
        .schedules
        .iter()
        .all(|s| s.scheduled_for.date_naive().to_string() == "2026-03-11"));

    let second: Vec<u32> = jobs[1].schedules.iter().map(|s| s.scheduled_for.hour()).collect();
    assert_eq!(second, vec![12, 15, 18, 9]);

    let long: Vec<u32> = jobs[2].schedules.iter().map(|s| s.scheduled_for.hour()).collect();
    assert_eq!(long, vec![8, 20, 8, 20]);
}

#[tokio::test]
async fn creative_identity_is_attached_when_present() {
    let mut store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)])
        .with_org(1, "Acme", 1_000)
        .with_org(2, "Nobody", 1_000);
    store.identities.insert(
        1,
        CreativeIdentity {
            id: 42,
            name: "Acme Cola".to_string(),
        },
    );
    let notifier = RecordingNotifier::default();

    run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    assert_eq!(store.jobs_for(1)[0].creative_identity_id, Some(42));
    assert_eq!(store.jobs_for(2)[0].creative_identity_id, None);
}

#[tokio::test]
async fn repeated_input_urls_count_once() {
    let store = MemoryStore::default()
        .with_candidates(vec![
            short_form(1, "https://v/a", 30.0, 90.0),
            short_form(2, "https://v/a", 30.0, 95.0),
        ])
        .with_org(1, "Acme", 1_000);
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    assert_eq!(report.candidates_evaluated, 1);
    assert_eq!(report.jobs_created.total, 1);
    assert_eq!(store.jobs()[0].source_video_id, 1);
}

// ---------------------------------------------------------------------------
// Credits and dedup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_funded_organization_gets_a_job() {
    let store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)])
        .with_org(1, "Funded", 1_000)
        .with_org(2, "Empty", 0);
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    assert_eq!(report.jobs_created.total, 1);
    assert_eq!(report.pairings_skipped.total, 1);
    assert_eq!(report.pairings_skipped.insufficient_credits, 1);
    assert_eq!(report.organizations_processed, 2);
    assert_eq!(store.jobs_for(1).len(), 1);
    assert!(store.jobs_for(2).is_empty());
    assert_eq!(store.balance(1), 840);
    assert_eq!(store.balance(2), 0);
}

#[tokio::test]
async fn balance_below_cost_leaves_credits_untouched() {
    let store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)])
        .with_org(1, "Almost", 159);
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    assert_eq!(report.jobs_created.total, 0);
    assert_eq!(report.pairings_skipped.insufficient_credits, 1);
    assert_eq!(store.balance(1), 159);
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn second_run_skips_already_processed_source() {
    let store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)])
        .with_org(1, "Acme", 1_000);
    let notifier = RecordingNotifier::default();

    let first = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("first run");
    assert_eq!(first.jobs_created.total, 1);

    let second = run_daily_cycle(
        store.collaborators(&notifier),
        &settings(),
        Uuid::new_v4(),
        now() + Duration::days(1),
    )
    .await
    .expect("second run");

    assert!(second.duplicates_skipped >= 1);
    assert_eq!(second.jobs_created.total, 0);
    assert_eq!(
        second.early_exit_reason.as_deref(),
        Some(ALL_CANDIDATES_PROCESSED)
    );
    assert_eq!(store.jobs().len(), 1);
    assert_eq!(store.balance(1), 840);
}

#[tokio::test]
async fn source_processed_by_one_org_is_not_offered_to_others() {
    let store = MemoryStore::default()
        .with_candidates(vec![
            short_form(1, "https://v/a", 30.0, 90.0),
            short_form(2, "https://v/b", 30.0, 80.0),
        ])
        .with_org(1, "Acme", 1_000)
        .with_org(2, "Beta", 1_000);
    store
        .processed
        .lock()
        .expect("processed lock")
        .insert((1, "https://v/a".to_string()));
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("cycle should succeed");

    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.new_candidates, 1);
    assert_eq!(report.jobs_created.total, 2);
    assert!(store.jobs().iter().all(|j| j.source_url == "https://v/b"));
}

#[tokio::test]
async fn claim_conflict_is_a_skip_when_batch_lookup_is_unavailable() {
    let mut store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)])
        .with_org(1, "Acme", 1_000)
        .with_org(2, "Beta", 1_000);
    store.fail_dedup = true;
    store
        .processed
        .lock()
        .expect("processed lock")
        .insert((1, "https://v/a".to_string()));
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("dedup lookup failure is not fatal");

    assert_eq!(report.duplicates_skipped, 0);
    assert_eq!(report.pairings_skipped.already_processed, 1);
    assert_eq!(report.jobs_created.total, 1);
    assert!(store.jobs_for(1).is_empty());
    assert_eq!(store.balance(1), 1_000);
    assert_eq!(store.jobs_for(2).len(), 1);
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_pool_ends_early_without_touching_organizations() {
    let mut store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/too-long", 120.0, 90.0)])
        .with_org(1, "Acme", 1_000);
    store.fail_organizations = true;
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("early exit is a success");

    assert_eq!(
        report.early_exit_reason.as_deref(),
        Some(NO_QUALIFYING_CANDIDATES)
    );
    assert_eq!(report.candidates_evaluated, 1);
    assert_eq!(report.jobs_created.total, 0);
    assert_eq!(report.organizations_processed, 0);
    assert!(report.completed_at.is_some());
    assert_eq!(
        notifier.last().early_exit_reason.as_deref(),
        Some(NO_QUALIFYING_CANDIDATES)
    );
}

#[tokio::test]
async fn candidate_fetch_failure_fails_the_run() {
    let mut store = MemoryStore::default().with_org(1, "Acme", 1_000);
    store.fail_candidates = true;
    let notifier = RecordingNotifier::default();

    let err = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect_err("fetch failure must fail the run");

    assert!(matches!(
        err,
        PipelineError::Upstream {
            stage: "candidates",
            ..
        }
    ));
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn organization_fetch_failure_fails_the_run() {
    let mut store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)]);
    store.fail_organizations = true;
    let notifier = RecordingNotifier::default();

    let err = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect_err("organization fetch failure must fail the run");

    assert!(matches!(
        err,
        PipelineError::Upstream {
            stage: "organizations",
            ..
        }
    ));
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn one_failed_pairing_does_not_stop_the_rest() {
    let mut store = MemoryStore::default()
        .with_candidates(vec![
            short_form(1, "https://v/a", 30.0, 90.0),
            short_form(2, "https://v/b", 30.0, 80.0),
        ])
        .with_org(1, "Acme", 1_000)
        .with_org(2, "Beta", 1_000);
    store.fail_job_for_url = Some("https://v/a".to_string());
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("pairing failures are not fatal");

    assert_eq!(report.pairings_failed, 2);
    assert_eq!(report.jobs_created.total, 2);
    assert_eq!(report.organizations[0].failed, 1);
    assert_eq!(report.organizations[1].jobs_created.total, 1);
}

#[tokio::test]
async fn notification_failure_does_not_change_outcome() {
    let store = MemoryStore::default()
        .with_candidates(vec![short_form(1, "https://v/a", 30.0, 90.0)])
        .with_org(1, "Acme", 1_000);

    let report = run_daily_cycle(
        store.collaborators(&FailingNotifier),
        &settings(),
        Uuid::new_v4(),
        now(),
    )
    .await
    .expect("notification failure is not fatal");

    assert_eq!(report.jobs_created.total, 1);
}

#[tokio::test]
async fn partially_scored_candidates_degrade_to_zero() {
    let raw = RawScoreSet {
        virality_score: Some(95.0),
        ad_type: Some("ugc".to_string()),
        ..RawScoreSet::default()
    };
    let store = MemoryStore::default()
        .with_candidates(vec![candidate(1, "https://v/partial", 30.0, &raw)])
        .with_org(1, "Acme", 1_000);
    let notifier = RecordingNotifier::default();

    let report = run_daily_cycle(store.collaborators(&notifier), &settings(), Uuid::new_v4(), now())
        .await
        .expect("partial scores are not an error");

    // commercial fit and clone feasibility default to 0, below the short-form floor
    assert_eq!(report.short_form_selected, 0);
    assert_eq!(
        report.early_exit_reason.as_deref(),
        Some(NO_QUALIFYING_CANDIDATES)
    );
}
