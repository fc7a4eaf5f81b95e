//! Run summary handed to the notifier and persisted with the run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use vdna_core::ContentType;

use crate::types::{PairingOutcome, ScoredCandidate, SkipReason};

pub const NO_QUALIFYING_CANDIDATES: &str = "no qualifying candidates found";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub short_form: usize,
    pub long_form: usize,
}

impl JobCounts {
    fn record(&mut self, content_type: ContentType) {
        self.total += 1;
        match content_type {
            ContentType::ShortForm => self.short_form += 1,
            ContentType::LongForm => self.long_form += 1,
        }
    }

    fn absorb(&mut self, other: JobCounts) {
        self.total += other.total;
        self.short_form += other.short_form;
        self.long_form += other.long_form;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub total: usize,
    pub insufficient_credits: usize,
    pub already_processed: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        self.total += 1;
        match reason {
            SkipReason::InsufficientCredits => self.insufficient_credits += 1,
            SkipReason::AlreadyProcessed => self.already_processed += 1,
        }
    }

    fn absorb(&mut self, other: SkipCounts) {
        self.total += other.total;
        self.insufficient_credits += other.insufficient_credits;
        self.already_processed += other.already_processed;
    }
}

/// Per-organization results of one fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationTally {
    pub organization_id: i64,
    pub organization_name: String,
    pub jobs_created: JobCounts,
    pub skipped: SkipCounts,
    pub failed: usize,
}

impl OrganizationTally {
    #[must_use]
    pub fn new(organization_id: i64, organization_name: &str) -> Self {
        Self {
            organization_id,
            organization_name: organization_name.to_string(),
            jobs_created: JobCounts::default(),
            skipped: SkipCounts::default(),
            failed: 0,
        }
    }

    pub fn record(&mut self, outcome: &PairingOutcome) {
        match outcome {
            PairingOutcome::Created { content_type, .. } => self.jobs_created.record(*content_type),
            PairingOutcome::Skipped(reason) => self.skipped.record(*reason),
            PairingOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// A candidate that made it into a track selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedSummary {
    pub url: String,
    pub title: String,
    pub track: ContentType,
    pub score: f64,
}

impl From<&ScoredCandidate> for SelectedSummary {
    fn from(c: &ScoredCandidate) -> Self {
        Self {
            url: c.candidate.url.clone(),
            title: c.candidate.title.clone(),
            track: c.track,
            score: (c.track_score * 100.0).round() / 100.0,
        }
    }
}

/// Counters for one daily cycle. Always carries created, skipped and failed
/// totals so partial success is visible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub candidates_evaluated: usize,
    pub short_form_selected: usize,
    pub long_form_selected: usize,
    pub new_candidates: usize,
    pub duplicates_skipped: usize,
    pub organizations_processed: usize,
    pub jobs_created: JobCounts,
    pub pairings_skipped: SkipCounts,
    pub pairings_failed: usize,
    pub organizations: Vec<OrganizationTally>,
    pub selected: Vec<SelectedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_exit_reason: Option<String>,
}

impl RunReport {
    #[must_use]
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            completed_at: None,
            candidates_evaluated: 0,
            short_form_selected: 0,
            long_form_selected: 0,
            new_candidates: 0,
            duplicates_skipped: 0,
            organizations_processed: 0,
            jobs_created: JobCounts::default(),
            pairings_skipped: SkipCounts::default(),
            pairings_failed: 0,
            organizations: Vec::new(),
            selected: Vec::new(),
            early_exit_reason: None,
        }
    }

    /// Fold one organization's tally into the run totals.
    pub fn record_organization(&mut self, tally: OrganizationTally) {
        self.organizations_processed += 1;
        self.jobs_created.absorb(tally.jobs_created);
        self.pairings_skipped.absorb(tally.skipped);
        self.pairings_failed += tally.failed;
        self.organizations.push(tally);
    }

    pub fn finish(&mut self, completed_at: DateTime<Utc>) {
        self.completed_at = Some(completed_at);
    }

    #[must_use]
    pub fn subject(&self) -> String {
        if let Some(reason) = &self.early_exit_reason {
            return format!("Daily viral cycle: {reason}");
        }
        format!(
            "Daily viral cycle: {} jobs created ({} short-form, {} long-form)",
            self.jobs_created.total, self.jobs_created.short_form, self.jobs_created.long_form
        )
    }

    /// Plain-text body for the operator email.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daily viral cycle {}", self.run_id)?;
        writeln!(f, "Started:   {}", self.started_at.to_rfc3339())?;
        if let Some(done) = self.completed_at {
            writeln!(f, "Completed: {}", done.to_rfc3339())?;
        }
        if let Some(reason) = &self.early_exit_reason {
            writeln!(f, "Ended early: {reason}")?;
        }

        writeln!(f)?;
        writeln!(f, "Candidates evaluated:    {}", self.candidates_evaluated)?;
        writeln!(f, "Short-form selected:     {}", self.short_form_selected)?;
        writeln!(f, "Long-form selected:      {}", self.long_form_selected)?;
        writeln!(f, "New candidates:          {}", self.new_candidates)?;
        writeln!(f, "Duplicates skipped:      {}", self.duplicates_skipped)?;
        writeln!(f, "Organizations processed: {}", self.organizations_processed)?;
        writeln!(
            f,
            "Jobs created:            {} ({} short-form, {} long-form)",
            self.jobs_created.total, self.jobs_created.short_form, self.jobs_created.long_form
        )?;
        writeln!(
            f,
            "Pairings skipped:        {} ({} insufficient credits, {} already processed)",
            self.pairings_skipped.total,
            self.pairings_skipped.insufficient_credits,
            self.pairings_skipped.already_processed
        )?;
        writeln!(f, "Pairings failed:         {}", self.pairings_failed)?;

        if !self.selected.is_empty() {
            writeln!(f)?;
            writeln!(f, "Selected:")?;
            for s in &self.selected {
                writeln!(f, "  [{}] {:.2}  {}  {}", s.track, s.score, s.title, s.url)?;
            }
        }

        if !self.organizations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Organizations:")?;
            for org in &self.organizations {
                writeln!(
                    f,
                    "  {} (#{}): {} created, {} skipped, {} failed",
                    org.organization_name,
                    org.organization_id,
                    org.jobs_created.total,
                    org.skipped.total,
                    org.failed
                )?;
            }
        }

        Ok(())
    }
}
