//! Client-side selection state for one participant and one event.
//!
//! The session owns the last fetched slots and the participant's per-day
//! selection. Every change to either re-runs the constraint engine, so the
//! selection never holds an id the engine would disable. Network calls stay
//! outside the engine: [`SelectionSession::reload`],
//! [`SelectionSession::submit`] and [`SelectionSession::change_slots`] are
//! the only async entry points. Each of them records its failure as the
//! session's visible error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slotbook_core::availability::{no_slots_available, AvailabilitySlot};
use slotbook_core::constraints::{evaluate, Evaluation};
use slotbook_core::event::EventConfig;
use slotbook_core::identity::{ParticipantIdentity, ParticipantSubmission};
use slotbook_core::selection::PerDaySelection;
use slotbook_core::types::{DayIndex, DbId, SlotId};

use crate::client::{RegistrationClient, RegistrationReceipt, Withdrawal};
use crate::error::ClientError;

/// Message shown after a capacity conflict.
pub const SLOT_FULL_MESSAGE: &str =
    "Selected slot(s) are no longer available. Please select again.";

/// Where a submission from this session should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Every slot is full: offer the waitlist form.
    Waitlist,
    Reserve,
}

/// Marks a submission as in flight. Dropping it clears the busy flag, on
/// success, on error and on cancellation alike.
#[derive(Debug)]
pub struct SubmitGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct SelectionSession {
    event: EventConfig,
    slots: Vec<AvailabilitySlot>,
    selection: PerDaySelection,
    evaluation: Evaluation,
    busy: Arc<AtomicBool>,
    error: Option<String>,
}

impl SelectionSession {
    /// A session with no slots loaded yet. Routes to the waitlist until
    /// [`load`](Self::load) supplies availability.
    pub fn new(event: EventConfig) -> Self {
        Self {
            event,
            slots: Vec::new(),
            selection: PerDaySelection::new(),
            evaluation: Evaluation::default(),
            busy: Arc::new(AtomicBool::new(false)),
            error: None,
        }
    }

    pub fn event(&self) -> &EventConfig {
        &self.event
    }

    pub fn slots(&self) -> &[AvailabilitySlot] {
        &self.slots
    }

    pub fn selection(&self) -> &PerDaySelection {
        &self.selection
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Replace the slot list and repair the selection against it.
    ///
    /// Returns the ids dropped because they became disabled.
    pub fn load(&mut self, slots: Vec<AvailabilitySlot>) -> Vec<SlotId> {
        self.slots = slots;
        self.refresh()
    }

    /// Select `slot_id` on `day` if it is unselected, deselect it otherwise.
    ///
    /// Selecting a disabled or unknown slot is a no-op. Returns whether the
    /// slot is selected afterwards.
    pub fn toggle(&mut self, day: DayIndex, slot_id: SlotId) -> bool {
        let selected = self.selection.day(day).contains(&slot_id);
        if !selected && self.evaluation.is_disabled(slot_id).unwrap_or(true) {
            return false;
        }

        self.selection.toggle(day, slot_id);
        self.refresh();
        self.selection.day(day).contains(&slot_id)
    }

    /// Whether the slot can currently be clicked. Unknown ids are disabled.
    pub fn is_disabled(&self, slot_id: SlotId) -> bool {
        self.evaluation.is_disabled(slot_id).unwrap_or(true)
    }

    pub fn route(&self) -> Route {
        if no_slots_available(&self.slots) {
            Route::Waitlist
        } else {
            Route::Reserve
        }
    }

    /// Claim the session for one submission.
    ///
    /// Fails with [`ClientError::Busy`] while another guard is alive.
    pub fn begin_submit(&self) -> Result<SubmitGuard, ClientError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(ClientError::Busy);
        }
        Ok(SubmitGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Keep `err` as the single user-visible error, replacing any earlier
    /// one.
    pub fn record_error(&mut self, err: &ClientError) {
        self.error = Some(match err {
            ClientError::SlotFull(_) => SLOT_FULL_MESSAGE.to_string(),
            other => other.to_string(),
        });
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// React to a capacity conflict: drop every selection so the participant
    /// re-selects after availability is reloaded.
    pub fn on_slot_full(&mut self) {
        self.selection.clear();
        self.refresh();
        self.error = Some(SLOT_FULL_MESSAGE.to_string());
    }

    /// Build the payload for the current selection.
    pub fn submission(
        &self,
        identity: ParticipantIdentity,
        source_reference: Option<DbId>,
    ) -> Result<ParticipantSubmission, ClientError> {
        if self.selection.is_empty() {
            return Err(ClientError::Validation(
                "At least one slot must be selected".into(),
            ));
        }
        Ok(ParticipantSubmission {
            identity,
            source_reference,
            selection: self.selection.clone(),
        })
    }

    /// Fetch availability and repair the selection against it.
    ///
    /// On failure the previous slots are kept and the error is recorded.
    pub async fn reload(&mut self, client: &RegistrationClient) -> Result<Vec<SlotId>, ClientError> {
        match client.slots(&self.event.slug).await {
            Ok(availability) => {
                self.event = availability.event;
                let slots = availability.slots.into_iter().map(|s| s.slot).collect();
                Ok(self.load(slots))
            }
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Give up the seats held under `source_references` so the participant
    /// can pick new slots.
    ///
    /// Withdraws on the server, clears the local selection and reloads
    /// availability, which now includes the released seats. Counts as a
    /// submission: fails with [`ClientError::Busy`] while one is in flight.
    pub async fn change_slots(
        &mut self,
        client: &RegistrationClient,
        source_references: &[DbId],
    ) -> Result<Withdrawal, ClientError> {
        let _guard = self.begin_submit()?;
        self.clear_error();

        let withdrawal = match client.withdraw(&self.event, source_references).await {
            Ok(withdrawal) => withdrawal,
            Err(err) => {
                self.record_error(&err);
                return Err(err);
            }
        };
        tracing::info!(
            event = %self.event.slug,
            withdrawn = withdrawal.withdrawn,
            released = withdrawal.released,
            "Registration withdrawn for change"
        );

        self.selection.clear();
        self.refresh();
        self.reload(client).await?;
        Ok(withdrawal)
    }

    /// Submit the current selection.
    ///
    /// On a capacity conflict the selection is cleared and availability is
    /// reloaded before the error is returned. Any error is also recorded as
    /// the session's visible error.
    pub async fn submit(
        &mut self,
        client: &RegistrationClient,
        identity: ParticipantIdentity,
        source_reference: Option<DbId>,
    ) -> Result<RegistrationReceipt, ClientError> {
        let _guard = self.begin_submit()?;
        self.clear_error();

        let result = match self.submission(identity, source_reference) {
            Ok(submission) => client.register(&self.event.slug, &submission).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(receipt) => {
                tracing::info!(
                    event = %self.event.slug,
                    registration_id = receipt.id,
                    created = receipt.created,
                    "Registration submitted"
                );
                Ok(receipt)
            }
            Err(err) => {
                if matches!(err, ClientError::SlotFull(_)) {
                    self.on_slot_full();
                    if let Err(reload_err) = self.reload(client).await {
                        tracing::warn!(error = %reload_err, "Availability reload failed");
                    }
                }
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Re-run the engine and adopt its repaired selection.
    fn refresh(&mut self) -> Vec<SlotId> {
        self.evaluation = evaluate(&self.slots, &self.selection, &self.event.rules());
        self.selection = self.evaluation.selection();
        self.evaluation.pruned()
    }
}
