//! Reservation coordinator.
//!
//! Commits slot selections without overselling. Every operation runs in one
//! transaction; a capacity failure anywhere returns before commit and the
//! dropped transaction rolls back every counter it touched, so callers never
//! see a partial reservation.
//!
//! Lock order inside a transaction is fixed:
//!
//! 1. registration rows (identity key order for register, id order for
//!    withdraw);
//! 2. slot rows, one conditional `UPDATE` per touched slot in ascending slot
//!    id order, carrying the net seat change of the whole request;
//! 3. registration and `registration_slots` writes.
//!
//! Slot counters are never touched after step 2, so two requests can only
//! wait on each other's slots in ascending order. A deadlock or
//! serialization failure reported by PostgreSQL anyway is retried a bounded
//! number of times with a fresh transaction.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use slotbook_core::availability::AvailabilitySlot;
use slotbook_core::constraints::validate_selection;
use slotbook_core::delta::SlotDelta;
use slotbook_core::error::CoreError;
use slotbook_core::event::EventConfig;
use slotbook_core::identity::ParticipantSubmission;
use slotbook_core::types::{DayIndex, DbId, SlotId};
use sqlx::PgPool;

use crate::is_retryable;
use crate::models::registration::{NewRegistration, Registration};
use crate::repositories::{RegistrationRepo, SlotRepo};

/// Attempts per operation, including the first.
const MAX_ATTEMPTS: u32 = 3;

/// Multiplied by the attempt number before each retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Result of registering one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationOutcome {
    pub registration_id: DbId,
    /// `false` when an existing registration was updated in place.
    pub created: bool,
    pub added: Vec<SlotId>,
    pub removed: Vec<SlotId>,
}

/// Result of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalOutcome {
    pub registration_ids: Vec<DbId>,
    /// One entry per released seat, ascending.
    pub released: Vec<SlotId>,
}

type DaySlots = BTreeMap<DayIndex, Vec<AvailabilitySlot>>;

/// One participant of a register request, resolved against the locked
/// registration row.
struct Plan {
    /// Position in the request.
    index: usize,
    existing: Option<Registration>,
    delta: SlotDelta,
}

/// Transactional register, bulk register and withdraw.
pub struct ReservationCoordinator;

impl ReservationCoordinator {
    /// Register a participant, or replace the slots of their existing
    /// registration.
    pub async fn register(
        pool: &PgPool,
        event: &EventConfig,
        submission: &ParticipantSubmission,
    ) -> Result<ReservationOutcome, ReservationError> {
        let outcome = Self::register_all(pool, event, std::slice::from_ref(submission))
            .await?
            .pop()
            .ok_or_else(|| CoreError::Internal("registration produced no outcome".into()))?;

        tracing::info!(
            event = %event.slug,
            registration_id = outcome.registration_id,
            created = outcome.created,
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            "Registration committed",
        );
        Ok(outcome)
    }

    /// Register several participants as one unit: either every participant
    /// is committed or none is. Outcomes are in request order.
    pub async fn register_bulk(
        pool: &PgPool,
        event: &EventConfig,
        submissions: &[ParticipantSubmission],
    ) -> Result<Vec<ReservationOutcome>, ReservationError> {
        if submissions.is_empty() {
            return Err(CoreError::Validation(
                "mainData must contain at least one participant".into(),
            )
            .into());
        }

        let outcomes = Self::register_all(pool, event, submissions).await?;

        tracing::info!(
            event = %event.slug,
            participants = outcomes.len(),
            "Bulk registration committed",
        );
        Ok(outcomes)
    }

    /// Release every seat held by the registrations owned by
    /// `source_references` and delete them.
    pub async fn withdraw(
        pool: &PgPool,
        event: &EventConfig,
        source_references: &[DbId],
    ) -> Result<WithdrawalOutcome, ReservationError> {
        if source_references.is_empty() {
            return Err(CoreError::Validation("source_reference must not be empty".into()).into());
        }

        let outcome = with_retry(event, "withdraw", || {
            Self::try_withdraw(pool, event, source_references)
        })
        .await?;

        tracing::info!(
            event = %event.slug,
            registrations = outcome.registration_ids.len(),
            released = outcome.released.len(),
            "Registrations withdrawn",
        );
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn register_all(
        pool: &PgPool,
        event: &EventConfig,
        submissions: &[ParticipantSubmission],
    ) -> Result<Vec<ReservationOutcome>, ReservationError> {
        let keys = Self::identity_keys(event, submissions)?;
        with_retry(event, "register", || {
            Self::try_register_all(pool, event, submissions, &keys)
        })
        .await
    }

    /// Checks that need no database: identity fields, day range, non-empty
    /// selection and one entry per participant.
    fn identity_keys(
        event: &EventConfig,
        submissions: &[ParticipantSubmission],
    ) -> Result<Vec<String>, CoreError> {
        let mut seen = HashSet::with_capacity(submissions.len());
        let mut keys = Vec::with_capacity(submissions.len());

        for submission in submissions {
            let key = submission
                .identity
                .identity_key(event.identity, submission.source_reference)?;

            if submission.selection.is_empty() {
                return Err(CoreError::Validation("At least one slot must be selected".into()));
            }
            event.check_selection_days(&submission.selection)?;

            if !seen.insert(key.clone()) {
                return Err(CoreError::Validation(
                    "Each participant may appear only once per request".into(),
                ));
            }
            keys.push(key);
        }
        Ok(keys)
    }

    async fn try_register_all(
        pool: &PgPool,
        event: &EventConfig,
        submissions: &[ParticipantSubmission],
        keys: &[String],
    ) -> Result<Vec<ReservationOutcome>, ReservationError> {
        let mut tx = pool.begin().await?;

        let day_slots = Self::load_day_slots(&mut tx, event).await?;
        for submission in submissions {
            for (day, ids) in submission.selection.days() {
                let slots = day_slots.get(&day).map(Vec::as_slice).unwrap_or(&[]);
                validate_selection(slots, day, ids, event.max_per_day)?;
            }
        }

        let mut order: Vec<usize> = (0..submissions.len()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        let mut plans = Vec::with_capacity(order.len());
        for index in order {
            let existing =
                RegistrationRepo::find_by_identity_for_update(&mut tx, event.id, &keys[index])
                    .await?;
            let old: BTreeSet<SlotId> = match &existing {
                Some(registration) => RegistrationRepo::list_slots(&mut *tx, registration.id)
                    .await?
                    .into_iter()
                    .map(|row| row.slot_id)
                    .collect(),
                None => BTreeSet::new(),
            };
            let delta = SlotDelta::between(&old, &submissions[index].selection.slot_ids());
            plans.push(Plan {
                index,
                existing,
                delta,
            });
        }

        Self::apply_seat_changes(&mut tx, event, &plans).await?;

        let mut outcomes: Vec<Option<ReservationOutcome>> = vec![None; submissions.len()];
        for plan in plans {
            let submission = &submissions[plan.index];
            let row = NewRegistration {
                event_id: event.id,
                identity_key: &keys[plan.index],
                source_reference: submission.source_reference,
                identity: &submission.identity,
            };
            let (registration, created) = match plan.existing {
                Some(found) => (RegistrationRepo::update_identity(&mut tx, found.id, &row).await?, false),
                None => (RegistrationRepo::insert(&mut tx, &row).await?, true),
            };
            RegistrationRepo::replace_slots(&mut tx, registration.id, &submission.selection).await?;

            outcomes[plan.index] = Some(ReservationOutcome {
                registration_id: registration.id,
                created,
                added: plan.delta.to_add.into_iter().collect(),
                removed: plan.delta.to_remove.into_iter().collect(),
            });
        }

        tx.commit().await?;
        Ok(outcomes.into_iter().flatten().collect())
    }

    /// Apply the net seat change of every plan, one slot at a time in
    /// ascending id order. A slot whose net change is zero is not touched.
    async fn apply_seat_changes(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event: &EventConfig,
        plans: &[Plan],
    ) -> Result<(), ReservationError> {
        let mut changes: BTreeMap<SlotId, i32> = BTreeMap::new();
        for plan in plans {
            for &slot_id in &plan.delta.to_add {
                *changes.entry(slot_id).or_default() += 1;
            }
            for &slot_id in &plan.delta.to_remove {
                *changes.entry(slot_id).or_default() -= 1;
            }
        }

        for (slot_id, change) in changes {
            if change > 0 {
                if !SlotRepo::try_reserve(tx, event.id, slot_id, change).await? {
                    tracing::info!(event = %event.slug, slot_id, seats = change, "Slot full, reservation rejected");
                    return Err(CoreError::SlotFull { slot_id }.into());
                }
            } else if change < 0 {
                SlotRepo::release(tx, event.id, slot_id, -change).await?;
            }
        }
        Ok(())
    }

    async fn try_withdraw(
        pool: &PgPool,
        event: &EventConfig,
        source_references: &[DbId],
    ) -> Result<WithdrawalOutcome, ReservationError> {
        let mut tx = pool.begin().await?;
        let registrations =
            RegistrationRepo::find_by_source_references_for_update(&mut tx, event.id, source_references)
                .await?;

        if registrations.is_empty() {
            return Err(CoreError::NotFound {
                entity: "Registration",
                key: join_ids(source_references),
            }
            .into());
        }

        let mut released = Vec::new();
        for registration in &registrations {
            let held = RegistrationRepo::list_slots(&mut *tx, registration.id).await?;
            released.extend(held.iter().map(|row| row.slot_id));
        }
        released.sort_unstable();

        let mut seats: BTreeMap<SlotId, i32> = BTreeMap::new();
        for &slot_id in &released {
            *seats.entry(slot_id).or_default() += 1;
        }
        for (slot_id, count) in seats {
            SlotRepo::release(&mut tx, event.id, slot_id, count).await?;
        }
        for registration in &registrations {
            RegistrationRepo::delete(&mut tx, registration.id).await?;
        }
        tx.commit().await?;

        Ok(WithdrawalOutcome {
            registration_ids: registrations.iter().map(|r| r.id).collect(),
            released,
        })
    }

    async fn load_day_slots(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event: &EventConfig,
    ) -> Result<DaySlots, sqlx::Error> {
        let mut by_day = DaySlots::new();
        for slot in SlotRepo::list_for_event(&mut **tx, event.id).await? {
            by_day.entry(slot.day).or_default().push(slot.into());
        }
        Ok(by_day)
    }
}

/// Run `attempt` until it succeeds, fails for a non-transient reason, or
/// [`MAX_ATTEMPTS`] is reached. Each attempt opens its own transaction.
async fn with_retry<T, F, Fut>(
    event: &EventConfig,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, ReservationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReservationError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(ReservationError::Database(err)) if is_retryable(&err) && tries < MAX_ATTEMPTS => {
                tracing::warn!(
                    event = %event.slug,
                    operation,
                    attempt = tries,
                    error = %err,
                    "Transient database error, retrying",
                );
                tokio::time::sleep(RETRY_BACKOFF * tries).await;
                tries += 1;
            }
            result => return result,
        }
    }
}

fn join_ids(ids: &[DbId]) -> String {
    ids.iter()
        .map(DbId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
