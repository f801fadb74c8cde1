//! Slot constraint engine.
//!
//! Given the slots of an event and a participant's per-day selection, decides
//! which slots are disabled and repairs the selection. Adjacency is
//! positional: slots are compared by their index within the day's slot list,
//! so each day's slots must be supplied in time order.
//!
//! Rules applied to every day on every pass:
//!
//! 1. A slot with `registration_count >= max_capacity` is disabled.
//! 2. Gap: when the slots at indices `a` and `a + 2` are selected, `a + 1` is
//!    disabled.
//! 3. Pair boundary: when `a` and `a + 1` are selected, `a - 1` and `a + 2`
//!    are disabled, so a contiguous block never exceeds two slots.
//! 4. Once `max_per_day` slots are selected every other slot is disabled.
//!
//! Rules 2-4 never disable a selected slot. Selection repair admits ids in
//! the order they were picked and drops an id whose slot is disabled given
//! the ids admitted before it, or which is not offered on that day. The
//! result is a pure function of its input, so running it again on its own
//! output changes nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilitySlot;
use crate::error::CoreError;
use crate::selection::PerDaySelection;
use crate::types::{DayIndex, SlotId};

/// Maximum slots per day used by every configured event so far.
pub const DEFAULT_MAX_PER_DAY: usize = 4;

/// Longest allowed run of index-adjacent selected slots.
const MAX_CONSECUTIVE: usize = 2;

/// Event-level parameters of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRules {
    pub max_per_day: usize,
}

impl Default for ConstraintRules {
    fn default() -> Self {
        Self {
            max_per_day: DEFAULT_MAX_PER_DAY,
        }
    }
}

/// A slot together with its computed selectability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotState {
    #[serde(flatten)]
    pub slot: AvailabilitySlot,
    pub remaining: i32,
    pub disabled: bool,
}

impl SlotState {
    /// State of a slot before any selection is taken into account.
    pub fn capacity_only(slot: AvailabilitySlot) -> Self {
        Self {
            remaining: slot.remaining(),
            disabled: slot.is_full(),
            slot,
        }
    }

    pub fn disabled_by_capacity(&self) -> bool {
        self.slot.is_full()
    }
}

/// Engine output for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEvaluation {
    /// The day's slots in input order with their `disabled` flag.
    pub slots: Vec<SlotState>,
    /// Ids that survived repair, in selection order.
    pub selected: Vec<SlotId>,
    /// Ids removed by repair, in selection order.
    pub pruned: Vec<SlotId>,
}

impl DayEvaluation {
    pub fn has_consecutive_or_disabled_in_between(&self) -> bool {
        has_consecutive_or_disabled_in_between(&self.slots, &self.selected)
    }
}

/// Engine output for a whole event, keyed by day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub days: BTreeMap<DayIndex, DayEvaluation>,
}

impl Evaluation {
    /// All slot states, ascending by day, input order within a day.
    pub fn slots(&self) -> impl Iterator<Item = &SlotState> {
        self.days.values().flat_map(|d| d.slots.iter())
    }

    /// The repaired selection.
    pub fn selection(&self) -> PerDaySelection {
        PerDaySelection::from_days(
            self.days
                .iter()
                .map(|(day, eval)| (*day, eval.selected.clone())),
        )
    }

    /// Every id dropped by repair.
    pub fn pruned(&self) -> Vec<SlotId> {
        self.days
            .values()
            .flat_map(|d| d.pruned.iter().copied())
            .collect()
    }

    pub fn day(&self, day: DayIndex) -> Option<&DayEvaluation> {
        self.days.get(&day)
    }

    /// `Some(disabled)` for a known slot, `None` otherwise.
    pub fn is_disabled(&self, slot_id: SlotId) -> Option<bool> {
        self.slots()
            .find(|s| s.slot.id == slot_id)
            .map(|s| s.disabled)
    }
}

/// Run the engine over every day of an event.
///
/// Slots are grouped by `day`, keeping their relative input order. A day
/// that has selected ids but no slots yields an empty evaluation with all of
/// its ids pruned.
pub fn evaluate(
    slots: &[AvailabilitySlot],
    selection: &PerDaySelection,
    rules: &ConstraintRules,
) -> Evaluation {
    let mut by_day: BTreeMap<DayIndex, Vec<AvailabilitySlot>> = BTreeMap::new();
    for slot in slots {
        by_day.entry(slot.day).or_default().push(slot.clone());
    }
    for (day, _) in selection.days() {
        by_day.entry(day).or_default();
    }

    let days = by_day
        .into_iter()
        .map(|(day, day_slots)| (day, evaluate_day(&day_slots, selection.day(day), rules)))
        .collect();

    Evaluation { days }
}

/// Run the engine over the ordered slots of a single day.
pub fn evaluate_day(
    slots: &[AvailabilitySlot],
    selected: &[SlotId],
    rules: &ConstraintRules,
) -> DayEvaluation {
    let mut admitted: Vec<SlotId> = Vec::with_capacity(selected.len());
    let mut admitted_idx: Vec<usize> = Vec::with_capacity(selected.len());
    let mut pruned = Vec::new();

    for &id in selected {
        if admitted.contains(&id) {
            continue;
        }
        let Some(idx) = slots.iter().position(|s| s.id == id) else {
            pruned.push(id);
            continue;
        };
        if disabled_mask(slots, &admitted_idx, rules)[idx] {
            pruned.push(id);
        } else {
            admitted.push(id);
            admitted_idx.push(idx);
        }
    }

    let mask = disabled_mask(slots, &admitted_idx, rules);
    let states = slots
        .iter()
        .zip(mask)
        .map(|(slot, disabled)| SlotState {
            remaining: slot.remaining(),
            slot: slot.clone(),
            disabled,
        })
        .collect();

    DayEvaluation {
        slots: states,
        selected: admitted,
        pruned,
    }
}

/// Compute the disabled flag of every slot for a set of selected indices.
fn disabled_mask(
    slots: &[AvailabilitySlot],
    selected: &[usize],
    rules: &ConstraintRules,
) -> Vec<bool> {
    let mut disabled: Vec<bool> = slots.iter().map(AvailabilitySlot::is_full).collect();

    let mut is_selected = vec![false; slots.len()];
    for &idx in selected {
        is_selected[idx] = true;
    }

    let mut sorted = selected.to_vec();
    sorted.sort_unstable();

    // Gap rule.
    for pair in sorted.windows(2) {
        if pair[1] - pair[0] == 2 {
            disable_unselected(&mut disabled, &is_selected, pair[0] + 1);
        }
    }

    // Pair boundary rule.
    for pair in sorted.windows(2) {
        if pair[1] - pair[0] == 1 {
            if let Some(before) = pair[0].checked_sub(1) {
                disable_unselected(&mut disabled, &is_selected, before);
            }
            disable_unselected(&mut disabled, &is_selected, pair[1] + 1);
        }
    }

    if sorted.len() >= rules.max_per_day {
        for idx in 0..slots.len() {
            disable_unselected(&mut disabled, &is_selected, idx);
        }
    }

    disabled
}

fn disable_unselected(disabled: &mut [bool], is_selected: &[bool], idx: usize) {
    if idx < disabled.len() && !is_selected[idx] {
        disabled[idx] = true;
    }
}

/// UI hint: true when two selected slots are index-adjacent, or when a slot
/// strictly between two selected slots is disabled for a reason other than
/// capacity. Read-only.
pub fn has_consecutive_or_disabled_in_between(slots: &[SlotState], selected: &[SlotId]) -> bool {
    let mut indices: Vec<usize> = selected
        .iter()
        .filter_map(|id| slots.iter().position(|s| s.slot.id == *id))
        .collect();
    indices.sort_unstable();

    if indices.windows(2).any(|pair| pair[1] - pair[0] == 1) {
        return true;
    }

    indices.windows(2).any(|pair| {
        slots[pair[0] + 1..pair[1]]
            .iter()
            .any(|s| s.disabled && !s.disabled_by_capacity())
    })
}

/// Server-side structural check of one day's selection.
///
/// Capacity is not considered here; it is enforced by the atomic counter
/// update when the reservation is committed. Rejects ids not offered on the
/// day, duplicates, more than `max_per_day` ids and runs of three or more
/// index-adjacent slots. A selection passes exactly when the engine would
/// admit all of its ids in ascending slot order with every slot free.
pub fn validate_selection(
    slots: &[AvailabilitySlot],
    day: DayIndex,
    selected: &[SlotId],
    max_per_day: usize,
) -> Result<(), CoreError> {
    if selected.len() > max_per_day {
        return Err(CoreError::Validation(format!(
            "At most {max_per_day} slots may be selected for day {day}"
        )));
    }

    let mut seen = BTreeSet::new();
    let mut indices = Vec::with_capacity(selected.len());
    for &id in selected {
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "Slot {id} is selected more than once on day {day}"
            )));
        }
        let idx = slots
            .iter()
            .position(|s| s.id == id && s.day == day)
            .ok_or_else(|| {
                CoreError::Validation(format!("Slot {id} is not offered on day {day}"))
            })?;
        indices.push(idx);
    }
    indices.sort_unstable();

    let mut run = 1;
    for pair in indices.windows(2) {
        if pair[1] - pair[0] == 1 {
            run += 1;
            if run > MAX_CONSECUTIVE {
                return Err(CoreError::Validation(format!(
                    "More than {MAX_CONSECUTIVE} consecutive slots selected on day {day}"
                )));
            }
        } else {
            run = 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn slot(id: SlotId, day: DayIndex, max_capacity: i32, registration_count: i32) -> AvailabilitySlot {
        AvailabilitySlot {
            id,
            day,
            slot_time: format!("{id}:00"),
            max_capacity,
            registration_count,
        }
    }

    /// Day 1 with ids 10..10+n, each with one free seat.
    fn open_day(n: i64) -> Vec<AvailabilitySlot> {
        (0..n).map(|i| slot(10 + i, 1, 1, 0)).collect()
    }

    fn disabled_ids(eval: &DayEvaluation) -> Vec<SlotId> {
        eval.slots
            .iter()
            .filter(|s| s.disabled)
            .map(|s| s.slot.id)
            .collect()
    }

    fn rules() -> ConstraintRules {
        ConstraintRules::default()
    }

    // -----------------------------------------------------------------------
    // Individual rules
    // -----------------------------------------------------------------------

    #[test]
    fn full_slot_is_disabled_regardless_of_selection() {
        let slots = vec![slot(5, 1, 2, 2), slot(6, 1, 2, 0)];
        let eval = evaluate_day(&slots, &[], &rules());
        assert_eq!(disabled_ids(&eval), vec![5]);
        assert_eq!(eval.slots[0].remaining, 0);

        let eval = evaluate_day(&slots, &[6], &rules());
        assert_eq!(disabled_ids(&eval), vec![5]);
    }

    #[test]
    fn selected_full_slot_is_pruned() {
        let slots = vec![slot(5, 1, 2, 2), slot(6, 1, 2, 0)];
        let eval = evaluate_day(&slots, &[5, 6], &rules());
        assert_eq!(eval.selected, vec![6]);
        assert_eq!(eval.pruned, vec![5]);
    }

    #[test]
    fn gap_of_one_disables_the_slot_between() {
        let slots = open_day(4);
        let eval = evaluate_day(&slots, &[10, 12], &rules());
        assert_eq!(disabled_ids(&eval), vec![11]);
        assert_eq!(eval.selected, vec![10, 12]);
    }

    #[test]
    fn consecutive_pair_disables_both_neighbours() {
        let slots = open_day(5);
        let eval = evaluate_day(&slots, &[11, 12], &rules());
        assert_eq!(disabled_ids(&eval), vec![10, 13]);
    }

    #[test]
    fn consecutive_pair_at_the_edges_stays_in_bounds() {
        let slots = open_day(3);
        let eval = evaluate_day(&slots, &[10, 11], &rules());
        assert_eq!(disabled_ids(&eval), vec![12]);

        let eval = evaluate_day(&slots, &[11, 12], &rules());
        assert_eq!(disabled_ids(&eval), vec![10]);
    }

    #[test]
    fn reaching_max_per_day_disables_everything_else() {
        let slots = open_day(8);
        let eval = evaluate_day(&slots, &[10, 11, 13, 14], &rules());
        assert_eq!(eval.selected.len(), 4);
        assert_eq!(disabled_ids(&eval), vec![12, 15, 16, 17]);
    }

    #[test]
    fn fifth_slot_is_pruned() {
        let slots = open_day(12);
        let eval = evaluate_day(&slots, &[10, 13, 16, 19, 21], &rules());
        assert_eq!(eval.selected, vec![10, 13, 16, 19]);
        assert_eq!(eval.pruned, vec![21]);
    }

    #[test]
    fn third_consecutive_slot_is_pruned_in_any_order() {
        let slots = open_day(5);
        for order in [[10, 11, 12], [12, 10, 11], [11, 12, 10], [10, 12, 11]] {
            let eval = evaluate_day(&slots, &order, &rules());
            assert_eq!(eval.selected.len(), 2, "order {order:?}");
            assert_eq!(eval.pruned.len(), 1, "order {order:?}");
        }
    }

    #[test]
    fn unknown_ids_are_pruned() {
        let slots = open_day(3);
        let eval = evaluate_day(&slots, &[99, 10], &rules());
        assert_eq!(eval.selected, vec![10]);
        assert_eq!(eval.pruned, vec![99]);
    }

    #[test]
    fn adjacency_is_positional_not_by_id() {
        let slots = vec![slot(30, 1, 1, 0), slot(7, 1, 1, 0), slot(12, 1, 1, 0)];
        let eval = evaluate_day(&slots, &[30, 12], &rules());
        assert_eq!(disabled_ids(&eval), vec![7]);
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn scenario_gap_then_pair_recomputes_from_scratch() {
        let slots = open_day(4);

        let first = evaluate_day(&slots, &[10, 12], &rules());
        assert!(first.is_disabled_for_test(11));
        assert!(!first.is_disabled_for_test(13));

        let second = evaluate_day(&slots, &[10, 11], &rules());
        assert!(second.is_disabled_for_test(12));
        assert!(!second.is_disabled_for_test(13));
    }

    #[test]
    fn evaluate_groups_days_and_prunes_orphan_days() {
        let slots = vec![
            slot(10, 1, 1, 0),
            slot(11, 1, 1, 0),
            slot(12, 1, 1, 0),
            slot(20, 2, 1, 1),
            slot(21, 2, 1, 0),
        ];
        let selection = PerDaySelection::from_days([(1, vec![10, 12]), (2, vec![20, 21]), (3, vec![30])]);
        let eval = evaluate(&slots, &selection, &rules());

        assert_eq!(eval.days.len(), 3);
        assert_eq!(eval.is_disabled(11), Some(true));
        assert_eq!(eval.is_disabled(20), Some(true));
        assert_eq!(eval.is_disabled(99), None);
        assert_eq!(
            eval.selection(),
            PerDaySelection::from_days([(1, vec![10, 12]), (2, vec![21])])
        );
        assert_eq!(eval.pruned(), vec![20, 30]);
        assert_eq!(eval.slots().count(), 5);
    }

    // -----------------------------------------------------------------------
    // Properties, checked over every subset of a six-slot day
    // -----------------------------------------------------------------------

    fn subsets(slots: &[AvailabilitySlot]) -> Vec<Vec<SlotId>> {
        (0u32..(1 << slots.len()))
            .map(|mask| {
                slots
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, s)| s.id)
                    .collect()
            })
            .collect()
    }

    fn mixed_day() -> Vec<AvailabilitySlot> {
        vec![
            slot(10, 1, 1, 0),
            slot(11, 1, 2, 1),
            slot(12, 1, 1, 1),
            slot(13, 1, 3, 0),
            slot(14, 1, 1, 0),
            slot(15, 1, 1, 0),
        ]
    }

    #[test]
    fn engine_is_idempotent() {
        let slots = mixed_day();
        for subset in subsets(&slots) {
            for order in [subset.clone(), subset.iter().rev().copied().collect()] {
                let once = evaluate_day(&slots, &order, &rules());
                let twice = evaluate_day(&slots, &once.selected, &rules());
                assert_eq!(once.slots, twice.slots, "input {order:?}");
                assert_eq!(once.selected, twice.selected, "input {order:?}");
                assert!(twice.pruned.is_empty(), "input {order:?}");
            }
        }
    }

    #[test]
    fn capacity_disabled_slot_stays_disabled() {
        let slots = mixed_day();
        for subset in subsets(&slots) {
            let eval = evaluate_day(&slots, &subset, &rules());
            assert!(eval.slots[2].disabled, "slot 12 must stay disabled for {subset:?}");
            assert!(!eval.selected.contains(&12));
        }
    }

    #[test]
    fn accepted_selections_satisfy_every_rule() {
        let slots = open_day(6);
        let tight = ConstraintRules { max_per_day: 3 };
        for subset in subsets(&slots) {
            for order in [subset.clone(), subset.iter().rev().copied().collect()] {
                let eval = evaluate_day(&slots, &order, &tight);
                assert!(eval.selected.len() <= 3, "input {order:?}");
                assert!(
                    validate_selection(&slots, 1, &eval.selected, 3).is_ok(),
                    "engine accepted an invalid selection from {order:?}"
                );

                let mut idx: Vec<usize> = eval
                    .selected
                    .iter()
                    .map(|id| slots.iter().position(|s| s.id == *id).unwrap())
                    .collect();
                idx.sort_unstable();
                for pair in idx.windows(2) {
                    if pair[1] - pair[0] == 2 {
                        assert!(eval.slots[pair[0] + 1].disabled, "gap left open for {order:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn valid_selections_are_never_pruned_in_ascending_order() {
        let slots = open_day(6);
        for subset in subsets(&slots) {
            let valid = validate_selection(&slots, 1, &subset, DEFAULT_MAX_PER_DAY).is_ok();
            let eval = evaluate_day(&slots, &subset, &rules());
            assert_eq!(valid, eval.pruned.is_empty(), "subset {subset:?}");
        }
    }

    // -----------------------------------------------------------------------
    // Hint
    // -----------------------------------------------------------------------

    #[test]
    fn hint_reports_consecutive_selection() {
        let eval = evaluate_day(&open_day(4), &[10, 11], &rules());
        assert!(eval.has_consecutive_or_disabled_in_between());
    }

    #[test]
    fn hint_reports_rule_disabled_slot_between() {
        let eval = evaluate_day(&open_day(4), &[10, 12], &rules());
        assert!(eval.has_consecutive_or_disabled_in_between());
    }

    #[test]
    fn hint_ignores_capacity_disabled_slot_between() {
        let slots = vec![slot(10, 1, 1, 0), slot(11, 1, 1, 1), slot(12, 1, 1, 0), slot(13, 1, 1, 0)];
        let states: Vec<SlotState> = slots.iter().cloned().map(SlotState::capacity_only).collect();
        assert!(!has_consecutive_or_disabled_in_between(&states, &[10, 13]));
        assert!(!has_consecutive_or_disabled_in_between(&states, &[]));
    }

    // -----------------------------------------------------------------------
    // validate_selection
    // -----------------------------------------------------------------------

    #[test]
    fn validate_rejects_unknown_and_foreign_day_slots() {
        let mut slots = open_day(3);
        slots.push(slot(20, 2, 1, 0));
        assert_matches!(
            validate_selection(&slots, 1, &[20], 4),
            Err(CoreError::Validation(msg)) if msg.contains("Slot 20")
        );
        assert_matches!(validate_selection(&slots, 1, &[99], 4), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_rejects_duplicates_and_too_many() {
        let slots = open_day(10);
        assert_matches!(validate_selection(&slots, 1, &[10, 10], 4), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_selection(&slots, 1, &[10, 12, 14, 16, 18], 4),
            Err(CoreError::Validation(msg)) if msg.contains("At most 4")
        );
    }

    #[test]
    fn validate_rejects_runs_of_three() {
        let slots = open_day(6);
        assert!(validate_selection(&slots, 1, &[10, 11, 13, 14], 4).is_ok());
        assert_matches!(
            validate_selection(&slots, 1, &[13, 11, 12], 4),
            Err(CoreError::Validation(msg)) if msg.contains("consecutive")
        );
    }

    impl DayEvaluation {
        fn is_disabled_for_test(&self, id: SlotId) -> bool {
            self.slots
                .iter()
                .find(|s| s.slot.id == id)
                .map(|s| s.disabled)
                .unwrap()
        }
    }
}
