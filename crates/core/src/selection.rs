//! Per-day slot selections.
//!
//! A [`PerDaySelection`] maps a day number to the slot ids chosen for that
//! day. On the wire it is a set of `dayN` fields (`day1`, `day2`, ...), so
//! events with any number of days share one representation. The order of ids
//! within a day is the order the participant picked them; it is preserved
//! because selection repair admits ids in that order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{DayIndex, SlotId};

/// Wire prefix of the per-day fields.
const DAY_KEY_PREFIX: &str = "day";

/// Slot ids chosen per day. Days with no ids are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerDaySelection {
    days: BTreeMap<DayIndex, Vec<SlotId>>,
}

impl PerDaySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from `(day, ids)` pairs. Duplicate ids within a day
    /// keep their first occurrence.
    pub fn from_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = (DayIndex, Vec<SlotId>)>,
    {
        let mut selection = Self::new();
        for (day, ids) in days {
            let mut merged = selection.day(day).to_vec();
            merged.extend(ids);
            selection.set_day(day, merged);
        }
        selection
    }

    /// Ids selected for `day`, in selection order.
    pub fn day(&self, day: DayIndex) -> &[SlotId] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the ids of one day.
    pub fn set_day(&mut self, day: DayIndex, ids: Vec<SlotId>) {
        let mut seen = BTreeSet::new();
        let ids: Vec<SlotId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            self.days.remove(&day);
        } else {
            self.days.insert(day, ids);
        }
    }

    /// Add `slot_id` to `day` if absent, remove it otherwise.
    ///
    /// Returns `true` when the slot is selected after the call.
    pub fn toggle(&mut self, day: DayIndex, slot_id: SlotId) -> bool {
        let mut ids = self.day(day).to_vec();
        let selected = match ids.iter().position(|id| *id == slot_id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(slot_id);
                true
            }
        };
        self.set_day(day, ids);
        selected
    }

    /// Iterate over the days that have at least one id, ascending.
    pub fn days(&self) -> impl Iterator<Item = (DayIndex, &[SlotId])> {
        self.days.iter().map(|(day, ids)| (*day, ids.as_slice()))
    }

    /// Union of the ids of every day.
    pub fn slot_ids(&self) -> BTreeSet<SlotId> {
        self.days.values().flatten().copied().collect()
    }

    /// Number of selected ids across all days.
    pub fn total(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

/// Wire name of a day field (`1` -> `"day1"`).
pub fn day_key(day: DayIndex) -> String {
    format!("{DAY_KEY_PREFIX}{day}")
}

/// Parse a `dayN` field name.
pub fn parse_day_key(key: &str) -> Option<DayIndex> {
    let digits = key.strip_prefix(DAY_KEY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl Serialize for PerDaySelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, ids) in &self.days {
            map.serialize_entry(&day_key(*day), ids)?;
        }
        map.end()
    }
}

/// Reads every `dayN` field of a map and ignores the rest, so the selection
/// can be flattened into a payload that carries other fields.
impl<'de> Deserialize<'de> for PerDaySelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = PerDaySelection;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of dayN fields to slot id arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut days = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    match parse_day_key(&key) {
                        Some(day) => {
                            let ids: Option<Vec<SlotId>> = map.next_value()?;
                            days.push((day, ids.unwrap_or_default()));
                        }
                        None => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(PerDaySelection::from_days(days))
            }
        }

        deserializer.deserialize_map(SelectionVisitor)
    }
}
