//! Event configuration.
//!
//! Every event runs through the same engine and coordinator; what differs is
//! captured here: how many days it spans, the per-day cap, the action code
//! used in command payloads and how a participant's registration is keyed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constraints::ConstraintRules;
use crate::error::CoreError;
use crate::selection::PerDaySelection;
use crate::types::{DayIndex, DbId};

/// How an event finds a participant's existing registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    MobileNumber,
    MemberAndMobile,
    SourceReference,
}

impl IdentityKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKey::MobileNumber => "mobile_number",
            IdentityKey::MemberAndMobile => "member_and_mobile",
            IdentityKey::SourceReference => "source_reference",
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile_number" => Ok(IdentityKey::MobileNumber),
            "member_and_mobile" => Ok(IdentityKey::MemberAndMobile),
            "source_reference" => Ok(IdentityKey::SourceReference),
            other => Err(CoreError::Validation(format!(
                "Unknown identity key '{other}'"
            ))),
        }
    }
}

/// What a command payload asks the coordinator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    Register,
    Delete,
}

const REGISTER_PREFIX: &str = "REGISTER_";
const DELETE_PREFIX: &str = "DELETE_";

/// Static configuration of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfig {
    pub id: DbId,
    pub slug: String,
    pub label: String,
    /// Suffix of the `REGISTER_<CODE>` / `DELETE_<CODE>` actions.
    pub action_code: String,
    pub day_count: DayIndex,
    pub max_per_day: usize,
    pub identity: IdentityKey,
}

impl EventConfig {
    /// Day numbers of the event, `1..=day_count`.
    pub fn days(&self) -> impl Iterator<Item = DayIndex> {
        1..=self.day_count
    }

    pub fn rules(&self) -> ConstraintRules {
        ConstraintRules {
            max_per_day: self.max_per_day,
        }
    }

    pub fn check_day(&self, day: DayIndex) -> Result<(), CoreError> {
        if (1..=self.day_count).contains(&day) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Day {day} is outside 1..={} for {}",
                self.day_count, self.label
            )))
        }
    }

    /// Every day present in `selection` must belong to the event.
    pub fn check_selection_days(&self, selection: &PerDaySelection) -> Result<(), CoreError> {
        selection.days().try_for_each(|(day, _)| self.check_day(day))
    }

    pub fn register_action(&self) -> String {
        format!("{REGISTER_PREFIX}{}", self.action_code)
    }

    pub fn delete_action(&self) -> String {
        format!("{DELETE_PREFIX}{}", self.action_code)
    }

    /// Parse an `action` field. Actions for another event are rejected.
    pub fn parse_action(&self, action: &str) -> Result<RegistrationAction, CoreError> {
        let (kind, code) = if let Some(code) = action.strip_prefix(REGISTER_PREFIX) {
            (RegistrationAction::Register, code)
        } else if let Some(code) = action.strip_prefix(DELETE_PREFIX) {
            (RegistrationAction::Delete, code)
        } else {
            return Err(CoreError::Validation(format!("Unknown action '{action}'")));
        };

        if code != self.action_code {
            return Err(CoreError::Validation(format!(
                "Action '{action}' does not apply to {}",
                self.label
            )));
        }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn havanam() -> EventConfig {
        EventConfig {
            id: 1,
            slug: "gayathri-havanam".into(),
            label: "Gayathri Havanam".into(),
            action_code: "GH".into(),
            day_count: 3,
            max_per_day: 4,
            identity: IdentityKey::MobileNumber,
        }
    }

    #[test]
    fn identity_key_round_trips_through_text() {
        for key in [
            IdentityKey::MobileNumber,
            IdentityKey::MemberAndMobile,
            IdentityKey::SourceReference,
        ] {
            assert_eq!(key.as_str().parse::<IdentityKey>().unwrap(), key);
        }
        assert_matches!("email".parse::<IdentityKey>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn days_and_rules_follow_config() {
        let event = havanam();
        assert_eq!(event.days().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(event.rules().max_per_day, 4);
        assert!(event.check_day(3).is_ok());
        assert_matches!(event.check_day(0), Err(CoreError::Validation(_)));
        assert_matches!(event.check_day(4), Err(CoreError::Validation(_)));
    }

    #[test]
    fn selection_days_are_checked() {
        let event = havanam();
        let ok = PerDaySelection::from_days([(1, vec![10]), (3, vec![30])]);
        assert!(event.check_selection_days(&ok).is_ok());
        let bad = PerDaySelection::from_days([(4, vec![40])]);
        assert_matches!(event.check_selection_days(&bad), Err(CoreError::Validation(_)));
    }

    #[test]
    fn actions_carry_the_event_code() {
        let event = havanam();
        assert_eq!(event.register_action(), "REGISTER_GH");
        assert_eq!(event.delete_action(), "DELETE_GH");
        assert_eq!(event.parse_action("REGISTER_GH").unwrap(), RegistrationAction::Register);
        assert_eq!(event.parse_action("DELETE_GH").unwrap(), RegistrationAction::Delete);
    }

    #[test]
    fn foreign_or_unknown_actions_are_rejected() {
        let event = havanam();
        assert_matches!(event.parse_action("DELETE_VSNP"), Err(CoreError::Validation(_)));
        assert_matches!(event.parse_action("UPDATE_GH"), Err(CoreError::Validation(_)));
        assert_matches!(event.parse_action(""), Err(CoreError::Validation(_)));
    }
}
