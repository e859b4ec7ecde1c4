//! Domain records for grants, schedule templates and vesting events.
//!
//! Companies, employees and documents are inert records owned by the
//! surrounding application; only the entities that feed or result from the
//! vesting computation are modelled here.

mod event;
mod grant;
mod schedule;

pub use event::{event_id, VestingEvent, VestingStatus};
pub use grant::{Grant, GrantStatus};
pub use schedule::{
    MilestoneType, ScheduleType, VestingFrequency, VestingMilestone, VestingScheduleTemplate,
};

/// Text that does not name any variant of a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Implements `as_str`, `Display` and `FromStr` for a unit-only enum whose
/// storage form is a fixed snake_case string.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::model::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::model::UnknownVariant::new($kind, other)),
                }
            }
        }
    };
}

pub(crate) use string_enum;
