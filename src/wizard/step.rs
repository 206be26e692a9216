//! The five fixed wizard steps

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Steps in the listing submission process, in order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
    JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum WizardStep {
    /// Title, description, price, type and status
    BasicInfo,
    /// Rooms, size, amenities
    Details,
    /// Photos and primary image
    Images,
    /// Street address and neighborhood
    Location,
    /// Read-only summary before submission
    Review,
}

/// Progress of a step relative to the active one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::BasicInfo;
    pub const LAST: WizardStep = WizardStep::Review;
    pub const COUNT: u8 = 5;

    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::BasicInfo,
            WizardStep::Details,
            WizardStep::Images,
            WizardStep::Location,
            WizardStep::Review,
        ]
    }

    /// 1-based position of the step
    pub fn index(self) -> u8 {
        match self {
            WizardStep::BasicInfo => 1,
            WizardStep::Details => 2,
            WizardStep::Images => 3,
            WizardStep::Location => 4,
            WizardStep::Review => 5,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(WizardStep::BasicInfo),
            2 => Some(WizardStep::Details),
            3 => Some(WizardStep::Images),
            4 => Some(WizardStep::Location),
            5 => Some(WizardStep::Review),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "Basic Information",
            WizardStep::Details => "Property Details",
            WizardStep::Images => "Images & Media",
            WizardStep::Location => "Location & Map",
            WizardStep::Review => "Review & Submit",
        }
    }

    /// Fields that must be present and valid before leaving this step forward
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            WizardStep::BasicInfo => &["title", "description", "price", "propertyType", "status"],
            WizardStep::Details => &["bedrooms", "bathrooms", "squareFootage"],
            WizardStep::Images => &[],
            WizardStep::Location => &[
                "address.street",
                "address.city",
                "address.state",
                "address.zipCode",
                "address.country",
            ],
            WizardStep::Review => &[],
        }
    }

    /// Following step, saturating at Review
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(Self::LAST)
    }

    /// Preceding step, saturating at BasicInfo
    pub fn previous(self) -> Self {
        Self::from_index(self.index().saturating_sub(1)).unwrap_or(Self::FIRST)
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    /// Status of this step when `current` is active
    pub fn status_relative_to(self, current: WizardStep) -> StepStatus {
        match self.cmp(&current) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Current,
            std::cmp::Ordering::Greater => StepStatus::Upcoming,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
