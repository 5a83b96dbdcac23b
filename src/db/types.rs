use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Lifecycle state of an edition.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Edition_state"]
#[serde(rename_all = "kebab-case")]
pub enum EditionState {
    /// Being drafted, visible only in the admin interface.
    Draft,
    /// Submitted for review by a second pair of eyes.
    Submitted,
    /// Sent back to its authors by a reviewer.
    Rejected,
    /// Live on the public site.
    Published,
    /// Waiting for its scheduled publication date.
    Scheduled,
    /// Withdrawn from the public site after being published.
    Unpublished,
    /// Brought in from a legacy system, not yet editable.
    Imported,
}

impl fmt::Display for EditionState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            EditionState::Draft => "draft",
            EditionState::Submitted => "submitted",
            EditionState::Rejected => "rejected",
            EditionState::Published => "published",
            EditionState::Scheduled => "scheduled",
            EditionState::Unpublished => "unpublished",
            EditionState::Imported => "imported",
        })
    }
}

/// Kind of document an edition belongs to.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Edition_kind"]
#[serde(rename_all = "kebab-case")]
pub enum EditionKind {
    Policy,
    Publication,
    Consultation,
}

impl fmt::Display for EditionKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            EditionKind::Policy => "policy",
            EditionKind::Publication => "publication",
            EditionKind::Consultation => "consultation",
        })
    }
}

/// Virus-scan outcome recorded for an attachment.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Scan_status"]
#[serde(rename_all = "kebab-case")]
pub enum ScanStatus {
    /// Not yet looked at by the scanning pipeline.
    Unscanned,
    Clean,
    Infected,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            ScanStatus::Unscanned => "unscanned",
            ScanStatus::Clean => "clean",
            ScanStatus::Infected => "infected",
        })
    }
}

/// Reason a published edition was withdrawn.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Unpublishing_reason"]
#[serde(rename_all = "kebab-case")]
pub enum UnpublishingReason {
    PublishedInError,
    Consolidated,
    Withdrawn,
}

impl fmt::Display for UnpublishingReason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            UnpublishingReason::PublishedInError => "published-in-error",
            UnpublishingReason::Consolidated => "consolidated",
            UnpublishingReason::Withdrawn => "withdrawn",
        })
    }
}
