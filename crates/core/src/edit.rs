//! Edit state machine vocabulary.
//!
//! Statuses, operations, target types, and vote types are stored as TEXT
//! in the database; the string forms here are the stable wire and storage
//! representation.

use serde::{Deserialize, Serialize};

/// The kind of entity an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Tag,
    Performer,
    Studio,
    Scene,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "TAG",
            Self::Performer => "PERFORMER",
            Self::Studio => "STUDIO",
            Self::Scene => "SCENE",
        }
    }
}

impl std::str::FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TAG" => Ok(Self::Tag),
            "PERFORMER" => Ok(Self::Performer),
            "STUDIO" => Ok(Self::Studio),
            "SCENE" => Ok(Self::Scene),
            other => Err(format!("unknown target type '{other}'")),
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an edit proposes to do to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    Modify,
    Destroy,
    Merge,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Modify => "MODIFY",
            Self::Destroy => "DESTROY",
            Self::Merge => "MERGE",
        }
    }

    /// Destructive operations are held open for a minimum grace period
    /// before they may auto-resolve.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Destroy | Self::Merge)
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "MODIFY" => Ok(Self::Modify),
            "DESTROY" => Ok(Self::Destroy),
            "MERGE" => Ok(Self::Merge),
            other => Err(format!("unknown operation '{other}'")),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an edit sits in its lifecycle. PENDING is the only non-terminal
/// state; an edit never leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditStatus {
    Pending,
    Accepted,
    ImmediateAccepted,
    Rejected,
    ImmediateRejected,
    Canceled,
    Failed,
}

impl EditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::ImmediateAccepted => "IMMEDIATE_ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::ImmediateRejected => "IMMEDIATE_REJECTED",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::ImmediateAccepted)
    }
}

impl std::str::FromStr for EditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "IMMEDIATE_ACCEPTED" => Ok(Self::ImmediateAccepted),
            "REJECTED" => Ok(Self::Rejected),
            "IMMEDIATE_REJECTED" => Ok(Self::ImmediateRejected),
            "CANCELED" => Ok(Self::Canceled),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown edit status '{other}'")),
        }
    }
}

impl std::fmt::Display for EditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user's vote on a pending edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    Accept,
    Reject,
    ImmediateAccept,
    ImmediateReject,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::ImmediateAccept => "IMMEDIATE_ACCEPT",
            Self::ImmediateReject => "IMMEDIATE_REJECT",
        }
    }
}

impl std::str::FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPT" => Ok(Self::Accept),
            "REJECT" => Ok(Self::Reject),
            "IMMEDIATE_ACCEPT" => Ok(Self::ImmediateAccept),
            "IMMEDIATE_REJECT" => Ok(Self::ImmediateReject),
            other => Err(format!("unknown vote type '{other}'")),
        }
    }
}

impl std::fmt::Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in [
            EditStatus::Pending,
            EditStatus::Accepted,
            EditStatus::ImmediateAccepted,
            EditStatus::Rejected,
            EditStatus::ImmediateRejected,
            EditStatus::Canceled,
            EditStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<EditStatus>().unwrap(), status);
        }
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!EditStatus::Pending.is_terminal());
        assert!(EditStatus::Accepted.is_terminal());
        assert!(EditStatus::Failed.is_terminal());
        assert!(EditStatus::Canceled.is_terminal());
    }

    #[test]
    fn destroy_and_merge_are_destructive() {
        assert!(Operation::Destroy.is_destructive());
        assert!(Operation::Merge.is_destructive());
        assert!(!Operation::Create.is_destructive());
        assert!(!Operation::Modify.is_destructive());
    }

    #[test]
    fn unknown_strings_are_rejected() {
        assert!("BOGUS".parse::<EditStatus>().is_err());
        assert!("bogus".parse::<Operation>().is_err());
        assert!("".parse::<TargetType>().is_err());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&EditStatus::ImmediateAccepted).unwrap();
        assert_eq!(json, "\"IMMEDIATE_ACCEPTED\"");
    }
}
