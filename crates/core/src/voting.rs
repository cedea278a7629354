//! Vote tallies and auto-resolution rules.
//!
//! Two paths close a pending edit by votes. The threshold path runs
//! synchronously after each vote: a unanimous tally at or above the
//! configured threshold resolves the edit immediately, except that
//! destructive edits must first age past a minimum voting period. The
//! expiry path runs from the background sweep once the full voting
//! period has elapsed and applies the edit if its net vote count meets
//! a bar: one accept for destructive edits, break-even otherwise.

use chrono::Duration;

use crate::edit::VoteType;

/// Tunables for vote-based resolution.
#[derive(Debug, Clone)]
pub struct VotingPolicy {
    /// Unanimous votes needed for early resolution. Zero disables the
    /// threshold path entirely; votes become advisory and only the
    /// expiry sweep closes edits.
    pub application_threshold: u32,
    /// How long an edit stays open before the sweep settles it.
    pub voting_period: Duration,
    /// Minimum age before a destructive edit may resolve early.
    pub destructive_voting_period: Duration,
}

impl Default for VotingPolicy {
    fn default() -> Self {
        Self {
            application_threshold: 3,
            voting_period: Duration::days(4),
            destructive_voting_period: Duration::days(2),
        }
    }
}

/// Accept and reject counts for one edit. Immediate votes count like
/// their plain counterparts here; their side effects happen elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub accepts: u32,
    pub rejects: u32,
}

impl VoteTally {
    pub fn tally<'a>(votes: impl IntoIterator<Item = &'a VoteType>) -> Self {
        let mut out = Self::default();
        for vote in votes {
            match vote {
                VoteType::Accept | VoteType::ImmediateAccept => out.accepts += 1,
                VoteType::Reject | VoteType::ImmediateReject => out.rejects += 1,
            }
        }
        out
    }

    pub fn total(&self) -> u32 {
        self.accepts + self.rejects
    }
}

/// How a vote-based resolution lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Accept,
    Reject,
}

/// Threshold path, evaluated after each vote. Resolution requires
/// unanimity: a single opposing vote keeps the edit open until the
/// sweep. `destructive` covers destroys, merges, and renames that drop
/// the old name; `age` is time since the edit was created. A destructive
/// edit younger than the grace period never auto-resolves, in either
/// direction, no matter the tally.
pub fn resolve_threshold(
    policy: &VotingPolicy,
    tally: VoteTally,
    destructive: bool,
    age: Duration,
) -> Option<VoteOutcome> {
    if policy.application_threshold == 0 {
        return None;
    }
    if destructive && age < policy.destructive_voting_period {
        return None;
    }

    if tally.accepts >= policy.application_threshold && tally.rejects == 0 {
        return Some(VoteOutcome::Accept);
    }

    if tally.rejects >= policy.application_threshold && tally.accepts == 0 {
        return Some(VoteOutcome::Reject);
    }

    None
}

/// Expiry path, run by the sweep on edits whose voting period has
/// elapsed. The net vote count must meet a bar: one accept for
/// destructive edits, break-even for everything else. An unopposed
/// non-destructive edit therefore applies by default on expiry, ties
/// included; a destructive edit nobody voted on is rejected.
pub fn resolve_expired(tally: VoteTally, destructive: bool) -> VoteOutcome {
    let bar: i64 = if destructive { 1 } else { 0 };
    if i64::from(tally.accepts) - i64::from(tally.rejects) >= bar {
        VoteOutcome::Accept
    } else {
        VoteOutcome::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(threshold: u32) -> VotingPolicy {
        VotingPolicy {
            application_threshold: threshold,
            ..Default::default()
        }
    }

    fn aged() -> Duration {
        Duration::days(30)
    }

    #[test]
    fn tally_counts_immediate_votes_with_their_side() {
        let votes = [
            VoteType::Accept,
            VoteType::ImmediateAccept,
            VoteType::Reject,
            VoteType::ImmediateReject,
        ];
        let tally = VoteTally::tally(&votes);
        assert_eq!(tally, VoteTally { accepts: 2, rejects: 2 });
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn unanimous_accepts_at_threshold_resolve() {
        let tally = VoteTally { accepts: 2, rejects: 0 };
        assert_eq!(
            resolve_threshold(&policy(2), tally, false, aged()),
            Some(VoteOutcome::Accept)
        );
    }

    #[test]
    fn a_single_opposing_vote_blocks_early_resolution() {
        // Two accepts and one reject at threshold two stays open.
        let tally = VoteTally { accepts: 2, rejects: 1 };
        assert_eq!(resolve_threshold(&policy(2), tally, false, aged()), None);
    }

    #[test]
    fn unanimous_rejects_at_threshold_resolve() {
        let tally = VoteTally { accepts: 0, rejects: 2 };
        assert_eq!(
            resolve_threshold(&policy(2), tally, false, Duration::minutes(5)),
            Some(VoteOutcome::Reject)
        );
    }

    #[test]
    fn destructive_accepts_wait_out_the_grace_period() {
        let tally = VoteTally { accepts: 3, rejects: 0 };
        assert_eq!(
            resolve_threshold(&policy(2), tally, true, Duration::hours(1)),
            None
        );
        assert_eq!(
            resolve_threshold(&policy(2), tally, true, Duration::days(3)),
            Some(VoteOutcome::Accept)
        );
    }

    #[test]
    fn destructive_rejects_wait_out_the_grace_period_too() {
        let tally = VoteTally { accepts: 0, rejects: 2 };
        assert_eq!(
            resolve_threshold(&policy(2), tally, true, Duration::minutes(5)),
            None
        );
        assert_eq!(
            resolve_threshold(&policy(2), tally, true, Duration::days(3)),
            Some(VoteOutcome::Reject)
        );
    }

    #[test]
    fn zero_threshold_makes_votes_advisory() {
        let tally = VoteTally { accepts: 10, rejects: 0 };
        assert_eq!(resolve_threshold(&policy(0), tally, false, aged()), None);
    }

    #[test]
    fn expired_edits_settle_by_majority() {
        assert_eq!(
            resolve_expired(VoteTally { accepts: 2, rejects: 1 }, false),
            VoteOutcome::Accept
        );
        assert_eq!(
            resolve_expired(VoteTally { accepts: 1, rejects: 2 }, false),
            VoteOutcome::Reject
        );
    }

    #[test]
    fn expired_unopposed_edits_apply_by_default() {
        // Ties and silence both meet the zero bar for non-destructive edits.
        assert_eq!(
            resolve_expired(VoteTally { accepts: 1, rejects: 1 }, false),
            VoteOutcome::Accept
        );
        assert_eq!(
            resolve_expired(VoteTally::default(), false),
            VoteOutcome::Accept
        );
    }

    #[test]
    fn expired_destructive_edits_need_a_net_accept() {
        assert_eq!(
            resolve_expired(VoteTally::default(), true),
            VoteOutcome::Reject
        );
        assert_eq!(
            resolve_expired(VoteTally { accepts: 1, rejects: 1 }, true),
            VoteOutcome::Reject
        );
        assert_eq!(
            resolve_expired(VoteTally { accepts: 1, rejects: 0 }, true),
            VoteOutcome::Accept
        );
    }
}
