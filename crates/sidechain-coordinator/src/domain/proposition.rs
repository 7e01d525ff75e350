//! Pure helpers over [`sidechain_types::RoundProposition`]: construction,
//! signature accumulation, quorum and timeout checks. Kept free of I/O so
//! [`crate::service::Coordinator`]'s tick logic stays easy to reason about.

use sidechain_types::RoundProposition;

use crate::config::MAX_PROPOSITION_WAITING_PERIODS;

/// Start a new proposition, recording the proposer's own signature as the
/// first entry
pub fn new_proposition(
    round: u64,
    round_hash: String,
    proposer_account: String,
    proposer_signature: String,
) -> RoundProposition {
    RoundProposition {
        round,
        round_hash,
        signatures: vec![(proposer_account, proposer_signature)],
        ticks_waited: 0,
    }
}

/// Append a peer's verifying signature, unless that peer has already
/// signed (duplicate replies from the same peer never double-count toward
/// quorum).
pub fn append_signature(proposition: &mut RoundProposition, account: String, signature: String) {
    if proposition.signatures.iter().any(|(a, _)| *a == account) {
        return;
    }
    proposition.signatures.push((account, signature));
}

/// Quorum is reached once `|signatures| >= quorum`
pub fn has_quorum(proposition: &RoundProposition, quorum: usize) -> bool {
    proposition.signatures.len() >= quorum
}

/// Advance the wait counter by one tick.
pub fn tick_waited(proposition: &mut RoundProposition) {
    proposition.ticks_waited += 1;
}

/// Whether the proposition has waited out `MAX_PROPOSITION_WAITING_PERIODS`
/// without reaching quorum.
pub fn timed_out(proposition: &RoundProposition) -> bool {
    proposition.ticks_waited >= MAX_PROPOSITION_WAITING_PERIODS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_counts_proposer_plus_peers() {
        let mut p = new_proposition(1, "h".repeat(64), "alice".into(), "s".repeat(130));
        assert!(!has_quorum(&p, 3));
        append_signature(&mut p, "bob".into(), "s".repeat(130));
        assert!(!has_quorum(&p, 3));
        append_signature(&mut p, "carol".into(), "s".repeat(130));
        assert!(has_quorum(&p, 3));
    }

    #[test]
    fn duplicate_peer_reply_does_not_double_count() {
        let mut p = new_proposition(1, "h".repeat(64), "alice".into(), "s".repeat(130));
        append_signature(&mut p, "bob".into(), "s".repeat(130));
        append_signature(&mut p, "bob".into(), "s".repeat(130));
        assert_eq!(p.signatures.len(), 2);
    }

    #[test]
    fn times_out_after_max_waiting_periods() {
        let mut p = new_proposition(1, "h".repeat(64), "alice".into(), "s".repeat(130));
        for _ in 0..MAX_PROPOSITION_WAITING_PERIODS {
            assert!(!timed_out(&p));
            tick_waited(&mut p);
        }
        assert!(timed_out(&p));
    }
}
