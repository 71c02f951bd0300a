//! The proxy resolver.
//!
//! After any accepted manual bid or proxy-limit change the resolver
//! replays automatic counter-bids until the auction settles: no bidder
//! other than the leader holds a limit that could still fund a raise of
//! one full increment, and the leader's own limit is never exceeded.
//!
//! The loop is the classic sealed-maximum rule of ascending auctions:
//! win by exactly one increment over the next-strongest competitor,
//! never reveal more of a ceiling than necessary. A challenger whose
//! limit cannot strictly beat the leader's ceiling loses, but still
//! drives the leader's automatic bid up to the point where the
//! challenger's next raise would exceed their own limit.

use jiff::Timestamp;

use crate::auction::Auction;

/// The strongest challenger to the current leader, if any.
///
/// The top challenger holds the strictly highest limit among proxy
/// bidders other than the leader that can still fund the next required
/// bid; ties go to the bidder whose limit was registered first.
struct Challenge<'a> {
    bidder_id: &'a str,
    limit: u64,
    /// The highest limit among the remaining challengers.
    runner_up: u64,
}

fn strongest_challenge<'a>(auction: &'a Auction, next_required: u64) -> Option<Challenge<'a>> {
    let leader = auction.highest_bidder.as_deref();
    let mut top: Option<(&str, u64)> = None;
    let mut runner_up = 0;
    for (bidder_id, &limit) in &auction.proxy_limits {
        if Some(bidder_id.as_str()) == leader || limit < next_required {
            continue;
        }
        match top {
            Some((_, top_limit)) if limit <= top_limit => runner_up = runner_up.max(limit),
            Some((_, top_limit)) => {
                runner_up = runner_up.max(top_limit);
                top = Some((bidder_id, limit));
            }
            None => top = Some((bidder_id, limit)),
        }
    }
    top.map(|(bidder_id, limit)| Challenge {
        bidder_id,
        limit,
        runner_up,
    })
}

/// Runs automatic counter-bids until the auction reaches its fixpoint.
///
/// Returns whether any automatic bid was committed. Calling this twice
/// without an intervening mutation commits nothing the second time.
///
/// An auction without a standing bid never moves: a proxy limit only
/// answers bids, so declaring one on a bidless auction leaves the price
/// at the reserve with no leader.
pub fn resolve(auction: &mut Auction, now: Timestamp) -> bool {
    let increment = auction.config.min_increment;
    let mut moved = false;
    loop {
        let Some(leader) = auction.highest_bidder.clone() else {
            break;
        };
        let next_required = auction.next_required();
        let Some(challenge) = strongest_challenge(auction, next_required) else {
            break;
        };
        let leader_ceiling = auction.leader_ceiling();

        if challenge.limit > leader_ceiling {
            // The challenger takes the lead at the minimal winning raise:
            // one increment over the next-strongest competitor, capped by
            // their own limit, and at least the required minimum.
            let strongest_other = challenge.runner_up.max(leader_ceiling);
            let amount = strongest_other
                .saturating_add(increment)
                .min(challenge.limit)
                .max(next_required);
            let bidder_id = challenge.bidder_id.to_string();
            auction.record_automatic_bid(&bidder_id, amount, now);
        } else {
            // The leader's ceiling holds. Their proxy counter-raises just
            // far enough that the challenger's next legal bid would have
            // to exceed the challenger's own limit.
            let raise = challenge
                .limit
                .saturating_add(increment)
                .min(leader_ceiling);
            if raise <= auction.current_price {
                break;
            }
            auction.record_automatic_bid(&leader, raise, now);
        }
        moved = true;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auction::{
            tests::{
                active_now,
                test_auction,
            },
            BidOrigin,
        },
        validate::validate_manual_bid,
    };

    /// Checks the settled-state invariants listed in the crate docs.
    fn assert_settled(auction: &Auction) {
        assert!(auction.current_price >= auction.config.reserve_price);
        let next_required = auction.next_required();
        for (bidder_id, &limit) in &auction.proxy_limits {
            if auction.highest_bidder.as_deref() != Some(bidder_id.as_str()) {
                assert!(
                    limit < next_required,
                    "{bidder_id} could still outbid the leader"
                );
            }
        }
        if let Some(leader) = auction.highest_bidder.as_deref() {
            if let Some(&limit) = auction.proxy_limits.get(leader) {
                assert!(auction.current_price <= limit, "leader's own limit exceeded");
            }
            let last_price_setter = auction
                .bid_history
                .iter()
                .rev()
                .find(|bid| bid.amount == auction.current_price)
                .expect("a price-setting ledger entry must exist");
            assert_eq!(last_price_setter.bidder_id, leader);
        }
    }

    #[test]
    fn proxy_limit_on_a_bidless_auction_does_not_move_the_price() {
        let mut auction = test_auction(1000, 100);
        auction.upsert_proxy_limit("alice".to_string(), 1500);

        assert!(!resolve(&mut auction, active_now()));
        assert_eq!(auction.current_price, 1000);
        assert_eq!(auction.highest_bidder, None);
        assert!(auction.bid_history.is_empty());
    }

    #[test]
    fn proxy_beats_a_manual_bid_by_one_increment() {
        let mut auction = test_auction(1000, 100);
        auction.upsert_proxy_limit("alice".to_string(), 1500);
        assert!(!resolve(&mut auction, active_now()));

        // Legal precisely because alice's declaration left the price at
        // the reserve.
        validate_manual_bid(&auction, active_now(), "bob", 1100).unwrap();
        auction.record_manual_bid("bob", 1100, active_now());

        assert!(resolve(&mut auction, active_now()));
        assert_eq!(auction.current_price, 1200);
        assert_eq!(auction.highest_bidder.as_deref(), Some("alice"));
        let last = auction.bid_history.last().unwrap();
        assert_eq!(last.origin, BidOrigin::Automatic);
        assert_eq!(last.amount, 1200);
        assert_settled(&auction);
    }

    #[test]
    fn tied_limits_stall_with_the_earlier_registered_bidder_leading() {
        let mut auction = test_auction(1000, 100);
        auction.upsert_proxy_limit("alice".to_string(), 1500);
        resolve(&mut auction, active_now());
        auction.record_manual_bid("bob", 1100, active_now());
        resolve(&mut auction, active_now());

        // bob matches alice's ceiling; neither can exceed the other's
        // equal limit by a full increment.
        auction.upsert_proxy_limit("bob".to_string(), 1500);
        assert!(resolve(&mut auction, active_now()));

        assert_eq!(auction.highest_bidder.as_deref(), Some("alice"));
        assert_eq!(auction.current_price, 1500);
        assert_settled(&auction);
    }

    #[test]
    fn leader_counter_raises_over_a_weaker_challenger() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("alice", 1100, active_now());
        auction.upsert_proxy_limit("alice".to_string(), 1500);

        auction.upsert_proxy_limit("bob".to_string(), 1460);
        assert!(resolve(&mut auction, active_now()));

        // 1460 + 100 would overshoot alice's ceiling, so the raise caps
        // there and bob is priced out.
        assert_eq!(auction.highest_bidder.as_deref(), Some("alice"));
        assert_eq!(auction.current_price, 1500);
        assert_settled(&auction);
    }

    #[test]
    fn challenger_between_price_and_ceiling_loses_at_their_limit_plus_increment() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("alice", 1100, active_now());
        auction.upsert_proxy_limit("alice".to_string(), 2000);

        auction.upsert_proxy_limit("bob".to_string(), 1400);
        assert!(resolve(&mut auction, active_now()));

        assert_eq!(auction.highest_bidder.as_deref(), Some("alice"));
        assert_eq!(auction.current_price, 1500);
        assert_settled(&auction);
    }

    #[test]
    fn tied_challengers_above_a_manual_leader_go_to_the_first_registered() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("alice", 1200, active_now());

        auction.upsert_proxy_limit("bob".to_string(), 1500);
        auction.upsert_proxy_limit("carol".to_string(), 1500);
        assert!(resolve(&mut auction, active_now()));

        // Neither can beat the other's equal limit by an increment, so
        // the earlier registration wins at the full limit.
        assert_eq!(auction.highest_bidder.as_deref(), Some("bob"));
        assert_eq!(auction.current_price, 1500);
        assert_settled(&auction);
    }

    #[test]
    fn duel_between_two_proxies_settles_one_increment_over_the_loser() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("carol", 1100, active_now());

        auction.upsert_proxy_limit("alice".to_string(), 2000);
        resolve(&mut auction, active_now());
        auction.upsert_proxy_limit("bob".to_string(), 1700);
        assert!(resolve(&mut auction, active_now()));

        assert_eq!(auction.highest_bidder.as_deref(), Some("alice"));
        assert_eq!(auction.current_price, 1800);
        assert_settled(&auction);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("bob", 1100, active_now());
        auction.upsert_proxy_limit("alice".to_string(), 1500);

        assert!(resolve(&mut auction, active_now()));
        let settled = auction.clone();
        assert!(!resolve(&mut auction, active_now()));
        assert_eq!(auction, settled);
    }

    #[test]
    fn current_price_is_monotonic_across_a_bidding_war() {
        let mut auction = test_auction(500, 50);
        auction.record_manual_bid("m1", 550, active_now());
        auction.upsert_proxy_limit("p1".to_string(), 900);
        resolve(&mut auction, active_now());
        auction.upsert_proxy_limit("p2".to_string(), 1200);
        resolve(&mut auction, active_now());
        auction.record_manual_bid("m2", auction.next_required(), active_now());
        resolve(&mut auction, active_now());

        let amounts: Vec<_> = auction.bid_history.iter().map(|bid| bid.amount).collect();
        assert!(
            amounts.windows(2).all(|pair| pair[0] <= pair[1]),
            "ledger amounts must never decrease: {amounts:?}"
        );
        assert_settled(&auction);
    }
}
