use alloy::primitives::U256;
use alloy_sol_types::SolEvent;
use fastnum::udec128;
use rebalance_sdk::{
    abi::rebalancing,
    client::RebalancingSetClient,
    error::{PreconditionError, RebalanceError, ValidationError},
    shared::SharedEngine,
    state::RebalanceEvent,
    testing::{PROPOSAL_PERIOD, TIME_TO_PIVOT, TestEnv, ether},
    types::RebalanceState,
};

#[test]
fn test_set_details_and_states() {
    let mut env = TestEnv::new();
    let details = env.engine.rebalancing_set_details(env.set).unwrap();
    assert_eq!(details.manager, env.manager);
    assert_eq!(details.current_set, env.current_set);
    assert_eq!(details.supply, ether(udec128!(20)));
    assert_eq!(details.unit_shares, ether(udec128!(0.1)));
    assert_eq!(details.state, RebalanceState::Default);

    assert!(matches!(
        env.engine.proposal_details(env.set),
        Err(RebalanceError::Precondition(PreconditionError::WrongState { .. }))
    ));

    env.propose();
    let proposal = env.engine.proposal_details(env.set).unwrap();
    assert_eq!(proposal.state, RebalanceState::Proposal);
    assert_eq!(proposal.next_set, env.next_set);
    assert_eq!(proposal.price_curve, env.curve);
    assert_eq!(proposal.proposal_start_time, env.now());
    assert_eq!(proposal.price, TestEnv::price());

    let unknown = env.next_set;
    assert_eq!(
        env.engine.rebalance_states(&[env.set, env.set]).unwrap(),
        vec![RebalanceState::Proposal; 2]
    );
    assert_eq!(
        env.engine.rebalance_states(&[env.set, unknown]),
        Err(RebalanceError::Precondition(
            PreconditionError::UnknownRebalancingSet(unknown)
        ))
    );
    assert_eq!(env.engine.rebalancing_sets().count(), 1);
}

#[test]
fn test_rebalance_details_track_price() {
    let mut env = TestEnv::new();
    env.start_auction();

    let details = env.engine.rebalance_details(env.set).unwrap();
    assert_eq!(details.elapsed, 0);
    assert_eq!(details.current_price.numerator, U256::from(500));
    assert_eq!(details.current_price.denominator, U256::from(1000));

    env.advance(TIME_TO_PIVOT / 4);
    let details = env.engine.rebalance_details(env.set).unwrap();
    assert_eq!(details.current_price.numerator, U256::from(750));

    // Linear curve keeps rising past the pivot
    env.advance(TIME_TO_PIVOT);
    let details = env.engine.rebalance_details(env.set).unwrap();
    assert_eq!(details.current_price.numerator, U256::from(1750));
}

#[test]
fn test_bid_price_matches_bid_without_mutation() {
    let mut env = TestEnv::new();
    env.start_auction();
    env.advance(TIME_TO_PIVOT / 2);

    let quantity = ether(udec128!(10));
    let preview = env.engine.bid_price(env.set, quantity).unwrap();
    assert_eq!(env.engine.bid_price(env.set, quantity).unwrap(), preview);
    assert_eq!(
        env.engine
            .rebalance_details(env.set)
            .unwrap()
            .auction
            .remaining_current_sets,
        ether(udec128!(20))
    );

    // Previews never clamp
    assert!(matches!(
        env.engine.bid_price(env.set, ether(udec128!(30))),
        Err(RebalanceError::Precondition(
            PreconditionError::ExceedsRemaining { .. }
        ))
    ));

    env.fund(env.bidder, env.token_c, ether(udec128!(10)));
    let flows = env
        .engine
        .bid(env.bidder, env.set, quantity, false, true)
        .unwrap();
    assert_eq!(flows, preview);

    let reported = preview.reported();
    assert_eq!(reported.tokens, vec![env.token_a, env.token_c]);
}

#[test]
fn test_bid_history() {
    let mut env = TestEnv::new();
    env.start_auction();
    assert!(env.engine.bid_history(env.set).is_empty());

    env.advance(TIME_TO_PIVOT / 2);
    env.fund(env.bidder, env.token_c, ether(udec128!(20)));
    env.fund(env.alice, env.token_c, ether(udec128!(20)));
    let first = env
        .engine
        .bid(env.bidder, env.set, ether(udec128!(10)), false, true)
        .unwrap();
    let second = env
        .engine
        .bid(env.alice, env.set, ether(udec128!(10)), false, false)
        .unwrap();

    let history = env.engine.bid_history(env.set);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].bidder, env.bidder);
    assert_eq!(history[0].flows, first);
    assert_eq!(history[1].bidder, env.alice);
    assert_eq!(history[1].flows, second);
    assert!(history[0].log_index < history[1].log_index);
    assert!(history[0].instant < history[1].instant);
}

#[test]
fn test_event_log_export() {
    let mut env = TestEnv::new();
    env.start_auction();

    let events = env.engine.events(env.set).collect::<Vec<_>>();
    assert!(matches!(
        events.first().map(|e| e.event()),
        Some(RebalanceEvent::RebalancingSetCreated(_))
    ));
    let issued = events
        .iter()
        .filter(|e| matches!(e.event(), RebalanceEvent::Issued(_)))
        .count();
    assert_eq!(issued, 2);

    let proposed = events
        .iter()
        .find(|e| matches!(e.event(), RebalanceEvent::Proposed(_)))
        .unwrap();
    let log = proposed.to_log();
    assert_eq!(log.address, env.set);
    let decoded = rebalancing::RebalanceProposed::decode_log_data(&log.data).unwrap();
    assert_eq!(decoded.nextSet, env.next_set);
    assert_eq!(decoded.auctionLibrary, env.curve);
    assert_eq!(
        decoded.proposalPeriodEndTime,
        U256::from(proposed.instant().timestamp() + PROPOSAL_PERIOD)
    );

    let started = events.last().unwrap();
    let decoded =
        rebalancing::RebalanceStarted::decode_log_data(&started.to_log().data).unwrap();
    assert_eq!(decoded.oldSet, env.current_set);
    assert_eq!(decoded.newSet, env.next_set);

    // Log indices are global and contiguous
    for (i, entry) in env.engine.log().iter().enumerate() {
        assert_eq!(entry.log_index(), i as u64);
    }
}

#[tokio::test]
async fn test_shared_engine_publishes_committed_events() {
    let mut env = TestEnv::new();
    env.propose();
    env.advance(PROPOSAL_PERIOD);
    let (set, manager) = (env.set, env.manager);
    let shared = SharedEngine::new(env.engine);
    let mut events = shared.subscribe();

    let ((), committed) = shared
        .execute(|engine| engine.start_rebalance(manager, set))
        .await
        .unwrap();
    assert_eq!(committed.events().len(), 1);
    let published = events.recv().await.unwrap();
    assert!(matches!(published.event(), RebalanceEvent::Started(_)));
    assert_eq!(published.instant(), committed.instant());

    // Rejected operations publish nothing
    assert!(
        shared
            .execute(|engine| engine.start_rebalance(manager, set))
            .await
            .is_err()
    );
    assert!(events.try_recv().is_err());
    assert!(shared.read().await.rebalance_state(set).unwrap().is_rebalance());
}

#[tokio::test]
async fn test_client_validates_addresses() {
    let mut env = TestEnv::new();
    env.start_auction();
    env.advance(TIME_TO_PIVOT / 2);
    env.fund(env.bidder, env.token_c, ether(udec128!(20)));
    let (set, bidder) = (env.set.to_string(), env.bidder.to_string());
    let shared = SharedEngine::new(env.engine);

    assert!(matches!(
        RebalancingSetClient::new(shared.clone(), "bidder"),
        Err(RebalanceError::Validation(ValidationError::InvalidAddress {
            field: "caller",
            ..
        }))
    ));

    let client = RebalancingSetClient::new(shared.clone(), &bidder).unwrap();
    assert!(matches!(
        client.bid_price("0x1234", ether(udec128!(10))).await,
        Err(RebalanceError::Validation(ValidationError::InvalidAddress {
            field: "set",
            ..
        }))
    ));

    assert_eq!(
        client.rebalance_state(&set.to_lowercase()).await.unwrap(),
        RebalanceState::Rebalance
    );
    let preview = client.bid_price(&set, ether(udec128!(20))).await.unwrap();
    let flows = client
        .bid(&set, ether(udec128!(20)), false, true)
        .await
        .unwrap();
    assert_eq!(flows, preview);
    assert_eq!(client.bid_history(&set).await.unwrap().len(), 1);

    client.settle_rebalance(&set).await.unwrap();
    assert_eq!(
        client.rebalance_state(&set).await.unwrap(),
        RebalanceState::Default
    );
}
