#[allow(clippy::too_many_arguments)]
pub mod rebalancing {
    alloy::sol!(
        /// Emitted by the factory when a new rebalancing set is created.
        #[derive(Debug, PartialEq, Eq)]
        event RebalancingSetCreated(
            address indexed rebalancingSet,
            address indexed manager,
            address initialSet,
            uint256 unitShares,
            uint256 naturalUnit
        );

        #[derive(Debug, PartialEq, Eq)]
        event NewManagerAdded(address newManager, address oldManager);

        #[derive(Debug, PartialEq, Eq)]
        event RebalanceProposed(
            address nextSet,
            address indexed auctionLibrary,
            uint256 indexed proposalPeriodEndTime
        );

        #[derive(Debug, PartialEq, Eq)]
        event RebalanceStarted(address oldSet, address newSet);

        #[derive(Debug, PartialEq, Eq)]
        event BidPlaced(
            address indexed rebalancingSetToken,
            address indexed bidder,
            uint256 executionQuantity,
            address[] combinedTokenAddresses,
            uint256[] inflowTokenUnits,
            uint256[] outflowTokenUnits
        );

        #[derive(Debug, PartialEq, Eq)]
        event RebalanceSettled(address newSet, uint256 issueQuantity, uint256 unitShares);

        /// Emitted when an auction ends without completing. `drawdown` is set when
        /// partial fills left custody split across both baskets.
        #[derive(Debug, PartialEq, Eq)]
        event AuctionFailed(uint256 remainingCurrentSets, bool drawdown);

        #[derive(Debug, PartialEq, Eq)]
        event RedeemedFromFailedRebalance(address indexed holder, uint256 quantity);

        #[derive(Debug, PartialEq, Eq)]
        event Issued(address indexed issuer, uint256 quantity);

        #[derive(Debug, PartialEq, Eq)]
        event Redeemed(address indexed redeemer, uint256 quantity);
    );
}

#[allow(clippy::too_many_arguments)]
pub mod basket {
    alloy::sol!(
        /// Emitted when a plain basket set token is created.
        #[derive(Debug, PartialEq, Eq)]
        event SetTokenCreated(
            address indexed setToken,
            address[] components,
            uint256[] units,
            uint256 naturalUnit
        );
    );
}
