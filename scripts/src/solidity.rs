//! Definitions of the Solidity interfaces called by the scripts

use alloy::sol;

sol! {
    /// The upgrade surface exposed by every logic contract in the upgrade chain
    #[sol(rpc)]
    interface IDeployer {
        function implementation() external view returns (address);
        function implement(address newImplementation) external;
    }

    /// The DAO surface of the Root once it delegates to the final implementation
    #[sol(rpc)]
    interface IDao {
        function upgradeToE(address newImplementation) external;
        function advance() external;

        function dollar() external view returns (address);
        function pool() external view returns (address);
        function oracle() external view returns (address);

        function totalBonds() external view returns (uint256);
        function totalBondRedeemable() external view returns (uint256);
        function balanceOfBonds(address account, uint256 epoch) external view returns (uint256);
        function epochPrice(uint256 epoch) external view returns (uint256);
        function getRedeemablePrice(uint256 epoch) external view returns (uint256);
        function getBondPremium(uint256 epoch) external view returns (uint256);

        event BondPurchase(address indexed account, uint256 indexed epoch, uint256 dollarAmount, uint256 bondAmount);
        event BondRedemption(address indexed account, uint256 indexed epoch, uint256 dollarAmount, uint256 bondAmount);
    }

    #[sol(rpc)]
    interface IOracle {
        function pair() external view returns (address);
    }

    #[sol(rpc)]
    interface ITestnetUsdc {
        function mint(address account, uint256 amount) external;
    }
}
