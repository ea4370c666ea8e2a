pub use alloy::providers::DynProvider as Provider;

mod bindings {
    alloy::sol! {
        #[allow(missing_docs)]
        #[sol(rpc)]
        interface IERC20 {
            function balanceOf(address owner) external view returns (uint256);
            function allowance(address owner, address spender) external view returns (uint256);
            function approve(address spender, uint256 value) external returns (bool);
        }

        #[allow(missing_docs)]
        #[sol(rpc)]
        interface IWETH9 {
            function deposit() external payable;
            function withdraw(uint256 value) external;
        }

        #[allow(missing_docs)]
        #[sol(rpc)]
        interface IExchange {
            struct Order {
                address makerAddress;
                address takerAddress;
                address feeRecipientAddress;
                address senderAddress;
                uint256 makerAssetAmount;
                uint256 takerAssetAmount;
                uint256 makerFee;
                uint256 takerFee;
                uint256 expirationTimeSeconds;
                uint256 salt;
                bytes makerAssetData;
                bytes takerAssetData;
            }

            struct OrderInfo {
                uint8 orderStatus;
                bytes32 orderHash;
                uint256 orderTakerAssetFilledAmount;
            }

            function getOrderInfo(Order order) external view returns (OrderInfo orderInfo);
            function filled(bytes32 orderHash) external view returns (uint256);
            function cancelled(bytes32 orderHash) external view returns (bool);
        }
    }
}

#[allow(non_snake_case)]
pub mod ERC20 {
    pub use super::bindings::IERC20::*;
    pub type Instance = IERC20Instance<super::Provider>;
}

#[allow(non_snake_case)]
pub mod WETH9 {
    pub use super::bindings::IWETH9::*;
    pub type Instance = IWETH9Instance<super::Provider>;
}

#[allow(non_snake_case)]
pub mod Exchange {
    pub use super::bindings::IExchange::*;
    pub type Instance = IExchangeInstance<super::Provider>;
}
