//! Known 0x v2 deployments.
//!
//! Exactly one network is selected per run and handed to every component
//! that needs it.

use {
    alloy::primitives::{Address, address},
    std::{fmt, str::FromStr},
    thiserror::Error,
    url::Url,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Addresses {
    pub exchange: Address,
    /// The asset proxy that moves ERC20 tokens on behalf of the exchange.
    /// Allowances have to be granted to this contract.
    pub erc20_proxy: Address,
    /// The fee token.
    pub zrx_token: Address,
    pub weth_token: Address,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Network {
    pub name: &'static str,
    pub id: u64,
    rpc_url: &'static str,
    pub addresses: Addresses,
}

impl Network {
    pub const GANACHE: Self = Self {
        name: "ganache",
        id: 50,
        rpc_url: "http://127.0.0.1:8545",
        addresses: Addresses {
            exchange: address!("48bacb9266a570d521063ef5dd96e61686dbe788"),
            erc20_proxy: address!("1dc4c1cefef38a777b15aa20260a54e584b16c48"),
            zrx_token: address!("871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c"),
            weth_token: address!("0b1ba0af832d7c05fd64161e0db78e85978e8082"),
        },
    };
    pub const KOVAN: Self = Self {
        name: "kovan",
        id: 42,
        rpc_url: "https://kovan.infura.io/",
        addresses: Addresses {
            exchange: address!("35dd2932454449b14cee11a94d3674a936d5d7b2"),
            erc20_proxy: address!("f1ec01d6236d3cd881a0bf0130ea25fe4234003e"),
            zrx_token: address!("2002d3812f58e35f0ea1ffbf80a75a38c32175fa"),
            weth_token: address!("d0a1e359811322d97991e03f863a0c30c2cf029c"),
        },
    };
    pub const ROPSTEN: Self = Self {
        name: "ropsten",
        id: 3,
        rpc_url: "https://ropsten.infura.io/",
        addresses: Addresses {
            exchange: address!("4530c0483a1633c7a1c97d2c53721caff2caaaaf"),
            erc20_proxy: address!("b1408f4c245a23c31b98d2c626777d4c0d766caa"),
            zrx_token: address!("ff67881f8d12f372d91baae9752eb3631ff0ed00"),
            weth_token: address!("c778417e063141139fce010982780140aa0cd5ab"),
        },
    };
    pub const MAINNET: Self = Self {
        name: "mainnet",
        id: 1,
        rpc_url: "https://mainnet.infura.io/",
        addresses: Addresses {
            exchange: address!("4f833a24e1f95d70f028921e27040ca56e09ab0b"),
            erc20_proxy: address!("2240dab907db71e64d3e0dba4800c83b5c502d4e"),
            zrx_token: address!("e41d2489571d322189246dafa5ebde1f4699f498"),
            weth_token: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
        },
    };

    pub const ALL: [Self; 4] = [Self::GANACHE, Self::KOVAN, Self::ROPSTEN, Self::MAINNET];

    pub fn by_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|network| network.id == id)
    }

    /// The default node for this network.
    pub fn rpc_url(&self) -> Url {
        Url::parse(self.rpc_url).expect("preset rpc urls are valid")
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown network {0:?}, expected one of ganache, kovan, ropsten, mainnet or their ids")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownNetwork(s.to_owned());
        if let Ok(id) = s.parse::<u64>() {
            return Self::by_id(id).ok_or_else(unknown);
        }
        Self::ALL
            .into_iter()
            .find(|network| network.name.eq_ignore_ascii_case(s))
            .ok_or_else(unknown)
    }
}
