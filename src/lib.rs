// src/lib.rs
#![allow(clippy::module_inception)]

use ethers::contract::abigen;

abigen!(ElasticToken, r#"[
    function totalSupply() external view returns (uint256)
    function balanceOf(address) external view returns (uint256)
    function decimals() external view returns (uint8)
]"#);

abigen!(AlgoBank, "abi/algo_bank_abi.json");

pub mod api;
pub mod config;
pub mod dapp;
pub mod dashboard;
pub mod errors;
pub mod evm;
pub mod poller;
pub mod tx;
pub mod utils;
pub mod view;
