//! Telecalling practice simulator.
//!
//! A hosted LLM plays the customer; the human operator plays the agent.
//! Scenario and behavior metadata come from CSV files. Two front-ends share
//! the same core: an interactive console loop and a stateless JSON API.

pub mod config;
pub mod provider;
pub mod server;
pub mod session;
pub mod store;
pub mod turn;
