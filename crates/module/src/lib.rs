//! Ledger-side orchestration of sealed-bid auctions.
//!
//! This module sequences an auction through its phases:
//!
//! `Open --close--> Closed --end--> Ended --declare winner--> WinnerDeclared`
//!
//! - Commitments are accepted while open, each with a proof of knowledge
//!   bound to the auction; a commitment already on the auction is refused
//! - Reveals are accepted while closed, each with a proof bound to the
//!   auction, the bid id and the encrypted payload
//! - Only the seller moves the phase forward
//! - The winner is declared only with a settlement proof that verifies and
//!   that accounts for every revealed bid: each one is settled, or excluded
//!   with a key disclosure showing its payload does not open
//!
//! # Architecture
//!
//! - `ledger`: the ledger collaborator and an in-memory implementation
//! - `call`: Message types and dispatch
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Record storage
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{AuctionCall, AuctionModule, CallerIdentity, MemoryLedger};
//!
//! let module = AuctionModule::from_genesis(&genesis)?;
//! let ledger = MemoryLedger::new(["Org1MSP"]);
//! let seller = CallerIdentity::new("seller", "Org1MSP");
//!
//! ledger.submit(&seller, |tx| module.execute(tx, AuctionCall::CloseAuction { auction_id }))?;
//! ```

pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod ledger;
pub mod queries;
pub mod state;

pub use call::{AuctionCall, AuctionModule, CallResponse};
pub use error::{AuctionError, LedgerError};
pub use genesis::{AuctionGenesisConfig, GenesisValidationError};
pub use handlers::HandlerResult;
pub use ledger::{CallerIdentity, LedgerContext, MemoryLedger, TxContext};
pub use queries::{handle_query, AuctionQuery, AuctionQueryResponse, AuctionResult};
