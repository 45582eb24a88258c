//! Client SDK for bidding in sealed-bid auctions.
//!
//! This crate provides a high-level API for:
//! - Committing to a bid with a proof of knowledge of the opening
//! - Revealing a bid to the auctioneer with a proof bound to the payload
//! - Querying auction state

pub mod bid;
pub mod query;

pub use bid::{create_bid, BidBuilder, BidError, PreparedBid, PreparedReveal};
pub use query::{AuctionReader, LedgerReader};
