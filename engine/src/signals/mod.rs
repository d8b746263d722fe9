// Votes, aggregation and the emission gate.
pub mod aggregator;
pub mod cooldown;
pub mod votes;

pub use aggregator::{AggregatorSettings, SignalAggregator, Strength};
pub use cooldown::{CooldownTracker, Reservation};
pub use votes::{VoteExtractor, VoteSettings};
