// Market data sources: CSV parsing, file feed and the in-memory store.
pub mod csv_feed;
pub mod csv_parser;
pub mod market_data;

pub use csv_feed::CsvMarketFeed;
pub use csv_parser::OhlcvCsvParser;
pub use market_data::MarketDataStore;
