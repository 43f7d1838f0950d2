pub mod market_watch;
pub mod player_summary;
