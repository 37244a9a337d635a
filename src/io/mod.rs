/// Schedule CSV export.
pub mod export;
