pub mod aggregate;
pub mod sources;

pub use aggregate::fetch_listings;
pub use sources::{HttpListingSource, ListingSource};
