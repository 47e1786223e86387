//! Upstream implementations

pub mod fixture;

pub use fixture::FixtureUpstream;
