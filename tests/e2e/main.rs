// Integration tests for the feed sync core.
//
// Each test builds an isolated in-memory SQLite cache plus a scripted mock of
// the posts backend, so tests run in parallel without touching the network.
// The mock records every call it receives, which is how the suite asserts
// zero-network short-circuits.

mod test_feed_service;
mod test_local_store;
mod test_poller;
