//! Unit tests for document reading, rendering, and include expansion.


pub(super) use test_helpers::workspace::TempWorkspace as Fixture;
