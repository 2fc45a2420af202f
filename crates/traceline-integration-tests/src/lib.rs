//! End-to-end integration tests for Traceline
//!
//! These tests wire the client, session, and transport layers together
//! against a mocked collection API to verify the full recording flow.
