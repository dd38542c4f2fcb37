//! Integration tests for meshcheck
//!
//! These tests drive the real HTTP clients and the check pipeline against an
//! in-process fake Kubernetes API server that also serves the control-plane
//! API (directly and through the service proxy path) and the latest-release
//! endpoint.
//!
//! Run with: cargo test --test integration

mod helpers;

mod clients;
