//! Integration tests for the archiver
//!
//! These tests use wiremock to stand in for the gallery site and exercise
//! complete archive runs, resumption and chunk export against a scratch
//! directory.

mod archive_tests;
mod chunk_tests;
mod common;
mod fetcher_tests;
