// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation and resource helpers.

pub mod client;
pub mod resources;

pub use client::{connect, verify_connection};
