// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod cache;
pub mod config;
pub mod constants;
pub mod demos;
pub mod error;
pub mod kubernetes;

#[cfg(test)]
mod test_utils;
