// ABOUTME: Re-exports command modules for nutrilens-cli
// ABOUTME: Provides access to interpret, lookup, and recognize commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod interpret;
pub mod lookup;
pub mod recognize;
