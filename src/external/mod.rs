// ABOUTME: External API client modules (reference nutrition database)
// ABOUTME: Provides reference lookups with query relaxation and caching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External API Clients

pub mod food_reference_client;

// Re-export commonly used types
pub use food_reference_client::{
    build_query_ladder, FoodReferenceClient, ReferenceLookup, ReferenceLookupConfig,
};
