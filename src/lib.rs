// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod conditions;
pub mod engine;
pub mod error;
pub mod fields;
pub mod models;
pub mod rules;
pub mod settings;
pub mod store;
pub mod utils;
