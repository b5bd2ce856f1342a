// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod api;
pub mod config;
mod errors;
pub mod id_list;
pub mod probe;
pub mod render;
pub mod report;
pub mod views;
pub mod xfer;

// Re-export the public API
pub use errors::{Error, Result};
pub use id_list::IDList;
pub use render::{Renderer, RenderableNode, RenderableNodes};
pub use report::{NodeMetadata, Report, Topology, TopologyKind};
pub use views::{TopologyRegistry, TopologyView};
