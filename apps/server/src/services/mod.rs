// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for drawing generation and caching.

pub mod cache;
pub mod generator;

pub use cache::DiskCache;
pub use generator::{generate_drawing, render_svg};
