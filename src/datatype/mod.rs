/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

mod domain;
mod interval;
mod interval_environment;

pub use domain::*;
pub use interval::*;
pub use interval_environment::*;
