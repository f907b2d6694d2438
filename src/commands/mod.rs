// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod analytics;
pub mod budget;
pub mod doctor;
pub mod fx;
pub mod savings;
pub mod subscriptions;
