// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media, captures, exports and stored records.

pub mod capture;
pub mod media;
pub mod serialization;
pub mod storage;
