// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod detail_fetcher_test;
pub mod enumerator_test;
pub mod page_loader_test;
