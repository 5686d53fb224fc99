#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A key/value map with a fixed default value for absent keys.
///
/// This module provides a `ChainMap` that wraps the `ChainTable` and
/// provides a key-value interface with configurable hashers.
pub mod chain_map;

pub mod chain_table;

pub use chain_map::ChainMap;
pub use chain_table::ChainTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The default hasher builder used by [`ChainMap`].
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The default hasher builder used by [`ChainMap`].
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder hasher builder. With neither the `std` nor the
        /// `foldhash` feature enabled there is no default hasher; construct
        /// maps with [`ChainMap::with_hasher`] instead.
        pub enum DefaultHashBuilder {}
    }
}
