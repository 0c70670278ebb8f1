//! Construction options.
//!
//! Each configurable component takes a plain config struct as its single
//! construction entry point:
//!
//! | Config | Component | Description |
//! |--------|-----------|-------------|
//! | [`GroupConfig`] | [`Group`](crate::Group) | Name, byte budget, RNG seed |
//! | [`RingConfig`] | [`HashRing`](crate::HashRing) | Replica count, position hash |

pub mod group;
pub mod ring;

pub use group::GroupConfig;
pub use ring::RingConfig;
