//! Tick systems.
//!
//! Each module owns one stage of the tick pipeline. Stateful bookkeeping
//! (stuns, heal buffers) lives in a struct on the [`World`](crate::world::World);
//! everything else is a free function over the world.

pub mod abilities;
pub mod bullet;
pub mod control;
pub mod damage;
pub mod heal;
pub mod items;
pub mod laser;
pub mod mine;
pub mod spawn;
pub mod stun;
pub mod visibility;
