pub mod lattice;
pub mod tables;

pub use lattice::{index3, SharedLatticeData};
pub use tables::{load_bond_table, load_neighbor_table};
