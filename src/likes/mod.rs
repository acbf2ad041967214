//! Like, rating and wishlist operations over the graph store

pub mod manager;

pub use manager::LikesManager;
