pub mod arena;
pub mod error;
pub mod treap;
