pub mod cart;
pub mod order;
pub mod product;
pub mod tracking;
