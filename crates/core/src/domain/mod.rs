pub mod cart;
pub mod conversation;
pub mod menu;
