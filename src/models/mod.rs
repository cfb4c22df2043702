//! Data models

pub mod account;
pub mod book;

pub use account::{Account, NewAccount, Role};
pub use book::{Book, BookRecord};
