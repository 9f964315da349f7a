pub mod eip1193;
pub mod webhid;

pub use self::{eip1193::Eip1193Provider, webhid::Hid};
