pub mod inspect;
pub mod list;
pub mod node;
pub mod status;
