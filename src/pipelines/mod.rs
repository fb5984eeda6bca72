pub mod historical;
pub mod live;
