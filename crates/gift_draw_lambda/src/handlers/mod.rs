pub mod api;
pub mod draws;
pub mod entries;
