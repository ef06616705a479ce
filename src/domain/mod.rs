pub mod album;
pub mod ids;
pub mod rating;
pub mod track;
pub mod user;
