pub mod author;
pub mod db;
pub mod list;
