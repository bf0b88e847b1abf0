pub mod dns;
pub mod health;
