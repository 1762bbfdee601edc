pub mod clips;
pub mod demo;
pub mod health;
pub mod replay;
pub mod streams;
