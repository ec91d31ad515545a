pub mod health;
pub mod payment;
pub mod subscription;
pub mod transaction;
