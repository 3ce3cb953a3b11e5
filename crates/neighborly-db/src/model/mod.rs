pub mod allowed_email;
pub mod audit;
pub mod club;
pub mod community;
pub mod event;
pub mod login;
pub mod residence;
pub mod user;
