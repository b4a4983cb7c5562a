pub mod authenticatable;
pub mod credentials;
pub mod token;
