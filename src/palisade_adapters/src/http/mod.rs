pub mod cookie_jar;
pub mod header_bearer;
