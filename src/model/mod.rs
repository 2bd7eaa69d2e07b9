pub mod attendance;
pub mod forgot_timeout;
pub mod profile;
pub mod role;
