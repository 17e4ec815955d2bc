pub mod attendance;
pub mod location;
pub mod period;
pub mod request;
