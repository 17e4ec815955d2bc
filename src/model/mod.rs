pub mod clock_record;
pub mod employee;
pub mod location;
pub mod request;
pub mod role;
