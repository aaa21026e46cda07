pub mod dates;
pub mod password;
