//! Command implementations that do more than call the service.

pub mod init;
