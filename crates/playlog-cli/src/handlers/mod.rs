pub mod backup;
pub mod ingest;
pub mod init;
pub mod restore;
