pub mod add;
pub mod change_password;
pub mod info;
pub mod init;
pub mod list;
pub mod show;
pub mod trash;
