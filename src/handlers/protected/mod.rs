// Protected handlers: any account holding its current session token.

pub mod officials;
pub mod pages;
pub mod reports;
pub mod session;
pub mod tasks;
pub mod todos;
