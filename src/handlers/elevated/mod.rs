// Elevated handlers: admin accounts only, behind `require_admin`.

pub mod accounts;
pub mod officials;
pub mod pages;
pub mod reports;
pub mod tasks;
pub mod todos;
