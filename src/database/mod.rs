pub mod accounts;
pub mod manager;
pub mod models;
pub mod officials;
pub mod pages;
pub mod reports;
pub mod repository;
pub mod tasks;
pub mod todos;

pub use accounts::AccountRepository;
pub use manager::{Database, DatabaseError};
pub use officials::OfficialRepository;
pub use pages::PageRepository;
pub use reports::ReportRepository;
pub use repository::{Filter, Listing, PageRequest, Pagination, Scope};
pub use tasks::TaskRepository;
pub use todos::TodoRepository;
