pub mod chrome_page;
pub mod page_driver;
pub mod session;

pub use chrome_page::{ChromePage, ChromeSessionFactory};
pub use page_driver::{PageDriver, PdfOptions, SessionFactory};
pub use session::Session;
