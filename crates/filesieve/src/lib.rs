pub mod bulk;
pub mod catalog;
pub mod console;
pub mod error;
pub mod filter;
pub mod logging;
pub mod navigation;
pub mod presenter;
pub mod preview;
pub mod selection;
pub mod session;
pub mod settings;
pub mod ui;
