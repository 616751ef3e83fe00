//! Single-user contact manager: a SQLite-backed contact store and the form
//! controller that drives it.

pub mod action_log;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod form;
pub mod logging;
pub mod model;
pub mod schema;
pub mod shell;
pub mod store;

pub use error::{AppError, AppResult};
pub use form::{ContactForm, DestinationPicker, DisplayRow, FormFields, Notice, NoticeLevel};
pub use model::{Contact, ContactInput};
pub use store::{AddOutcome, ContactStore, UpdateOutcome};
