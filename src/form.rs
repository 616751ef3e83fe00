use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::json;

use crate::{
    action_log::ActionScope,
    error::{
        CONTACTS_DUPLICATE_PHONE, CONTACTS_NOT_FOUND, EXPORT_NO_DATA, VALIDATION_EMPTY_SEARCH_TERM,
        VALIDATION_MISSING_FIELD, VALIDATION_NO_SELECTION,
    },
    export,
    model::{Contact, ContactInput},
    store::ContactStore,
    AppError, AppResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A blocking message for the user, the terminal equivalent of a message box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, title, message)
    }

    fn with_level(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        match err.code() {
            VALIDATION_NO_SELECTION => Notice::warning("Selection Error", err.message()),
            VALIDATION_EMPTY_SEARCH_TERM => Notice::warning("Input Error", err.message()),
            EXPORT_NO_DATA => Notice::warning("No Data", err.message()),
            VALIDATION_MISSING_FIELD | CONTACTS_DUPLICATE_PHONE | CONTACTS_NOT_FOUND => {
                Notice::error("Error", err.message())
            }
            _ => {
                let detail = err
                    .cause()
                    .map(|cause| format!("{}: {}", err.message(), cause.message()))
                    .unwrap_or_else(|| err.message().to_string());
                Notice::error("Error", detail)
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.title, self.message)
    }
}

/// The four contact inputs as typed, untrimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl FormFields {
    fn to_input(&self) -> ContactInput {
        ContactInput::normalized(&self.name, &self.phone, &self.email, &self.address)
    }
}

/// One entry of the result list. The contact id travels with the row, so
/// selection never depends on the rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub contact_id: i64,
    pub text: String,
}

impl From<&Contact> for DisplayRow {
    fn from(contact: &Contact) -> Self {
        Self {
            contact_id: contact.id,
            text: contact.display_line(),
        }
    }
}

/// Asks the user where the CSV should go. `None` means the user cancelled.
pub trait DestinationPicker {
    fn pick_destination(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

/// Mediates between raw form input and the store. Owns the store handle for
/// its whole life; call [`ContactForm::close`] to release it.
pub struct ContactForm {
    store: ContactStore,
    fields: FormFields,
    search_term: String,
    rows: Vec<DisplayRow>,
    selected: Option<usize>,
}

impl ContactForm {
    pub fn new(store: ContactStore) -> Self {
        Self {
            store,
            fields: FormFields::default(),
            search_term: String::new(),
            rows: Vec::new(),
            selected: None,
        }
    }

    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    pub async fn close(self) {
        self.store.close().await;
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FormFields {
        &mut self.fields
    }

    pub fn clear_fields(&mut self) {
        self.fields = FormFields::default();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select the row at `index` (zero based) of the current list.
    pub fn select(&mut self, index: usize) -> Option<Notice> {
        if index < self.rows.len() {
            self.selected = Some(index);
            None
        } else {
            Some(Notice::warning(
                "Selection Error",
                format!("There is no row {} in the list.", index + 1),
            ))
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn show(&mut self, contacts: &[Contact]) {
        self.rows = contacts.iter().map(DisplayRow::from).collect();
        self.selected = None;
    }

    async fn reload_all(&mut self) -> AppResult<usize> {
        let contacts = self.store.list_all().await?;
        self.show(&contacts);
        Ok(contacts.len())
    }

    fn validated_input(&self) -> AppResult<ContactInput> {
        let input = self.fields.to_input();
        let missing: Vec<&str> = [("name", &input.name), ("phone", &input.phone)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if missing.is_empty() {
            Ok(input)
        } else {
            Err(AppError::new(
                VALIDATION_MISSING_FIELD,
                "Name and Phone fields are mandatory.",
            )
            .with_context("missing", missing.join(",")))
        }
    }

    fn selected_contact_id(&self, verb: &str) -> AppResult<i64> {
        self.selected
            .and_then(|index| self.rows.get(index))
            .map(|row| row.contact_id)
            .ok_or_else(|| {
                AppError::new(
                    VALIDATION_NO_SELECTION,
                    format!("Please select a contact to {verb}."),
                )
            })
    }

    async fn try_add(&self) -> AppResult<Contact> {
        let input = self.validated_input()?;
        self.store.add(&input).await?.into_result()
    }

    async fn try_search(&self) -> AppResult<Vec<Contact>> {
        let term = self.search_term.trim();
        if term.is_empty() {
            return Err(AppError::new(
                VALIDATION_EMPTY_SEARCH_TERM,
                "Please enter a search term.",
            ));
        }
        self.store.search(term).await
    }

    async fn try_update(&self, id: i64) -> AppResult<Contact> {
        let input = self.validated_input()?;
        self.store.update(id, &input).await?.into_result(id)
    }

    async fn try_delete(&mut self, id: i64) -> AppResult<bool> {
        let removed = self.store.delete(id).await?;
        self.reload_all().await?;
        Ok(removed)
    }

    /// Insert the typed contact. The list is not refreshed.
    pub async fn add(&mut self) -> Notice {
        let scope = ActionScope::new("contact_add");
        match self.try_add().await {
            Ok(contact) => {
                scope.with_contact(contact.id).success(json!({ "row_count": 1 }));
                self.clear_fields();
                Notice::info("Success", "Contact added successfully.")
            }
            Err(err) => {
                scope.fail(&err);
                Notice::from_error(&err)
            }
        }
    }

    pub async fn view_all(&mut self) -> Option<Notice> {
        let scope = ActionScope::new("contact_view_all");
        match self.reload_all().await {
            Ok(count) => {
                scope.success(json!({ "row_count": count }));
                None
            }
            Err(err) => {
                scope.fail(&err);
                Some(Notice::from_error(&err))
            }
        }
    }

    pub async fn search(&mut self) -> Option<Notice> {
        let scope = ActionScope::new("contact_search");
        match self.try_search().await {
            Ok(contacts) => {
                scope.success(json!({ "row_count": contacts.len() }));
                self.show(&contacts);
                contacts
                    .is_empty()
                    .then(|| Notice::info("No Results", "No contacts found."))
            }
            Err(err) => {
                scope.fail(&err);
                Some(Notice::from_error(&err))
            }
        }
    }

    /// Replace the selected contact with the typed fields, then show the
    /// full list again. A duplicate phone leaves both the row and the typed
    /// fields untouched.
    pub async fn update(&mut self) -> Notice {
        let mut scope = ActionScope::new("contact_update");
        let id = match self.selected_contact_id("update") {
            Ok(id) => id,
            Err(err) => {
                scope.fail(&err);
                return Notice::from_error(&err);
            }
        };
        scope = scope.with_contact(id);

        match self.try_update(id).await {
            Ok(_) => {
                self.clear_fields();
                if let Err(err) = self.reload_all().await {
                    scope.fail(&err);
                    return Notice::from_error(&err);
                }
                scope.success(json!({ "row_count": 1 }));
                Notice::info("Success", "Contact updated successfully.")
            }
            Err(err) => {
                scope.fail(&err);
                if err.code() == CONTACTS_NOT_FOUND {
                    // Drop the stale row from the list.
                    if let Err(reload_err) = self.reload_all().await {
                        scope.fail(&reload_err);
                    }
                }
                Notice::from_error(&err)
            }
        }
    }

    /// Delete the selected contact. Deleting a contact that is already gone
    /// still succeeds.
    pub async fn delete(&mut self) -> Notice {
        let mut scope = ActionScope::new("contact_delete");
        let id = match self.selected_contact_id("delete") {
            Ok(id) => id,
            Err(err) => {
                scope.fail(&err);
                return Notice::from_error(&err);
            }
        };
        scope = scope.with_contact(id);

        match self.try_delete(id).await {
            Ok(removed) => {
                scope.success(json!({ "removed": removed }));
                Notice::info("Success", "Contact deleted successfully.")
            }
            Err(err) => {
                scope.fail(&err);
                Notice::from_error(&err)
            }
        }
    }

    /// Export all contacts. With nothing stored the picker is never asked.
    pub async fn export_csv(&mut self, picker: &mut dyn DestinationPicker) -> Option<Notice> {
        let scope = ActionScope::new("contact_export_csv");
        let contacts = match self.store.list_all().await {
            Ok(contacts) if contacts.is_empty() => {
                let err = AppError::new(EXPORT_NO_DATA, "There are no contacts to export.");
                scope.fail(&err);
                return Some(Notice::from_error(&err));
            }
            Ok(contacts) => contacts,
            Err(err) => {
                scope.fail(&err);
                return Some(Notice::from_error(&err));
            }
        };

        let suggested = export::default_export_file_name(Utc::now());
        let Some(chosen) = picker.pick_destination(&suggested) else {
            scope.success(json!({ "cancelled": true }));
            return None;
        };
        let path = export::with_csv_extension(chosen);

        match export::write_csv(&path, &contacts) {
            Ok(()) => {
                scope.success(json!({ "row_count": contacts.len() }));
                Some(Notice::info(
                    "Success",
                    "Contacts exported to CSV successfully.",
                ))
            }
            Err(err) => {
                let err = AppError::new("EXPORT/WRITE_FAILED", "Could not write the CSV file")
                    .with_context("path", path.display().to_string())
                    .with_cause(err);
                scope.fail(&err);
                Some(Notice::from_error(&err))
            }
        }
    }
}
