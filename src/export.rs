use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{db::write_atomic, model::Contact, store::ContactStore, AppError, AppResult};

pub const CSV_HEADER: [&str; 5] = ["ID", "Name", "Phone", "Email", "Address"];
const RECORD_TERMINATOR: &str = "\r\n";

fn csv_escape(value: Option<&str>) -> String {
    let raw = value.unwrap_or("");
    if raw.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Header plus one record per contact, in the order given.
pub fn render_csv(contacts: &[Contact]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str(RECORD_TERMINATOR);
    for contact in contacts {
        let line = format!(
            "{},{},{},{},{}",
            contact.id,
            csv_escape(Some(&contact.name)),
            csv_escape(Some(&contact.phone)),
            csv_escape(contact.email.as_deref()),
            csv_escape(contact.address.as_deref()),
        );
        out.push_str(&line);
        out.push_str(RECORD_TERMINATOR);
    }
    out
}

/// Pretty JSON array of the contacts, as printed by `--json`.
pub fn render_json(contacts: &[Contact]) -> AppResult<String> {
    let body = serde_json::to_string_pretty(contacts)?;
    Ok(body)
}

pub fn write_csv(path: &Path, contacts: &[Contact]) -> AppResult<()> {
    let body = render_csv(contacts);
    write_atomic(path, body.as_bytes()).map_err(|err| {
        AppError::from(err)
            .with_context("operation", "export_csv_write")
            .with_context("path", path.display().to_string())
    })?;
    tracing::info!(
        target: "phonebook",
        event = "contacts_exported",
        path = %path.display(),
        row_count = contacts.len()
    );
    Ok(())
}

/// Write every stored contact to `path`. Returns the number of records.
pub async fn export_contacts(store: &ContactStore, path: &Path) -> AppResult<usize> {
    let contacts = store.list_all().await?;
    write_csv(path, &contacts)?;
    Ok(contacts.len())
}

pub fn default_export_file_name(now: DateTime<Utc>) -> String {
    format!("contacts-{}.csv", now.format("%Y%m%dT%H%M%SZ"))
}

/// Append `.csv` when the chosen destination has no extension.
pub fn with_csv_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn csv_escape_quotes_fields() {
        assert_eq!(csv_escape(Some("plain")), "plain");
        assert_eq!(csv_escape(None), "");
        assert_eq!(csv_escape(Some("with,comma")), "\"with,comma\"");
        assert_eq!(csv_escape(Some("with\"quote")), "\"with\"\"quote\"");
        assert_eq!(csv_escape(Some("two\nlines")), "\"two\nlines\"");
    }

    #[test]
    fn render_csv_writes_header_then_rows() {
        let contacts = vec![
            Contact {
                id: 1,
                name: "Alice".into(),
                phone: "555-0001".into(),
                email: Some("a@x.com".into()),
                address: Some("1 Main St, Springfield".into()),
            },
            Contact {
                id: 3,
                name: "Bob".into(),
                phone: "555-0002".into(),
                email: None,
                address: None,
            },
        ];
        assert_eq!(
            render_csv(&contacts),
            "ID,Name,Phone,Email,Address\r\n\
             1,Alice,555-0001,a@x.com,\"1 Main St, Springfield\"\r\n\
             3,Bob,555-0002,,\r\n"
        );
    }

    #[test]
    fn render_csv_for_no_contacts_is_header_only() {
        assert_eq!(render_csv(&[]), "ID,Name,Phone,Email,Address\r\n");
    }

    #[test]
    fn render_json_keeps_missing_fields_as_null() {
        let contacts = vec![Contact {
            id: 7,
            name: "Dana".into(),
            phone: "555-0007".into(),
            email: None,
            address: Some("9 Elm Rd".into()),
        }];
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&contacts).unwrap()).unwrap();
        assert_eq!(value[0]["id"], 7);
        assert_eq!(value[0]["email"], serde_json::Value::Null);
        assert_eq!(value[0]["address"], "9 Elm Rd");
        assert_eq!(render_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn default_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 5, 0).unwrap();
        assert_eq!(default_export_file_name(now), "contacts-20261016T090500Z.csv");
    }

    #[test]
    fn extension_is_added_only_when_missing() {
        assert_eq!(
            with_csv_extension(PathBuf::from("out/contacts")),
            PathBuf::from("out/contacts.csv")
        );
        assert_eq!(
            with_csv_extension(PathBuf::from("out/contacts.txt")),
            PathBuf::from("out/contacts.txt")
        );
    }
}
