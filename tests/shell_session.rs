use std::io::Cursor;

use anyhow::Result;
use phonebook_lib::{shell::Shell, ContactForm};
use tempfile::tempdir;

#[path = "util.rs"]
mod util;

use util::memory_store;

async fn run_session(script: &str) -> Result<(String, ContactForm)> {
    let form = ContactForm::new(memory_store().await);
    let mut output = Vec::new();
    let form = Shell::new(form, Cursor::new(script.as_bytes().to_vec()), &mut output)
        .run()
        .await?;
    Ok((String::from_utf8(output)?, form))
}

#[tokio::test]
async fn add_then_view_lists_the_contact() -> Result<()> {
    let (out, form) = run_session(
        "name Alice\nphone 555-0001\nemail a@x.com\naddress 1 Main St\nadd\nview\nquit\n",
    )
    .await?;

    assert!(out.contains("[Success] Contact added successfully."));
    assert!(out.contains("  1) ID: 1, Name: Alice, Phone: 555-0001, Email: a@x.com, Address: 1 Main St"));
    assert_eq!(form.store().count().await?, 1);
    form.close().await;
    Ok(())
}

#[tokio::test]
async fn duplicate_phone_is_reported() -> Result<()> {
    let (out, form) = run_session(
        "name Alice\nphone 555-0001\nadd\nname Bob\nphone 555-0001\nadd\nfields\n",
    )
    .await?;

    assert!(out.contains("[Error] Phone number already exists."));
    assert!(out.contains("Name:    Bob"));
    assert_eq!(form.store().count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn select_update_and_delete_by_row_number() -> Result<()> {
    let (out, form) = run_session(
        "name Alice\nphone 555-0001\nadd\n\
         name Bob\nphone 555-0002\nadd\n\
         view\nselect 2\nname Robert\nphone 555-0002\nupdate\n\
         select 1\ndelete\nquit\n",
    )
    .await?;

    assert!(out.contains("*  2) ID: 2, Name: Bob"));
    assert!(out.contains("[Success] Contact updated successfully."));
    assert!(out.contains("[Success] Contact deleted successfully."));

    let remaining = form.store().list_all().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Robert");
    Ok(())
}

#[tokio::test]
async fn search_and_validation_messages() -> Result<()> {
    let (out, _form) =
        run_session("search\nterm nobody\nsearch\nupdate\nselect x\nadd\nbogus\n").await?;

    assert!(out.contains("[Input Error] Please enter a search term."));
    assert!(out.contains("[No Results] No contacts found."));
    assert!(out.contains("[Selection Error] Please select a contact to update."));
    assert!(out.contains("[Selection Error] Give the row number to select"));
    assert!(out.contains("[Error] Name and Phone fields are mandatory."));
    assert!(out.contains("Unknown command 'bogus'"));
    Ok(())
}

#[tokio::test]
async fn export_prompts_for_destination() -> Result<()> {
    let dir = tempdir()?;
    let target = dir.path().join("out.csv");
    let script = format!(
        "export\nname Alice\nphone 555-0001\nadd\nexport\n{}\nexport\ncancel\n",
        target.display()
    );
    let (out, _form) = run_session(&script).await?;

    assert!(out.contains("[No Data] There are no contacts to export."));
    assert!(out.contains("Save CSV as [contacts-"));
    assert!(out.contains("[Success] Contacts exported to CSV successfully."));
    let contents = std::fs::read_to_string(&target)?;
    assert_eq!(contents, "ID,Name,Phone,Email,Address\r\n1,Alice,555-0001,,\r\n");
    Ok(())
}

#[tokio::test]
async fn export_accepts_inline_path() -> Result<()> {
    let dir = tempdir()?;
    let target = dir.path().join("inline");
    let script = format!("name Alice\nphone 555-0001\nadd\nexport {}\n", target.display());
    let (out, _form) = run_session(&script).await?;

    assert!(!out.contains("Save CSV as"));
    assert!(dir.path().join("inline.csv").exists());
    Ok(())
}
