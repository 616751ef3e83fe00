use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::{
    form::{ContactForm, DestinationPicker, Notice},
    AppResult,
};

pub const PROMPT: &str = "phonebook> ";

const HELP: &str = "\
Inputs:
  name <text>       set the Name field
  phone <text>      set the Phone field
  email <text>      set the Email field
  address <text>    set the Address field
  term <text>       set the search term (matches name or phone)
  fields            show the current inputs
  clear             clear the four contact inputs
Actions:
  add               add a contact from the inputs
  view              list all contacts
  search            list contacts matching the search term
  select <row>      select a row of the list (numbered from 1)
  update            replace the selected contact with the inputs
  delete            delete the selected contact
  export [path]     write all contacts to a CSV file
  help              show this text
  quit              leave
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Phone,
    Email,
    Address,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Set(Field, &'a str),
    Term(&'a str),
    Fields,
    Clear,
    Add,
    View,
    Search,
    Select(&'a str),
    Update,
    Delete,
    Export(Option<&'a str>),
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let (verb, rest) = match line.trim_start().split_once(' ') {
        Some((verb, rest)) => (verb, rest),
        None => (line.trim(), ""),
    };
    match verb.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "name" => Command::Set(Field::Name, rest),
        "phone" => Command::Set(Field::Phone, rest),
        "email" => Command::Set(Field::Email, rest),
        "address" => Command::Set(Field::Address, rest),
        "term" => Command::Term(rest),
        "fields" => Command::Fields,
        "clear" => Command::Clear,
        "add" => Command::Add,
        "view" | "list" => Command::View,
        "search" => Command::Search,
        "select" => Command::Select(rest.trim()),
        "update" => Command::Update,
        "delete" => Command::Delete,
        "export" => {
            let path = rest.trim();
            Command::Export((!path.is_empty()).then_some(path))
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(verb),
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Save-dialog stand-in: uses the path given on the command line, or asks
/// for one on the shell's own input.
struct PromptPicker<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
    inline: Option<PathBuf>,
}

impl<R: BufRead, W: Write> DestinationPicker for PromptPicker<'_, R, W> {
    fn pick_destination(&mut self, suggested_name: &str) -> Option<PathBuf> {
        if let Some(path) = self.inline.take() {
            return Some(path);
        }
        write!(
            self.output,
            "Save CSV as [{suggested_name}] (type 'cancel' to abort): "
        )
        .ok()?;
        self.output.flush().ok()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer).ok()? == 0 {
            return None;
        }
        match answer.trim() {
            "cancel" => None,
            "" => Some(PathBuf::from(suggested_name)),
            path => Some(PathBuf::from(path)),
        }
    }
}

/// Line-oriented front end for [`ContactForm`]. Each line is one user
/// action and runs to completion before the next line is read.
pub struct Shell<R, W> {
    form: ContactForm,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(form: ContactForm, input: R, output: W) -> Self {
        Self {
            form,
            input,
            output,
        }
    }

    /// Process input until `quit` or end of input. Hands the form back so
    /// the caller can close the store.
    pub async fn run(mut self) -> AppResult<ContactForm> {
        writeln!(self.output, "Phone book. Type 'help' for commands.")?;
        let mut line = String::new();
        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            let command = line.trim_end_matches(['\r', '\n']);
            if let Flow::Quit = self.dispatch(command).await? {
                break;
            }
        }
        self.output.flush()?;
        Ok(self.form)
    }

    async fn dispatch(&mut self, line: &str) -> AppResult<Flow> {
        match parse_command(line) {
            Command::Empty => {}
            Command::Set(field, value) => {
                let fields = self.form.fields_mut();
                let slot = match field {
                    Field::Name => &mut fields.name,
                    Field::Phone => &mut fields.phone,
                    Field::Email => &mut fields.email,
                    Field::Address => &mut fields.address,
                };
                *slot = value.to_string();
            }
            Command::Term(value) => self.form.set_search_term(value),
            Command::Fields => self.print_fields()?,
            Command::Clear => self.form.clear_fields(),
            Command::Add => {
                let notice = self.form.add().await;
                self.print_notice(&notice)?;
            }
            Command::View => {
                let notice = self.form.view_all().await;
                self.print_outcome(notice.as_ref())?;
            }
            Command::Search => {
                let notice = self.form.search().await;
                self.print_outcome(notice.as_ref())?;
            }
            Command::Select(raw) => {
                let notice = match raw.parse::<usize>() {
                    Ok(row) if row >= 1 => self.form.select(row - 1),
                    _ => Some(Notice::warning(
                        "Selection Error",
                        "Give the row number to select, e.g. 'select 1'.",
                    )),
                };
                self.print_outcome(notice.as_ref())?;
            }
            Command::Update => {
                let notice = self.form.update().await;
                self.print_outcome(Some(&notice))?;
            }
            Command::Delete => {
                let notice = self.form.delete().await;
                self.print_outcome(Some(&notice))?;
            }
            Command::Export(path) => {
                let mut picker = PromptPicker {
                    input: &mut self.input,
                    output: &mut self.output,
                    inline: path.map(PathBuf::from),
                };
                let notice = self.form.export_csv(&mut picker).await;
                if let Some(notice) = notice {
                    self.print_notice(&notice)?;
                }
            }
            Command::Help => write!(self.output, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(verb) => {
                writeln!(self.output, "Unknown command '{verb}'. Type 'help'.")?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Show the notice if any, then the list as it now stands.
    fn print_outcome(&mut self, notice: Option<&Notice>) -> AppResult<()> {
        if let Some(notice) = notice {
            self.print_notice(notice)?;
        }
        self.print_rows()
    }

    fn print_notice(&mut self, notice: &Notice) -> AppResult<()> {
        writeln!(self.output, "{notice}")?;
        Ok(())
    }

    fn print_rows(&mut self) -> AppResult<()> {
        let selected = self.form.selected();
        for (index, row) in self.form.rows().iter().enumerate() {
            let marker = if selected == Some(index) { '*' } else { ' ' };
            writeln!(self.output, "{marker}{:>3}) {}", index + 1, row.text)?;
        }
        Ok(())
    }

    fn print_fields(&mut self) -> AppResult<()> {
        let fields = self.form.fields();
        writeln!(self.output, "Name:    {}", fields.name)?;
        writeln!(self.output, "Phone:   {}", fields.phone)?;
        writeln!(self.output, "Email:   {}", fields.email)?;
        writeln!(self.output, "Address: {}", fields.address)?;
        writeln!(self.output, "Search:  {}", self.form.search_term())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_values_verbatim() {
        assert_eq!(
            parse_command("address 1 Main St, Apt 2"),
            Command::Set(Field::Address, "1 Main St, Apt 2")
        );
        assert_eq!(parse_command("name"), Command::Set(Field::Name, ""));
        assert_eq!(parse_command("term 555"), Command::Term("555"));
    }

    #[test]
    fn parses_actions() {
        assert_eq!(parse_command("ADD"), Command::Add);
        assert_eq!(parse_command("  view"), Command::View);
        assert_eq!(parse_command("select 2"), Command::Select("2"));
        assert_eq!(parse_command("export"), Command::Export(None));
        assert_eq!(
            parse_command("export out/contacts.csv"),
            Command::Export(Some("out/contacts.csv"))
        );
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("frobnicate"), Command::Unknown("frobnicate"));
    }
}
