//! Line-driven wizard session.
//!
//! Reads one command per line, applies it to a [`WizardController`] and
//! prints the resulting step, errors or review summary.

use std::io::Write;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::wizard::review::summarize;
use crate::wizard::{SaveStatus, StepStatus, WizardController, WizardError, WizardStep};

const HELP: &str = "\
Commands:
  set <field> <value>        set a field (dotted names reach into address.*)
  amenity <id>               toggle an amenity
  image add <url>...         append images
  image rm <i>               remove image i
  image primary <i>          mark image i as primary
  image move <from> <to>     reorder images
  next | prev | jump <n>     navigate steps
  show | review | errors     inspect the listing
  submit                     submit from the review step
  help | quit";

/// Errors from parsing a command line
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a valid number")]
    NotANumber(String),
}

/// One parsed interactive command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { field: String, value: Value },
    Amenity(String),
    ImageAdd(Vec<String>),
    ImageRemove(usize),
    ImagePrimary(usize),
    ImageMove { from: usize, to: usize },
    Next,
    Prev,
    Jump(u8),
    Show,
    Review,
    Errors,
    Submit,
    Help,
    Quit,
}

impl Command {
    /// Parse a line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb.to_lowercase().as_str() {
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Usage("set <field> <value>"))?;
                Command::Set {
                    field: field.to_string(),
                    value: parse_value(value.trim()),
                }
            }
            "amenity" if !rest.is_empty() => Command::Amenity(rest.to_string()),
            "amenity" => return Err(CommandError::Usage("amenity <id>")),
            "image" => parse_image(rest)?,
            "next" | "n" => Command::Next,
            "prev" | "back" | "p" => Command::Prev,
            "jump" => Command::Jump(parse_number(rest, "jump <n>")?),
            "show" => Command::Show,
            "review" => Command::Review,
            "errors" => Command::Errors,
            "submit" => Command::Submit,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_image(rest: &str) -> Result<Command, CommandError> {
    let mut args = rest.split_whitespace();
    match args.next() {
        Some("add") => {
            let urls: Vec<String> = args.map(str::to_string).collect();
            if urls.is_empty() {
                return Err(CommandError::Usage("image add <url>..."));
            }
            Ok(Command::ImageAdd(urls))
        }
        Some("rm") | Some("remove") => Ok(Command::ImageRemove(parse_number(
            args.next().unwrap_or(""),
            "image rm <i>",
        )?)),
        Some("primary") => Ok(Command::ImagePrimary(parse_number(
            args.next().unwrap_or(""),
            "image primary <i>",
        )?)),
        Some("move") => {
            let usage = "image move <from> <to>";
            let from = parse_number(args.next().unwrap_or(""), usage)?;
            let to = parse_number(args.next().unwrap_or(""), usage)?;
            Ok(Command::ImageMove { from, to })
        }
        _ => Err(CommandError::Usage(
            "image add <url>... | image rm <i> | image primary <i> | image move <from> <to>",
        )),
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, usage: &'static str) -> Result<T, CommandError> {
    if text.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    text.parse().map_err(|_| CommandError::NotANumber(text.to_string()))
}

/// JSON when the text looks like an array, object or quoted string; plain text otherwise
fn parse_value(text: &str) -> Value {
    if text.starts_with(['[', '{', '"']) {
        if let Ok(value) = serde_json::from_str(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

/// Interactive wizard session
pub struct App {
    controller: WizardController,
    should_quit: bool,
}

impl App {
    pub fn new(controller: WizardController) -> Self {
        Self {
            controller,
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &WizardController {
        &self.controller
    }

    /// Run until `quit`, end of input or a completed submission
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        self.render_step(out)?;
        while !self.should_quit {
            write!(out, "{}> ", self.controller.current_step().index())?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Ok(Some(command)) => self.handle(command, out).await?,
                Ok(None) => {}
                Err(e) => writeln!(out, "{e}")?,
            }
        }

        self.controller.close();
        Ok(())
    }

    async fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Set { field, value } => {
                self.controller.update_field(&field, value);
                writeln!(out, "{}", self.save_indicator())?;
            }
            Command::Amenity(amenity) => {
                self.controller.toggle_amenity(&amenity);
                writeln!(out, "{}", self.save_indicator())?;
            }
            Command::ImageAdd(urls) => {
                let count = urls.len();
                self.controller.add_images(urls);
                writeln!(out, "Added {count} image(s)")?;
            }
            Command::ImageRemove(index) => {
                self.report(self.controller.remove_image(index), out)?;
            }
            Command::ImagePrimary(index) => {
                self.report(self.controller.set_primary_image(index), out)?;
            }
            Command::ImageMove { from, to } => {
                self.report(self.controller.reorder_image(from, to), out)?;
            }
            Command::Next => match self.controller.go_next() {
                Ok(_) => self.render_step(out)?,
                Err(errors) => {
                    writeln!(out, "Please fix the following before continuing:")?;
                    for (field, error) in errors.iter() {
                        writeln!(out, "  {field}: {error}")?;
                    }
                }
            },
            Command::Prev => {
                self.controller.go_previous();
                self.render_step(out)?;
            }
            Command::Jump(index) => match self.controller.jump_to(index) {
                Ok(_) => self.render_step(out)?,
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Show => {
                let json = serde_json::to_string_pretty(&self.controller.payload())?;
                writeln!(out, "{json}")?;
            }
            Command::Review => self.render_review(out)?,
            Command::Errors => {
                let errors = self.controller.errors();
                if errors.is_empty() {
                    writeln!(out, "No errors")?;
                } else {
                    writeln!(out, "{errors}")?;
                }
            }
            Command::Submit => {
                writeln!(out, "Submitting...")?;
                out.flush()?;
                match self.controller.submit().await {
                    Ok(receipt) => {
                        let verb = if self.controller.mode().listing_id().is_some() {
                            "updated"
                        } else {
                            "created"
                        };
                        writeln!(out, "Listing {} {verb}", receipt.listing_id)?;
                        self.should_quit = true;
                    }
                    Err(e) => writeln!(out, "Submission failed: {e}")?,
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn report<W: Write>(&self, result: Result<(), WizardError>, out: &mut W) -> Result<()> {
        match result {
            Ok(()) => writeln!(out, "{}", self.save_indicator())?,
            Err(e) => writeln!(out, "{e}")?,
        }
        Ok(())
    }

    fn save_indicator(&self) -> String {
        match self.controller.save_status() {
            SaveStatus::Pending | SaveStatus::Saving => "Saving draft...".to_string(),
            SaveStatus::Idle => match self.controller.last_saved() {
                Some(at) => format!("Draft saved {}", at.format("%H:%M:%S")),
                None => "Updated".to_string(),
            },
        }
    }

    fn render_step<W: Write>(&self, out: &mut W) -> Result<()> {
        let current = self.controller.current_step();

        let progress: Vec<String> = WizardStep::all()
            .iter()
            .map(|step| {
                let mark = match self.controller.step_status(*step) {
                    StepStatus::Completed => "x",
                    StepStatus::Current => ">",
                    StepStatus::Upcoming => " ",
                };
                format!("[{mark}] {}", step.label())
            })
            .collect();
        writeln!(out, "{}", progress.join("  "))?;
        writeln!(
            out,
            "Step {} of {}: {}",
            current.index(),
            WizardStep::COUNT,
            current.label()
        )?;

        if current == WizardStep::Review {
            self.render_review(out)?;
            writeln!(out, "Type 'submit' to publish or 'jump <n>' to edit a section")?;
        } else if !current.required_fields().is_empty() {
            writeln!(out, "Required: {}", current.required_fields().join(", "))?;
        }
        Ok(())
    }

    fn render_review<W: Write>(&self, out: &mut W) -> Result<()> {
        for section in summarize(&self.controller.payload()) {
            writeln!(out, "{}. {}", section.step.index(), section.step.label())?;
            for (label, value) in section.rows {
                writeln!(out, "   {label}: {value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::session::{Role, Session};
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::wizard::{DraftPersistence, SimulatedSubmission, DRAFT_KEY};

    fn app(store: Arc<MemoryStore>) -> App {
        let controller = WizardController::create(
            Session::authenticated("token", Role::User),
            DraftPersistence::new(store, Duration::from_secs(2)),
            Arc::new(SimulatedSubmission::new(Duration::from_secs(2))),
        )
        .unwrap();
        App::new(controller)
    }

    #[test]
    fn test_parse_set_plain_text_and_json() {
        assert_eq!(
            Command::parse("set title Sunny loft").unwrap(),
            Some(Command::Set {
                field: "title".into(),
                value: json!("Sunny loft")
            })
        );
        assert_eq!(
            Command::parse("set price 2500").unwrap(),
            Some(Command::Set {
                field: "price".into(),
                value: json!("2500")
            })
        );
        assert_eq!(
            Command::parse(r#"set coordinates {"lat": 1.5, "lng": 2}"#).unwrap(),
            Some(Command::Set {
                field: "coordinates".into(),
                value: json!({"lat": 1.5, "lng": 2})
            })
        );
    }

    #[test]
    fn test_parse_image_commands() {
        assert_eq!(
            Command::parse("image add a.jpg b.jpg").unwrap(),
            Some(Command::ImageAdd(vec!["a.jpg".into(), "b.jpg".into()]))
        );
        assert_eq!(
            Command::parse("image move 2 0").unwrap(),
            Some(Command::ImageMove { from: 2, to: 0 })
        );
        assert_eq!(
            Command::parse("image rm x"),
            Err(CommandError::NotANumber("x".into()))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_incomplete() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("fly"),
            Err(CommandError::Unknown("fly".into()))
        );
        assert!(matches!(
            Command::parse("set title"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(Command::parse("jump"), Err(CommandError::Usage(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_advance_lists_missing_fields() {
        let mut app = app(Arc::new(MemoryStore::new()));
        let mut out = Vec::new();

        app.run(&b"next\nquit\n"[..], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Please fix the following"));
        assert!(text.contains("title: is required"));
        assert_eq!(app.controller().current_step(), WizardStep::BasicInfo);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_session_submits_listing() {
        let store = Arc::new(MemoryStore::new());
        let mut app = app(store.clone());
        let script = "\
set title Loft
set description Bright corner unit
set price 2500
set propertyType apartment
set status available
next
set bedrooms 2
set bathrooms 1
set squareFootage 900
amenity wifi
next
image add a.jpg b.jpg
image primary 1
next
set address.street 1 Main St
set address.city Springfield
set address.state IL
set address.zipCode 62701
set address.country United States
next
submit
";
        let mut out = Vec::new();
        app.run(script.as_bytes(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Step 5 of 5"));
        assert!(text.contains("Price: $2,500"));
        assert!(text.contains("created"));
        assert!(app.controller().is_complete());
        assert_eq!(store.get(DRAFT_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_review_shows_address_with_typed_coordinates() {
        let mut app = app(Arc::new(MemoryStore::new()));
        let script = "\
set address.street 1 Main St
set address.city Springfield
set address.state IL
set address.zipCode 62701
set address.country United States
set coordinates.lat 39.78
review
quit
";
        let mut out = Vec::new();
        app.run(script.as_bytes(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Address: 1 Main St, Springfield, IL 62701, United States"));
        assert!(text.contains("Coordinates: 39.780000, 0.000000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_flushes_draft() {
        let store = Arc::new(MemoryStore::new());
        let mut app = app(store.clone());
        let mut out = Vec::new();

        app.run(&b"set title Unfinished\nquit\n"[..], &mut out)
            .await
            .unwrap();

        let saved = store.get(DRAFT_KEY).unwrap().unwrap();
        assert!(saved.contains("Unfinished"));
    }
}
