//! Shell commands parsed from one input line.

use std::{path::PathBuf, str::FromStr};

use catalog_core::{InputKind, ProductField};
use shared::domain::ProductId;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    SignIn { username: String, password: String },
    Check,
    List { page: Option<u32> },
    Next,
    Prev,
    New,
    Edit { id: ProductId },
    Set { field: ProductField, value: String },
    Toggle { checked: bool },
    Image { index: usize, url: String },
    AddImage,
    RemoveImage,
    Upload { path: PathBuf },
    Draft,
    Submit,
    Cancel,
    Detail { id: ProductId },
    Close,
    Delete { id: ProductId },
    Logout,
    Quit,
}

pub const HELP: &str = "\
commands:
  signin <username> <password>   sign in and store the session
  check                          verify the stored session
  list [page]                    reload the current (or given) page
  next | prev                    page navigation
  new                            open the editor with an empty product
  edit <id>                      open the editor on a listed product
  set <field> <value...>         set a draft field
  toggle on|off                  set is_enabled
  image <index> <url>            replace a secondary image
  add-image | remove-image       grow or shrink the secondary image list
  upload <path>                  upload a JPEG/PNG as the main image
  draft                          show the draft
  submit                         create or update the draft
  cancel                         dismiss the editor window
  detail <id> | close            show or hide product details
  delete <id>                    delete a product
  logout | quit";

impl Command {
    /// Input kind the draft expects for a field typed at the prompt.
    pub fn input_kind(field: ProductField) -> InputKind {
        match field {
            ProductField::OriginPrice | ProductField::Price | ProductField::Trending => {
                InputKind::Number
            }
            _ => InputKind::Text,
        }
    }
}

fn required<'a>(parts: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<&'a str, String> {
    parts.next().ok_or_else(|| format!("missing {what}"))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));
        let mut parts = rest.split_whitespace();

        let command = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "signin" | "login" => Self::SignIn {
                username: required(&mut parts, "username")?.to_string(),
                password: required(&mut parts, "password")?.to_string(),
            },
            "check" => Self::Check,
            "list" | "ls" => Self::List {
                page: match parts.next() {
                    Some(raw) => Some(
                        raw.parse::<u32>()
                            .map_err(|_| format!("'{raw}' is not a page number"))?,
                    ),
                    None => None,
                },
            },
            "next" => Self::Next,
            "prev" => Self::Prev,
            "new" => Self::New,
            "edit" => Self::Edit {
                id: ProductId::from(required(&mut parts, "product id")?),
            },
            "set" => {
                let name = required(&mut parts, "field")?;
                let field = name.parse::<ProductField>().map_err(|err| err.to_string())?;
                let value = rest[name.len()..].trim().to_string();
                Self::Set { field, value }
            }
            "toggle" => Self::Toggle {
                checked: match required(&mut parts, "on|off")? {
                    "on" | "true" | "1" => true,
                    "off" | "false" | "0" => false,
                    other => return Err(format!("expected on or off, got '{other}'")),
                },
            },
            "image" => {
                let raw = required(&mut parts, "image index")?;
                let index = raw
                    .parse::<usize>()
                    .map_err(|_| format!("'{raw}' is not an image index"))?;
                Self::Image {
                    index,
                    url: parts.next().unwrap_or_default().to_string(),
                }
            }
            "add-image" => Self::AddImage,
            "remove-image" => Self::RemoveImage,
            "upload" => {
                if rest.is_empty() {
                    return Err("missing file path".to_string());
                }
                Self::Upload {
                    path: PathBuf::from(rest),
                }
            }
            "draft" => Self::Draft,
            "submit" | "save" => Self::Submit,
            "cancel" => Self::Cancel,
            "detail" | "show" => Self::Detail {
                id: ProductId::from(required(&mut parts, "product id")?),
            },
            "close" => Self::Close,
            "delete" | "rm" => Self::Delete {
                id: ProductId::from(required(&mut parts, "product id")?),
            },
            "logout" => Self::Logout,
            "quit" | "exit" => Self::Quit,
            "" => return Err("empty command".to_string()),
            other => return Err(format!("unknown command '{other}'; type help")),
        };
        Ok(command)
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
