//! Command responses - 메시지, 페이지 목록, 상세 정보

use crate::error::{CommandError, Result};
use serde::Serialize;
use std::fmt;

/// Items per page of a list response.
pub const PAGE_SIZE: usize = 6;

/// What a command sends back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandResponse {
    /// One line of text
    Message(String),

    /// One page of a longer list (1-based page numbers)
    List {
        page: usize,
        total_pages: usize,
        total_items: usize,
        items: Vec<String>,
    },

    /// Key/value details about one object
    Details {
        name: String,
        key: String,
        items: Vec<(String, String)>,
    },
}

impl CommandResponse {
    pub fn message(text: impl Into<String>) -> Self {
        CommandResponse::Message(text.into())
    }

    /// Formats page `page` (1-based) of `items`.
    ///
    /// An empty list has a single empty page; asking for any page past the
    /// last one is an invalid argument.
    pub fn paged<T, F>(items: &[T], page: usize, format: F) -> Result<Self>
    where
        F: Fn(&T) -> String,
    {
        let total_items = items.len();
        let total_pages = total_items.div_ceil(PAGE_SIZE).max(1);

        if page == 0 || page > total_pages {
            return Err(CommandError::invalid_argument(format!(
                "Page {page} does not exist (1-{total_pages})."
            )));
        }

        let items = items
            .iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .map(format)
            .collect();

        Ok(CommandResponse::List {
            page,
            total_pages,
            total_items,
            items,
        })
    }

    pub fn details(name: impl Into<String>, key: impl Into<String>) -> DetailsBuilder {
        DetailsBuilder {
            name: name.into(),
            key: key.into(),
            items: Vec::new(),
        }
    }

    /// Value of `label` in a details response.
    pub fn detail(&self, label: &str) -> Option<&str> {
        match self {
            CommandResponse::Details { items, .. } => items
                .iter()
                .find(|(key, _)| key == label)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResponse::Message(text) => f.write_str(text),
            CommandResponse::List {
                page,
                total_pages,
                total_items,
                items,
            } => {
                write!(f, "Page {page}/{total_pages} ({total_items} total)")?;
                for item in items {
                    write!(f, "\n  {item}")?;
                }
                Ok(())
            }
            CommandResponse::Details { name, key, items } => {
                write!(f, "{name} \"{key}\"")?;
                for (label, value) in items {
                    write!(f, "\n  {label}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Builder for [`CommandResponse::Details`]
#[derive(Debug)]
pub struct DetailsBuilder {
    name: String,
    key: String,
    items: Vec<(String, String)>,
}

impl DetailsBuilder {
    pub fn item(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.push((label.into(), value.into()));
        self
    }

    pub fn build(self) -> CommandResponse {
        CommandResponse::Details {
            name: self.name,
            key: self.key,
            items: self.items,
        }
    }
}
