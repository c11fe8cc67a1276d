#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

mod error;
mod exec;
mod launch;
mod lookup;
mod parser;

pub use error::{DesktopEntryError, ErrorKind, Result};
pub use exec::{ExecToken, FieldCode, to_path, to_uri, tokenize};
pub use launch::{DEFAULT_TERMINAL, LaunchConfig};
pub use lookup::{application_dirs, find_desktop_file, find_desktop_file_in};

use parser::Parser;

/// Name of the group holding launch behaviour.
pub const DESKTOP_ENTRY_GROUP: &str = "Desktop Entry";

// ============================================================================
// Warnings
// ============================================================================

/// Advisory problems found in an entry. These never stop parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A recommended key is absent from the `Desktop Entry` group
    MissingKey(&'static str),
    /// `Encoding` names something other than UTF-8; the text is still read as UTF-8
    UnsupportedEncoding(String),
    /// The Exec template uses a field code with no defined expansion
    UnknownFieldCode(char),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(key) => write!(f, "Required key missing: {}", key),
            Self::UnsupportedEncoding(encoding) => {
                write!(f, "Unsupported encoding {}, reading as UTF-8", encoding)
            }
            Self::UnknownFieldCode(code) => write!(f, "Unknown field code %{}", code),
        }
    }
}

// ============================================================================
// Desktop Entry Types
// ============================================================================

/// The type of desktop entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopEntryType {
    /// An application that can be launched
    Application,
    /// A link to a URL
    Link,
    /// A directory/folder
    Directory,
}

impl DesktopEntryType {
    /// Parses a `Type` value. Unknown types give `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Application" => Some(Self::Application),
            "Link" => Some(Self::Link),
            "Directory" => Some(Self::Directory),
            _ => None,
        }
    }

    /// Converts the type to its string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Application => "Application",
            Self::Link => "Link",
            Self::Directory => "Directory",
        }
    }
}

// ============================================================================
// Group
// ============================================================================

/// One `[Group Name]` section of a desktop file.
///
/// Localized variants are stored under their literal key, so `Name` and
/// `Name[fr]` are two separate entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    /// Name of the group (without the brackets)
    pub name: String,
    /// Raw values keyed by the literal key text
    pub entries: HashMap<String, String>,
}

impl Group {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value stored under `key[locale]`, or under `key` when
    /// `locale` is absent or empty. There is no fallback between locales.
    pub fn get_localized(&self, key: &str, locale: Option<&str>) -> Option<&str> {
        self.get(&localized_key(key, locale))
    }
}

fn localized_key(key: &str, locale: Option<&str>) -> String {
    match locale {
        Some(locale) if !locale.is_empty() => format!("{}[{}]", key, locale),
        _ => key.to_string(),
    }
}

// ============================================================================
// Desktop Entry
// ============================================================================

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Text(String),
}

#[derive(Debug, Clone)]
enum State {
    Unparsed(Source),
    Parsed(Vec<Group>),
}

/// A desktop entry file.
///
/// The entry is created from a file path or from raw text and parsed the
/// first time any data is requested. Accessors therefore take `&mut self`
/// and return a [`Result`]: a malformed file surfaces its parse error from
/// whichever call first needed the data.
///
/// # Examples
///
/// ```
/// use desktop_launch::DesktopEntry;
///
/// let mut entry = DesktopEntry::from_text("[Desktop Entry]\nType=Application\nName=Foo\nName[fr]=Fou\n");
/// assert!(!entry.is_parsed());
///
/// assert_eq!(entry.get_value("Name", None, Some("fr")).unwrap(), Some("Fou"));
/// assert_eq!(entry.get_value("Name", None, Some("fr_CA")).unwrap(), None);
/// assert!(entry.is_parsed());
/// ```
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    path: Option<PathBuf>,
    state: State,
    warnings: Vec<Warning>,
}

impl DesktopEntry {
    /// Creates an entry backed by a file. Nothing is read until data is needed.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            path: Some(path.clone()),
            state: State::Unparsed(Source::File(path)),
            warnings: Vec::new(),
        }
    }

    /// Creates an entry backed by in-memory text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: None,
            state: State::Unparsed(Source::Text(text.into())),
            warnings: Vec::new(),
        }
    }

    /// Parses a desktop entry from a string right away.
    ///
    /// # Examples
    ///
    /// ```
    /// use desktop_launch::DesktopEntry;
    ///
    /// let content = r#"[Desktop Entry]
    /// Type=Application
    /// Name=Test App
    /// Exec=test-app
    /// "#;
    ///
    /// let mut entry = DesktopEntry::parse(content).unwrap();
    /// assert_eq!(entry.name(None).unwrap(), Some("Test App"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let mut entry = Self::from_text(content);
        entry.ensure_parsed()?;
        Ok(entry)
    }

    /// Reads and parses a desktop entry file right away.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use desktop_launch::DesktopEntry;
    ///
    /// let entry = DesktopEntry::parse_file("app.desktop").unwrap();
    /// ```
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut entry = Self::from_file(path.as_ref());
        entry.ensure_parsed()?;
        Ok(entry)
    }

    /// Parses the backing file or text if that has not happened yet.
    ///
    /// Called by every accessor. Once parsing succeeds the raw text is gone
    /// and the entry only holds its groups. On failure a text-backed entry
    /// keeps its text, so the same error is reported again on the next call.
    pub fn ensure_parsed(&mut self) -> Result<()> {
        let State::Unparsed(source) = &mut self.state else {
            return Ok(());
        };

        let text = match source {
            Source::File(path) => read_entry_file(path)?,
            Source::Text(text) => std::mem::take(text),
        };

        match Parser::new(&text).parse() {
            Ok(groups) => {
                self.warnings = parser::check_recommended_keys(&groups);
                for warning in &self.warnings {
                    warn!(path = ?self.path, %warning, "desktop entry warning");
                }
                debug!(path = ?self.path, groups = groups.len(), "parsed desktop entry");
                self.state = State::Parsed(groups);
                Ok(())
            }
            Err(err) => {
                if let State::Unparsed(Source::Text(slot)) = &mut self.state {
                    *slot = text;
                }
                Err(err)
            }
        }
    }

    /// Whether the backing data has been parsed.
    pub fn is_parsed(&self) -> bool {
        matches!(self.state, State::Parsed(_))
    }

    /// The file this entry was created from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Warnings collected while parsing. Empty until the entry is parsed.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Names of all groups, in file order.
    pub fn group_names(&mut self) -> Result<Vec<&str>> {
        self.ensure_parsed()?;
        Ok(self.parsed_groups().iter().map(|g| g.name.as_str()).collect())
    }

    /// Returns one group by name.
    pub fn group(&mut self, name: &str) -> Result<Option<&Group>> {
        self.ensure_parsed()?;
        Ok(self.find_group(name))
    }

    /// Whether a group with this name exists.
    pub fn has_group(&mut self, name: &str) -> Result<bool> {
        Ok(self.group(name)?.is_some())
    }

    /// Looks up a raw value.
    ///
    /// `group` defaults to `Desktop Entry`. With a non-empty `locale` the
    /// lookup key is `key[locale]`, matched literally: `Name[eo_US]` never
    /// falls back to `Name[eo]` or `Name`. Values are returned unparsed, so
    /// booleans stay the text `true`/`false`.
    pub fn get_value(
        &mut self,
        key: &str,
        group: Option<&str>,
        locale: Option<&str>,
    ) -> Result<Option<&str>> {
        if key.is_empty() {
            return Err(DesktopEntryError::EmptyKey);
        }
        self.ensure_parsed()?;
        Ok(self.lookup_value(group.unwrap_or(DESKTOP_ENTRY_GROUP), key, locale))
    }

    /// Looks up an unlocalized key in the `Desktop Entry` group.
    pub fn value(&mut self, key: &str) -> Result<Option<&str>> {
        self.get_value(key, None, None)
    }

    /// Stores a value in memory, creating the group if needed.
    ///
    /// Later lookups and Exec expansion see the new value. Nothing is
    /// written back to disk.
    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<String>,
        group: Option<&str>,
        locale: Option<&str>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(DesktopEntryError::EmptyKey);
        }
        self.ensure_parsed()?;

        let name = group.unwrap_or(DESKTOP_ENTRY_GROUP);
        if let Some(groups) = self.parsed_groups_mut() {
            let index = match groups.iter().position(|g| g.name == name) {
                Some(index) => index,
                None => {
                    groups.push(Group::new(name));
                    groups.len() - 1
                }
            };
            groups[index]
                .entries
                .insert(localized_key(key, locale), value.into());
        }
        Ok(())
    }

    /// The `Type` key, parsed. Unknown or missing types give `None`.
    pub fn entry_type(&mut self) -> Result<Option<DesktopEntryType>> {
        Ok(self.value("Type")?.and_then(DesktopEntryType::from_str))
    }

    /// The `Name` key, optionally for one exact locale.
    pub fn name(&mut self, locale: Option<&str>) -> Result<Option<&str>> {
        self.get_value("Name", None, locale)
    }

    /// The `GenericName` key, optionally for one exact locale.
    pub fn generic_name(&mut self, locale: Option<&str>) -> Result<Option<&str>> {
        self.get_value("GenericName", None, locale)
    }

    /// The `Comment` key, optionally for one exact locale.
    pub fn comment(&mut self, locale: Option<&str>) -> Result<Option<&str>> {
        self.get_value("Comment", None, locale)
    }

    /// The `Icon` key.
    pub fn icon(&mut self) -> Result<Option<&str>> {
        self.value("Icon")
    }

    /// The raw `Exec` template.
    pub fn exec(&mut self) -> Result<Option<&str>> {
        self.value("Exec")
    }

    /// The `TryExec` key.
    pub fn try_exec(&mut self) -> Result<Option<&str>> {
        self.value("TryExec")
    }

    /// The `Path` key: the working directory for the program.
    pub fn working_dir(&mut self) -> Result<Option<&str>> {
        self.value("Path")
    }

    /// Whether `Terminal` is literally `true`.
    pub fn terminal(&mut self) -> Result<bool> {
        Ok(self.value("Terminal")? == Some("true"))
    }

    fn parsed_groups(&self) -> &[Group] {
        match &self.state {
            State::Parsed(groups) => groups,
            State::Unparsed(_) => &[],
        }
    }

    fn parsed_groups_mut(&mut self) -> Option<&mut Vec<Group>> {
        match &mut self.state {
            State::Parsed(groups) => Some(groups),
            State::Unparsed(_) => None,
        }
    }

    fn find_group(&self, name: &str) -> Option<&Group> {
        self.parsed_groups().iter().find(|g| g.name == name)
    }

    fn lookup_value(&self, group: &str, key: &str, locale: Option<&str>) -> Option<&str> {
        self.find_group(group)?.get_localized(key, locale)
    }
}

fn read_entry_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| DesktopEntryError::Io {
        path: path.to_path_buf(),
        source,
    })
}
