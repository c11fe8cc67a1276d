//! Exec template expansion.
//!
//! An `Exec` value is split into literal text and `%X` field codes by
//! [`tokenize`]; expansion then maps each field code to its replacement
//! built from the caller's arguments.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::{
    DESKTOP_ENTRY_GROUP, DesktopEntry, DesktopEntryError, DesktopEntryType, Result, Warning,
};

static URI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("URI scheme pattern"));
static FILE_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^file://+").expect("file URI pattern"));

// ============================================================================
// Field codes
// ============================================================================

/// A `%X` field code in an Exec template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCode {
    /// `%f`: a single file path
    File,
    /// `%F`: a list of file paths
    Files,
    /// `%u`: a single URI
    Url,
    /// `%U`: a list of URIs
    Urls,
    /// `%d`: directory of a file
    Dir,
    /// `%D`: directories of a list of files
    Dirs,
    /// `%n`: base name of a file
    FileName,
    /// `%N`: base names of a list of files
    FileNames,
    /// `%i`: `--icon` flag for the entry's icon
    Icon,
    /// `%c`: the entry's name
    Caption,
    /// `%k`: location of the desktop file
    Location,
    /// `%v`: the entry's `Dev` key
    Device,
    /// `%%`: a literal percent sign
    Percent,
    /// Any other ASCII letter
    Unknown(char),
}

impl FieldCode {
    /// Maps the character after `%` to its field code.
    pub fn from_char(c: char) -> Self {
        match c {
            'f' => Self::File,
            'F' => Self::Files,
            'u' => Self::Url,
            'U' => Self::Urls,
            'd' => Self::Dir,
            'D' => Self::Dirs,
            'n' => Self::FileName,
            'N' => Self::FileNames,
            'i' => Self::Icon,
            'c' => Self::Caption,
            'k' => Self::Location,
            'v' => Self::Device,
            '%' => Self::Percent,
            other => Self::Unknown(other),
        }
    }

    /// Whether this code takes any number of arguments.
    pub fn accepts_list(self) -> bool {
        matches!(
            self,
            Self::Files | Self::Urls | Self::Dirs | Self::FileNames
        )
    }

    /// Whether this code expands arguments as URIs.
    pub fn wants_uris(self) -> bool {
        matches!(self, Self::Url | Self::Urls)
    }

    /// `%%` is an escape, everything else is a placeholder.
    pub fn is_placeholder(self) -> bool {
        self != Self::Percent
    }
}

/// A piece of an Exec template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecToken<'a> {
    /// Text copied as-is
    Literal(&'a str),
    /// A `%X` sequence
    Field(FieldCode),
}

/// Splits an Exec template into literal text and field codes.
///
/// A `%` followed by anything other than an ASCII letter or another `%`,
/// or at the very end of the template, stays literal text.
///
/// # Examples
///
/// ```
/// use desktop_launch::{ExecToken, FieldCode, tokenize};
///
/// assert_eq!(
///     tokenize("fooview %F"),
///     vec![ExecToken::Literal("fooview "), ExecToken::Field(FieldCode::Files)]
/// );
/// ```
pub fn tokenize(template: &str) -> Vec<ExecToken<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut chars = template.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if c != '%' {
            continue;
        }
        let Some(&(_, code)) = chars.peek() else {
            break;
        };
        if code != '%' && !code.is_ascii_alphabetic() {
            continue;
        }
        chars.next();

        if literal_start < index {
            tokens.push(ExecToken::Literal(&template[literal_start..index]));
        }
        tokens.push(ExecToken::Field(FieldCode::from_char(code)));
        literal_start = index + 1 + code.len_utf8();
    }

    if literal_start < template.len() {
        tokens.push(ExecToken::Literal(&template[literal_start..]));
    }
    tokens
}

fn field_codes(tokens: &[ExecToken<'_>]) -> impl Iterator<Item = FieldCode> {
    tokens.iter().filter_map(|token| match token {
        ExecToken::Field(code) => Some(*code),
        ExecToken::Literal(_) => None,
    })
}

fn has_placeholder(tokens: &[ExecToken<'_>]) -> bool {
    field_codes(tokens).any(FieldCode::is_placeholder)
}

fn uses_uris(tokens: &[ExecToken<'_>]) -> bool {
    field_codes(tokens).any(FieldCode::wants_uris)
}

fn accepts_list(tokens: &[ExecToken<'_>]) -> bool {
    !has_placeholder(tokens) || field_codes(tokens).any(FieldCode::accepts_list)
}

// ============================================================================
// Path / URI conversion
// ============================================================================

/// Converts an argument to a local path.
///
/// Plain paths come back unchanged and `file://` URIs lose their scheme
/// (all slashes after `file:` collapse into one leading `/`). Any other
/// scheme is an error.
pub fn to_path(arg: &str) -> Result<String> {
    if !URI_SCHEME.is_match(arg) {
        return Ok(arg.to_string());
    }
    match FILE_URI.find(arg) {
        Some(prefix) => Ok(format!("/{}", &arg[prefix.end()..])),
        None => Err(DesktopEntryError::RemoteResource(arg.to_string())),
    }
}

/// Converts an argument to a URI.
///
/// Anything that already starts with `scheme://` is returned unchanged.
/// Paths are made absolute against the current directory and become
/// `file:///...` URIs. An empty argument stands for the current directory.
pub fn to_uri(arg: &str) -> Result<String> {
    if URI_SCHEME.is_match(arg) {
        return Ok(arg.to_string());
    }
    let absolute = if arg.is_empty() {
        std::env::current_dir()
    } else {
        std::path::absolute(arg)
    };
    let absolute = absolute.map_err(|source| DesktopEntryError::AbsolutePath {
        path: arg.to_string(),
        source,
    })?;
    let absolute = absolute.to_string_lossy();
    Ok(format!("file:///{}", absolute.trim_start_matches('/')))
}

fn containing_dir(path: String) -> String {
    let as_path = Path::new(&path);
    if as_path.is_dir() {
        return path;
    }
    let parent = match as_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(".".to_string()),
        Some(parent) => Some(parent.to_string_lossy().into_owned()),
        None => None,
    };
    parent.unwrap_or(path)
}

fn file_name(path: String) -> String {
    let name = Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    name.unwrap_or(path)
}

// TODO: escape single quotes embedded in arguments
fn quote(arg: &str) -> String {
    format!("'{}'", arg)
}

fn quote_all<S: AsRef<str>>(
    args: &[S],
    resolve: impl Fn(&str) -> Result<String>,
) -> Result<String> {
    let quoted = args
        .iter()
        .map(|arg| resolve(arg.as_ref()).map(|resolved| quote(&resolved)))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(" "))
}

// ============================================================================
// Expansion
// ============================================================================

/// Entry data the non-argument field codes read from.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ExecContext<'a> {
    pub icon: Option<&'a str>,
    pub name: Option<&'a str>,
    pub location: Option<&'a Path>,
    pub device: Option<&'a str>,
}

/// Expands `template` against `args`.
///
/// A template without placeholders gets ` %F` appended when there are
/// arguments to pass. Templates that do not accept a list need exactly one
/// argument.
pub(crate) fn expand_template<S: AsRef<str>>(
    template: &str,
    context: &ExecContext<'_>,
    args: &[S],
) -> Result<String> {
    let mut tokens = tokenize(template);
    if !has_placeholder(&tokens) && !args.is_empty() {
        tokens.push(ExecToken::Literal(" "));
        tokens.push(ExecToken::Field(FieldCode::Files));
    }

    if !accepts_list(&tokens) && args.len() != 1 {
        return Err(DesktopEntryError::ArgumentCount(args.len()));
    }

    let mut command = String::with_capacity(template.len());
    for token in &tokens {
        match token {
            ExecToken::Literal(text) => command.push_str(text),
            ExecToken::Field(code) => command.push_str(&expand_field(*code, context, args)?),
        }
    }

    Ok(command)
}

fn expand_field<S: AsRef<str>>(
    code: FieldCode,
    context: &ExecContext<'_>,
    args: &[S],
) -> Result<String> {
    let expanded = match code {
        FieldCode::Percent => "%".to_string(),
        FieldCode::File | FieldCode::Files => quote_all(args, to_path)?,
        FieldCode::Url | FieldCode::Urls => quote_all(args, to_uri)?,
        FieldCode::Dir | FieldCode::Dirs => {
            quote_all(args, |arg| to_path(arg).map(containing_dir))?
        }
        FieldCode::FileName | FieldCode::FileNames => {
            quote_all(args, |arg| to_path(arg).map(file_name))?
        }
        FieldCode::Icon => match context.icon {
            Some(icon) if !icon.is_empty() => format!("--icon {}", quote(icon)),
            _ => String::new(),
        },
        FieldCode::Caption => context.name.unwrap_or_default().to_string(),
        FieldCode::Location => context
            .location
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
        FieldCode::Device => context.device.unwrap_or_default().to_string(),
        FieldCode::Unknown(c) => {
            warn!(warning = %Warning::UnknownFieldCode(c), "dropping field code");
            String::new()
        }
    };
    Ok(expanded)
}

impl DesktopEntry {
    /// Whether the Exec template takes URIs (`%u` or `%U`) rather than paths.
    ///
    /// `%%u` is an escaped percent followed by `u`, not a URI marker.
    pub fn wants_uris(&mut self) -> Result<bool> {
        let template = self.exec_template()?;
        Ok(uses_uris(&tokenize(template)))
    }

    /// Whether the Exec template takes any number of arguments.
    ///
    /// True for the list codes `%F %U %D %N`, and for templates with no
    /// placeholder at all, which get an implicit `%F`.
    pub fn wants_list(&mut self) -> Result<bool> {
        let template = self.exec_template()?;
        Ok(accepts_list(&tokenize(template)))
    }

    /// Builds the command line for launching this entry with `args`.
    ///
    /// Every argument is single-quoted. Arguments may be paths or URIs;
    /// each is converted to what the field code asks for.
    ///
    /// # Examples
    ///
    /// ```
    /// use desktop_launch::DesktopEntry;
    ///
    /// let mut entry = DesktopEntry::from_text("[Desktop Entry]\nType=Application\nName=Foo\nExec=fooview %f\n");
    /// assert_eq!(entry.parse_exec(&["bar"]).unwrap(), "fooview 'bar'");
    /// assert!(entry.parse_exec(&["bar", "baz"]).is_err());
    /// ```
    pub fn parse_exec<S: AsRef<str>>(&mut self, args: &[S]) -> Result<String> {
        self.ensure_parsed()?;

        let entry_type = self.lookup_value(DESKTOP_ENTRY_GROUP, "Type", None);
        if entry_type.and_then(DesktopEntryType::from_str) != Some(DesktopEntryType::Application)
        {
            return Err(DesktopEntryError::NotAnApplication(
                entry_type.map(str::to_string),
            ));
        }

        let template = self
            .lookup_value(DESKTOP_ENTRY_GROUP, "Exec", None)
            .ok_or(DesktopEntryError::MissingExec)?;
        let context = ExecContext {
            icon: self.lookup_value(DESKTOP_ENTRY_GROUP, "Icon", None),
            name: self.lookup_value(DESKTOP_ENTRY_GROUP, "Name", None),
            location: self.source_path(),
            device: self.lookup_value(DESKTOP_ENTRY_GROUP, "Dev", None),
        };

        let command = expand_template(template, &context, args)?;
        debug!(%command, args = args.len(), "expanded Exec template");
        Ok(command)
    }

    /// Same as [`DesktopEntry::parse_exec`].
    pub fn expand<S: AsRef<str>>(&mut self, args: &[S]) -> Result<String> {
        self.parse_exec(args)
    }

    fn exec_template(&mut self) -> Result<&str> {
        self.ensure_parsed()?;
        self.lookup_value(DESKTOP_ENTRY_GROUP, "Exec", None)
            .ok_or(DesktopEntryError::MissingExec)
    }
}
