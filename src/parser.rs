use std::sync::LazyLock;

use regex::Regex;

use crate::{DESKTOP_ENTRY_GROUP, DesktopEntryError, Group, Result, Warning};

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern"));
static GROUP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+)\]$").expect("group header pattern"));
static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)=(.*)$").expect("key/value pattern"));

pub(crate) struct Parser<'a> {
    content: &'a str,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(content: &'a str) -> Self {
        Self { content }
    }

    /// Splits the content into groups, in file order.
    ///
    /// A header naming a group seen earlier reopens that group; later keys
    /// overwrite earlier ones.
    pub(crate) fn parse(self) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<usize> = None;

        let content = self.content.strip_prefix('\u{feff}').unwrap_or(self.content);

        for (index, line) in LINE_BREAK.split(content).enumerate() {
            let line_num = index + 1;
            let trimmed = line.trim_start();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(caps) = GROUP_HEADER.captures(line) {
                let name = &caps[1];
                let position = match groups.iter().position(|g| g.name == name) {
                    Some(position) => position,
                    None => {
                        groups.push(Group::new(name));
                        groups.len() - 1
                    }
                };
                current = Some(position);
                continue;
            }

            let Some(position) = current else {
                return Err(DesktopEntryError::ContentBeforeGroup {
                    line: line_num,
                    content: line.to_string(),
                });
            };

            let Some(caps) = KEY_VALUE.captures(line) else {
                return Err(DesktopEntryError::InvalidLine {
                    line: line_num,
                    content: line.to_string(),
                });
            };

            groups[position]
                .entries
                .insert(caps[1].to_string(), caps[2].to_string());
        }

        Ok(groups)
    }
}

/// Checks the main group for the keys every entry should carry.
pub(crate) fn check_recommended_keys(groups: &[Group]) -> Vec<Warning> {
    let main = groups.iter().find(|g| g.name == DESKTOP_ENTRY_GROUP);
    let mut warnings = Vec::new();

    for key in ["Type", "Name", "Encoding"] {
        if main.and_then(|g| g.get(key)).is_none() {
            warnings.push(Warning::MissingKey(key));
        }
    }

    if let Some(encoding) = main.and_then(|g| g.get("Encoding"))
        && encoding != "UTF-8"
    {
        warnings.push(Warning::UnsupportedEncoding(encoding.to_string()));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn mixed_line_endings() {
        let groups = Parser::new("[A]\r\nx=1\ry=2\n\n\r\n[B]\rz=3")
            .parse()
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].get("x"), Some("1"));
        assert_eq!(groups[0].get("y"), Some("2"));
        assert_eq!(groups[1].get("z"), Some("3"));
    }

    #[test]
    fn first_equals_splits() {
        let groups = Parser::new("[A]\nExec=env FOO=bar app\nEmpty=").parse().unwrap();

        assert_eq!(groups[0].get("Exec"), Some("env FOO=bar app"));
        assert_eq!(groups[0].get("Empty"), Some(""));
    }

    #[test]
    fn indented_comment_is_skipped() {
        let groups = Parser::new("   # leading\n[A]\n\t# note\nk=v").parse().unwrap();
        assert_eq!(groups[0].entries.len(), 1);
    }

    #[test]
    fn reopened_group_merges() {
        let groups = Parser::new("[A]\nk=1\n[B]\nk=2\n[A]\nk=3\nj=4").parse().unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].get("k"), Some("3"));
        assert_eq!(groups[0].get("j"), Some("4"));
    }

    #[test]
    fn reports_line_numbers() {
        let err = Parser::new("[A]\nk=v\n\nnot a pair").parse().unwrap_err();

        match err {
            DesktopEntryError::InvalidLine { line, content } => {
                assert_eq!(line, 4);
                assert_eq!(content, "not a pair");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pair_before_header() {
        let err = Parser::new("# comment\nk=v\n[A]").parse().unwrap_err();

        assert!(matches!(
            err,
            DesktopEntryError::ContentBeforeGroup { line: 2, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn leading_byte_order_mark() {
        let groups = Parser::new("\u{feff}[Desktop Entry]\nName=x").parse().unwrap();

        assert_eq!(groups[0].name, "Desktop Entry");
        assert_eq!(groups[0].get("Name"), Some("x"));
    }

    #[test]
    fn empty_header_is_not_a_group() {
        assert!(Parser::new("[]\nk=v").parse().is_err());
    }

    #[test]
    fn warnings_for_missing_keys() {
        let groups = Parser::new("[Desktop Entry]\nName=x").parse().unwrap();

        assert_eq!(
            check_recommended_keys(&groups),
            vec![Warning::MissingKey("Type"), Warning::MissingKey("Encoding")]
        );
    }

    #[test]
    fn warning_for_legacy_encoding() {
        let groups = Parser::new("[Desktop Entry]\nType=Application\nName=x\nEncoding=Legacy-Mixed")
            .parse()
            .unwrap();

        assert_eq!(
            check_recommended_keys(&groups),
            vec![Warning::UnsupportedEncoding("Legacy-Mixed".to_string())]
        );
    }
}
