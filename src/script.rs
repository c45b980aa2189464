//! Line-oriented layout scripts.
//!
//! A script is a list of commands, one per line, replayed against a
//! `LayoutTree<String>`. A `#` at the start of a line or after whitespace starts a comment;
//! blank lines are skipped.
//!
//! ```text
//! split vertical notes.md    # new pane to the right holding "notes.md"
//! split horizontal           # new pane below, copying the focused value
//! focus left
//! focus-leaf node_1
//! focus-index 0
//! set README.md
//! remove
//! print
//! ```

use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use panetree_ipc::{Direction, NodeId, Orientation};

use crate::layout::LayoutTree;

/// Single script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Split {
        orientation: Orientation,
        value: Option<String>,
    },
    Remove,
    SetValue(String),
    Focus(Direction),
    FocusLeaf(NodeId),
    FocusIndex(usize),
    Print,
}

fn parse_value_enum<T: ValueEnum>(what: &str, arg: Option<&str>) -> anyhow::Result<T> {
    let arg = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    T::from_str(arg, true).map_err(|_| {
        let expected: Vec<_> = T::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_owned())
            .collect();
        anyhow!("invalid {what} {arg:?}, expected one of: {}", expected.join(", "))
    })
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        let no_args = |action: Action| match arg {
            Some(extra) => Err(anyhow!("unexpected argument {extra:?} to {command}")),
            None => Ok(action),
        };

        let action = match command {
            "split" => {
                let (orientation, value) = match rest.split_once(char::is_whitespace) {
                    Some((orientation, value)) => (Some(orientation), Some(value.trim())),
                    None => (arg, None),
                };
                Action::Split {
                    orientation: parse_value_enum("orientation", orientation)?,
                    value: value.map(str::to_owned),
                }
            }
            "remove" => no_args(Action::Remove)?,
            "set" => Action::SetValue(arg.context("missing value")?.to_owned()),
            "focus" => Action::Focus(parse_value_enum("direction", arg)?),
            "focus-leaf" => {
                let id = arg.context("missing pane id")?;
                Action::FocusLeaf(id.parse()?)
            }
            "focus-index" => {
                let index = arg.context("missing pane index")?;
                Action::FocusIndex(
                    index
                        .parse()
                        .with_context(|| format!("invalid pane index {index:?}"))?,
                )
            }
            "print" => no_args(Action::Print)?,
            _ => bail!("unknown command {command:?}"),
        };

        Ok(action)
    }
}

impl Action {
    /// Applies the action. Returns whether the tree changed.
    pub fn apply(&self, tree: &mut LayoutTree<String>) -> anyhow::Result<bool> {
        let changed = match self {
            Action::Split { orientation, value } => {
                tree.split(*orientation, value.clone());
                true
            }
            Action::Remove => tree.remove().is_some(),
            Action::SetValue(value) => {
                tree.set_value(value.clone());
                true
            }
            Action::Focus(direction) => tree.move_focus(*direction),
            Action::FocusLeaf(id) => {
                tree.set_focused(*id)?;
                true
            }
            Action::FocusIndex(index) => {
                let id = tree
                    .leaf_at(*index)
                    .with_context(|| format!("no pane at index {index}"))?;
                tree.set_focused(id)?;
                true
            }
            Action::Print => false,
        };
        Ok(changed)
    }
}

/// Cuts a trailing comment. A `#` glued to a word, as in `issue#4`, is kept.
fn strip_comment(line: &str) -> &str {
    let mut prev_is_space = true;
    for (idx, c) in line.char_indices() {
        if c == '#' && prev_is_space {
            return &line[..idx];
        }
        prev_is_space = c.is_whitespace();
    }
    line
}

/// Parsed script with the line number of every action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    actions: Vec<(usize, Action)>,
}

impl Script {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut actions = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            let action = line
                .parse()
                .with_context(|| format!("error parsing line {line_number}"))?;
            actions.push((line_number, action));
        }
        Ok(Self { actions })
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().map(|(_, action)| action)
    }

    /// Whether the script prints the tree itself.
    pub fn has_print(&self) -> bool {
        self.actions().any(|action| matches!(action, Action::Print))
    }

    /// Replays the script, calling `print` for every `print` command, and also after
    /// every other command when `print_each` is set.
    pub fn run(
        &self,
        tree: &mut LayoutTree<String>,
        print_each: bool,
        mut print: impl FnMut(&LayoutTree<String>) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        for (line_number, action) in &self.actions {
            let changed = action
                .apply(tree)
                .with_context(|| format!("error running line {line_number}"))?;
            if !changed && !matches!(action, Action::Print) {
                debug!("line {line_number}: {action:?} changed nothing");
            }

            if print_each || matches!(action, Action::Print) {
                print(tree)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let script = Script::parse(
            "
            # comment
            split vertical notes.md
            split HORIZONTAL
            split vertical two words
            focus left   # trailing comment
            focus-leaf node_4
            focus-index 2
            set README.md
            remove
            print
            ",
        )
        .unwrap();

        let actions: Vec<_> = script.actions().cloned().collect();
        assert_eq!(
            actions,
            [
                Action::Split {
                    orientation: Orientation::Vertical,
                    value: Some("notes.md".to_owned()),
                },
                Action::Split {
                    orientation: Orientation::Horizontal,
                    value: None,
                },
                Action::Split {
                    orientation: Orientation::Vertical,
                    value: Some("two words".to_owned()),
                },
                Action::Focus(Direction::Left),
                Action::FocusLeaf(NodeId::from_raw(4)),
                Action::FocusIndex(2),
                Action::SetValue("README.md".to_owned()),
                Action::Remove,
                Action::Print,
            ]
        );
    }

    #[test]
    fn hash_inside_a_word_is_not_a_comment() {
        let script = Script::parse("set issue#4\nset a #b\n#print\nset c#\tnote # d\n").unwrap();

        let actions: Vec<_> = script.actions().cloned().collect();
        assert_eq!(
            actions,
            [
                Action::SetValue("issue#4".to_owned()),
                Action::SetValue("a".to_owned()),
                Action::SetValue("c#\tnote".to_owned()),
            ]
        );
        assert!(!script.has_print());
        assert!(Script::parse("remove\nprint # show it\n").unwrap().has_print());
    }

    #[test]
    fn reports_line_of_bad_command() {
        let err = Script::parse("remove\nfocus sideways\n").unwrap_err();
        assert_eq!(err.to_string(), "error parsing line 2");
        assert!(format!("{err:#}").contains("invalid direction \"sideways\""));

        assert!("remove now".parse::<Action>().is_err());
        assert!("focus left twice".parse::<Action>().is_err());
        assert!("set".parse::<Action>().is_err());
        assert!("frobnicate".parse::<Action>().is_err());
    }

    #[test]
    fn runs_against_tree() {
        let script = Script::parse(
            "
            split vertical b
            split horizontal c
            focus left
            set a2
            print
            focus-index 2
            remove
            ",
        )
        .unwrap();

        let mut tree = LayoutTree::new(String::from("a"));
        let mut printed = Vec::new();
        script
            .run(&mut tree, false, |tree| {
                printed.push(tree.flatten());
                Ok(())
            })
            .unwrap();

        assert_eq!(printed, [vec!["a2", "b", "c"]]);
        assert_eq!(tree.flatten(), ["a2", "b"]);
        assert_eq!(tree.focused_value(), "b");
    }

    #[test]
    fn stale_leaf_is_an_error() {
        let mut tree = LayoutTree::new(String::from("a"));
        let id = tree.split(Orientation::Vertical, None);
        tree.remove();

        let err = Action::FocusLeaf(id).apply(&mut tree).unwrap_err();
        assert_eq!(err.to_string(), format!("{id} is not a pane of this layout tree"));
    }
}
