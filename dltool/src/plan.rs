//! Matching the games wanted by a DAT against the files a collection offers.

use crate::listing::Entry;
use std::collections::HashMap;

/// A file offered by a Myrient collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFile {
    /// The file name without its extension, which is what DAT game names match against.
    pub name: String,
    /// The full file name.
    pub file: String,
    /// The path of the file relative to the server root.
    pub path: String,
}

/// Strip the last extension from a file name.
///
/// A leading dot does not start an extension, so `.hidden` is returned unchanged.
pub fn file_stem(file: &str) -> &str {
    match file.rfind('.') {
        Some(i) if file[..i].chars().any(|c| c != '.') => &file[..i],
        _ => file,
    }
}

/// Index the entries of a collection listing by file stem.
///
/// `collection` is the server path of the collection directory. When several files share a stem,
/// the last one listed wins.
pub fn available(entries: &[Entry], collection: &str) -> HashMap<String, RemoteFile> {
    entries
        .iter()
        .map(|entry| {
            let name = file_stem(&entry.title).to_string();
            let file = RemoteFile {
                name: name.clone(),
                file: entry.title.clone(),
                path: format!("{collection}{}", entry.href),
            };
            (name, file)
        })
        .collect()
}

/// What to download, and what cannot be found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    /// Files to download, in the order the DAT lists them.
    pub wanted: Vec<RemoteFile>,
    /// Games which the collection does not have, in the order the DAT lists them.
    pub missing: Vec<String>,
}

impl Plan {
    pub fn build(games: &[String], available: &HashMap<String, RemoteFile>) -> Self {
        let mut plan = Self::default();
        for game in games {
            match available.get(game) {
                Some(file) => plan.wanted.push(file.clone()),
                None => plan.missing.push(game.clone()),
            }
        }
        plan
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Tetris (World).zip"), "Tetris (World)");
        assert_eq!(file_stem("Game.Name.v1.ipf"), "Game.Name.v1");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("..hidden"), "..hidden");
        assert_eq!(file_stem("trailing."), "trailing");
        assert_eq!(file_stem("St. Louis (USA).7z"), "St. Louis (USA)");
    }

    #[test]
    fn test_available() {
        let entries = [
            Entry::new("Tetris (World).zip", "Tetris%20%28World%29.zip"),
            Entry::new("Tetris (World).7z", "Tetris%20%28World%29.7z"),
            Entry::new("Dr. Mario (World).zip", "Dr.%20Mario%20%28World%29.zip"),
        ];
        let available = available(&entries, "No-Intro/Nintendo%20-%20Game%20Boy/");
        assert_eq!(available.len(), 2);
        assert_eq!(
            available["Tetris (World)"],
            RemoteFile {
                name: "Tetris (World)".into(),
                file: "Tetris (World).7z".into(),
                path: "No-Intro/Nintendo%20-%20Game%20Boy/Tetris%20%28World%29.7z".into(),
            }
        );
        assert_eq!(available["Dr. Mario (World)"].file, "Dr. Mario (World).zip");
    }

    #[test]
    fn test_plan() {
        let entries = [
            Entry::new("B.zip", "B.zip"),
            Entry::new("A.zip", "A.zip"),
            Entry::new("Unwanted.zip", "Unwanted.zip"),
        ];
        let available = available(&entries, "");
        let games = ["A", "Missing 1", "B", "Missing 2"].map(String::from);
        let plan = Plan::build(&games, &available);
        assert_eq!(
            plan.wanted.iter().map(|f| f.file.as_str()).collect::<Vec<_>>(),
            ["A.zip", "B.zip"]
        );
        assert_eq!(plan.missing, ["Missing 1", "Missing 2"]);
        assert_eq!(plan.wanted.len() + plan.missing.len(), games.len());
    }
}
