//! Choosing the catalog and collection directories to download from.
//!
//! Both choices are made automatically when the DAT identifies them unambiguously, and fall back
//! to asking the user to pick from a numbered list otherwise.

use crate::dat::Catalog;
use crate::listing::Entry;
use anyhow::Error;

/// A source of answers to interactive questions.
pub trait Prompt {
    /// Ask `question` and return the answer, or [`None`] if there is no more input.
    fn ask(&mut self, question: &str) -> Result<Option<String>, Error>;
}

/// The first entry whose title mentions `catalog`.
pub fn auto_catalog<'a>(entries: &'a [Entry], catalog: &str) -> Option<&'a Entry> {
    entries.iter().find(|entry| entry.title.contains(catalog))
}

/// All entries whose title starts with the system name.
pub fn candidate_collections<'a>(entries: &'a [Entry], system: &str) -> Vec<&'a Entry> {
    entries
        .iter()
        .filter(|entry| entry.title.starts_with(system))
        .collect()
}

/// Choose the catalog directory from a listing of the server root.
///
/// If `force` is set the user is always asked, even if the catalog could be found automatically.
pub fn choose_catalog(
    entries: &[Entry],
    catalog: Option<Catalog>,
    force: bool,
    prompt: &mut impl Prompt,
) -> Result<Entry, Error> {
    let found = catalog.and_then(|catalog| auto_catalog(entries, &catalog.to_string()));
    if let Some(entry) = found {
        tracing::info!("Automatically selected catalog: {}", entry.title);
        if !force {
            return Ok(entry.clone());
        }
    }

    tracing::warn!("{}", catalog_reason(catalog, found.is_some()));
    tracing::warn!("Please select the catalog from the following list:");
    let options = entries.iter().collect::<Vec<_>>();
    let entry = choose("catalog", &options, prompt)?;
    tracing::info!("Selected catalog: {}", entry.title);
    Ok(entry.clone())
}

/// Choose the collection directory from a listing of a catalog.
///
/// A single collection whose name starts with `system` is chosen automatically unless `force` is
/// set. Several such collections are offered to the user as the only options; with none, or when
/// forced, the user picks from the whole catalog.
pub fn choose_collection(
    entries: &[Entry],
    system: &str,
    force: bool,
    prompt: &mut impl Prompt,
) -> Result<Entry, Error> {
    let candidates = candidate_collections(entries, system);
    if let ([entry], false) = (candidates.as_slice(), force) {
        tracing::info!("Automatically selected collection: {}", entry.title);
        return Ok((*entry).clone());
    }

    tracing::warn!("{}", collection_reason(system, candidates.len()));
    let options = if candidates.len() > 1 && !force {
        candidates
    } else {
        entries.iter().collect()
    };
    let entry = choose("collection", &options, prompt)?;
    tracing::info!("Selected collection: {}", entry.title);
    Ok(entry.clone())
}

/// Why the user is asked for the catalog.
fn catalog_reason(catalog: Option<Catalog>, found: bool) -> String {
    match catalog {
        _ if found => "Manual catalog selection forced.".into(),
        None => "Catalog could not be determined from DAT file.".into(),
        Some(catalog) => {
            format!("Could not automatically find directory for catalog \"{catalog}\" on Myrient.")
        }
    }
}

/// Why the user is asked for the collection, given how many collections matched `system`.
fn collection_reason(system: &str, candidates: usize) -> String {
    match candidates {
        0 => format!(
            "Could not automatically find a collection matching \"{system}\". Please choose:"
        ),
        1 => "Manual collection selection forced.".into(),
        _ => format!("Multiple possible collections found for \"{system}\". Please choose:"),
    }
}

/// List `options` with 1-based numbers and ask until the user picks one of them.
fn choose<'a>(
    what: &str,
    options: &[&'a Entry],
    prompt: &mut impl Prompt,
) -> Result<&'a Entry, Error> {
    if options.is_empty() {
        return Err(Error::msg(format!("no {what} directories to choose from")));
    }
    for (i, entry) in options.iter().enumerate() {
        tracing::warn!("{:<2}: {}", i + 1, entry.title);
    }

    loop {
        let Some(answer) = prompt.ask(&format!("Input selected {what} number: "))? else {
            return Err(Error::msg(format!("no {what} selected")));
        };
        match answer.trim().parse::<i64>() {
            Ok(n) if n >= 1 && n as usize <= options.len() => return Ok(options[n as usize - 1]),
            Ok(_) => tracing::error!("Input number out of range!"),
            Err(_) => tracing::error!("Invalid input. Please enter a number."),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    /// Answers questions from a fixed script.
    struct Script {
        answers: VecDeque<&'static str>,
        asked: usize,
    }

    impl Script {
        fn new(answers: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                asked: 0,
            }
        }
    }

    impl Prompt for Script {
        fn ask(&mut self, _question: &str) -> Result<Option<String>, Error> {
            self.asked += 1;
            Ok(self.answers.pop_front().map(String::from))
        }
    }

    fn root() -> Vec<Entry> {
        vec![
            Entry::new("Internet Archive", "Internet%20Archive/"),
            Entry::new("No-Intro", "No-Intro/"),
            Entry::new("Redump", "Redump/"),
        ]
    }

    fn no_intro() -> Vec<Entry> {
        vec![
            Entry::new("Nintendo - Game Boy", "Nintendo%20-%20Game%20Boy/"),
            Entry::new(
                "Nintendo - Game Boy Advance",
                "Nintendo%20-%20Game%20Boy%20Advance/",
            ),
            Entry::new(
                "Nintendo - Game Boy Advance (Multiboot)",
                "Nintendo%20-%20Game%20Boy%20Advance%20%28Multiboot%29/",
            ),
            Entry::new("Sega - Mega Drive - Genesis", "Sega%20-%20Mega%20Drive%20-%20Genesis/"),
        ]
    }

    #[test]
    fn test_auto_catalog() {
        let mut script = Script::new([]);
        let entry = choose_catalog(&root(), Some(Catalog::Redump), false, &mut script).unwrap();
        assert_eq!(entry.href, "Redump/");
        assert_eq!(script.asked, 0);
    }

    #[test]
    fn test_forced_catalog() {
        let mut script = Script::new(["1"]);
        let entry = choose_catalog(&root(), Some(Catalog::Redump), true, &mut script).unwrap();
        assert_eq!(entry.title, "Internet Archive");
        assert_eq!(script.asked, 1);
    }

    #[test]
    fn test_unknown_catalog() {
        let mut script = Script::new(["zero", "0", "4", " 2 "]);
        let entry = choose_catalog(&root(), None, false, &mut script).unwrap();
        assert_eq!(entry.title, "No-Intro");
        assert_eq!(script.asked, 4);
    }

    #[test]
    fn test_catalog_end_of_input() {
        let mut script = Script::new(["-1"]);
        choose_catalog(&root(), None, false, &mut script).unwrap_err();
        assert_eq!(script.asked, 2);
    }

    #[test]
    fn test_empty_root() {
        let mut script = Script::new(["1"]);
        choose_catalog(&[], Some(Catalog::NoIntro), false, &mut script).unwrap_err();
        assert_eq!(script.asked, 0);
    }

    #[test]
    fn test_single_collection() {
        let mut script = Script::new([]);
        let entry =
            choose_collection(&no_intro(), "Sega - Mega Drive", false, &mut script).unwrap();
        assert_eq!(entry.title, "Sega - Mega Drive - Genesis");
    }

    #[test]
    fn test_multiple_collections() {
        // Only the three Game Boy collections are offered, so 4 is out of range.
        let mut script = Script::new(["4", "3"]);
        let entry =
            choose_collection(&no_intro(), "Nintendo - Game Boy", false, &mut script).unwrap();
        assert_eq!(entry.title, "Nintendo - Game Boy Advance (Multiboot)");
        assert_eq!(script.asked, 2);
    }

    #[test]
    fn test_forced_collection() {
        let mut script = Script::new(["4"]);
        let entry =
            choose_collection(&no_intro(), "Sega - Mega Drive", true, &mut script).unwrap();
        assert_eq!(entry.title, "Sega - Mega Drive - Genesis");
    }

    #[test]
    fn test_no_matching_collection() {
        let mut script = Script::new(["1"]);
        let entry = choose_collection(&no_intro(), "Atari - 2600", false, &mut script).unwrap();
        assert_eq!(entry.title, "Nintendo - Game Boy");
    }

    #[test]
    fn test_reasons() {
        // Forcing is only mentioned when there was an automatic choice to override.
        assert_eq!(
            catalog_reason(Some(Catalog::Redump), true),
            "Manual catalog selection forced."
        );
        assert_eq!(
            catalog_reason(Some(Catalog::Redump), false),
            "Could not automatically find directory for catalog \"Redump\" on Myrient."
        );
        assert_eq!(
            catalog_reason(None, false),
            "Catalog could not be determined from DAT file."
        );

        assert_eq!(
            collection_reason("Atari - 2600", 0),
            "Could not automatically find a collection matching \"Atari - 2600\". Please choose:"
        );
        assert_eq!(
            collection_reason("Sega - Mega Drive", 1),
            "Manual collection selection forced."
        );
        assert_eq!(
            collection_reason("Nintendo", 3),
            "Multiple possible collections found for \"Nintendo\". Please choose:"
        );
    }

    #[test]
    fn test_forced_without_match() {
        // Forcing with nothing to override still offers every entry.
        let mut script = Script::new(["2"]);
        let entry = choose_catalog(&root(), None, true, &mut script).unwrap();
        assert_eq!(entry.title, "No-Intro");

        let mut script = Script::new(["1"]);
        let entry = choose_collection(&no_intro(), "Atari - 2600", true, &mut script).unwrap();
        assert_eq!(entry.title, "Nintendo - Game Boy");
    }

    #[test]
    fn test_candidates() {
        let entries = no_intro();
        assert_eq!(candidate_collections(&entries, "Nintendo - Game Boy Advance").len(), 2);
        assert_eq!(candidate_collections(&entries, "Nintendo").len(), 3);
        assert!(candidate_collections(&entries, "Sony").is_empty());
        assert_eq!(
            auto_catalog(&root(), "No-Intro").map(|e| e.href.as_str()),
            Some("No-Intro/")
        );
    }
}
