//! Parsing of DAT files, the XML catalogs describing which games a user wants.

use anyhow::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use strum::{Display, EnumIter, IntoEnumIterator};

/// The system name used when the DAT header does not name one.
pub const UNKNOWN_SYSTEM: &str = "Unknown System";

/// Postfixes that DAT tools append to the system name, which Myrient collections don't have.
const POSTFIXES: &[&str] = &[" (Retool)"];

/// A catalog of preservation DATs that Myrient mirrors.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, EnumIter)]
pub enum Catalog {
    #[strum(serialize = "No-Intro")]
    NoIntro,
    Redump,
}

impl Catalog {
    /// The homepage URL which DATs from this catalog put in their header.
    pub fn url(&self) -> &'static str {
        match self {
            Self::NoIntro => "https://www.no-intro.org",
            Self::Redump => "http://redump.org/",
        }
    }

    /// Identify a catalog from the URL in a DAT header.
    pub fn from_url(url: &str) -> Option<Self> {
        Self::iter().find(|catalog| catalog.url() == url)
    }
}

/// The contents of a DAT file that matter for downloading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dat {
    /// The system name from the header, without tool postfixes.
    pub system: String,
    /// The catalog homepage URL from the header, if any.
    pub url: Option<String>,
    /// Names of the wanted games, in document order and without duplicates.
    pub games: Vec<String>,
}

impl Dat {
    /// Read and parse a DAT file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::msg(format!("unable to read {}: {err}", path.display())))?;
        Self::parse(&text)
            .map_err(|err| Error::msg(format!("error parsing DAT file {}: {err}", path.display())))
    }

    /// Parse the text of a DAT file.
    ///
    /// Fails if the XML is malformed or if the DAT lists no games.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let datafile: Datafile = quick_xml::de::from_str(text)?;

        let header = datafile.header.unwrap_or_default();
        let system = header
            .name
            .filter(|name| !name.is_empty())
            .map(|name| strip_postfixes(&name))
            .unwrap_or_else(|| UNKNOWN_SYSTEM.into());
        let url = header.url.filter(|url| !url.is_empty());

        let mut games: Vec<String> = vec![];
        for name in datafile.games.into_iter().filter_map(|game| game.name) {
            if !games.contains(&name) {
                games.push(name);
            }
        }
        if games.is_empty() {
            return Err(Error::msg("no games found in the DAT file"));
        }

        Ok(Self { system, url, games })
    }

    /// The catalog this DAT was exported from, if its header URL is recognised.
    pub fn catalog(&self) -> Option<Catalog> {
        self.url.as_deref().and_then(Catalog::from_url)
    }
}

/// Remove every known tool postfix from a system name.
pub fn strip_postfixes(name: &str) -> String {
    POSTFIXES
        .iter()
        .fold(name.to_string(), |name, fix| name.replace(fix, ""))
}

#[derive(Debug, Deserialize)]
struct Datafile {
    #[serde(default)]
    header: Option<Header>,
    #[serde(rename = "game", default)]
    games: Vec<Game>,
}

#[derive(Debug, Default, Deserialize)]
struct Header {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Game {
    #[serde(rename = "@name", default)]
    name: Option<String>,
}
