//! Filesystem spool storage
//!
//! One directory subtree per group: dots in the group name map to nested
//! directories on disk (`rush.general` lives at `<spool>/rush/general`).
//! A directory is a group iff it contains a `.info` metadata file. Articles
//! are plain text files named by their decimal number; `.seq` records the
//! highest number ever published and `.ids` is an append-only message-ID
//! index. Number allocation and article storage serialize per group through
//! an exclusive advisory lock on the group's `.lock` file, so concurrent
//! posters (and independent server processes sharing a spool) always get
//! distinct, consecutive numbers.
//!
//! Articles are published write-then-rename: a reader never sees a number
//! advertised in `.seq` before the article file is completely in place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::article::header_value;
use crate::group::Group;
use crate::validation::validate_group_name;
use crate::{NewsError, Result};

/// Metadata marker file; its presence makes a directory a group
const INFO_FILE: &str = ".info";
/// Highest published article number
const SEQ_FILE: &str = ".seq";
/// Message-ID index, one `<id> number` line per stored article
const IDS_FILE: &str = ".ids";
/// Advisory lock file guarding allocation and storage
const LOCK_FILE: &str = ".lock";

/// Per-group policy metadata stored in the `.info` file (TOML)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupInfo {
    /// Shown by LIST NEWSGROUPS
    pub description: String,
    /// Group creator address; LIST ACTIVE.TIMES and CC-mail Errors-To:
    pub creator: String,
    /// Creation time (unix seconds) for LIST ACTIVE.TIMES
    pub ctime: i64,
    /// Whether posting is currently permitted
    pub postok: bool,
    /// Maximum accepted posting length in 80-column lines; 0 = unlimited
    pub postlimit: u64,
    /// Comma-separated CC-mail address list; empty disables CC-mail
    pub ccpost: String,
    /// Reply-To: for CC-mail copies; empty disables the header
    pub replyto: String,
    /// Placeholder To: address used on CC-mail copies
    pub voidemail: String,
}

impl Default for GroupInfo {
    fn default() -> Self {
        Self {
            description: String::new(),
            creator: String::new(),
            ctime: 0,
            postok: true,
            postlimit: 0,
            ccpost: String::new(),
            replyto: String::new(),
            voidemail: String::new(),
        }
    }
}

/// Handle to the spool tree rooted at a configured directory
///
/// Cheap to clone; carries no open resources. All mutation goes through
/// [`Spool::store_article`], which takes the per-group lock internally.
#[derive(Debug, Clone)]
pub struct Spool {
    root: PathBuf,
}

impl Spool {
    /// Create a handle rooted at `root` (the directory need not exist yet)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Spool root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a (validated) group name resolves to
    fn group_dir(&self, name: &str) -> PathBuf {
        self.root.join(name.replace('.', "/"))
    }

    /// Enumerate every group in the spool, in directory-read order
    ///
    /// Recursively walks the tree; nested directory names are dot-joined
    /// (`rush/general` becomes `rush.general`). Hidden entries are skipped.
    /// Unreadable directories are logged and skipped rather than failing
    /// the whole listing.
    pub fn enumerate_groups(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.walk_groups(&self.root, None, &mut names);
        names
    }

    fn walk_groups(&self, dir: &Path, prefix: Option<&str>, names: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read spool directory {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let name = match prefix {
                Some(prefix) => format!("{prefix}.{file_name}"),
                None => file_name.to_string(),
            };

            if path.join(INFO_FILE).is_file() {
                names.push(name.clone());
            }

            self.walk_groups(&path, Some(&name), names);
        }
    }

    /// Load a group's metadata and current article range
    ///
    /// Validates the name first; a directory without the `.info` marker is
    /// not a group. `end` can exceed the highest article present (expired
    /// articles keep their numbers retired), so existence and in-range are
    /// separate checks for callers.
    pub fn load_group(&self, name: &str) -> Result<Group> {
        validate_group_name(name)?;

        let dir = self.group_dir(name);
        let info_path = dir.join(INFO_FILE);
        if !info_path.is_file() {
            return Err(NewsError::NoSuchGroup("group does not exist".to_string()));
        }

        let text = fs::read_to_string(&info_path)?;
        let info: GroupInfo =
            toml::from_str(&text).map_err(|e| NewsError::Metadata(e.to_string()))?;

        let (lowest, highest, total) = scan_articles(&dir)?;
        let end = read_seq(&dir).max(highest.unwrap_or(0));
        let start = lowest.unwrap_or(end + 1);

        Ok(Group::from_spool(name.to_string(), start, end, total, info))
    }

    /// Load one article's header and body lines
    ///
    /// Fails with `NoSuchArticle` when the number has no file, even if it
    /// lies inside the group's advertised range.
    pub fn load_article(&self, group: &str, number: u64) -> Result<(Vec<String>, Vec<String>)> {
        validate_group_name(group)?;

        let path = self.group_dir(group).join(number.to_string());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NewsError::NoSuchArticle(format!(
                    "article {number} not found in {group}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut lines: Vec<String> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop(); // trailing newline artifact
        }

        let split = lines.iter().position(|l| l.is_empty());
        match split {
            Some(at) => {
                let body = lines.split_off(at + 1);
                lines.pop(); // the separator itself
                Ok((lines, body))
            }
            None => Ok((lines, Vec::new())),
        }
    }

    /// Resolve a message-ID to an article number within a group
    ///
    /// Consults the `.ids` index first; an index hit is verified against the
    /// live range and file before being trusted (the index is append-only
    /// and may be stale after expiry). Falls back to scanning article
    /// headers so a missing or damaged index never loses articles.
    pub fn find_article_by_message_id(&self, group: &str, id: &str) -> Result<u64> {
        validate_group_name(group)?;

        let dir = self.group_dir(group);
        let (lowest, highest, _) = scan_articles(&dir)?;
        let end = read_seq(&dir).max(highest.unwrap_or(0));
        let start = lowest.unwrap_or(end + 1);

        if let Ok(index) = fs::read_to_string(dir.join(IDS_FILE)) {
            let hit = index
                .lines()
                .filter_map(|line| {
                    let (mid, num) = line.split_once(' ')?;
                    (mid == id).then(|| num.trim().parse::<u64>().ok()).flatten()
                })
                .last();

            if let Some(number) = hit {
                if number >= start
                    && number <= end
                    && dir.join(number.to_string()).is_file()
                {
                    return Ok(number);
                }
                debug!("stale index entry for {id} in {group}, rescanning");
            }
        }

        // Index miss: scan stored article headers.
        for number in article_numbers(&dir)? {
            let (header, _) = self.load_article(group, number)?;
            if header_value(&header, "Message-ID").as_deref() == Some(id) {
                return Ok(number);
            }
        }

        Err(NewsError::NoSuchArticle("no such article found".to_string()))
    }

    /// Store a new article and return its assigned number
    ///
    /// Takes the group's exclusive lock, allocates the next number, writes
    /// the article to a temp file, renames it into place, and only then
    /// publishes the new number in `.seq` and appends the message-ID index.
    pub fn store_article(&self, group: &str, header: &[String], body: &[String]) -> Result<u64> {
        validate_group_name(group)?;

        let dir = self.group_dir(group);
        if !dir.join(INFO_FILE).is_file() {
            return Err(NewsError::NoSuchGroup("group does not exist".to_string()));
        }

        let lock = lock_group(&dir)?;
        let number = allocate_next_number(&dir)?;

        let mut text = String::new();
        for line in header {
            text.push_str(line);
            text.push('\n');
        }
        text.push('\n');
        for line in body {
            text.push_str(line);
            text.push('\n');
        }

        let final_path = dir.join(number.to_string());
        atomic_write(&final_path, text.as_bytes())?;

        // Publish: only now does the number become part of the range.
        atomic_write(&dir.join(SEQ_FILE), format!("{number}\n").as_bytes())?;

        if let Some(id) = header_value(header, "Message-ID") {
            let mut ids = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(IDS_FILE))?;
            writeln!(ids, "{id} {number}")?;
        }

        drop(lock);
        debug!("stored article {number} in {group}");
        Ok(number)
    }
}

/// Take the group's exclusive advisory lock (released when the file drops)
fn lock_group(dir: &Path) -> Result<fs::File> {
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(dir.join(LOCK_FILE))?;
    file.lock_exclusive()?;
    Ok(file)
}

/// Next unused article number; must be called under the group lock
///
/// Numbers are never reused: allocation starts past both the highest file
/// present and the highest number ever published in `.seq`.
fn allocate_next_number(dir: &Path) -> Result<u64> {
    let (_, highest, _) = scan_articles(dir)?;
    Ok(read_seq(dir).max(highest.unwrap_or(0)) + 1)
}

/// Lowest/highest article file numbers and total file count
fn scan_articles(dir: &Path) -> Result<(Option<u64>, Option<u64>, u64)> {
    let mut lowest = None;
    let mut highest = None;
    let mut total = 0u64;

    for number in article_numbers(dir)? {
        total += 1;
        lowest = Some(lowest.map_or(number, |l: u64| l.min(number)));
        highest = Some(highest.map_or(number, |h: u64| h.max(number)));
    }

    Ok((lowest, highest, total))
}

/// Numbers of all article files in a group directory (unsorted)
fn article_numbers(dir: &Path) -> Result<Vec<u64>> {
    let mut numbers = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        if let Some(name) = entry.file_name().to_str() {
            if let Ok(number) = name.parse::<u64>() {
                numbers.push(number);
            }
        }
    }
    Ok(numbers)
}

/// Highest published article number, 0 if nothing was ever published
fn read_seq(dir: &Path) -> u64 {
    fs::read_to_string(dir.join(SEQ_FILE))
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Write `data` to a temp file, sync, and rename it into place
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_group(root: &Path, name: &str, info: &str, articles: &[(u64, &str)]) {
        let dir = root.join(name.replace('.', "/"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(INFO_FILE), info).unwrap();
        for (number, text) in articles {
            fs::write(dir.join(number.to_string()), text).unwrap();
        }
    }

    const ARTICLE: &str = "From: a@b\nMessage-ID: <1@test>\nSubject: hi\n\nbody line\n";

    #[test]
    fn test_enumerate_nested_groups_dot_joined() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "rush.general", "", &[]);
        seed_group(tmp.path(), "rush.src", "", &[]);
        seed_group(tmp.path(), "alt", "", &[]);
        // directory without a marker is not a group, but its children are found
        fs::create_dir_all(tmp.path().join("comp/lang")).unwrap();
        fs::write(tmp.path().join("comp/lang/.info"), "").unwrap();
        // hidden directories are skipped
        fs::create_dir_all(tmp.path().join(".hidden")).unwrap();
        fs::write(tmp.path().join(".hidden/.info"), "").unwrap();

        let mut groups = Spool::new(tmp.path()).enumerate_groups();
        groups.sort();
        assert_eq!(groups, vec!["alt", "comp.lang", "rush.general", "rush.src"]);
    }

    #[test]
    fn test_load_group_range_and_metadata() {
        let tmp = TempDir::new().unwrap();
        seed_group(
            tmp.path(),
            "rush.general",
            "description = \"Rush talk\"\ncreator = \"erco@example.com\"\npostlimit = 1000\n",
            &[(5, ARTICLE), (7, ARTICLE), (10, ARTICLE)],
        );

        let group = Spool::new(tmp.path()).load_group("rush.general").unwrap();
        assert_eq!(group.start(), 5);
        assert_eq!(group.end(), 10);
        assert_eq!(group.total(), 3);
        assert!(group.post_ok()); // defaulted
        assert_eq!(group.post_limit(), 1000);
        assert_eq!(group.description(), "Rush talk");
    }

    #[test]
    fn test_load_group_empty_range_convention() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.empty", "", &[]);

        let group = Spool::new(tmp.path()).load_group("alt.empty").unwrap();
        // start == end + 1 marks the empty range
        assert_eq!(group.start(), 1);
        assert_eq!(group.end(), 0);
        assert_eq!(group.total(), 0);
    }

    #[test]
    fn test_end_follows_seq_past_expired_articles() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.test", "", &[(3, ARTICLE)]);
        fs::write(tmp.path().join("alt/test/.seq"), "9\n").unwrap();

        let group = Spool::new(tmp.path()).load_group("alt.test").unwrap();
        assert_eq!(group.start(), 3);
        assert_eq!(group.end(), 9); // advertised end survives expiry
        assert_eq!(group.total(), 1);
    }

    #[test]
    fn test_load_group_requires_marker() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("no/marker")).unwrap();

        let spool = Spool::new(tmp.path());
        assert!(matches!(
            spool.load_group("no.marker"),
            Err(NewsError::NoSuchGroup(_))
        ));
        assert!(matches!(
            spool.load_group("absent"),
            Err(NewsError::NoSuchGroup(_))
        ));
    }

    #[test]
    fn test_load_group_validates_name_first() {
        let tmp = TempDir::new().unwrap();
        let spool = Spool::new(tmp.path());
        assert!(matches!(
            spool.load_group("../escape"),
            Err(NewsError::InvalidGroupName(_))
        ));
        assert!(matches!(
            spool.load_group("bad name"),
            Err(NewsError::InvalidGroupName(_))
        ));
    }

    #[test]
    fn test_store_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.test", "", &[]);
        let spool = Spool::new(tmp.path());

        let header = vec![
            "From: poster@example.com".to_string(),
            "Message-ID: <post-1@test>".to_string(),
            "Subject: stored".to_string(),
        ];
        let body = vec!["first".to_string(), "second".to_string()];

        let number = spool.store_article("alt.test", &header, &body).unwrap();
        assert_eq!(number, 1);

        let (h, b) = spool.load_article("alt.test", 1).unwrap();
        assert_eq!(h, header);
        assert_eq!(b, body);

        let group = spool.load_group("alt.test").unwrap();
        assert_eq!((group.start(), group.end(), group.total()), (1, 1, 1));
    }

    #[test]
    fn test_load_article_missing_number_inside_range() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.test", "", &[(1, ARTICLE), (3, ARTICLE)]);

        let spool = Spool::new(tmp.path());
        assert!(matches!(
            spool.load_article("alt.test", 2),
            Err(NewsError::NoSuchArticle(_))
        ));
    }

    #[test]
    fn test_find_by_message_id_via_index_and_scan() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.test", "", &[]);
        let spool = Spool::new(tmp.path());

        let header = vec!["Message-ID: <find-me@test>".to_string()];
        let number = spool.store_article("alt.test", &header, &[]).unwrap();

        // index hit
        assert_eq!(
            spool
                .find_article_by_message_id("alt.test", "<find-me@test>")
                .unwrap(),
            number
        );

        // scan fallback with the index gone
        fs::remove_file(tmp.path().join("alt/test/.ids")).unwrap();
        assert_eq!(
            spool
                .find_article_by_message_id("alt.test", "<find-me@test>")
                .unwrap(),
            number
        );

        assert!(
            spool
                .find_article_by_message_id("alt.test", "<other@test>")
                .is_err()
        );
    }

    #[test]
    fn test_stale_index_entry_not_trusted() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.test", "", &[(2, ARTICLE)]);
        // index points at an expired number
        fs::write(tmp.path().join("alt/test/.ids"), "<1@test> 99\n").unwrap();

        let spool = Spool::new(tmp.path());
        // falls back to the scan, which finds the real article
        assert_eq!(
            spool
                .find_article_by_message_id("alt.test", "<1@test>")
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_numbers_never_reused_after_deletion() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.test", "", &[]);
        let spool = Spool::new(tmp.path());

        let header = vec!["Message-ID: <a@test>".to_string()];
        for _ in 0..3 {
            spool.store_article("alt.test", &header, &[]).unwrap();
        }
        fs::remove_file(tmp.path().join("alt/test/3")).unwrap();

        let number = spool.store_article("alt.test", &header, &[]).unwrap();
        assert_eq!(number, 4);
    }

    #[test]
    fn test_concurrent_posters_get_distinct_consecutive_numbers() {
        let tmp = TempDir::new().unwrap();
        seed_group(tmp.path(), "alt.race", "", &[]);
        let spool = Spool::new(tmp.path());

        let mut handles = Vec::new();
        for t in 0..4 {
            let spool = spool.clone();
            handles.push(std::thread::spawn(move || {
                let mut numbers = Vec::new();
                for i in 0..5 {
                    let header = vec![format!("Message-ID: <t{t}-{i}@race>")];
                    numbers.push(spool.store_article("alt.race", &header, &[]).unwrap());
                }
                numbers
            }));
        }

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        // no duplicates, no gaps
        assert_eq!(all, (1..=20).collect::<Vec<u64>>());
    }
}
