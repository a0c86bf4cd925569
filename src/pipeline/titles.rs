//! Title source: walks the dump root and yields one outcome per title line, skipped file or
//! unreadable entry.

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::tools::has_dump_prefix;

/// One item from the dump.
#[derive(Debug, PartialEq, Eq)]
pub enum TitleOutcome {
    Title(String),
    /// A line that is not a JSON object with a string `title`.
    Malformed {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    /// File whose name lacks the dump prefix.
    SkippedFile(PathBuf),
    /// Walk or read error for an entry.
    Err { msg: String, path: Option<PathBuf> },
}

/// Only `title` is read; other fields are ignored.
#[derive(Deserialize)]
struct DumpLine {
    title: String,
}

/// Parse one dump line into its title.
pub fn parse_title_line(line: &str) -> Result<String> {
    let parsed: DumpLine = serde_json::from_str(line).context("invalid dump line")?;
    Ok(parsed.title)
}

/// Dump root plus the file-name prefix that marks dump shards.
pub struct TitleSource {
    root: PathBuf,
    file_prefix: String,
}

impl TitleSource {
    /// Fails when `root` cannot be listed at all; that aborts the run before any worker starts.
    pub fn open(root: &Path, file_prefix: &str) -> Result<Self> {
        std::fs::read_dir(root)
            .with_context(|| format!("read input directory {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            file_prefix: file_prefix.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the root (sorted by file name) and yield every outcome in order.
    pub fn titles(&self) -> impl Iterator<Item = TitleOutcome> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .flat_map(move |r| self.outcomes_for(r))
    }

    fn outcomes_for(
        &self,
        r: std::result::Result<walkdir::DirEntry, walkdir::Error>,
    ) -> Box<dyn Iterator<Item = TitleOutcome>> {
        let entry = match r {
            Ok(entry) => entry,
            Err(err) => {
                return Box::new(std::iter::once(TitleOutcome::Err {
                    msg: format!("{}", err),
                    path: err.path().map(PathBuf::from),
                }));
            }
        };
        if !entry.file_type().is_file() {
            return Box::new(std::iter::empty());
        }
        let path = entry.into_path();
        if !has_dump_prefix(&path, &self.file_prefix) {
            return Box::new(std::iter::once(TitleOutcome::SkippedFile(path)));
        }
        match File::open(&path) {
            Ok(file) => {
                debug!("Processing file = {}", path.display());
                Box::new(read_titles(BufReader::new(file), path))
            }
            Err(e) => Box::new(std::iter::once(TitleOutcome::Err {
                msg: format!("{}", e),
                path: Some(path),
            })),
        }
    }
}

/// Titles from one dump file. Blank lines are ignored; bad lines become `Malformed`; a read
/// error other than invalid UTF-8 ends the file.
pub fn read_titles<R: BufRead>(reader: R, path: PathBuf) -> impl Iterator<Item = TitleOutcome> {
    DumpLines {
        lines: reader.lines(),
        path,
        line_no: 0,
        done: false,
    }
}

struct DumpLines<R> {
    lines: Lines<R>,
    path: PathBuf,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> Iterator for DumpLines<R> {
    type Item = TitleOutcome;

    fn next(&mut self) -> Option<TitleOutcome> {
        while !self.done {
            let line = self.lines.next()?;
            self.line_no += 1;
            match line {
                Ok(l) if l.trim().is_empty() => continue,
                Ok(l) => {
                    return Some(match parse_title_line(&l) {
                        Ok(title) => TitleOutcome::Title(title),
                        Err(e) => TitleOutcome::Malformed {
                            path: self.path.clone(),
                            line: self.line_no,
                            msg: format!("{:#}", e),
                        },
                    });
                }
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Some(TitleOutcome::Malformed {
                        path: self.path.clone(),
                        line: self.line_no,
                        msg: format!("{}", e),
                    });
                }
                Err(e) => {
                    self.done = true;
                    return Some(TitleOutcome::Err {
                        msg: format!("{}", e),
                        path: Some(self.path.clone()),
                    });
                }
            }
        }
        None
    }
}
