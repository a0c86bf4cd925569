//! Summary/body extraction from a fetched page.

use anyhow::Result;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;

use super::normalize::Normalize;
use crate::{ExtractedRecord, FetchOutcome, FetchStatus};

/// Bracketed numeric citation markers, e.g. `[12]`.
const CITATION_PATTERN: &str = r"\[[0-9]+\]";
/// Paragraph-level blocks.
const BLOCK_SELECTOR: &str = "p";

/// Turns a page into an [`ExtractedRecord`]. Stateless apart from compiled patterns, so one
/// instance is shared by all workers; for a given body the result is always the same.
pub struct Extractor {
    blocks: Selector,
    citations: Regex,
    normalizer: Arc<dyn Normalize>,
}

impl Extractor {
    pub fn new(normalizer: Arc<dyn Normalize>) -> Result<Self> {
        let blocks = Selector::parse(BLOCK_SELECTOR)
            .map_err(|e| anyhow::anyhow!("invalid block selector {BLOCK_SELECTOR:?}: {e}"))?;
        let citations = Regex::new(CITATION_PATTERN)?;
        Ok(Self {
            blocks,
            citations,
            normalizer,
        })
    }

    /// `None` when the fetch did not succeed or the page has fewer than two usable blocks.
    pub fn extract(&self, outcome: &FetchOutcome) -> Option<ExtractedRecord> {
        match &outcome.status {
            FetchStatus::Ok(body) => self.extract_html(body),
            FetchStatus::HttpError(_) | FetchStatus::TransportError(_) => None,
        }
    }

    pub fn extract_html(&self, html: &str) -> Option<ExtractedRecord> {
        split_blocks(self.text_blocks(html))
    }

    /// Non-empty paragraph texts in document order: citations stripped, normalized once, trimmed.
    pub fn text_blocks(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.blocks)
            .filter_map(|p| {
                let raw: String = p.text().collect();
                let stripped = self.citations.replace_all(&raw, "");
                let text = self.normalizer.normalize(&stripped).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .collect()
    }
}

/// First non-empty block is the summary, the rest joined by one space is the body.
/// All-or-nothing: fewer than two non-empty blocks gives `None`.
pub fn split_blocks(blocks: Vec<String>) -> Option<ExtractedRecord> {
    let mut blocks = blocks.into_iter().filter(|b| !b.is_empty());
    let summary = blocks.next()?;
    let rest: Vec<String> = blocks.collect();
    if rest.is_empty() {
        return None;
    }
    Some(ExtractedRecord {
        summary,
        body: rest.join(" "),
    })
}
