//! Reading skill lists from files or inline arguments

use crate::error::{Result, SkillMatcherError};
use crate::input::file_detector::FileType;
use log::info;
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

pub trait SkillListParser {
    fn parse(&self, content: &str) -> Result<Vec<String>>;
}

/// One label per line. Blank lines, `#` comments and list bullets are ignored.
pub struct PlainTextParser {
    bullet_regex: Regex,
}

impl PlainTextParser {
    pub fn new() -> Self {
        Self {
            bullet_regex: Regex::new(r"^(?:[-*•]|\d+[.)])\s+").expect("Invalid bullet regex"),
        }
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillListParser for PlainTextParser {
    fn parse(&self, content: &str) -> Result<Vec<String>> {
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| self.bullet_regex.replace(line, "").trim().to_string())
            .filter(|label| !label.is_empty())
            .collect())
    }
}

/// Every list item in the document, nested items included
pub struct MarkdownParser;

impl SkillListParser for MarkdownParser {
    fn parse(&self, content: &str) -> Result<Vec<String>> {
        let mut open_items: Vec<String> = Vec::new();
        let mut labels = Vec::new();

        for event in Parser::new(content) {
            match event {
                Event::Start(Tag::Item) => open_items.push(String::new()),
                Event::End(Tag::Item) => {
                    if let Some(item) = open_items.pop() {
                        let label = item.trim();
                        if !label.is_empty() {
                            labels.push(label.to_string());
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(item) = open_items.last_mut() {
                        item.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(item) = open_items.last_mut() {
                        item.push(' ');
                    }
                }
                _ => {}
            }
        }

        if labels.is_empty() {
            return PlainTextParser::new().parse(content);
        }
        Ok(labels)
    }
}

/// A JSON array of strings
pub struct JsonParser;

impl SkillListParser for JsonParser {
    fn parse(&self, content: &str) -> Result<Vec<String>> {
        let labels: Vec<String> = serde_json::from_str(content)?;
        Ok(labels
            .into_iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect())
    }
}

/// Loads skill lists, remembering files it has already read
pub struct SkillListReader {
    cache: HashMap<String, Vec<String>>,
    enable_cache: bool,
}

impl SkillListReader {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Treat `arg` as a file path if one exists, otherwise as an inline
    /// comma-separated list.
    pub async fn resolve(&mut self, arg: &str) -> Result<Vec<String>> {
        let path = Path::new(arg);
        if path.is_file() {
            self.read_file(path).await
        } else {
            Ok(Self::parse_inline(arg))
        }
    }

    pub fn parse_inline(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub async fn read_file(&mut self, path: &Path) -> Result<Vec<String>> {
        let path_str = path.to_string_lossy().to_string();

        if self.enable_cache {
            if let Some(cached) = self.cache.get(&path_str) {
                info!("Using cached skill list for: {}", path.display());
                return Ok(cached.clone());
            }
        }

        if !path.exists() {
            return Err(SkillMatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let file_type = FileType::from_path(path);
        if file_type == FileType::Unknown {
            return Err(SkillMatcherError::UnsupportedFormat(format!(
                "Unsupported skill list format: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await?;
        let labels = match file_type {
            FileType::Text => PlainTextParser::new().parse(&content)?,
            FileType::Markdown => MarkdownParser.parse(&content)?,
            FileType::Json => JsonParser.parse(&content)?,
            FileType::Unknown => unreachable!("unknown formats are rejected above"),
        };
        info!("Read {} skills from {}", labels.len(), path.display());

        if self.enable_cache {
            self.cache.insert(path_str, labels.clone());
        }

        Ok(labels)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl Default for SkillListReader {
    fn default() -> Self {
        Self::new()
    }
}
