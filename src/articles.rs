use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Summary length cap for the article list.
const SUMMARY_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
}

/// List all blog articles in the directory, most recent first.
pub fn list_articles(dir: &str) -> Result<Vec<ArticleSummary>> {
    let path = Path::new(dir);
    let mut articles = Vec::new();

    if !path.is_dir() {
        return Ok(articles);
    }

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_path = entry.path();
        if !file_path.is_file() || file_path.extension() != Some(std::ffi::OsStr::new("md")) {
            continue;
        }
        if let Some(article) = read_article(&file_path)? {
            articles.push(ArticleSummary {
                id: article.id,
                title: article.title,
                summary: summarize(&article.content),
                published_at: article.published_at,
            });
        }
    }

    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(articles)
}

/// Load a single article by id (the file stem). Returns None when missing.
pub fn get_article(dir: &str, id: &str) -> Result<Option<Article>> {
    // Ids come from URLs; anything path-like is not an article id.
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Ok(None);
    }

    let file_path = Path::new(dir).join(format!("{}.md", id));
    if !file_path.is_file() {
        return Ok(None);
    }

    read_article(&file_path)
}

fn read_article(file_path: &PathBuf) -> Result<Option<Article>> {
    let id = match file_path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem.to_string(),
        None => return Ok(None),
    };

    let raw = fs::read_to_string(file_path)?;
    let published_at = date_from_content(&raw)
        .or_else(|| mtime(file_path))
        .unwrap_or_else(Utc::now);

    let (title, content) = parse_markdown(&raw, &id);

    Ok(Some(Article {
        id,
        title,
        content,
        published_at,
    }))
}

/// Title is the first `# ` heading (else the id); content is everything
/// except the heading and `date:` metadata lines.
fn parse_markdown(raw: &str, fallback_title: &str) -> (String, String) {
    let mut title = None;
    let mut body_lines = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if title.is_none() && trimmed.starts_with("# ") {
            title = Some(trimmed.trim_start_matches("# ").trim().to_string());
            continue;
        }
        if trimmed.to_lowercase().starts_with("date:") {
            continue;
        }
        body_lines.push(line);
    }

    (
        title.unwrap_or_else(|| fallback_title.to_string()),
        body_lines.join("\n").trim().to_string(),
    )
}

/// Pick the first non-heading paragraph, capped at SUMMARY_MAX_LEN chars.
fn summarize(content: &str) -> String {
    let paragraph = content
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .unwrap_or("");

    if paragraph.chars().count() <= SUMMARY_MAX_LEN {
        return paragraph.to_string();
    }

    let truncated: String = paragraph.chars().take(SUMMARY_MAX_LEN).collect();
    format!("{}...", truncated.trim_end())
}

fn date_from_content(raw: &str) -> Option<DateTime<Utc>> {
    for line in raw.lines().take(10) {
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("date:").or_else(|| trimmed.strip_prefix("Date:")) {
            let value = value.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
            }
        }
    }
    None
}

fn mtime(path: &PathBuf) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_article(dir: &Path, name: &str, content: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        write!(f, "{}", content).unwrap();
    }

    #[test]
    fn test_parse_title_and_body() {
        let raw = "# Mon titre\ndate: 2023-09-01\n\nPremier paragraphe.\n\nSecond paragraphe.";
        let (title, content) = parse_markdown(raw, "fallback");
        assert_eq!(title, "Mon titre");
        assert!(content.starts_with("Premier paragraphe."));
        assert!(!content.contains("date:"));
    }

    #[test]
    fn test_title_falls_back_to_id() {
        let (title, _) = parse_markdown("Pas de titre ici.", "mon-article");
        assert_eq!(title, "mon-article");
    }

    #[test]
    fn test_summary_skips_headings_and_truncates() {
        let long = "mot ".repeat(100);
        let content = format!("## Sous-titre\n\n{}", long);
        let summary = summarize(&content);
        assert!(!summary.starts_with('#'));
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= SUMMARY_MAX_LEN + 3);
    }

    #[test]
    fn test_date_from_content() {
        let dt = date_from_content("# T\ndate: 2023-09-01\n\ncorps").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2023-09-01");

        let dt = date_from_content("date: 2023-09-01T10:00:00Z").unwrap();
        assert_eq!(dt.format("%H").to_string(), "10");
    }

    #[test]
    fn test_list_sorted_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        write_article(dir.path(), "ancien.md", "# Ancien\ndate: 2023-01-01\n\nVieux contenu.");
        write_article(dir.path(), "recent.md", "# Récent\ndate: 2024-06-01\n\nNouveau contenu.");
        write_article(dir.path(), "notes.txt", "pas un article");

        let list = list_articles(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "recent");
        assert_eq!(list[1].id, "ancien");
    }

    #[test]
    fn test_get_article_by_id() {
        let dir = tempfile::tempdir().unwrap();
        write_article(dir.path(), "guide.md", "# Guide\n\nContenu du guide.");

        let dir_str = dir.path().to_str().unwrap();
        let article = get_article(dir_str, "guide").unwrap().unwrap();
        assert_eq!(article.title, "Guide");
        assert!(get_article(dir_str, "absent").unwrap().is_none());
        assert!(get_article(dir_str, "../guide").unwrap().is_none());
    }

    #[test]
    fn test_missing_dir_is_empty_list() {
        assert!(list_articles("/nonexistent/articles").unwrap().is_empty());
    }
}
