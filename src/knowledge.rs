use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{error, info, warn};

/// Paragraphs shorter than this are skipped at load time.
const MIN_PARAGRAPH_LEN: usize = 10;

/// Default number of documents returned by a search.
const DEFAULT_TOP_K: usize = 5;

/// Keywords marking a paragraph as project material, searched first.
const PROJECT_KEYWORDS: [&str; 3] = ["projet", "réalisation", "application"];

/// Minimal built-in knowledge used when no markdown files load.
const DEFAULT_KNOWLEDGE: &str = "Lucas Bometon est un Lead IA Designer et expert en \
    innovation digitale. L'intelligence artificielle et l'expérience utilisateur \
    s'entrelacent dans son travail pour réinventer l'interaction homme-machine.";

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub source: String,
    pub project_info: bool,
}

/// In-memory searchable store over the portfolio markdown files.
///
/// Search is keyword-overlap scoring, not embeddings: good enough to feed
/// a couple of relevant paragraphs into the model prompt.
pub struct KnowledgeBase {
    documents: Vec<Document>,
}

impl KnowledgeBase {
    /// Load every markdown file under the given directories.
    /// Missing directories are skipped; an empty result falls back to the
    /// built-in snippet so the agents always have something to cite.
    pub fn load(dirs: &[&str]) -> Self {
        let mut documents = Vec::new();

        for dir in dirs {
            match load_markdown_dir(dir) {
                Ok(mut docs) => {
                    info!("Loaded {} knowledge documents from {}", docs.len(), dir);
                    documents.append(&mut docs);
                }
                Err(e) => warn!("Skipping knowledge dir {}: {}", dir, e),
            }
        }

        if documents.is_empty() {
            warn!("No markdown knowledge found, loading built-in default");
            documents.push(Document {
                content: DEFAULT_KNOWLEDGE.to_string(),
                source: "builtin".to_string(),
                project_info: false,
            });
        }

        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Append a document at runtime (uploaded notes land here).
    pub fn add(&mut self, content: &str, source: &str) {
        let lower = content.to_lowercase();
        self.documents.push(Document {
            content: content.to_string(),
            source: source.to_string(),
            project_info: PROJECT_KEYWORDS.iter().any(|kw| lower.contains(kw)),
        });
    }

    /// Top-k documents by keyword overlap with the query.
    /// Project-flagged documents win ties.
    pub fn search(&self, query: &str, k: usize) -> Vec<&Document> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.chars().count() > 2)
            .map(|t| t.to_string())
            .collect();

        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .map(|doc| {
                let content = doc.content.to_lowercase();
                let score = terms.iter().filter(|t| content.contains(t.as_str())).count();
                (score, doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.project_info.cmp(&a.1.project_info))
        });

        scored.into_iter().take(k).map(|(_, doc)| doc).collect()
    }

    /// Relevant paragraphs joined into a single context block for the prompt.
    pub fn relevant_context(&self, query: &str) -> String {
        self.search(query, DEFAULT_TOP_K)
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn load_markdown_dir(dir: &str) -> Result<Vec<Document>> {
    let path = Path::new(dir);
    if !path.is_dir() {
        return Err(anyhow::anyhow!("not a directory"));
    }

    let mut documents = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_path = entry.path();
        if !file_path.is_file() || file_path.extension() != Some(std::ffi::OsStr::new("md")) {
            continue;
        }

        let source = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match fs::read_to_string(&file_path) {
            Ok(content) => {
                for paragraph in content.split("\n\n") {
                    let trimmed = paragraph.trim();
                    if trimmed.len() <= MIN_PARAGRAPH_LEN {
                        continue;
                    }
                    let lower = trimmed.to_lowercase();
                    documents.push(Document {
                        content: trimmed.to_string(),
                        source: source.clone(),
                        project_info: PROJECT_KEYWORDS.iter().any(|kw| lower.contains(kw)),
                    });
                }
            }
            Err(e) => error!("Failed to read {}: {}", source, e),
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_with(paragraphs: &[&str]) -> KnowledgeBase {
        let mut kb = KnowledgeBase { documents: Vec::new() };
        for (i, p) in paragraphs.iter().enumerate() {
            kb.add(p, &format!("doc{}", i));
        }
        kb
    }

    #[test]
    fn test_search_scores_keyword_overlap() {
        let kb = base_with(&[
            "Lucas Bometon conçoit des expériences IA centrées utilisateur.",
            "Recette de cuisine sans rapport avec le portfolio.",
        ]);
        let results = kb.search("expériences IA utilisateur", 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("Lucas"));
    }

    #[test]
    fn test_project_documents_win_ties() {
        let kb = base_with(&[
            "Lucas travaille sur l'IA générative au quotidien.",
            "Projet IA générative livré en 2024 pour une banque.",
        ]);
        let results = kb.search("ia générative", 2);
        assert!(results[0].project_info);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let kb = base_with(&["Un document quelconque sur le design."]);
        assert!(kb.search("", 5).is_empty());
        assert!(kb.search("un le de", 5).is_empty());
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let kb = KnowledgeBase::load(&["/nonexistent/portfolio"]);
        assert!(!kb.is_empty());
        assert_eq!(kb.len(), 1);
        assert!(kb.relevant_context("Lucas Bometon designer").contains("Lucas Bometon"));
    }

    #[test]
    fn test_load_splits_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("cv.md")).unwrap();
        writeln!(
            f,
            "# Lucas\n\nLead IA Designer depuis dix ans.\n\ncourt\n\nProjet de refonte UX livré en 2023."
        )
        .unwrap();
        drop(f);

        let kb = KnowledgeBase::load(&[dir.path().to_str().unwrap()]);
        // "court" is below the length threshold
        assert_eq!(kb.len(), 2);
        assert!(kb.documents.iter().any(|d| d.project_info));
    }
}
