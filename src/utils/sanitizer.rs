use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::sentence::truncate_sentences;

/// Maximum sentences kept in a cleaned response.
const MAX_SENTENCES: usize = 3;

/// Responses shorter than this after cleanup get replaced by a fallback.
const MIN_RESPONSE_LEN: usize = 10;

/// Coordination artifacts the team model sometimes leaks into its answer.
const COORDINATION_PHRASES: [&str; 7] = [
    "Je vais transmettre",
    "Je transmets",
    "notre Commercial Agent",
    "notre agent",
    "l'agent",
    "Ta question semble",
    "Attend une réponse",
];

/// Leftover call-to-action fragments once the scheduling link is removed.
const LINK_PHRASES: [&str; 6] = [
    "via ce lien :",
    "directement via ce lien :",
    "en cliquant sur ce lien :",
    "cliquez sur ce lien :",
    "Prendre rendez-vous ici :",
    "Pour maximiser cet échange, je vous invite à planifier une consultation :",
];

pub const GENERIC_FALLBACK: &str =
    "Je vous invite à prendre rendez-vous pour discuter de votre projet.";

/// Canned definitions returned when cleanup leaves nothing usable
/// but the query was about a known technical topic.
const TECH_DEFINITIONS: [(&str, &str); 3] = [
    (
        "agentic",
        "L'IA agentique désigne des systèmes capables de planifier et d'exécuter \
         des tâches de façon autonome, en enchaînant raisonnement et outils. \
         C'est l'un des domaines d'expertise de Lucas Bometon.",
    ),
    (
        "rag",
        "Le RAG (Retrieval-Augmented Generation) combine une recherche documentaire \
         avec un modèle de langage pour produire des réponses ancrées dans une base \
         de connaissances. Lucas l'utilise pour fiabiliser les assistants IA.",
    ),
    (
        "ia générative",
        "L'IA générative produit du texte, des images ou du code à partir de modèles \
         entraînés sur de grands corpus. Lucas conçoit des expériences utilisateur \
         autour de ces modèles.",
    ),
];

fn calendly_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // [texte](https://calendly.com/...) with an optional leading space;
        // dot matches newlines so links wrapped across lines go too.
        RegexBuilder::new(r"\s?\[[^\]]+\]\((?:https?://calendly\.com[^)]+)\)")
            .dot_matches_new_line(true)
            .build()
            .unwrap()
    })
}

fn multi_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

fn orphan_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([?.!,:])").unwrap())
}

/// Clean raw model output before it goes back to the client.
///
/// The pipeline unwraps JSON-in-string payloads, strips coordination
/// chatter and scheduling links, normalizes whitespace and truncates to
/// three sentences. It never fails: anything unexpected falls back to the
/// stringified input, and an empty result becomes a canned sentence
/// (keyword-specific when the query was about a known topic).
pub fn clean_response(raw: &str, query: &str) -> String {
    let mut content = unwrap_json_content(raw);

    for phrase in COORDINATION_PHRASES {
        content = content.replace(phrase, "");
    }

    // Drop exclamation-separated transition segments that still talk about
    // routing ("je transmets", "agent", "attend").
    let segments: Vec<&str> = content
        .split('!')
        .filter(|seg| {
            let lower = seg.to_lowercase();
            !["transmets", "agent", "attend"]
                .iter()
                .any(|marker| lower.contains(marker))
        })
        .collect();
    content = segments.join("!");

    content = calendly_link_re().replace_all(&content, "").into_owned();
    for phrase in LINK_PHRASES {
        content = content.replace(phrase, "");
    }

    content = multi_space_re().replace_all(&content, " ").into_owned();
    content = orphan_punct_re().replace_all(&content, "$1").into_owned();
    content = content.trim().to_string();

    content = truncate_sentences(&content, MAX_SENTENCES);

    if content.len() < MIN_RESPONSE_LEN {
        warn!("Response empty after cleanup, substituting fallback (raw: {:?})", raw);
        return fallback_for(query);
    }

    content
}

/// Pick the fallback sentence for a query: a canned technical definition
/// when the query names a known topic, the generic invitation otherwise.
pub fn fallback_for(query: &str) -> String {
    let lower = query.to_lowercase();
    for (keyword, definition) in TECH_DEFINITIONS {
        if lower.contains(keyword) {
            return definition.to_string();
        }
    }
    GENERIC_FALLBACK.to_string()
}

/// The team model occasionally returns its structured output serialized
/// into the content string. Unwrap `{"response": ...}` / `{"content": ...}`
/// shapes, tolerating single-quoted pseudo-JSON; keep the input otherwise.
fn unwrap_json_content(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    let candidates = [trimmed.to_string(), trimmed.replace('\'', "\"")];
    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) {
            for key in ["response", "content"] {
                if let Some(inner) = value.get(key).and_then(|v| v.as_str()) {
                    return inner.to_string();
                }
            }
        }
    }

    trimmed.to_string()
}
