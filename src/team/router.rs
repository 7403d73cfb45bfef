use super::descriptors::AgentKind;

/// Routing decision for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// General-knowledge question outside the portfolio's scope;
    /// answered with the canned refusal, no model call.
    OffTopic,
    /// On-topic query assigned to an agent, with the hint-tagged query
    /// that goes into the prompt.
    Agent {
        kind: AgentKind,
        tagged_query: String,
    },
}

/// French general-knowledge markers. A query matching one of these with no
/// on-topic marker is refused.
const OFF_TOPIC_KEYWORDS: [&str; 10] = [
    "distance terre",
    "terre-lune",
    "la lune",
    "météo",
    "meteo",
    "recette",
    "capitale",
    "horoscope",
    "football",
    "combien font",
];

/// Markers that keep a query in scope even when an off-topic word appears.
const ON_TOPIC_KEYWORDS: [&str; 12] = [
    "lucas",
    "bometon",
    "portfolio",
    "projet",
    "design",
    "agentic",
    "agentique",
    "ia générative",
    "intelligence artificielle",
    "rendez-vous",
    "expertise",
    "contact",
];

/// Sales-intent markers routed to the commercial agent.
const COMMERCIAL_KEYWORDS: [&str; 7] = [
    "projet",
    "rdv",
    "rendez-vous",
    "devis",
    "tarif",
    "mission",
    "accompagnement",
];

/// Technical-topic markers routed to the info agent.
const INFO_KEYWORDS: [&str; 7] = [
    "agentic",
    "agentique",
    "ia générative",
    "intelligence artificielle",
    "ai design",
    "ux",
    "llm",
];

/// Biography markers routed to the presentation agent.
const PRESENTATION_KEYWORDS: [&str; 4] = ["qui est", "parcours", "présente", "lucas"];

const COMMERCIAL_SUFFIX: &str = "QUALIFICATION DE PROJET";

/// Decide which agent answers a query.
///
/// This is a priority-ordered rule list over substrings, not a classifier;
/// ties break by rule order. `continues_commercial_session` is resolved by
/// the caller from the session store (a session with prior messages stays
/// with the commercial agent).
pub fn route(query: &str, continues_commercial_session: bool) -> Route {
    let lower = query.to_lowercase();

    if is_off_topic(&lower) {
        return Route::OffTopic;
    }

    if continues_commercial_session {
        return commercial_route(query);
    }

    if query.contains("COMMERCIAL") || lower.contains("[commercial]") {
        return commercial_route(query);
    }

    // Hint prefixes set by the dedicated endpoints.
    if query.contains("[PRÉSENTATION]") {
        return Route::Agent {
            kind: AgentKind::Presentation,
            tagged_query: query.to_string(),
        };
    }
    if query.contains("[PROJET]") {
        return Route::Agent {
            kind: AgentKind::Project,
            tagged_query: query.to_string(),
        };
    }
    if query.contains("[INFO]") {
        return Route::Agent {
            kind: AgentKind::Info,
            tagged_query: query.to_string(),
        };
    }

    if matches_any(&lower, &COMMERCIAL_KEYWORDS) {
        return commercial_route(query);
    }

    if matches_any(&lower, &INFO_KEYWORDS) {
        return Route::Agent {
            kind: AgentKind::Info,
            tagged_query: format!("[INFO] {}", query),
        };
    }

    if matches_any(&lower, &PRESENTATION_KEYWORDS) {
        return Route::Agent {
            kind: AgentKind::Presentation,
            tagged_query: format!("[PRÉSENTATION] {}", query),
        };
    }

    Route::Agent {
        kind: AgentKind::General,
        tagged_query: query.to_string(),
    }
}

fn commercial_route(query: &str) -> Route {
    let mut tagged = if query.starts_with("[COMMERCIAL]") {
        query.to_string()
    } else {
        format!("[COMMERCIAL] {}", query)
    };
    if !tagged.ends_with(COMMERCIAL_SUFFIX) {
        tagged.push_str(" - ");
        tagged.push_str(COMMERCIAL_SUFFIX);
    }

    Route::Agent {
        kind: AgentKind::Commercial,
        tagged_query: tagged,
    }
}

fn is_off_topic(lower: &str) -> bool {
    matches_any(lower, &OFF_TOPIC_KEYWORDS) && !matches_any(lower, &ON_TOPIC_KEYWORDS)
}

/// Substring match for phrases, whole-token match for short keywords
/// ("ux" must not match inside other words).
fn matches_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| {
        if kw.chars().count() <= 3 {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| token == *kw)
        } else {
            lower.contains(kw)
        }
    })
}
