use std::fmt;

/// A single node in the entity index.
///
/// The report and config speak the legacy string forms (`posts[author]@@@id`,
/// `NER-PERSON:name`, `PAGE-URL:url`, `thread[id]`, free-text labels); those
/// forms exist only at the parse/render boundary. Everything internal matches
/// on the variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityId {
    /// A post, keyed by post id and grouped by author for aggregation.
    Post { author: String, post_id: String },
    /// The post's author as a person entity.
    Person(String),
    /// The web page the post came from.
    PageUrl(String),
    /// Conversational thread bucket derived from the post id.
    Thread(String),
    /// Free-form extracted entity label.
    Label(String),
}

impl EntityId {
    /// Parse a legacy string form. Anything that does not spell one of the
    /// known shapes is a free-form label. Extracted labels go through this
    /// same path, so a label that happens to spell an author or page form
    /// unifies with that entity instead of producing a duplicate key.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("posts[") {
            if let Some(sep) = rest.find("]@@@") {
                return EntityId::Post {
                    author: rest[..sep].to_string(),
                    post_id: rest[sep + 4..].to_string(),
                };
            }
        }
        if let Some(name) = raw.strip_prefix("NER-PERSON:") {
            return EntityId::Person(name.to_string());
        }
        if let Some(url) = raw.strip_prefix("PAGE-URL:") {
            return EntityId::PageUrl(url.to_string());
        }
        if let Some(inner) = raw.strip_prefix("thread[").and_then(|r| r.strip_suffix(']')) {
            return EntityId::Thread(inner.to_string());
        }
        EntityId::Label(raw.to_string())
    }

    /// Author bucket for post nodes; `None` for everything else.
    pub fn post_author(&self) -> Option<&str> {
        match self {
            EntityId::Post { author, .. } => Some(author),
            _ => None,
        }
    }

    /// Human-facing name: posts render as their author bucket, prefixed kinds
    /// render their payload, labels drop anything before their first colon.
    pub fn short_name(&self) -> String {
        match self {
            EntityId::Post { author, .. } => format!("posts[{}]", author),
            EntityId::Person(name) => name.clone(),
            EntityId::PageUrl(url) => url.clone(),
            EntityId::Thread(id) => format!("thread[{}]", id),
            EntityId::Label(label) => match label.split_once(':') {
                Some((_, rest)) => rest.to_string(),
                None => label.clone(),
            },
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Post { author, post_id } => write!(f, "posts[{}]@@@{}", author, post_id),
            EntityId::Person(name) => write!(f, "NER-PERSON:{}", name),
            EntityId::PageUrl(url) => write!(f, "PAGE-URL:{}", url),
            EntityId::Thread(id) => write!(f, "thread[{}]", id),
            EntityId::Label(label) => f.write_str(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post() {
        let id = EntityId::parse("posts[alice]@@@p1_thread_42_x");
        assert_eq!(
            id,
            EntityId::Post {
                author: "alice".to_string(),
                post_id: "p1_thread_42_x".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_known_prefixes() {
        assert_eq!(
            EntityId::parse("NER-PERSON:alice"),
            EntityId::Person("alice".to_string())
        );
        assert_eq!(
            EntityId::parse("PAGE-URL:https://example.org/t"),
            EntityId::PageUrl("https://example.org/t".to_string())
        );
        assert_eq!(
            EntityId::parse("thread[42]"),
            EntityId::Thread("42".to_string())
        );
    }

    #[test]
    fn test_parse_label_fallback() {
        assert_eq!(
            EntityId::parse("entity:saussurea"),
            EntityId::Label("entity:saussurea".to_string())
        );
        // posts[ without the @@@ separator is not a post form
        assert_eq!(
            EntityId::parse("posts[alice]"),
            EntityId::Label("posts[alice]".to_string())
        );
    }

    #[test]
    fn test_display_round_trip() {
        for raw in [
            "posts[bob]@@@p9",
            "NER-PERSON:bob",
            "PAGE-URL:https://example.org",
            "thread[unknown]",
            "entity:kuth",
            "plain label",
        ] {
            assert_eq!(EntityId::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_label_spelling_person_form_unifies() {
        // an extracted label that spells the author form must land on the
        // same index key as the author entity itself
        assert_eq!(
            EntityId::parse("NER-PERSON:alice"),
            EntityId::Person("alice".to_string())
        );
    }

    #[test]
    fn test_short_name() {
        assert_eq!(
            EntityId::parse("posts[alice]@@@p1").short_name(),
            "posts[alice]"
        );
        assert_eq!(EntityId::parse("NER-PERSON:alice").short_name(), "alice");
        assert_eq!(
            EntityId::parse("PAGE-URL:https://example.org").short_name(),
            "https://example.org"
        );
        assert_eq!(EntityId::parse("thread[42]").short_name(), "thread[42]");
        assert_eq!(EntityId::parse("entity:kuth").short_name(), "kuth");
        assert_eq!(EntityId::parse("bare").short_name(), "bare");
    }
}
