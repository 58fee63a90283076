//! Match criteria for tree queries
//!
//! Criteria are structural and stateless: whether a node matches depends only
//! on what the node reports in the snapshot being walked (plus its depth below
//! the search start for depth-limited class queries).

use crate::element::Node;
use crate::errors::AutomationError;
use regex::Regex;
use std::fmt;

/// Separator between alternatives in the string form, e.g.
/// `"class:android.widget.ListView || androidx.recyclerview.widget.RecyclerView"`.
const ALTERNATIVE_SEPARATOR: &str = "||";

/// Class-name query with optional structural constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassQuery {
    pub class_names: Vec<String>,
    /// Exact depth below the search start (start node is depth 0)
    pub depth: Option<usize>,
    pub min_child_count: usize,
    pub first_child_class: Option<String>,
}

impl ClassQuery {
    pub fn new<I, S>(class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_names: class_names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn min_children(mut self, count: usize) -> Self {
        self.min_child_count = count;
        self
    }

    pub fn first_child(mut self, class_name: impl Into<String>) -> Self {
        self.first_child_class = Some(class_name.into());
        self
    }

    pub fn matches(&self, node: &Node, depth: usize) -> bool {
        let class_name = node.class_name();
        if !self.class_names.iter().any(|c| *c == class_name) {
            return false;
        }
        if self.depth.is_some_and(|limit| limit != depth) {
            return false;
        }
        let child_count = node.child_count();
        if child_count < self.min_child_count {
            return false;
        }
        match &self.first_child_class {
            None => true,
            Some(expected) => {
                child_count > 0
                    && node
                        .child(0)
                        .is_some_and(|first| first.class_name() == *expected)
            }
        }
    }
}

/// Visible-text query over a set of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextQuery {
    pub texts: Vec<String>,
    /// `true`: text must equal a candidate. `false`: text must contain one.
    pub exact: bool,
}

impl TextQuery {
    pub fn contains<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            exact: false,
        }
    }

    pub fn exact<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            exact: true,
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        match node.text() {
            Some(text) => self.matches_text(&text),
            None => false,
        }
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.texts.iter().any(|candidate| {
            if self.exact {
                text == candidate
            } else {
                text.contains(candidate.as_str())
            }
        })
    }

    /// Whether `text` equals one of the candidates verbatim.
    pub fn is_exact_hit(&self, text: &str) -> bool {
        self.texts.iter().any(|candidate| candidate == text)
    }
}

/// Regular expression applied to a node's whole text.
#[derive(Debug, Clone)]
pub struct TextPattern {
    source: String,
    anchored: Regex,
}

impl TextPattern {
    pub fn new(pattern: &str) -> Result<Self, AutomationError> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }

    pub fn matches(&self, node: &Node) -> bool {
        node.text().is_some_and(|text| self.is_match(&text))
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Ways to locate a node in a tree snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Class(ClassQuery),
    Text(TextQuery),
    /// Content description equal to the given string
    Desc(String),
    Regex(TextPattern),
    /// Unparseable criteria string, with a reason. Never matches.
    Invalid(String),
}

impl Criteria {
    pub fn class<I, S>(class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Criteria::Class(ClassQuery::new(class_names))
    }

    pub fn text<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Criteria::Text(TextQuery::contains(texts))
    }

    pub fn exact_text<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Criteria::Text(TextQuery::exact(texts))
    }

    pub fn desc(desc: impl Into<String>) -> Self {
        Criteria::Desc(desc.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, AutomationError> {
        Ok(Criteria::Regex(TextPattern::new(pattern)?))
    }

    /// Test one node. `depth` is its distance below the search start.
    pub fn matches(&self, node: &Node, depth: usize) -> bool {
        match self {
            Criteria::Class(query) => query.matches(node, depth),
            Criteria::Text(query) => query.matches(node),
            Criteria::Desc(desc) => node.content_description().as_deref() == Some(desc.as_str()),
            Criteria::Regex(pattern) => pattern.matches(node),
            Criteria::Invalid(_) => false,
        }
    }

    /// Fail fast on criteria that can never match.
    pub fn validate(&self) -> Result<(), AutomationError> {
        match self {
            Criteria::Invalid(reason) => Err(AutomationError::InvalidSelector(reason.clone())),
            Criteria::Class(query) if query.class_names.is_empty() => Err(
                AutomationError::InvalidSelector("class query without class names".to_string()),
            ),
            Criteria::Text(query) if query.texts.is_empty() => Err(
                AutomationError::InvalidSelector("text query without candidates".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Class(query) => {
                write!(f, "class:{}", query.class_names.join(" || "))?;
                if let Some(depth) = query.depth {
                    write!(f, " (depth {depth})")?;
                }
                if query.min_child_count > 0 {
                    write!(f, " (min children {})", query.min_child_count)?;
                }
                if let Some(first) = &query.first_child_class {
                    write!(f, " (first child {first})")?;
                }
                Ok(())
            }
            Criteria::Text(query) if query.exact => write!(f, "exact:{}", query.texts.join(" || ")),
            Criteria::Text(query) => write!(f, "text:{}", query.texts.join(" || ")),
            Criteria::Desc(desc) => write!(f, "desc:{desc}"),
            Criteria::Regex(pattern) => write!(f, "regex:{}", pattern.as_str()),
            Criteria::Invalid(reason) => write!(f, "invalid({reason})"),
        }
    }
}

impl From<&str> for Criteria {
    fn from(s: &str) -> Self {
        fn alternatives(list: &str) -> Vec<String> {
            list.split(ALTERNATIVE_SEPARATOR)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        }

        fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
            let head = s.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| &s[prefix.len()..])
        }

        let s = s.trim();
        let criteria = if let Some(rest) = strip_prefix_ci(s, "class:") {
            Criteria::class(alternatives(rest))
        } else if let Some(rest) = strip_prefix_ci(s, "exact:") {
            Criteria::exact_text(alternatives(rest))
        } else if let Some(rest) = strip_prefix_ci(s, "text:") {
            Criteria::text(alternatives(rest))
        } else if let Some(rest) = strip_prefix_ci(s, "desc:") {
            Criteria::desc(rest)
        } else if let Some(rest) = strip_prefix_ci(s, "regex:") {
            match TextPattern::new(rest) {
                Ok(pattern) => Criteria::Regex(pattern),
                Err(e) => Criteria::Invalid(e.to_string()),
            }
        } else if s.is_empty() {
            Criteria::Invalid("empty criteria string".to_string())
        } else {
            Criteria::text([s])
        };
        match criteria.validate() {
            Ok(()) => criteria,
            Err(AutomationError::InvalidSelector(reason)) => Criteria::Invalid(reason),
            Err(e) => Criteria::Invalid(e.to_string()),
        }
    }
}

impl From<ClassQuery> for Criteria {
    fn from(query: ClassQuery) -> Self {
        Criteria::Class(query)
    }
}

impl From<TextQuery> for Criteria {
    fn from(query: TextQuery) -> Self {
        Criteria::Text(query)
    }
}
