use std::fmt;

/// How an attribute value is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOp {
    /// `[name='value']`
    Equals,
    /// `[name*='value']`
    Contains,
    /// `[name^='value']`
    Prefix,
}

/// A single `[name op 'value']` condition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeMatch {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttributeMatch {
    pub fn new(name: impl Into<String>, op: AttrOp, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    /// Check an element's actual attribute value against this condition
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            AttrOp::Equals => actual == self.value,
            AttrOp::Contains => actual.contains(&self.value),
            AttrOp::Prefix => actual.starts_with(&self.value),
        }
    }
}

/// Represents ways to locate a DOM element
///
/// This is a deliberately small subset of CSS: a tag, attribute conditions,
/// and the descendant and child combinators. Every engine must be able to
/// evaluate it, including ones that cannot hand the string to a real browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Select by optional tag name plus attribute conditions
    Element {
        tag: Option<String>,
        attributes: Vec<AttributeMatch>,
    },
    /// Chain step matched only among the direct children of the previous step's matches
    Child(Box<Selector>),
    /// Each step is searched among the descendants of the previous matches,
    /// or among their children for a [`Selector::Child`] step
    Chain(Vec<Selector>),
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl Selector {
    pub fn tag(tag: impl Into<String>) -> Self {
        Selector::Element {
            tag: Some(tag.into()),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute condition. Chains get it on their last step.
    pub fn with_attr(self, name: impl Into<String>, op: AttrOp, value: impl Into<String>) -> Self {
        match self {
            Selector::Element { tag, mut attributes } => {
                attributes.push(AttributeMatch::new(name, op, value));
                Selector::Element { tag, attributes }
            }
            Selector::Child(inner) => Selector::Child(Box::new(inner.with_attr(name, op, value))),
            Selector::Chain(mut steps) => {
                if let Some(last) = steps.pop() {
                    steps.push(last.with_attr(name, op, value));
                }
                Selector::Chain(steps)
            }
            invalid @ Selector::Invalid(_) => invalid,
        }
    }

    /// Append a descendant step, flattening chains
    pub fn descendant(self, next: Selector) -> Self {
        let mut steps = match self {
            Selector::Chain(steps) => steps,
            s => vec![s],
        };
        match next {
            Selector::Chain(mut more) => steps.append(&mut more),
            s => steps.push(s),
        }
        Selector::Chain(steps)
    }

    /// Append a step that must be a direct child of the current last step
    pub fn child(self, next: Selector) -> Self {
        let next = match next {
            Selector::Chain(mut more) if !more.is_empty() => {
                let first = more.remove(0);
                more.insert(0, first.into_child());
                Selector::Chain(more)
            }
            s => s.into_child(),
        };
        self.descendant(next)
    }

    fn into_child(self) -> Self {
        match self {
            child @ (Selector::Child(_) | Selector::Invalid(_)) => child,
            s => Selector::Child(Box::new(s)),
        }
    }

    /// The steps of this selector in order; a single element selector is one step
    pub fn steps(&self) -> Vec<&Selector> {
        match self {
            Selector::Chain(steps) => steps.iter().flat_map(|s| s.steps()).collect(),
            s => vec![s],
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Selector::Element { tag, attributes } => {
                let mut css = tag.clone().unwrap_or_default();
                for attr in attributes {
                    let op = match attr.op {
                        AttrOp::Equals => "=",
                        AttrOp::Contains => "*=",
                        AttrOp::Prefix => "^=",
                    };
                    css.push_str(&format!(
                        "[{}{}'{}']",
                        attr.name,
                        op,
                        attr.value.replace('\'', "\\'")
                    ));
                }
                if css.is_empty() {
                    css.push('*');
                }
                css
            }
            Selector::Child(inner) => format!(">{}", inner.to_css()),
            Selector::Chain(steps) => {
                let mut css = String::new();
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 && !matches!(step, Selector::Child(_)) {
                        css.push(' ');
                    }
                    css.push_str(&step.to_css());
                }
                css
            }
            Selector::Invalid(reason) => format!("<invalid: {reason}>"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        let mut steps = Vec::new();
        let mut chars = s.trim().chars().peekable();

        let mut child = false;
        while chars.peek().is_some() {
            let mut tag = String::new();
            let mut attributes = Vec::new();

            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '[' || c == '>' {
                    break;
                }
                tag.push(c);
                chars.next();
            }

            while chars.peek() == Some(&'[') {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if matches!(c, '=' | '*' | '^' | ']') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                let op = match chars.next() {
                    Some('=') => AttrOp::Equals,
                    Some('*') if chars.next() == Some('=') => AttrOp::Contains,
                    Some('^') if chars.next() == Some('=') => AttrOp::Prefix,
                    _ => {
                        return Selector::Invalid(format!(
                            "Expected an attribute comparison in \"{s}\""
                        ))
                    }
                };
                if chars.next() != Some('\'') {
                    return Selector::Invalid(format!("Attribute values must be quoted in \"{s}\""));
                }
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        Some('\'') => break,
                        Some(c) => value.push(c),
                        None => {
                            return Selector::Invalid(format!("Unterminated quote in \"{s}\""))
                        }
                    }
                }
                if chars.next() != Some(']') {
                    return Selector::Invalid(format!("Missing ']' in \"{s}\""));
                }
                attributes.push(AttributeMatch::new(name.trim(), op, value));
            }

            if tag.is_empty() && attributes.is_empty() {
                return Selector::Invalid(format!("Unexpected character in \"{s}\""));
            }
            let step = Selector::Element {
                tag: (!tag.is_empty() && tag != "*").then_some(tag),
                attributes,
            };
            steps.push(if child { step.into_child() } else { step });

            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            child = chars.peek() == Some(&'>');
            if child {
                chars.next();
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_none() {
                    return Selector::Invalid(format!("Dangling '>' in \"{s}\""));
                }
            }
        }

        match steps.len() {
            0 => Selector::Invalid("Empty selector".to_string()),
            1 => steps.remove(0),
            _ => Selector::Chain(steps),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}
