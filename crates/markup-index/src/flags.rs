//! Advisory node flags
//!
//! Flags are cheap hints for the relevance oracle. They are matched
//! case-insensitively against the tag, the literal text and the attribute
//! names of an element and never influence patching directly.

use crate::types::NodeFlag;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

struct FlagRule {
    flag: NodeFlag,
    tag: Option<Regex>,
    text: Option<Regex>,
    attribute: Option<Regex>,
}

fn rule(flag: NodeFlag, tag: Option<&str>, text: Option<&str>, attribute: Option<&str>) -> FlagRule {
    let compile = |pattern: &str| Regex::new(&format!("(?i){pattern}")).ok();
    FlagRule {
        flag,
        tag: tag.and_then(compile),
        text: text.and_then(compile),
        attribute: attribute.and_then(compile),
    }
}

static FLAG_RULES: Lazy<Vec<FlagRule>> = Lazy::new(|| {
    vec![
        rule(
            NodeFlag::ActionableControl,
            Some(r"^(button|a|link|navlink|iconbutton|menuitem)$|button$"),
            None,
            Some(r"^(onclick|onpress|onsubmit|href|to)$"),
        ),
        rule(
            NodeFlag::AuthTerm,
            Some(r"(login|logout|signin|signup|auth)"),
            Some(r"\b(sign[ -]?in|sign[ -]?up|sign[ -]?out|log[ -]?in|log[ -]?out|register|password|auth\w*)\b"),
            None,
        ),
        rule(
            NodeFlag::FormField,
            Some(r"^(input|textarea|select|option|form|label|checkbox|textfield)$"),
            None,
            Some(r"^(onchange|value|placeholder)$"),
        ),
        rule(
            NodeFlag::Navigation,
            Some(r"^(nav|navlink|link|navbar|menu|header|footer)$"),
            None,
            None,
        ),
        rule(NodeFlag::Heading, Some(r"^h[1-6]$|^heading$|^title$"), None, None),
        rule(NodeFlag::Image, Some(r"^(img|image|svg|picture|avatar|icon)$"), None, Some(r"^(src|alt)$")),
    ]
});

/// Compute the advisory flag set for an element
pub fn compute_flags(tag: &str, text: &str, attributes: &[String]) -> BTreeSet<NodeFlag> {
    let mut flags = BTreeSet::new();
    for rule in FLAG_RULES.iter() {
        let tag_hit = rule.tag.as_ref().is_some_and(|re| re.is_match(tag));
        let text_hit = rule.text.as_ref().is_some_and(|re| re.is_match(text));
        let attr_hit = rule
            .attribute
            .as_ref()
            .is_some_and(|re| attributes.iter().any(|a| re.is_match(a)));
        if tag_hit || text_hit || attr_hit {
            flags.insert(rule.flag);
        }
    }
    flags
}
